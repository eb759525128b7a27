use super::{ensure_function, quoted};
use crate::{Form, Rule};

pub(super) fn rules() -> Vec<Rule> {
    vec![rule! {
        name: ":advise",
        arity: 3,
        repeatable: true,
        signature: "SYMBOL HOW FUNCTION ...",
        doc: "Add FUNCTION as HOW advice (e.g. :around, :before) to SYMBOL.",
        expand: |_cx, args| {
            Ok(Form::call("advice-add", [quoted(&args[0]), args[1].clone(), ensure_function(&args[2])]))
        }
    }]
}
