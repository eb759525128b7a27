use super::{ensure_function, hook_name, quoted};
use crate::{ContextKey, Form, Rule};

pub(super) fn rules() -> Vec<Rule> {
    vec![
        rule! {
            name: ":hook",
            arity: 1,
            repeatable: true,
            signature: "FUNCTION ...",
            doc: "Add FUNCTION to the current hook.",
            expand: |cx, args| {
                let hook = cx.get(ContextKey::Hook)?.clone();
                Ok(Form::call("add-hook", [quoted(&hook), ensure_function(&args[0])]))
            }
        },
        rule! {
            name: ":hook-into",
            arity: 1,
            repeatable: true,
            signature: "HOOK ...",
            doc: "Add the current mode to HOOK (a `-hook` suffix is added when missing).",
            expand: |cx, args| {
                let mode = cx.get(ContextKey::Mode)?.clone();
                let hook = hook_name(":hook-into", &args[0])?;
                Ok(Form::call("add-hook", [quoted(&hook), ensure_function(&mode)]))
            }
        },
        rule! {
            name: ":local-hook",
            arity: 2,
            repeatable: true,
            signature: "HOOK FUNCTION ...",
            doc: "Add FUNCTION to HOOK buffer-locally whenever the current hook runs.",
            expand: |cx, args| {
                let hook = cx.get(ContextKey::Hook)?.clone();
                let local = Form::call(
                    "add-hook",
                    [quoted(&args[0]), ensure_function(&args[1]), Form::nil(), Form::t()],
                );
                Ok(Form::call("add-hook", [quoted(&hook), Form::call("lambda", [Form::list([]), local])]))
            }
        },
    ]
}
