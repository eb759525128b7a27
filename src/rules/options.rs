//! Option and variable assignment.
//!
//! Both rules accept setter targets (`NAME`, `(append NAME)`,
//! `(prepend NAME)`, `(remove NAME)`); see `engine/setter.rs`.

use super::quoted;
use crate::{ContextKey, Form, Rule, Setter};

/// `(funcall (or (get 'NAME 'custom-get) #'symbol-value) 'NAME)`
fn read_option(name: &Form) -> Form {
    let getter = Form::call(
        "or",
        [Form::call("get", [quoted(name), Form::quote(Form::sym("custom-get"))]), Form::function(Form::sym("symbol-value"))],
    );
    Form::call("funcall", [getter, quoted(name)])
}

/// `(progn (custom-load-symbol 'NAME) (funcall (or (get 'NAME 'custom-set) #'set-default) 'NAME VALUE))`
fn write_option(name: &Form, value: Form) -> Form {
    let setter = Form::call(
        "or",
        [Form::call("get", [quoted(name), Form::quote(Form::sym("custom-set"))]), Form::function(Form::sym("set-default"))],
    );
    Form::progn(vec![
        Form::call("custom-load-symbol", [quoted(name)]),
        Form::call("funcall", [setter, quoted(name), value]),
    ])
}

pub(super) fn rules() -> Vec<Rule> {
    vec![
        rule! {
            name: ":option",
            arity: 2,
            repeatable: true,
            signature: "NAME VAL ...",
            doc: "Set the user option NAME to VAL through its custom setter, loading its \
                  definition first. NAME may be (append NAME), (prepend NAME) or (remove NAME); \
                  membership uses `equal`.",
            expand: |_cx, args| {
                Setter::new(read_option, write_option).build(&args[0], &args[1])
            }
        },
        rule! {
            name: ":local-set",
            arity: 2,
            repeatable: true,
            signature: "NAME VAL ...",
            doc: "Set the buffer-local value of NAME to VAL whenever the current hook runs. \
                  NAME may be (append NAME), (prepend NAME) or (remove NAME).",
            expand: |cx, args| {
                let hook = cx.get(ContextKey::Hook)?.clone();
                let assign = Setter::new(Form::clone, |name: &Form, value| Form::call("setq-local", [name.clone(), value]))
                    .build(&args[0], &args[1])?;
                Ok(Form::call("add-hook", [quoted(&hook), Form::call("lambda", [Form::list([]), assign])]))
            }
        },
    ]
}
