//! Key binding rules.
//!
//! `:global` binds immediately; the map-local rules are deferred because the
//! context map usually only exists once its feature has loaded.

use super::{ensure_function, ensure_kbd};
use crate::{ContextKey, Form, Rule};

pub(super) fn rules() -> Vec<Rule> {
    vec![
        rule! {
            name: ":global",
            arity: 2,
            repeatable: true,
            signature: "KEY COMMAND ...",
            doc: "Globally bind KEY to COMMAND.",
            expand: |_cx, args| {
                Ok(Form::call("global-set-key", [ensure_kbd(&args[0]), ensure_function(&args[1])]))
            }
        },
        rule! {
            name: ":bind",
            arity: 2,
            repeatable: true,
            after_loaded: true,
            signature: "KEY COMMAND ...",
            doc: "Bind KEY to COMMAND in the current map.",
            expand: |cx, args| {
                let map = cx.get(ContextKey::Map)?.clone();
                Ok(Form::call("define-key", [map, ensure_kbd(&args[0]), ensure_function(&args[1])]))
            }
        },
        rule! {
            name: ":unbind",
            arity: 1,
            repeatable: true,
            after_loaded: true,
            signature: "KEY ...",
            doc: "Unbind KEY in the current map.",
            expand: |cx, args| {
                let map = cx.get(ContextKey::Map)?.clone();
                Ok(Form::call("define-key", [map, ensure_kbd(&args[0]), Form::nil()]))
            }
        },
        rule! {
            name: ":rebind",
            arity: 2,
            repeatable: true,
            after_loaded: true,
            signature: "KEY COMMAND ...",
            doc: "Unbind every key currently bound to COMMAND in the current map, then bind KEY to it.",
            expand: |cx, args| {
                let map = cx.get(ContextKey::Map)?.clone();
                let command = ensure_function(&args[1]);
                // (dolist (key (where-is-internal CMD MAP)) (define-key MAP key nil))
                let clear = Form::call(
                    "dolist",
                    [
                        Form::list([Form::sym("key"), Form::call("where-is-internal", [command.clone(), map.clone()])]),
                        Form::call("define-key", [map.clone(), Form::sym("key"), Form::nil()]),
                    ],
                );
                let bind = Form::call("define-key", [map, ensure_kbd(&args[0]), command]);
                Ok(Form::progn(vec![clear, bind]))
            }
        },
    ]
}
