//! Conditional guards.
//!
//! Each guard checks a condition when the produced code runs and, if it does
//! not hold, abandons the remaining forms of the enclosing setup through the
//! early-exit protocol.

use super::quoted;
use crate::{ExpandError, Expander, Form, Rule};

/// `(unless CONDITION (throw 'TOKEN nil))`
fn unless_quit(cx: &mut Expander<'_>, condition: Form) -> Result<Form, ExpandError> {
    let quit = cx.quit(None)?;
    Ok(Form::call("unless", [condition, quit]))
}

pub(super) fn rules() -> Vec<Rule> {
    vec![
        rule! {
            name: ":needs",
            arity: 1,
            repeatable: true,
            signature: "EXECUTABLE ...",
            doc: "Abandon the setup unless EXECUTABLE is on the search path.",
            expand: |cx, args| {
                unless_quit(cx, Form::call("executable-find", [args[0].clone()]))
            }
        },
        rule! {
            name: ":if-package",
            arity: 1,
            repeatable: true,
            signature: "PACKAGE ...",
            doc: "Abandon the setup unless PACKAGE is installed.",
            expand: |cx, args| {
                unless_quit(cx, Form::call("package-installed-p", [quoted(&args[0])]))
            }
        },
        rule! {
            name: ":if-feature",
            arity: 1,
            repeatable: true,
            signature: "FEATURE ...",
            doc: "Abandon the setup unless FEATURE has been provided.",
            expand: |cx, args| {
                unless_quit(cx, Form::call("featurep", [quoted(&args[0])]))
            }
        },
        rule! {
            name: ":if-host",
            arity: 1,
            repeatable: true,
            signature: "HOSTNAME ...",
            doc: "Abandon the setup unless the system name is HOSTNAME.",
            expand: |cx, args| {
                unless_quit(cx, Form::call("string=", [Form::call("system-name", []), args[0].clone()]))
            }
        },
        rule! {
            name: ":only-if",
            arity: 1,
            repeatable: true,
            signature: "CONDITION ...",
            doc: "Abandon the setup unless CONDITION evaluates to non-nil.",
            expand: |cx, args| {
                unless_quit(cx, args[0].clone())
            }
        },
        rule! {
            name: ":quit",
            signature: "&optional RETURN",
            doc: "Unconditionally abandon the setup, returning RETURN.",
            expand: |cx, args| {
                match args {
                    [] => cx.quit(None),
                    [ret] => cx.quit(Some(ret.clone())),
                    _ => Err(ExpandError::ArgumentCount { rule: ":quit".to_string(), expected: 1, got: args.len() }),
                }
            }
        },
    ]
}
