//! Package and feature loading.

use super::{first_arg, quoted, split_body, targets};
use crate::{ContextKey, Form, Rule};

pub(super) fn rules() -> Vec<Rule> {
    vec![
        rule! {
            name: ":package",
            arity: 1,
            repeatable: true,
            signature: "PACKAGE ...",
            doc: "Install PACKAGE if it is not installed yet, refreshing the archive \
                  contents first when the package is unknown.",
            shorthand: first_arg,
            expand: |_cx, args| {
                let package = quoted(&args[0]);
                let refresh = Form::call(
                    "unless",
                    [
                        Form::call("assq", [package.clone(), Form::sym("package-archive-contents")]),
                        Form::call("package-refresh-contents", []),
                    ],
                );
                Ok(Form::call(
                    "unless",
                    [
                        Form::call("package-installed-p", [package.clone()]),
                        refresh,
                        Form::call("package-install", [package]),
                    ],
                ))
            }
        },
        rule! {
            name: ":require",
            arity: 1,
            repeatable: true,
            signature: "FEATURE ...",
            doc: "Load FEATURE now; abandon the rest of the setup when it cannot be loaded.",
            shorthand: first_arg,
            expand: |cx, args| {
                let quit = cx.quit(None)?;
                Ok(Form::call("unless", [Form::call("require", [quoted(&args[0]), Form::nil(), Form::t()]), quit]))
            }
        },
        rule! {
            name: ":also-load",
            arity: 1,
            repeatable: true,
            after_loaded: true,
            signature: "FEATURE ...",
            doc: "Load FEATURE once the current feature has loaded.",
            expand: |_cx, args| {
                Ok(Form::call("require", [quoted(&args[0])]))
            }
        },
        rule! {
            name: ":when-loaded",
            after_loaded: true,
            indent: 0,
            signature: "BODY...",
            doc: "Evaluate BODY once the current feature has loaded.",
            expand: |_cx, args| {
                Ok(Form::progn(args.to_vec()))
            }
        },
        rule! {
            name: ":load-after",
            indent: 1,
            signature: "FEATURES BODY...",
            doc: "Evaluate BODY once all of FEATURES have loaded.",
            expand: |_cx, args| {
                let (features, body) = split_body(":load-after", args)?;
                let mut out = body.to_vec();
                for feature in targets(features).into_iter().rev() {
                    let mut items = vec![Form::sym("with-eval-after-load"), quoted(feature)];
                    items.extend(out);
                    out = vec![Form::List(items)];
                }
                Ok(Form::progn(out))
            }
        },
        rule! {
            name: ":file-match",
            arity: 1,
            repeatable: true,
            signature: "PATTERN ...",
            doc: "Visit files whose name matches PATTERN in the current mode.",
            expand: |cx, args| {
                let mode = cx.get(ContextKey::Mode)?.clone();
                Ok(Form::call(
                    "add-to-list",
                    [
                        Form::quote(Form::sym("auto-mode-alist")),
                        Form::call("cons", [args[0].clone(), quoted(&mode)]),
                    ],
                ))
            }
        },
    ]
}
