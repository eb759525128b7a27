use super::split_body;
use crate::{Rule, ScopeLevel};

pub(super) fn rules() -> Vec<Rule> {
    vec![
        rule! {
            name: ":with-feature",
            indent: 1,
            signature: "FEATURES BODY...",
            doc: "Expand BODY once for each of FEATURES, with the feature, and the \
                  mode, map and hook it implies, as context.",
            debug: "&rest sexp",
            expand: |cx, args| {
                let (features, body) = split_body(":with-feature", args)?;
                cx.scoped(ScopeLevel::Feature, features, body)
            }
        },
        rule! {
            name: ":with-mode",
            indent: 1,
            signature: "MODES BODY...",
            doc: "Expand BODY once for each of MODES, with the mode and its map and hook as context.",
            debug: "&rest sexp",
            expand: |cx, args| {
                let (modes, body) = split_body(":with-mode", args)?;
                cx.scoped(ScopeLevel::Mode, modes, body)
            }
        },
        rule! {
            name: ":with-map",
            indent: 1,
            signature: "MAPS BODY...",
            doc: "Expand BODY once for each of MAPS, with that key map as context.",
            debug: "&rest sexp",
            expand: |cx, args| {
                let (maps, body) = split_body(":with-map", args)?;
                cx.scoped(ScopeLevel::Map, maps, body)
            }
        },
        rule! {
            name: ":with-hook",
            indent: 1,
            signature: "HOOKS BODY...",
            doc: "Expand BODY once for each of HOOKS, with that hook as context.",
            debug: "&rest sexp",
            expand: |cx, args| {
                let (hooks, body) = split_body(":with-hook", args)?;
                cx.scoped(ScopeLevel::Hook, hooks, body)
            }
        },
    ]
}
