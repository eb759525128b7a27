//! Built-in rules.
//!
//! Each submodule contributes a `rules()` list built with the `rule!` macro.
//! The produced code only *calls* host operations (key binding, hooks,
//! options, package and feature loading, advice); none are implemented here.
//!
//! | module       | rules                                                        |
//! |--------------|--------------------------------------------------------------|
//! | `scopes`     | `:with-feature` `:with-mode` `:with-map` `:with-hook`        |
//! | `keys`       | `:global` `:bind` `:unbind` `:rebind`                        |
//! | `hooks`      | `:hook` `:hook-into` `:local-hook`                           |
//! | `options`    | `:option` `:local-set`                                       |
//! | `loading`    | `:package` `:require` `:also-load` `:when-loaded` `:load-after` `:file-match` |
//! | `guards`     | `:needs` `:if-package` `:if-feature` `:if-host` `:only-if` `:quit` |
//! | `advice`     | `:advise`                                                    |

mod advice;
mod guards;
mod hooks;
mod keys;
mod loading;
mod options;
mod scopes;

#[cfg(test)]
mod tests;

use crate::{ExpandError, Form, Rule, RuleRegistry};

/// All built-in rules, in installation order.
pub fn builtin_rules() -> Vec<Rule> {
    let mut rules = Vec::new();
    rules.extend(scopes::rules());
    rules.extend(keys::rules());
    rules.extend(hooks::rules());
    rules.extend(options::rules());
    rules.extend(loading::rules());
    rules.extend(guards::rules());
    rules.extend(advice::rules());
    rules
}

/// A fresh registry holding every built-in rule.
///
/// Fails if any built-in is malformed; a partial registry would let
/// invocations of the missing rule pass through as host code.
pub fn builtin_registry() -> Result<RuleRegistry, ExpandError> {
    let mut registry = RuleRegistry::new();
    registry.install(builtin_rules())?;
    Ok(registry)
}

// --- Helpers shared by the rule modules --------------------------------------

/// Shorthand extractor: the invocation's first argument names the target.
pub(crate) fn first_arg(args: &[Form]) -> Option<Form> {
    args.first().cloned()
}

/// `'x`, leaving already-quoted forms alone.
pub(crate) fn quoted(form: &Form) -> Form {
    match form {
        Form::Quote(_) => form.clone(),
        other => Form::quote(other.clone()),
    }
}

/// String keys are key descriptions and go through `kbd`; vectors and
/// expressions are used as-is.
pub(crate) fn ensure_kbd(key: &Form) -> Form {
    match key {
        Form::Str(_) => Form::call("kbd", [key.clone()]),
        other => other.clone(),
    }
}

/// Function designators: `f` and `'f` become `#'f`; lambdas and other
/// expressions are used as-is.
pub(crate) fn ensure_function(form: &Form) -> Form {
    match form {
        Form::Symbol(name) if name != "nil" => Form::function(form.clone()),
        Form::Quote(inner) if matches!(**inner, Form::Symbol(_)) => Form::function((**inner).clone()),
        other => other.clone(),
    }
}

/// `foo` -> `foo-hook`; names already ending in `-hook` or `-functions` are
/// kept.
pub(crate) fn hook_name(rule: &str, name: &Form) -> Result<Form, ExpandError> {
    let text = name
        .as_symbol()
        .ok_or_else(|| ExpandError::invalid_argument(rule, format!("expected a symbol, got {name}")))?;
    if text.ends_with("-hook") || text.ends_with("-functions") {
        Ok(name.clone())
    } else {
        Ok(Form::sym(format!("{text}-hook")))
    }
}

/// Split `(TARGETS BODY...)` arguments.
pub(crate) fn split_body<'a>(rule: &str, args: &'a [Form]) -> Result<(&'a Form, &'a [Form]), ExpandError> {
    args.split_first().ok_or_else(|| ExpandError::ArgumentCount { rule: rule.to_string(), expected: 1, got: 0 })
}

/// Accept a single target or a list of them.
pub(crate) fn targets(form: &Form) -> Vec<&Form> {
    match form {
        Form::List(items) => items.iter().collect(),
        single => vec![single],
    }
}
