//! Rule-based expansion of declarative configuration forms.
//!
//! A configuration is a tree of *invocations* of named rules (`(:bind "C-c a"
//! agenda)`, `(:with-mode text-mode (:hook flyspell-mode))`, ...). The engine
//! rewrites that tree, to a fixed point, into primitive host code. It never
//! runs the code it produces.
//!
//! ```
//! use setup_forms::setup_str;
//!
//! let out = setup_str("(setup (:package magit) (:global \"C-x g\" magit-status))").unwrap();
//! assert_eq!(out.len(), 1);
//! ```

#[macro_use]
mod macros;
mod api;
mod engine;
mod error;
mod reader;
mod rules;

pub use api::{Context, Options, SetupDetails, SetupResult, setup, setup_str, setup_str_with, setup_verbose_with, setup_with};
pub use engine::{
    ContextKey, Expander, Expansion, ExpansionMetrics, Frame, Repeat, Rule, RuleDefinition, RuleFlags, RuleOptions,
    RuleRegistry, ScopeLevel, Setter, SetterOp, Shorthand,
};
pub use error::{ExpandError, ReadError};
pub use reader::{MAX_NESTING, read_all, read_one};
pub use rules::{builtin_registry, builtin_rules};

use std::fmt;

// --- Forms -------------------------------------------------------------------

/// A node of the configuration tree and of the produced host code.
///
/// Keywords are plain symbols whose name starts with `:`. The empty list and
/// the symbol `nil` are distinct values here; rules produce `nil` when they
/// need a false/empty value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Form {
    Symbol(String),
    Str(String),
    Int(i64),
    /// `'x`
    Quote(Box<Form>),
    /// `#'x`
    Function(Box<Form>),
    List(Vec<Form>),
    /// `[a b]`, constant data (never expanded).
    Vector(Vec<Form>),
}

impl Form {
    pub fn sym(name: impl Into<String>) -> Self {
        Form::Symbol(name.into())
    }

    pub fn string(s: impl Into<String>) -> Self {
        Form::Str(s.into())
    }

    pub fn nil() -> Self {
        Form::sym("nil")
    }

    pub fn t() -> Self {
        Form::sym("t")
    }

    pub fn quote(form: Form) -> Self {
        Form::Quote(Box::new(form))
    }

    pub fn function(form: Form) -> Self {
        Form::Function(Box::new(form))
    }

    pub fn list(items: impl IntoIterator<Item = Form>) -> Self {
        Form::List(items.into_iter().collect())
    }

    /// `(head args...)`
    pub fn call(head: &str, args: impl IntoIterator<Item = Form>) -> Self {
        let mut items = vec![Form::sym(head)];
        items.extend(args);
        Form::List(items)
    }

    /// Sequential composite of `forms`.
    ///
    /// ```text
    /// []        -> nil
    /// [a]       -> a
    /// [a, b]    -> (progn a b)
    /// ```
    pub fn progn(forms: Vec<Form>) -> Self {
        match forms.len() {
            0 => Form::nil(),
            1 => forms.into_iter().next().unwrap_or_else(Form::nil),
            _ => Form::call("progn", forms),
        }
    }

    pub fn as_symbol(&self) -> Option<&str> {
        match self {
            Form::Symbol(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Form::Symbol(s) if s == "nil")
    }

    /// Head symbol of a list form, if any.
    pub fn head(&self) -> Option<&str> {
        match self {
            Form::List(items) => items.first().and_then(Form::as_symbol),
            _ => None,
        }
    }

    /// Elements of a `(progn ...)` composite, or the form itself.
    ///
    /// Handy when a caller wants to splice an expansion into a larger body.
    pub fn into_body(self) -> Vec<Form> {
        match self {
            Form::List(items) if items.first().and_then(Form::as_symbol) == Some("progn") => {
                items.into_iter().skip(1).collect()
            }
            form if form.is_nil() => Vec::new(),
            form => vec![form],
        }
    }

    /// Does any (unquoted) list in this tree have `head` as its head symbol?
    pub fn mentions(&self, head: &str) -> bool {
        match self {
            Form::List(items) => {
                items.first().and_then(Form::as_symbol) == Some(head) || items.iter().any(|f| f.mentions(head))
            }
            Form::Function(inner) => inner.mentions(head),
            _ => false,
        }
    }
}

impl From<&str> for Form {
    fn from(name: &str) -> Self {
        Form::sym(name)
    }
}

impl From<i64> for Form {
    fn from(n: i64) -> Self {
        Form::Int(n)
    }
}

impl fmt::Display for Form {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Form::Symbol(s) => f.write_str(s),
            Form::Str(s) => {
                f.write_str("\"")?;
                for c in s.chars() {
                    match c {
                        '"' => f.write_str("\\\"")?,
                        '\\' => f.write_str("\\\\")?,
                        '\n' => f.write_str("\\n")?,
                        '\t' => f.write_str("\\t")?,
                        c => write!(f, "{c}")?,
                    }
                }
                f.write_str("\"")
            }
            Form::Int(n) => write!(f, "{n}"),
            Form::Quote(inner) => write!(f, "'{inner}"),
            Form::Function(inner) => write!(f, "#'{inner}"),
            Form::List(items) => write_seq(f, items, '(', ')'),
            Form::Vector(items) => write_seq(f, items, '[', ']'),
        }
    }
}

fn write_seq(f: &mut fmt::Formatter<'_>, items: &[Form], open: char, close: char) -> fmt::Result {
    write!(f, "{open}")?;
    for (idx, item) in items.iter().enumerate() {
        if idx > 0 {
            f.write_str(" ")?;
        }
        write!(f, "{item}")?;
    }
    write!(f, "{close}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progn_collapses_small_bodies() {
        assert_eq!(Form::progn(vec![]), Form::nil());
        assert_eq!(Form::progn(vec![Form::sym("a")]), Form::sym("a"));
        assert_eq!(Form::progn(vec![Form::sym("a"), Form::sym("b")]).to_string(), "(progn a b)");
    }

    #[test]
    fn display_escapes_strings() {
        let form = Form::call("kbd", [Form::string("C-\"x\"")]);
        assert_eq!(form.to_string(), r#"(kbd "C-\"x\"")"#);
    }

    #[test]
    fn into_body_splices_progn() {
        let body = Form::progn(vec![Form::sym("a"), Form::sym("b")]).into_body();
        assert_eq!(body, vec![Form::sym("a"), Form::sym("b")]);
        assert!(Form::nil().into_body().is_empty());
    }

    #[test]
    fn mentions_skips_quoted_data() {
        let form = Form::list([Form::sym("progn"), Form::quote(Form::list([Form::sym(":bind")]))]);
        assert!(!form.mentions(":bind"));
        assert!(form.mentions("progn"));
    }
}
