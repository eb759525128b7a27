//! Rule registry and registration contract.
//!
//! This module holds the *static* side of the engine: the named rules and the
//! metadata attached to them. Expansion (see `expander.rs`) only ever reads
//! from a registry; it is mutated through [`RuleRegistry::define`] alone.
//!
//! `define` composes the function that is actually installed under an id:
//!
//! ```text
//! expand_fn
//!   ├─ repeatable      -> chunk::repeat(arity, ..)   split args into chunks
//!   ├─ fixed arity     -> chunk::exact(arity, ..)    reject other counts
//!   └─ after_loaded    -> deferred::wrap(..)         (with-eval-after-load ..)
//! ```
//!
//! ## Invariants
//!
//! - Definitions are immutable once stored. Redefining an id replaces the
//!   whole entry: no merge, no warning (a `debug` event is logged).
//! - Entries are never removed.
//! - A repeatable rule always has a positive arity.

use super::chunk;
use super::deferred;
use super::expander::Expander;
use crate::{ExpandError, Form};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// The function a rule uses to produce its replacement tree.
///
/// It receives the raw (unexpanded) argument forms of the invocation and the
/// expander, which exposes the active context frame.
pub type Expansion = Arc<dyn Fn(&mut Expander<'_>, &[Form]) -> Result<Form, ExpandError> + Send + Sync>;

/// Box a closure as an [`Expansion`], fixing its signature.
pub(crate) fn expansion<F>(f: F) -> Expansion
where
    F: Fn(&mut Expander<'_>, &[Form]) -> Result<Form, ExpandError> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Derives a top-level target name from an invocation's arguments.
pub type Shorthand = fn(&[Form]) -> Option<Form>;

/// Whether (and with what chunk size) a rule repeats over its arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Repeat {
    #[default]
    No,
    /// Repeat with the rule's declared arity.
    Yes,
    /// Repeat with an explicit chunk size.
    Arity(usize),
}

impl From<bool> for Repeat {
    fn from(repeat: bool) -> Self {
        if repeat { Repeat::Yes } else { Repeat::No }
    }
}

impl From<usize> for Repeat {
    fn from(arity: usize) -> Self {
        Repeat::Arity(arity)
    }
}

bitflags::bitflags! {
    /// Capability flags recorded on a stored rule.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct RuleFlags: u8 {
        const AFTER_LOADED = 1 << 0;
        const REPEATABLE   = 1 << 1;
        const SHORTHAND    = 1 << 2;
    }
}

/// Per-rule configuration accepted by [`RuleRegistry::define`].
#[derive(Clone, Default)]
pub struct RuleOptions {
    /// Number of arguments `expand` consumes. Required for repeatable rules.
    pub arity: Option<usize>,
    /// Number of leading arguments an editor should treat specially when
    /// indenting the invocation.
    pub indent: Option<usize>,
    /// Delay the produced code until the context feature is loaded.
    pub after_loaded: bool,
    pub repeatable: Repeat,
    pub signature: Option<String>,
    pub documentation: Option<String>,
    pub shorthand: Option<Shorthand>,
    /// Debugger argument shape, stored verbatim.
    pub debug_shape: Option<String>,
}

impl fmt::Debug for RuleOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleOptions")
            .field("arity", &self.arity)
            .field("indent", &self.indent)
            .field("after_loaded", &self.after_loaded)
            .field("repeatable", &self.repeatable)
            .field("signature", &self.signature)
            .field("shorthand", &self.shorthand.map(|_| "<function>"))
            .finish()
    }
}

/// A rule waiting to be installed: usually built with the `rule!` macro.
#[derive(Clone)]
pub struct Rule {
    pub name: String,
    pub expand: Expansion,
    pub options: RuleOptions,
}

impl Rule {
    pub fn new<F>(name: impl Into<String>, expand: F) -> Self
    where
        F: Fn(&mut Expander<'_>, &[Form]) -> Result<Form, ExpandError> + Send + Sync + 'static,
    {
        Rule { name: name.into(), expand: expansion(expand), options: RuleOptions::default() }
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule").field("name", &self.name).field("expand", &"<function>").finish()
    }
}

/// A stored rule: the installed (wrapped) expansion plus its metadata.
#[derive(Clone)]
pub struct RuleDefinition {
    id: String,
    expand: Expansion,
    arity: Option<usize>,
    flags: RuleFlags,
    indent: Option<usize>,
    signature: Option<String>,
    documentation: Option<String>,
    shorthand: Option<Shorthand>,
    debug_shape: Option<String>,
}

impl RuleDefinition {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Chunk size for repeatable rules, declared argument count otherwise.
    pub fn arity(&self) -> Option<usize> {
        self.arity
    }

    pub fn flags(&self) -> RuleFlags {
        self.flags
    }

    pub fn is_deferred(&self) -> bool {
        self.flags.contains(RuleFlags::AFTER_LOADED)
    }

    pub fn is_repeatable(&self) -> bool {
        self.flags.contains(RuleFlags::REPEATABLE)
    }

    pub fn indent(&self) -> Option<usize> {
        self.indent
    }

    pub fn documentation(&self) -> Option<&str> {
        self.documentation.as_deref()
    }

    pub fn debug_shape(&self) -> Option<&str> {
        self.debug_shape.as_deref()
    }

    pub fn shorthand(&self) -> Option<Shorthand> {
        self.shorthand
    }

    /// The declared signature, or one derived from the arity.
    ///
    /// ```text
    /// arity 2, repeatable -> "ARG1 ARG2 ..."
    /// arity 1             -> "ARG1"
    /// no arity            -> "&rest ARGS"
    /// ```
    pub fn signature(&self) -> String {
        if let Some(sig) = &self.signature {
            return sig.clone();
        }
        match self.arity {
            Some(n) => {
                let mut sig = (1..=n).map(|i| format!("ARG{i}")).collect::<Vec<_>>().join(" ");
                if self.is_repeatable() {
                    sig.push_str(" ...");
                }
                sig
            }
            None => "&rest ARGS".to_string(),
        }
    }

    /// Run the installed expansion against `args` in the expander's context.
    pub fn apply(&self, cx: &mut Expander<'_>, args: &[Form]) -> Result<Form, ExpandError> {
        (self.expand)(cx, args)
    }
}

impl fmt::Debug for RuleDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleDefinition")
            .field("id", &self.id)
            .field("expand", &"<function>")
            .field("arity", &self.arity)
            .field("flags", &self.flags)
            .finish()
    }
}

/// Named rule definitions.
#[derive(Default, Clone)]
pub struct RuleRegistry {
    rules: HashMap<String, RuleDefinition>,
}

impl RuleRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        RuleRegistry { rules: HashMap::new() }
    }

    /// Install `expand` under `id`.
    ///
    /// Validates the name and the repeat configuration, composes the
    /// arity/deferral wrappers and replaces any previous definition.
    pub fn define<F>(&mut self, id: impl Into<String>, expand: F, options: RuleOptions) -> Result<(), ExpandError>
    where
        F: Fn(&mut Expander<'_>, &[Form]) -> Result<Form, ExpandError> + Send + Sync + 'static,
    {
        self.define_expansion(id.into(), expansion(expand), options)
    }

    /// Install a batch of rules in order. Stops at the first invalid rule.
    pub fn install(&mut self, rules: impl IntoIterator<Item = Rule>) -> Result<(), ExpandError> {
        for rule in rules {
            self.define_expansion(rule.name, rule.expand, rule.options)?;
        }
        Ok(())
    }

    fn define_expansion(&mut self, id: String, base: Expansion, options: RuleOptions) -> Result<(), ExpandError> {
        if !is_valid_name(&id) {
            return Err(ExpandError::InvalidName(id));
        }

        let mut flags = RuleFlags::empty();
        let chunk_arity = match options.repeatable {
            Repeat::No => None,
            Repeat::Yes => Some(options.arity.ok_or_else(|| ExpandError::MissingArity(id.clone()))?),
            Repeat::Arity(n) => Some(n),
        };

        let mut installed = base;
        let arity = match chunk_arity {
            Some(0) => return Err(ExpandError::MissingArity(id)),
            Some(n) => {
                flags |= RuleFlags::REPEATABLE;
                installed = chunk::repeat(&id, n, installed);
                Some(n)
            }
            None => {
                if let Some(n) = options.arity {
                    installed = chunk::exact(&id, n, installed);
                }
                options.arity
            }
        };

        if options.after_loaded {
            flags |= RuleFlags::AFTER_LOADED;
            installed = deferred::wrap(installed);
        }
        if options.shorthand.is_some() {
            flags |= RuleFlags::SHORTHAND;
        }

        let definition = RuleDefinition {
            id: id.clone(),
            expand: installed,
            arity,
            flags,
            indent: options.indent,
            signature: options.signature,
            documentation: options.documentation,
            shorthand: options.shorthand,
            debug_shape: options.debug_shape,
        };

        if self.rules.insert(id.clone(), definition).is_some() {
            debug!(rule = %id, "redefined rule");
        } else {
            debug!(rule = %id, ?flags, "defined rule");
        }
        Ok(())
    }

    /// Look up a rule by id. Absence means "not a rule": callers pass the
    /// form through unchanged.
    pub fn lookup(&self, id: &str) -> Option<&RuleDefinition> {
        self.rules.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.rules.contains_key(id)
    }

    /// Registered ids, sorted.
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.rules.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl fmt::Debug for RuleRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleRegistry").field("rules", &self.ids()).finish()
    }
}

/// A rule id must read back as a single symbol.
fn is_valid_name(id: &str) -> bool {
    regex!(r#"^[^\s()\[\]"';#,`]+$"#).is_match(id) && !regex!(r"^[-+]?\d+$").is_match(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Frame;

    fn echo(_cx: &mut Expander<'_>, args: &[Form]) -> Result<Form, ExpandError> {
        Ok(Form::call("echo", args.iter().cloned()))
    }

    #[test]
    fn define_rejects_malformed_names() {
        let mut registry = RuleRegistry::new();
        for bad in ["", "has space", "(paren", "42", "quo'te"] {
            let err = registry.define(bad, echo, RuleOptions::default()).unwrap_err();
            assert_eq!(err, ExpandError::InvalidName(bad.to_string()));
        }
        assert!(registry.is_empty());
    }

    #[test]
    fn repeatable_needs_an_arity() {
        let mut registry = RuleRegistry::new();
        let options = RuleOptions { repeatable: Repeat::Yes, ..Default::default() };
        let err = registry.define(":echo", echo, options).unwrap_err();
        assert_eq!(err, ExpandError::MissingArity(":echo".to_string()));

        let options = RuleOptions { repeatable: Repeat::Arity(0), ..Default::default() };
        assert!(registry.define(":echo", echo, options).is_err());
    }

    #[test]
    fn redefinition_replaces_previous_entry() {
        let mut registry = RuleRegistry::new();
        let options = RuleOptions { documentation: Some("first".into()), ..Default::default() };
        registry.define(":x", echo, options).unwrap();
        registry.define(":x", |_cx, _args| Ok(Form::sym("second")), RuleOptions::default()).unwrap();

        let rule = registry.lookup(":x").unwrap();
        assert_eq!(rule.documentation(), None);
        assert_eq!(registry.len(), 1);

        let mut cx = Expander::new(&registry, Frame::empty());
        assert_eq!(rule.apply(&mut cx, &[]).unwrap(), Form::sym("second"));
    }

    #[test]
    fn flags_and_signature_follow_options() {
        let mut registry = RuleRegistry::new();
        let options = RuleOptions {
            arity: Some(2),
            repeatable: Repeat::Yes,
            after_loaded: true,
            shorthand: Some((|args: &[Form]| args.first().cloned()) as Shorthand),
            ..Default::default()
        };
        registry.define(":pair", echo, options).unwrap();

        let rule = registry.lookup(":pair").unwrap();
        assert_eq!(rule.flags(), RuleFlags::AFTER_LOADED | RuleFlags::REPEATABLE | RuleFlags::SHORTHAND);
        assert_eq!(rule.signature(), "ARG1 ARG2 ...");
        assert!(registry.lookup(":missing").is_none());
    }

    #[test]
    fn explicit_repeat_arity_overrides_declared_arity() {
        let mut registry = RuleRegistry::new();
        let options = RuleOptions { arity: Some(1), repeatable: Repeat::from(3usize), ..Default::default() };
        registry.define(":triple", echo, options).unwrap();
        assert_eq!(registry.lookup(":triple").unwrap().arity(), Some(3));
    }

    #[test]
    fn install_fails_on_the_first_malformed_rule() {
        let mut registry = RuleRegistry::new();
        let mut repeat = Rule::new(":repeat", echo);
        repeat.options.repeatable = Repeat::Yes;
        let err = registry.install([Rule::new(":ok", echo), repeat, Rule::new(":later", echo)]).unwrap_err();

        assert_eq!(err, ExpandError::MissingArity(":repeat".to_string()));
        assert!(registry.contains(":ok"));
        assert!(!registry.contains(":later"));
    }

    #[test]
    fn fixed_arity_rules_check_argument_count() {
        let mut registry = RuleRegistry::new();
        registry.define(":one", echo, RuleOptions { arity: Some(1), ..Default::default() }).unwrap();
        let rule = registry.lookup(":one").unwrap().clone();

        let mut cx = Expander::new(&registry, Frame::empty());
        let err = rule.apply(&mut cx, &[Form::Int(1), Form::Int(2)]).unwrap_err();
        assert_eq!(err, ExpandError::ArgumentCount { rule: ":one".into(), expected: 1, got: 2 });
    }
}
