//! Context frames.
//!
//! Scope-changing rules (`:with-feature`, `:with-mode`, `:with-map`,
//! `:with-hook`) make a *new* frame by prepending derived bindings to the
//! inherited one, then expand their body under it. Frames are persistent
//! linked lists: prepending shares the tail and nothing is ever mutated.
//!
//! ```text
//! (:with-feature foo (:with-map bar-map ...))
//!
//!   inner frame:  map=bar-map ─┐
//!   outer frame:               feature=foo, mode=foo-mode, map=foo-mode-map,
//!                              hook=foo-mode-hook ─┐
//!   root frame:                                    quit=setup-quit-7
//! ```
//!
//! Lookup returns the innermost binding for a key.

use crate::{ExpandError, Form};
use std::fmt;
use std::rc::Rc;

/// The fixed set of keys a frame can bind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ContextKey {
    Feature,
    Mode,
    Map,
    Hook,
    Quit,
}

impl ContextKey {
    pub fn name(self) -> &'static str {
        match self {
            ContextKey::Feature => "feature",
            ContextKey::Mode => "mode",
            ContextKey::Map => "map",
            ContextKey::Hook => "hook",
            ContextKey::Quit => "quit",
        }
    }
}

impl fmt::Display for ContextKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug)]
struct Binding {
    key: ContextKey,
    value: Form,
    next: Option<Rc<Binding>>,
}

/// An immutable, ordered set of context bindings.
#[derive(Debug, Clone, Default)]
pub struct Frame {
    head: Option<Rc<Binding>>,
}

impl Frame {
    pub fn empty() -> Self {
        Frame { head: None }
    }

    /// A new frame with `key = value` in front of `self`.
    pub fn bind(&self, key: ContextKey, value: Form) -> Frame {
        Frame { head: Some(Rc::new(Binding { key, value, next: self.head.clone() })) }
    }

    /// Prepend several bindings; the last one ends up innermost.
    pub fn bind_all(&self, bindings: impl IntoIterator<Item = (ContextKey, Form)>) -> Frame {
        bindings.into_iter().fold(self.clone(), |frame, (key, value)| frame.bind(key, value))
    }

    pub fn lookup(&self, key: ContextKey) -> Option<&Form> {
        self.iter().find(|(k, _)| *k == key).map(|(_, v)| v)
    }

    /// Like [`Frame::lookup`], failing when no enclosing scope binds `key`.
    pub fn get(&self, key: ContextKey) -> Result<&Form, ExpandError> {
        self.lookup(key).ok_or(ExpandError::CannotDeduce(key))
    }

    /// Bindings from innermost to outermost (shadowed ones included).
    pub fn iter(&self) -> impl Iterator<Item = (ContextKey, &Form)> {
        let mut cursor = self.head.as_deref();
        std::iter::from_fn(move || {
            let binding = cursor?;
            cursor = binding.next.as_deref();
            Some((binding.key, &binding.value))
        })
    }

    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }
}

/// What a scope-changing rule establishes for each of its targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeLevel {
    Feature,
    Mode,
    Map,
    Hook,
}

impl ScopeLevel {
    /// Bindings implied by `target` at this level.
    ///
    /// ```text
    /// Feature foo       -> feature=foo mode=foo-mode map=foo-mode-map hook=foo-mode-hook
    /// Feature foo-mode  -> feature=foo-mode mode=foo-mode map=foo-mode-map hook=foo-mode-hook
    /// Mode    bar-mode  -> mode=bar-mode map=bar-mode-map hook=bar-mode-hook
    /// Map     m         -> map=m
    /// Hook    h         -> hook=h
    /// ```
    pub fn bindings(self, target: &Form) -> Result<Vec<(ContextKey, Form)>, ExpandError> {
        let name = target.as_symbol().ok_or_else(|| {
            ExpandError::invalid_argument(self.rule_name(), format!("expected a symbol, got {target}"))
        })?;

        Ok(match self {
            ScopeLevel::Feature => {
                let mode = if name.ends_with("-mode") { name.to_string() } else { format!("{name}-mode") };
                let mut bindings = vec![(ContextKey::Feature, target.clone())];
                bindings.extend(mode_bindings(&mode));
                bindings
            }
            ScopeLevel::Mode => mode_bindings(name),
            ScopeLevel::Map => vec![(ContextKey::Map, target.clone())],
            ScopeLevel::Hook => vec![(ContextKey::Hook, target.clone())],
        })
    }

    pub(crate) fn rule_name(self) -> &'static str {
        match self {
            ScopeLevel::Feature => ":with-feature",
            ScopeLevel::Mode => ":with-mode",
            ScopeLevel::Map => ":with-map",
            ScopeLevel::Hook => ":with-hook",
        }
    }
}

fn mode_bindings(mode: &str) -> Vec<(ContextKey, Form)> {
    vec![
        (ContextKey::Mode, Form::sym(mode)),
        (ContextKey::Map, Form::sym(format!("{mode}-map"))),
        (ContextKey::Hook, Form::sym(format!("{mode}-hook"))),
    ]
}
