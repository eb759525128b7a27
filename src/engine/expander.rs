//! The fixed-point expander.
//!
//! This module is the operational core of the engine:
//!
//! - If a node is a list whose head names a registered rule, call the rule
//!   and keep substituting while the replacement is itself an invocation (a
//!   trampoline on the head position).
//! - Then descend into the children of the result, strictly left to right, so
//!   invocations the replacement introduced are resolved too.
//! - Everything else (atoms, vectors, quoted data, unknown heads) passes
//!   through; only the children of unknown-head lists are visited.
//!
//! ## Key concepts
//!
//! - **Frame** (`context.rs`): the active context. Scope rules swap in a child
//!   frame for the duration of their body via [`Expander::scoped`].
//! - **Need-guard flag** (`quit.rs`): shared by every nested call of one run.
//! - **Fixed point**: the result contains no invocation of a registered rule,
//!   so expanding it again returns it unchanged.
//!
//! ## Bounds
//!
//! A rule whose expansion reintroduces itself would loop forever. Nesting
//! depth is capped by `max_depth` and consecutive head rewrites of one node by
//! `max_rewrites`; both fail the run instead of hanging.

use super::context::{ContextKey, Frame, ScopeLevel};
use super::metrics::ExpansionMetrics;
use super::registry::RuleRegistry;
use crate::{ExpandError, Form};
use std::borrow::Cow;
use tracing::trace;

pub(crate) const DEFAULT_MAX_DEPTH: usize = 256;
pub(crate) const DEFAULT_MAX_REWRITES: usize = 1024;

/// Expands forms against a registry within a context frame.
///
/// One `Expander` serves one top-level invocation; rules receive it so they
/// can read the context, expand bodies under new frames and request an early
/// exit.
#[derive(Debug)]
pub struct Expander<'r> {
    registry: &'r RuleRegistry,
    frame: Frame,
    pub(super) need_guard: bool,
    depth: usize,
    max_depth: usize,
    max_rewrites: usize,
    keep_trace: bool,
    metrics: ExpansionMetrics,
}

impl<'r> Expander<'r> {
    pub fn new(registry: &'r RuleRegistry, frame: Frame) -> Self {
        Expander {
            registry,
            frame,
            need_guard: false,
            depth: 0,
            max_depth: DEFAULT_MAX_DEPTH,
            max_rewrites: DEFAULT_MAX_REWRITES,
            keep_trace: false,
            metrics: ExpansionMetrics::default(),
        }
    }

    pub(crate) fn with_limits(mut self, max_depth: usize, max_rewrites: usize) -> Self {
        self.max_depth = max_depth;
        self.max_rewrites = max_rewrites;
        self
    }

    pub(crate) fn with_trace(mut self, keep_trace: bool) -> Self {
        self.keep_trace = keep_trace;
        self
    }

    pub fn registry(&self) -> &'r RuleRegistry {
        self.registry
    }

    /// The active context frame.
    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    /// Innermost binding of `key`; fails with "cannot deduce KEY from context".
    pub fn get(&self, key: ContextKey) -> Result<&Form, ExpandError> {
        self.frame.get(key)
    }

    pub fn metrics(&self) -> &ExpansionMetrics {
        &self.metrics
    }

    pub(crate) fn into_metrics(self) -> ExpansionMetrics {
        self.metrics
    }

    /// Expand `form` to a fixed point.
    pub fn expand(&mut self, form: &Form) -> Result<Form, ExpandError> {
        if self.depth >= self.max_depth {
            return Err(ExpandError::DepthExceeded { limit: self.max_depth });
        }
        self.depth += 1;
        self.metrics.reached(self.depth);
        let out = self.expand_node(form);
        self.depth -= 1;
        out
    }

    /// Expand each form in order.
    pub fn expand_all(&mut self, forms: &[Form]) -> Result<Vec<Form>, ExpandError> {
        forms.iter().map(|form| self.expand(form)).collect()
    }

    /// Expand `forms` in order and join them into one sequential composite.
    pub fn expand_body(&mut self, forms: &[Form]) -> Result<Form, ExpandError> {
        Ok(Form::progn(self.expand_all(forms)?))
    }

    /// Run `f` with `frame` active, restoring the current frame afterwards.
    pub fn with_frame<T>(&mut self, frame: Frame, f: impl FnOnce(&mut Self) -> T) -> T {
        let outer = std::mem::replace(&mut self.frame, frame);
        let out = f(self);
        self.frame = outer;
        out
    }

    /// Expand `body` once per target under the bindings `level` derives.
    ///
    /// `targets` is one symbol or a list of symbols; the per-target results
    /// are concatenated in target order.
    ///
    /// ```text
    /// (:with-mode (a-mode b-mode) (:hook x))
    ///   -> (progn (add-hook 'a-mode-hook #'x) (add-hook 'b-mode-hook #'x))
    /// ```
    pub fn scoped(&mut self, level: ScopeLevel, targets: &Form, body: &[Form]) -> Result<Form, ExpandError> {
        let targets: Vec<&Form> = match targets {
            Form::List(items) => items.iter().collect(),
            single => vec![single],
        };

        let mut out = Vec::new();
        for target in targets {
            let frame = self.frame.bind_all(level.bindings(target)?);
            out.extend(self.with_frame(frame, |cx| cx.expand_all(body))?);
        }
        Ok(Form::progn(out))
    }

    fn expand_node(&mut self, form: &Form) -> Result<Form, ExpandError> {
        let registry = self.registry;
        let mut current = Cow::Borrowed(form);
        let mut rewrites = 0;

        // Trampoline: substitute while the head names a registered rule.
        while let Some((rule, args)) =
            invocation(&current).and_then(|(id, args)| registry.lookup(id).map(|rule| (rule, args)))
        {
            if rewrites == self.max_rewrites {
                return Err(ExpandError::RewriteLimit { rule: rule.id().to_string(), limit: self.max_rewrites });
            }
            rewrites += 1;

            trace!(rule = rule.id(), args = args.len(), depth = self.depth, "applying rule");
            let replacement = rule.apply(self, args)?;
            self.metrics.record(rule.id(), self.depth, self.keep_trace);
            current = Cow::Owned(replacement);
        }

        match &*current {
            Form::List(items) if !is_constant(items) => return Ok(Form::List(self.expand_all(items)?)),
            Form::Function(inner) if matches!(&**inner, Form::List(_)) => return Ok(Form::function(self.expand(inner)?)),
            _ => {}
        }
        Ok(current.into_owned())
    }
}

/// `(head args...)` with a symbol head.
fn invocation(form: &Form) -> Option<(&str, &[Form])> {
    match form {
        Form::List(items) => {
            let (head, args) = items.split_first()?;
            Some((head.as_symbol()?, args))
        }
        _ => None,
    }
}

/// `(quote ...)` data is never expanded.
fn is_constant(items: &[Form]) -> bool {
    matches!(items.first().and_then(Form::as_symbol), Some("quote"))
}
