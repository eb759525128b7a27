//! Early exit.
//!
//! Any rule may ask to abandon the rest of its top-level invocation at run
//! time (a missing package, a failed `require`, ...). It does so by producing
//! `(throw 'TOKEN RET)` through [`Expander::quit`], which also raises the
//! run's need-guard flag. After full expansion the top-level entry point wraps
//! the body in exactly one `(catch 'TOKEN ...)` iff the flag was raised.
//!
//! ```text
//! setup foo                         (catch 'setup-quit-3
//!   (:needs "rg")           ==>       (unless (executable-find "rg")
//!   (:hook x)                           (throw 'setup-quit-3 nil))
//!                                     (add-hook 'foo-mode-hook #'x))
//! ```
//!
//! The token is bound in the root frame, so scope rules that re-enter the
//! expander still throw to the same guard.

use super::context::ContextKey;
use super::expander::Expander;
use crate::{ExpandError, Form};
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::trace;

static NEXT_TOKEN: AtomicUsize = AtomicUsize::new(0);

/// The catch tag of one top-level invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct QuitToken(Form);

impl QuitToken {
    /// A tag no other top-level invocation in this process shares.
    pub(crate) fn fresh() -> Self {
        let n = NEXT_TOKEN.fetch_add(1, Ordering::Relaxed);
        QuitToken(Form::sym(format!("setup-quit-{n}")))
    }

    pub(crate) fn form(&self) -> &Form {
        &self.0
    }

    /// `(catch 'TOKEN body...)`
    pub(crate) fn guard(&self, body: Vec<Form>) -> Form {
        let mut items = vec![Form::sym("catch"), Form::quote(self.0.clone())];
        items.extend(body);
        Form::List(items)
    }
}

impl Expander<'_> {
    /// Produce an early exit to the enclosing top-level invocation.
    ///
    /// Fails when no quit token is in scope, i.e. when the expander was not
    /// started by a top-level invocation.
    pub fn quit(&mut self, ret: Option<Form>) -> Result<Form, ExpandError> {
        let token = self.get(ContextKey::Quit)?.clone();
        trace!(token = %token, "quit requested");
        self.need_guard = true;
        Ok(Form::call("throw", [Form::quote(token), ret.unwrap_or_else(Form::nil)]))
    }

    /// Whether any rule in this run has requested an early exit.
    pub fn needs_guard(&self) -> bool {
        self.need_guard
    }
}
