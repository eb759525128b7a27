//! Arity wrappers.
//!
//! A repeatable rule of arity `N` accepts any multiple of `N` arguments and
//! expands each chunk independently:
//!
//! ```text
//! (:global "C-a" a "C-b" b)    arity 2
//!   -> (progn (global-set-key (kbd "C-a") #'a) (global-set-key (kbd "C-b") #'b))
//! ```
//!
//! A ragged argument list is rejected before any chunk is expanded, so a
//! failure never leaves partial output behind.

use super::registry::{Expansion, expansion};
use crate::{ExpandError, Form};

/// Wrap `base` so it runs once per consecutive chunk of `arity` arguments.
pub(crate) fn repeat(rule: &str, arity: usize, base: Expansion) -> Expansion {
    let rule = rule.to_string();
    expansion(move |cx, args| {
        if args.len() % arity != 0 {
            return Err(ExpandError::IllegalArguments { rule: rule.clone(), arity, got: args.len() });
        }
        let mut out = Vec::with_capacity(args.len() / arity);
        for chunk in args.chunks(arity) {
            out.push(base(cx, chunk)?);
        }
        Ok(Form::progn(out))
    })
}

/// Wrap `base` so it only accepts exactly `arity` arguments.
pub(crate) fn exact(rule: &str, arity: usize, base: Expansion) -> Expansion {
    let rule = rule.to_string();
    expansion(move |cx, args| {
        if args.len() != arity {
            return Err(ExpandError::ArgumentCount { rule: rule.clone(), expected: arity, got: args.len() });
        }
        base(cx, args)
    })
}
