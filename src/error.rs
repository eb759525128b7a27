//! Expansion and reader errors.
//!
//! Every error is raised while expanding, never deferred to the runtime of the
//! produced code. Early exit is not an error: it is control flow carried in
//! the produced tree (see `engine/quit.rs`).

use crate::Form;
use crate::engine::ContextKey;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExpandError {
    /// A repeatable rule received an argument list that does not split into
    /// whole chunks of its arity.
    #[error("illegal arguments for {rule}: expected a multiple of {arity}, got {got}")]
    IllegalArguments { rule: String, arity: usize, got: usize },

    /// The setter builder was given a target it does not recognize.
    #[error("invalid option {0}")]
    InvalidOption(Form),

    #[error("cannot deduce {0} from context")]
    CannotDeduce(ContextKey),

    #[error("invalid rule name {0:?}")]
    InvalidName(String),

    #[error("rule {0} is repeatable but declares no arity")]
    MissingArity(String),

    #[error("wrong number of arguments for {rule}: expected {expected}, got {got}")]
    ArgumentCount { rule: String, expected: usize, got: usize },

    #[error("invalid argument for {rule}: {reason}")]
    InvalidArgument { rule: String, reason: String },

    #[error("expansion nested deeper than {limit} levels")]
    DepthExceeded { limit: usize },

    #[error("rule {rule} rewrote the same form more than {limit} times")]
    RewriteLimit { rule: String, limit: usize },

    #[error("setup forms require lexical scoping in the host")]
    LexicalScopingRequired,

    #[error(transparent)]
    Read(#[from] ReadError),
}

impl ExpandError {
    pub(crate) fn invalid_argument(rule: &str, reason: impl Into<String>) -> Self {
        ExpandError::InvalidArgument { rule: rule.to_string(), reason: reason.into() }
    }
}

/// Errors from [`crate::read_all`]. Offsets are byte indices into the source.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReadError {
    #[error("unexpected '{found}' at offset {offset}")]
    UnexpectedClose { found: char, offset: usize },

    #[error("unclosed '{open}' opened at offset {offset}")]
    Unclosed { open: char, offset: usize },

    #[error("unterminated string starting at offset {offset}")]
    UnterminatedString { offset: usize },

    #[error("dangling quote at offset {offset}")]
    DanglingQuote { offset: usize },

    #[error("expected exactly one form, found {found}")]
    ExpectedOne { found: usize },

    #[error("unexpected character {found:?} at offset {offset}")]
    Unexpected { found: char, offset: usize },

    #[error("unknown string escape '\\{escape}' at offset {offset}")]
    UnknownEscape { escape: char, offset: usize },

    #[error("forms nested deeper than {limit} levels at offset {offset}")]
    TooDeep { limit: usize, offset: usize },
}
