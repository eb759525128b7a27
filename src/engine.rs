//! Expansion engine.
//!
//! This module is the entry point for the rule machinery. It is split into
//! focused submodules under `src/engine/` while keeping public paths stable
//! (for example `crate::engine::Expander` and `crate::engine::RuleRegistry`).
//!
//! ## How the parts work together
//!
//! ```text
//! define(id, expand, options)          (registry.rs)
//!   ├─ repeatable?    -> chunk::repeat   (chunk.rs)
//!   └─ after_loaded?  -> deferred::wrap  (deferred.rs)
//!                 │
//!                 v
//!           RuleRegistry ──────────────┐
//!                                      │
//! top-level (name, body)               │
//!   └─ Expander::expand  (expander.rs) ┘
//!        - trampoline on known heads (fixed point)
//!        - descend into children, left to right
//!        - scope rules push Frames   (context.rs)
//!        - quit() sets the need-guard flag (quit.rs)
//!                 │
//!                 v
//!    final tree, guarded iff a quit was requested
//! ```
//!
//! The engine leans on **fixed-point substitution**: a rule's replacement is
//! expanded again until no registered rule remains reachable, so one rule can
//! produce invocations of others and composition works naturally.
//!
//! ## Responsibilities by module
//!
//! - `registry.rs`: `RuleRegistry`, `RuleDefinition`, `RuleOptions` and the
//!   `define`/`lookup` contract.
//! - `context.rs`: immutable context frames and the bindings each scope level
//!   derives.
//! - `expander.rs`: the recursive expander and its safety bounds.
//! - `chunk.rs`: the arity-chunking wrapper for repeatable rules.
//! - `deferred.rs`: the after-loaded wrapper.
//! - `setter.rs`: read-modify-write expressions for options and variables.
//! - `quit.rs`: quit tokens and the single early-exit guard.
//! - `metrics.rs`: per-run counters and timings.
//!
//! ## Debugging
//!
//! Rule definitions and per-run summaries are logged at `debug`, individual
//! rule applications at `trace` (target `setup_forms::engine`).

#[path = "engine/chunk.rs"]
mod chunk;
#[path = "engine/context.rs"]
mod context;
#[path = "engine/deferred.rs"]
mod deferred;
#[path = "engine/expander.rs"]
mod expander;
#[path = "engine/metrics.rs"]
mod metrics;
#[path = "engine/quit.rs"]
mod quit;
#[path = "engine/registry.rs"]
mod registry;
#[path = "engine/setter.rs"]
mod setter;

pub use context::{ContextKey, Frame, ScopeLevel};
pub use expander::Expander;
pub(crate) use expander::{DEFAULT_MAX_DEPTH, DEFAULT_MAX_REWRITES};
pub use metrics::ExpansionMetrics;
pub(crate) use quit::QuitToken;
pub use registry::{Expansion, Repeat, Rule, RuleDefinition, RuleFlags, RuleOptions, RuleRegistry, Shorthand};
pub use setter::{Setter, SetterOp};
