//! # trackplan-reactive
//!
//! The fine-grained reactive substrate used by the project-planning UI state layer.
//!
//! ## Primitives
//!
//! - [`Signal`]: mutable value cell; reads inside an effect record a dependency
//! - [`Effect`]: side effect that re-runs when the signals it read change
//! - [`Memo`]: derived value that only publishes changes
//! - [`batch`]: transactional batch; dependents observe several writes as one update
//! - [`untrack`]: read signals without recording dependencies
//! - [`Scope`]: owner of effects and cleanup callbacks, disposed as a unit
//!
//! ## Scheduling
//!
//! The runtime is single-threaded and synchronous. A signal write runs all dependent
//! effects before it returns, unless a batch is open, in which case they run once when the
//! outermost batch closes. Each thread has its own runtime.

pub mod effect;
pub mod memo;
pub mod runtime;
pub mod scope;
pub mod signal;

pub use effect::Effect;
pub use memo::Memo;
pub use runtime::{NodeId, NodeType, Observer, Runtime, batch, untrack, with_runtime};
pub use scope::Scope;
pub use signal::Signal;
