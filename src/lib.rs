//! # trackplan
//!
//! Reactive state layer of a project-planning UI for issue trackers.
//!
//! This crate re-exports the workspace members:
//!
//! - [`reactive`]: signals, effects, memos, batches and scopes
//! - [`app`]: settings, routing, sub-controllers and the plan pipeline
//!
//! ## Quick Start
//!
//! ```ignore
//! use trackplan::prelude::*;
//!
//! let app = App::new();
//! let router = Router::new(&app, location, oauth.as_ref());
//! let ctrl = AppCtrl::new(options)?;
//! ```

pub use trackplan_app as app;
pub use trackplan_reactive as reactive;

pub use trackplan_app::{
	Action, App, AppCtrl, AppCtrlOptions, Page, PlainSettings, PlanningConfig, PlanningError,
	Router, Settings,
};
pub use trackplan_reactive::{Effect, Memo, Scope, Signal, batch, untrack};

/// Commonly used types of both crates.
pub mod prelude {
	pub use trackplan_app::prelude::*;
	pub use trackplan_reactive::{Effect, Memo, Scope, Signal, batch, untrack};
}
