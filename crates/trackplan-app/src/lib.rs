//! # trackplan-app
//!
//! Reactive state layer of a project-planning UI for an issue tracker.
//!
//! The user edits settings (tracker URL, custom-field mappings, contributors); the
//! application connects to the tracker, reconstructs the project plan from its activity log,
//! predicts a schedule for the unresolved issues and shows the result. All state lives in
//! [`trackplan_reactive`] signals, so views bind to it directly and derived state
//! (validity, the current action, the location hash) stays current without bookkeeping.
//!
//! ## Modules
//!
//! - [`settings`], [`contributor`]: the user-provided configuration and its plain form
//! - [`plain`], [`deep_equals`]: coercion of untrusted JSON and structural equality
//! - [`counter`]: reactive count of true observations (invalid settings)
//! - [`settings_ctrl`], [`contributors`], [`metadata`], [`alerts`]: sub-controllers
//! - [`action`], [`controller`]: the action state machine and the plan pipeline
//! - [`router`]: two-way binding of the location hash
//! - [`service`], [`ports`]: contracts of the external services and the browser
//!
//! ## Example
//!
//! ```ignore
//! use trackplan_app::prelude::*;
//!
//! let app = App::new();
//! let router = Router::new(&app, location.clone(), oauth.as_ref());
//! let ctrl = AppCtrl::new(AppCtrlOptions { app, computation: AppComputation::new(), /* ... */ })?;
//! ctrl.default_action();
//! ```

pub mod action;
pub mod alerts;
pub mod app;
pub mod config;
pub mod contributor;
pub mod contributors;
pub mod controller;
pub mod counter;
pub mod deep_equals;
pub mod error;
pub mod metadata;
pub mod plain;
pub mod plan;
pub mod ports;
pub mod router;
pub mod service;
pub mod settings;
pub mod settings_ctrl;
pub mod tracker;

#[cfg(all(target_family = "wasm", target_os = "unknown"))]
pub mod web;

pub use action::{Action, ActionState, action_from_state};
pub use alerts::{Alert, AlertsCtrl};
pub use app::{App, AppComputation, Page, PlainApp};
pub use config::PlanningConfig;
pub use contributor::{Contributor, ContributorEditArea, ContributorKind, PlainContributor};
pub use controller::{AppCtrl, AppCtrlOptions};
pub use counter::{Counter, Observation};
pub use deep_equals::{DeepEquals, deep_equals};
pub use error::{ConfigError, CounterError, Failure, PlanningError, RouterError, ServiceError};
pub use router::Router;
pub use settings::{PlainSettings, Settings, normalized_base_url};

/// Commonly used types.
pub mod prelude {
	pub use crate::action::Action;
	pub use crate::alerts::AlertsCtrl;
	pub use crate::app::{App, AppComputation, Page};
	pub use crate::config::PlanningConfig;
	pub use crate::controller::{AppCtrl, AppCtrlOptions};
	pub use crate::ports::{HashLocation, MemoryLocation, MemoryOauth, MemoryTitle, TitlePort};
	pub use crate::router::Router;
	pub use crate::service::{OauthHandoff, PlanningService, TaskSpawner};
	pub use crate::settings::Settings;
}
