//! The top-level action
//!
//! The nav bar has a single button whose meaning depends on the application state: finish
//! the settings, connect to the tracker, (re)build the plan, update the prediction, or stop
//! the running computation. [`action_from_state`] is that decision as a pure function.

use crate::app::Page;
use crate::deep_equals::deep_equals;
use crate::plan::ExtendedProjectPlan;
use crate::settings::PlainSettings;
use crate::tracker::TrackerMetadata;

/// What the default action does
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
	/// Navigate to the settings page.
	CompleteSettings,
	/// Authorize with the tracker.
	Connect,
	/// Retrieve the plan from the tracker, then predict.
	BuildPlan,
	/// Predict again with the last retrieved plan.
	UpdatePrediction,
	/// A computation or a metadata request is running.
	Stop,
	/// Settings, metadata and plan are current; the button is hidden.
	Nothing,
}

impl Action {
	/// Stable identifier, used for styling the button.
	pub fn as_str(self) -> &'static str {
		match self {
			Action::CompleteSettings => "complete",
			Action::Connect => "connect",
			Action::BuildPlan => "build",
			Action::UpdatePrediction => "update",
			Action::Stop => "stop",
			Action::Nothing => "nothing",
		}
	}
}

/// Inputs of [`action_from_state`].
#[derive(Debug, Clone, Copy)]
pub struct ActionState<'a> {
	pub progress: Option<f64>,
	pub pending_metadata: bool,
	pub metadata: Option<&'a TrackerMetadata>,
	pub extended_plan: Option<&'a ExtendedProjectPlan>,
	/// Current settings, normalized.
	pub current_settings: &'a PlainSettings,
	pub current_page: Page,
	pub valid_settings: bool,
}

/// Decides the default action.
///
/// The first matching rule wins:
///
/// 1. something is running: [`Action::Stop`]
/// 2. settings are invalid: [`Action::Nothing`] on the settings page, else
///    [`Action::CompleteSettings`]
/// 3. no metadata: [`Action::Connect`]
/// 4. no plan yet, or the settings other than the contributors changed since:
///    [`Action::BuildPlan`]
/// 5. only the contributors changed: [`Action::UpdatePrediction`]
pub fn action_from_state(state: &ActionState<'_>) -> Action {
	if state.progress.is_some() || state.pending_metadata {
		return Action::Stop;
	}
	if !state.valid_settings {
		return if state.current_page == Page::Settings {
			Action::Nothing
		} else {
			Action::CompleteSettings
		};
	}
	if state.metadata.is_none() {
		return Action::Connect;
	}
	let Some(plan) = state.extended_plan else {
		return Action::BuildPlan;
	};

	if !deep_equals(&state.current_settings.tracker, &plan.settings.tracker) {
		Action::BuildPlan
	} else if !deep_equals(&state.current_settings.contributors, &plan.settings.contributors) {
		Action::UpdatePrediction
	} else {
		Action::Nothing
	}
}
