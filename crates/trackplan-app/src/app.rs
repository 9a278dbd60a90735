//! Application state
//!
//! [`App`] is what the user controls and what is persisted in the location hash (the page
//! and the settings). [`AppComputation`] is derived or transient state that is never
//! persisted.

use std::rc::Rc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use trackplan_reactive::{Signal, batch};

use crate::alerts::AlertsCtrl;
use crate::contributor::PlainEditArea;
use crate::plan::ExtendedProjectPlan;
use crate::settings::{PlainSettings, Settings};
use crate::tracker::TrackerMetadata;

/// The visible page
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Page {
	#[default]
	#[serde(rename = "")]
	Home,
	#[serde(rename = "warnings")]
	Warnings,
	#[serde(rename = "settings")]
	Settings,
}

impl Page {
	/// Every page.
	pub const ALL: [Page; 3] = [Page::Home, Page::Warnings, Page::Settings];

	/// Path segment of the page.
	pub fn as_str(self) -> &'static str {
		match self {
			Page::Home => "",
			Page::Warnings => "warnings",
			Page::Settings => "settings",
		}
	}

	/// Looks up a page by path segment.
	pub fn from_name(name: &str) -> Option<Self> {
		Self::ALL.into_iter().find(|page| page.as_str() == name)
	}
}

/// User-controlled application state
#[derive(Debug, Clone, Default)]
pub struct App {
	pub current_page: Signal<Page>,
	pub settings: Settings,
}

/// Serialized [`App`] as carried through the OAuth redirect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlainApp {
	pub current_page: Page,
	pub settings: PlainSettings,
	pub transient: PlainEditArea,
}

impl App {
	pub fn new() -> Self {
		Self::default()
	}

	/// Assigns page and settings from untrusted JSON in one batch.
	///
	/// An unknown page leaves the current page unchanged. A `transient` object inside
	/// `settings` or at the top level restores the contributor edit row.
	pub fn assign(&self, plain: &Value) {
		batch(|| {
			let page = plain.get("currentPage").and_then(Value::as_str);
			if let Some(page) = page.and_then(Page::from_name) {
				self.current_page.set(page);
			}
			if let Some(settings) = plain.get("settings") {
				self.settings.assign(settings);
			}
			if let Some(transient) = plain.get("transient").filter(|t| t.is_object()) {
				self.settings.transient.assign(transient);
			}
		});
	}

	/// Reads the state to persist across the OAuth redirect. Reads are tracked.
	pub fn to_plain(&self) -> PlainApp {
		PlainApp {
			current_page: self.current_page.get(),
			settings: self.settings.to_plain(),
			transient: self.settings.transient.to_plain(),
		}
	}
}

/// Computed and transient application state
#[derive(Debug, Clone, Default)]
pub struct AppComputation {
	/// Progress of the running action in percent, or `None` when idle.
	pub progress: Signal<Option<f64>>,
	/// Metadata of the tracker, once loaded.
	pub metadata: Signal<Option<TrackerMetadata>>,
	/// Number of failing validity checks of the settings.
	pub num_invalid_settings: Signal<usize>,
	/// Latest computed plan.
	pub extended_plan: Signal<Option<Rc<ExtendedProjectPlan>>>,
	/// Writing this signal triggers the default action.
	pub do_action: Signal<()>,
	pub alerts: AlertsCtrl,
}

impl AppComputation {
	pub fn new() -> Self {
		Self::default()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serde_json::json;
	use serial_test::serial;

	#[rstest]
	#[case("", Some(Page::Home))]
	#[case("warnings", Some(Page::Warnings))]
	#[case("settings", Some(Page::Settings))]
	#[case("Settings", None)]
	fn test_page_from_name(#[case] name: &str, #[case] expected: Option<Page>) {
		assert_eq!(Page::from_name(name), expected);
	}

	#[rstest]
	#[serial]
	fn test_handoff_state_round_trip() {
		let app = App::new();
		app.current_page.set(Page::Settings);
		app.settings.name.set("Roadmap".to_string());
		app.settings.transient.name.set("Contractors".to_string());

		let state = serde_json::to_value(app.to_plain()).unwrap();
		assert_eq!(state["currentPage"], json!("settings"));

		let restored = App::new();
		restored.assign(&state);
		assert_eq!(restored.current_page.get_untracked(), Page::Settings);
		assert_eq!(restored.settings.name.get_untracked(), "Roadmap");
		assert_eq!(restored.settings.transient.name.get_untracked(), "Contractors");
	}

	#[rstest]
	#[serial]
	fn test_unknown_page_is_ignored() {
		let app = App::new();
		app.current_page.set(Page::Warnings);

		app.assign(&json!({"currentPage": "admin"}));

		assert_eq!(app.current_page.get_untracked(), Page::Warnings);
	}
}
