//! Settings model
//!
//! Every field of [`Settings`] is an independent signal so that each form input can bind to
//! it directly. The plain form ([`PlainSettings`]) is what travels through the location
//! hash and what a computed plan remembers it was built with.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use trackplan_reactive::{Signal, batch};
use url::Url;

use crate::contributor::{Contributor, ContributorEditArea, PlainContributor};
use crate::deep_equals::deep_equals_fields;
use crate::plain::{ensure_array, ensure_bool, ensure_string, ensure_string_set};

/// Reactive settings
#[derive(Debug, Clone)]
pub struct Settings {
	/// Display name of this plan configuration.
	pub name: Signal<String>,
	/// Base URL of the issue tracker, as typed.
	pub you_track_base_url: Signal<String>,
	/// URL of the OAuth hub.
	pub hub_url: Signal<String>,
	/// OAuth service id of the tracker.
	pub you_track_service_id: Signal<String>,
	/// Custom field holding the issue state.
	pub state_field_id: Signal<String>,
	/// States that mark an issue as not being worked on.
	pub inactive_state_ids: Signal<BTreeSet<String>>,
	/// Custom field holding the remaining effort.
	pub remaining_effort_field_id: Signal<String>,
	/// Custom field holding the remaining wait time.
	pub remaining_wait_field_id: Signal<String>,
	/// Custom field holding the assignee.
	pub assignee_field_id: Signal<String>,
	/// Custom field holding the issue type.
	pub type_field_id: Signal<String>,
	/// Issue types whose work may be split across contributors.
	pub splittable_type_ids: Signal<BTreeSet<String>>,
	/// Link type expressing dependencies.
	pub depends_link_type_id: Signal<String>,
	/// Direction of the dependency link type.
	pub does_inward_depend_on_outward: Signal<bool>,
	/// Saved query selecting the issues to plan.
	pub saved_query_id: Signal<String>,
	/// Optional saved query whose issues are overlaid on the plan.
	pub overlay_saved_query_id: Signal<String>,
	/// Contributors, in display order.
	pub contributors: Signal<Vec<Contributor>>,
	/// The "add contributor" row.
	pub transient: ContributorEditArea,
}

/// Plain settings without the contributor list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlainTrackerSettings {
	pub name: String,
	pub you_track_base_url: String,
	pub hub_url: String,
	pub you_track_service_id: String,
	pub state_field_id: String,
	pub inactive_state_ids: BTreeSet<String>,
	pub remaining_effort_field_id: String,
	pub remaining_wait_field_id: String,
	pub assignee_field_id: String,
	pub type_field_id: String,
	pub splittable_type_ids: BTreeSet<String>,
	pub depends_link_type_id: String,
	pub does_inward_depend_on_outward: bool,
	pub saved_query_id: String,
	pub overlay_saved_query_id: String,
}

deep_equals_fields!(PlainTrackerSettings {
	name,
	you_track_base_url,
	hub_url,
	you_track_service_id,
	state_field_id,
	inactive_state_ids,
	remaining_effort_field_id,
	remaining_wait_field_id,
	assignee_field_id,
	type_field_id,
	splittable_type_ids,
	depends_link_type_id,
	does_inward_depend_on_outward,
	saved_query_id,
	overlay_saved_query_id,
});

/// Plain settings
///
/// Serializes to a flat JSON object with camelCase keys.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlainSettings {
	#[serde(flatten)]
	pub tracker: PlainTrackerSettings,
	pub contributors: Vec<PlainContributor>,
}

deep_equals_fields!(PlainSettings {
	tracker,
	contributors
});

impl Default for Settings {
	fn default() -> Self {
		Self {
			name: Signal::new(String::new()),
			you_track_base_url: Signal::new(String::new()),
			hub_url: Signal::new(String::new()),
			you_track_service_id: Signal::new(String::new()),
			state_field_id: Signal::new(String::new()),
			inactive_state_ids: Signal::new(BTreeSet::new()),
			remaining_effort_field_id: Signal::new(String::new()),
			remaining_wait_field_id: Signal::new(String::new()),
			assignee_field_id: Signal::new(String::new()),
			type_field_id: Signal::new(String::new()),
			splittable_type_ids: Signal::new(BTreeSet::new()),
			depends_link_type_id: Signal::new(String::new()),
			does_inward_depend_on_outward: Signal::new(true),
			saved_query_id: Signal::new(String::new()),
			overlay_saved_query_id: Signal::new(String::new()),
			contributors: Signal::new(Vec::new()),
			transient: ContributorEditArea::new(),
		}
	}
}

impl Settings {
	/// Settings with every field at its default.
	pub fn new() -> Self {
		Self::default()
	}

	/// Assigns every field from untrusted JSON, repairing malformed values.
	///
	/// Runs as one batch: dependents observe the old settings or the new ones, never a mix.
	/// The edit area is only touched if `plain` carries a `transient` object.
	pub fn assign(&self, plain: &Value) {
		batch(|| {
			self.name.set(ensure_string(plain.get("name")).log("name"));
			self.you_track_base_url
				.set(ensure_string(plain.get("youTrackBaseUrl")).log("youTrackBaseUrl"));
			self.hub_url.set(ensure_string(plain.get("hubUrl")).log("hubUrl"));
			self.you_track_service_id
				.set(ensure_string(plain.get("youTrackServiceId")).log("youTrackServiceId"));
			self.state_field_id
				.set(ensure_string(plain.get("stateFieldId")).log("stateFieldId"));
			self.inactive_state_ids
				.set(ensure_string_set(plain.get("inactiveStateIds")).log("inactiveStateIds"));
			self.remaining_effort_field_id.set(
				ensure_string(plain.get("remainingEffortFieldId")).log("remainingEffortFieldId"),
			);
			self.remaining_wait_field_id
				.set(ensure_string(plain.get("remainingWaitFieldId")).log("remainingWaitFieldId"));
			self.assignee_field_id
				.set(ensure_string(plain.get("assigneeFieldId")).log("assigneeFieldId"));
			self.type_field_id
				.set(ensure_string(plain.get("typeFieldId")).log("typeFieldId"));
			self.splittable_type_ids
				.set(ensure_string_set(plain.get("splittableTypeIds")).log("splittableTypeIds"));
			self.depends_link_type_id
				.set(ensure_string(plain.get("dependsLinkTypeId")).log("dependsLinkTypeId"));
			self.does_inward_depend_on_outward.set(
				ensure_bool(plain.get("doesInwardDependOnOutward"), true)
					.log("doesInwardDependOnOutward"),
			);
			self.saved_query_id
				.set(ensure_string(plain.get("savedQueryId")).log("savedQueryId"));
			self.overlay_saved_query_id
				.set(ensure_string(plain.get("overlaySavedQueryId")).log("overlaySavedQueryId"));
			self.contributors.set(
				ensure_array(plain.get("contributors"))
					.log("contributors")
					.iter()
					.map(Contributor::from_plain)
					.collect(),
			);
			if let Some(transient) = plain.get("transient").filter(|t| t.is_object()) {
				self.transient.assign(transient);
			}
		});
	}

	/// Assigns from typed plain settings.
	pub fn assign_plain(&self, plain: &PlainSettings) {
		match serde_json::to_value(plain) {
			Ok(value) => self.assign(&value),
			Err(error) => tracing::error!(%error, "failed to convert plain settings"),
		}
	}

	/// Reads the current settings into plain form. Reads are tracked.
	pub fn to_plain(&self) -> PlainSettings {
		PlainSettings {
			tracker: PlainTrackerSettings {
				name: self.name.get(),
				you_track_base_url: self.you_track_base_url.get(),
				hub_url: self.hub_url.get(),
				you_track_service_id: self.you_track_service_id.get(),
				state_field_id: self.state_field_id.get(),
				inactive_state_ids: self.inactive_state_ids.get(),
				remaining_effort_field_id: self.remaining_effort_field_id.get(),
				remaining_wait_field_id: self.remaining_wait_field_id.get(),
				assignee_field_id: self.assignee_field_id.get(),
				type_field_id: self.type_field_id.get(),
				splittable_type_ids: self.splittable_type_ids.get(),
				depends_link_type_id: self.depends_link_type_id.get(),
				does_inward_depend_on_outward: self.does_inward_depend_on_outward.get(),
				saved_query_id: self.saved_query_id.get(),
				overlay_saved_query_id: self.overlay_saved_query_id.get(),
			},
			contributors: self.contributors.with(|contributors| {
				contributors.iter().map(Contributor::to_plain).collect()
			}),
		}
	}

	/// Like [`Settings::to_plain`], with the base URL normalized.
	pub fn to_normalized_plain(&self) -> PlainSettings {
		let mut plain = self.to_plain();
		plain.tracker.you_track_base_url = normalized_base_url(&plain.tracker.you_track_base_url);
		plain
	}
}

/// Normalizes a tracker base URL.
///
/// Returns `""` if the input does not parse as an absolute URL with a non-empty host.
/// Otherwise the path is guaranteed to end in `/`, so relative paths can be resolved
/// against the result.
pub fn normalized_base_url(url: &str) -> String {
	let Ok(mut parsed) = Url::parse(url) else {
		return String::new();
	};
	if parsed.host_str().is_none_or(str::is_empty) {
		return String::new();
	}
	if !parsed.path().ends_with('/') {
		let path = format!("{}/", parsed.path());
		parsed.set_path(&path);
	}
	parsed.into()
}
