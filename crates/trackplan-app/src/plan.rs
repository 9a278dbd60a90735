//! Project plans and scheduling inputs
//!
//! Types exchanged with the planning engine. The engine reconstructs a plan from the
//! tracker's activity log ([`ProjectPlan`]), predicts a schedule for the unresolved issues
//! ([`Schedule`]) and merges the two.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::config::PlanningConfig;
use crate::contributor::PlainContributor;
use crate::settings::PlainSettings;

/// A past or predicted activity of one contributor on one issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueActivity {
	pub assignee: String,
	pub start: i64,
	pub end: i64,
	pub is_waiting: bool,
}

/// An issue as seen by the planning engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackerIssue {
	pub id: String,
	pub summary: String,
	/// Resolution timestamp, or `None` for unresolved issues.
	#[serde(default)]
	pub resolved: Option<i64>,
	/// Values of the requested custom fields, keyed by field id.
	#[serde(default)]
	pub custom_fields: BTreeMap<String, String>,
	#[serde(default)]
	pub dependencies: Vec<String>,
	#[serde(default)]
	pub issue_activities: Vec<IssueActivity>,
}

/// A problem found while reconstructing the plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanWarning {
	pub description: String,
	#[serde(default)]
	pub issue_id: Option<String>,
}

/// A project plan
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectPlan {
	pub issues: Vec<TrackerIssue>,
	pub warnings: Vec<PlanWarning>,
}

/// Predicted activities, one list per unresolved issue in input order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule(pub Vec<Vec<IssueActivity>>);

/// Contributor as passed to the scheduler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulingContributor {
	pub id: String,
	pub minutes_per_week: f64,
	pub num_members: u32,
}

/// Scheduler input besides the issues.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulingOptions {
	pub contributors: Vec<SchedulingContributor>,
	pub minutes_per_week: u32,
	pub resolution_ms: u64,
	pub min_activity_duration: u32,
	pub prediction_start_time_ms: i64,
}

/// Query configuration for reconstructing a plan from the tracker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackerConfig {
	pub state_field_id: String,
	pub inactive_state_ids: BTreeSet<String>,
	pub remaining_effort_field_id: String,
	pub remaining_wait_field_id: String,
	pub assignee_field_id: String,
	pub other_custom_field_ids: Vec<String>,
	pub depends_link_type_id: String,
	pub does_inward_depend_on_outward: bool,
	pub saved_query_id: String,
	pub overlay_saved_query_id: String,
	pub min_state_change_duration_ms: u64,
	pub default_remaining_effort_ms: u64,
	pub default_wait_time_ms: u64,
	pub type_field_id: String,
	pub splittable_type_ids: BTreeSet<String>,
}

impl TrackerConfig {
	/// Builds the query configuration from normalized settings.
	pub fn from_settings(settings: &PlainSettings, config: &PlanningConfig) -> Self {
		let tracker = &settings.tracker;
		Self {
			state_field_id: tracker.state_field_id.clone(),
			inactive_state_ids: tracker.inactive_state_ids.clone(),
			remaining_effort_field_id: tracker.remaining_effort_field_id.clone(),
			remaining_wait_field_id: tracker.remaining_wait_field_id.clone(),
			assignee_field_id: tracker.assignee_field_id.clone(),
			other_custom_field_ids: vec![tracker.type_field_id.clone()],
			depends_link_type_id: tracker.depends_link_type_id.clone(),
			does_inward_depend_on_outward: tracker.does_inward_depend_on_outward,
			saved_query_id: tracker.saved_query_id.clone(),
			overlay_saved_query_id: tracker.overlay_saved_query_id.clone(),
			min_state_change_duration_ms: config.min_state_change_duration_ms,
			default_remaining_effort_ms: config.default_remaining_effort_ms,
			default_wait_time_ms: config.default_wait_time_ms,
			type_field_id: tracker.type_field_id.clone(),
			splittable_type_ids: tracker.splittable_type_ids.clone(),
		}
	}

	/// Whether the issue's type allows splitting its work across contributors.
	pub fn is_splittable(&self, issue: &TrackerIssue) -> bool {
		issue
			.custom_fields
			.get(&self.type_field_id)
			.is_some_and(|type_id| self.splittable_type_ids.contains(type_id))
	}
}

/// Scheduler contributors built from the settings' contributor list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchedulingContributors {
	pub contributors: Vec<SchedulingContributor>,
	/// Display names of the synthesized external contributor ids.
	pub id_to_external_contributor_name: BTreeMap<String, String>,
}

impl SchedulingContributors {
	/// Converts contributors for the scheduler.
	///
	/// External contributors get the id `<prefix><n>` where `n` counts external contributors
	/// in list order starting at 0. Capacities are converted from hours to minutes.
	pub fn from_plain(contributors: &[PlainContributor], external_id_prefix: &str) -> Self {
		let mut result = Self::default();
		for contributor in contributors {
			let (id, num_members, hours_per_week) = match contributor {
				PlainContributor::Tracker { id, hours_per_week } => (id.clone(), 1, *hours_per_week),
				PlainContributor::External {
					name,
					num_members,
					hours_per_week,
				} => {
					let ordinal = result.id_to_external_contributor_name.len();
					let id = format!("{external_id_prefix}{ordinal}");
					result
						.id_to_external_contributor_name
						.insert(id.clone(), name.clone());
					(id, *num_members, *hours_per_week)
				}
			};
			result.contributors.push(SchedulingContributor {
				id,
				minutes_per_week: 60.0 * hours_per_week,
				num_members,
			});
		}
		result
	}
}

/// A plan together with the settings it was computed from
#[derive(Debug, Clone, PartialEq)]
pub struct ExtendedProjectPlan {
	pub plan: ProjectPlan,
	/// Normalized settings snapshot used for the computation.
	pub settings: PlainSettings,
	/// When the tracker's activity log had been fully received.
	pub tracker_timestamp_ms: i64,
	/// Display names of external contributor ids in `plan`.
	pub id_to_external_contributor_name: BTreeMap<String, String>,
}
