//! Planning configuration
//!
//! Constants that shape the tracker query and the schedule prediction. The defaults are the
//! values the UI has always used; deployments can override them from a TOML document:
//!
//! ```toml
//! app_name = "Project Planning"
//! scheduling_resolution_ms = 1800000
//! ```

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::tracker::DEFAULT_MINUTES_PER_WORK_WEEK;

const HOUR_MS: u64 = 60 * 60 * 1000;

/// Configuration of the action pipeline and the application shell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanningConfig {
	/// Name shown in the document title, followed by the settings name if any.
	pub app_name: String,
	/// State changes shorter than this are ignored when reconstructing the plan.
	pub min_state_change_duration_ms: u64,
	/// Remaining effort assumed for issues without an estimate.
	pub default_remaining_effort_ms: u64,
	/// Wait time assumed for issues without one.
	pub default_wait_time_ms: u64,
	/// Granularity of the predicted schedule.
	pub scheduling_resolution_ms: u64,
	/// Issues shorter than this many resolution units are never preempted or split.
	pub min_activity_duration: u32,
	/// Prefix of the ids synthesized for external contributors.
	///
	/// Tracker ids have the form `<digits>-<digits>`, so any prefix starting with a
	/// non-digit keeps the two id spaces disjoint.
	pub external_contributor_id_prefix: String,
	/// Length of a work week used until the tracker reports its own.
	pub default_minutes_per_work_week: u32,
}

impl Default for PlanningConfig {
	fn default() -> Self {
		Self {
			app_name: "Project Planning".to_string(),
			min_state_change_duration_ms: HOUR_MS,
			default_remaining_effort_ms: 0,
			default_wait_time_ms: 0,
			scheduling_resolution_ms: HOUR_MS,
			min_activity_duration: 4,
			external_contributor_id_prefix: "@trackplan/external-contributor/".to_string(),
			default_minutes_per_work_week: DEFAULT_MINUTES_PER_WORK_WEEK,
		}
	}
}

impl PlanningConfig {
	/// Parses and validates a configuration from TOML. Missing keys keep their defaults.
	pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
		let config: Self = toml::from_str(source)?;
		config.validate()?;
		Ok(config)
	}

	/// Checks the invariants the pipeline relies on.
	pub fn validate(&self) -> Result<(), ConfigError> {
		let prefix = &self.external_contributor_id_prefix;
		match prefix.chars().next() {
			Some(first) if !first.is_ascii_digit() => Ok(()),
			_ => Err(ConfigError::InvalidPrefix(prefix.clone())),
		}
	}

	/// Returns a copy with a different application name.
	pub fn with_app_name(mut self, app_name: impl Into<String>) -> Self {
		self.app_name = app_name.into();
		self
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_defaults_are_valid() {
		let config = PlanningConfig::default();

		assert!(config.validate().is_ok());
		assert_eq!(config.min_state_change_duration_ms, 3_600_000);
		assert_eq!(config.default_minutes_per_work_week, 2400);
	}

	#[rstest]
	fn test_partial_toml_keeps_defaults() {
		let config = PlanningConfig::from_toml_str(
			r#"
			app_name = "Roadmap"
			min_activity_duration = 8
			"#,
		)
		.unwrap();

		assert_eq!(config.app_name, "Roadmap");
		assert_eq!(config.min_activity_duration, 8);
		assert_eq!(config.scheduling_resolution_ms, 3_600_000);
	}

	#[rstest]
	#[case("")]
	#[case("7-")]
	fn test_prefix_that_may_collide_is_rejected(#[case] prefix: &str) {
		let source = format!("external_contributor_id_prefix = {prefix:?}");

		let result = PlanningConfig::from_toml_str(&source);

		assert!(matches!(result, Err(ConfigError::InvalidPrefix(_))));
	}

	#[rstest]
	fn test_malformed_toml_is_a_parse_error() {
		let result = PlanningConfig::from_toml_str("app_name = ");

		assert!(matches!(result, Err(ConfigError::Parse(_))));
	}
}
