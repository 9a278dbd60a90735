//! Error types for the planning UI state layer.
//!
//! User-input defects never surface here: malformed settings are repaired by the coercion
//! layer in [`crate::plain`]. What remains are failures of the external services, domain
//! failures reported by the scheduler, and programmer errors in counter bookkeeping.

use thiserror::Error;

/// Result type for the action pipeline.
pub type PlanningResult<T> = Result<T, PlanningError>;

/// Failure of a remote call (network, HTTP, authorization, malformed response).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ServiceError {
	/// The tracker could not be reached.
	#[error("network error: {0}")]
	Network(String),

	/// The tracker answered with an unexpected HTTP status.
	#[error("HTTP {status} from {url}")]
	Http {
		/// HTTP status code.
		status: u16,
		/// Requested URL.
		url: String,
	},

	/// No valid authorization is available for the base URL.
	#[error("not authorized for {0}")]
	Unauthorized(String),

	/// The response could not be interpreted.
	#[error("invalid response: {0}")]
	InvalidResponse(String),
}

/// Domain failure signaled by the scheduling engine instead of a plan.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct Failure(pub String);

impl Failure {
	/// Creates a failure with the given description.
	pub fn new(message: impl Into<String>) -> Self {
		Self(message.into())
	}
}

/// Errors surfaced by the build-plan / update-prediction pipeline.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PlanningError {
	/// A remote call was rejected.
	#[error(transparent)]
	Service(#[from] ServiceError),

	/// The scheduler reported a domain failure.
	#[error(transparent)]
	Failure(#[from] Failure),

	/// The planning configuration is invalid.
	#[error(transparent)]
	Config(#[from] ConfigError),

	/// Validity checks could not be registered.
	#[error(transparent)]
	Counter(#[from] CounterError),

	/// Application state could not be serialized for the OAuth handoff.
	#[error("failed to serialize application state: {0}")]
	Serialization(#[from] serde_json::Error),
}

/// Misuse of [`crate::counter::Counter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CounterError {
	/// `add()` was called twice for the same observation.
	#[error("Counter::add() called more than once for the same observation")]
	AlreadyRegistered,

	/// `delete()` was called without a prior `add()`.
	#[error("Counter::delete() called without a corresponding prior add()")]
	NotRegistered,
}

/// Problems with the location hash handled by the router.
#[derive(Debug, Error)]
pub enum RouterError {
	/// The `config` query parameter is not valid JSON.
	#[error("malformed config parameter: {0}")]
	MalformedConfig(#[source] serde_json::Error),
}

/// Invalid [`crate::config::PlanningConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
	/// The TOML document could not be parsed.
	#[error("failed to parse planning config: {0}")]
	Parse(#[from] toml::de::Error),

	/// The external contributor prefix could collide with tracker-issued ids.
	#[error("external contributor id prefix must be non-empty and start with a non-digit: {0:?}")]
	InvalidPrefix(String),
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_failure_converts_into_planning_error() {
		let error: PlanningError = Failure::new("cyclic dependency between A-1 and A-2").into();

		assert!(matches!(error, PlanningError::Failure(_)));
		assert_eq!(error.to_string(), "cyclic dependency between A-1 and A-2");
	}

	#[rstest]
	fn test_service_error_display() {
		let error = ServiceError::Http {
			status: 503,
			url: "https://tracker.example/api/issues".to_string(),
		};

		assert_eq!(
			PlanningError::from(error).to_string(),
			"HTTP 503 from https://tracker.example/api/issues"
		);
	}
}
