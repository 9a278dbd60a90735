//! External service contracts
//!
//! The planning engine, the tracker REST client and the OAuth flow live outside this crate.
//! The controllers only depend on the traits here, so they can be driven by fakes in tests
//! and by browser-backed implementations in the application.

use async_trait::async_trait;
use futures::future::LocalBoxFuture;
use serde_json::Value;

use crate::error::{Failure, ServiceError};
use crate::plan::{ProjectPlan, Schedule, SchedulingOptions, TrackerConfig, TrackerIssue};
use crate::tracker::TrackerMetadata;

/// The planning engine and tracker client
///
/// All futures run on the UI thread, hence `?Send`.
#[async_trait(?Send)]
pub trait PlanningService {
	/// Returns the stored authorization for `base_url`, if any.
	fn authorization_for(&self, base_url: &str) -> Option<String>;

	/// Loads custom fields, link types, saved queries, users and the work-week length.
	async fn load_metadata(&self, base_url: &str) -> Result<TrackerMetadata, ServiceError>;

	/// Reconstructs the project plan from the tracker's activity log.
	///
	/// `progress` receives the percentage done, between 0 and 100.
	async fn retrieve_project_plan(
		&self,
		base_url: &str,
		config: &TrackerConfig,
		progress: &dyn Fn(f64),
	) -> Result<ProjectPlan, ServiceError>;

	/// Predicts a schedule for the unresolved issues.
	async fn schedule_unresolved(
		&self,
		issues: &[TrackerIssue],
		options: &SchedulingOptions,
	) -> Result<Schedule, ServiceError>;

	/// Merges a predicted schedule into a plan.
	fn append_schedule(
		&self,
		plan: &ProjectPlan,
		schedule: &Schedule,
		prediction_start_time_ms: i64,
	) -> Result<ProjectPlan, Failure>;
}

/// Request to leave the application for the tracker's OAuth page.
#[derive(Debug, Clone, PartialEq)]
pub struct OauthRequest {
	pub base_url: String,
	pub hub_url: String,
	pub service_id: String,
	/// Application state to restore after the redirect.
	pub state: Value,
}

/// The OAuth round trip
pub trait OauthHandoff {
	/// Navigates to the OAuth page. On return, `request.state` is handed back once.
	fn go_to_oauth_page(&self, request: OauthRequest);

	/// Takes the state saved before the redirect, if the application was just redirected back.
	fn take_redirect_state(&self) -> Option<Value>;
}

/// Spawner for futures that must stay on the current thread.
pub trait TaskSpawner {
	/// Runs `task` to completion in the background.
	fn spawn(&self, task: LocalBoxFuture<'static, ()>);
}

impl TaskSpawner for futures::executor::LocalSpawner {
	fn spawn(&self, task: LocalBoxFuture<'static, ()>) {
		use futures::task::LocalSpawnExt;

		if let Err(error) = self.spawn_local(task) {
			tracing::error!(%error, "failed to spawn local task");
		}
	}
}
