//! Shared fixtures for the controller integration tests

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use async_trait::async_trait;
use futures::executor::LocalPool;
use serde_json::{Value, json};
use trackplan_app::error::{Failure, ServiceError};
use trackplan_app::plan::{
	IssueActivity, PlanWarning, ProjectPlan, Schedule, SchedulingOptions, TrackerConfig, TrackerIssue,
};
use trackplan_app::ports::{MemoryOauth, MemoryTitle};
use trackplan_app::service::PlanningService;
use trackplan_app::tracker::{TrackerMetadata, User};
use trackplan_app::{App, AppComputation, AppCtrl, AppCtrlOptions, PlanningConfig};

/// Timestamp returned by the test clock.
pub const NOW_MS: i64 = 1_700_000_000_000;

/// Settings that pass every validity check.
pub fn valid_settings() -> Value {
	json!({
		"name": "Acme Roadmap",
		"youTrackBaseUrl": "https://tracker.example/youtrack",
		"hubUrl": "https://tracker.example/hub",
		"youTrackServiceId": "svc-1",
		"stateFieldId": "field-state",
		"inactiveStateIds": ["state-open"],
		"remainingEffortFieldId": "field-effort",
		"assigneeFieldId": "field-assignee",
		"typeFieldId": "field-type",
		"splittableTypeIds": ["type-task"],
		"dependsLinkTypeId": "link-depends",
		"doesInwardDependOnOutward": true,
		"savedQueryId": "query-1",
		"contributors": [
			{"type": "youTrack", "id": "1-1", "hoursPerWeek": 40},
			{"type": "external", "name": "Contractors", "numMembers": 2, "hoursPerWeek": 20},
			{"type": "external", "name": "QA", "numMembers": 1, "hoursPerWeek": 10}
		]
	})
}

pub fn sample_metadata() -> TrackerMetadata {
	TrackerMetadata {
		users: vec![User {
			id: "1-1".to_string(),
			full_name: "Ada Lovelace".to_string(),
			avatar_url: String::new(),
		}],
		..TrackerMetadata::default()
	}
}

pub fn sample_plan() -> ProjectPlan {
	ProjectPlan {
		issues: vec![TrackerIssue {
			id: "PRJ-1".to_string(),
			summary: "Ship it".to_string(),
			resolved: None,
			custom_fields: Default::default(),
			dependencies: Vec::new(),
			issue_activities: Vec::new(),
		}],
		warnings: vec![PlanWarning {
			description: "Issue has no remaining effort".to_string(),
			issue_id: Some("PRJ-1".to_string()),
		}],
	}
}

/// Scripted [`PlanningService`] recording its calls
#[derive(Default)]
pub struct FakeService {
	pub authorized: Cell<bool>,
	pub metadata_error: RefCell<Option<ServiceError>>,
	pub retrieve_error: RefCell<Option<ServiceError>>,
	pub append_failure: RefCell<Option<Failure>>,
	pub metadata_calls: Cell<usize>,
	pub retrieve_calls: Cell<usize>,
	pub tracker_configs: RefCell<Vec<TrackerConfig>>,
	pub scheduling_options: RefCell<Vec<SchedulingOptions>>,
	pub append_start_times: RefCell<Vec<i64>>,
}

impl FakeService {
	pub fn authorized() -> Self {
		let service = Self::default();
		service.authorized.set(true);
		service
	}
}

#[async_trait(?Send)]
impl PlanningService for FakeService {
	fn authorization_for(&self, _base_url: &str) -> Option<String> {
		self.authorized.get().then(|| "Bearer test-token".to_string())
	}

	async fn load_metadata(&self, _base_url: &str) -> Result<TrackerMetadata, ServiceError> {
		self.metadata_calls.set(self.metadata_calls.get() + 1);
		match self.metadata_error.borrow().clone() {
			Some(error) => Err(error),
			None => Ok(sample_metadata()),
		}
	}

	async fn retrieve_project_plan(
		&self,
		_base_url: &str,
		config: &TrackerConfig,
		progress: &dyn Fn(f64),
	) -> Result<ProjectPlan, ServiceError> {
		self.retrieve_calls.set(self.retrieve_calls.get() + 1);
		self.tracker_configs.borrow_mut().push(config.clone());
		if let Some(error) = self.retrieve_error.borrow().clone() {
			return Err(error);
		}
		progress(50.0);
		progress(100.0);
		Ok(sample_plan())
	}

	async fn schedule_unresolved(
		&self,
		issues: &[TrackerIssue],
		options: &SchedulingOptions,
	) -> Result<Schedule, ServiceError> {
		self.scheduling_options.borrow_mut().push(options.clone());
		Ok(Schedule(
			issues
				.iter()
				.map(|_| {
					vec![IssueActivity {
						assignee: "1-1".to_string(),
						start: options.prediction_start_time_ms,
						end: options.prediction_start_time_ms + 3_600_000,
						is_waiting: false,
					}]
				})
				.collect(),
		))
	}

	fn append_schedule(
		&self,
		plan: &ProjectPlan,
		schedule: &Schedule,
		prediction_start_time_ms: i64,
	) -> Result<ProjectPlan, Failure> {
		self.append_start_times.borrow_mut().push(prediction_start_time_ms);
		if let Some(failure) = self.append_failure.borrow().clone() {
			return Err(failure);
		}
		let mut plan = plan.clone();
		for (issue, activities) in plan.issues.iter_mut().zip(&schedule.0) {
			issue.issue_activities.extend(activities.iter().cloned());
		}
		Ok(plan)
	}
}

/// Controller wired to in-memory collaborators
pub struct Harness {
	pub pool: LocalPool,
	pub service: Rc<FakeService>,
	pub oauth: Rc<MemoryOauth>,
	pub title: Rc<MemoryTitle>,
	pub ctrl: Rc<AppCtrl>,
}

impl Harness {
	/// Builds a controller over `app` after `app` has been set up.
	pub fn new(app: App, service: FakeService) -> Self {
		let pool = LocalPool::new();
		let service = Rc::new(service);
		let oauth = Rc::new(MemoryOauth::new());
		let title = Rc::new(MemoryTitle::new());
		let ctrl = AppCtrl::with_clock(
			AppCtrlOptions {
				app,
				computation: AppComputation::new(),
				config: PlanningConfig::default(),
				service: service.clone(),
				oauth: oauth.clone(),
				spawner: Rc::new(pool.spawner()),
				title: title.clone(),
			},
			Rc::new(|| NOW_MS),
		)
		.unwrap();
		Self {
			pool,
			service,
			oauth,
			title,
			ctrl,
		}
	}

	/// A controller over valid settings whose metadata has been loaded.
	pub fn connected() -> Self {
		let app = App::new();
		app.settings.assign(&valid_settings());
		let mut harness = Self::new(app, FakeService::authorized());
		harness.settle();
		harness
	}

	/// Runs spawned tasks until none can make progress.
	pub fn settle(&mut self) {
		self.pool.run_until_stalled();
	}

	pub fn alert_titles(&self) -> Vec<String> {
		self.ctrl
			.computation()
			.alerts
			.alerts()
			.get_untracked()
			.into_iter()
			.map(|alert| alert.title)
			.collect()
	}
}
