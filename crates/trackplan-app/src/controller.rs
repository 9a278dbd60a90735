//! Application controller
//!
//! Wires the sub-controllers together, derives the current [`Action`] and runs the
//! build-plan / update-prediction pipeline.
//!
//! ## Pipeline
//!
//! Building a plan retrieves the plan from the tracker (reporting progress), remembers when
//! it was retrieved, and then predicts a schedule for it. Updating the prediction reuses the
//! last retrieved plan. The new [`ExtendedProjectPlan`] is only published once every step
//! succeeded; a failure leaves the previous plan in place and becomes an alert. Progress is
//! reset to `None` whatever the outcome.
//!
//! ## Example
//!
//! ```ignore
//! let ctrl = AppCtrl::new(AppCtrlOptions {
//!     app: App::new(),
//!     computation: AppComputation::new(),
//!     config: PlanningConfig::default(),
//!     service,
//!     oauth,
//!     spawner: Rc::new(pool.spawner()),
//!     title: Rc::new(MemoryTitle::new()),
//! })?;
//! ctrl.default_action();
//! pool.run_until_stalled();
//! ```

use core::cell::RefCell;
use std::rc::Rc;

use trackplan_reactive::{Memo, Scope, Signal, untrack};

use crate::action::{Action, ActionState, action_from_state};
use crate::alerts::AlertsCtrl;
use crate::app::{App, AppComputation, Page};
use crate::config::PlanningConfig;
use crate::contributors::ContributorsCtrl;
use crate::counter::Counter;
use crate::error::{PlanningError, PlanningResult};
use crate::metadata::MetadataCtrl;
use crate::plan::{
	ExtendedProjectPlan, ProjectPlan, SchedulingContributors, SchedulingOptions, TrackerConfig,
};
use crate::ports::TitlePort;
use crate::service::{OauthHandoff, OauthRequest, PlanningService, TaskSpawner};
use crate::settings::PlainSettings;
use crate::settings_ctrl::SettingsCtrl;
use crate::tracker::TrackerMetadata;

/// Milliseconds since the Unix epoch.
pub type Clock = Rc<dyn Fn() -> i64>;

/// Current wall-clock time in milliseconds.
pub fn system_clock() -> i64 {
	web_time::SystemTime::now()
		.duration_since(web_time::UNIX_EPOCH)
		.map_or(0, |elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
}

/// Collaborators of an [`AppCtrl`].
pub struct AppCtrlOptions {
	pub app: App,
	pub computation: AppComputation,
	pub config: PlanningConfig,
	pub service: Rc<dyn PlanningService>,
	pub oauth: Rc<dyn OauthHandoff>,
	pub spawner: Rc<dyn TaskSpawner>,
	pub title: Rc<dyn TitlePort>,
}

/// A plan as retrieved from the tracker, before prediction.
struct RetrievedPlan {
	plan: ProjectPlan,
	timestamp_ms: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
	BuildPlan,
	UpdatePrediction,
}

/// State shared between the controller and its running pipeline.
struct Pipeline {
	config: PlanningConfig,
	service: Rc<dyn PlanningService>,
	clock: Clock,
	progress: Signal<Option<f64>>,
	metadata: Signal<Option<TrackerMetadata>>,
	extended_plan: Signal<Option<Rc<ExtendedProjectPlan>>>,
	normalized_base_url: Memo<String>,
	alerts: AlertsCtrl,
	retrieved: RefCell<Option<Rc<RetrievedPlan>>>,
}

impl Pipeline {
	async fn run(&self, phase: Phase, settings: PlainSettings) {
		let (title, result) = match phase {
			Phase::BuildPlan => ("Failed to build project plan", self.build_plan(settings).await),
			Phase::UpdatePrediction => (
				"Failed to update prediction",
				self.update_prediction(settings).await,
			),
		};
		if let Err(error) = result {
			tracing::warn!(?phase, %error, "pipeline failed");
			self.alerts.alert(title, &error);
		}
		self.progress.set(None);
	}

	async fn build_plan(&self, settings: PlainSettings) -> PlanningResult<()> {
		let tracker_config = TrackerConfig::from_settings(&settings, &self.config);
		let base_url = self.normalized_base_url.get_untracked();
		tracing::info!(%base_url, "retrieving project plan");

		let progress = self.progress.clone();
		let plan = self
			.service
			.retrieve_project_plan(&base_url, &tracker_config, &|percent_done| {
				progress.set(Some(percent_done));
			})
			.await?;
		*self.retrieved.borrow_mut() = Some(Rc::new(RetrievedPlan {
			plan,
			timestamp_ms: (self.clock)(),
		}));

		self.update_prediction(settings).await
	}

	async fn update_prediction(&self, settings: PlainSettings) -> PlanningResult<()> {
		let retrieved = self.retrieved.borrow().clone();
		let metadata = self.metadata.get_untracked();
		let (Some(retrieved), Some(metadata)) = (retrieved, metadata) else {
			panic!("prediction update requires a retrieved plan and tracker metadata");
		};

		let SchedulingContributors {
			contributors,
			id_to_external_contributor_name,
		} = SchedulingContributors::from_plain(
			&settings.contributors,
			&self.config.external_contributor_id_prefix,
		);
		let options = SchedulingOptions {
			contributors,
			minutes_per_week: metadata.minutes_per_work_week,
			resolution_ms: self.config.scheduling_resolution_ms,
			min_activity_duration: self.config.min_activity_duration,
			prediction_start_time_ms: retrieved.timestamp_ms,
		};
		tracing::info!(
			contributors = options.contributors.len(),
			issues = retrieved.plan.issues.len(),
			"predicting schedule"
		);

		let schedule = self
			.service
			.schedule_unresolved(&retrieved.plan.issues, &options)
			.await?;
		let plan = self.service.append_schedule(
			&retrieved.plan,
			&schedule,
			options.prediction_start_time_ms,
		)?;

		self.extended_plan.set(Some(Rc::new(ExtendedProjectPlan {
			plan,
			settings,
			tracker_timestamp_ms: retrieved.timestamp_ms,
			id_to_external_contributor_name,
		})));
		Ok(())
	}
}

/// Controller for the whole application
pub struct AppCtrl {
	app: App,
	computation: AppComputation,
	oauth: Rc<dyn OauthHandoff>,
	spawner: Rc<dyn TaskSpawner>,
	pipeline: Rc<Pipeline>,
	settings_ctrl: SettingsCtrl,
	metadata_ctrl: MetadataCtrl,
	contributors_ctrl: ContributorsCtrl,
	invalid_counter: Counter,
	action: Memo<Action>,
	num_warnings: Memo<usize>,
	scope: Scope,
}

impl AppCtrl {
	/// Creates the controller with the system clock.
	pub fn new(options: AppCtrlOptions) -> PlanningResult<Rc<Self>> {
		Self::with_clock(options, Rc::new(system_clock))
	}

	/// Creates the controller.
	///
	/// Returns an `Rc` because writing [`AppComputation::do_action`] calls back into it.
	pub fn with_clock(options: AppCtrlOptions, clock: Clock) -> PlanningResult<Rc<Self>> {
		let AppCtrlOptions {
			app,
			computation,
			config,
			service,
			oauth,
			spawner,
			title,
		} = options;
		config.validate()?;

		let settings = &app.settings;
		let settings_ctrl = SettingsCtrl::new(settings);
		let normalized_base_url = settings_ctrl.normalized_base_url();
		let metadata_ctrl = MetadataCtrl::new(
			&computation.metadata,
			&normalized_base_url,
			Rc::clone(&service),
			Rc::clone(&spawner),
			&computation.alerts,
			config.default_minutes_per_work_week,
		);
		let contributors_ctrl = ContributorsCtrl::new(
			&settings.contributors,
			&settings.transient,
			&metadata_ctrl.user_map(),
		);

		let invalid_counter = Counter::new(computation.num_invalid_settings.clone());
		settings_ctrl.register_validity(&invalid_counter)?;
		contributors_ctrl.register_validity(&invalid_counter)?;

		let action = Memo::new({
			let (app, computation) = (app.clone(), computation.clone());
			let pending_metadata = metadata_ctrl.pending_metadata();
			move || {
				let current_settings = app.settings.to_normalized_plain();
				let progress = computation.progress.get();
				let pending_metadata = pending_metadata.get();
				let current_page = app.current_page.get();
				let valid_settings = computation.num_invalid_settings.get() == 0;
				computation.metadata.with(|metadata| {
					computation.extended_plan.with(|plan| {
						action_from_state(&ActionState {
							progress,
							pending_metadata,
							metadata: metadata.as_ref(),
							extended_plan: plan.as_deref(),
							current_settings: &current_settings,
							current_page,
							valid_settings,
						})
					})
				})
			}
		});
		let num_warnings = Memo::new({
			let plan = computation.extended_plan.clone();
			move || plan.with(|plan| plan.as_ref().map_or(0, |p| p.plan.warnings.len()))
		});

		let pipeline = Rc::new(Pipeline {
			config,
			service,
			clock,
			progress: computation.progress.clone(),
			metadata: computation.metadata.clone(),
			extended_plan: computation.extended_plan.clone(),
			normalized_base_url,
			alerts: computation.alerts.clone(),
			retrieved: RefCell::new(None),
		});

		let scope = Scope::new();
		scope.effect({
			let name = settings.name.clone();
			let app_name = pipeline.config.app_name.clone();
			move || {
				let name = name.get();
				if name.is_empty() {
					title.set_title(&app_name);
				} else {
					title.set_title(&format!("{app_name}: {name}"));
				}
			}
		});

		let ctrl = Rc::new(Self {
			app,
			computation,
			oauth,
			spawner,
			pipeline,
			settings_ctrl,
			metadata_ctrl,
			contributors_ctrl,
			invalid_counter,
			action,
			num_warnings,
			scope,
		});

		let weak = Rc::downgrade(&ctrl);
		let mut initial = true;
		ctrl.scope.effect({
			let do_action = ctrl.computation.do_action.clone();
			move || {
				do_action.get();
				if core::mem::take(&mut initial) {
					return;
				}
				if let Some(ctrl) = weak.upgrade() {
					untrack(|| ctrl.default_action());
				}
			}
		});

		Ok(ctrl)
	}

	/// The current action.
	pub fn action(&self) -> Memo<Action> {
		self.action.clone()
	}

	/// Number of warnings of the current plan.
	pub fn num_warnings(&self) -> Memo<usize> {
		self.num_warnings.clone()
	}

	/// Latest computed plan.
	pub fn extended_plan(&self) -> Signal<Option<Rc<ExtendedProjectPlan>>> {
		self.computation.extended_plan.clone()
	}

	pub fn app(&self) -> &App {
		&self.app
	}

	pub fn computation(&self) -> &AppComputation {
		&self.computation
	}

	pub fn settings_ctrl(&self) -> &SettingsCtrl {
		&self.settings_ctrl
	}

	pub fn metadata_ctrl(&self) -> &MetadataCtrl {
		&self.metadata_ctrl
	}

	pub fn contributors_ctrl(&self) -> &ContributorsCtrl {
		&self.contributors_ctrl
	}

	/// The counter behind [`AppComputation::num_invalid_settings`].
	pub fn invalid_counter(&self) -> &Counter {
		&self.invalid_counter
	}

	/// Performs the current action.
	///
	/// Pipeline actions set the progress before returning, so the action turns into
	/// [`Action::Stop`] right away and a second call is a no-op until the pipeline ends.
	pub fn default_action(&self) {
		let action = self.action.get_untracked();
		tracing::debug!(action = action.as_str(), "default action");
		match action {
			Action::CompleteSettings => self.app.current_page.set(Page::Settings),
			Action::Connect => self.connect(),
			Action::BuildPlan => self.start(Phase::BuildPlan),
			Action::UpdatePrediction => self.start(Phase::UpdatePrediction),
			Action::Stop | Action::Nothing => {}
		}
	}

	fn start(&self, phase: Phase) {
		let settings = untrack(|| self.app.settings.to_normalized_plain());
		self.computation.progress.set(Some(0.0));
		let pipeline = Rc::clone(&self.pipeline);
		self.spawner
			.spawn(Box::pin(async move { pipeline.run(phase, settings).await }));
	}

	fn connect(&self) {
		let request = untrack(|| {
			let settings = &self.app.settings;
			serde_json::to_value(self.app.to_plain()).map(|state| OauthRequest {
				base_url: self.settings_ctrl.normalized_base_url().get(),
				hub_url: settings.hub_url.get(),
				service_id: settings.you_track_service_id.get(),
				state,
			})
		});
		match request {
			Ok(request) => {
				tracing::info!(base_url = %request.base_url, "redirecting to OAuth page");
				self.oauth.go_to_oauth_page(request);
			}
			Err(error) => {
				self.computation
					.alerts
					.alert("Failed to connect", &PlanningError::from(error));
			}
		}
	}
}

impl core::fmt::Debug for AppCtrl {
	fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
		f.debug_struct("AppCtrl")
			.field("action", &self.action)
			.field("invalid_counter", &self.invalid_counter)
			.finish_non_exhaustive()
	}
}
