//! Settings controller
//!
//! Derives the normalized base URL, builds links into the tracker, registers the settings'
//! validity checks with the invalid-settings counter and keeps the overlay query distinct
//! from the main query.

use std::rc::Rc;

use trackplan_reactive::{Memo, Scope, Signal};
use url::Url;

use crate::counter::{Counter, Observation};
use crate::error::CounterError;
use crate::settings::{Settings, normalized_base_url};

/// Controller for [`Settings`]
pub struct SettingsCtrl {
	settings: Settings,
	normalized_base_url: Memo<String>,
	validity: Vec<Observation>,
	_scope: Scope,
}

impl SettingsCtrl {
	pub fn new(settings: &Settings) -> Self {
		let normalized = Memo::new({
			let base_url = settings.you_track_base_url.clone();
			move || base_url.with(|url| normalized_base_url(url))
		});

		let scope = Scope::new();
		scope.effect({
			let saved = settings.saved_query_id.clone();
			let overlay = settings.overlay_saved_query_id.clone();
			move || {
				if saved.with(|saved| overlay.with(|overlay| saved == overlay)) {
					overlay.set_if_changed(String::new());
				}
			}
		});

		let validity = vec![
			is_empty_observation(&normalized),
			is_empty_signal(&settings.you_track_service_id),
			is_empty_signal(&settings.state_field_id),
			is_empty_signal(&settings.remaining_effort_field_id),
			is_empty_signal(&settings.assignee_field_id),
			is_empty_signal(&settings.saved_query_id),
			is_empty_signal(&settings.depends_link_type_id),
		];

		Self {
			settings: settings.clone(),
			normalized_base_url: normalized,
			validity,
			_scope: scope,
		}
	}

	/// The settings.
	pub fn settings(&self) -> &Settings {
		&self.settings
	}

	/// Normalized base URL, `""` if the typed URL is unusable.
	pub fn normalized_base_url(&self) -> Memo<String> {
		self.normalized_base_url.clone()
	}

	/// Resolves `relative_path` against the base URL; `""` without a usable base URL.
	///
	/// Reads are tracked, so the result can drive a link's `href`.
	pub fn href_relative_to_base_url(&self, relative_path: &str) -> String {
		self.normalized_base_url
			.with(|base_url| resolve(base_url, relative_path))
	}

	/// Like [`SettingsCtrl::href_relative_to_base_url`], with a path that depends on the
	/// service id. `""` unless both base URL and service id are set.
	pub fn hub_relative_to_base_url_and_service_id<F>(&self, relative_path: F) -> String
	where
		F: FnOnce(&str) -> String,
	{
		let service_id = self.settings.you_track_service_id.get();
		if service_id.is_empty() {
			return String::new();
		}
		let path = relative_path(&service_id);
		self.href_relative_to_base_url(&path)
	}

	/// Registers the validity checks; each is true while its setting is missing.
	pub fn register_validity(&self, counter: &Counter) -> Result<(), CounterError> {
		self.validity
			.iter()
			.try_for_each(|observation| counter.add(observation))
	}

	/// Removes the validity checks from `counter`.
	pub fn unregister_validity(&self, counter: &Counter) -> Result<(), CounterError> {
		self.validity
			.iter()
			.try_for_each(|observation| counter.delete(observation))
	}
}

impl core::fmt::Debug for SettingsCtrl {
	fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
		f.debug_struct("SettingsCtrl")
			.field("normalized_base_url", &self.normalized_base_url)
			.finish_non_exhaustive()
	}
}

fn resolve(base_url: &str, relative_path: &str) -> String {
	if base_url.is_empty() {
		return String::new();
	}
	match Url::parse(base_url).and_then(|base| base.join(relative_path)) {
		Ok(url) => url.into(),
		Err(error) => {
			tracing::debug!(%error, base_url, relative_path, "cannot resolve tracker link");
			String::new()
		}
	}
}

fn is_empty_signal(signal: &Signal<String>) -> Observation {
	let signal = signal.clone();
	Rc::new(move || signal.with(String::is_empty))
}

fn is_empty_observation(memo: &Memo<String>) -> Observation {
	let memo = memo.clone();
	Rc::new(move || memo.with(String::is_empty))
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serial_test::serial;

	fn complete(settings: &Settings) {
		settings.you_track_base_url.set("https://tracker.example".to_string());
		settings.you_track_service_id.set("svc-1".to_string());
		settings.state_field_id.set("92-1".to_string());
		settings.remaining_effort_field_id.set("92-2".to_string());
		settings.assignee_field_id.set("92-3".to_string());
		settings.saved_query_id.set("95-1".to_string());
		settings.depends_link_type_id.set("91-1".to_string());
	}

	#[rstest]
	#[serial]
	fn test_validity_counts_missing_settings() {
		let settings = Settings::new();
		let ctrl = SettingsCtrl::new(&settings);
		let counter = Counter::default();

		ctrl.register_validity(&counter).unwrap();
		assert_eq!(counter.count().get_untracked(), 7);

		complete(&settings);
		assert_eq!(counter.count().get_untracked(), 0);

		settings.you_track_base_url.set("not a url".to_string());
		assert_eq!(counter.count().get_untracked(), 1);

		ctrl.unregister_validity(&counter).unwrap();
		assert_eq!(counter.count().get_untracked(), 0);
	}

	#[rstest]
	#[serial]
	fn test_overlay_equal_to_saved_query_is_cleared() {
		let settings = Settings::new();
		let _ctrl = SettingsCtrl::new(&settings);
		settings.saved_query_id.set("95-1".to_string());
		settings.overlay_saved_query_id.set("95-2".to_string());

		settings.overlay_saved_query_id.set("95-1".to_string());

		assert_eq!(settings.overlay_saved_query_id.get_untracked(), "");
		assert_eq!(settings.saved_query_id.get_untracked(), "95-1");
	}

	#[rstest]
	#[serial]
	fn test_links_relative_to_base_url() {
		let settings = Settings::new();
		let ctrl = SettingsCtrl::new(&settings);

		assert_eq!(ctrl.href_relative_to_base_url("admin/users"), "");

		settings.you_track_base_url.set("https://tracker.example/yt".to_string());
		assert_eq!(ctrl.normalized_base_url().get_untracked(), "https://tracker.example/yt/");
		assert_eq!(
			ctrl.href_relative_to_base_url("admin/users"),
			"https://tracker.example/yt/admin/users"
		);
		assert_eq!(
			ctrl.hub_relative_to_base_url_and_service_id(|id| format!("hub/services/{id}")),
			""
		);

		settings.you_track_service_id.set("svc-1".to_string());
		assert_eq!(
			ctrl.hub_relative_to_base_url_and_service_id(|id| format!("hub/services/{id}")),
			"https://tracker.example/yt/hub/services/svc-1"
		);
	}
}
