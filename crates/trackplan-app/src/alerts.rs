//! User-visible alerts
//!
//! Failures of the action pipeline and of the metadata fetch are not propagated to a
//! caller; they become alerts that the UI lists until the user dismisses them.

use core::cell::Cell;
use core::fmt::Display;
use std::rc::Rc;

use trackplan_reactive::Signal;

/// Identifier of an alert, unique within one [`AlertsCtrl`].
pub type AlertId = u64;

/// An alert
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
	pub id: AlertId,
	pub title: String,
	pub message: String,
}

/// The alert list
#[derive(Debug, Clone, Default)]
pub struct AlertsCtrl {
	alerts: Signal<Vec<Alert>>,
	next_id: Rc<Cell<AlertId>>,
}

impl AlertsCtrl {
	/// Creates an empty alert list.
	pub fn new() -> Self {
		Self::default()
	}

	/// The alerts, oldest first.
	pub fn alerts(&self) -> Signal<Vec<Alert>> {
		self.alerts.clone()
	}

	/// Appends an alert describing `failure` and returns its id.
	pub fn alert<E>(&self, title: impl Into<String>, failure: &E) -> AlertId
	where
		E: Display + ?Sized,
	{
		let id = self.next_id.get();
		self.next_id.set(id + 1);
		let alert = Alert {
			id,
			title: title.into(),
			message: failure.to_string(),
		};
		tracing::warn!(id, title = %alert.title, message = %alert.message, "alert raised");
		self.alerts.update(|alerts| alerts.push(alert));
		id
	}

	/// Removes an alert by id. Unknown alerts are ignored.
	pub fn remove(&self, alert: &Alert) {
		let id = alert.id;
		if self.alerts.with_untracked(|alerts| alerts.iter().any(|a| a.id == id)) {
			self.alerts.update(|alerts| alerts.retain(|a| a.id != id));
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::error::ServiceError;
	use rstest::rstest;
	use serial_test::serial;

	#[rstest]
	#[serial]
	fn test_alert_and_dismiss() {
		let ctrl = AlertsCtrl::new();

		ctrl.alert(
			"Failed to build project plan",
			&ServiceError::Network("connection reset".to_string()),
		);
		ctrl.alert("Failed to update prediction", "no capacity");

		let alerts = ctrl.alerts().get_untracked();
		assert_eq!(alerts.len(), 2);
		assert_eq!(alerts[0].message, "network error: connection reset");
		assert_ne!(alerts[0].id, alerts[1].id);

		ctrl.remove(&alerts[0]);
		ctrl.remove(&alerts[0]);
		let alerts = ctrl.alerts().get_untracked();
		assert_eq!(alerts.len(), 1);
		assert_eq!(alerts[0].title, "Failed to update prediction");
	}
}
