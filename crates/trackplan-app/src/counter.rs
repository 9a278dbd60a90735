//! Counter of true observations
//!
//! A [`Counter`] keeps a reactive count of how many registered boolean observations are
//! currently true. The settings form registers one observation per validity check, and the
//! count of invalid settings drives the top-level action.
//!
//! ## Example
//!
//! ```ignore
//! let value = Signal::new(String::new());
//! let counter = Counter::default();
//! let is_empty: Observation = Rc::new({
//!     let value = value.clone();
//!     move || value.with(String::is_empty)
//! });
//!
//! counter.add(&is_empty)?;
//! assert_eq!(counter.count().get(), 1);
//! value.set("x".into());
//! assert_eq!(counter.count().get(), 0);
//! ```

use core::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use trackplan_reactive::{Scope, Signal};

use crate::error::CounterError;

/// A boolean observation; signals read inside it are tracked.
pub type Observation = Rc<dyn Fn() -> bool>;

struct Registration {
	// Held so the observation's address stays unique while registered.
	_observation: Observation,
	last: Rc<Cell<bool>>,
	scope: Scope,
}

/// Reactive count of currently-true observations
pub struct Counter {
	count: Signal<usize>,
	num_true: Rc<Cell<usize>>,
	registrations: RefCell<HashMap<usize, Registration>>,
}

impl Counter {
	/// Creates a counter that publishes into `count`, resetting it to zero.
	pub fn new(count: Signal<usize>) -> Self {
		count.set_if_changed(0);
		Self {
			count,
			num_true: Rc::new(Cell::new(0)),
			registrations: RefCell::new(HashMap::new()),
		}
	}

	/// The count signal.
	pub fn count(&self) -> Signal<usize> {
		self.count.clone()
	}

	/// Number of registered observations.
	pub fn len(&self) -> usize {
		self.registrations.borrow().len()
	}

	/// Whether no observation is registered.
	pub fn is_empty(&self) -> bool {
		self.registrations.borrow().is_empty()
	}

	/// Starts watching `observation`.
	///
	/// The count is incremented right away if the observation is currently true.
	pub fn add(&self, observation: &Observation) -> Result<(), CounterError> {
		let key = observation_key(observation);
		if self.registrations.borrow().contains_key(&key) {
			return Err(CounterError::AlreadyRegistered);
		}

		let last = Rc::new(Cell::new(false));
		let scope = Scope::new();
		scope.effect({
			let observation = Rc::clone(observation);
			let last = Rc::clone(&last);
			let num_true = Rc::clone(&self.num_true);
			let count = self.count.clone();
			move || {
				let current = observation();
				if current != last.replace(current) {
					let next = if current {
						num_true.get() + 1
					} else {
						num_true.get() - 1
					};
					num_true.set(next);
					count.set(next);
				}
			}
		});

		self.registrations.borrow_mut().insert(
			key,
			Registration {
				_observation: Rc::clone(observation),
				last,
				scope,
			},
		);
		Ok(())
	}

	/// Stops watching `observation`, first removing its contribution to the count.
	pub fn delete(&self, observation: &Observation) -> Result<(), CounterError> {
		let registration = self
			.registrations
			.borrow_mut()
			.remove(&observation_key(observation))
			.ok_or(CounterError::NotRegistered)?;

		if registration.last.get() {
			let next = self.num_true.get() - 1;
			self.num_true.set(next);
			self.count.set(next);
		}
		registration.scope.dispose();
		Ok(())
	}
}

impl Default for Counter {
	fn default() -> Self {
		Self::new(Signal::new(0))
	}
}

impl core::fmt::Debug for Counter {
	fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
		f.debug_struct("Counter")
			.field("count", &self.num_true.get())
			.field("registrations", &self.len())
			.finish()
	}
}

fn observation_key(observation: &Observation) -> usize {
	Rc::as_ptr(observation).cast::<()>() as usize
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serial_test::serial;

	fn is_empty(value: &Signal<String>) -> Observation {
		let value = value.clone();
		Rc::new(move || value.with(String::is_empty))
	}

	#[rstest]
	#[serial]
	fn test_count_follows_observations() {
		let first = Signal::new(String::new());
		let second = Signal::new("set".to_string());
		let counter = Counter::default();
		let (first_empty, second_empty) = (is_empty(&first), is_empty(&second));

		counter.add(&first_empty).unwrap();
		counter.add(&second_empty).unwrap();
		assert_eq!(counter.count().get_untracked(), 1);

		second.set(String::new());
		assert_eq!(counter.count().get_untracked(), 2);

		first.set("x".to_string());
		second.set("y".to_string());
		assert_eq!(counter.count().get_untracked(), 0);
	}

	#[rstest]
	#[serial]
	fn test_delete_removes_contribution() {
		let value = Signal::new(String::new());
		let counter = Counter::default();
		let observation = is_empty(&value);

		counter.add(&observation).unwrap();
		counter.delete(&observation).unwrap();

		assert_eq!(counter.count().get_untracked(), 0);
		value.set("x".to_string());
		value.set(String::new());
		assert_eq!(counter.count().get_untracked(), 0);
		assert!(counter.is_empty());
	}

	#[rstest]
	#[serial]
	fn test_double_add_is_rejected() {
		let counter = Counter::default();
		let observation: Observation = Rc::new(|| true);

		counter.add(&observation).unwrap();

		assert_eq!(counter.add(&observation), Err(CounterError::AlreadyRegistered));
		assert_eq!(counter.count().get_untracked(), 1);
	}

	#[rstest]
	#[serial]
	fn test_delete_without_add_is_rejected() {
		let counter = Counter::default();
		let observation: Observation = Rc::new(|| true);

		assert_eq!(counter.delete(&observation), Err(CounterError::NotRegistered));
	}

	#[rstest]
	#[serial]
	fn test_shared_count_signal_is_reset() {
		let count = Signal::new(7);

		let counter = Counter::new(count.clone());

		assert_eq!(count.get_untracked(), 0);
		assert_eq!(counter.count().get_untracked(), 0);
	}
}
