//! Disposal scopes
//!
//! A [`Scope`] owns effects and cleanup callbacks. Disposing the scope (explicitly or by
//! dropping it) disposes every owned effect and then runs the cleanups in reverse order of
//! registration. Event-listener registrations pair naturally with [`Scope::on_cleanup`].

use core::cell::{Cell, RefCell};

use crate::effect::Effect;

type Cleanup = Box<dyn FnOnce() + 'static>;

/// Owner of effects and cleanup callbacks
#[derive(Default)]
pub struct Scope {
	effects: RefCell<Vec<Effect>>,
	cleanups: RefCell<Vec<Cleanup>>,
	disposed: Cell<bool>,
}

impl Scope {
	/// Create an empty scope
	pub fn new() -> Self {
		Self::default()
	}

	/// Create an effect owned by this scope
	pub fn effect<F>(&self, f: F)
	where
		F: FnMut() + 'static,
	{
		self.own(Effect::new(f));
	}

	/// Take ownership of an existing effect
	///
	/// If the scope is already disposed the effect is disposed right away.
	pub fn own(&self, effect: Effect) {
		if self.disposed.get() {
			effect.dispose();
			return;
		}
		self.effects.borrow_mut().push(effect);
	}

	/// Register a callback that runs when the scope is disposed
	pub fn on_cleanup<F>(&self, f: F)
	where
		F: FnOnce() + 'static,
	{
		if self.disposed.get() {
			f();
			return;
		}
		self.cleanups.borrow_mut().push(Box::new(f));
	}

	/// Whether the scope has been disposed
	pub fn is_disposed(&self) -> bool {
		self.disposed.get()
	}

	/// Dispose all owned effects and run cleanups
	pub fn dispose(&self) {
		if self.disposed.replace(true) {
			return;
		}

		let effects = core::mem::take(&mut *self.effects.borrow_mut());
		for effect in &effects {
			effect.dispose();
		}
		drop(effects);

		let cleanups = core::mem::take(&mut *self.cleanups.borrow_mut());
		for cleanup in cleanups.into_iter().rev() {
			cleanup();
		}
	}
}

impl Drop for Scope {
	fn drop(&mut self) {
		self.dispose();
	}
}

impl core::fmt::Debug for Scope {
	fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
		f.debug_struct("Scope")
			.field("effects", &self.effects.borrow().len())
			.field("cleanups", &self.cleanups.borrow().len())
			.field("disposed", &self.disposed.get())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::Signal;
	use serial_test::serial;
	use std::rc::Rc;

	#[test]
	#[serial]
	fn test_dispose_stops_effects_and_runs_cleanups_in_reverse() {
		let signal = Signal::new(0);
		let runs = Rc::new(Cell::new(0));
		let order = Rc::new(RefCell::new(Vec::new()));

		let scope = Scope::new();
		scope.effect({
			let (signal, runs) = (signal.clone(), runs.clone());
			move || {
				let _ = signal.get();
				runs.set(runs.get() + 1);
			}
		});
		for label in ["first", "second"] {
			let order = order.clone();
			scope.on_cleanup(move || order.borrow_mut().push(label));
		}

		scope.dispose();
		signal.set(1);

		assert_eq!(runs.get(), 1);
		assert_eq!(*order.borrow(), vec!["second", "first"]);
	}

	#[test]
	#[serial]
	fn test_cleanup_after_dispose_runs_immediately() {
		let scope = Scope::new();
		scope.dispose();

		let ran = Rc::new(Cell::new(false));
		let ran_clone = ran.clone();
		scope.on_cleanup(move || ran_clone.set(true));

		assert!(ran.get());
	}
}
