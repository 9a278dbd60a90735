//! Signal - Fine-grained Reactive Primitive
//!
//! `Signal<T>` is the core reactive primitive that holds a value and automatically
//! tracks dependencies when accessed.
//!
//! ## Key Features
//!
//! - **Automatic Dependency Tracking**: When `get()` is called inside an Effect or Memo,
//!   the dependency is automatically recorded.
//! - **Change Notification**: When `set()` or `update()` is called, all dependent Effects
//!   re-run (after the outermost batch, if one is open).
//! - **Sampling**: `get_untracked()` reads the value without creating a dependency.
//! - **Type-safe**: The value type is enforced at compile time.
//!
//! ## Example
//!
//! ```ignore
//! use trackplan_reactive::Signal;
//!
//! let count = Signal::new(0);
//! assert_eq!(count.get(), 0);
//!
//! count.set(42);
//! count.update(|n| *n += 1);
//! assert_eq!(count.get(), 43);
//! ```

use core::cell::RefCell;
use core::fmt;

use std::rc::Rc;

use crate::runtime::{NodeId, try_with_runtime, with_runtime};

/// A reactive signal that holds a value and tracks dependencies
///
/// ## Cloning
///
/// `Signal<T>` implements `Clone` and shares the value via `Rc<RefCell<T>>`.
/// All clones of the same Signal share the same underlying value and node.
pub struct Signal<T: 'static> {
	/// Unique identifier for this signal
	id: NodeId,
	/// The actual value, shared via reference counting
	value: Rc<RefCell<T>>,
}

impl<T: 'static> Clone for Signal<T> {
	fn clone(&self) -> Self {
		Self {
			id: self.id,
			value: Rc::clone(&self.value),
		}
	}
}

impl<T: 'static> Signal<T> {
	/// Create a new Signal with the given initial value
	pub fn new(value: T) -> Self {
		Self {
			id: NodeId::new(),
			value: Rc::new(RefCell::new(value)),
		}
	}

	/// Get the current value of the signal
	///
	/// This automatically tracks the dependency if called from within an Effect or Memo.
	pub fn get(&self) -> T
	where
		T: Clone,
	{
		self.track();
		self.get_untracked()
	}

	/// Get the current value without tracking dependencies
	pub fn get_untracked(&self) -> T
	where
		T: Clone,
	{
		self.value.borrow().clone()
	}

	/// Borrow the current value, tracking the dependency
	///
	/// Avoids cloning large values such as collections.
	pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
		self.track();
		self.with_untracked(f)
	}

	/// Borrow the current value without tracking dependencies
	pub fn with_untracked<R>(&self, f: impl FnOnce(&T) -> R) -> R {
		f(&self.value.borrow())
	}

	/// Set the signal to a new value
	///
	/// Dependents are notified even if the new value equals the old one.
	pub fn set(&self, value: T) {
		*self.value.borrow_mut() = value;
		self.notify();
	}

	/// Set the signal to a new value, notifying dependents only if it differs
	///
	/// Returns whether the value changed.
	pub fn set_if_changed(&self, value: T) -> bool
	where
		T: PartialEq,
	{
		let changed = *self.value.borrow() != value;
		if changed {
			self.set(value);
		}
		changed
	}

	/// Update the signal's value using a function
	///
	/// Dependents are notified once, after `f` returns.
	pub fn update<F>(&self, f: F)
	where
		F: FnOnce(&mut T),
	{
		f(&mut *self.value.borrow_mut());
		self.notify();
	}

	/// Get the NodeId of this signal
	pub fn id(&self) -> NodeId {
		self.id
	}

	/// Whether two handles refer to the same signal
	pub fn ptr_eq(&self, other: &Self) -> bool {
		Rc::ptr_eq(&self.value, &other.value)
	}

	fn track(&self) {
		with_runtime(|rt| rt.track_dependency(self.id));
	}

	fn notify(&self) {
		with_runtime(|rt| rt.notify_signal_change(self.id));
	}
}

impl<T: Default + 'static> Default for Signal<T> {
	fn default() -> Self {
		Self::new(T::default())
	}
}

impl<T: 'static> Drop for Signal<T> {
	fn drop(&mut self) {
		// Only cleanup Runtime when this is the last Signal clone
		if Rc::strong_count(&self.value) == 1 {
			let _ = try_with_runtime(|rt| rt.remove_node(self.id));
		}
	}
}

impl<T: fmt::Debug + 'static> fmt::Debug for Signal<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Signal")
			.field("id", &self.id)
			.field("value", &*self.value.borrow())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::runtime::{NodeType, Observer};
	use serial_test::serial;

	#[test]
	#[serial]
	fn test_signal_set_and_update() {
		let signal = Signal::new(0);

		signal.set(100);
		assert_eq!(signal.get_untracked(), 100);

		signal.update(|n| *n *= 2);
		assert_eq!(signal.get_untracked(), 200);
	}

	#[test]
	#[serial]
	fn test_signal_clone_shares_value() {
		let signal1 = Signal::new(42);
		let signal2 = signal1.clone();

		signal1.set(100);
		assert_eq!(signal2.get_untracked(), 100);
		assert!(signal1.ptr_eq(&signal2));
		assert!(!signal1.ptr_eq(&Signal::new(100)));
	}

	#[test]
	#[serial]
	fn test_set_if_changed_reports_change() {
		let signal = Signal::new(String::from("a"));

		assert!(!signal.set_if_changed(String::from("a")));
		assert!(signal.set_if_changed(String::from("b")));
		assert_eq!(signal.get_untracked(), "b");
	}

	#[test]
	#[serial]
	fn test_signal_dependency_tracking() {
		let signal = Signal::new(42);

		with_runtime(|rt| {
			let observer_id = NodeId::new();
			rt.push_observer(Observer {
				id: observer_id,
				node_type: NodeType::Effect,
			});

			let _ = signal.with(|value| *value);

			rt.pop_observer();

			let graph = rt.dependency_graph.borrow();
			let signal_node = graph.get(&signal.id()).unwrap();
			assert!(signal_node.subscribers.contains(&observer_id));
		});
	}

	#[test]
	#[serial]
	fn test_last_clone_drop_removes_node() {
		let signal = Signal::new(1);
		let id = signal.id();

		with_runtime(|rt| {
			rt.push_observer(Observer {
				id: NodeId::new(),
				node_type: NodeType::Effect,
			});
			let _ = signal.get();
			rt.pop_observer();
		});
		assert!(with_runtime(|rt| rt.has_node(id)));

		let clone = signal.clone();
		drop(signal);
		assert!(with_runtime(|rt| rt.has_node(id)));

		drop(clone);
		assert!(!with_runtime(|rt| rt.has_node(id)));
	}
}
