//! Memo - Derived Reactive Values
//!
//! A `Memo<T>` is a value computed from other signals. It is kept current by an internal
//! effect and only notifies its own dependents when the recomputed value differs from the
//! previous one, which makes it the building block for derived state such as "the current
//! action" or "the normalized base URL".

use core::cell::RefCell;
use core::fmt;

use std::rc::Rc;

use crate::effect::Effect;
use crate::runtime::NodeType;
use crate::signal::Signal;

/// A derived value with automatic dependency tracking
///
/// Clones share the same value and the same backing effect. The effect is disposed once
/// the last clone is dropped.
pub struct Memo<T: 'static> {
	value: Signal<T>,
	effect: Rc<Effect>,
}

impl<T: 'static> Clone for Memo<T> {
	fn clone(&self) -> Self {
		Self {
			value: self.value.clone(),
			effect: Rc::clone(&self.effect),
		}
	}
}

impl<T: PartialEq + 'static> Memo<T> {
	/// Create a new Memo from the given computation
	///
	/// The computation runs immediately and re-runs whenever a signal it read changes.
	///
	/// # Example
	///
	/// ```ignore
	/// let count = Signal::new(2);
	/// let doubled = Memo::new({
	///     let count = count.clone();
	///     move || count.get() * 2
	/// });
	/// assert_eq!(doubled.get(), 4);
	/// ```
	pub fn new<F>(mut f: F) -> Self
	where
		F: FnMut() -> T + 'static,
	{
		let slot: Rc<RefCell<Option<Signal<T>>>> = Rc::new(RefCell::new(None));
		let effect = Effect::with_node_type(
			{
				let slot = Rc::clone(&slot);
				move || {
					let next = f();
					let current = slot.borrow().clone();
					match current {
						Some(signal) => {
							signal.set_if_changed(next);
						}
						None => *slot.borrow_mut() = Some(Signal::new(next)),
					}
				}
			},
			NodeType::Memo,
		);

		let value = slot
			.borrow()
			.clone()
			.expect("memo computation runs when the memo is created");

		Self {
			value,
			effect: Rc::new(effect),
		}
	}
}

impl<T: 'static> Memo<T> {
	/// Get the current value, tracking the dependency
	pub fn get(&self) -> T
	where
		T: Clone,
	{
		self.value.get()
	}

	/// Get the current value without tracking the dependency
	pub fn get_untracked(&self) -> T
	where
		T: Clone,
	{
		self.value.get_untracked()
	}

	/// Borrow the current value, tracking the dependency
	pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
		self.value.with(f)
	}

	/// Whether the backing effect is still alive
	pub fn is_active(&self) -> bool {
		!self.effect.is_disposed()
	}
}

impl<T: fmt::Debug + 'static> fmt::Debug for Memo<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Memo").field("value", &self.value).finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use core::cell::Cell;
	use serial_test::serial;

	#[test]
	#[serial]
	fn test_memo_follows_source() {
		let count = Signal::new(5);
		let doubled = Memo::new({
			let count = count.clone();
			move || count.get() * 2
		});

		assert_eq!(doubled.get(), 10);
		count.set(7);
		assert_eq!(doubled.get(), 14);
	}

	#[test]
	#[serial]
	fn test_memo_suppresses_equal_values() {
		let count = Signal::new(4);
		let parity = Memo::new({
			let count = count.clone();
			move || count.get() % 2
		});
		let runs = Rc::new(Cell::new(0));
		let _effect = Effect::new({
			let (parity, runs) = (parity.clone(), runs.clone());
			move || {
				let _ = parity.get();
				runs.set(runs.get() + 1);
			}
		});

		count.set(6);
		assert_eq!(runs.get(), 1);
		count.set(7);
		assert_eq!(runs.get(), 2);
	}

	#[test]
	#[serial]
	fn test_memo_chain() {
		let base = Signal::new(1);
		let plus_one = Memo::new({
			let base = base.clone();
			move || base.get() + 1
		});
		let times_ten = Memo::new({
			let plus_one = plus_one.clone();
			move || plus_one.get() * 10
		});

		base.set(4);
		assert_eq!(times_ten.get(), 50);
	}
}
