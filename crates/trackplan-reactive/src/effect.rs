//! Effect - Reactive Side Effects
//!
//! `Effect` represents a side effect that automatically re-runs when its dependencies change.
//! Dependencies are tracked automatically - any Signal accessed inside the effect closure
//! becomes a dependency, and the set is collected afresh on every run.
//!
//! ## Key Features
//!
//! - **Automatic Dependency Tracking**: Signal::get() calls inside the effect are automatically tracked
//! - **Synchronous Re-execution**: When a dependent Signal changes, the effect re-runs before
//!   the write returns (or when the enclosing batch closes)
//! - **Memory Safe**: Automatically removes itself from the dependency graph when dropped
//!
//! ## Example
//!
//! ```ignore
//! use trackplan_reactive::{Signal, Effect};
//!
//! let count = Signal::new(0);
//!
//! let _effect = Effect::new({
//!     let count = count.clone();
//!     move || println!("Count is: {}", count.get())
//! });
//!
//! count.set(42); // Prints: "Count is: 42"
//! ```

use core::cell::{Cell, RefCell};

use std::collections::BTreeMap;
use std::rc::Rc;

use crate::runtime::{NodeId, NodeType, Observer, batch, try_with_runtime, with_runtime};

/// Type alias for effect functions
type EffectFn = Box<dyn FnMut() + 'static>;

struct EffectSlot {
	node_type: NodeType,
	run: EffectFn,
	disposed: Rc<Cell<bool>>,
}

// Storage for Effect closures, keyed by node.
//
// A closure is taken out of the map while it runs, so an effect may create or dispose
// other effects (or itself) without re-entering a borrow.
thread_local! {
	static EFFECT_FUNCTIONS: RefCell<BTreeMap<NodeId, EffectSlot>> = RefCell::new(BTreeMap::new());
}

/// A reactive effect that automatically re-runs when its dependencies change
///
/// Effects are the bridge between the reactive system and the outside world (DOM, location
/// hash, document title, remote calls). They run immediately when created.
pub struct Effect {
	/// Unique identifier for this effect
	id: NodeId,
	/// Whether this effect has been disposed
	disposed: Rc<Cell<bool>>,
}

impl Effect {
	/// Create a new Effect that runs the given function
	///
	/// The function runs immediately, and will automatically re-run whenever any
	/// Signal it accesses changes.
	pub fn new<F>(f: F) -> Self
	where
		F: FnMut() + 'static,
	{
		Self::with_node_type(f, NodeType::Effect)
	}

	pub(crate) fn with_node_type<F>(f: F, node_type: NodeType) -> Self
	where
		F: FnMut() + 'static,
	{
		let id = NodeId::new();
		let disposed = Rc::new(Cell::new(false));

		EFFECT_FUNCTIONS.with(|storage| {
			storage.borrow_mut().insert(
				id,
				EffectSlot {
					node_type,
					run: Box::new(f),
					disposed: Rc::clone(&disposed),
				},
			);
		});

		// Writes performed by the first run are propagated after it completes
		batch(|| Self::execute_effect(id));

		Self { id, disposed }
	}

	/// Execute an effect by its ID
	///
	/// This is called internally by the runtime when an effect needs to re-run.
	pub(crate) fn execute_effect(effect_id: NodeId) {
		let Some(mut slot) = EFFECT_FUNCTIONS.with(|storage| storage.borrow_mut().remove(&effect_id))
		else {
			return;
		};
		if slot.disposed.get() {
			return;
		}

		with_runtime(|rt| {
			// Clear old dependencies before re-running
			rt.clear_dependencies(effect_id);
			rt.push_observer(Observer {
				id: effect_id,
				node_type: slot.node_type,
			});
		});

		(slot.run)();

		with_runtime(|rt| {
			rt.pop_observer();
		});

		if slot.disposed.get() {
			// Disposed while running: drop the dependencies collected by this run
			let _ = try_with_runtime(|rt| rt.remove_node(effect_id));
		} else {
			EFFECT_FUNCTIONS.with(|storage| {
				storage.borrow_mut().insert(effect_id, slot);
			});
		}
	}

	/// Get the NodeId of this effect
	pub fn id(&self) -> NodeId {
		self.id
	}

	/// Whether this effect has been disposed
	pub fn is_disposed(&self) -> bool {
		self.disposed.get()
	}

	/// Dispose this effect
	///
	/// After calling this, the effect will no longer run and its resources will be cleaned up.
	pub fn dispose(&self) {
		if self.disposed.replace(true) {
			return;
		}

		// Remove from runtime's dependency graph (ignore if TLS is destroyed)
		let _ = try_with_runtime(|rt| rt.remove_node(self.id));

		// Remove from storage (ignore if TLS is destroyed)
		let removed = EFFECT_FUNCTIONS.try_with(|storage| storage.borrow_mut().remove(&self.id));
		// The closure may own signals whose drop touches the runtime; drop it outside the borrow
		drop(removed);
	}
}

impl Drop for Effect {
	fn drop(&mut self) {
		self.dispose();
	}
}

impl core::fmt::Debug for Effect {
	fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
		f.debug_struct("Effect")
			.field("id", &self.id)
			.field("disposed", &self.disposed.get())
			.finish()
	}
}
