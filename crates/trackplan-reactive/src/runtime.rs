//! Reactive Runtime
//!
//! This module provides the core reactive runtime for managing Signal dependencies,
//! Effect execution, and transactional batching.
//!
//! ## Architecture
//!
//! The reactive system is push-based and fully synchronous:
//!
//! 1. **Observer Stack**: Tracks the currently executing Effect (or an untracked section)
//! 2. **Dependency Tracking**: Automatically records dependencies when `Signal::get()` is called
//! 3. **Update Propagation**: A signal write queues all subscribers; the queue is flushed
//!    immediately unless a batch is open or a flush is already in progress
//! 4. **Batching**: `batch()` defers the flush until the outermost batch closes, so dependents
//!    observe a set of writes as one atomic update
//!
//! ## Example
//!
//! ```ignore
//! use trackplan_reactive::{Signal, Effect, batch};
//!
//! let first = Signal::new(1);
//! let second = Signal::new(2);
//!
//! let _effect = Effect::new({
//!     let (first, second) = (first.clone(), second.clone());
//!     move || println!("sum: {}", first.get() + second.get())
//! });
//!
//! // Prints "sum: 30" exactly once
//! batch(|| {
//!     first.set(10);
//!     second.set(20);
//! });
//! ```

use core::cell::{Cell, RefCell};
use core::sync::atomic::{AtomicUsize, Ordering};

use std::collections::BTreeMap;

use crate::effect::Effect;

/// Upper bound on flush rounds before the runtime gives up.
///
/// A round is one pass over the pending queue. Effects that keep re-triggering each other
/// (for instance an effect that unconditionally writes a signal it reads) never settle.
const MAX_FLUSH_ROUNDS: usize = 10_000;

/// Unique identifier for reactive nodes (Signals, Effects, Memos)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

impl NodeId {
	/// Create a new unique NodeId
	pub fn new() -> Self {
		static COUNTER: AtomicUsize = AtomicUsize::new(0);
		Self(COUNTER.fetch_add(1, Ordering::Relaxed))
	}
}

impl Default for NodeId {
	fn default() -> Self {
		Self::new()
	}
}

/// Type of reactive node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeType {
	/// A Signal node (source of reactivity)
	Signal,
	/// An Effect node (side effect that runs when dependencies change)
	Effect,
	/// The effect backing a Memo
	Memo,
	/// A section evaluated with `untrack()`; reads inside it record nothing
	Untracked,
}

/// Observer represents a currently executing Effect, Memo, or untracked section
#[derive(Debug, Clone)]
pub struct Observer {
	/// Unique identifier for this observer
	pub id: NodeId,
	/// Type of this observer
	pub node_type: NodeType,
}

/// Dependency graph node
#[derive(Debug, Default)]
pub(crate) struct DependencyNode {
	/// IDs of nodes that depend on this node
	pub(crate) subscribers: Vec<NodeId>,
	/// IDs of nodes this node depends on
	pub(crate) dependencies: Vec<NodeId>,
}

/// Global reactive runtime
///
/// This struct manages the reactive dependency graph and update propagation.
/// It uses thread-local storage to maintain separate runtime state per thread.
pub struct Runtime {
	/// Observer stack for tracking currently executing effects
	observer_stack: RefCell<Vec<Observer>>,
	/// Dependency graph: NodeId -> DependencyNode
	pub(crate) dependency_graph: RefCell<BTreeMap<NodeId, DependencyNode>>,
	/// Pending updates (effects that need to be re-executed)
	pub(crate) pending_updates: RefCell<Vec<NodeId>>,
	/// Number of currently open batches
	batch_depth: Cell<usize>,
	/// Whether the pending queue is currently being drained
	flushing: Cell<bool>,
}

impl Runtime {
	/// Create a new Runtime instance
	pub fn new() -> Self {
		Self {
			observer_stack: RefCell::new(Vec::new()),
			dependency_graph: RefCell::new(BTreeMap::new()),
			pending_updates: RefCell::new(Vec::new()),
			batch_depth: Cell::new(0),
			flushing: Cell::new(false),
		}
	}

	/// Get the current observer (the currently executing Effect or Memo)
	pub fn current_observer(&self) -> Option<NodeId> {
		self.observer_stack
			.borrow()
			.last()
			.map(|observer| observer.id)
	}

	/// Push an observer onto the stack
	///
	/// This should be called when starting to execute an Effect or Memo.
	pub fn push_observer(&self, observer: Observer) {
		self.observer_stack.borrow_mut().push(observer);
	}

	/// Pop an observer from the stack
	///
	/// This should be called when finishing execution of an Effect or Memo.
	pub fn pop_observer(&self) -> Option<Observer> {
		self.observer_stack.borrow_mut().pop()
	}

	/// Track a dependency between the current observer and a signal
	///
	/// This is called automatically when Signal::get() is invoked. Reads inside an
	/// untracked section are ignored.
	///
	/// # Arguments
	///
	/// * `signal_id` - ID of the Signal being accessed
	pub fn track_dependency(&self, signal_id: NodeId) {
		let observer_id = match self.observer_stack.borrow().last() {
			Some(observer) if observer.node_type != NodeType::Untracked => observer.id,
			_ => return,
		};

		let mut graph = self.dependency_graph.borrow_mut();

		// Add signal -> observer edge (signal has a new subscriber)
		let signal_node = graph.entry(signal_id).or_default();
		if !signal_node.subscribers.contains(&observer_id) {
			signal_node.subscribers.push(observer_id);
		}

		// Add observer -> signal edge (observer depends on signal)
		let observer_node = graph.entry(observer_id).or_default();
		if !observer_node.dependencies.contains(&signal_id) {
			observer_node.dependencies.push(signal_id);
		}
	}

	/// Notify that a Signal has changed
	///
	/// All subscribers are queued. The queue is drained right away unless a batch is
	/// open or the runtime is already draining it.
	///
	/// # Arguments
	///
	/// * `signal_id` - ID of the Signal that changed
	pub fn notify_signal_change(&self, signal_id: NodeId) {
		let subscribers = match self.dependency_graph.borrow().get(&signal_id) {
			Some(node) => node.subscribers.clone(),
			None => return,
		};

		for subscriber_id in subscribers {
			self.schedule_update(subscriber_id);
		}

		if self.batch_depth.get() == 0 {
			self.flush_updates();
		}
	}

	/// Queue a node for re-execution
	///
	/// # Arguments
	///
	/// * `node_id` - ID of the node to update
	pub fn schedule_update(&self, node_id: NodeId) {
		let mut pending = self.pending_updates.borrow_mut();
		if !pending.contains(&node_id) {
			pending.push(node_id);
		}
	}

	/// Open a batch. Must be paired with [`Runtime::end_batch`].
	pub(crate) fn begin_batch(&self) {
		self.batch_depth.set(self.batch_depth.get() + 1);
	}

	/// Close a batch, returning `true` when it was the outermost one.
	pub(crate) fn end_batch(&self) -> bool {
		let depth = self.batch_depth.get().saturating_sub(1);
		self.batch_depth.set(depth);
		depth == 0
	}

	/// Whether a batch is currently open
	pub fn is_batching(&self) -> bool {
		self.batch_depth.get() > 0
	}

	/// Execute all pending effects until the queue is empty
	///
	/// Effects that write signals while running append to the queue; those writes are
	/// picked up by the next round. Calling this while a flush is in progress is a no-op.
	///
	/// # Panics
	///
	/// Panics if the updates do not settle within `MAX_FLUSH_ROUNDS` rounds.
	pub fn flush_updates(&self) {
		if self.flushing.replace(true) {
			return;
		}

		let mut rounds = 0;
		loop {
			let pending = core::mem::take(&mut *self.pending_updates.borrow_mut());
			if pending.is_empty() {
				break;
			}

			rounds += 1;
			if rounds > MAX_FLUSH_ROUNDS {
				self.flushing.set(false);
				self.pending_updates.borrow_mut().clear();
				panic!("reactive updates did not settle after {MAX_FLUSH_ROUNDS} rounds");
			}

			for node_id in pending {
				Effect::execute_effect(node_id);
			}
		}

		self.flushing.set(false);
	}

	/// Clear dependencies for a node
	///
	/// This is called before re-executing an Effect so that dependencies are collected afresh.
	///
	/// # Arguments
	///
	/// * `node_id` - ID of the node whose dependencies should be cleared
	pub fn clear_dependencies(&self, node_id: NodeId) {
		let mut graph = self.dependency_graph.borrow_mut();

		let dependencies = match graph.get_mut(&node_id) {
			Some(node) => core::mem::take(&mut node.dependencies),
			None => return,
		};

		// Remove this node from all signal subscribers
		for dep_id in dependencies {
			if let Some(dep_node) = graph.get_mut(&dep_id) {
				dep_node.subscribers.retain(|&id| id != node_id);
			}
		}
	}

	/// Remove a node from the dependency graph
	///
	/// This should be called when a Signal/Effect/Memo is dropped.
	///
	/// # Arguments
	///
	/// * `node_id` - ID of the node to remove
	pub fn remove_node(&self, node_id: NodeId) {
		self.clear_dependencies(node_id);
		self.dependency_graph.borrow_mut().remove(&node_id);
		self.pending_updates.borrow_mut().retain(|&id| id != node_id);
	}

	/// Check if a node exists in the dependency graph (for testing)
	pub fn has_node(&self, node_id: NodeId) -> bool {
		self.dependency_graph.borrow().contains_key(&node_id)
	}

	/// Get the number of subscribers for a node (for testing)
	pub fn subscriber_count(&self, node_id: NodeId) -> usize {
		self.dependency_graph
			.borrow()
			.get(&node_id)
			.map(|node| node.subscribers.len())
			.unwrap_or(0)
	}
}

impl Default for Runtime {
	fn default() -> Self {
		Self::new()
	}
}

// Thread-local runtime instance
//
// In WASM, there is only one thread, so this effectively provides a global runtime.
// On non-WASM platforms, each thread gets its own runtime instance.
thread_local! {
	static RUNTIME: Runtime = Runtime::new();
}

/// Get a reference to the global runtime
///
/// # Example
///
/// ```ignore
/// use trackplan_reactive::with_runtime;
///
/// with_runtime(|rt| {
///     rt.track_dependency(signal_id);
/// });
/// ```
pub fn with_runtime<F, R>(f: F) -> R
where
	F: FnOnce(&Runtime) -> R,
{
	RUNTIME.with(f)
}

/// Try to access the global runtime (safe version for Drop implementations)
///
/// Returns None if the thread-local storage has been destroyed.
pub(crate) fn try_with_runtime<F, R>(f: F) -> Option<R>
where
	F: FnOnce(&Runtime) -> R,
{
	RUNTIME.try_with(f).ok()
}

/// Run `f` as a transactional batch
///
/// Signal values change immediately, but dependent effects run only once the outermost
/// batch closes. Nested batches are supported.
///
/// # Example
///
/// ```ignore
/// batch(|| {
///     name.set("Acme".to_string());
///     base_url.set("https://acme.example/".to_string());
/// });
/// ```
pub fn batch<F, R>(f: F) -> R
where
	F: FnOnce() -> R,
{
	with_runtime(|rt| rt.begin_batch());
	let result = f();
	if with_runtime(|rt| rt.end_batch()) {
		with_runtime(|rt| rt.flush_updates());
	}
	result
}

/// Run `f` without recording any dependencies for the current observer
///
/// This is the equivalent of sampling a signal: the value is read, but later changes
/// do not re-run the surrounding effect.
pub fn untrack<F, R>(f: F) -> R
where
	F: FnOnce() -> R,
{
	with_runtime(|rt| {
		rt.push_observer(Observer {
			id: NodeId::new(),
			node_type: NodeType::Untracked,
		})
	});
	let result = f();
	with_runtime(|rt| rt.pop_observer());
	result
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serial_test::serial;

	#[test]
	#[serial]
	fn test_node_id_uniqueness() {
		let id1 = NodeId::new();
		let id2 = NodeId::new();
		let id3 = NodeId::new();

		assert_ne!(id1, id2);
		assert_ne!(id2, id3);
		assert_ne!(id1, id3);
	}

	#[test]
	#[serial]
	fn test_runtime_observer_stack() {
		let runtime = Runtime::new();

		assert!(runtime.current_observer().is_none());

		let observer1 = Observer {
			id: NodeId::new(),
			node_type: NodeType::Effect,
		};
		let id1 = observer1.id;

		runtime.push_observer(observer1);
		assert_eq!(runtime.current_observer(), Some(id1));

		let observer2 = Observer {
			id: NodeId::new(),
			node_type: NodeType::Effect,
		};
		let id2 = observer2.id;

		runtime.push_observer(observer2);
		assert_eq!(runtime.current_observer(), Some(id2));

		runtime.pop_observer();
		assert_eq!(runtime.current_observer(), Some(id1));

		runtime.pop_observer();
		assert!(runtime.current_observer().is_none());
	}

	#[rstest]
	#[case::effect(NodeType::Effect, true)]
	#[case::memo(NodeType::Memo, true)]
	#[case::untracked(NodeType::Untracked, false)]
	#[serial]
	fn test_dependency_tracking(#[case] node_type: NodeType, #[case] records: bool) {
		let runtime = Runtime::new();

		let signal_id = NodeId::new();
		let observer_id = NodeId::new();

		runtime.push_observer(Observer {
			id: observer_id,
			node_type,
		});
		runtime.track_dependency(signal_id);

		assert_eq!(runtime.has_node(signal_id), records);
		if records {
			let graph = runtime.dependency_graph.borrow();
			let signal_node = graph.get(&signal_id).unwrap();
			assert!(signal_node.subscribers.contains(&observer_id));

			let observer_node = graph.get(&observer_id).unwrap();
			assert!(observer_node.dependencies.contains(&signal_id));
		}
	}

	#[test]
	#[serial]
	fn test_notify_inside_batch_only_queues() {
		let runtime = Runtime::new();

		let signal_id = NodeId::new();
		let effect_id = NodeId::new();
		runtime
			.dependency_graph
			.borrow_mut()
			.entry(signal_id)
			.or_default()
			.subscribers
			.push(effect_id);

		runtime.begin_batch();
		runtime.notify_signal_change(signal_id);

		assert!(runtime.pending_updates.borrow().contains(&effect_id));
		assert!(runtime.end_batch());
	}

	#[rstest]
	#[case(1)]
	#[case(2)]
	#[case(5)]
	#[serial]
	fn test_nested_batches_close_once(#[case] depth: usize) {
		let runtime = Runtime::new();

		for _ in 0..depth {
			runtime.begin_batch();
		}
		assert!(runtime.is_batching());
		for _ in 1..depth {
			assert!(!runtime.end_batch());
		}
		assert!(runtime.end_batch());
		assert!(!runtime.is_batching());
	}

	#[test]
	#[serial]
	fn test_clear_dependencies() {
		let runtime = Runtime::new();

		let signal_id = NodeId::new();
		let effect_id = NodeId::new();

		{
			let mut graph = runtime.dependency_graph.borrow_mut();
			graph
				.entry(signal_id)
				.or_default()
				.subscribers
				.push(effect_id);
			graph
				.entry(effect_id)
				.or_default()
				.dependencies
				.push(signal_id);
		}

		runtime.clear_dependencies(effect_id);

		let graph = runtime.dependency_graph.borrow();
		let signal_node = graph.get(&signal_id).unwrap();
		assert!(!signal_node.subscribers.contains(&effect_id));

		let effect_node = graph.get(&effect_id).unwrap();
		assert!(effect_node.dependencies.is_empty());
	}
}
