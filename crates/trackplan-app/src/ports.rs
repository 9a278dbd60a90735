//! Browser ports
//!
//! The router and the title effect talk to the browser through these traits. The
//! in-memory implementations back native builds and tests; `web` provides the `web-sys`
//! ones on wasm32.

use core::cell::{Cell, RefCell};
use std::rc::Rc;

use serde_json::Value;

use crate::service::{OauthHandoff, OauthRequest};

/// Handle of a hash-change subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListenerId(pub u64);

/// Callback receiving the new raw hash, including its leading `#`.
pub type HashListener = Rc<dyn Fn(&str)>;

/// The location fragment
pub trait HashLocation {
	/// Current raw hash, `""` or starting with `#`.
	fn hash(&self) -> String;

	/// Replaces the fragment. `hash` excludes the leading `#`.
	fn set_hash(&self, hash: &str);

	/// Registers a listener for hash changes.
	fn subscribe(&self, listener: HashListener) -> ListenerId;

	/// Removes a listener. Unknown ids are ignored.
	fn unsubscribe(&self, id: ListenerId);
}

/// The document title
pub trait TitlePort {
	fn set_title(&self, title: &str);
}

/// In-memory [`HashLocation`]
///
/// Listeners are notified synchronously whenever the hash actually changes.
#[derive(Default)]
pub struct MemoryLocation {
	hash: RefCell<String>,
	listeners: RefCell<Vec<(ListenerId, HashListener)>>,
	next_id: Cell<u64>,
	writes: Cell<usize>,
}

impl MemoryLocation {
	/// A location with the given initial hash (with or without `#`).
	pub fn new(hash: &str) -> Self {
		let location = Self::default();
		*location.hash.borrow_mut() = with_hash_prefix(hash);
		location
	}

	/// Number of `set_hash` calls that changed the hash.
	pub fn writes(&self) -> usize {
		self.writes.get()
	}

	/// Number of active listeners.
	pub fn listener_count(&self) -> usize {
		self.listeners.borrow().len()
	}
}

fn with_hash_prefix(hash: &str) -> String {
	if hash.is_empty() || hash.starts_with('#') {
		hash.to_string()
	} else {
		format!("#{hash}")
	}
}

impl HashLocation for MemoryLocation {
	fn hash(&self) -> String {
		self.hash.borrow().clone()
	}

	fn set_hash(&self, hash: &str) {
		let hash = with_hash_prefix(hash);
		if *self.hash.borrow() == hash {
			return;
		}
		*self.hash.borrow_mut() = hash.clone();
		self.writes.set(self.writes.get() + 1);

		let listeners: Vec<HashListener> = self
			.listeners
			.borrow()
			.iter()
			.map(|(_, listener)| Rc::clone(listener))
			.collect();
		for listener in listeners {
			listener(&hash);
		}
	}

	fn subscribe(&self, listener: HashListener) -> ListenerId {
		let id = ListenerId(self.next_id.get());
		self.next_id.set(id.0 + 1);
		self.listeners.borrow_mut().push((id, listener));
		id
	}

	fn unsubscribe(&self, id: ListenerId) {
		self.listeners.borrow_mut().retain(|(other, _)| *other != id);
	}
}

/// In-memory [`TitlePort`].
#[derive(Debug, Default)]
pub struct MemoryTitle {
	title: RefCell<String>,
}

impl MemoryTitle {
	pub fn new() -> Self {
		Self::default()
	}

	/// The last title set.
	pub fn title(&self) -> String {
		self.title.borrow().clone()
	}
}

impl TitlePort for MemoryTitle {
	fn set_title(&self, title: &str) {
		*self.title.borrow_mut() = title.to_string();
	}
}

/// In-memory [`OauthHandoff`]
///
/// Records requests instead of navigating; a pending redirect state can be staged to
/// simulate returning from the OAuth page.
#[derive(Debug, Default)]
pub struct MemoryOauth {
	requests: RefCell<Vec<OauthRequest>>,
	redirect_state: RefCell<Option<Value>>,
}

impl MemoryOauth {
	pub fn new() -> Self {
		Self::default()
	}

	/// Stages state as if the application had just been redirected back.
	pub fn with_redirect_state(state: Value) -> Self {
		let oauth = Self::default();
		*oauth.redirect_state.borrow_mut() = Some(state);
		oauth
	}

	/// Requests made so far.
	pub fn requests(&self) -> Vec<OauthRequest> {
		self.requests.borrow().clone()
	}
}

impl OauthHandoff for MemoryOauth {
	fn go_to_oauth_page(&self, request: OauthRequest) {
		self.requests.borrow_mut().push(request);
	}

	fn take_redirect_state(&self) -> Option<Value> {
		self.redirect_state.borrow_mut().take()
	}
}
