//! Browser implementations of the ports (wasm32 only)

use core::cell::{Cell, RefCell};
use std::collections::BTreeMap;

use futures::future::LocalBoxFuture;
use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;

use crate::ports::{HashListener, HashLocation, ListenerId, TitlePort};
use crate::service::TaskSpawner;

const HASH_CHANGE: &str = "hashchange";

/// `window.location.hash`
pub struct WindowLocation {
	window: web_sys::Window,
	listeners: RefCell<BTreeMap<ListenerId, Closure<dyn FnMut()>>>,
	next_id: Cell<u64>,
}

impl WindowLocation {
	/// `None` outside a browser window.
	pub fn new() -> Option<Self> {
		Some(Self {
			window: web_sys::window()?,
			listeners: RefCell::new(BTreeMap::new()),
			next_id: Cell::new(0),
		})
	}
}

impl HashLocation for WindowLocation {
	fn hash(&self) -> String {
		self.window.location().hash().unwrap_or_default()
	}

	fn set_hash(&self, hash: &str) {
		if let Err(error) = self.window.location().set_hash(hash) {
			tracing::warn!(?error, "failed to set location hash");
		}
	}

	fn subscribe(&self, listener: HashListener) -> ListenerId {
		let window = self.window.clone();
		let closure = Closure::<dyn FnMut()>::new(move || {
			let hash = window.location().hash().unwrap_or_default();
			listener(&hash);
		});
		if let Err(error) = self
			.window
			.add_event_listener_with_callback(HASH_CHANGE, closure.as_ref().unchecked_ref())
		{
			tracing::warn!(?error, "failed to add hashchange listener");
		}

		let id = ListenerId(self.next_id.get());
		self.next_id.set(id.0 + 1);
		self.listeners.borrow_mut().insert(id, closure);
		id
	}

	fn unsubscribe(&self, id: ListenerId) {
		let Some(closure) = self.listeners.borrow_mut().remove(&id) else {
			return;
		};
		if let Err(error) = self
			.window
			.remove_event_listener_with_callback(HASH_CHANGE, closure.as_ref().unchecked_ref())
		{
			tracing::warn!(?error, "failed to remove hashchange listener");
		}
	}
}

/// `document.title`
pub struct DocumentTitle {
	document: web_sys::Document,
}

impl DocumentTitle {
	/// `None` outside a browser document.
	pub fn new() -> Option<Self> {
		let document = web_sys::window()?.document()?;
		Some(Self { document })
	}

	/// The title the page was loaded with, used as application name.
	pub fn initial_title(&self) -> String {
		self.document.title()
	}
}

impl TitlePort for DocumentTitle {
	fn set_title(&self, title: &str) {
		self.document.set_title(title);
	}
}

/// Spawns onto the browser's microtask queue.
#[derive(Debug, Clone, Copy, Default)]
pub struct WasmSpawner;

impl TaskSpawner for WasmSpawner {
	fn spawn(&self, task: LocalBoxFuture<'static, ()>) {
		wasm_bindgen_futures::spawn_local(task);
	}
}
