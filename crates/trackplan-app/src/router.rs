//! Router
//!
//! Two-way binding between the location hash and the [`App`] state. The canonical hash is
//!
//! ```text
//! #/<page>?config=<form-urlencoded JSON of the settings>
//! ```
//!
//! A hash change that this router did not write itself is parsed and assigned onto the
//! state. Any state change is written back as the canonical hash. A hash without a usable
//! `config` parameter is replaced by the canonical hash of the current state.

use core::cell::RefCell;
use std::rc::Rc;

use serde_json::Value;
use trackplan_reactive::{Scope, Signal, batch};
use url::{Url, form_urlencoded};

use crate::app::{App, Page};
use crate::error::RouterError;
use crate::ports::HashLocation;
use crate::service::OauthHandoff;
use crate::settings::PlainSettings;

const FABRICATED_BASE: &str = "http://ignored-host/";

/// Name of the query parameter carrying the settings.
pub const CONFIG_PARAM: &str = "config";

/// A hash of the form `#/<path>?<query>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedHash {
	/// Path, starting with `/`.
	pub path: String,
	/// Decoded query parameters in order.
	pub params: Vec<(String, String)>,
	/// The hash as read from the location, including `#`.
	pub raw: String,
}

impl ParsedHash {
	/// First value of the parameter `name`.
	pub fn param(&self, name: &str) -> Option<&str> {
		self.params
			.iter()
			.find(|(key, _)| key == name)
			.map(|(_, value)| value.as_str())
	}

	/// The settings in the `config` parameter; `Ok(None)` if there is none.
	pub fn config(&self) -> Result<Option<Value>, RouterError> {
		self.param(CONFIG_PARAM)
			.map(|config| serde_json::from_str(config).map_err(RouterError::MalformedConfig))
			.transpose()
	}
}

/// A location hash
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Hash {
	/// A hash the router understands.
	Parsed(ParsedHash),
	/// Any other hash, including the empty one.
	Raw(String),
}

impl Hash {
	/// Parses a raw hash as read from the location.
	pub fn parse(raw: &str) -> Self {
		let Some(relative) = raw.strip_prefix('#').filter(|rest| rest.starts_with('/')) else {
			return Self::Raw(raw.to_string());
		};
		let parsed = Url::parse(FABRICATED_BASE).and_then(|base| base.join(relative));
		match parsed {
			Ok(url) => Self::Parsed(ParsedHash {
				path: url.path().to_string(),
				params: url.query_pairs().into_owned().collect(),
				raw: raw.to_string(),
			}),
			Err(error) => {
				tracing::debug!(%error, raw, "unparsable location hash");
				Self::Raw(raw.to_string())
			}
		}
	}
}

/// Canonical hash (without `#`) for a page and settings.
pub fn canonical_hash(page: Page, settings: &PlainSettings) -> Result<String, serde_json::Error> {
	let config = serde_json::to_string(settings)?;
	let query = form_urlencoded::Serializer::new(String::new())
		.append_pair(CONFIG_PARAM, &config)
		.finish();
	Ok(format!("/{}?{query}", page.as_str()))
}

/// Binding between the location hash and the application state
///
/// Dropping the router removes its hash listener and stops both directions.
pub struct Router {
	hash: Signal<Hash>,
	_scope: Scope,
}

impl Router {
	/// Restores state saved before an OAuth redirect, if any, and starts the binding.
	///
	/// The current hash takes precedence over the restored state when it carries settings.
	pub fn new(app: &App, location: Rc<dyn HashLocation>, oauth: &dyn OauthHandoff) -> Self {
		if let Some(state) = oauth.take_redirect_state() {
			tracing::info!("restoring state after OAuth redirect");
			app.assign(&state);
		}

		let hash = Signal::new(Hash::parse(&location.hash()));
		let scope = Scope::new();

		let listener = location.subscribe(Rc::new({
			let hash = hash.clone();
			move |raw: &str| hash.set(Hash::parse(raw))
		}));
		scope.on_cleanup({
			let location = Rc::clone(&location);
			move || location.unsubscribe(listener)
		});

		let needs_normalization = Signal::new(());
		let hash_from_config = Rc::new(RefCell::new(String::new()));

		scope.effect({
			let (app, hash) = (app.clone(), hash.clone());
			let needs_normalization = needs_normalization.clone();
			let hash_from_config = Rc::clone(&hash_from_config);
			move || {
				let Hash::Parsed(current) = hash.get() else {
					return;
				};
				if current.raw.get(1..) == Some(hash_from_config.borrow().as_str()) {
					return;
				}
				apply_hash(&app, &current, &needs_normalization);
			}
		});

		scope.effect({
			let app = app.clone();
			move || {
				needs_normalization.get();
				let page = app.current_page.get();
				let settings = app.settings.to_plain();
				let canonical = match canonical_hash(page, &settings) {
					Ok(canonical) => canonical,
					Err(error) => {
						tracing::error!(%error, "failed to serialize settings into the location hash");
						return;
					}
				};
				*hash_from_config.borrow_mut() = canonical.clone();

				let current = location.hash();
				if current.strip_prefix('#').unwrap_or(&current) != canonical {
					location.set_hash(&canonical);
				}
			}
		});

		Self {
			hash,
			_scope: scope,
		}
	}

	/// The last hash seen.
	pub fn hash(&self) -> Signal<Hash> {
		self.hash.clone()
	}
}

impl core::fmt::Debug for Router {
	fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
		f.debug_struct("Router").field("hash", &self.hash).finish()
	}
}

fn apply_hash(app: &App, hash: &ParsedHash, needs_normalization: &Signal<()>) {
	batch(|| {
		let candidate = hash.path.strip_prefix('/').unwrap_or(&hash.path);
		if let Some(page) = Page::from_name(candidate) {
			app.current_page.set(page);
		}
		match hash.config() {
			Ok(Some(config)) => {
				tracing::debug!(page = candidate, "assigning settings from location hash");
				app.settings.assign(&config);
			}
			Ok(None) => needs_normalization.set(()),
			Err(error) => {
				tracing::warn!(%error, "ignoring malformed settings in location hash");
				needs_normalization.set(());
			}
		}
	});
}
