//! Tracker metadata controller
//!
//! Loads the tracker's metadata as soon as a usable base URL with a stored authorization is
//! known, and derives the lookup maps the settings form and the plan views need.

use std::collections::BTreeMap;
use std::rc::Rc;

use trackplan_reactive::{Memo, Scope, Signal};

use crate::alerts::AlertsCtrl;
use crate::service::{PlanningService, TaskSpawner};
use crate::tracker::{BundleElement, CustomField, IssueLinkType, SavedQuery, TrackerMetadata, User};

/// Field type id of single-value enum fields.
pub const ENUM_FIELD_TYPE: &str = "enum[1]";
/// Field type id of period fields.
pub const PERIOD_FIELD_TYPE: &str = "period";
/// Field type id of single-value state fields.
pub const STATE_FIELD_TYPE: &str = "state[1]";
/// Field type id of single-value user fields.
pub const USER_FIELD_TYPE: &str = "user[1]";

/// Controller for the tracker metadata
pub struct MetadataCtrl {
	pending: Signal<bool>,
	defined: Memo<Rc<TrackerMetadata>>,
	user_map: Memo<BTreeMap<String, User>>,
	directed_link_types: Memo<BTreeMap<String, IssueLinkType>>,
	saved_queries: Memo<BTreeMap<String, SavedQuery>>,
	_scope: Scope,
}

impl MetadataCtrl {
	/// Creates the controller and starts watching the base URL.
	///
	/// `empty_minutes_per_work_week` is the work-week length reported while no matching
	/// metadata is available.
	pub fn new(
		metadata: &Signal<Option<TrackerMetadata>>,
		normalized_base_url: &Memo<String>,
		service: Rc<dyn PlanningService>,
		spawner: Rc<dyn TaskSpawner>,
		alerts: &AlertsCtrl,
		empty_minutes_per_work_week: u32,
	) -> Self {
		let pending = Signal::new(false);

		let defined = Memo::new({
			let (metadata, base_url) = (metadata.clone(), normalized_base_url.clone());
			move || {
				let base_url = base_url.get();
				metadata.with(|metadata| match metadata {
					Some(metadata) if metadata.base_url == base_url => Rc::new(metadata.clone()),
					_ => Rc::new(TrackerMetadata {
						minutes_per_work_week: empty_minutes_per_work_week,
						..TrackerMetadata::default()
					}),
				})
			}
		});
		let user_map = Memo::new({
			let defined = defined.clone();
			move || defined.with(|m| index_by_id(&m.users, |user| &user.id))
		});
		let directed_link_types = Memo::new({
			let defined = defined.clone();
			move || {
				defined.with(|m| {
					m.issue_link_types
						.iter()
						.filter(|link_type| link_type.directed)
						.map(|link_type| (link_type.id.clone(), link_type.clone()))
						.collect()
				})
			}
		});
		let saved_queries = Memo::new({
			let defined = defined.clone();
			move || defined.with(|m| index_by_id(&m.saved_queries, |query| &query.id))
		});

		let scope = Scope::new();
		scope.effect({
			let metadata = metadata.clone();
			let base_url = normalized_base_url.clone();
			let pending = pending.clone();
			let alerts = alerts.clone();
			move || {
				let base_url = base_url.get();
				let can_fetch = !base_url.is_empty()
					&& !pending.get_untracked()
					&& metadata.with_untracked(Option::is_none)
					&& service.authorization_for(&base_url).is_some();
				if !can_fetch {
					return;
				}

				tracing::info!(%base_url, "loading tracker metadata");
				pending.set(true);
				let (service, metadata, pending, alerts) =
					(Rc::clone(&service), metadata.clone(), pending.clone(), alerts.clone());
				spawner.spawn(Box::pin(async move {
					match service.load_metadata(&base_url).await {
						Ok(loaded) => metadata.set(Some(TrackerMetadata { base_url, ..loaded })),
						Err(error) => {
							alerts.alert("Failed to retrieve YouTrack metadata", &error);
						}
					}
					pending.set(false);
				}));
			}
		});

		Self {
			pending,
			defined,
			user_map,
			directed_link_types,
			saved_queries,
			_scope: scope,
		}
	}

	/// Whether a metadata request is in flight.
	pub fn pending_metadata(&self) -> Signal<bool> {
		self.pending.clone()
	}

	/// Metadata for the current base URL, or the empty record.
	pub fn defined_metadata(&self) -> Memo<Rc<TrackerMetadata>> {
		self.defined.clone()
	}

	/// Users by id.
	pub fn user_map(&self) -> Memo<BTreeMap<String, User>> {
		self.user_map.clone()
	}

	/// Directed issue link types by id.
	pub fn directed_issue_link_types(&self) -> Memo<BTreeMap<String, IssueLinkType>> {
		self.directed_link_types.clone()
	}

	/// Saved queries by id.
	pub fn saved_queries(&self) -> Memo<BTreeMap<String, SavedQuery>> {
		self.saved_queries.clone()
	}

	/// Custom fields of the given type (such as [`STATE_FIELD_TYPE`]) by id.
	pub fn custom_fields_of_type(&self, field_type_id: &str) -> Memo<BTreeMap<String, CustomField>> {
		let defined = self.defined.clone();
		let field_type_id = field_type_id.to_string();
		Memo::new(move || {
			defined.with(|m| {
				m.custom_fields
					.iter()
					.filter(|field| field.field_type.id == field_type_id)
					.map(|field| (field.id.clone(), field.clone()))
					.collect()
			})
		})
	}

	/// Unresolved states of the state field selected by `field_id`, by ordinal.
	pub fn unresolved_states(&self, field_id: &Signal<String>) -> Memo<Vec<BundleElement>> {
		let fields = self.custom_fields_of_type(STATE_FIELD_TYPE);
		let field_id = field_id.clone();
		Memo::new(move || {
			let field_id = field_id.get();
			fields.with(|fields| {
				sorted_bundle(fields.get(&field_id), |element| !element.is_resolved)
			})
		})
	}

	/// Values of the enum field selected by `field_id`, by ordinal.
	pub fn types(&self, field_id: &Signal<String>) -> Memo<Vec<BundleElement>> {
		let fields = self.custom_fields_of_type(ENUM_FIELD_TYPE);
		let field_id = field_id.clone();
		Memo::new(move || {
			let field_id = field_id.get();
			fields.with(|fields| sorted_bundle(fields.get(&field_id), |_| true))
		})
	}
}

impl core::fmt::Debug for MetadataCtrl {
	fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
		f.debug_struct("MetadataCtrl")
			.field("pending", &self.pending)
			.finish_non_exhaustive()
	}
}

fn index_by_id<T: Clone>(items: &[T], id: impl Fn(&T) -> &String) -> BTreeMap<String, T> {
	items.iter().map(|item| (id(item).clone(), item.clone())).collect()
}

fn sorted_bundle(
	field: Option<&CustomField>,
	keep: impl Fn(&BundleElement) -> bool,
) -> Vec<BundleElement> {
	let mut elements: Vec<BundleElement> = field
		.map(CustomField::bundle_values)
		.unwrap_or_default()
		.iter()
		.filter(|element| keep(element))
		.cloned()
		.collect();
	elements.sort_by_key(|element| element.ordinal);
	elements
}
