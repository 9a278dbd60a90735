//! Contributors
//!
//! A contributor is either a tracker user (identified by the tracker's user id) or an
//! external team with a name and a member count. Both carry a weekly capacity in hours.
//! The per-field signals give every contributor a stable identity: two contributors are the
//! same iff they share their `hours_per_week` signal.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use trackplan_reactive::{Signal, batch};

use crate::deep_equals::{DeepEquals, deep_equals};
use crate::plain::{Coerced, ensure_count, ensure_number, ensure_string};

/// Weekly capacity assigned when none is given.
pub const DEFAULT_HOURS_PER_WEEK: f64 = 40.0;

/// Team size assigned when none is given.
pub const DEFAULT_NUM_MEMBERS: u32 = 1;

/// Value of the contributor picker that selects "new external contributor".
pub const EXTERNAL_CONTRIBUTOR_VALUE: &str = "@external";

/// Kind of a contributor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContributorKind {
	/// A tracker user.
	#[default]
	#[serde(rename = "youTrack")]
	Tracker,
	/// An external team.
	#[serde(rename = "external")]
	External,
}

impl ContributorKind {
	/// Coerces a `type` discriminator.
	///
	/// Accepts the string and the legacy numeric forms; anything else is a tracker user.
	pub fn from_plain(value: Option<&Value>) -> Coerced<Self> {
		match value {
			Some(Value::String(s)) if s == "external" => Coerced::Valid(Self::External),
			Some(Value::String(s)) if s == "youTrack" => Coerced::Valid(Self::Tracker),
			Some(Value::Number(n)) if n.as_u64() == Some(1) => Coerced::Valid(Self::External),
			Some(Value::Number(n)) if n.as_u64() == Some(0) => Coerced::Valid(Self::Tracker),
			_ => Coerced::Defaulted(Self::Tracker),
		}
	}
}

/// A tracker user with a weekly capacity.
#[derive(Debug, Clone)]
pub struct TrackerContributor {
	/// Tracker user id.
	pub id: String,
	/// Weekly capacity in hours.
	pub hours_per_week: Signal<f64>,
}

/// An external team.
#[derive(Debug, Clone)]
pub struct ExternalContributor {
	/// Display name, also used for the synthesized id's mapping.
	pub name: Signal<String>,
	/// Number of people in the team.
	pub num_members: Signal<u32>,
	/// Weekly capacity per member in hours.
	pub hours_per_week: Signal<f64>,
}

/// A contributor
#[derive(Debug, Clone)]
pub enum Contributor {
	/// See [`TrackerContributor`].
	Tracker(TrackerContributor),
	/// See [`ExternalContributor`].
	External(ExternalContributor),
}

/// Serialized form of a [`Contributor`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PlainContributor {
	/// A tracker user.
	#[serde(rename = "youTrack", rename_all = "camelCase")]
	Tracker {
		/// Tracker user id.
		id: String,
		/// Weekly capacity in hours.
		hours_per_week: f64,
	},
	/// An external team.
	#[serde(rename = "external", rename_all = "camelCase")]
	External {
		/// Display name.
		name: String,
		/// Number of people in the team.
		num_members: u32,
		/// Weekly capacity per member in hours.
		hours_per_week: f64,
	},
}

impl PlainContributor {
	/// Weekly capacity per member in hours.
	pub fn hours_per_week(&self) -> f64 {
		match self {
			Self::Tracker { hours_per_week, .. } | Self::External { hours_per_week, .. } => {
				*hours_per_week
			}
		}
	}
}

impl DeepEquals for PlainContributor {
	fn deep_equals(&self, other: &Self) -> bool {
		match (self, other) {
			(
				Self::Tracker {
					id,
					hours_per_week,
				},
				Self::Tracker {
					id: other_id,
					hours_per_week: other_hours,
				},
			) => id == other_id && deep_equals(hours_per_week, other_hours),
			(
				Self::External {
					name,
					num_members,
					hours_per_week,
				},
				Self::External {
					name: other_name,
					num_members: other_members,
					hours_per_week: other_hours,
				},
			) => {
				name == other_name
					&& num_members == other_members
					&& deep_equals(hours_per_week, other_hours)
			}
			_ => false,
		}
	}
}

impl Contributor {
	/// A tracker user with the given capacity.
	pub fn tracker(id: impl Into<String>, hours_per_week: f64) -> Self {
		Self::Tracker(TrackerContributor {
			id: id.into(),
			hours_per_week: Signal::new(hours_per_week),
		})
	}

	/// An external team with the given size and capacity.
	pub fn external(name: impl Into<String>, num_members: u32, hours_per_week: f64) -> Self {
		Self::External(ExternalContributor {
			name: Signal::new(name.into()),
			num_members: Signal::new(num_members),
			hours_per_week: Signal::new(hours_per_week),
		})
	}

	/// Builds a contributor from untrusted JSON, repairing malformed fields.
	pub fn from_plain(plain: &Value) -> Self {
		let hours = ensure_number(plain.get("hoursPerWeek"), DEFAULT_HOURS_PER_WEEK)
			.log("contributors[].hoursPerWeek");
		match ContributorKind::from_plain(plain.get("type")).log("contributors[].type") {
			ContributorKind::Tracker => {
				Self::tracker(ensure_string(plain.get("id")).log("contributors[].id"), hours)
			}
			ContributorKind::External => Self::external(
				ensure_string(plain.get("name")).log("contributors[].name"),
				ensure_count(plain.get("numMembers"), DEFAULT_NUM_MEMBERS)
					.log("contributors[].numMembers")
					.max(1),
				hours,
			),
		}
	}

	/// Reads the current values into the serialized form. Reads are tracked.
	pub fn to_plain(&self) -> PlainContributor {
		match self {
			Self::Tracker(c) => PlainContributor::Tracker {
				id: c.id.clone(),
				hours_per_week: c.hours_per_week.get(),
			},
			Self::External(c) => PlainContributor::External {
				name: c.name.get(),
				num_members: c.num_members.get(),
				hours_per_week: c.hours_per_week.get(),
			},
		}
	}

	/// The contributor's kind.
	pub fn kind(&self) -> ContributorKind {
		match self {
			Self::Tracker(_) => ContributorKind::Tracker,
			Self::External(_) => ContributorKind::External,
		}
	}

	/// Weekly capacity signal; also the contributor's identity.
	pub fn hours_per_week(&self) -> &Signal<f64> {
		match self {
			Self::Tracker(c) => &c.hours_per_week,
			Self::External(c) => &c.hours_per_week,
		}
	}

	/// Whether both handles denote the same contributor.
	pub fn is_same(&self, other: &Self) -> bool {
		self.hours_per_week().ptr_eq(other.hours_per_week())
	}
}

/// Transient inputs of the "add contributor" row
///
/// Never part of the serialized settings in the location hash, but carried through the
/// OAuth redirect so a half-filled row survives it.
#[derive(Debug, Clone)]
pub struct ContributorEditArea {
	/// Selected tracker user id, or [`EXTERNAL_CONTRIBUTOR_VALUE`].
	pub id: Signal<String>,
	/// Name of a new external team.
	pub name: Signal<String>,
	/// Size of a new external team.
	pub num_members: Signal<u32>,
	/// Capacity of the new contributor.
	pub hours_per_week: Signal<f64>,
}

/// Serialized form of a [`ContributorEditArea`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlainEditArea {
	/// Selected id.
	pub id: String,
	/// External team name.
	pub name: String,
	/// External team size.
	pub num_members: u32,
	/// Capacity in hours per week.
	pub hours_per_week: f64,
}

impl Default for ContributorEditArea {
	fn default() -> Self {
		Self {
			id: Signal::new(String::new()),
			name: Signal::new(String::new()),
			num_members: Signal::new(DEFAULT_NUM_MEMBERS),
			hours_per_week: Signal::new(DEFAULT_HOURS_PER_WEEK),
		}
	}
}

impl ContributorEditArea {
	/// Creates an empty edit area.
	pub fn new() -> Self {
		Self::default()
	}

	/// Assigns all fields from untrusted JSON in one batch.
	pub fn assign(&self, plain: &Value) {
		batch(|| {
			self.id.set(ensure_string(plain.get("id")).log("transient.id"));
			self.name.set(ensure_string(plain.get("name")).log("transient.name"));
			self.num_members.set(
				ensure_count(plain.get("numMembers"), DEFAULT_NUM_MEMBERS)
					.log("transient.numMembers")
					.max(1),
			);
			self.hours_per_week.set(
				ensure_number(plain.get("hoursPerWeek"), DEFAULT_HOURS_PER_WEEK)
					.log("transient.hoursPerWeek"),
			);
		});
	}

	/// Reads the current values. Reads are tracked.
	pub fn to_plain(&self) -> PlainEditArea {
		PlainEditArea {
			id: self.id.get(),
			name: self.name.get(),
			num_members: self.num_members.get(),
			hours_per_week: self.hours_per_week.get(),
		}
	}

	/// Whether the external-team fields are in use.
	pub fn is_external(&self) -> bool {
		self.id.with(|id| id == EXTERNAL_CONTRIBUTOR_VALUE)
	}

	/// Clears the row back to its defaults.
	pub fn clear(&self) {
		batch(|| {
			self.id.set(String::new());
			self.name.set(String::new());
			self.num_members.set(DEFAULT_NUM_MEMBERS);
			self.hours_per_week.set(DEFAULT_HOURS_PER_WEEK);
		});
	}
}
