//! Tracker data model
//!
//! Wire types of the issue tracker's REST API that the UI needs (custom fields, link types,
//! saved queries, users), and the metadata record assembled from them.

use serde::{Deserialize, Serialize};

/// Weekly working time assumed before the tracker reports its own.
pub const DEFAULT_MINUTES_PER_WORK_WEEK: u32 = 5 * 8 * 60;

/// Element of an enum or state bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleElement {
	pub id: String,
	pub name: String,
	pub ordinal: i64,
	/// Only meaningful for state bundles.
	#[serde(default)]
	pub is_resolved: bool,
}

/// Values of an enum or state bundle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bundle {
	#[serde(default)]
	pub values: Vec<BundleElement>,
}

/// Defaults of a custom field; the bundle is absent for non-bundle field types.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomFieldDefaults {
	#[serde(default)]
	pub bundle: Option<Bundle>,
}

/// Type of a custom field, such as `enum[1]`, `state[1]`, `period` or `user[1]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldType {
	pub id: String,
}

/// A custom field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomField {
	pub id: String,
	pub name: String,
	pub field_type: FieldType,
	#[serde(default)]
	pub field_defaults: CustomFieldDefaults,
}

impl CustomField {
	/// Bundle values, or nothing for non-bundle fields.
	pub fn bundle_values(&self) -> &[BundleElement] {
		self.field_defaults
			.bundle
			.as_ref()
			.map_or(&[], |bundle| bundle.values.as_slice())
	}
}

/// An issue link type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueLinkType {
	pub id: String,
	pub name: String,
	pub directed: bool,
	pub source_to_target: String,
	pub target_to_source: String,
}

/// Owner of a saved query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryOwner {
	pub full_name: String,
}

/// A saved query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedQuery {
	pub id: String,
	pub name: String,
	pub owner: QueryOwner,
}

/// A tracker user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
	pub id: String,
	pub full_name: String,
	#[serde(default)]
	pub avatar_url: String,
}

/// Metadata of one tracker instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackerMetadata {
	/// Normalized base URL of the instance that returned the metadata.
	pub base_url: String,
	pub custom_fields: Vec<CustomField>,
	pub issue_link_types: Vec<IssueLinkType>,
	pub saved_queries: Vec<SavedQuery>,
	pub users: Vec<User>,
	pub minutes_per_work_week: u32,
}

impl Default for TrackerMetadata {
	fn default() -> Self {
		Self {
			base_url: String::new(),
			custom_fields: Vec::new(),
			issue_link_types: Vec::new(),
			saved_queries: Vec::new(),
			users: Vec::new(),
			minutes_per_work_week: DEFAULT_MINUTES_PER_WORK_WEEK,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serde_json::json;

	#[rstest]
	fn test_custom_field_from_rest_payload() {
		let field: CustomField = serde_json::from_value(json!({
			"$type": "CustomField",
			"id": "92-4",
			"name": "State",
			"fieldType": {"$type": "FieldType", "id": "state[1]"},
			"fieldDefaults": {
				"$type": "StateBundleCustomFieldDefaults",
				"bundle": {"values": [
					{"id": "94-1", "name": "Open", "ordinal": 0, "isResolved": false},
					{"id": "94-2", "name": "Fixed", "ordinal": 1, "isResolved": true},
				]},
			},
		}))
		.unwrap();

		assert_eq!(field.field_type.id, "state[1]");
		assert_eq!(field.bundle_values().len(), 2);
		assert!(field.bundle_values()[1].is_resolved);
	}

	#[rstest]
	fn test_period_field_has_no_bundle() {
		let field: CustomField = serde_json::from_value(json!({
			"id": "92-7",
			"name": "Estimation",
			"fieldType": {"id": "period"},
			"fieldDefaults": {"$type": "CustomFieldDefaults"},
		}))
		.unwrap();

		assert!(field.bundle_values().is_empty());
	}
}
