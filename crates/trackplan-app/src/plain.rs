//! Coercion of untrusted plain values
//!
//! Settings arrive as JSON from the location hash or from the OAuth redirect state. Every
//! field is repaired rather than rejected: a value of the wrong type is replaced by a
//! default, and the replacement is recorded so it can be logged.
//!
//! ## Example
//!
//! ```ignore
//! use serde_json::json;
//! use trackplan_app::plain::{Coerced, ensure_string};
//!
//! assert_eq!(ensure_string(json!({"name": 7}).get("name")), Coerced::Defaulted(String::new()));
//! ```

use std::collections::BTreeSet;

use serde_json::Value;

/// A coerced value, remembering whether the input had to be replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coerced<T> {
	/// The input had the expected type.
	Valid(T),
	/// The input was missing or malformed; this is the substitute.
	Defaulted(T),
}

impl<T> Coerced<T> {
	/// The coerced value.
	pub fn into_inner(self) -> T {
		match self {
			Self::Valid(value) | Self::Defaulted(value) => value,
		}
	}

	/// Whether the input was replaced.
	pub fn was_defaulted(&self) -> bool {
		matches!(self, Self::Defaulted(_))
	}

	/// Maps the contained value, keeping the provenance.
	pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Coerced<U> {
		match self {
			Self::Valid(value) => Coerced::Valid(f(value)),
			Self::Defaulted(value) => Coerced::Defaulted(f(value)),
		}
	}

	/// Returns the value, logging the repair if there was one.
	pub fn log(self, field: &str) -> T {
		if self.was_defaulted() {
			tracing::debug!(field, "replaced missing or malformed setting with default");
		}
		self.into_inner()
	}
}

/// Coerces to a string; anything else becomes `""`.
pub fn ensure_string(value: Option<&Value>) -> Coerced<String> {
	match value {
		Some(Value::String(s)) => Coerced::Valid(s.clone()),
		_ => Coerced::Defaulted(String::new()),
	}
}

/// Coerces to a number; anything else becomes `default`.
pub fn ensure_number(value: Option<&Value>, default: f64) -> Coerced<f64> {
	match value.and_then(Value::as_f64) {
		Some(number) => Coerced::Valid(number),
		None => Coerced::Defaulted(default),
	}
}

/// Coerces to a non-negative integer.
///
/// Fractional numbers are truncated and negative ones clamp to zero; both count as repairs.
pub fn ensure_count(value: Option<&Value>, default: u32) -> Coerced<u32> {
	if let Some(count) = value.and_then(Value::as_u64) {
		return match u32::try_from(count) {
			Ok(count) => Coerced::Valid(count),
			Err(_) => Coerced::Defaulted(u32::MAX),
		};
	}
	match value.and_then(Value::as_f64) {
		Some(number) if number.is_finite() => {
			Coerced::Defaulted(number.max(0.0).min(f64::from(u32::MAX)) as u32)
		}
		_ => Coerced::Defaulted(default),
	}
}

/// Coerces to a boolean; anything else becomes `default`.
pub fn ensure_bool(value: Option<&Value>, default: bool) -> Coerced<bool> {
	match value {
		Some(Value::Bool(b)) => Coerced::Valid(*b),
		_ => Coerced::Defaulted(default),
	}
}

/// Coerces to an array; anything else becomes the empty slice.
pub fn ensure_array(value: Option<&Value>) -> Coerced<&[Value]> {
	match value {
		Some(Value::Array(items)) => Coerced::Valid(items.as_slice()),
		_ => Coerced::Defaulted(&[]),
	}
}

/// Coerces to a set of strings.
///
/// Non-string elements are dropped; a non-array becomes the empty set.
pub fn ensure_string_set(value: Option<&Value>) -> Coerced<BTreeSet<String>> {
	let Some(Value::Array(items)) = value else {
		return Coerced::Defaulted(BTreeSet::new());
	};
	let set: BTreeSet<String> = items
		.iter()
		.filter_map(|item| item.as_str().map(str::to_owned))
		.collect();
	if items.iter().all(Value::is_string) {
		Coerced::Valid(set)
	} else {
		Coerced::Defaulted(set)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serde_json::json;

	#[rstest]
	#[case(json!("abc"), Coerced::Valid("abc".to_string()))]
	#[case(json!(12), Coerced::Defaulted(String::new()))]
	#[case(json!(null), Coerced::Defaulted(String::new()))]
	fn test_ensure_string(#[case] input: Value, #[case] expected: Coerced<String>) {
		assert_eq!(ensure_string(Some(&input)), expected);
	}

	#[rstest]
	fn test_missing_field_is_defaulted() {
		let plain = json!({});

		assert_eq!(ensure_bool(plain.get("flag"), true), Coerced::Defaulted(true));
		assert_eq!(ensure_number(plain.get("hours"), 40.0), Coerced::Defaulted(40.0));
	}

	#[rstest]
	#[case(json!(3), Coerced::Valid(3))]
	#[case(json!(2.7), Coerced::Defaulted(2))]
	#[case(json!(-4), Coerced::Defaulted(0))]
	#[case(json!("3"), Coerced::Defaulted(1))]
	fn test_ensure_count(#[case] input: Value, #[case] expected: Coerced<u32>) {
		assert_eq!(ensure_count(Some(&input), 1), expected);
	}

	#[rstest]
	fn test_ensure_string_set_drops_non_strings() {
		let input = json!(["0-1", 5, "0-2", "0-1"]);

		let coerced = ensure_string_set(Some(&input));

		assert!(coerced.was_defaulted());
		assert_eq!(
			coerced.into_inner(),
			BTreeSet::from(["0-1".to_string(), "0-2".to_string()])
		);
	}

	#[rstest]
	fn test_ensure_string_set_with_duplicates_is_valid() {
		let input = json!(["0-1", "0-1"]);

		assert!(!ensure_string_set(Some(&input)).was_defaulted());
	}

	#[rstest]
	fn test_ensure_array_of_object_is_empty() {
		let input = json!({"0": 1});

		assert_eq!(ensure_array(Some(&input)), Coerced::Defaulted(&[][..]));
	}
}
