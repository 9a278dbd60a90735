//! Structural equality for plain values
//!
//! Used to decide whether the settings a plan was computed with still match the current
//! settings. Numbers compare with *same-value* semantics: `NaN` equals `NaN`, while `0.0`
//! and `-0.0` are distinct. Maps compare by key set and per-key value; sequences compare
//! element-wise. Values of different kinds are never equal.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::hash::Hash;

use serde_json::{Number, Value};

/// Structural, recursive equality.
pub trait DeepEquals {
	/// Whether `self` and `other` are structurally equal.
	fn deep_equals(&self, other: &Self) -> bool;
}

/// Compares two values, short-circuiting on identity.
pub fn deep_equals<T: DeepEquals + ?Sized>(left: &T, right: &T) -> bool {
	core::ptr::eq(left, right) || left.deep_equals(right)
}

/// Same-value comparison of two floats.
pub fn same_value(left: f64, right: f64) -> bool {
	if left.is_nan() && right.is_nan() {
		return true;
	}
	left == right && left.is_sign_negative() == right.is_sign_negative()
}

impl DeepEquals for f64 {
	fn deep_equals(&self, other: &Self) -> bool {
		same_value(*self, *other)
	}
}

impl DeepEquals for f32 {
	fn deep_equals(&self, other: &Self) -> bool {
		same_value(f64::from(*self), f64::from(*other))
	}
}

macro_rules! deep_equals_by_eq {
	($($ty:ty),* $(,)?) => {
		$(
			impl DeepEquals for $ty {
				fn deep_equals(&self, other: &Self) -> bool {
					self == other
				}
			}
		)*
	};
}

deep_equals_by_eq!(bool, u8, u16, u32, u64, usize, i8, i16, i32, i64, isize, str, String);

impl<T: DeepEquals + ?Sized> DeepEquals for &T {
	fn deep_equals(&self, other: &Self) -> bool {
		deep_equals(*self, *other)
	}
}

impl<T: DeepEquals> DeepEquals for Option<T> {
	fn deep_equals(&self, other: &Self) -> bool {
		match (self, other) {
			(Some(left), Some(right)) => deep_equals(left, right),
			(None, None) => true,
			_ => false,
		}
	}
}

impl<T: DeepEquals> DeepEquals for [T] {
	fn deep_equals(&self, other: &Self) -> bool {
		self.len() == other.len() && self.iter().zip(other).all(|(l, r)| deep_equals(l, r))
	}
}

impl<T: DeepEquals> DeepEquals for Vec<T> {
	fn deep_equals(&self, other: &Self) -> bool {
		self.as_slice().deep_equals(other.as_slice())
	}
}

impl<T: Ord + DeepEquals> DeepEquals for BTreeSet<T> {
	fn deep_equals(&self, other: &Self) -> bool {
		self.len() == other.len() && self.iter().zip(other).all(|(l, r)| deep_equals(l, r))
	}
}

impl<K: Ord, V: DeepEquals> DeepEquals for BTreeMap<K, V> {
	fn deep_equals(&self, other: &Self) -> bool {
		self.len() == other.len()
			&& self
				.iter()
				.all(|(key, value)| other.get(key).is_some_and(|o| deep_equals(value, o)))
	}
}

impl<K: Eq + Hash, V: DeepEquals, S: std::hash::BuildHasher> DeepEquals for HashMap<K, V, S> {
	fn deep_equals(&self, other: &Self) -> bool {
		self.len() == other.len()
			&& self
				.iter()
				.all(|(key, value)| other.get(key).is_some_and(|o| deep_equals(value, o)))
	}
}

fn numbers_equal(left: &Number, right: &Number) -> bool {
	if let (Some(l), Some(r)) = (left.as_i64(), right.as_i64()) {
		return l == r;
	}
	if let (Some(l), Some(r)) = (left.as_u64(), right.as_u64()) {
		return l == r;
	}
	match (left.as_f64(), right.as_f64()) {
		(Some(l), Some(r)) => same_value(l, r),
		_ => false,
	}
}

impl DeepEquals for Value {
	fn deep_equals(&self, other: &Self) -> bool {
		match (self, other) {
			(Value::Null, Value::Null) => true,
			(Value::Bool(l), Value::Bool(r)) => l == r,
			(Value::Number(l), Value::Number(r)) => numbers_equal(l, r),
			(Value::String(l), Value::String(r)) => l == r,
			(Value::Array(l), Value::Array(r)) => l.deep_equals(r),
			(Value::Object(l), Value::Object(r)) => {
				l.len() == r.len()
					&& l
						.iter()
						.all(|(key, value)| r.get(key).is_some_and(|o| deep_equals(value, o)))
			}
			_ => false,
		}
	}
}

/// Implements [`DeepEquals`] for a struct by comparing the listed fields.
macro_rules! deep_equals_fields {
	($ty:ty { $($field:ident),+ $(,)? }) => {
		impl $crate::deep_equals::DeepEquals for $ty {
			fn deep_equals(&self, other: &Self) -> bool {
				true $(&& $crate::deep_equals::deep_equals(&self.$field, &other.$field))+
			}
		}
	};
}

pub(crate) use deep_equals_fields;

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;
	use rstest::rstest;
	use serde_json::json;

	#[rstest]
	#[case(f64::NAN, f64::NAN, true)]
	#[case(0.0, -0.0, false)]
	#[case(-0.0, -0.0, true)]
	#[case(1.5, 1.5, true)]
	#[case(1.0, 2.0, false)]
	fn test_same_value(#[case] left: f64, #[case] right: f64, #[case] expected: bool) {
		assert_eq!(deep_equals(&left, &right), expected);
	}

	#[rstest]
	fn test_json_objects_compare_by_key_set() {
		let left = json!({"a": 1, "b": [true, "x"]});
		let same = json!({"b": [true, "x"], "a": 1});
		let extra = json!({"a": 1, "b": [true, "x"], "c": null});

		assert!(deep_equals(&left, &same));
		assert!(!deep_equals(&left, &extra));
		assert!(!deep_equals(&extra, &left));
	}

	#[rstest]
	#[case(json!(1), json!("1"))]
	#[case(json!(null), json!(false))]
	#[case(json!([1]), json!({"0": 1}))]
	#[case(json!([1, 2]), json!([2, 1]))]
	fn test_json_mismatches(#[case] left: Value, #[case] right: Value) {
		assert!(!deep_equals(&left, &right));
	}

	#[rstest]
	fn test_json_integer_and_float_forms_are_equal() {
		assert!(deep_equals(&json!(2), &json!(2.0)));
	}

	#[rstest]
	fn test_sets_and_options() {
		let left: BTreeSet<_> = ["0-1".to_string(), "0-2".to_string()].into();
		let right: BTreeSet<_> = ["0-2".to_string(), "0-1".to_string()].into();

		assert!(deep_equals(&left, &right));
		assert!(deep_equals(&Some(f64::NAN), &Some(f64::NAN)));
		assert!(!deep_equals(&Some(1.0), &None));
	}

	fn arb_json() -> impl Strategy<Value = Value> {
		let leaf = prop_oneof![
			Just(Value::Null),
			any::<bool>().prop_map(Value::Bool),
			any::<i32>().prop_map(|n| json!(n)),
			"[a-z]{0,6}".prop_map(Value::String),
		];
		leaf.prop_recursive(3, 24, 4, |inner| {
			prop_oneof![
				prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
				prop::collection::btree_map("[a-z]{1,3}", inner, 0..4)
					.prop_map(|map| Value::Object(map.into_iter().collect())),
			]
		})
	}

	proptest! {
		#[test]
		fn prop_deep_equals_is_reflexive_on_clones(value in arb_json()) {
			let copy = value.clone();
			prop_assert!(deep_equals(&value, &copy));
		}

		#[test]
		fn prop_deep_equals_is_symmetric(left in arb_json(), right in arb_json()) {
			prop_assert_eq!(deep_equals(&left, &right), deep_equals(&right, &left));
		}
	}
}
