//! Variable values supplied to expansion and recovered by unexpansion.

use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;

/// A variable value: a string, a list of strings, or a map of strings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "RawValue")]
pub enum Value {
	String(String),
	List(Vec<String>),
	Map(BTreeMap<String, String>),
}

/// Mapping from variable name to value.
///
/// Ordered by name, so map-valued output and debug printing are stable.
pub type Variables = BTreeMap<String, Value>;

impl Value {
	/// Whether the value holds no characters, items or pairs.
	pub fn is_empty(&self) -> bool {
		match self {
			Value::String(s) => s.is_empty(),
			Value::List(items) => items.is_empty(),
			Value::Map(pairs) => pairs.is_empty(),
		}
	}

	pub fn as_str(&self) -> Option<&str> {
		match self {
			Value::String(s) => Some(s),
			_ => None,
		}
	}
}

impl From<&str> for Value {
	fn from(s: &str) -> Self {
		Value::String(s.to_string())
	}
}

impl From<String> for Value {
	fn from(s: String) -> Self {
		Value::String(s)
	}
}

impl<T: Into<String>> From<Vec<T>> for Value {
	fn from(items: Vec<T>) -> Self {
		Value::List(items.into_iter().map(Into::into).collect())
	}
}

impl<T: Into<String>, const N: usize> From<[T; N]> for Value {
	fn from(items: [T; N]) -> Self {
		Value::List(items.into_iter().map(Into::into).collect())
	}
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Value {
	fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
		Value::Map(
			iter.into_iter()
				.map(|(k, v)| (k.into(), v.into()))
				.collect(),
		)
	}
}

impl From<BTreeMap<String, String>> for Value {
	fn from(pairs: BTreeMap<String, String>) -> Self {
		Value::Map(pairs)
	}
}

impl Serialize for Value {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		match self {
			Value::String(s) => s.serialize(serializer),
			Value::List(items) => items.serialize(serializer),
			Value::Map(pairs) => pairs.serialize(serializer),
		}
	}
}

/// A printable scalar as it appears in JSON or TOML input.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Scalar {
	String(String),
	Integer(i64),
	Float(f64),
	Bool(bool),
}

impl From<Scalar> for String {
	fn from(scalar: Scalar) -> Self {
		match scalar {
			Scalar::String(s) => s,
			Scalar::Integer(n) => n.to_string(),
			Scalar::Float(f) => f.to_string(),
			Scalar::Bool(b) => b.to_string(),
		}
	}
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawValue {
	Scalar(Scalar),
	List(Vec<Scalar>),
	Map(BTreeMap<String, Scalar>),
}

impl From<RawValue> for Value {
	fn from(raw: RawValue) -> Self {
		match raw {
			RawValue::Scalar(s) => Value::String(s.into()),
			RawValue::List(items) => Value::List(items.into_iter().map(String::from).collect()),
			RawValue::Map(pairs) => Value::Map(
				pairs
					.into_iter()
					.map(|(k, v)| (k, String::from(v)))
					.collect(),
			),
		}
	}
}

/// Deserialize a variable table, dropping `null` entries as undefined.
pub fn deserialize_variables<'de, D>(deserializer: D) -> Result<Variables, D::Error>
where
	D: serde::Deserializer<'de>,
{
	let raw: BTreeMap<String, Option<Value>> = BTreeMap::deserialize(deserializer)?;
	Ok(raw
		.into_iter()
		.filter_map(|(name, value)| value.map(|v| (name, v)))
		.collect())
}
