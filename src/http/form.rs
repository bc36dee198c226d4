//! Flattening of JSON parameters into form fields and query pairs.

// crates.io
use serde_json::Value;

/// Flattens an object into `(key, value)` pairs.
///
/// Nested objects use `parent[child]` keys, array items repeat `parent[]`, `null` becomes an
/// empty string, and other scalars are stringified. Returns `None` when `value` is not an
/// object.
pub fn flatten(value: &Value) -> Option<Vec<(String, String)>> {
	let Value::Object(map) = value else {
		return None;
	};
	let mut pairs = Vec::with_capacity(map.len());

	for (key, value) in map {
		push(key.clone(), value, &mut pairs);
	}

	Some(pairs)
}

fn push(key: String, value: &Value, pairs: &mut Vec<(String, String)>) {
	match value {
		Value::Null => pairs.push((key, String::new())),
		Value::Bool(b) => pairs.push((key, b.to_string())),
		Value::Number(n) => pairs.push((key, n.to_string())),
		Value::String(s) => pairs.push((key, s.clone())),
		Value::Array(items) =>
			for item in items {
				push(format!("{key}[]"), item, pairs);
			},
		Value::Object(map) =>
			for (child, value) in map {
				push(format!("{key}[{child}]"), value, pairs);
			},
	}
}
