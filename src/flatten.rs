//! Flattening of nested values into dot-joined string maps.
//!
//! Every source ultimately produces a [`FlatMap`]. The flattener is the tolerant boundary
//! between arbitrary structured input and that shape: it never fails, it only warns.

use crate::constants::PATH_SEPARATOR;
use indexmap::IndexMap;
use log::warn;
use serde_yaml::Value;

/// A single-level mapping from dot-joined path to string value.
pub type FlatMap = IndexMap<String, String>;

/// Flattens `value` into a new map, rooting every key at `prefix`.
///
/// * `null` becomes an empty string
/// * scalars are stringified
/// * sequences recurse with `prefix.<index>`
/// * mappings recurse with `prefix.<key>`; keys that cannot be represented as text are skipped
pub fn flatten(value: &Value, prefix: &str) -> FlatMap {
    let mut out = FlatMap::new();
    flatten_into(value, prefix, &mut out);
    out
}

/// Flattens a whole decoded document or table; `null` (absent or empty) yields an empty map.
pub fn flatten_document(value: &Value) -> FlatMap {
    match value {
        Value::Null => FlatMap::new(),
        other => flatten(other, ""),
    }
}

/// Same as [`flatten`] but appends to an existing map.
pub fn flatten_into(value: &Value, prefix: &str, out: &mut FlatMap) {
    match value {
        Value::Null => {
            out.insert(prefix.to_string(), String::new());
        }
        Value::Bool(b) => {
            out.insert(prefix.to_string(), b.to_string());
        }
        Value::Number(n) => {
            out.insert(prefix.to_string(), n.to_string());
        }
        Value::String(s) => {
            out.insert(prefix.to_string(), s.clone());
        }
        Value::Sequence(items) => {
            for (index, item) in items.iter().enumerate() {
                flatten_into(item, &join(prefix, &index.to_string()), out);
            }
        }
        Value::Mapping(map) => {
            for (key, item) in map {
                match key_to_string(key) {
                    Some(key) => flatten_into(item, &join(prefix, &key), out),
                    None => warn!(
                        "Unhandled map key during flattening at '{prefix}': {key:?}, value ignored"
                    ),
                }
            }
        }
        Value::Tagged(tagged) => {
            warn!("Unhandled type during flattening at '{prefix}': tag {}, using default", tagged.tag);
            out.insert(prefix.to_string(), default_repr(value));
        }
    }
}

/// Joins a path prefix and a component; an empty prefix yields the component alone.
pub fn join(prefix: &str, component: &str) -> String {
    if prefix.is_empty() {
        component.to_string()
    } else {
        format!("{prefix}{PATH_SEPARATOR}{component}")
    }
}

/// Textual form of a mapping key, if it has one.
pub fn key_to_string(key: &Value) -> Option<String> {
    match key {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn default_repr(value: &Value) -> String {
    match serde_yaml::to_string(value) {
        Ok(text) => text.trim_end().to_string(),
        Err(_) => format!("{value:?}"),
    }
}

/// Projects `raw` through a rename table.
///
/// An empty filter passes `raw` through unchanged. Otherwise the result holds one entry per
/// filter pair whose key exists in `raw`, stored under the filter's value.
pub fn filter_map(raw: FlatMap, filter: &FlatMap) -> FlatMap {
    if filter.is_empty() {
        return raw;
    }

    filter
        .iter()
        .filter_map(|(key, alias)| raw.get(key).map(|value| (alias.clone(), value.clone())))
        .collect()
}
