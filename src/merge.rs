//! Merge resolution.
//!
//! A merge is a named mapping whose values are references of the form
//! `<sourceName>.<key>` into already resolved mappings. Merges run after every source has
//! been resolved, one at a time and in declaration order, so a merge can refer to any
//! source and to any merge declared before it.

use crate::error::{Error, Result};
use crate::expand::expand_env;
use crate::flatten::{flatten, FlatMap};
use crate::source::{trace_mapping, SourceTable};
use indexmap::IndexMap;
use serde_yaml::Value;

/// Splits a reference at its first dot into source name and key.
pub fn split_reference(reference: &str) -> Result<(&str, &str)> {
    match reference.split_once('.') {
        Some((source, key)) if !source.is_empty() && !key.is_empty() => Ok((source, key)),
        _ => Err(Error::ReferenceError(format!(
            "merge value '{reference}' was not a reference to a source"
        ))),
    }
}

/// Resolves a single merge against `table` without modifying it.
pub fn resolve_merge(table: &SourceTable, merge: &Value) -> Result<FlatMap> {
    let mut resolved = FlatMap::new();

    for (key, reference) in flatten(merge, "") {
        let reference = expand_env(&reference);
        let (source_name, source_key) = split_reference(&reference)?;

        let source = table.get(source_name).ok_or_else(|| {
            Error::ReferenceError(format!("merge source '{source_name}' was not found"))
        })?;
        let value = source.get(source_key).ok_or_else(|| {
            Error::ReferenceError(format!(
                "merge key '{source_key}' was not found in source '{source_name}'"
            ))
        })?;

        resolved.insert(key, value.clone());
    }

    Ok(resolved)
}

/// Resolves every merge in order and inserts it into `table`.
///
/// # Errors
/// * `Error::ConfigError` if a merge name is already taken in the table
/// * `Error::ReferenceError` if a reference is malformed or points nowhere
pub fn resolve_merges(table: &mut SourceTable, merges: &IndexMap<String, Value>) -> Result<()> {
    for (name, merge) in merges {
        if table.contains(name) {
            return Err(Error::ConfigError(format!("merge '{name}' is already a source")));
        }

        let resolved = resolve_merge(table, merge)?;
        trace_mapping("Merge", name, &resolved);
        table.insert(name.clone(), resolved);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_reference() {
        assert_eq!(split_reference("db.host").unwrap(), ("db", "host"));
        assert_eq!(split_reference("tf.outputs.db.host").unwrap(), ("tf", "outputs.db.host"));
        assert!(split_reference("nodot").is_err());
        assert!(split_reference(".key").is_err());
        assert!(split_reference("source.").is_err());
    }
}
