//! Shell-style environment variable expansion.
//!
//! `$VAR` and `${VAR}` references are replaced with the process environment value.
//! Unknown variables expand to an empty string, never to an error.

use serde_yaml::Value;
use std::borrow::Cow;

/// Expands environment references in a single string.
pub fn expand_env(input: &str) -> Cow<'_, str> {
    shellexpand::env_with_context_no_errors(input, |var: &str| {
        Some(std::env::var(var).unwrap_or_default())
    })
}

/// Expands every string leaf of a nested value; mapping keys and non-string scalars are kept.
pub fn expand_env_value(value: Value) -> Value {
    match value {
        Value::String(s) => Value::String(expand_env(&s).into_owned()),
        Value::Sequence(items) => {
            Value::Sequence(items.into_iter().map(expand_env_value).collect())
        }
        Value::Mapping(map) => Value::Mapping(
            map.into_iter().map(|(key, item)| (key, expand_env_value(item))).collect(),
        ),
        Value::Tagged(mut tagged) => {
            tagged.value = expand_env_value(tagged.value);
            Value::Tagged(tagged)
        }
        other @ (Value::Null | Value::Bool(_) | Value::Number(_)) => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_env_known_and_unknown() {
        std::env::set_var("VT_EXPAND_TEST_HOME", "/home/vt");
        assert_eq!(expand_env("$VT_EXPAND_TEST_HOME/x"), "/home/vt/x");
        assert_eq!(expand_env("${VT_EXPAND_TEST_HOME}/y"), "/home/vt/y");
        assert_eq!(expand_env("a${VT_EXPAND_TEST_UNSET_VAR}b"), "ab");
        assert_eq!(expand_env("plain"), "plain");
    }

    #[test]
    fn test_expand_env_value_nested() {
        std::env::set_var("VT_EXPAND_TEST_REGION", "eu-west-1");
        let value: Value =
            serde_yaml::from_str("{region: $VT_EXPAND_TEST_REGION, list: [$VT_EXPAND_TEST_REGION, 3]}")
                .unwrap();
        let expanded = expand_env_value(value);
        assert_eq!(expanded["region"], Value::from("eu-west-1"));
        assert_eq!(expanded["list"][0], Value::from("eu-west-1"));
        assert_eq!(expanded["list"][1], Value::from(3));
    }
}
