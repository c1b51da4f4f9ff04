//! Outputs of a Terraform state file.

use super::file::location_arg;
use super::SourceProvider;
use crate::aws::AwsCli;
use crate::config::{SourceSpec, SourceType};
use crate::error::{Error, Result};
use crate::flatten::{filter_map, flatten, FlatMap};
use async_trait::async_trait;
use indexmap::IndexMap;
use log::debug;
use serde::Deserialize;
use serde_json::Value as JsonValue;

#[derive(Debug, Default, Deserialize)]
pub struct TerraformState {
    #[serde(default)]
    pub outputs: IndexMap<String, TerraformOutput>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TerraformOutput {
    #[serde(default)]
    pub value: JsonValue,
    #[serde(default, rename = "type")]
    pub output_type: JsonValue,
}

/// Reads a state document from `args.path`.
///
/// With `args.output`, that single output (which must be an object) is flattened. Otherwise
/// every primitive output is emitted under its own name.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerraformStateProvider;

#[async_trait]
impl SourceProvider for TerraformStateProvider {
    async fn resolve(&self, name: &str, spec: &SourceSpec) -> Result<FlatMap> {
        let kind = SourceType::TerraformState;
        let location = location_arg(kind, name, spec)?;
        let bytes = location
            .fetch(&AwsCli::from_spec(spec))
            .await
            .map_err(|e| Error::provider(kind, name, e))?;
        let state: TerraformState = serde_json::from_slice(&bytes)
            .map_err(|e| Error::provider(kind, name, format!("invalid state file: {e}")))?;

        let raw = match spec.arg_str("output") {
            Some(output) => single_output(&state, output),
            None => Ok(primitive_outputs(name, &state)),
        }
        .map_err(|e| Error::provider(kind, name, e))?;

        Ok(filter_map(raw, &spec.filter()))
    }
}

/// Flattens the object value of one named output.
pub fn single_output(state: &TerraformState, output: &str) -> std::result::Result<FlatMap, String> {
    let root = state
        .outputs
        .get(output)
        .ok_or_else(|| format!("could not find output key '{output}'"))?;

    if !root.value.is_object() {
        return Err(format!("unsupported output type for '{output}', expected an object"));
    }
    let value = serde_yaml::to_value(&root.value).map_err(|e| e.to_string())?;
    Ok(flatten(&value, ""))
}

/// Collects every `string`, `number` and `bool` output; other declared types are dropped.
pub fn primitive_outputs(name: &str, state: &TerraformState) -> FlatMap {
    let mut out = FlatMap::new();
    for (output, TerraformOutput { value, output_type }) in &state.outputs {
        let text = match (output_type.as_str(), value) {
            (Some("string"), JsonValue::String(s)) => Some(s.clone()),
            (Some("number"), JsonValue::Number(n)) => Some(number_text(n)),
            (Some("bool"), JsonValue::Bool(b)) => Some(b.to_string()),
            _ => None,
        };
        match text {
            Some(text) => {
                out.insert(output.clone(), text);
            }
            None => debug!("Source '{name}': dropping output '{output}' of type {output_type}"),
        }
    }
    out
}

/// Plain decimal rendering, never exponent notation.
fn number_text(n: &serde_json::Number) -> String {
    if let Some(i) = n.as_i64() {
        i.to_string()
    } else if let Some(u) = n.as_u64() {
        u.to_string()
    } else {
        n.as_f64().map(|f| f.to_string()).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STATE: &str = r#"{
        "version": 4,
        "outputs": {
            "bucket": {"value": "assets", "type": "string"},
            "replicas": {"value": 3, "type": "number"},
            "ratio": {"value": 1e21, "type": "number"},
            "public": {"value": false, "type": "bool"},
            "tags": {"value": {"team": "infra"}, "type": ["map", "string"]},
            "db": {
                "value": {"host": "db.internal", "port": 5432},
                "type": ["object", {"host": "string", "port": "number"}]
            }
        }
    }"#;

    fn state() -> TerraformState {
        serde_json::from_str(STATE).unwrap()
    }

    #[test]
    fn test_primitive_outputs() {
        let out = primitive_outputs("tf", &state());
        assert_eq!(out["bucket"], "assets");
        assert_eq!(out["replicas"], "3");
        assert_eq!(out["ratio"], "1000000000000000000000");
        assert_eq!(out["public"], "false");
        assert!(!out.contains_key("tags"));
        assert!(!out.contains_key("db"));
    }

    #[test]
    fn test_single_output() {
        let out = single_output(&state(), "db").unwrap();
        assert_eq!(out["host"], "db.internal");
        assert_eq!(out["port"], "5432");

        assert!(single_output(&state(), "bucket").is_err());
        assert!(single_output(&state(), "missing").is_err());
    }
}
