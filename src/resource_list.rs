//! Document-list envelope and the legacy document stream.

use crate::config::Configuration;
use crate::constants::RESOURCE_LIST_KIND;
use crate::error::{Error, Result};
use serde::Deserialize;
use serde_yaml::{Mapping, Value};
use std::io::{Read, Write};

const ITEMS: &str = "items";
const FUNCTION_CONFIG: &str = "functionConfig";

/// A `ResourceList` as exchanged with the surrounding pipeline.
///
/// Everything except `items` is kept as decoded and echoed back unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceList {
    envelope: Mapping,
    pub items: Vec<Value>,
}

impl ResourceList {
    /// Decodes an envelope.
    ///
    /// # Errors
    /// * `Error::YamlError` on malformed input
    /// * `Error::ConfigError` if the input is not a `ResourceList`
    pub fn read<R: Read>(reader: R) -> Result<Self> {
        let envelope = match serde_yaml::from_reader::<_, Value>(reader)? {
            Value::Mapping(envelope) => envelope,
            _ => return Err(Error::ConfigError("input is not a ResourceList".to_string())),
        };

        let kind = envelope.get("kind").and_then(Value::as_str).unwrap_or_default();
        if kind != RESOURCE_LIST_KIND {
            return Err(Error::ConfigError(format!(
                "unsupported input kind '{kind}', expected {RESOURCE_LIST_KIND}"
            )));
        }

        let items = match envelope.get(ITEMS) {
            Some(Value::Sequence(items)) => items.clone(),
            None | Some(Value::Null) => Vec::new(),
            Some(_) => {
                return Err(Error::ConfigError("ResourceList items must be a list".to_string()))
            }
        };

        Ok(Self { envelope, items })
    }

    /// The embedded function configuration.
    pub fn config(&self) -> Result<Configuration> {
        let value = self.envelope.get(FUNCTION_CONFIG).cloned().unwrap_or(Value::Null);
        Configuration::from_value(value)
    }

    /// Encodes the envelope with the current items.
    pub fn write<W: Write>(&self, writer: W) -> Result<()> {
        let mut envelope = self.envelope.clone();
        envelope.insert(ITEMS.into(), Value::Sequence(self.items.clone()));
        serde_yaml::to_writer(writer, &envelope)?;
        Ok(())
    }
}

/// Reads a `---` separated stream of documents; empty documents are skipped.
pub fn read_stream<R: Read>(reader: R) -> Result<Vec<Value>> {
    let mut items = Vec::new();
    for document in serde_yaml::Deserializer::from_reader(reader) {
        let value = Value::deserialize(document)?;
        if !value.is_null() {
            items.push(value);
        }
    }
    Ok(items)
}

/// Writes documents as a `---` separated stream.
pub fn write_stream<W: Write>(items: &[Value], mut writer: W) -> Result<()> {
    for (index, item) in items.iter().enumerate() {
        if index > 0 {
            writer.write_all(b"---\n")?;
        }
        serde_yaml::to_writer(&mut writer, item)?;
    }
    writer.flush()?;
    Ok(())
}
