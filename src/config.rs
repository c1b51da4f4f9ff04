//! Configuration handling for valuetransformer.
//! This module provides the function configuration model (sources, merges, transforms,
//! excludes and includes) together with parsing and validation.

use crate::constants::{API_VERSION, DEFAULT_PLACEHOLDER, KIND};
use crate::error::{Error, Result};
use crate::flatten::{flatten_document, FlatMap};
use crate::selector::Selector;
use indexmap::map::Entry;
use indexmap::{IndexMap, IndexSet};
use log::debug;
use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::fmt;
use std::path::Path;

/// Backend kinds a source can be resolved from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum SourceType {
    Variable,
    Environment,
    File,
    Exec,
    SecretsManager,
    TerraformState,
}

impl SourceType {
    pub const ALL: [SourceType; 6] = [
        SourceType::Variable,
        SourceType::Environment,
        SourceType::File,
        SourceType::Exec,
        SourceType::SecretsManager,
        SourceType::TerraformState,
    ];
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SourceType::Variable => "Variable",
            SourceType::Environment => "Environment",
            SourceType::File => "File",
            SourceType::Exec => "Exec",
            SourceType::SecretsManager => "SecretsManager",
            SourceType::TerraformState => "TerraformState",
        };
        f.write_str(name)
    }
}

/// One named source of values.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SourceSpec {
    #[serde(rename = "type")]
    pub source_type: SourceType,

    /// Backend specific parameters, environment-expanded before use
    #[serde(default)]
    pub args: IndexMap<String, Value>,

    /// Inline values for `Variable`, a filter/rename table for every other kind
    #[serde(default)]
    pub vars: Value,
}

impl SourceSpec {
    /// Returns a string argument, treating empty strings as absent.
    pub fn arg_str(&self, key: &str) -> Option<&str> {
        self.args.get(key).and_then(Value::as_str).filter(|s| !s.is_empty())
    }

    /// The flattened `vars` table, used as a filter by most backends.
    /// Without `vars` the filter is empty and lets everything through.
    pub fn filter(&self) -> FlatMap {
        flatten_document(&self.vars)
    }
}

/// A placeholder pattern bound to a named mapping, applied to documents matching `target`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct TransformSpec {
    pub source: String,
    pub regex: String,
    #[serde(alias = "targets")]
    pub target: Selector,
}

impl TransformSpec {
    /// The placeholder pattern, falling back to `${key}` when none is configured.
    pub fn pattern(&self) -> &str {
        if self.regex.is_empty() {
            DEFAULT_PLACEHOLDER
        } else {
            &self.regex
        }
    }
}

/// The `ValueTransformer` function configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Configuration {
    pub api_version: String,
    pub kind: String,
    pub includes: Vec<String>,
    pub sources: IndexMap<String, SourceSpec>,
    pub merges: IndexMap<String, Value>,
    pub transforms: Vec<TransformSpec>,
    pub excludes: Vec<Selector>,

    /// Include identifiers (after expansion) whose content is already part of this configuration
    #[serde(skip)]
    pub resolved_includes: IndexSet<String>,
}

impl Configuration {
    /// Parses a configuration (or configuration fragment) from YAML or JSON text.
    pub fn parse(content: &str) -> Result<Self> {
        serde_yaml::from_str(content)
            .map_err(|e| Error::ConfigError(format!("invalid configuration: {e}")))
    }

    /// Converts an already decoded value, e.g. an envelope's `functionConfig`.
    pub fn from_value(value: Value) -> Result<Self> {
        serde_yaml::from_value(value)
            .map_err(|e| Error::ConfigError(format!("invalid configuration: {e}")))
    }

    /// Reads and parses a configuration file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading configuration from {}", path.display());
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::ConfigError(format!("cannot read '{}': {e}", path.display()))
        })?;
        Self::parse(&content)
    }

    /// Checks the fixed `kind` and `apiVersion` literals.
    pub fn validate_header(&self) -> Result<()> {
        if self.kind != KIND {
            return Err(Error::ConfigError(format!(
                "unsupported kind '{}', expected {KIND}",
                self.kind
            )));
        }
        if self.api_version != API_VERSION {
            return Err(Error::ConfigError(format!(
                "unsupported apiVersion '{}', expected {API_VERSION}",
                self.api_version
            )));
        }
        Ok(())
    }

    /// Sources and merges share one namespace.
    pub fn validate_names(&self) -> Result<()> {
        if let Some(name) = self.merges.keys().find(|name| self.sources.contains_key(*name)) {
            return Err(Error::ConfigError(format!(
                "'{name}' is declared both as a source and as a merge"
            )));
        }
        Ok(())
    }

    /// Appends a fragment's lists and unions its named tables into this configuration.
    ///
    /// # Errors
    /// * `Error::ConfigError` if a source or merge name is already present
    pub fn extend_with(&mut self, fragment: Configuration) -> Result<()> {
        self.includes.extend(fragment.includes);
        self.transforms.extend(fragment.transforms);
        self.excludes.extend(fragment.excludes);
        union_into(&mut self.sources, fragment.sources, "source")?;
        union_into(&mut self.merges, fragment.merges, "merge")
    }
}

fn union_into<V>(
    dest: &mut IndexMap<String, V>,
    src: IndexMap<String, V>,
    what: &str,
) -> Result<()> {
    for (name, value) in src {
        match dest.entry(name) {
            Entry::Occupied(entry) => {
                return Err(Error::ConfigError(format!("duplicate {what} '{}'", entry.key())));
            }
            Entry::Vacant(entry) => {
                entry.insert(value);
            }
        }
    }
    Ok(())
}
