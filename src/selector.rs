//! Document selection by kind, namespace and name.
//!
//! Selectors decide which documents a transform applies to and which documents are
//! excluded from rewriting altogether. Empty fields match anything, `kind` and `namespace`
//! compare exactly, and `name` is a case-insensitive wildcard pattern (`*`, `?`).

use crate::error::{Error, Result};
use globset::{GlobBuilder, GlobMatcher};
use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::fmt;

/// A kind/namespace/name pattern as written in the configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Selector {
    pub kind: String,
    pub name: String,
    pub namespace: String,
}

impl Selector {
    /// Compiles the name pattern.
    ///
    /// # Errors
    /// * `Error::ConfigError` if the name is not a valid wildcard pattern
    pub fn compile(&self) -> Result<SelectorMatcher> {
        let name = if self.name.is_empty() {
            None
        } else {
            let glob = GlobBuilder::new(&self.name)
                .case_insensitive(true)
                .build()
                .map_err(|e| {
                    Error::ConfigError(format!("invalid name pattern '{}': {e}", self.name))
                })?;
            Some(glob.compile_matcher())
        };

        Ok(SelectorMatcher { kind: self.kind.clone(), namespace: self.namespace.clone(), name })
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let any = |s: &str| if s.is_empty() { "*".to_string() } else { s.to_string() };
        write!(f, "{}/{} in {}", any(&self.kind), any(&self.name), any(&self.namespace))
    }
}

/// A compiled [`Selector`].
#[derive(Debug, Clone)]
pub struct SelectorMatcher {
    kind: String,
    namespace: String,
    name: Option<GlobMatcher>,
}

impl SelectorMatcher {
    /// Every non-empty selector field has to match.
    pub fn matches(&self, kind: &str, namespace: &str, name: &str) -> bool {
        if !self.kind.is_empty() && self.kind != kind {
            return false;
        }
        if !self.namespace.is_empty() && self.namespace != namespace {
            return false;
        }
        match &self.name {
            Some(glob) => glob.is_match(name),
            None => true,
        }
    }

    pub fn matches_resource(&self, id: &ResourceId) -> bool {
        self.matches(&id.kind, &id.namespace, &id.name)
    }
}

/// The identity of a document used for selection and diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceId {
    pub kind: String,
    pub name: String,
    pub namespace: String,
}

impl ResourceId {
    /// Reads `kind`, `metadata.name` and `metadata.namespace`; missing fields are empty.
    pub fn from_document(document: &Value) -> Self {
        let text = |value: Option<&Value>| {
            value.and_then(Value::as_str).unwrap_or_default().to_string()
        };
        let metadata = document.get("metadata");
        Self {
            kind: text(document.get("kind")),
            name: text(metadata.and_then(|m| m.get("name"))),
            namespace: text(metadata.and_then(|m| m.get("namespace"))),
        }
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind, self.name)?;
        if !self.namespace.is_empty() {
            write!(f, " in namespace {}", self.namespace)?;
        }
        Ok(())
    }
}
