//! Per-document processing: exclusion, transform binding and rewriting.

use crate::config::Configuration;
use crate::error::{Error, Result};
use crate::flatten::FlatMap;
use crate::selector::{ResourceId, Selector, SelectorMatcher};
use crate::source::SourceTable;
use crate::template::{compile_placeholder, rewrite, Binding};
use log::{debug, warn};
use regex::Regex;
use serde_yaml::Value;

/// A transform with its pattern compiled and its source mapping looked up.
#[derive(Debug, Clone)]
struct CompiledTransform {
    source_name: String,
    source: FlatMap,
    pattern: Regex,
    selector: Selector,
    target: SelectorMatcher,
}

/// The outcome of processing one document.
#[derive(Debug, Clone, PartialEq)]
pub struct Processed {
    pub id: ResourceId,
    pub document: Value,
    /// Placeholder texts that never resolved
    pub unresolved: Vec<String>,
    /// Whether an exclude selector kept the document from being rewritten
    pub excluded: bool,
}

impl Processed {
    /// Logs one warning per unresolved placeholder.
    pub fn report(&self) {
        for placeholder in &self.unresolved {
            warn!("Unresolved placeholder '{placeholder}' in {}", self.id);
        }
    }
}

/// Applies a configuration's excludes and transforms to documents.
#[derive(Debug, Clone)]
pub struct Processor {
    transforms: Vec<CompiledTransform>,
    excludes: Vec<SelectorMatcher>,
}

impl Processor {
    /// Compiles every pattern and selector and binds each transform to its mapping.
    ///
    /// # Errors
    /// * `Error::ConfigError` if a transform names an unknown source, or a pattern or
    ///   selector does not compile
    pub fn new(config: &Configuration, table: &SourceTable) -> Result<Self> {
        let transforms = config
            .transforms
            .iter()
            .map(|transform| {
                let source = table.get(&transform.source).ok_or_else(|| {
                    Error::ConfigError(format!("unknown source '{}'", transform.source))
                })?;
                Ok(CompiledTransform {
                    source_name: transform.source.clone(),
                    source: source.clone(),
                    pattern: compile_placeholder(transform.pattern())?,
                    selector: transform.target.clone(),
                    target: transform.target.compile()?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let excludes =
            config.excludes.iter().map(Selector::compile).collect::<Result<Vec<_>>>()?;

        Ok(Self { transforms, excludes })
    }

    /// Rewrites one document with every transform targeting it.
    ///
    /// # Errors
    /// * `Error::EncodingError` if the document carries malformed encoded data
    pub fn process(&self, document: Value) -> Result<Processed> {
        let id = ResourceId::from_document(&document);

        if self.excludes.iter().any(|exclude| exclude.matches_resource(&id)) {
            debug!("Excluding {id}");
            return Ok(Processed { id, document, unresolved: Vec::new(), excluded: true });
        }

        let bindings: Vec<Binding<'_>> = self
            .transforms
            .iter()
            .filter(|transform| transform.target.matches_resource(&id))
            .map(|transform| {
                debug!(
                    "Enabled transform regex '{}' with source '{}' to {id} (target was {})",
                    transform.pattern, transform.source_name, transform.selector
                );
                Binding::new(&transform.pattern, &transform.source)
            })
            .collect();

        let rewritten = rewrite(document, &bindings)?;
        Ok(Processed {
            id,
            document: rewritten.document,
            unresolved: rewritten.unresolved,
            excluded: false,
        })
    }
}
