//! Inline values declared directly in the configuration.

use super::SourceProvider;
use crate::config::SourceSpec;
use crate::error::Result;
use crate::flatten::{flatten_document, FlatMap};
use async_trait::async_trait;

/// Echoes `vars` through the flattener; there is no filter step.
#[derive(Debug, Default, Clone, Copy)]
pub struct VariableProvider;

#[async_trait]
impl SourceProvider for VariableProvider {
    async fn resolve(&self, _name: &str, spec: &SourceSpec) -> Result<FlatMap> {
        Ok(flatten_document(&spec.vars))
    }
}
