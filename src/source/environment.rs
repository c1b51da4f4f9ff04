//! Values taken from the process environment.

use super::SourceProvider;
use crate::config::SourceSpec;
use crate::error::Result;
use crate::flatten::FlatMap;
use async_trait::async_trait;
use log::debug;

/// Emits `alias -> value` for every `VAR -> alias` pair of the filter whose variable is set.
///
/// Unset variables are silently left out; an empty filter yields an empty mapping.
#[derive(Debug, Default, Clone, Copy)]
pub struct EnvironmentProvider;

#[async_trait]
impl SourceProvider for EnvironmentProvider {
    async fn resolve(&self, name: &str, spec: &SourceSpec) -> Result<FlatMap> {
        let filter = spec.filter();
        let mut out = FlatMap::new();
        for (var, alias) in &filter {
            match std::env::var(var) {
                Ok(value) => {
                    out.insert(alias.clone(), value);
                }
                Err(_) => debug!("Source '{name}': environment variable {var} is not set"),
            }
        }
        Ok(out)
    }
}
