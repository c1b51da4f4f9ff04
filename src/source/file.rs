//! Structured files read from a local path, an HTTP(S) URL or object storage.

use super::SourceProvider;
use crate::aws::AwsCli;
use crate::config::{SourceSpec, SourceType};
use crate::error::{Error, Result};
use crate::fetch::{DataFormat, Location};
use crate::flatten::{filter_map, flatten_document, FlatMap};
use async_trait::async_trait;

/// Reads a YAML or JSON file named by `args.path`, flattens and filters it.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileProvider;

#[async_trait]
impl SourceProvider for FileProvider {
    async fn resolve(&self, name: &str, spec: &SourceSpec) -> Result<FlatMap> {
        let kind = SourceType::File;
        let location = location_arg(kind, name, spec)?;
        let format = DataFormat::from_path(&location.path()).ok_or_else(|| {
            Error::provider(kind, name, format!("unsupported variable file type: {location}"))
        })?;

        let bytes = location
            .fetch(&AwsCli::from_spec(spec))
            .await
            .map_err(|e| Error::provider(kind, name, e))?;
        let value = format.decode(&bytes).map_err(|e| Error::provider(kind, name, e))?;

        Ok(filter_map(flatten_document(&value), &spec.filter()))
    }
}

/// Parses the mandatory `path` argument.
pub(crate) fn location_arg(kind: SourceType, name: &str, spec: &SourceSpec) -> Result<Location> {
    let path = spec
        .arg_str("path")
        .ok_or_else(|| Error::provider(kind, name, "missing 'path' argument"))?;
    Location::parse(path).map_err(|e| Error::provider(kind, name, e))
}
