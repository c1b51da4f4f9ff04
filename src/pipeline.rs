//! End-to-end orchestration of one run.
//!
//! 1. Checks the configuration header
//! 2. Expands includes
//! 3. Resolves all sources concurrently
//! 4. Resolves merges in order
//! 5. Compiles transforms and excludes
//! 6. Processes every document
//!
//! Any error aborts the run before a single document is returned.

use crate::aws::AwsCli;
use crate::config::Configuration;
use crate::error::Result;
use crate::include::{resolve_includes, IncludeLoader, LocationLoader};
use crate::merge::resolve_merges;
use crate::processor::{Processed, Processor};
use crate::source::{resolve_sources, Providers};
use log::debug;
use serde_yaml::Value;

/// Runs configurations against documents with a fixed set of providers and an include loader.
pub struct Pipeline {
    providers: Providers,
    loader: Box<dyn IncludeLoader>,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(Providers::default(), LocationLoader::new(AwsCli::new()))
    }
}

impl Pipeline {
    /// Creates a pipeline with custom providers and include loader.
    pub fn new<L: IncludeLoader + 'static>(providers: Providers, loader: L) -> Self {
        Self { providers, loader: Box::new(loader) }
    }

    /// Resolves everything a configuration needs before documents can be rewritten.
    pub async fn prepare(&self, config: Configuration) -> Result<Processor> {
        config.validate_header()?;

        let config = resolve_includes(config, self.loader.as_ref()).await?;
        config.validate_names()?;

        debug!("Resolving {} source(s)", config.sources.len());
        let mut table = resolve_sources(&config.sources, &self.providers).await?;
        resolve_merges(&mut table, &config.merges)?;

        Processor::new(&config, &table)
    }

    /// Runs the whole transformation over `items`.
    pub async fn run(&self, config: Configuration, items: Vec<Value>) -> Result<Vec<Processed>> {
        let processor = self.prepare(config).await?;
        items.into_iter().map(|item| processor.process(item)).collect()
    }
}
