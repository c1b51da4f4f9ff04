//! Source resolution.
//!
//! Every configured source is resolved by the [`SourceProvider`] registered for its
//! [`SourceType`]. All sources run concurrently, each in its own task; the calling task is
//! the only writer of the resulting [`SourceTable`] and receives finished mappings over a
//! channel. The table is complete (or the run has failed) once every worker has reported.

use crate::config::{SourceSpec, SourceType};
use crate::error::{Error, Result};
use crate::expand::expand_env_value;
use crate::flatten::FlatMap;
use async_trait::async_trait;
use indexmap::IndexMap;
use log::{debug, log_enabled, Level};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinSet;

pub mod environment;
pub mod exec;
pub mod file;
pub mod secrets_manager;
pub mod terraform;
pub mod variable;

pub use environment::EnvironmentProvider;
pub use exec::ExecProvider;
pub use file::FileProvider;
pub use secrets_manager::SecretsManagerProvider;
pub use terraform::TerraformStateProvider;
pub use variable::VariableProvider;

/// A backend that turns a [`SourceSpec`] into a flat string mapping.
///
/// Implementations must not touch shared state; they are called concurrently.
#[async_trait]
pub trait SourceProvider: Send + Sync {
    /// Resolves the source `name`. `spec.args` is already environment-expanded.
    async fn resolve(&self, name: &str, spec: &SourceSpec) -> Result<FlatMap>;
}

/// Registry of providers by backend kind.
#[derive(Clone)]
pub struct Providers {
    providers: HashMap<SourceType, Arc<dyn SourceProvider>>,
}

impl Default for Providers {
    fn default() -> Self {
        Self::empty()
            .register(SourceType::Variable, VariableProvider)
            .register(SourceType::Environment, EnvironmentProvider)
            .register(SourceType::File, FileProvider)
            .register(SourceType::Exec, ExecProvider)
            .register(SourceType::SecretsManager, SecretsManagerProvider)
            .register(SourceType::TerraformState, TerraformStateProvider)
    }
}

impl Providers {
    /// A registry with no backends at all.
    pub fn empty() -> Self {
        Self { providers: HashMap::new() }
    }

    /// Registers (or replaces) the provider for `kind`.
    pub fn register<P: SourceProvider + 'static>(mut self, kind: SourceType, provider: P) -> Self {
        self.providers.insert(kind, Arc::new(provider));
        self
    }

    /// Looks up the provider for `kind`.
    ///
    /// # Errors
    /// * `Error::ConfigError` if no provider is registered for the kind
    pub fn get(&self, kind: SourceType) -> Result<Arc<dyn SourceProvider>> {
        self.providers
            .get(&kind)
            .cloned()
            .ok_or_else(|| Error::ConfigError(format!("invalid source type {kind}")))
    }
}

/// Resolved named mappings, from source or merge name to its flat values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceTable {
    entries: BTreeMap<String, FlatMap>,
}

impl SourceTable {
    /// Returns the mapping resolved under `name`.
    pub fn get(&self, name: &str) -> Option<&FlatMap> {
        self.entries.get(name)
    }

    /// Whether a source or merge named `name` exists.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Inserts a mapping, returning the previous one under the same name.
    pub fn insert<S: Into<String>>(&mut self, name: S, values: FlatMap) -> Option<FlatMap> {
        self.entries.insert(name.into(), values)
    }

    /// Resolved names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Number of resolved mappings.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been resolved yet.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Resolves every source concurrently and collects the results into one table.
///
/// # Errors
/// * `Error::ConfigError` if a source has no registered provider
/// * the first provider failure reported; remaining workers are abandoned
pub async fn resolve_sources(
    sources: &IndexMap<String, SourceSpec>,
    providers: &Providers,
) -> Result<SourceTable> {
    let (tx, mut rx) = mpsc::unbounded_channel::<(String, Result<FlatMap>)>();
    let mut workers = JoinSet::new();

    for (name, spec) in sources {
        let provider = providers.get(spec.source_type)?;
        let tx = tx.clone();
        let name = name.clone();
        let mut spec = spec.clone();

        workers.spawn(async move {
            spec.args = std::mem::take(&mut spec.args)
                .into_iter()
                .map(|(key, value)| (key, expand_env_value(value)))
                .collect();
            let result = provider.resolve(&name, &spec).await;
            // A closed channel means the run has already failed
            let _ = tx.send((name, result));
        });
    }
    drop(tx);

    let mut table = SourceTable::default();
    while let Some((name, result)) = rx.recv().await {
        let values = result?;
        trace_mapping("Source", &name, &values);
        table.insert(name, values);
    }

    while let Some(joined) = workers.join_next().await {
        joined?;
    }

    Ok(table)
}

/// Logs the keys of a mapping with value lengths only.
pub(crate) fn trace_mapping(label: &str, name: &str, values: &FlatMap) {
    if !log_enabled!(Level::Debug) {
        return;
    }
    debug!("{label} '{name}':");
    for (key, value) in values {
        debug!("\t{key} ({} chars)", value.len());
    }
}
