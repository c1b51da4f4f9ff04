//! Configuration include expansion.
//!
//! Includes are expanded by repeated passes: every pass loads each include identifier not
//! seen before and merges the fragment in, which may append further includes. Expansion
//! stops after the first pass that finds nothing new, so an include reachable twice (even
//! through a cycle) is only loaded once.

use crate::aws::AwsCli;
use crate::config::Configuration;
use crate::error::{Error, Result};
use crate::expand::expand_env;
use crate::fetch::Location;
use async_trait::async_trait;
use indexmap::IndexSet;
use log::debug;

/// Loads one include identifier (already environment-expanded) as a configuration fragment.
#[async_trait]
pub trait IncludeLoader: Send + Sync {
    async fn load(&self, include: &str) -> Result<Configuration>;
}

/// Loads fragments from local paths, `file://`, `http(s)://` and `s3://` locations.
#[derive(Debug, Clone, Default)]
pub struct LocationLoader {
    aws: AwsCli,
}

impl LocationLoader {
    pub fn new(aws: AwsCli) -> Self {
        Self { aws }
    }
}

#[async_trait]
impl IncludeLoader for LocationLoader {
    async fn load(&self, include: &str) -> Result<Configuration> {
        let error = |cause: String| Error::IncludeError { include: include.to_string(), cause };

        let location = Location::parse(include).map_err(|e| error(e.to_string()))?;
        let bytes = location.fetch(&self.aws).await.map_err(|e| error(e.to_string()))?;
        let content = String::from_utf8(bytes).map_err(|e| error(e.to_string()))?;
        Configuration::parse(&content).map_err(|e| error(e.to_string()))
    }
}

/// Expands all includes of `config`, transitively.
///
/// # Errors
/// * `Error::IncludeError` if an include cannot be loaded
/// * `Error::ConfigError` if a fragment declares a source or merge name that already exists
pub async fn resolve_includes(
    mut config: Configuration,
    loader: &dyn IncludeLoader,
) -> Result<Configuration> {
    let mut processed = std::mem::take(&mut config.resolved_includes);
    let mut pass = 0;

    loop {
        pass += 1;
        let pending: IndexSet<String> = config
            .includes
            .iter()
            .map(|include| expand_env(include).into_owned())
            .filter(|include| !processed.contains(include))
            .collect();

        if pending.is_empty() {
            break;
        }

        for include in pending {
            debug!("Including '{include}' (pass {pass})");
            let fragment = loader.load(&include).await?;
            config.extend_with(fragment).map_err(|e| match e {
                Error::ConfigError(msg) => {
                    Error::ConfigError(format!("{msg} (from include '{include}')"))
                }
                other => other,
            })?;
            processed.insert(include);
        }
    }

    debug!("Include expansion finished after {pass} pass(es)");
    config.resolved_includes = processed;
    Ok(config)
}
