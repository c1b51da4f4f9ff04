//! Error handling for valuetransformer.
//! Defines the error taxonomy and the result type used throughout the crate.

use crate::config::SourceType;
use thiserror::Error;

/// All fatal conditions of a run.
///
/// Every variant aborts the whole run; the only non-fatal condition (an unresolved
/// placeholder) is reported through [`crate::template::Rewritten::unresolved`] instead.
#[derive(Error, Debug)]
pub enum Error {
    /// Represents errors that occur during file system operations
    #[error("IO error: {0}.")]
    IoError(#[from] std::io::Error),

    /// Invalid or inconsistent configuration
    #[error("Configuration error: {0}.")]
    ConfigError(String),

    /// A backend could not produce its mapping
    #[error("Source '{name}' ({backend}) failed: {cause}.")]
    ProviderError { backend: SourceType, name: String, cause: String },

    /// A merge value does not point at an existing source key
    #[error("Reference error: {0}.")]
    ReferenceError(String),

    /// An include could not be fetched or parsed
    #[error("Failed to load include '{include}': {cause}.")]
    IncludeError { include: String, cause: String },

    /// A location could not be read
    #[error("Failed to fetch '{location}': {cause}.")]
    FetchError { location: String, cause: String },

    /// Encoded document content could not be decoded
    #[error("Encoding error in {document} at '{field}': {cause}.")]
    EncodingError { document: String, field: String, cause: String },

    /// A source worker ended without reporting a result
    #[error("Source worker failed: {0}.")]
    TaskError(#[from] tokio::task::JoinError),

    #[error("YAML error: {0}.")]
    YamlError(#[from] serde_yaml::Error),

    #[error("JSON error: {0}.")]
    JsonError(#[from] serde_json::Error),
}

impl Error {
    /// Builds a [`Error::ProviderError`] for the given backend and source name.
    pub fn provider<S: Into<String>, C: std::fmt::Display>(
        backend: SourceType,
        name: S,
        cause: C,
    ) -> Self {
        Error::ProviderError { backend, name: name.into(), cause: cause.to_string() }
    }
}

/// Convenience type alias for Results with [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Default error handler that prints the error and exits the program.
///
/// # Behavior
/// Prints the error message to stderr and exits with status code 1
pub fn default_error_handler(err: Error) {
    eprintln!("{err}");
    std::process::exit(1);
}
