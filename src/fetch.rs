//! Location parsing and raw byte fetching for files, state documents and includes.

use crate::aws::AwsCli;
use crate::error::{Error, Result};
use log::debug;
use serde_yaml::Value;
use std::path::PathBuf;
use url::Url;

/// Where a document lives.
#[derive(Debug, Clone, PartialEq)]
pub enum Location {
    /// Local filesystem path (plain or `file://`)
    FileSystem(PathBuf),
    /// `http://` or `https://` URL
    Http(Url),
    /// `s3://bucket/key` object
    ObjectStorage(Url),
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Location::FileSystem(path) => write!(f, "local path: '{}'", path.display()),
            Location::Http(url) => write!(f, "url: '{url}'"),
            Location::ObjectStorage(url) => write!(f, "object: '{url}'"),
        }
    }
}

impl Location {
    /// Creates a Location from a path or URL string.
    ///
    /// # Errors
    /// * `Error::FetchError` for URLs with an unsupported scheme
    pub fn parse(s: &str) -> Result<Self> {
        let url = match Url::parse(s) {
            Ok(url) => url,
            // Relative paths and plain absolute paths are not URLs
            Err(_) => return Ok(Self::FileSystem(PathBuf::from(s))),
        };

        match url.scheme() {
            "s3" => Ok(Self::ObjectStorage(url)),
            "http" | "https" => Ok(Self::Http(url)),
            "file" => url.to_file_path().map(Self::FileSystem).map_err(|_| Error::FetchError {
                location: s.to_string(),
                cause: "invalid file URL".to_string(),
            }),
            scheme => Err(Error::FetchError {
                location: s.to_string(),
                cause: format!("unsupported URL scheme: {scheme}"),
            }),
        }
    }

    /// Path component used for format sniffing.
    pub fn path(&self) -> String {
        match self {
            Location::FileSystem(path) => path.to_string_lossy().into_owned(),
            Location::Http(url) | Location::ObjectStorage(url) => url.path().to_string(),
        }
    }

    /// Reads the raw bytes behind this location.
    pub async fn fetch(&self, aws: &AwsCli) -> Result<Vec<u8>> {
        debug!("Fetching {self}");
        match self {
            Location::FileSystem(path) => {
                tokio::fs::read(path).await.map_err(|e| self.error(e))
            }
            Location::Http(url) => {
                let response = reqwest::get(url.clone())
                    .await
                    .and_then(|response| response.error_for_status())
                    .map_err(|e| self.error(e))?;
                let body = response.bytes().await.map_err(|e| self.error(e))?;
                Ok(body.to_vec())
            }
            Location::ObjectStorage(url) => aws.download(url).await,
        }
    }

    fn error<E: std::fmt::Display>(&self, cause: E) -> Error {
        let location = match self {
            Location::FileSystem(path) => path.display().to_string(),
            Location::Http(url) | Location::ObjectStorage(url) => url.to_string(),
        };
        Error::FetchError { location, cause: cause.to_string() }
    }
}

/// Structured formats a fetched file can be decoded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataFormat {
    Yaml,
    Json,
}

impl DataFormat {
    /// Picks the format from a file extension.
    pub fn from_path(path: &str) -> Option<Self> {
        if path.ends_with(".yml") || path.ends_with(".yaml") {
            Some(Self::Yaml)
        } else if path.ends_with(".json") {
            Some(Self::Json)
        } else {
            None
        }
    }

    /// Decodes bytes into a nested value.
    pub fn decode(self, bytes: &[u8]) -> std::result::Result<Value, String> {
        match self {
            DataFormat::Yaml => serde_yaml::from_slice(bytes).map_err(|e| e.to_string()),
            DataFormat::Json => {
                let json: serde_json::Value =
                    serde_json::from_slice(bytes).map_err(|e| e.to_string())?;
                serde_yaml::to_value(json).map_err(|e| e.to_string())
            }
        }
    }
}
