//! Values stored in one AWS Secrets Manager secret.

use super::SourceProvider;
use crate::aws::AwsCli;
use crate::config::{SourceSpec, SourceType};
use crate::error::{Error, Result};
use crate::flatten::FlatMap;
use async_trait::async_trait;

/// Fetches the secret named by `args.name`. Its keys are used as-is, without filtering.
#[derive(Debug, Default, Clone, Copy)]
pub struct SecretsManagerProvider;

#[async_trait]
impl SourceProvider for SecretsManagerProvider {
    async fn resolve(&self, name: &str, spec: &SourceSpec) -> Result<FlatMap> {
        let kind = SourceType::SecretsManager;
        let secret = spec
            .arg_str("name")
            .ok_or_else(|| Error::provider(kind, name, "no secret name given"))?;

        let text = AwsCli::from_spec(spec)
            .secret_string(secret)
            .await
            .map_err(|e| Error::provider(kind, name, e))?;

        parse_secret(&text).map_err(|e| {
            Error::provider(kind, name, format!("secret '{secret}' is not a flat JSON object: {e}"))
        })
    }
}

/// Decodes a secret string holding a JSON object of string values.
pub fn parse_secret(text: &str) -> serde_json::Result<FlatMap> {
    serde_json::from_str(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_secret() {
        let values = parse_secret(r#"{"username": "app", "password": "hunter2"}"#).unwrap();
        assert_eq!(values["username"], "app");
        assert_eq!(values["password"], "hunter2");

        assert!(parse_secret(r#"{"nested": {"a": "b"}}"#).is_err());
        assert!(parse_secret("plain text").is_err());
    }
}
