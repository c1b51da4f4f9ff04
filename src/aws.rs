//! AWS access through the `aws` command line client.
//!
//! Object downloads and secret lookups are delegated to the CLI so the host's usual
//! credential chain applies. When a role ARN is configured, temporary credentials are
//! obtained with `sts assume-role` and handed to the actual call through its environment.

use crate::config::SourceSpec;
use crate::error::{Error, Result};
use log::debug;
use serde::Deserialize;
use std::process::Stdio;
use tokio::process::Command;
use url::Url;

const SESSION_NAME: &str = "valuetransformer";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AssumeRoleOutput {
    credentials: Credentials,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Credentials {
    access_key_id: String,
    secret_access_key: String,
    session_token: String,
}

/// Thin wrapper over the `aws` executable.
#[derive(Debug, Clone)]
pub struct AwsCli {
    program: String,
    region: Option<String>,
    role_arn: Option<String>,
}

impl Default for AwsCli {
    fn default() -> Self {
        Self { program: "aws".to_string(), region: None, role_arn: None }
    }
}

impl AwsCli {
    /// Creates a client with the host's default region and credentials.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads `awsRegion` and `awsRoleArn` from a source's arguments.
    pub fn from_spec(spec: &SourceSpec) -> Self {
        Self {
            region: spec.arg_str("awsRegion").map(str::to_string),
            role_arn: spec.arg_str("awsRoleArn").map(str::to_string),
            ..Self::default()
        }
    }

    /// Downloads an `s3://bucket/key` object.
    pub async fn download(&self, url: &Url) -> Result<Vec<u8>> {
        self.run(&["s3", "cp", url.as_str(), "-"]).await
    }

    /// Fetches the `SecretString` of a Secrets Manager secret.
    pub async fn secret_string(&self, name: &str) -> Result<String> {
        let out = self
            .run(&[
                "secretsmanager",
                "get-secret-value",
                "--secret-id",
                name,
                "--query",
                "SecretString",
                "--output",
                "text",
            ])
            .await?;
        let text = String::from_utf8(out).map_err(|e| self.error("get-secret-value", e))?;
        Ok(text.trim_end_matches('\n').to_string())
    }

    async fn run(&self, args: &[&str]) -> Result<Vec<u8>> {
        let operation = args.iter().take(2).copied().collect::<Vec<_>>().join(" ");
        let mut command = self.command(args);

        if let Some(role_arn) = &self.role_arn {
            let credentials = self.assume_role(role_arn).await?;
            command
                .env("AWS_ACCESS_KEY_ID", credentials.access_key_id)
                .env("AWS_SECRET_ACCESS_KEY", credentials.secret_access_key)
                .env("AWS_SESSION_TOKEN", credentials.session_token);
        }

        debug!("Running {} {}", self.program, operation);
        self.output(command, &operation).await
    }

    async fn assume_role(&self, role_arn: &str) -> Result<Credentials> {
        let command = self.command(&[
            "sts",
            "assume-role",
            "--role-arn",
            role_arn,
            "--role-session-name",
            SESSION_NAME,
            "--output",
            "json",
        ]);
        let out = self.output(command, "sts assume-role").await?;
        let parsed: AssumeRoleOutput =
            serde_json::from_slice(&out).map_err(|e| self.error("sts assume-role", e))?;
        Ok(parsed.credentials)
    }

    fn command(&self, args: &[&str]) -> Command {
        let mut command = Command::new(&self.program);
        command.args(args).stdin(Stdio::null()).stdout(Stdio::piped()).stderr(Stdio::piped());
        if let Some(region) = &self.region {
            command.arg("--region").arg(region);
        }
        command
    }

    async fn output(&self, mut command: Command, operation: &str) -> Result<Vec<u8>> {
        let output = command.output().await.map_err(|e| self.error(operation, e))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(self.error(
                operation,
                format!("exited with {}: {}", output.status, stderr.trim()),
            ));
        }
        Ok(output.stdout)
    }

    fn error<E: std::fmt::Display>(&self, operation: &str, cause: E) -> Error {
        Error::FetchError {
            location: format!("{} {operation}", self.program),
            cause: cause.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_program_is_fetch_error() {
        let aws = AwsCli {
            program: "valuetransformer-no-such-aws-binary".to_string(),
            ..AwsCli::new()
        };
        let err = aws.secret_string("anything").await.unwrap_err();
        assert!(matches!(err, Error::FetchError { .. }));
    }

    #[test]
    fn test_from_spec_reads_aws_args() {
        let spec: SourceSpec = serde_yaml::from_str(
            "{type: SecretsManager, args: {name: db, awsRegion: us-east-1, awsRoleArn: ''}}",
        )
        .unwrap();
        let aws = AwsCli::from_spec(&spec);
        assert_eq!(aws.region.as_deref(), Some("us-east-1"));
        assert_eq!(aws.role_arn, None);
    }
}
