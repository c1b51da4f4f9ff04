//! Values produced by running a command.

use super::SourceProvider;
use crate::config::{SourceSpec, SourceType};
use crate::error::{Error, Result};
use crate::flatten::{filter_map, flatten_document, FlatMap};
use async_trait::async_trait;
use log::debug;
use serde_yaml::Value;
use std::process::Stdio;
use tokio::process::Command;

const SHELL: &str = "/bin/sh";

/// Runs `args.command` and parses its standard output as YAML (or JSON).
///
/// A string command runs through `/bin/sh -c`; a sequence is used as the argument vector.
/// Standard error is passed through to ours.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExecProvider;

#[async_trait]
impl SourceProvider for ExecProvider {
    async fn resolve(&self, name: &str, spec: &SourceSpec) -> Result<FlatMap> {
        let kind = SourceType::Exec;
        let argv = command_line(spec).map_err(|e| Error::provider(kind, name, e))?;
        debug!("Source '{name}': running {argv:?}");

        let output = Command::new(&argv[0])
            .args(&argv[1..])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .output()
            .await
            .map_err(|e| Error::provider(kind, name, format!("cannot run {}: {e}", argv[0])))?;

        if !output.status.success() {
            return Err(Error::provider(
                kind,
                name,
                format!("command {argv:?} exited with {}", output.status),
            ));
        }

        let value: Value = serde_yaml::from_slice(&output.stdout)
            .map_err(|e| Error::provider(kind, name, format!("cannot parse output: {e}")))?;

        Ok(filter_map(flatten_document(&value), &spec.filter()))
    }
}

/// Builds the argument vector from the `command` argument.
pub fn command_line(spec: &SourceSpec) -> std::result::Result<Vec<String>, String> {
    match spec.args.get("command") {
        Some(Value::String(script)) => {
            Ok(vec![SHELL.to_string(), "-c".to_string(), script.clone()])
        }
        Some(Value::Sequence(items)) if !items.is_empty() => items
            .iter()
            .map(|item| match item {
                Value::String(s) => Ok(s.clone()),
                Value::Number(n) => Ok(n.to_string()),
                other => Err(format!("unsupported command element {other:?}")),
            })
            .collect(),
        _ => Err("missing command for exec".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(text: &str) -> SourceSpec {
        serde_yaml::from_str(text).unwrap()
    }

    #[test]
    fn test_command_line_string_uses_shell() {
        let argv = command_line(&spec("{type: Exec, args: {command: 'echo a: 1'}}")).unwrap();
        assert_eq!(argv, vec!["/bin/sh", "-c", "echo a: 1"]);
    }

    #[test]
    fn test_command_line_sequence() {
        let argv = command_line(&spec("{type: Exec, args: {command: [sleep, 1]}}")).unwrap();
        assert_eq!(argv, vec!["sleep", "1"]);
    }

    #[test]
    fn test_command_line_missing() {
        assert!(command_line(&spec("{type: Exec}")).is_err());
        assert!(command_line(&spec("{type: Exec, args: {command: []}}")).is_err());
        assert!(command_line(&spec("{type: Exec, args: {command: [{a: b}]}}")).is_err());
    }
}
