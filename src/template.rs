//! Placeholder substitution over whole documents.
//!
//! [`rewrite`] walks a document and rewrites every string scalar with the bound transforms,
//! in declaration order. Each placeholder text seen is tracked; the ones that never resolved
//! anywhere in the document are returned so the caller can report them.
//!
//! Values under a `Secret`'s `data` are base64 encoded: they are decoded before substitution
//! and encoded again afterwards.

use crate::error::{Error, Result};
use crate::flatten::FlatMap;
use crate::selector::ResourceId;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use indexmap::IndexMap;
use log::debug;
use regex::{Captures, Regex};
use serde_yaml::{Mapping, Value};

const SECRET_KIND: &str = "Secret";
const SECRET_DATA: &str = "data";

/// Compiles a placeholder pattern; it must capture the lookup key in its first group.
///
/// # Errors
/// * `Error::ConfigError` if the pattern is invalid or has no capture group
pub fn compile_placeholder(pattern: &str) -> Result<Regex> {
    let regex = Regex::new(pattern)
        .map_err(|e| Error::ConfigError(format!("invalid placeholder pattern '{pattern}': {e}")))?;
    if regex.captures_len() < 2 {
        return Err(Error::ConfigError(format!(
            "placeholder pattern '{pattern}' has no capture group"
        )));
    }
    Ok(regex)
}

/// A compiled placeholder pattern paired with the mapping it looks keys up in.
#[derive(Debug, Clone, Copy)]
pub struct Binding<'a> {
    pub pattern: &'a Regex,
    pub source: &'a FlatMap,
}

impl<'a> Binding<'a> {
    pub fn new(pattern: &'a Regex, source: &'a FlatMap) -> Self {
        Self { pattern, source }
    }
}

/// Records, per distinct placeholder text, whether it was ever resolved.
#[derive(Debug, Default)]
pub struct MatchTracker {
    seen: IndexMap<String, bool>,
}

impl MatchTracker {
    pub fn resolved(&mut self, text: &str) {
        self.seen.insert(text.to_string(), true);
    }

    /// Only records the text; an earlier resolution is kept.
    pub fn unresolved(&mut self, text: &str) {
        if !self.seen.contains_key(text) {
            self.seen.insert(text.to_string(), false);
        }
    }

    /// Placeholder texts never resolved, in the order they were first seen.
    pub fn into_unresolved(self) -> Vec<String> {
        self.seen.into_iter().filter(|(_, resolved)| !resolved).map(|(text, _)| text).collect()
    }
}

/// The result of rewriting one document.
#[derive(Debug, Clone, PartialEq)]
pub struct Rewritten {
    pub document: Value,
    pub unresolved: Vec<String>,
}

/// Rewrites every string of `document` with `bindings`.
///
/// # Errors
/// * `Error::EncodingError` if a `Secret`'s data value is not valid base64
pub fn rewrite(document: Value, bindings: &[Binding<'_>]) -> Result<Rewritten> {
    let id = ResourceId::from_document(&document);
    let mut rewriter = Rewriter {
        bindings,
        secret: id.kind == SECRET_KIND,
        id,
        tracker: MatchTracker::default(),
    };

    let mut path = Vec::new();
    let document = rewriter.visit(document, &mut path, true)?;

    Ok(Rewritten { document, unresolved: rewriter.tracker.into_unresolved() })
}

struct Rewriter<'a, 'b> {
    bindings: &'a [Binding<'b>],
    secret: bool,
    id: ResourceId,
    tracker: MatchTracker,
}

impl Rewriter<'_, '_> {
    /// `keyed` is true while `path` holds every key from the root, i.e. no sequence or
    /// non-string key has been crossed.
    fn visit(&mut self, value: Value, path: &mut Vec<String>, keyed: bool) -> Result<Value> {
        match value {
            Value::Mapping(map) => {
                let mut out = Mapping::with_capacity(map.len());
                for (key, item) in map {
                    let item = match (&key, keyed) {
                        (Value::String(k), true) => {
                            path.push(k.clone());
                            let item = self.visit(item, path, true);
                            path.pop();
                            item?
                        }
                        _ => self.visit(item, path, false)?,
                    };
                    out.insert(key, item);
                }
                Ok(Value::Mapping(out))
            }
            Value::Sequence(items) => items
                .into_iter()
                .map(|item| self.visit(item, path, false))
                .collect::<Result<Vec<_>>>()
                .map(Value::Sequence),
            Value::String(text) => {
                let encoded = self.secret
                    && keyed
                    && path.len() >= 2
                    && path.first().map(String::as_str) == Some(SECRET_DATA);
                let text = if encoded {
                    self.rewrite_encoded(text, path)?
                } else {
                    self.substitute(&text)
                };
                Ok(Value::String(text))
            }
            Value::Tagged(mut tagged) => {
                tagged.value = self.visit(tagged.value, path, keyed)?;
                Ok(Value::Tagged(tagged))
            }
            other @ (Value::Null | Value::Bool(_) | Value::Number(_)) => Ok(other),
        }
    }

    /// Line breaks inside the encoded text (wrapped block scalars) are ignored.
    fn rewrite_encoded(&mut self, text: String, path: &[String]) -> Result<String> {
        let compact: String = text.chars().filter(|c| !c.is_ascii_whitespace()).collect();
        let bytes = STANDARD.decode(compact.as_bytes()).map_err(|e| Error::EncodingError {
            document: self.id.to_string(),
            field: path.join("."),
            cause: e.to_string(),
        })?;

        let decoded = match String::from_utf8(bytes) {
            Ok(decoded) => decoded,
            Err(_) => {
                debug!("{}: '{}' holds binary data, left as is", self.id, path.join("."));
                return Ok(text);
            }
        };

        let substituted = self.substitute(&decoded);
        if substituted == decoded {
            // Keep the exact original encoding
            Ok(text)
        } else {
            Ok(STANDARD.encode(substituted))
        }
    }

    fn substitute(&mut self, text: &str) -> String {
        let mut out = text.to_string();
        for binding in self.bindings {
            let tracker = &mut self.tracker;
            out = binding
                .pattern
                .replace_all(&out, |caps: &Captures<'_>| {
                    let matched = &caps[0];
                    let key = caps.get(1).map_or("", |m| m.as_str());
                    match binding.source.get(key) {
                        Some(value) => {
                            tracker.resolved(matched);
                            value.clone()
                        }
                        None => {
                            tracker.unresolved(matched);
                            matched.to_string()
                        }
                    }
                })
                .into_owned();
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compile_placeholder() {
        assert!(compile_placeholder(r"\$\{([^}]*)\}").is_ok());
        assert!(matches!(compile_placeholder(r"\$\{[^}]*\}"), Err(Error::ConfigError(_))));
        assert!(matches!(compile_placeholder(r"(unclosed"), Err(Error::ConfigError(_))));
    }

    #[test]
    fn test_match_tracker_keeps_resolution() {
        let mut tracker = MatchTracker::default();
        tracker.unresolved("${a}");
        tracker.resolved("${a}");
        tracker.unresolved("${a}");
        tracker.unresolved("${b}");
        assert_eq!(tracker.into_unresolved(), vec!["${b}".to_string()]);
    }
}
