//! valuetransformer resolves named value mappings from external sources and substitutes them
//! into placeholders found anywhere inside resource documents.
//!
//! A run expands configuration includes, resolves every source concurrently, resolves
//! merges that cross-reference those sources, and finally rewrites each document with the
//! transforms that target it.

/// AWS access through the `aws` command line client
pub mod aws;

/// Command-line interface module
pub mod cli;

/// Function configuration model, parsing and validation
pub mod config;

/// Common constants
pub mod constants;

/// Error types and handling
pub mod error;

/// Environment variable expansion
pub mod expand;

/// Location parsing and fetching of local, HTTP and object storage files
pub mod fetch;

/// Flattening of nested values into dot-joined string maps
pub mod flatten;

/// Configuration include expansion
pub mod include;

/// Merge resolution over resolved sources
pub mod merge;

/// End-to-end orchestration
pub mod pipeline;

/// Per-document exclusion, binding and rewriting
pub mod processor;

/// ResourceList envelope and legacy document streams
pub mod resource_list;

/// Document selection by kind, namespace and name
pub mod selector;

/// Source providers and concurrent source resolution
pub mod source;

/// Placeholder substitution engine
pub mod template;
