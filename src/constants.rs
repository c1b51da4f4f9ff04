//! Common constants used throughout valuetransformer.

/// Expected `apiVersion` of the function configuration
pub const API_VERSION: &str = "beeper.com/v1";

/// Expected `kind` of the function configuration
pub const KIND: &str = "ValueTransformer";

/// `kind` of the document-list envelope
pub const RESOURCE_LIST_KIND: &str = "ResourceList";

/// Placeholder pattern used when a transform leaves `regex` empty
pub const DEFAULT_PLACEHOLDER: &str = r"\$\{([^}]*)\}";

/// Environment variable that switches on debug tracing
pub const DEBUG_ENV: &str = "VALUETRANSFORMER_DEBUG";

/// Separator used by the flattener between path components
pub const PATH_SEPARATOR: &str = ".";
