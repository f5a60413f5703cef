//! Error types for registry loading, configuration and manifests.

use thiserror::Error;
use vk_loadgen_core::ResolveError;

/// Errors that can occur while loading a registry or generator state.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// File I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The registry is not well-formed XML.
    #[error("XML error: {0}")]
    Xml(#[from] roxmltree::Error),

    /// YAML parsing or serialization failure.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON parsing or serialization failure.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A required child element is absent (e.g. `<proto>/<name>`).
    #[error("{context} is missing <{element}>")]
    MissingElement { context: String, element: String },

    /// The registry parsed but references do not resolve.
    #[error(transparent)]
    Resolve(#[from] ResolveError),
}

/// Convenience alias for results with [`RegistryError`].
pub type Result<T> = std::result::Result<T, RegistryError>;
