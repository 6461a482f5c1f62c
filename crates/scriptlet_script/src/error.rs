//! Error types for script construction and activation.

use scriptlet_host::error::{BoxError, HostError};
use thiserror::Error;

/// Errors that can occur while constructing, binding or activating a script.
#[derive(Debug, Error)]
pub enum ScriptError {
    /// A required descriptor field was absent or empty at construction.
    #[error(
        "missing required field `{field}` for script '{}'",
        .handle.as_deref().unwrap_or("<unnamed>")
    )]
    Configuration {
        /// The missing field.
        field: &'static str,
        /// The handle, when it was the handle that was present.
        handle: Option<String>,
    },

    /// Another script type already owns this handle.
    #[error("handle '{0}' is already owned by another script")]
    DuplicateHandle(String),

    /// A conditional predicate failed while deciding whether to activate.
    #[error("conditional for script '{handle}' failed: {source}")]
    Evaluation {
        /// Handle of the script being evaluated.
        handle: String,
        /// The predicate's error.
        #[source]
        source: BoxError,
    },

    /// A host collaborator call failed.
    #[error("host integration error: {0}")]
    HostIntegration(#[from] HostError),
}

impl ScriptError {
    /// Creates a [`Configuration`](Self::Configuration) error.
    pub fn missing_field(field: &'static str, handle: Option<&str>) -> Self {
        Self::Configuration {
            field,
            handle: handle.map(str::to_string),
        }
    }

    /// Creates an [`Evaluation`](Self::Evaluation) error.
    pub fn evaluation(handle: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Evaluation {
            handle: handle.into(),
            source: source.into(),
        }
    }

    /// Returns true for construction-time configuration errors.
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration { .. } | Self::DuplicateHandle(_))
    }
}
