//! Error types for host integration.

use thiserror::Error;

/// Type-erased error returned by phase callbacks and conditional predicates.
pub type BoxError = Box<dyn core::error::Error + Send + Sync>;

/// Errors raised by a host collaborator call.
#[derive(Debug, Error)]
pub enum HostError {
    /// The handle was never registered with the host.
    #[error("script '{0}' is not registered")]
    UnknownHandle(String),

    /// A script with this handle is already registered.
    #[error("script '{0}' is already registered")]
    AlreadyRegistered(String),

    /// The host refused the call.
    #[error("host rejected script '{handle}': {reason}")]
    Rejected {
        /// Handle of the script the call was about.
        handle: String,
        /// Host-supplied reason.
        reason: String,
    },
}

impl HostError {
    /// Creates a [`Rejected`](Self::Rejected) error.
    pub fn rejected(handle: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Rejected {
            handle: handle.into(),
            reason: reason.into(),
        }
    }
}
