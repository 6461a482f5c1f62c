//! Request-scoped flags.

use core::sync::atomic::{AtomicBool, Ordering};

/// Flags describing the request currently being served.
#[derive(Debug, Default)]
pub struct RequestState {
    administrative: AtomicBool,
}

impl RequestState {
    /// Creates state for a regular, non-administrative request.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates state for a request with the given administrative flag.
    #[must_use]
    pub fn with_administrative(administrative: bool) -> Self {
        Self {
            administrative: AtomicBool::new(administrative),
        }
    }

    /// Returns true for administrative requests.
    #[must_use]
    pub fn is_administrative(&self) -> bool {
        self.administrative.load(Ordering::Acquire)
    }

    /// Flags the request as administrative or not.
    pub fn set_administrative(&self, administrative: bool) {
        self.administrative.store(administrative, Ordering::Release);
    }
}
