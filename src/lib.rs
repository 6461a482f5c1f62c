//! Phase-gated script resource lifecycle for host applications.
//!

pub use scriptlet_internal::*;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use scriptlet_internal::prelude::*;
}
