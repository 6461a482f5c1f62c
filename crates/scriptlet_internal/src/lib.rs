//! # Scriptlet Internal Library
//!
//! Re-exports the scriptlet crates for convenience.

/// Layer 1: host contract and reference host.
pub use scriptlet_host;

/// Layer 2: script lifecycle and conditional activation.
pub use scriptlet_script;

/// Layer 3: logging and configuration.
pub use scriptlet_core;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use scriptlet_core::{ScriptletConfig, TracingFormat, TracingSettings, TracingSetup};
    pub use scriptlet_host::prelude::*;
    pub use scriptlet_script::prelude::*;
}
