//! Logging and configuration for scriptlet (Layer 3).
//!
//! - [`logging`] - Tracing subscriber setup
//! - [`config`] - JSON configuration for logging and script defaults

/// JSON configuration.
pub mod config;

/// Tracing subscriber setup.
pub mod logging;

pub use config::{ConfigError, ScriptletConfig};
pub use logging::{TracingFormat, TracingSettings, TracingSetup};
