//! JSON configuration.
//!
//! ```json
//! {
//!   "tracing": { "level": "debug", "format": "compact" },
//!   "defaults": { "priority": 30, "placement": "footer", "dependencies": ["jquery"] }
//! }
//! ```
//!
//! Every section and field is optional; anything absent takes its default.

use std::path::{Path, PathBuf};

use scriptlet_script::descriptor::ScriptDefaults;
use scriptlet_script::registry::ScriptRegistry;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::logging::{TracingSettings, TracingSetup};

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config file '{}': {source}", .path.display())]
    Io {
        /// Path of the file.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration is not valid JSON for [`ScriptletConfig`].
    #[error("invalid config: {0}")]
    Json(#[from] serde_json::Error),

    /// The tracing level is not one of `trace`, `debug`, `info`, `warn`, `error`.
    #[error("invalid tracing level '{0}'")]
    InvalidLevel(String),
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptletConfig {
    /// Logging settings.
    pub tracing: TracingSettings,
    /// Defaults for scripts constructed through the registry.
    pub defaults: ScriptDefaults,
}

impl ScriptletConfig {
    /// Parses configuration from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Json`] if the string is not valid configuration.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read and
    /// [`ConfigError::Json`] if its contents are not valid configuration.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "loading config");
        Self::from_json_str(&contents)
    }

    /// Sets the tracing settings.
    #[must_use]
    pub fn with_tracing(mut self, tracing: TracingSettings) -> Self {
        self.tracing = tracing;
        self
    }

    /// Sets the script defaults.
    #[must_use]
    pub fn with_defaults(mut self, defaults: ScriptDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    /// Builds the tracing setup described by this configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidLevel`] if the level does not parse.
    pub fn tracing_setup(&self) -> Result<TracingSetup, ConfigError> {
        TracingSetup::try_from(&self.tracing)
    }

    /// Creates an empty script registry using the configured defaults.
    #[must_use]
    pub fn registry(&self) -> ScriptRegistry {
        ScriptRegistry::with_defaults(self.defaults.clone())
    }
}
