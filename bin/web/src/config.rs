//! Centralized server configuration.
//!
//! This module provides strongly-typed configuration for the server,
//! loaded via the `config` crate from environment variables. Nested keys
//! use a double underscore, e.g. `ACCESS__BACKEND_URL`.
//!
//! See [`AccessConfig`] for the verification backend and sign-in surface.

use deadsimple_platform_access::AccessConfig;
use serde::Deserialize;

/// Server configuration composed from library configs.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Verification backend and sign-in surface handed to rendered pages.
    #[serde(default)]
    pub access: AccessConfig,

    /// Directory holding the compiled browser bundle.
    #[serde(default = "default_pkg_dir")]
    pub pkg_dir: String,
}

fn default_pkg_dir() -> String {
    "target/site/pkg".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            access: AccessConfig::default(),
            pkg_dir: default_pkg_dir(),
        }
    }
}

impl ServerConfig {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is present but cannot be parsed.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        Self::from_source(
            config::Environment::default()
                .separator("__")
                .try_parsing(true),
        )
    }

    fn from_source(
        source: impl config::Source + Send + Sync + 'static,
    ) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(source)
            .build()?
            .try_deserialize()
    }
}
