//! Access-layer configuration.
//!
//! Names the backend that answers verification requests and the external
//! sign-in surface unauthenticated visitors are sent to.

use serde::{Deserialize, Serialize};

/// Backend host used when nothing is configured.
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";

/// External sign-in surface used when nothing is configured.
pub const DEFAULT_SIGN_IN_URL: &str = "https://dead-simpl.com";

/// Configuration for the access layer.
///
/// Fields with defaults can be omitted when loading from environment variables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessConfig {
    /// Base URL of the backend (e.g., "https://api.dead-simpl.com").
    /// Default: "http://localhost:8000"
    #[serde(default = "default_backend_url")]
    backend_url: String,
    /// External sign-in surface; also the waitlist destination.
    /// Default: "https://dead-simpl.com"
    #[serde(default = "default_sign_in_url")]
    sign_in_url: String,
}

fn default_backend_url() -> String {
    DEFAULT_BACKEND_URL.to_string()
}

fn default_sign_in_url() -> String {
    DEFAULT_SIGN_IN_URL.to_string()
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self::new(default_backend_url(), default_sign_in_url())
    }
}

impl AccessConfig {
    /// Creates a configuration from explicit URLs.
    #[must_use]
    pub fn new(backend_url: impl Into<String>, sign_in_url: impl Into<String>) -> Self {
        Self {
            backend_url: backend_url.into(),
            sign_in_url: sign_in_url.into(),
        }
    }

    /// Reads `BACKEND_URL` and `SIGN_IN_URL` as captured at compile time.
    ///
    /// Used by the browser bundle, which has no process environment.
    /// Unset or empty values fall back to the defaults.
    #[must_use]
    pub fn from_build_env() -> Self {
        Self::from_values(option_env!("BACKEND_URL"), option_env!("SIGN_IN_URL"))
    }

    fn from_values(backend_url: Option<&str>, sign_in_url: Option<&str>) -> Self {
        let pick = |value: Option<&str>, fallback: fn() -> String| {
            value
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map_or_else(fallback, str::to_string)
        };
        Self {
            backend_url: pick(backend_url, default_backend_url),
            sign_in_url: pick(sign_in_url, default_sign_in_url),
        }
    }

    /// Replaces the backend URL.
    #[must_use]
    pub fn with_backend_url(mut self, url: impl Into<String>) -> Self {
        self.backend_url = url.into();
        self
    }

    /// Replaces the sign-in surface URL.
    #[must_use]
    pub fn with_sign_in_url(mut self, url: impl Into<String>) -> Self {
        self.sign_in_url = url.into();
        self
    }

    /// Returns the backend base URL.
    #[must_use]
    pub fn backend_url(&self) -> &str {
        &self.backend_url
    }

    /// Returns the external sign-in surface URL.
    #[must_use]
    pub fn sign_in_url(&self) -> &str {
        &self.sign_in_url
    }
}
