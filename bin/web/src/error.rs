//! Errors raised while starting the server.
//!
//! Startup failures are reported through rootcause; each variant names the
//! step that failed.

use std::fmt;

/// Server startup failures.
#[derive(Debug)]
pub enum StartupError {
    /// Environment configuration could not be loaded.
    Config { details: String },
    /// Leptos site configuration could not be loaded.
    Site { details: String },
    /// The listening socket could not be bound.
    Bind { addr: String, details: String },
    /// The server stopped with an error.
    Serve { details: String },
}

impl fmt::Display for StartupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config { details } => write!(f, "failed to load configuration: {details}"),
            Self::Site { details } => write!(f, "failed to load site configuration: {details}"),
            Self::Bind { addr, details } => write!(f, "failed to bind to {addr}: {details}"),
            Self::Serve { details } => write!(f, "server error: {details}"),
        }
    }
}

impl std::error::Error for StartupError {}
