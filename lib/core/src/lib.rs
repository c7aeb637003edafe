//! Core types and error handling for the deadsimple access layer.
//!
//! This crate provides the foundational types shared by the platform-access
//! library and the web shell.

pub mod error;
pub mod id;

pub use error::Result;
pub use id::{CheckId, IdentityHandle, ParseIdError};
