//! Error types for the platform-access crate.
//!
//! - `ApiError`: failures of the authorized request client, classified by kind
//! - `IdentityError`: failures reported by the identity provider boundary,
//!   carried as rootcause reports

use std::fmt;

/// Coarse classification of an authorized request failure.
///
/// The access gate picks its UI branch from the kind alone, never from the
/// message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiErrorKind {
    /// No credential, or the backend rejected it (HTTP 401).
    AuthenticationRequired,
    /// Valid identity without sufficient authorization (HTTP 403).
    PermissionDenied,
    /// The request succeeded but the body could not be decoded.
    MalformedResponse,
    /// Transport failures and any other unexpected status.
    Other,
}

impl fmt::Display for ApiErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::AuthenticationRequired => "authentication-required",
            Self::PermissionDenied => "permission-denied",
            Self::MalformedResponse => "malformed-response",
            Self::Other => "other",
        };
        f.write_str(name)
    }
}

/// A failed authorized request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    kind: ApiErrorKind,
    status: Option<u16>,
    message: String,
}

/// Message for requests attempted without a signed-in session.
pub const NOT_AUTHENTICATED_MESSAGE: &str = "User not authenticated";
/// Message for HTTP 401 responses.
pub const AUTHENTICATION_REQUIRED_MESSAGE: &str = "Authentication required. Please sign in.";
/// Message for HTTP 403 responses.
pub const PERMISSION_DENIED_MESSAGE: &str = "You don't have permission to access this feature.";

impl ApiError {
    /// The caller has no session, or no credential could be minted.
    #[must_use]
    pub fn not_authenticated() -> Self {
        Self {
            kind: ApiErrorKind::AuthenticationRequired,
            status: None,
            message: NOT_AUTHENTICATED_MESSAGE.to_string(),
        }
    }

    /// Classifies a non-success HTTP status.
    ///
    /// 401 and 403 map to their kinds regardless of the response body;
    /// everything else carries the status text.
    #[must_use]
    pub fn from_status(status: u16, status_text: &str) -> Self {
        match status {
            401 => Self {
                kind: ApiErrorKind::AuthenticationRequired,
                status: Some(status),
                message: AUTHENTICATION_REQUIRED_MESSAGE.to_string(),
            },
            403 => Self {
                kind: ApiErrorKind::PermissionDenied,
                status: Some(status),
                message: PERMISSION_DENIED_MESSAGE.to_string(),
            },
            _ => Self {
                kind: ApiErrorKind::Other,
                status: Some(status),
                message: format!("API request failed: {status_text}"),
            },
        }
    }

    /// The request never produced a response.
    #[must_use]
    pub fn transport(details: impl fmt::Display) -> Self {
        Self {
            kind: ApiErrorKind::Other,
            status: None,
            message: format!("API request failed: {details}"),
        }
    }

    /// A 2xx response whose body did not decode.
    #[must_use]
    pub fn malformed(status: u16, details: impl fmt::Display) -> Self {
        Self {
            kind: ApiErrorKind::MalformedResponse,
            status: Some(status),
            message: format!("malformed response body: {details}"),
        }
    }

    /// Returns the failure classification.
    #[must_use]
    pub fn kind(&self) -> ApiErrorKind {
        self.kind
    }

    /// Returns the HTTP status, if a response was received.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        self.status
    }

    /// Returns the normalized, user-presentable message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(f, "{} ({status}): {}", self.kind, self.message),
            None => write!(f, "{}: {}", self.kind, self.message),
        }
    }
}

impl std::error::Error for ApiError {}

/// Errors reported by an identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityError {
    /// The provider could not produce a bearer credential.
    CredentialUnavailable { reason: String },
    /// The provider failed to terminate the session.
    SignOutFailed { reason: String },
}

impl fmt::Display for IdentityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CredentialUnavailable { reason } => {
                write!(f, "credential unavailable: {reason}")
            }
            Self::SignOutFailed { reason } => {
                write!(f, "sign-out failed: {reason}")
            }
        }
    }
}

impl std::error::Error for IdentityError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_401_is_authentication_required() {
        let err = ApiError::from_status(401, "Unauthorized");
        assert_eq!(err.kind(), ApiErrorKind::AuthenticationRequired);
        assert_eq!(err.status(), Some(401));
        assert_eq!(err.message(), AUTHENTICATION_REQUIRED_MESSAGE);
    }

    #[test]
    fn status_403_is_permission_denied() {
        let err = ApiError::from_status(403, "Forbidden");
        assert_eq!(err.kind(), ApiErrorKind::PermissionDenied);
        assert_eq!(err.message(), PERMISSION_DENIED_MESSAGE);
    }

    #[test]
    fn other_status_carries_status_text() {
        let err = ApiError::from_status(502, "Bad Gateway");
        assert_eq!(err.kind(), ApiErrorKind::Other);
        assert_eq!(err.status(), Some(502));
        assert_eq!(err.message(), "API request failed: Bad Gateway");
    }

    #[test]
    fn not_authenticated_has_no_status() {
        let err = ApiError::not_authenticated();
        assert_eq!(err.kind(), ApiErrorKind::AuthenticationRequired);
        assert!(err.status().is_none());
        assert_eq!(err.message(), NOT_AUTHENTICATED_MESSAGE);
    }

    #[test]
    fn malformed_keeps_status() {
        let err = ApiError::malformed(200, "expected value at line 1");
        assert_eq!(err.kind(), ApiErrorKind::MalformedResponse);
        assert_eq!(err.status(), Some(200));
        assert!(err.message().contains("expected value"));
    }

    #[test]
    fn api_error_display_includes_kind_and_status() {
        let err = ApiError::from_status(403, "Forbidden");
        let rendered = err.to_string();
        assert!(rendered.contains("permission-denied"));
        assert!(rendered.contains("403"));
    }

    #[test]
    fn identity_error_display() {
        let err = IdentityError::SignOutFailed {
            reason: "network down".to_string(),
        };
        assert_eq!(err.to_string(), "sign-out failed: network down");
    }
}
