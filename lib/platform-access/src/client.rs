//! Authorized request client for the DeadSimpleML backend.
//!
//! Every request carries a freshly minted bearer credential. Failures are
//! classified into [`ApiErrorKind`](crate::error::ApiErrorKind) by status
//! code; response bodies of failed requests are never inspected.

use crate::capability::{CapabilitySet, RoleGrant};
use crate::error::ApiError;
use crate::session::SessionProvider;
use reqwest::Method;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

/// Path of the backend's access verification endpoint.
pub const VERIFY_USER_PATH: &str = "/api/verify-user";

/// Method, headers and body of an outbound request.
#[derive(Debug, Clone)]
pub struct RequestOptions {
    method: Method,
    headers: HeaderMap,
    body: Option<serde_json::Value>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self::get()
    }
}

impl RequestOptions {
    /// A `GET` request without a body.
    #[must_use]
    pub fn get() -> Self {
        Self {
            method: Method::GET,
            headers: HeaderMap::new(),
            body: None,
        }
    }

    /// A `POST` request with a JSON body.
    #[must_use]
    pub fn post(body: serde_json::Value) -> Self {
        Self::get().with_method(Method::POST).with_body(body)
    }

    /// Sets the HTTP method.
    #[must_use]
    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Adds a header, replacing any earlier value for the same name.
    ///
    /// An `Authorization` header set here is always replaced by the minted
    /// credential.
    #[must_use]
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Sets the JSON body.
    #[must_use]
    pub fn with_body(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Returns the HTTP method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }
}

/// Profile returned alongside an affirmative verification.
///
/// Every field is optional on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerifiedUser {
    pub id: Option<String>,
    pub email: Option<String>,
    #[serde(rename = "displayName")]
    pub display_name: Option<String>,
    #[serde(rename = "photoURL")]
    pub photo_url: Option<String>,
    pub roles: Vec<RoleGrant>,
    pub permissions: Vec<String>,
}

impl VerifiedUser {
    /// Folds role grants and direct permissions into a [`CapabilitySet`].
    #[must_use]
    pub fn capabilities(&self) -> CapabilitySet {
        CapabilitySet::from_grants(&self.roles, &self.permissions)
    }
}

/// Payload of the verification endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyResponse {
    pub authorized: bool,
    #[serde(default)]
    pub user: Option<VerifiedUser>,
}

/// HTTP client that attaches the current session's credential to every
/// request.
#[derive(Debug, Clone)]
pub struct AuthorizedClient {
    http: reqwest::Client,
    base_url: String,
    session: SessionProvider,
}

impl AuthorizedClient {
    /// Creates a client for the backend at `base_url`.
    pub fn new(base_url: impl Into<String>, session: SessionProvider) -> Self {
        Self::with_http(reqwest::Client::new(), base_url, session)
    }

    /// Creates a client reusing an existing `reqwest` client.
    pub fn with_http(
        http: reqwest::Client,
        base_url: impl Into<String>,
        session: SessionProvider,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http,
            base_url,
            session,
        }
    }

    /// Returns the backend base URL, without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the session this client authenticates as.
    #[must_use]
    pub fn session(&self) -> &SessionProvider {
        &self.session
    }

    /// Sends an authenticated request and decodes the JSON response.
    ///
    /// Fails with an authentication-required error, without touching the
    /// network, when no principal is signed in or no credential can be
    /// minted.
    #[instrument(skip(self, options), fields(method = %options.method))]
    pub async fn send<T>(&self, endpoint: &str, options: RequestOptions) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
    {
        if !self.session.current_session().is_signed_in() {
            debug!("no signed-in session, request not sent");
            return Err(ApiError::not_authenticated());
        }
        let Some(credential) = self.session.mint_credential().await else {
            debug!("no credential available, request not sent");
            return Err(ApiError::not_authenticated());
        };

        let mut authorization = HeaderValue::from_str(&credential.bearer())
            .map_err(|_| ApiError::transport("credential is not a valid header value"))?;
        authorization.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.extend(options.headers);
        headers.insert(AUTHORIZATION, authorization);

        let mut request = self
            .http
            .request(options.method, format!("{}{endpoint}", self.base_url))
            .headers(headers);
        if let Some(body) = &options.body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|error| {
            warn!(%error, "request failed before a response arrived");
            ApiError::transport(error)
        })?;

        let status = response.status();
        if !status.is_success() {
            let error = ApiError::from_status(
                status.as_u16(),
                status.canonical_reason().unwrap_or_default(),
            );
            debug!(status = status.as_u16(), kind = %error.kind(), "request rejected");
            return Err(error);
        }

        let body = response.bytes().await.map_err(ApiError::transport)?;
        serde_json::from_slice(&body).map_err(|error| {
            warn!(status = status.as_u16(), %error, "undecodable response body");
            ApiError::malformed(status.as_u16(), error)
        })
    }

    /// Asks the backend whether the signed-in principal may use the console.
    pub async fn verify_user(&self) -> Result<VerifyResponse, ApiError> {
        self.send(VERIFY_USER_PATH, RequestOptions::get()).await
    }
}
