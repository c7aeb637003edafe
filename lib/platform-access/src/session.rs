//! Session state for the signed-in principal.
//!
//! The [`SessionProvider`] is the single owner of the current [`Session`].
//! It subscribes to an [`IdentityProvider`] once and republishes every
//! change on a watch channel; everything else only reads.

use crate::provider::{IdentityProvider, SessionListener, Subscription};
use deadsimple_core::IdentityHandle;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::watch;
use tracing::{debug, warn};

/// A principal authenticated by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    handle: IdentityHandle,
    email: Option<String>,
    display_name: Option<String>,
    photo_url: Option<String>,
}

impl Identity {
    /// Creates an identity with only its provider handle.
    #[must_use]
    pub fn new(handle: impl Into<IdentityHandle>) -> Self {
        Self {
            handle: handle.into(),
            email: None,
            display_name: None,
            photo_url: None,
        }
    }

    /// Sets the email address.
    #[must_use]
    pub fn with_email(mut self, email: Option<String>) -> Self {
        self.email = email;
        self
    }

    /// Sets the display name.
    #[must_use]
    pub fn with_display_name(mut self, name: Option<String>) -> Self {
        self.display_name = name;
        self
    }

    /// Sets the avatar URL.
    #[must_use]
    pub fn with_photo_url(mut self, url: Option<String>) -> Self {
        self.photo_url = url;
        self
    }

    /// Returns the provider handle.
    #[must_use]
    pub fn handle(&self) -> &IdentityHandle {
        &self.handle
    }

    /// Returns the email address, if known.
    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    /// Returns the display name, if known.
    #[must_use]
    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    /// Returns the avatar URL, if known.
    #[must_use]
    pub fn photo_url(&self) -> Option<&str> {
        self.photo_url.as_deref()
    }
}

/// The current identity-provider state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Session {
    /// The provider has not reported its first state yet.
    #[default]
    Loading,
    /// No principal is signed in.
    SignedOut,
    /// A principal is signed in.
    SignedIn(Identity),
}

impl Session {
    /// Returns true while the provider has not reported.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    /// Returns true when a principal is signed in.
    #[must_use]
    pub fn is_signed_in(&self) -> bool {
        matches!(self, Self::SignedIn(_))
    }

    /// Returns the signed-in principal, if any.
    #[must_use]
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            Self::SignedIn(identity) => Some(identity),
            Self::Loading | Self::SignedOut => None,
        }
    }
}

impl From<Option<Identity>> for Session {
    fn from(identity: Option<Identity>) -> Self {
        match identity {
            Some(identity) => Self::SignedIn(identity),
            None => Self::SignedOut,
        }
    }
}

/// A short-lived bearer credential.
///
/// Minted per request; never logged.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Wraps a bearer token.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the raw token.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Returns the value for an `Authorization` header.
    #[must_use]
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

struct SessionInner {
    identity: Arc<dyn IdentityProvider>,
    state: Arc<watch::Sender<Session>>,
    subscription: Mutex<Option<Subscription>>,
}

/// Owner of the current [`Session`].
///
/// Cheap to clone; all clones share one subscription, released by
/// [`shutdown`](Self::shutdown) or when the last clone is dropped.
#[derive(Clone)]
pub struct SessionProvider {
    inner: Arc<SessionInner>,
}

impl SessionProvider {
    /// Subscribes to the identity provider. The session starts out
    /// [`Session::Loading`] unless the provider reports synchronously.
    pub fn new(identity: Arc<dyn IdentityProvider>) -> Self {
        let (sender, _) = watch::channel(Session::Loading);
        let state = Arc::new(sender);

        let publisher = Arc::clone(&state);
        let provider_name = identity.name().to_string();
        let listener: SessionListener = Arc::new(move |principal: Option<Identity>| {
            let next = Session::from(principal);
            debug!(
                provider = %provider_name,
                identity = next.identity().map(|i| i.handle().as_str()),
                "session changed"
            );
            publisher.send_replace(next);
        });
        let subscription = identity.subscribe(listener);

        Self {
            inner: Arc::new(SessionInner {
                identity,
                state,
                subscription: Mutex::new(Some(subscription)),
            }),
        }
    }

    /// Returns the latest known session.
    #[must_use]
    pub fn current_session(&self) -> Session {
        self.inner.state.borrow().clone()
    }

    /// Returns a receiver notified on every session change.
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<Session> {
        self.inner.state.subscribe()
    }

    /// Mints a fresh credential for the signed-in principal.
    ///
    /// Returns `None` when not signed in or when the provider cannot produce
    /// a token; provider failures are logged, not propagated.
    pub async fn mint_credential(&self) -> Option<Credential> {
        if !self.current_session().is_signed_in() {
            return None;
        }
        match self.inner.identity.mint_credential().await {
            Ok(credential) => credential,
            Err(report) => {
                warn!(
                    provider = self.inner.identity.name(),
                    error = %report,
                    "failed to mint credential"
                );
                None
            }
        }
    }

    /// Asks the identity provider to end the session.
    ///
    /// Best effort: failures are logged and otherwise ignored.
    pub async fn end_session(&self) {
        if let Err(report) = self.inner.identity.end_session().await {
            warn!(
                provider = self.inner.identity.name(),
                error = %report,
                "sign-out failed"
            );
        }
    }

    /// Releases the identity-provider subscription.
    ///
    /// The last published session stays readable; no further changes arrive.
    pub fn shutdown(&self) {
        let subscription = self
            .inner
            .subscription
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if subscription.is_some() {
            debug!(provider = self.inner.identity.name(), "session provider shut down");
        }
    }
}

impl fmt::Debug for SessionProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionProvider")
            .field("provider", &self.inner.identity.name())
            .field("session", &*self.inner.state.borrow())
            .finish()
    }
}
