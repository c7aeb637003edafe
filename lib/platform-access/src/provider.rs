//! Identity provider boundary.
//!
//! The identity provider is an external service that issues sessions and
//! bearer credentials. This module defines the capabilities the access layer
//! consumes from it, plus an in-memory provider driven by explicit calls.

use crate::error::IdentityError;
use crate::session::{Credential, Identity};
use async_trait::async_trait;
use deadsimple_core::Result;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;

/// Callback receiving the provider's current principal, or `None` when
/// signed out.
pub type SessionListener = Arc<dyn Fn(Option<Identity>) + Send + Sync>;

/// Registration of a [`SessionListener`].
///
/// Dropping the subscription unregisters the listener.
#[must_use = "dropping a subscription unregisters its listener"]
pub struct Subscription {
    release: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    /// Creates a subscription that runs `release` when dropped.
    pub fn new(release: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.release.is_some())
            .finish()
    }
}

/// Capabilities consumed from an external identity provider.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Registers a change listener.
    ///
    /// A provider that has already resolved its state must deliver it to the
    /// new listener immediately; one that has not must stay silent until it
    /// does.
    fn subscribe(&self, listener: SessionListener) -> Subscription;

    /// Mints a fresh bearer credential for the current principal.
    ///
    /// Returns `Ok(None)` when signed out.
    async fn mint_credential(&self) -> Result<Option<Credential>, IdentityError>;

    /// Terminates the current session.
    async fn end_session(&self) -> Result<(), IdentityError>;
}

#[derive(Default)]
struct ProviderState {
    resolved: bool,
    principal: Option<Identity>,
    credential: Option<Credential>,
    mint_failure: Option<String>,
    sign_out_failure: Option<String>,
    listeners: BTreeMap<u64, SessionListener>,
    next_listener: u64,
}

/// Identity provider whose state is pushed in by the embedding application.
///
/// Starts unresolved: subscribers hear nothing until the first
/// [`sign_in`](Self::sign_in) or [`sign_out`](Self::sign_out).
#[derive(Clone, Default)]
pub struct InMemoryIdentityProvider {
    state: Arc<Mutex<ProviderState>>,
}

impl InMemoryIdentityProvider {
    /// Creates an unresolved provider.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, ProviderState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Signs a principal in and notifies listeners.
    pub fn sign_in(&self, identity: Identity, credential: Credential) {
        debug!(identity = %identity.handle(), "in-memory provider signed in");
        {
            let mut state = self.lock();
            state.resolved = true;
            state.principal = Some(identity);
            state.credential = Some(credential);
        }
        self.notify();
    }

    /// Signs the current principal out and notifies listeners.
    pub fn sign_out(&self) {
        debug!("in-memory provider signed out");
        {
            let mut state = self.lock();
            state.resolved = true;
            state.principal = None;
            state.credential = None;
        }
        self.notify();
    }

    /// Replaces the credential handed out for the current principal.
    ///
    /// Models a token refresh; listeners are not notified.
    pub fn set_credential(&self, credential: Option<Credential>) {
        self.lock().credential = credential;
    }

    /// Makes subsequent mint calls fail with the given reason, or succeed
    /// again with `None`.
    pub fn set_mint_failure(&self, reason: Option<String>) {
        self.lock().mint_failure = reason;
    }

    /// Makes subsequent [`end_session`](IdentityProvider::end_session)
    /// calls fail with the given reason, leaving the principal signed in, or
    /// succeed again with `None`.
    pub fn set_sign_out_failure(&self, reason: Option<String>) {
        self.lock().sign_out_failure = reason;
    }

    /// Returns the number of registered listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.lock().listeners.len()
    }

    fn current_credential(&self) -> Result<Option<Credential>, IdentityError> {
        let state = self.lock();
        if let Some(reason) = &state.mint_failure {
            return Err(IdentityError::CredentialUnavailable {
                reason: reason.clone(),
            }
            .into());
        }
        if state.principal.is_none() {
            return Ok(None);
        }
        Ok(state.credential.clone())
    }

    fn notify(&self) {
        // Listeners run outside the lock so they may call back into us.
        let (principal, listeners): (Option<Identity>, Vec<SessionListener>) = {
            let state = self.lock();
            (
                state.principal.clone(),
                state.listeners.values().cloned().collect(),
            )
        };
        for listener in listeners {
            listener(principal.clone());
        }
    }
}

#[async_trait]
impl IdentityProvider for InMemoryIdentityProvider {
    fn name(&self) -> &str {
        "in-memory"
    }

    fn subscribe(&self, listener: SessionListener) -> Subscription {
        let (key, current) = {
            let mut state = self.lock();
            let key = state.next_listener;
            state.next_listener += 1;
            state.listeners.insert(key, Arc::clone(&listener));
            let current = state.resolved.then(|| state.principal.clone());
            (key, current)
        };

        if let Some(principal) = current {
            listener(principal);
        }

        let state = Arc::downgrade(&self.state);
        Subscription::new(move || {
            if let Some(state) = state.upgrade() {
                state
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .listeners
                    .remove(&key);
            }
        })
    }

    async fn mint_credential(&self) -> Result<Option<Credential>, IdentityError> {
        self.current_credential()
    }

    async fn end_session(&self) -> Result<(), IdentityError> {
        let failure = self.lock().sign_out_failure.clone();
        if let Some(reason) = failure {
            return Err(IdentityError::SignOutFailed { reason }.into());
        }
        self.sign_out();
        Ok(())
    }
}
