//! Authentication and access gating for the console.
//!
//! This module provides:
//! - `AuthProvider`: owns the session, the authorized client and the gate
//!   driver for the lifetime of the component tree below it
//! - `RequireAccess`: the boundary that only renders for admitted principals
//! - Capability guard components (`RequirePermission`, `RequireRole`, ...)
//!
//! # Access Model
//!
//! Signing in happens on the external sign-in surface, which hands the
//! principal back in the URL fragment. The backend then decides whether the
//! principal is admitted; until it has, nothing protected renders.

mod browser;
pub mod gate;
pub mod guards;

pub use gate::{AccessView, RequireAccess};
pub use guards::{
    Guarded, RequireAnyPermission, RequireAnyRole, RequirePermission, RequirePermissions,
    RequireRole, RequireRoles,
};

use deadsimple_platform_access::{
    AccessConfig, AuthorizedClient, CapabilitySet, GateState, IdentityProvider,
    InMemoryIdentityProvider, Session, SessionListener, SessionProvider, SignInHandoff,
    Subscription, run_gate, sign_in_url,
};
use futures::future::{AbortHandle, abortable};
use leptos::prelude::*;
use leptos::task::spawn_local;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, warn};

/// Access state shared with every component below [`AuthProvider`].
#[derive(Clone, Copy)]
pub struct AuthContext {
    session: RwSignal<Session>,
    access: Memo<GateState>,
    capabilities: Memo<Option<CapabilitySet>>,
    config: StoredValue<AccessConfig>,
    services: StoredValue<Option<AuthServices>, LocalStorage>,
}

impl AuthContext {
    /// Returns the current session.
    pub fn session(&self) -> ReadSignal<Session> {
        self.session.read_only()
    }

    /// Returns the gate state reconciled with the current session.
    ///
    /// Never authorized unless the session is signed in as the admitted
    /// principal.
    pub fn gate(&self) -> Memo<GateState> {
        self.access
    }

    /// Returns the admitted principal's capabilities; `None` until admitted.
    pub fn capabilities(&self) -> Memo<Option<CapabilitySet>> {
        self.capabilities
    }

    /// Returns the sign-in surface URL that brings the visitor back here.
    pub fn sign_in_href(&self) -> String {
        let base = self.config.with_value(|config| config.sign_in_url().to_string());
        let location = browser::current_location().unwrap_or_default();
        match sign_in_url(&base, &location) {
            Ok(url) => url.to_string(),
            Err(error) => {
                warn!(%error, "falling back to bare sign-in URL");
                base
            }
        }
    }

    /// Returns the waitlist page on the sign-in surface.
    pub fn waitlist_href(&self) -> String {
        self.config.with_value(|config| config.sign_in_url().to_string())
    }

    /// Ends the session. The gate moves to unauthenticated once the identity
    /// provider confirms.
    pub fn sign_out(&self) {
        browser::forget_handoff();
        let sessions = self
            .services
            .try_with_value(|slot| slot.as_ref().map(|services| services.sessions.clone()))
            .flatten();
        match sessions {
            Some(sessions) => spawn_local(async move { sessions.end_session().await }),
            None => debug!("sign-out requested before the session started"),
        }
    }
}

/// Returns the [`AuthContext`] provided by the nearest [`AuthProvider`].
///
/// # Panics
///
/// Panics when called outside an [`AuthProvider`].
pub fn use_auth() -> AuthContext {
    expect_context::<AuthContext>()
}

struct AuthServices {
    sessions: SessionProvider,
    session_link: Subscription,
    tasks: Vec<AbortHandle>,
}

impl AuthServices {
    fn start(config: &AccessConfig, session: RwSignal<Session>, gate: RwSignal<GateState>) -> Self {
        let identity = InMemoryIdentityProvider::new();
        let sessions = SessionProvider::new(Arc::new(identity.clone()));
        let client = AuthorizedClient::new(config.backend_url(), sessions.clone());
        let (states, gate_states) = watch::channel(GateState::Loading);

        // Set synchronously by the provider, ahead of the gate.
        let follow_session: SessionListener = Arc::new(move |principal| {
            if session.try_set(Session::from(principal)).is_some() {
                debug!("session signal already disposed");
            }
        });
        let session_link = identity.subscribe(follow_session);

        let tasks = vec![
            spawn_abortable(run_gate(client, states)),
            spawn_abortable(mirror(gate_states, gate)),
        ];

        match browser::take_handoff() {
            Some(SignInHandoff {
                identity: principal,
                credential,
            }) => {
                debug!(identity = %principal.handle(), "resuming signed-in session");
                identity.sign_in(principal, credential);
            }
            None => identity.sign_out(),
        }

        Self {
            sessions,
            session_link,
            tasks,
        }
    }

    fn shutdown(self) {
        for task in self.tasks {
            task.abort();
        }
        drop(self.session_link);
        self.sessions.shutdown();
    }
}

fn spawn_abortable(task: impl Future<Output = ()> + 'static) -> AbortHandle {
    let (task, handle) = abortable(task);
    spawn_local(async move {
        if task.await.is_err() {
            debug!("auth task stopped");
        }
    });
    handle
}

/// Copies every value published on `rx` into `signal`.
async fn mirror<T>(mut rx: watch::Receiver<T>, signal: RwSignal<T>)
where
    T: Clone + Send + Sync + 'static,
{
    let value = rx.borrow_and_update().clone();
    signal.set(value);
    while rx.changed().await.is_ok() {
        let value = rx.borrow_and_update().clone();
        signal.set(value);
    }
}

/// Provides [`AuthContext`] to its children.
///
/// Session tracking starts once the component is mounted in the browser;
/// during server rendering the session stays loading.
#[component]
pub fn AuthProvider(children: Children) -> impl IntoView {
    let config = use_context::<AccessConfig>().unwrap_or_else(AccessConfig::from_build_env);
    let session = RwSignal::new(Session::Loading);
    let gate = RwSignal::new(GateState::Loading);
    let access = Memo::new(move |_| {
        session.with(|session| gate.with(|state| state.effective(session)))
    });
    let capabilities = Memo::new(move |_| access.with(|state| state.capabilities().cloned()));
    let config = StoredValue::new(config);
    let services = StoredValue::new_local(None::<AuthServices>);

    // Effects never run during server rendering.
    Effect::new(move |_| {
        services.update_value(|slot| {
            if slot.is_none() {
                *slot = Some(config.with_value(|config| AuthServices::start(config, session, gate)));
            }
        });
    });

    on_cleanup(move || {
        if let Some(services) = services.try_update_value(Option::take).flatten() {
            services.shutdown();
        }
    });

    provide_context(AuthContext {
        session,
        access,
        capabilities,
        config,
        services,
    });

    children()
}
