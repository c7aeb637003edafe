//! Access verification gate.
//!
//! [`AccessGate`] is a sans-IO state machine: it is told about session
//! changes with [`observe`](AccessGate::observe), hands out a
//! [`VerificationTicket`] when the backend must be asked, and applies the
//! answer with [`resolve`](AccessGate::resolve). Tickets carry a [`CheckId`];
//! answers for anything but the pending check are discarded.
//!
//! [`run_gate`] drives the state machine from the session watch channel of an
//! [`AuthorizedClient`].

use crate::capability::CapabilitySet;
use crate::client::{AuthorizedClient, VerifiedUser, VerifyResponse};
use crate::error::{ApiError, ApiErrorKind};
use crate::session::{Identity, Session};
use deadsimple_core::{CheckId, IdentityHandle};
use futures::future::{FutureExt, LocalBoxFuture};
use futures::stream::{FuturesUnordered, StreamExt};
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

/// A principal the backend has admitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizedPrincipal {
    identity: Identity,
    capabilities: CapabilitySet,
    profile: Option<VerifiedUser>,
}

impl AuthorizedPrincipal {
    /// Returns the session identity.
    #[must_use]
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Returns the roles and permissions granted by the backend.
    #[must_use]
    pub fn capabilities(&self) -> &CapabilitySet {
        &self.capabilities
    }

    /// Returns the backend's profile, if it sent one.
    #[must_use]
    pub fn profile(&self) -> Option<&VerifiedUser> {
        self.profile.as_ref()
    }
}

/// What the gate currently allows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum GateState {
    /// The identity provider has not reported yet.
    #[default]
    Loading,
    /// Nobody is signed in.
    Unauthenticated,
    /// Waiting for the backend's verdict.
    Checking,
    /// Signed in but not admitted (waitlist).
    Forbidden { reason: Option<String> },
    /// Signed in and admitted.
    Authorized(Box<AuthorizedPrincipal>),
    /// Verification failed for another reason.
    Error { kind: ApiErrorKind, reason: String },
}

impl GateState {
    /// Returns true while no verdict can be shown yet.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Loading | Self::Checking)
    }

    /// Returns true only for [`GateState::Authorized`].
    #[must_use]
    pub fn is_authorized(&self) -> bool {
        matches!(self, Self::Authorized(_))
    }

    /// Returns the admitted principal, if any.
    #[must_use]
    pub fn principal(&self) -> Option<&AuthorizedPrincipal> {
        match self {
            Self::Authorized(principal) => Some(principal),
            _ => None,
        }
    }

    /// Returns the admitted principal's capabilities, if any.
    #[must_use]
    pub fn capabilities(&self) -> Option<&CapabilitySet> {
        self.principal().map(AuthorizedPrincipal::capabilities)
    }

    /// Reconciles this state with the latest session.
    ///
    /// Published gate states trail the session by at least one scheduling
    /// step. `Authorized` survives only while the session is signed in as the
    /// same principal; a signed-out or loading session always wins, and a
    /// signed-in session the gate has not caught up with reads as `Checking`.
    #[must_use]
    pub fn effective(&self, session: &Session) -> GateState {
        let identity = match session {
            Session::Loading => return GateState::Loading,
            Session::SignedOut => return GateState::Unauthenticated,
            Session::SignedIn(identity) => identity,
        };
        match self {
            Self::Authorized(principal) if principal.identity().handle() == identity.handle() => {
                self.clone()
            }
            Self::Authorized(_) | Self::Loading | Self::Unauthenticated => GateState::Checking,
            other => other.clone(),
        }
    }
}

/// A verification the caller must run against the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationTicket {
    id: CheckId,
    identity: Identity,
}

impl VerificationTicket {
    /// Returns the check this ticket belongs to.
    #[must_use]
    pub fn id(&self) -> CheckId {
        self.id
    }

    /// Returns the identity being verified.
    #[must_use]
    pub fn identity(&self) -> &Identity {
        &self.identity
    }
}

/// Sans-IO access verification state machine.
#[derive(Debug, Default)]
pub struct AccessGate {
    state: GateState,
    pending: Option<CheckId>,
    subject: Option<IdentityHandle>,
}

impl AccessGate {
    /// Creates a gate in [`GateState::Loading`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> &GateState {
        &self.state
    }

    /// Returns the current capabilities; `None` unless authorized.
    #[must_use]
    pub fn capabilities(&self) -> Option<&CapabilitySet> {
        self.state.capabilities()
    }

    /// Applies a session change.
    ///
    /// Returns a ticket when the backend must be asked about a newly
    /// signed-in identity. Repeated notifications for the identity already
    /// checked (or being checked) change nothing.
    pub fn observe(&mut self, session: &Session) -> Option<VerificationTicket> {
        let identity = match session {
            Session::Loading => {
                self.reset(GateState::Loading);
                return None;
            }
            Session::SignedOut => {
                self.reset(GateState::Unauthenticated);
                return None;
            }
            Session::SignedIn(identity) => identity,
        };

        if self.subject.as_ref() == Some(identity.handle()) {
            return None;
        }

        let id = CheckId::new();
        debug!(check = %id, identity = %identity.handle(), "verification started");
        self.pending = Some(id);
        self.subject = Some(identity.handle().clone());
        self.state = GateState::Checking;
        Some(VerificationTicket {
            id,
            identity: identity.clone(),
        })
    }

    /// Applies the backend's answer to a ticket.
    ///
    /// Returns false, leaving the gate untouched, when the ticket is not the
    /// pending check.
    pub fn resolve(
        &mut self,
        ticket: VerificationTicket,
        outcome: Result<VerifyResponse, ApiError>,
    ) -> bool {
        if self.pending != Some(ticket.id) {
            debug!(check = %ticket.id, "discarding stale verification result");
            return false;
        }
        self.pending = None;

        self.state = match outcome {
            Ok(response) if response.authorized => {
                let capabilities = response
                    .user
                    .as_ref()
                    .map(VerifiedUser::capabilities)
                    .unwrap_or_default();
                info!(check = %ticket.id, identity = %ticket.identity.handle(), "access granted");
                GateState::Authorized(Box::new(AuthorizedPrincipal {
                    identity: ticket.identity,
                    capabilities,
                    profile: response.user,
                }))
            }
            Ok(_) => {
                info!(check = %ticket.id, identity = %ticket.identity.handle(), "access not granted");
                GateState::Forbidden { reason: None }
            }
            Err(error) if error.kind() == ApiErrorKind::PermissionDenied => {
                info!(check = %ticket.id, identity = %ticket.identity.handle(), "access denied");
                GateState::Forbidden {
                    reason: Some(error.message().to_string()),
                }
            }
            Err(error) => {
                warn!(check = %ticket.id, %error, "verification failed");
                GateState::Error {
                    kind: error.kind(),
                    reason: error.message().to_string(),
                }
            }
        };
        true
    }

    fn reset(&mut self, state: GateState) {
        if let Some(id) = self.pending.take() {
            debug!(check = %id, "verification abandoned");
        }
        self.subject = None;
        self.state = state;
    }
}

type Verification = LocalBoxFuture<'static, (VerificationTicket, Result<VerifyResponse, ApiError>)>;

/// Drives an [`AccessGate`] and publishes every state change to `states`.
///
/// Verification calls run concurrently with further session changes; their
/// results go through [`AccessGate::resolve`], so answers for an identity
/// that is no longer current are dropped. The future never spawns; the caller
/// drives it on whatever executor it uses. It completes once every receiver
/// of `states` is gone or the session channel closes.
#[instrument(skip_all)]
pub async fn run_gate(client: AuthorizedClient, states: watch::Sender<GateState>) {
    let mut sessions = client.session().watch();
    let mut gate = AccessGate::new();
    let mut in_flight: FuturesUnordered<Verification> = FuturesUnordered::new();

    if let Some(ticket) = observe_latest(&mut gate, &mut sessions) {
        in_flight.push(verify(client.clone(), ticket));
    }
    publish(&states, gate.state());

    loop {
        // Session changes take precedence over results that are ready in
        // the same poll.
        tokio::select! {
            biased;

            _ = states.closed() => break,

            changed = sessions.changed() => {
                if changed.is_err() {
                    break;
                }
                if let Some(ticket) = observe_latest(&mut gate, &mut sessions) {
                    in_flight.push(verify(client.clone(), ticket));
                }
                publish(&states, gate.state());
            },

            result = in_flight.next(), if !in_flight.is_empty() => {
                let Some((ticket, outcome)) = result else {
                    continue;
                };
                if let Some(ticket) = apply_result(&mut gate, &mut sessions, ticket, outcome) {
                    in_flight.push(verify(client.clone(), ticket));
                }
                publish(&states, gate.state());
            },
        }
    }
    debug!("access gate stopped");
}

fn observe_latest(
    gate: &mut AccessGate,
    sessions: &mut watch::Receiver<Session>,
) -> Option<VerificationTicket> {
    let session = sessions.borrow_and_update().clone();
    gate.observe(&session)
}

/// Applies a verification result after catching up with any session change
/// not yet observed, so the result is judged against the current identity.
///
/// Returns the ticket issued while catching up, if any.
fn apply_result(
    gate: &mut AccessGate,
    sessions: &mut watch::Receiver<Session>,
    ticket: VerificationTicket,
    outcome: Result<VerifyResponse, ApiError>,
) -> Option<VerificationTicket> {
    let next = if sessions.has_changed().unwrap_or(false) {
        observe_latest(gate, sessions)
    } else {
        None
    };
    gate.resolve(ticket, outcome);
    next
}

fn verify(client: AuthorizedClient, ticket: VerificationTicket) -> Verification {
    async move {
        let outcome = client.verify_user().await;
        (ticket, outcome)
    }
    .boxed_local()
}

fn publish(states: &watch::Sender<GateState>, state: &GateState) {
    states.send_if_modified(|current| {
        if current == state {
            false
        } else {
            *current = state.clone();
            true
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::RoleGrant;
    use crate::client::VERIFY_USER_PATH;
    use crate::provider::InMemoryIdentityProvider;
    use crate::session::{Credential, SessionProvider};
    use httpmock::prelude::*;
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;

    fn alice() -> Identity {
        Identity::new("uid_alice")
    }

    fn bob() -> Identity {
        Identity::new("uid_bob")
    }

    fn admitted(roles: Vec<RoleGrant>) -> Result<VerifyResponse, ApiError> {
        Ok(VerifyResponse {
            authorized: true,
            user: Some(VerifiedUser {
                roles,
                permissions: vec!["models:read".to_string()],
                ..VerifiedUser::default()
            }),
        })
    }

    #[test]
    fn loading_session_keeps_gate_loading() {
        let mut gate = AccessGate::new();
        assert!(gate.observe(&Session::Loading).is_none());
        assert_eq!(gate.state(), &GateState::Loading);
    }

    #[test]
    fn signed_out_is_unauthenticated_without_ticket() {
        let mut gate = AccessGate::new();
        assert!(gate.observe(&Session::SignedOut).is_none());
        assert_eq!(gate.state(), &GateState::Unauthenticated);
    }

    #[test]
    fn signed_in_issues_ticket_and_checks() {
        let mut gate = AccessGate::new();
        let ticket = gate.observe(&Session::SignedIn(alice())).unwrap();

        assert_eq!(ticket.identity().handle().as_str(), "uid_alice");
        assert_eq!(gate.state(), &GateState::Checking);
        assert!(gate.state().is_pending());
    }

    #[test]
    fn affirmative_answer_authorizes_with_capabilities() {
        let mut gate = AccessGate::new();
        let ticket = gate.observe(&Session::SignedIn(alice())).unwrap();

        let roles = vec![RoleGrant::new("r1", "admin").with_permissions(["models:deploy"])];
        assert!(gate.resolve(ticket, admitted(roles)));

        let capabilities = gate.capabilities().unwrap();
        assert!(capabilities.has_role("admin"));
        assert!(capabilities.has_permission("models:deploy"));
        assert!(capabilities.has_permission("models:read"));
        assert_eq!(
            gate.state().principal().unwrap().identity().handle().as_str(),
            "uid_alice"
        );
    }

    #[test]
    fn authorized_without_profile_has_empty_capabilities() {
        let mut gate = AccessGate::new();
        let ticket = gate.observe(&Session::SignedIn(alice())).unwrap();

        gate.resolve(ticket, Ok(VerifyResponse { authorized: true, user: None }));

        assert!(gate.state().is_authorized());
        assert!(gate.capabilities().unwrap().is_empty());
    }

    #[test]
    fn negative_answer_is_forbidden() {
        let mut gate = AccessGate::new();
        let ticket = gate.observe(&Session::SignedIn(alice())).unwrap();

        gate.resolve(ticket, Ok(VerifyResponse { authorized: false, user: None }));

        assert_eq!(gate.state(), &GateState::Forbidden { reason: None });
        assert!(gate.capabilities().is_none());
    }

    #[test]
    fn permission_denied_is_forbidden_not_error() {
        let mut gate = AccessGate::new();
        let ticket = gate.observe(&Session::SignedIn(alice())).unwrap();

        gate.resolve(ticket, Err(ApiError::from_status(403, "Forbidden")));

        assert!(matches!(
            gate.state(),
            GateState::Forbidden { reason: Some(reason) } if reason.contains("permission")
        ));
    }

    #[test]
    fn other_failures_are_errors_with_kind() {
        let cases = [
            (ApiError::from_status(401, "Unauthorized"), ApiErrorKind::AuthenticationRequired),
            (ApiError::malformed(200, "eof"), ApiErrorKind::MalformedResponse),
            (ApiError::from_status(502, "Bad Gateway"), ApiErrorKind::Other),
            (ApiError::transport("connection refused"), ApiErrorKind::Other),
        ];
        for (error, expected) in cases {
            let mut gate = AccessGate::new();
            let ticket = gate.observe(&Session::SignedIn(alice())).unwrap();

            gate.resolve(ticket, Err(error));

            match gate.state() {
                GateState::Error { kind, .. } => assert_eq!(*kind, expected),
                other => panic!("expected error state, got {other:?}"),
            }
        }
    }

    #[test]
    fn same_identity_does_not_recheck() {
        let mut gate = AccessGate::new();
        let ticket = gate.observe(&Session::SignedIn(alice())).unwrap();
        assert!(gate.observe(&Session::SignedIn(alice())).is_none());

        gate.resolve(ticket, admitted(Vec::new()));
        assert!(gate.observe(&Session::SignedIn(alice())).is_none());
        assert!(gate.state().is_authorized());
    }

    #[test]
    fn stale_result_for_previous_identity_is_discarded() {
        let mut gate = AccessGate::new();
        let for_alice = gate.observe(&Session::SignedIn(alice())).unwrap();
        let for_bob = gate.observe(&Session::SignedIn(bob())).unwrap();

        assert!(!gate.resolve(for_alice, admitted(Vec::new())));
        assert_eq!(gate.state(), &GateState::Checking);

        assert!(gate.resolve(for_bob, Err(ApiError::from_status(403, "Forbidden"))));
        assert!(matches!(gate.state(), GateState::Forbidden { .. }));
    }

    #[test]
    fn result_after_sign_out_never_authorizes() {
        let mut gate = AccessGate::new();
        let ticket = gate.observe(&Session::SignedIn(alice())).unwrap();
        gate.observe(&Session::SignedOut);

        assert!(!gate.resolve(ticket, admitted(Vec::new())));
        assert_eq!(gate.state(), &GateState::Unauthenticated);
    }

    #[test]
    fn result_after_return_to_loading_never_authorizes() {
        let mut gate = AccessGate::new();
        let ticket = gate.observe(&Session::SignedIn(alice())).unwrap();
        gate.observe(&Session::Loading);

        assert!(!gate.resolve(ticket, admitted(Vec::new())));
        assert_eq!(gate.state(), &GateState::Loading);
    }

    #[test]
    fn same_identity_after_sign_out_is_rechecked() {
        let mut gate = AccessGate::new();
        let first = gate.observe(&Session::SignedIn(alice())).unwrap();
        gate.resolve(first, admitted(Vec::new()));
        gate.observe(&Session::SignedOut);

        let second = gate.observe(&Session::SignedIn(alice()));

        assert!(second.is_some());
        assert_eq!(gate.state(), &GateState::Checking);
    }

    #[test]
    fn ticket_resolves_once() {
        let mut gate = AccessGate::new();
        let ticket = gate.observe(&Session::SignedIn(alice())).unwrap();

        assert!(gate.resolve(ticket.clone(), admitted(Vec::new())));
        assert!(!gate.resolve(ticket, Err(ApiError::from_status(500, "Internal Server Error"))));
        assert!(gate.state().is_authorized());
    }

    #[test]
    fn never_authorized_while_signed_out_or_loading() {
        let sessions = [
            Session::SignedIn(alice()),
            Session::Loading,
            Session::SignedIn(bob()),
            Session::SignedOut,
            Session::SignedIn(alice()),
            Session::SignedIn(bob()),
            Session::SignedOut,
        ];
        let mut gate = AccessGate::new();
        let mut issued = Vec::new();
        for session in &sessions {
            if let Some(ticket) = gate.observe(session) {
                issued.push(ticket);
            }
            // Late answers for every ticket ever issued, newest last.
            for ticket in &issued {
                gate.resolve(ticket.clone(), admitted(Vec::new()));
            }
            if !session.is_signed_in() {
                assert!(!gate.state().is_authorized(), "authorized after {session:?}");
            }
        }
    }

    #[test]
    fn effective_state_follows_session_after_sign_out() {
        let mut gate = AccessGate::new();
        let ticket = gate.observe(&Session::SignedIn(alice())).unwrap();
        gate.resolve(ticket, admitted(Vec::new()));
        let published = gate.state().clone();

        let signed_out = published.effective(&Session::SignedOut);
        assert_eq!(signed_out, GateState::Unauthenticated);
        assert!(signed_out.capabilities().is_none());
        assert_eq!(published.effective(&Session::Loading), GateState::Loading);
    }

    #[test]
    fn effective_state_hides_previous_principal() {
        let mut gate = AccessGate::new();
        let ticket = gate.observe(&Session::SignedIn(alice())).unwrap();
        gate.resolve(ticket, admitted(Vec::new()));
        let published = gate.state().clone();

        assert_eq!(published.effective(&Session::SignedIn(bob())), GateState::Checking);
        assert!(published.effective(&Session::SignedIn(alice())).is_authorized());
    }

    #[test]
    fn effective_state_waits_for_gate_to_catch_up() {
        let session = Session::SignedIn(alice());
        assert_eq!(GateState::Unauthenticated.effective(&session), GateState::Checking);
        assert_eq!(GateState::Loading.effective(&session), GateState::Checking);
        assert_eq!(
            GateState::Forbidden { reason: None }.effective(&session),
            GateState::Forbidden { reason: None }
        );
    }

    #[test]
    fn result_arriving_with_unseen_sign_out_is_discarded() {
        let (tx, mut sessions) = watch::channel(Session::SignedIn(alice()));
        let mut gate = AccessGate::new();
        let ticket = observe_latest(&mut gate, &mut sessions).unwrap();

        tx.send_replace(Session::SignedOut);
        let next = apply_result(&mut gate, &mut sessions, ticket, admitted(Vec::new()));

        assert!(next.is_none());
        assert_eq!(gate.state(), &GateState::Unauthenticated);
    }

    #[test]
    fn result_arriving_with_unseen_identity_change_is_discarded() {
        let (tx, mut sessions) = watch::channel(Session::SignedIn(alice()));
        let mut gate = AccessGate::new();
        let for_alice = observe_latest(&mut gate, &mut sessions).unwrap();

        tx.send_replace(Session::SignedIn(bob()));
        let for_bob = apply_result(&mut gate, &mut sessions, for_alice, admitted(Vec::new()));

        assert_eq!(for_bob.unwrap().identity().handle().as_str(), "uid_bob");
        assert_eq!(gate.state(), &GateState::Checking);
    }

    async fn wait_for_state(
        rx: &mut watch::Receiver<GateState>,
        predicate: impl FnMut(&GateState) -> bool,
    ) -> GateState {
        tokio::time::timeout(Duration::from_secs(5), rx.wait_for(predicate))
            .await
            .expect("gate state did not arrive in time")
            .expect("gate stopped")
            .clone()
    }

    fn driver(base_url: &str) -> (InMemoryIdentityProvider, AuthorizedClient) {
        let identity = InMemoryIdentityProvider::new();
        let sessions = SessionProvider::new(Arc::new(identity.clone()));
        (identity, AuthorizedClient::new(base_url, sessions))
    }

    #[tokio::test]
    async fn driver_authorizes_signed_in_principal() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET)
                    .path(VERIFY_USER_PATH)
                    .header("authorization", "Bearer token-a");
                then.status(200).json_body(json!({
                    "authorized": true,
                    "user": {"roles": [{"id": "r1", "name": "admin"}], "permissions": ["models:read"]}
                }));
            })
            .await;
        let (identity, client) = driver(&server.base_url());
        let (states, mut rx) = watch::channel(GateState::Loading);

        let local = tokio::task::LocalSet::new();
        local
            .run_until(async move {
                tokio::task::spawn_local(run_gate(client, states));
                identity.sign_in(alice(), Credential::new("token-a"));

                let state = wait_for_state(&mut rx, GateState::is_authorized).await;

                let capabilities = state.capabilities().unwrap();
                assert!(capabilities.has_role("admin"));
                assert!(capabilities.has_permission("models:read"));
            })
            .await;
    }

    #[tokio::test]
    async fn driver_maps_forbidden_to_waitlist() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.path(VERIFY_USER_PATH);
                then.status(403);
            })
            .await;
        let (identity, client) = driver(&server.base_url());
        let (states, mut rx) = watch::channel(GateState::Loading);

        let local = tokio::task::LocalSet::new();
        local
            .run_until(async move {
                tokio::task::spawn_local(run_gate(client, states));
                identity.sign_in(alice(), Credential::new("token-a"));

                let state =
                    wait_for_state(&mut rx, |s| matches!(s, GateState::Forbidden { .. })).await;
                assert!(!state.is_authorized());
            })
            .await;
    }

    #[tokio::test]
    async fn driver_makes_no_call_when_signed_out() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.path(VERIFY_USER_PATH);
                then.status(200).json_body(json!({"authorized": true}));
            })
            .await;
        let (identity, client) = driver(&server.base_url());
        let (states, mut rx) = watch::channel(GateState::Loading);

        let local = tokio::task::LocalSet::new();
        local
            .run_until(async move {
                tokio::task::spawn_local(run_gate(client, states));
                identity.sign_out();

                wait_for_state(&mut rx, |s| *s == GateState::Unauthenticated).await;
            })
            .await;

        assert_eq!(mock.hits_async().await, 0);
    }

    #[tokio::test]
    async fn driver_drops_late_answer_for_previous_identity() {
        let server = MockServer::start_async().await;
        let slow_alice = server
            .mock_async(|when, then| {
                when.path(VERIFY_USER_PATH)
                    .header("authorization", "Bearer token-a");
                then.status(200)
                    .delay(Duration::from_millis(400))
                    .json_body(json!({"authorized": true}));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.path(VERIFY_USER_PATH)
                    .header("authorization", "Bearer token-b");
                then.status(403);
            })
            .await;
        let (identity, client) = driver(&server.base_url());
        let (states, mut rx) = watch::channel(GateState::Loading);

        let local = tokio::task::LocalSet::new();
        local
            .run_until(async move {
                tokio::task::spawn_local(run_gate(client, states));

                identity.sign_in(alice(), Credential::new("token-a"));
                wait_for_state(&mut rx, |s| *s == GateState::Checking).await;
                tokio::time::sleep(Duration::from_millis(100)).await;

                identity.sign_in(bob(), Credential::new("token-b"));
                wait_for_state(&mut rx, |s| matches!(s, GateState::Forbidden { .. })).await;

                // Outlive alice's delayed answer.
                tokio::time::sleep(Duration::from_millis(600)).await;
                assert!(matches!(*rx.borrow(), GateState::Forbidden { .. }));
            })
            .await;

        assert_eq!(slow_alice.hits_async().await, 1);
    }

    #[tokio::test]
    async fn published_authorization_does_not_outlive_sign_out() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.path(VERIFY_USER_PATH);
                then.status(200).json_body(json!({"authorized": true}));
            })
            .await;
        let (identity, client) = driver(&server.base_url());
        let sessions = client.session().clone();
        let (states, mut rx) = watch::channel(GateState::Loading);

        let local = tokio::task::LocalSet::new();
        local
            .run_until(async move {
                tokio::task::spawn_local(run_gate(client, states));
                identity.sign_in(alice(), Credential::new("token-a"));
                wait_for_state(&mut rx, GateState::is_authorized).await;

                identity.sign_out();

                // The driver has not run since the sign-out.
                let session = sessions.current_session();
                let published = rx.borrow().clone();
                assert_eq!(session, Session::SignedOut);
                assert_eq!(published.effective(&session), GateState::Unauthenticated);

                wait_for_state(&mut rx, |s| *s == GateState::Unauthenticated).await;
            })
            .await;
    }

    #[tokio::test]
    async fn driver_stops_when_receivers_are_gone() {
        let (_identity, client) = driver("http://127.0.0.1:1");
        let (states, rx) = watch::channel(GateState::Loading);
        drop(rx);

        tokio::time::timeout(Duration::from_secs(5), run_gate(client, states))
            .await
            .expect("driver kept running without receivers");
    }
}
