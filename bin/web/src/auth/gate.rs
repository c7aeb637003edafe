//! The access boundary around protected content.

use super::{browser, use_auth};
use deadsimple_platform_access::{ApiErrorKind, GateState};
use leptos::prelude::*;

/// What the access boundary renders for a gate state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessView {
    /// Session or verdict still loading.
    Checking,
    /// Nobody is signed in.
    SignIn,
    /// Signed in, but the backend rejected the credential.
    Reauthenticate,
    /// Signed in but not admitted yet.
    Waitlist,
    /// Verification failed; carries the user-presentable reason.
    Problem(String),
    /// Admitted.
    Granted,
}

impl From<&GateState> for AccessView {
    fn from(state: &GateState) -> Self {
        match state {
            GateState::Loading | GateState::Checking => Self::Checking,
            GateState::Unauthenticated => Self::SignIn,
            GateState::Forbidden { .. } => Self::Waitlist,
            GateState::Error {
                kind: ApiErrorKind::AuthenticationRequired,
                ..
            } => Self::Reauthenticate,
            GateState::Error { reason, .. } => Self::Problem(reason.clone()),
            GateState::Authorized(_) => Self::Granted,
        }
    }
}

/// Renders its children only for an admitted principal.
///
/// With `redirect`, a visitor who is not signed in is sent to the sign-in
/// surface. A `fallback` replaces the built-in sign-in, waitlist and error
/// panels; it never replaces the loading indicator.
#[component]
pub fn RequireAccess(
    children: ChildrenFn,
    #[prop(optional)] redirect: bool,
    #[prop(optional, into)] fallback: Option<ViewFn>,
) -> impl IntoView {
    let auth = use_auth();
    let access = Memo::new(move |_| auth.gate().with(|g| AccessView::from(g)));

    Effect::new(move |_| {
        if redirect && access.get() == AccessView::SignIn {
            browser::navigate(&auth.sign_in_href());
        }
    });

    move || match access.get() {
        AccessView::Granted => children().into_any(),
        AccessView::Checking => view! { <AccessChecking/> }.into_any(),
        denied => match &fallback {
            Some(fallback) => fallback.run(),
            None => view! { <AccessDenied access=denied/> }.into_any(),
        },
    }
}

#[component]
fn AccessChecking() -> impl IntoView {
    view! {
        <div class="access-panel">
            <div class="spinner"></div>
            <p class="muted">"Checking if you're supposed to be here..."</p>
        </div>
    }
}

#[component]
fn AccessDenied(access: AccessView) -> impl IntoView {
    let auth = use_auth();

    let body = match access {
        AccessView::Waitlist => view! {
            <p>"You're on the waitlist! We're working through it as fast as we can."</p>
            <p class="muted">
                "Good news: You're signed in! Less good news: You're still in line. "
                "But hey, the best things are worth waiting for."
            </p>
            <a href=auth.waitlist_href() target="_blank" rel="external" class="outline-button">
                "Check Waitlist Status"
            </a>
        }
        .into_any(),
        AccessView::Problem(reason) => view! {
            <p>"Something's not right with your access. Let's get you sorted."</p>
            <p class="muted">{reason}</p>
            <a href="/" rel="external" class="cta-button">"Try again"</a>
        }
        .into_any(),
        AccessView::SignIn | AccessView::Reauthenticate => view! {
            <p>"Looks like you're not signed in. We can fix that."</p>
            <a href=auth.sign_in_href() rel="external" class="cta-button">
                "Get Access at DeadSimpl.com"
            </a>
            <p class="muted">"Don't worry, we'll bring you right back here."</p>
        }
        .into_any(),
        AccessView::Checking | AccessView::Granted => ().into_any(),
    };

    view! {
        <div class="access-panel">
            <h1>"Well, this is awkward"</h1>
            {body}
        </div>
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deadsimple_platform_access::{AccessGate, ApiError, Identity, Session, VerifyResponse};

    fn view_for(state: &GateState) -> AccessView {
        AccessView::from(state)
    }

    #[test]
    fn pending_states_show_checking() {
        assert_eq!(view_for(&GateState::Loading), AccessView::Checking);
        assert_eq!(view_for(&GateState::Checking), AccessView::Checking);
    }

    #[test]
    fn signed_out_shows_sign_in() {
        assert_eq!(view_for(&GateState::Unauthenticated), AccessView::SignIn);
    }

    #[test]
    fn forbidden_shows_waitlist_not_error() {
        let mut gate = AccessGate::new();
        let ticket = gate
            .observe(&Session::SignedIn(Identity::new("uid_alice")))
            .unwrap();
        gate.resolve(ticket, Err(ApiError::from_status(403, "Forbidden")));

        assert_eq!(view_for(gate.state()), AccessView::Waitlist);
    }

    #[test]
    fn rejected_credential_asks_for_sign_in_again() {
        let state = GateState::Error {
            kind: ApiErrorKind::AuthenticationRequired,
            reason: "Authentication required. Please sign in.".to_string(),
        };
        assert_eq!(view_for(&state), AccessView::Reauthenticate);
    }

    #[test]
    fn other_errors_carry_reason() {
        let state = GateState::Error {
            kind: ApiErrorKind::Other,
            reason: "API request failed: Bad Gateway".to_string(),
        };
        assert_eq!(
            view_for(&state),
            AccessView::Problem("API request failed: Bad Gateway".to_string())
        );
    }

    #[test]
    fn sign_out_while_authorized_shows_sign_in() {
        let mut gate = AccessGate::new();
        let ticket = gate
            .observe(&Session::SignedIn(Identity::new("uid_alice")))
            .unwrap();
        gate.resolve(
            ticket,
            Ok(VerifyResponse {
                authorized: true,
                user: None,
            }),
        );

        // The gate has not seen the sign-out yet.
        let shown = gate.state().effective(&Session::SignedOut);
        assert_eq!(view_for(&shown), AccessView::SignIn);

        let switched = gate.state().effective(&Session::SignedIn(Identity::new("uid_bob")));
        assert_eq!(view_for(&switched), AccessView::Checking);
    }

    #[test]
    fn authorized_is_granted() {
        let mut gate = AccessGate::new();
        let ticket = gate
            .observe(&Session::SignedIn(Identity::new("uid_alice")))
            .unwrap();
        gate.resolve(
            ticket,
            Ok(VerifyResponse {
                authorized: true,
                user: None,
            }),
        );

        assert_eq!(view_for(gate.state()), AccessView::Granted);
    }
}
