//! Access gating for the DeadSimpleML console.
//!
//! This crate provides:
//! - Session tracking over an external identity provider (`SessionProvider`,
//!   `IdentityProvider`)
//! - An HTTP client that attaches bearer credentials and classifies failures
//!   (`AuthorizedClient`, `ApiError`)
//! - The access verification gate (`AccessGate`, `run_gate`)
//! - Capability guards over roles and permissions (`Requirement`,
//!   `CapabilitySet`)
//! - The sign-in round trip with the external sign-in surface
//!
//! # Access Model
//!
//! Being signed in is not enough to use the console. The backend decides,
//! per identity, whether the principal is admitted and with which roles and
//! permissions. Only an admitted principal sees protected content; guards
//! then narrow what is shown.
//!
//! # Example
//!
//! ```
//! use deadsimple_platform_access::{
//!     AccessGate, CapabilitySet, Credential, GateState, Identity, InMemoryIdentityProvider,
//!     Requirement, Session, SessionProvider, VerifyResponse,
//! };
//! use std::sync::Arc;
//!
//! let identity = InMemoryIdentityProvider::new();
//! let sessions = SessionProvider::new(Arc::new(identity.clone()));
//! assert_eq!(sessions.current_session(), Session::Loading);
//!
//! identity.sign_in(Identity::new("uid_alice"), Credential::new("token"));
//!
//! let mut gate = AccessGate::new();
//! let ticket = gate.observe(&sessions.current_session()).expect("new identity");
//! assert_eq!(gate.state(), &GateState::Checking);
//!
//! gate.resolve(ticket, Ok(VerifyResponse { authorized: true, user: None }));
//! assert!(gate.state().is_authorized());
//!
//! // Admitted, but holds no capabilities yet.
//! let decision = Requirement::permission("models:deploy").evaluate(gate.capabilities());
//! assert!(!decision.is_allowed());
//! assert!(CapabilitySet::none().is_empty());
//! ```

pub mod capability;
pub mod client;
pub mod config;
pub mod error;
pub mod gate;
pub mod guard;
pub mod provider;
pub mod redirect;
pub mod session;

// Re-export main types at crate root
pub use capability::{CapabilitySet, RoleGrant};
pub use client::{AuthorizedClient, RequestOptions, VERIFY_USER_PATH, VerifiedUser, VerifyResponse};
pub use config::AccessConfig;
pub use error::{ApiError, ApiErrorKind, IdentityError};
pub use gate::{AccessGate, AuthorizedPrincipal, GateState, VerificationTicket, run_gate};
pub use guard::{Denial, GuardDecision, Requirement};
pub use provider::{IdentityProvider, InMemoryIdentityProvider, SessionListener, Subscription};
pub use redirect::{InvalidSignInUrl, SignInHandoff, sign_in_url};
pub use session::{Credential, Identity, Session, SessionProvider};
