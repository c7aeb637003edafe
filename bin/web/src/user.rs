//! Display data for the admitted principal.

use crate::auth::use_auth;
use deadsimple_platform_access::AuthorizedPrincipal;
use leptos::prelude::*;

/// User info for display in the UI.
///
/// Profile fields from the backend take precedence over those reported by
/// the identity provider.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserInfo {
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub photo_url: Option<String>,
    pub roles: Vec<String>,
    pub permissions: Vec<String>,
}

impl UserInfo {
    pub fn from_principal(principal: &AuthorizedPrincipal) -> Self {
        let identity = principal.identity();
        let profile = principal.profile();
        let pick = |backend: Option<&Option<String>>, provider: Option<&str>| {
            backend
                .and_then(Option::clone)
                .or_else(|| provider.map(str::to_string))
        };

        Self {
            display_name: pick(profile.map(|p| &p.display_name), identity.display_name()),
            email: pick(profile.map(|p| &p.email), identity.email()),
            photo_url: pick(profile.map(|p| &p.photo_url), identity.photo_url()),
            roles: principal.capabilities().roles().map(str::to_string).collect(),
            permissions: principal
                .capabilities()
                .permissions()
                .map(str::to_string)
                .collect(),
        }
    }

    /// Name shown in the header: display name, then email, then "User".
    pub fn label(&self) -> String {
        self.display_name
            .clone()
            .or_else(|| self.email.clone())
            .unwrap_or_else(|| "User".to_string())
    }

    /// Single character for the avatar fallback.
    pub fn initial(&self) -> char {
        self.display_name
            .as_deref()
            .and_then(|name| name.chars().next())
            .or_else(|| {
                self.email
                    .as_deref()
                    .and_then(|email| email.chars().next())
                    .map(|c| c.to_ascii_uppercase())
            })
            .unwrap_or('U')
    }
}

/// Returns the admitted principal's display data; `None` until admitted.
pub fn use_current_user() -> Memo<Option<UserInfo>> {
    let auth = use_auth();
    Memo::new(move |_| {
        auth.gate()
            .with(|state| state.principal().map(UserInfo::from_principal))
    })
}
