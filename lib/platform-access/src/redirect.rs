//! Round trip with the external sign-in surface.
//!
//! Unauthenticated visitors are sent to the sign-in surface with a
//! `redirect_uri` pointing back at the page they tried to open. The surface
//! returns them with the signed-in principal encoded in the URL fragment.

use crate::session::{Credential, Identity};
use reqwest::Url;
use std::fmt;

/// The sign-in surface URL could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidSignInUrl {
    url: String,
    reason: String,
}

impl fmt::Display for InvalidSignInUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid sign-in URL '{}': {}", self.url, self.reason)
    }
}

impl std::error::Error for InvalidSignInUrl {}

/// Builds the sign-in URL that returns the visitor to `current_location`.
pub fn sign_in_url(sign_in_base: &str, current_location: &str) -> Result<Url, InvalidSignInUrl> {
    let mut url = Url::parse(sign_in_base).map_err(|error| InvalidSignInUrl {
        url: sign_in_base.to_string(),
        reason: error.to_string(),
    })?;
    url.query_pairs_mut().append_pair("redirect_uri", current_location);
    Ok(url)
}

/// Principal handed back by the sign-in surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignInHandoff {
    pub identity: Identity,
    pub credential: Credential,
}

impl SignInHandoff {
    /// Parses a URL fragment such as `#uid=u1&token=t&email=a%40b.c`.
    ///
    /// Returns `None` unless both `uid` and `token` are present and
    /// non-empty.
    #[must_use]
    pub fn from_fragment(fragment: &str) -> Option<Self> {
        let fragment = fragment.strip_prefix('#').unwrap_or(fragment);
        if fragment.is_empty() {
            return None;
        }

        // Reuse the form-urlencoded query parser for the fragment.
        let mut carrier = Url::parse("http://handoff.invalid/").ok()?;
        carrier.set_query(Some(fragment));

        let mut uid = None;
        let mut token = None;
        let mut email = None;
        let mut name = None;
        let mut photo = None;
        for (key, value) in carrier.query_pairs() {
            let value = value.into_owned();
            if value.is_empty() {
                continue;
            }
            match key.as_ref() {
                "uid" => uid = Some(value),
                "token" => token = Some(value),
                "email" => email = Some(value),
                "name" => name = Some(value),
                "photo" => photo = Some(value),
                _ => {}
            }
        }

        let identity = Identity::new(uid?)
            .with_email(email)
            .with_display_name(name)
            .with_photo_url(photo);
        Some(Self {
            identity,
            credential: Credential::new(token?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_in_url_encodes_current_location() {
        let url = sign_in_url(
            "https://dead-simpl.com",
            "https://console.dead-simpl.com/settings?tab=billing",
        )
        .unwrap();

        assert_eq!(
            url.as_str(),
            "https://dead-simpl.com/?redirect_uri=https%3A%2F%2Fconsole.dead-simpl.com%2Fsettings%3Ftab%3Dbilling"
        );
    }

    #[test]
    fn sign_in_url_keeps_existing_query() {
        let url =
            sign_in_url("https://login.example.com/start?app=console", "http://localhost/").unwrap();
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![
                ("app".to_string(), "console".to_string()),
                ("redirect_uri".to_string(), "http://localhost/".to_string()),
            ]
        );
    }

    #[test]
    fn sign_in_url_rejects_garbage() {
        let err = sign_in_url("not a url", "http://localhost/").unwrap_err();
        assert!(err.to_string().contains("not a url"));
    }

    #[test]
    fn handoff_parses_full_fragment() {
        let handoff = SignInHandoff::from_fragment(
            "#uid=u1&token=t0k&email=alice%40example.com&name=Alice+Smith&photo=https%3A%2F%2Fimg%2Fa.png",
        )
        .unwrap();

        assert_eq!(handoff.identity.handle().as_str(), "u1");
        assert_eq!(handoff.identity.email(), Some("alice@example.com"));
        assert_eq!(handoff.identity.display_name(), Some("Alice Smith"));
        assert_eq!(handoff.identity.photo_url(), Some("https://img/a.png"));
        assert_eq!(handoff.credential.expose(), "t0k");
    }

    #[test]
    fn handoff_requires_uid_and_token() {
        assert!(SignInHandoff::from_fragment("").is_none());
        assert!(SignInHandoff::from_fragment("#").is_none());
        assert!(SignInHandoff::from_fragment("#uid=u1").is_none());
        assert!(SignInHandoff::from_fragment("#token=t").is_none());
        assert!(SignInHandoff::from_fragment("#uid=&token=t").is_none());
    }

    #[test]
    fn handoff_ignores_unknown_keys() {
        let handoff = SignInHandoff::from_fragment("uid=u1&token=t&state=xyz").unwrap();
        assert_eq!(handoff.identity.handle().as_str(), "u1");
        assert!(handoff.identity.email().is_none());
    }
}
