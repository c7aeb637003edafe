//! Browser location and session storage.
//!
//! Everything here is inert outside the browser bundle.

use deadsimple_platform_access::SignInHandoff;

#[cfg(feature = "hydrate")]
const HANDOFF_KEY: &str = "deadsimple.sign-in";

/// Takes the sign-in hand-off from the URL fragment, falling back to the one
/// remembered for this tab.
///
/// A hand-off found in the fragment is remembered and removed from the
/// address bar.
pub fn take_handoff() -> Option<SignInHandoff> {
    #[cfg(feature = "hydrate")]
    {
        let window = web_sys::window()?;
        let location = window.location();
        let storage = window.session_storage().ok().flatten();

        let fragment = location.hash().unwrap_or_default();
        if let Some(handoff) = SignInHandoff::from_fragment(&fragment) {
            if let Some(storage) = &storage
                && let Err(error) = storage.set_item(HANDOFF_KEY, fragment.trim_start_matches('#'))
            {
                tracing::debug!(?error, "could not remember sign-in hand-off");
            }
            if let (Ok(history), Ok(path), Ok(search)) =
                (window.history(), location.pathname(), location.search())
                && let Err(error) = history.replace_state_with_url(
                    &wasm_bindgen::JsValue::NULL,
                    "",
                    Some(&format!("{path}{search}")),
                )
            {
                tracing::debug!(?error, "could not clear sign-in fragment");
            }
            return Some(handoff);
        }

        let remembered = storage?.get_item(HANDOFF_KEY).ok().flatten()?;
        SignInHandoff::from_fragment(&remembered)
    }
    #[cfg(not(feature = "hydrate"))]
    {
        None
    }
}

/// Forgets the remembered sign-in hand-off.
pub fn forget_handoff() {
    #[cfg(feature = "hydrate")]
    if let Some(storage) = web_sys::window().and_then(|w| w.session_storage().ok().flatten())
        && let Err(error) = storage.remove_item(HANDOFF_KEY)
    {
        tracing::debug!(?error, "could not forget sign-in hand-off");
    }
}

/// Returns the full URL of the current page.
pub fn current_location() -> Option<String> {
    #[cfg(feature = "hydrate")]
    {
        web_sys::window()?.location().href().ok()
    }
    #[cfg(not(feature = "hydrate"))]
    {
        None
    }
}

/// Navigates the whole page away to `url`.
pub fn navigate(url: &str) {
    #[cfg(feature = "hydrate")]
    if let Some(window) = web_sys::window()
        && let Err(error) = window.location().set_href(url)
    {
        tracing::warn!(?error, "navigation failed");
    }
    #[cfg(not(feature = "hydrate"))]
    let _ = url;
}
