//! Main Leptos application component and routing.

use crate::auth::{AuthProvider, RequireAccess, use_auth};
use crate::pages::{HomePage, SettingsPage};
use crate::user::{UserInfo, use_current_user};
use leptos::prelude::*;
use leptos_meta::{Title, provide_meta_context};
use leptos_router::{
    components::{Route, Router, Routes},
    path,
};

/// The main application component.
///
/// The whole console sits behind the access boundary; visitors who are not
/// signed in are sent to the sign-in surface.
#[component]
pub fn App() -> impl IntoView {
    provide_meta_context();

    view! {
        <Title text="DeadSimpleML"/>
        <AuthProvider>
            <Router>
                <RequireAccess redirect=true>
                    <Header/>
                    <main class="container">
                        <Routes fallback=|| "Page not found.".into_view()>
                            <Route path=path!("/") view=HomePage/>
                            <Route path=path!("/settings") view=SettingsPage/>
                        </Routes>
                    </main>
                </RequireAccess>
            </Router>
        </AuthProvider>
    }
}

/// Header component with navigation and user menu.
#[component]
fn Header() -> impl IntoView {
    let user = use_current_user();

    view! {
        <header class="header">
            <div class="header-left">
                <a href="/" class="logo">"DeadSimpleML"</a>
            </div>
            <div class="header-right">
                {move || user.get().map(|user_info| view! { <UserMenu user_info=user_info/> })}
            </div>
        </header>
    }
}

/// User menu dropdown component.
#[component]
fn UserMenu(user_info: UserInfo) -> impl IntoView {
    let auth = use_auth();

    view! {
        <div class="user-menu">
            <span class="avatar">{user_info.initial().to_string()}</span>
            <span class="user-name">{user_info.label()}</span>
            <div class="user-dropdown">
                <a href="/settings">"Settings"</a>
                <button class="link-button" on:click=move |_| auth.sign_out()>"Sign out"</button>
            </div>
        </div>
    }
}
