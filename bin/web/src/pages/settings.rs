//! Settings page component.

use crate::auth::{RequireRole, use_auth};
use crate::user::{UserInfo, use_current_user};
use leptos::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tab {
    Profile,
    Billing,
}

impl Tab {
    const ALL: [Tab; 2] = [Tab::Profile, Tab::Billing];

    fn label(self) -> &'static str {
        match self {
            Tab::Profile => "Profile",
            Tab::Billing => "Billing",
        }
    }
}

/// User settings page.
#[component]
pub fn SettingsPage() -> impl IntoView {
    let (active, set_active) = signal(Tab::Profile);

    view! {
        <div class="settings-page">
            <h1>"Settings"</h1>
            <nav class="tabs">
                {Tab::ALL
                    .into_iter()
                    .map(|tab| {
                        view! {
                            <button
                                class="tab"
                                class:active=move || active.get() == tab
                                on:click=move |_| set_active.set(tab)
                            >
                                {tab.label()}
                            </button>
                        }
                    })
                    .collect_view()}
            </nav>
            {move || match active.get() {
                Tab::Profile => view! { <ProfileTab/> }.into_any(),
                Tab::Billing => view! { <BillingTab/> }.into_any(),
            }}
        </div>
    }
}

#[component]
fn ProfileTab() -> impl IntoView {
    let user = use_current_user();

    move || {
        user.get()
            .map(|user_info| view! { <ProfileCard user_info=user_info/> })
    }
}

/// Profile card for the admitted principal.
#[component]
fn ProfileCard(user_info: UserInfo) -> impl IntoView {
    let auth = use_auth();
    let name = user_info
        .display_name
        .clone()
        .unwrap_or_else(|| "Anonymous User".to_string());

    view! {
        <section class="settings-section">
            <h2>"Profile Information"</h2>
            <div class="profile-header">
                <span class="avatar avatar-large">{user_info.initial().to_string()}</span>
                <div>
                    <h3>{name}</h3>
                    <p class="muted">{user_info.email.clone().unwrap_or_default()}</p>
                </div>
            </div>

            <h4>"Roles"</h4>
            <BadgeList items=user_info.roles empty="No roles assigned"/>

            <h4>"Permissions"</h4>
            <BadgeList items=user_info.permissions empty="No permissions assigned"/>

            <RequireRole role="admin" fallback=|| ()>
                <p class="admin-note">
                    "You're an admin. With great power comes great responsibility."
                </p>
            </RequireRole>

            <button class="outline-button" on:click=move |_| auth.sign_out()>"Sign Out"</button>
        </section>
    }
}

#[component]
fn BadgeList(items: Vec<String>, empty: &'static str) -> impl IntoView {
    if items.is_empty() {
        return view! { <span class="muted">{empty}</span> }.into_any();
    }

    view! {
        <div class="badges">
            {items
                .into_iter()
                .map(|item| view! { <span class="badge">{item}</span> })
                .collect_view()}
        </div>
    }
    .into_any()
}

#[component]
fn BillingTab() -> impl IntoView {
    view! {
        <section class="settings-section">
            <h2>"Billing & Subscription"</h2>
            <p class="muted">
                "No billing information yet. We're still figuring out how much to charge "
                "for making ML actually simple."
            </p>
            <button class="outline-button" disabled=true>"Coming Soon"</button>
        </section>
    }
}
