//! Home page component.

use crate::auth::RequirePermission;
use crate::user::use_current_user;
use leptos::prelude::*;

/// Permission needed to push a model to production.
pub const DEPLOY_PERMISSION: &str = "models:deploy";

/// One of the three things the console does.
struct Offering {
    title: &'static str,
    description: &'static str,
    permission: Option<&'static str>,
}

static OFFERINGS: [Offering; 3] = [
    Offering {
        title: "Evaluate",
        description: "Actually see if your model works (revolutionary concept, we know)",
        permission: None,
    },
    Offering {
        title: "Tune",
        description: "Make your model less terrible without a PhD in hyperparameters",
        permission: None,
    },
    Offering {
        title: "Deploy",
        description: "Put your model somewhere people can actually use it",
        permission: Some(DEPLOY_PERMISSION),
    },
];

/// The home page component.
#[component]
pub fn HomePage() -> impl IntoView {
    let user = use_current_user();
    let greeting = move || {
        user.get()
            .and_then(|user_info| user_info.display_name)
            .map(|name| format!("Welcome back, {name}!"))
            .unwrap_or_else(|| "Welcome to DeadSimpleML".to_string())
    };

    view! {
        <div class="home-page">
            <h1>{greeting}</h1>
            <p class="muted">
                "Remember when ML was just \"train model, use model\"? Yeah, us too."
            </p>
            <p class="muted">
                "Three steps: Evaluate your models, tune what's broken, deploy what works. "
                "That's it. No PhD required."
            </p>
            <div class="card-grid">
                {OFFERINGS
                    .iter()
                    .map(|offering| view! { <OfferingCard offering=offering/> })
                    .collect_view()}
            </div>
        </div>
    }
}

#[component]
fn OfferingCard(offering: &'static Offering) -> impl IntoView {
    let action = match offering.permission {
        Some(permission) => view! {
            <RequirePermission
                permission=permission
                fallback=|| view! {
                    <button class="outline-button" disabled=true>"Ask an admin"</button>
                }
            >
                <button class="outline-button">"Get Started"</button>
            </RequirePermission>
        }
        .into_any(),
        None => view! { <button class="outline-button">"Get Started"</button> }.into_any(),
    };

    view! {
        <div class="card">
            <h2>{offering.title}</h2>
            <p class="muted">{offering.description}</p>
            {action}
        </div>
    }
}
