//! Capability guard components.
//!
//! Each guard renders its children when the admitted principal satisfies a
//! [`Requirement`], and otherwise the `fallback` or an inline denial message.
//! Guards only read capabilities already loaded by the access gate.

use super::use_auth;
use deadsimple_platform_access::{GuardDecision, Requirement};
use leptos::prelude::*;

fn guarded(
    requirement: Requirement,
    children: ChildrenFn,
    fallback: Option<ViewFn>,
) -> impl IntoView {
    let auth = use_auth();
    let requirement = StoredValue::new(requirement);
    let decision = Memo::new(move |_| {
        auth.capabilities().with(|capabilities| {
            requirement.with_value(|requirement| requirement.evaluate(capabilities.as_ref()))
        })
    });

    move || match decision.get() {
        GuardDecision::Allow => children().into_any(),
        GuardDecision::Deny(denial) => match &fallback {
            Some(fallback) => fallback.run(),
            None => view! {
                <div class="alert alert-destructive" role="alert">{denial.to_string()}</div>
            }
            .into_any(),
        },
    }
}

/// Renders children when an arbitrary requirement holds.
#[component]
pub fn Guarded(
    requirement: Requirement,
    children: ChildrenFn,
    #[prop(optional, into)] fallback: Option<ViewFn>,
) -> impl IntoView {
    guarded(requirement, children, fallback)
}

/// Requires a single permission.
#[component]
pub fn RequirePermission(
    #[prop(into)] permission: String,
    children: ChildrenFn,
    #[prop(optional, into)] fallback: Option<ViewFn>,
) -> impl IntoView {
    guarded(Requirement::permission(permission), children, fallback)
}

/// Requires every listed permission.
#[component]
pub fn RequirePermissions(
    #[prop(into)] permissions: Vec<String>,
    children: ChildrenFn,
    #[prop(optional, into)] fallback: Option<ViewFn>,
) -> impl IntoView {
    guarded(Requirement::all_permissions(permissions), children, fallback)
}

/// Requires at least one listed permission.
#[component]
pub fn RequireAnyPermission(
    #[prop(into)] permissions: Vec<String>,
    children: ChildrenFn,
    #[prop(optional, into)] fallback: Option<ViewFn>,
) -> impl IntoView {
    guarded(Requirement::any_permission(permissions), children, fallback)
}

/// Requires a single role.
#[component]
pub fn RequireRole(
    #[prop(into)] role: String,
    children: ChildrenFn,
    #[prop(optional, into)] fallback: Option<ViewFn>,
) -> impl IntoView {
    guarded(Requirement::role(role), children, fallback)
}

/// Requires every listed role.
#[component]
pub fn RequireRoles(
    #[prop(into)] roles: Vec<String>,
    children: ChildrenFn,
    #[prop(optional, into)] fallback: Option<ViewFn>,
) -> impl IntoView {
    guarded(Requirement::all_roles(roles), children, fallback)
}

/// Requires at least one listed role.
#[component]
pub fn RequireAnyRole(
    #[prop(into)] roles: Vec<String>,
    children: ChildrenFn,
    #[prop(optional, into)] fallback: Option<ViewFn>,
) -> impl IntoView {
    guarded(Requirement::any_role(roles), children, fallback)
}
