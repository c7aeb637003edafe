//! Capability guards.
//!
//! Guards are pure predicates over the current [`CapabilitySet`]. An absent
//! set (nothing authorized yet) always denies; guards never fail.

use crate::capability::CapabilitySet;
use std::fmt;

/// A capability requirement for rendering a subtree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Requirement {
    /// A single permission must be held.
    Permission(String),
    /// Every listed permission must be held.
    AllPermissions(Vec<String>),
    /// At least one listed permission must be held.
    AnyPermission(Vec<String>),
    /// A single role must be held.
    Role(String),
    /// Every listed role must be held.
    AllRoles(Vec<String>),
    /// At least one listed role must be held.
    AnyRole(Vec<String>),
}

/// Outcome of evaluating a [`Requirement`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// The requirement is satisfied.
    Allow,
    /// The requirement is not satisfied.
    Deny(Denial),
}

impl GuardDecision {
    /// Returns true for [`GuardDecision::Allow`].
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }
}

/// Why a requirement denied.
///
/// `entries` holds the missing entries for single and all-of requirements,
/// and every acceptable option for any-of requirements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Denial {
    requirement: Requirement,
    entries: Vec<String>,
}

impl Denial {
    /// Returns the requirement that denied.
    #[must_use]
    pub fn requirement(&self) -> &Requirement {
        &self.requirement
    }

    /// Returns the entries named in the denial message.
    #[must_use]
    pub fn entries(&self) -> &[String] {
        &self.entries
    }
}

impl fmt::Display for Denial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.requirement {
            Requirement::Permission(permission) => write!(
                f,
                "You don't have permission to access this feature. Required permission: {permission}"
            ),
            Requirement::AllPermissions(_) => write!(
                f,
                "You don't have the required permissions. Missing: {}",
                self.entries.join(", ")
            ),
            Requirement::AnyPermission(_) => write!(
                f,
                "You don't have permission to access this feature. Required permissions: {}",
                self.entries.join(" or ")
            ),
            Requirement::Role(role) => write!(
                f,
                "You don't have the required role to access this feature. Required role: {role}"
            ),
            Requirement::AllRoles(_) => write!(
                f,
                "You don't have the required roles. Missing: {}",
                self.entries.join(", ")
            ),
            Requirement::AnyRole(_) => write!(
                f,
                "You don't have permission to access this feature. Required roles: {}",
                self.entries.join(" or ")
            ),
        }
    }
}

impl Requirement {
    /// Requires a single permission.
    #[must_use]
    pub fn permission(permission: impl Into<String>) -> Self {
        Self::Permission(permission.into())
    }

    /// Requires every listed permission.
    #[must_use]
    pub fn all_permissions<I, S>(permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::AllPermissions(permissions.into_iter().map(Into::into).collect())
    }

    /// Requires at least one listed permission.
    #[must_use]
    pub fn any_permission<I, S>(permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::AnyPermission(permissions.into_iter().map(Into::into).collect())
    }

    /// Requires a single role.
    #[must_use]
    pub fn role(role: impl Into<String>) -> Self {
        Self::Role(role.into())
    }

    /// Requires every listed role.
    #[must_use]
    pub fn all_roles<I, S>(roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::AllRoles(roles.into_iter().map(Into::into).collect())
    }

    /// Requires at least one listed role.
    #[must_use]
    pub fn any_role<I, S>(roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::AnyRole(roles.into_iter().map(Into::into).collect())
    }

    /// Evaluates the requirement against the current capabilities.
    ///
    /// `None` means no capabilities have been loaded and is treated like an
    /// empty set. An empty all-of list allows; an empty any-of list denies.
    #[must_use]
    pub fn evaluate(&self, capabilities: Option<&CapabilitySet>) -> GuardDecision {
        let holds_permission =
            |p: &str| capabilities.is_some_and(|set| set.has_permission(p));
        let holds_role = |r: &str| capabilities.is_some_and(|set| set.has_role(r));

        let entries = match self {
            Self::Permission(p) => missing(std::slice::from_ref(p), holds_permission),
            Self::AllPermissions(list) => missing(list, holds_permission),
            Self::AnyPermission(list) => unless_any(list, holds_permission),
            Self::Role(r) => missing(std::slice::from_ref(r), holds_role),
            Self::AllRoles(list) => missing(list, holds_role),
            Self::AnyRole(list) => unless_any(list, holds_role),
        };

        match entries {
            None => GuardDecision::Allow,
            Some(entries) => GuardDecision::Deny(Denial {
                requirement: self.clone(),
                entries,
            }),
        }
    }
}

/// Returns the entries not held, or `None` when all are held.
fn missing(list: &[String], holds: impl Fn(&str) -> bool) -> Option<Vec<String>> {
    let missing: Vec<String> = list.iter().filter(|e| !holds(e)).cloned().collect();
    if missing.is_empty() {
        None
    } else {
        Some(missing)
    }
}

/// Returns every option when none are held, or `None` when any is held.
fn unless_any(list: &[String], holds: impl Fn(&str) -> bool) -> Option<Vec<String>> {
    if list.iter().any(|e| holds(e)) {
        None
    } else {
        Some(list.to_vec())
    }
}
