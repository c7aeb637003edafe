//! Role and permission types for capability checks.
//!
//! Capabilities originate from the backend's verification response. Role
//! names and permission strings are opaque at the boundary; every check goes
//! through [`CapabilitySet::has_permission`] or [`CapabilitySet::has_role`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A role granted to a principal, as reported by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleGrant {
    /// Backend identifier for the role.
    #[serde(default)]
    pub id: String,
    /// Role name used by role checks.
    pub name: String,
    /// Permissions implied by holding this role.
    #[serde(default)]
    pub permissions: Vec<String>,
}

impl RoleGrant {
    /// Creates a role grant with no implied permissions.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            permissions: Vec::new(),
        }
    }

    /// Adds implied permissions.
    #[must_use]
    pub fn with_permissions<I, S>(mut self, permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.permissions = permissions.into_iter().map(Into::into).collect();
        self
    }
}

/// Roles and permissions attached to an authorized principal.
///
/// The effective permission set is the union of directly granted permissions
/// and the permissions implied by each role.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilitySet {
    roles: BTreeSet<String>,
    permissions: BTreeSet<String>,
}

impl CapabilitySet {
    /// Creates an empty capability set (no access to anything guarded).
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Creates a capability set from plain role names and permissions.
    #[must_use]
    pub fn new<R, P>(roles: R, permissions: P) -> Self
    where
        R: IntoIterator,
        R::Item: Into<String>,
        P: IntoIterator,
        P::Item: Into<String>,
    {
        Self {
            roles: roles.into_iter().map(Into::into).collect(),
            permissions: permissions.into_iter().map(Into::into).collect(),
        }
    }

    /// Builds the set from backend role grants and direct permissions.
    #[must_use]
    pub fn from_grants(roles: &[RoleGrant], permissions: &[String]) -> Self {
        let mut set = Self::none();
        for role in roles {
            set.roles.insert(role.name.clone());
            set.permissions.extend(role.permissions.iter().cloned());
        }
        set.permissions.extend(permissions.iter().cloned());
        set
    }

    /// Returns true if the permission is held.
    #[must_use]
    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.contains(permission)
    }

    /// Returns true if the role is held.
    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }

    /// Returns the role names in sorted order.
    pub fn roles(&self) -> impl Iterator<Item = &str> {
        self.roles.iter().map(String::as_str)
    }

    /// Returns the effective permissions in sorted order.
    pub fn permissions(&self) -> impl Iterator<Item = &str> {
        self.permissions.iter().map(String::as_str)
    }

    /// Returns true if neither roles nor permissions are held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.roles.is_empty() && self.permissions.is_empty()
    }
}
