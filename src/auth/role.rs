//! The four portal roles and their persisted markers.
//!
//! The role marker is the string persisted alongside the access token; on
//! rehydration it alone decides which whoami endpoint is consulted. Unknown
//! markers are rejected explicitly instead of defaulting.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::AuthError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    SuperAdmin,
    Clinic,
    Branch,
    Doctor,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::SuperAdmin, Role::Clinic, Role::Branch, Role::Doctor];

    /// The persisted marker string for this role.
    pub fn marker(&self) -> &'static str {
        match self {
            Role::SuperAdmin => "super_admin",
            Role::Clinic => "clinic",
            Role::Branch => "branch",
            Role::Doctor => "doctor",
        }
    }

    /// Parse a persisted role marker, rejecting anything unknown.
    pub fn from_marker(marker: &str) -> Result<Role, AuthError> {
        match marker {
            "super_admin" => Ok(Role::SuperAdmin),
            "clinic" => Ok(Role::Clinic),
            "branch" => Ok(Role::Branch),
            "doctor" => Ok(Role::Doctor),
            other => Err(AuthError::UnknownRoleMarker(other.to_string())),
        }
    }

    /// The whoami endpoint consulted for sessions issued under this role.
    ///
    /// Three endpoints exist: generic (super-admin and branch sessions),
    /// clinic-scoped and doctor-scoped.
    pub fn whoami_path(&self) -> &'static str {
        match self {
            Role::SuperAdmin | Role::Branch => "/me",
            Role::Clinic => "/clinics/me",
            Role::Doctor => "/doctors/me",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.marker())
    }
}

/// An account's set of role tags, persisted as a comma-separated list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleSet(Vec<Role>);

impl RoleSet {
    pub fn new(roles: Vec<Role>) -> Self {
        Self(roles)
    }

    pub fn single(role: Role) -> Self {
        Self(vec![role])
    }

    pub fn contains(&self, role: Role) -> bool {
        self.0.contains(&role)
    }

    pub fn roles(&self) -> &[Role] {
        &self.0
    }

    /// Parse the persisted comma-separated form.
    pub fn from_markers(raw: &str) -> Result<Self, AuthError> {
        let mut roles = Vec::new();
        for marker in raw.split(',').map(str::trim).filter(|m| !m.is_empty()) {
            let role = Role::from_marker(marker)?;
            if !roles.contains(&role) {
                roles.push(role);
            }
        }
        Ok(Self(roles))
    }

    pub fn to_markers(&self) -> String {
        self.0
            .iter()
            .map(Role::marker)
            .collect::<Vec<_>>()
            .join(",")
    }
}
