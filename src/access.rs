//! Access gate: decides whether a caller may query management data
//!
//! Roles and permissions are plain data. A caller is authorized when any
//! of their roles grants [`Permission::Admin`]; unknown role names grant
//! nothing.

use jmxgate_common::CallerIdentity;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Permission {
    Read,
    Write,
    Execute,
    Schedule,
    Metrics,
    CreateProjects,
    Admin,
}

impl Permission {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Permission::Read => "read",
            Permission::Write => "write",
            Permission::Execute => "execute",
            Permission::Schedule => "schedule",
            Permission::Metrics => "metrics",
            Permission::CreateProjects => "create-projects",
            Permission::Admin => "admin",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A named set of permissions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Role {
    pub name: String,
    pub permissions: BTreeSet<Permission>,
}

impl Role {
    pub fn new(name: impl Into<String>, permissions: impl IntoIterator<Item = Permission>) -> Self {
        Self {
            name: name.into(),
            permissions: permissions.into_iter().collect(),
        }
    }

    pub fn grants(&self, permission: Permission) -> bool {
        self.permissions.contains(&permission)
    }
}

/// Resolves role names to roles. Owned by the user-management layer.
pub trait RoleStore: Send + Sync {
    fn role(&self, name: &str) -> Option<Role>;
}

/// Role store fixed at construction
#[derive(Debug, Clone, Default)]
pub struct StaticRoleStore {
    roles: HashMap<String, Role>,
}

impl StaticRoleStore {
    pub fn new(roles: impl IntoIterator<Item = Role>) -> Self {
        Self {
            roles: roles.into_iter().map(|r| (r.name.clone(), r)).collect(),
        }
    }
}

impl RoleStore for StaticRoleStore {
    fn role(&self, name: &str) -> Option<Role> {
        self.roles.get(name).cloned()
    }
}

/// Grants access to callers holding the administrative capability
#[derive(Clone)]
pub struct AccessGate {
    roles: Arc<dyn RoleStore>,
}

impl AccessGate {
    pub fn new(roles: Arc<dyn RoleStore>) -> Self {
        Self { roles }
    }

    pub fn authorize(&self, identity: &CallerIdentity) -> bool {
        let granted = identity.roles.iter().any(|name| {
            self.roles
                .role(name)
                .is_some_and(|role| role.grants(Permission::Admin))
        });

        debug!(user = %identity.user_id, granted, "Evaluated admin permission");
        granted
    }
}
