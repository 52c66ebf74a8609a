use std::collections::HashMap;

use async_trait::async_trait;
use serde::Serialize;

use super::scope::GrantScope;
use crate::errors::AppResult;

/// One `(action, scope)` pair held by a role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Grant {
    pub action: String,
    pub scope: GrantScope,
}

impl Grant {
    pub fn new(action: impl Into<String>, scope: GrantScope) -> Self {
        Self { action: action.into(), scope }
    }

    pub fn everywhere(action: impl Into<String>) -> Self {
        Self::new(action, GrantScope::All)
    }

    pub fn on_self(action: impl Into<String>) -> Self {
        Self::new(action, GrantScope::Own)
    }

    pub fn on_role(action: impl Into<String>, role: impl Into<String>) -> Self {
        Self::new(action, GrantScope::Role(role.into()))
    }
}

/// A role with its flattened grant set.
#[derive(Debug, Clone, Serialize)]
pub struct RoleGrants {
    pub id: i64,
    pub name: String,
    pub grants: Vec<Grant>,
}

/// Read-only source of roles and their grants.
#[async_trait]
pub trait RoleStore: Send + Sync {
    async fn role(&self, id: i64) -> AppResult<Option<RoleGrants>>;

    async fn role_named(&self, name: &str) -> AppResult<Option<RoleGrants>>;
}

/// In-memory policy table, keyed by role id.
#[derive(Debug, Clone, Default)]
pub struct MemoryRoleStore {
    roles: HashMap<i64, RoleGrants>,
}

impl MemoryRoleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_role(mut self, id: i64, name: &str, grants: Vec<Grant>) -> Self {
        self.roles.insert(
            id,
            RoleGrants {
                id,
                name: name.to_string(),
                grants,
            },
        );
        self
    }
}

#[async_trait]
impl RoleStore for MemoryRoleStore {
    async fn role(&self, id: i64) -> AppResult<Option<RoleGrants>> {
        Ok(self.roles.get(&id).cloned())
    }

    async fn role_named(&self, name: &str) -> AppResult<Option<RoleGrants>> {
        Ok(self.roles.values().find(|r| r.name == name).cloned())
    }
}
