//! Authorization module - role policy engine
//!
//! This module implements the role/permission decision engine:
//! - roles own flat sets of `(action, scope)` grants
//! - scopes target every user, the actor itself (`Self`) or one role
//! - anonymous callers are evaluated against a configurable guest role

mod evaluator;
mod principal;
mod scope;
mod store;

pub use evaluator::{PolicyEvaluator, RolePolicyEvaluator};
pub use principal::{target_scope, Principal, UserVerb};
pub use scope::{GrantScope, Scope, SELF_SCOPE, WILDCARD_SCOPE};
pub use store::{Grant, MemoryRoleStore, RoleGrants, RoleStore};

use crate::errors::AppError;

/// Well-known role names
pub mod roles {
    pub const GUEST: &str = "guest";
    pub const MEMBER: &str = "member";
    pub const ADMIN: &str = "admin";
}

/// Well-known action names
pub mod actions {
    // Acting on one's own record
    pub const SEE: &str = "See";
    pub const UPDATE: &str = "Update";
    pub const DELETE: &str = "Delete";

    // Acting on other users
    pub const SEE_ANY_USER: &str = "SeeAnyUser";
    pub const ADD_USER: &str = "AddUser";
    pub const UPDATE_ANY_USER: &str = "UpdateAnyUser";
    pub const DELETE_ANY_USER: &str = "DeleteAnyUser";
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthzConfig {
    /// Role evaluated for anonymous callers; `None` denies them everything.
    pub guest_role: Option<String>,
    /// Role given to users created without an explicit `role_id`.
    pub default_role: String,
}

impl Default for AuthzConfig {
    fn default() -> Self {
        Self {
            guest_role: Some(roles::GUEST.to_string()),
            default_role: roles::MEMBER.to_string(),
        }
    }
}

impl AuthzConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let guest_role = match std::env::var("GUEST_ROLE") {
            Ok(value) if value.trim().is_empty() => None,
            Ok(value) => Some(value.trim().to_string()),
            Err(_) => Some(roles::GUEST.to_string()),
        };

        let default_role = std::env::var("DEFAULT_USER_ROLE")
            .map(|value| value.trim().to_string())
            .unwrap_or_else(|_| roles::MEMBER.to_string());
        if default_role.is_empty() {
            return Err(AppError::configuration("DEFAULT_USER_ROLE must not be empty"));
        }

        Ok(Self { guest_role, default_role })
    }
}
