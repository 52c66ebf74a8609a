use async_trait::async_trait;

use super::principal::Principal;
use super::scope::Scope;
use super::store::{RoleGrants, RoleStore};
use crate::errors::AppResult;

/// Policy evaluator trait for pluggable authorization logic
#[async_trait]
pub trait PolicyEvaluator: Send + Sync {
    /// Whether `actor` (anonymous when `None`) may perform `action` within `scope`.
    ///
    /// Denials are `Ok(false)`. An `Err` only signals that the role store could not
    /// be read.
    async fn can_do(&self, actor: Option<&Principal>, action: &str, scope: &Scope) -> AppResult<bool>;

    /// Name of the role with `role_id`, or an empty string when no such role exists.
    async fn resolve_role_name(&self, role_id: i64) -> AppResult<String>;
}

/// Role-table evaluator.
///
/// Evaluation order:
/// 1. resolve the actor's role (the guest role for anonymous callers)
/// 2. allow if any grant matches the action and covers the scope
/// 3. deny
#[derive(Debug, Clone)]
pub struct RolePolicyEvaluator<S> {
    store: S,
    guest_role: Option<String>,
}

impl<S: RoleStore> RolePolicyEvaluator<S> {
    pub fn new(store: S) -> Self {
        Self { store, guest_role: None }
    }

    /// Role evaluated for anonymous callers.
    pub fn with_guest_role(mut self, name: Option<String>) -> Self {
        self.guest_role = name.filter(|n| !n.trim().is_empty());
        self
    }

    async fn actor_role(&self, actor: Option<&Principal>) -> AppResult<Option<RoleGrants>> {
        match (actor, &self.guest_role) {
            (Some(principal), _) => self.store.role(principal.role_id).await,
            (None, Some(guest)) => self.store.role_named(guest).await,
            (None, None) => Ok(None),
        }
    }
}

#[async_trait]
impl<S: RoleStore> PolicyEvaluator for RolePolicyEvaluator<S> {
    async fn can_do(&self, actor: Option<&Principal>, action: &str, scope: &Scope) -> AppResult<bool> {
        let user_id = actor.map(|p| p.user_id);

        let Some(role) = self.actor_role(actor).await? else {
            tracing::debug!(user_id = ?user_id, action, scope = %scope, "no role for actor, denied");
            return Ok(false);
        };

        let allowed = role
            .grants
            .iter()
            .any(|grant| grant.action == action && grant.scope.covers(scope));

        tracing::debug!(
            user_id = ?user_id,
            role = %role.name,
            action,
            scope = %scope,
            allowed,
            "authorization decision"
        );

        Ok(allowed)
    }

    async fn resolve_role_name(&self, role_id: i64) -> AppResult<String> {
        match self.store.role(role_id).await? {
            Some(role) => Ok(role.name),
            None => {
                tracing::warn!(role_id, "role not found, scope left unresolved");
                Ok(String::new())
            }
        }
    }
}
