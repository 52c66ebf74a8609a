use super::actions;
use super::scope::Scope;

/// Authenticated identity the engine evaluates. Anonymous callers are `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principal {
    pub user_id: i64,
    pub role_id: i64,
}

impl Principal {
    pub fn new(user_id: i64, role_id: i64) -> Self {
        Self { user_id, role_id }
    }
}

/// Operations the route layer performs on an existing user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserVerb {
    See,
    Update,
    Delete,
}

impl UserVerb {
    /// Action name to check for this verb. Acting on oneself uses the plain verb,
    /// anything else uses the `*AnyUser` form.
    pub fn action(self, scope: &Scope) -> &'static str {
        let own = matches!(scope, Scope::Own);
        match (self, own) {
            (UserVerb::See, true) => actions::SEE,
            (UserVerb::See, false) => actions::SEE_ANY_USER,
            (UserVerb::Update, true) => actions::UPDATE,
            (UserVerb::Update, false) => actions::UPDATE_ANY_USER,
            (UserVerb::Delete, true) => actions::DELETE,
            (UserVerb::Delete, false) => actions::DELETE_ANY_USER,
        }
    }
}

/// Scope for acting on an existing user: `Own` when the actor is the target,
/// otherwise the target's role name.
pub fn target_scope(actor: Option<&Principal>, target_id: i64, target_role: String) -> Scope {
    match actor {
        Some(principal) if principal.user_id == target_id => Scope::Own,
        _ => Scope::Role(target_role),
    }
}
