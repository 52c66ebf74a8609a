use std::fmt;

use serde::{Serialize, Serializer};

/// Stored scope text that targets the actor's own record.
pub const SELF_SCOPE: &str = "Self";
/// Stored scope text that targets every record.
pub const WILDCARD_SCOPE: &str = "*";

/// Scope a request asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    /// Collection-level request; any grant for the action satisfies it.
    Any,
    /// The actor is acting on its own record.
    Own,
    /// The target belongs to the named role.
    Role(String),
}

impl Scope {
    pub fn role(name: impl Into<String>) -> Self {
        Scope::Role(name.into())
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Any => f.write_str("any"),
            Scope::Own => f.write_str(SELF_SCOPE),
            Scope::Role(name) => write!(f, "role:{name}"),
        }
    }
}

/// Scope carried by a stored grant.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GrantScope {
    All,
    Own,
    Role(String),
}

impl GrantScope {
    /// Parses the `permissions.scope` column. `NULL`, empty and `*` all mean every target.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            None | Some("") | Some(WILDCARD_SCOPE) => GrantScope::All,
            Some(SELF_SCOPE) => GrantScope::Own,
            Some(name) => GrantScope::Role(name.to_string()),
        }
    }

    pub fn as_stored(&self) -> &str {
        match self {
            GrantScope::All => WILDCARD_SCOPE,
            GrantScope::Own => SELF_SCOPE,
            GrantScope::Role(name) => name,
        }
    }

    pub fn covers(&self, requested: &Scope) -> bool {
        match (self, requested) {
            // an unresolved target role never matches
            (_, Scope::Role(name)) if name.is_empty() => false,
            (_, Scope::Any) => true,
            (GrantScope::All, _) => true,
            (GrantScope::Own, Scope::Own) => true,
            (GrantScope::Role(granted), Scope::Role(name)) => granted == name,
            _ => false,
        }
    }
}

impl fmt::Display for GrantScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_stored())
    }
}

impl Serialize for GrantScope {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            GrantScope::All => serializer.serialize_none(),
            other => serializer.serialize_str(other.as_stored()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_stored_values() {
        assert_eq!(GrantScope::parse(None), GrantScope::All);
        assert_eq!(GrantScope::parse(Some("*")), GrantScope::All);
        assert_eq!(GrantScope::parse(Some("Self")), GrantScope::Own);
        assert_eq!(GrantScope::parse(Some("member")), GrantScope::Role("member".into()));
    }

    #[test]
    fn self_grant_only_covers_own() {
        let grant = GrantScope::Own;
        assert!(grant.covers(&Scope::Own));
        assert!(!grant.covers(&Scope::role("Self")));
        assert!(!grant.covers(&Scope::role("member")));
    }

    #[test]
    fn wildcard_covers_everything_but_unresolved() {
        let grant = GrantScope::All;
        assert!(grant.covers(&Scope::Any));
        assert!(grant.covers(&Scope::Own));
        assert!(grant.covers(&Scope::role("admin")));
        assert!(!grant.covers(&Scope::role("")));
    }

    #[test]
    fn role_grant_matches_exact_name() {
        let grant = GrantScope::Role("member".into());
        assert!(grant.covers(&Scope::role("member")));
        assert!(grant.covers(&Scope::Any));
        assert!(!grant.covers(&Scope::role("admin")));
        assert!(!grant.covers(&Scope::Own));
    }

    #[test]
    fn wildcard_serializes_as_null() {
        assert_eq!(serde_json::to_value(GrantScope::All).unwrap(), serde_json::Value::Null);
        assert_eq!(serde_json::to_value(GrantScope::Own).unwrap(), "Self");
    }
}
