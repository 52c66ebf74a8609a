//! SQLite-backed role/permission store plus the provisioning queries the CLI uses.

use async_trait::async_trait;
use sqlx::{FromRow, SqlitePool};

use crate::authz::{Grant, GrantScope, RoleGrants, RoleStore, SELF_SCOPE, WILDCARD_SCOPE};
use crate::errors::{AppError, AppResult};

#[derive(Debug, Clone, FromRow)]
struct DbRole {
    id: i64,
    name: String,
}

#[derive(Debug, Clone, FromRow)]
struct DbGrant {
    action: String,
    scope: Option<String>,
}

impl From<DbGrant> for Grant {
    fn from(row: DbGrant) -> Self {
        Grant::new(row.action, GrantScope::parse(row.scope.as_deref()))
    }
}

#[derive(Debug, Clone)]
pub struct SqlRoleStore {
    pool: SqlitePool,
}

impl SqlRoleStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn with_grants(&self, role: Option<DbRole>) -> AppResult<Option<RoleGrants>> {
        let Some(role) = role else {
            return Ok(None);
        };

        let grants = sqlx::query_as::<_, DbGrant>(
            "SELECT action, scope FROM permissions WHERE role_id = ? ORDER BY action, scope",
        )
        .bind(role.id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(RoleGrants {
            id: role.id,
            name: role.name,
            grants: grants.into_iter().map(Grant::from).collect(),
        }))
    }
}

#[async_trait]
impl RoleStore for SqlRoleStore {
    async fn role(&self, id: i64) -> AppResult<Option<RoleGrants>> {
        let role = sqlx::query_as::<_, DbRole>("SELECT id, name FROM roles WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        self.with_grants(role).await
    }

    async fn role_named(&self, name: &str) -> AppResult<Option<RoleGrants>> {
        let role = sqlx::query_as::<_, DbRole>("SELECT id, name FROM roles WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        self.with_grants(role).await
    }
}

pub async fn role_id_by_name(pool: &SqlitePool, name: &str) -> AppResult<Option<i64>> {
    let id = sqlx::query_scalar::<_, i64>("SELECT id FROM roles WHERE name = ?")
        .bind(name)
        .fetch_optional(pool)
        .await?;
    Ok(id)
}

pub async fn list_roles(pool: &SqlitePool) -> AppResult<Vec<RoleGrants>> {
    let store = SqlRoleStore::new(pool.clone());
    let rows = sqlx::query_as::<_, DbRole>("SELECT id, name FROM roles ORDER BY id")
        .fetch_all(pool)
        .await?;

    let mut roles = Vec::with_capacity(rows.len());
    for row in rows {
        if let Some(role) = store.with_grants(Some(row)).await? {
            roles.push(role);
        }
    }
    Ok(roles)
}

pub async fn create_role(pool: &SqlitePool, name: &str) -> AppResult<i64> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::bad_request("role name must not be empty"));
    }
    // scope tokens would be read back as wildcard or self grants
    if name == WILDCARD_SCOPE || name == SELF_SCOPE {
        return Err(AppError::bad_request(format!("'{name}' is reserved and cannot name a role")));
    }
    if role_id_by_name(pool, name).await?.is_some() {
        return Err(AppError::conflict(format!("role '{name}' already exists")));
    }

    let id = sqlx::query("INSERT INTO roles (name) VALUES (?)")
        .bind(name)
        .execute(pool)
        .await?
        .last_insert_rowid();
    Ok(id)
}

/// Adds a grant to the named role. Returns `false` when it was already present.
pub async fn grant(pool: &SqlitePool, role: &str, action: &str, scope: &GrantScope) -> AppResult<bool> {
    let role_id = require_role(pool, role).await?;

    let result = sqlx::query("INSERT OR IGNORE INTO permissions (role_id, action, scope) VALUES (?, ?, ?)")
        .bind(role_id)
        .bind(action)
        .bind(scope.as_stored())
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Removes a grant from the named role. Returns `false` when nothing matched.
pub async fn revoke(pool: &SqlitePool, role: &str, action: &str, scope: &GrantScope) -> AppResult<bool> {
    let role_id = require_role(pool, role).await?;

    let result = match scope {
        GrantScope::All => {
            sqlx::query("DELETE FROM permissions WHERE role_id = ? AND action = ? AND (scope IS NULL OR scope = '*')")
                .bind(role_id)
                .bind(action)
                .execute(pool)
                .await?
        }
        other => {
            sqlx::query("DELETE FROM permissions WHERE role_id = ? AND action = ? AND scope = ?")
                .bind(role_id)
                .bind(action)
                .bind(other.as_stored())
                .execute(pool)
                .await?
        }
    };
    Ok(result.rows_affected() > 0)
}

async fn require_role(pool: &SqlitePool, name: &str) -> AppResult<i64> {
    role_id_by_name(pool, name)
        .await?
        .ok_or_else(|| AppError::not_found(format!("role '{name}' does not exist")))
}
