use sqlx::SqlitePool;

use crate::errors::{AppError, AppResult};
use crate::models::user::{DbUser, UserCreateRequest, UserUpdateRequest};
use crate::utils::utc_now;

const USER_COLUMNS: &str = "id, email, password_hash, first_name, last_name, date_of_birth, home_phone_number, \
     cell_phone_number, current_address, previous_address, role_id, created_at, updated_at";

pub async fn list_users(pool: &SqlitePool) -> AppResult<Vec<DbUser>> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY id");
    let users = sqlx::query_as::<_, DbUser>(&sql).fetch_all(pool).await?;
    Ok(users)
}

pub async fn find_user(pool: &SqlitePool, id: i64) -> AppResult<Option<DbUser>> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?");
    let user = sqlx::query_as::<_, DbUser>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(user)
}

pub async fn find_user_by_email(pool: &SqlitePool, email: &str) -> AppResult<Option<DbUser>> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?");
    let user = sqlx::query_as::<_, DbUser>(&sql)
        .bind(email)
        .fetch_optional(pool)
        .await?;
    Ok(user)
}

/// Whether `email` belongs to a user other than `except`.
pub async fn email_taken(pool: &SqlitePool, email: &str, except: Option<i64>) -> AppResult<bool> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(1) FROM users WHERE email = ? AND id IS NOT ?")
        .bind(email)
        .bind(except)
        .fetch_one(pool)
        .await?;
    Ok(count > 0)
}

pub async fn insert_user(
    pool: &SqlitePool,
    payload: &UserCreateRequest,
    password_hash: &str,
    role_id: i64,
) -> AppResult<DbUser> {
    let now = utc_now();

    let id = sqlx::query(
        "INSERT INTO users (email, password_hash, first_name, last_name, date_of_birth, home_phone_number, \
         cell_phone_number, current_address, previous_address, role_id, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&payload.email)
    .bind(password_hash)
    .bind(&payload.first_name)
    .bind(&payload.last_name)
    .bind(&payload.date_of_birth)
    .bind(&payload.home_phone_number)
    .bind(&payload.cell_phone_number)
    .bind(&payload.current_address)
    .bind(&payload.previous_address)
    .bind(role_id)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .map_err(email_conflict)?
    .last_insert_rowid();

    fetch_existing(pool, id).await
}

/// Applies the present fields of `changes`. Returns `None` when the user is gone.
pub async fn update_user(
    pool: &SqlitePool,
    id: i64,
    changes: &UserUpdateRequest,
    password_hash: Option<&str>,
) -> AppResult<Option<DbUser>> {
    let result = sqlx::query(
        "UPDATE users SET \
           email = COALESCE(?, email), \
           password_hash = COALESCE(?, password_hash), \
           first_name = COALESCE(?, first_name), \
           last_name = COALESCE(?, last_name), \
           date_of_birth = COALESCE(?, date_of_birth), \
           home_phone_number = COALESCE(?, home_phone_number), \
           cell_phone_number = COALESCE(?, cell_phone_number), \
           current_address = COALESCE(?, current_address), \
           previous_address = COALESCE(?, previous_address), \
           role_id = COALESCE(?, role_id), \
           updated_at = ? \
         WHERE id = ?",
    )
    .bind(&changes.email)
    .bind(password_hash)
    .bind(&changes.first_name)
    .bind(&changes.last_name)
    .bind(&changes.date_of_birth)
    .bind(&changes.home_phone_number)
    .bind(&changes.cell_phone_number)
    .bind(&changes.current_address)
    .bind(&changes.previous_address)
    .bind(changes.role_id)
    .bind(utc_now())
    .bind(id)
    .execute(pool)
    .await
    .map_err(email_conflict)?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }

    find_user(pool, id).await
}

/// Deletes the user and returns the removed row.
pub async fn delete_user(pool: &SqlitePool, id: i64) -> AppResult<Option<DbUser>> {
    let Some(user) = find_user(pool, id).await? else {
        return Ok(None);
    };

    let result = sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    Ok((result.rows_affected() > 0).then_some(user))
}

async fn fetch_existing(pool: &SqlitePool, id: i64) -> AppResult<DbUser> {
    find_user(pool, id)
        .await?
        .ok_or_else(|| AppError::internal(format!("user {id} vanished after insert")))
}

// the email index is the only unique constraint these writes can hit
fn email_conflict(err: sqlx::Error) -> AppError {
    match err {
        sqlx::Error::Database(db) if db.is_unique_violation() => AppError::conflict("email already in use"),
        other => AppError::Database(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::roles::role_id_by_name;

    fn signup(email: &str) -> UserCreateRequest {
        UserCreateRequest {
            email: email.to_string(),
            password: "password123".to_string(),
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            date_of_birth: None,
            home_phone_number: None,
            cell_phone_number: None,
            current_address: None,
            previous_address: None,
            role_id: None,
        }
    }

    #[sqlx::test]
    async fn duplicate_insert_is_a_conflict(pool: SqlitePool) {
        let member = role_id_by_name(&pool, "member").await.unwrap().unwrap();

        insert_user(&pool, &signup("dup@example.com"), "hash", member).await.unwrap();
        let err = insert_user(&pool, &signup("dup@example.com"), "hash", member)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)), "{err:?}");

        let count: i64 = sqlx::query_scalar("SELECT COUNT(1) FROM users").fetch_one(&pool).await.unwrap();
        assert_eq!(count, 1);
    }

    #[sqlx::test]
    async fn update_onto_taken_email_is_a_conflict(pool: SqlitePool) {
        let member = role_id_by_name(&pool, "member").await.unwrap().unwrap();
        insert_user(&pool, &signup("first@example.com"), "hash", member).await.unwrap();
        let second = insert_user(&pool, &signup("second@example.com"), "hash", member).await.unwrap();

        let changes = UserUpdateRequest {
            email: Some("first@example.com".to_string()),
            ..Default::default()
        };
        let err = update_user(&pool, second.id, &changes, None).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)), "{err:?}");

        let unchanged = find_user(&pool, second.id).await.unwrap().unwrap();
        assert_eq!(unchanged.email, "second@example.com");
    }

    #[sqlx::test]
    async fn other_failures_stay_database_errors(pool: SqlitePool) {
        // unknown role trips the foreign key, not the email index
        let err = insert_user(&pool, &signup("fk@example.com"), "hash", 4242).await.unwrap_err();
        assert!(matches!(err, AppError::Database(_)), "{err:?}");
    }
}
