#![allow(dead_code)]

use std::sync::{Arc, OnceLock};

use anyhow::Context;
use axum::body::{self, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::Value;
use sqlx::SqlitePool;
use tower::util::ServiceExt; // for `oneshot`

use users_api::create_app;
use users_api::jwt::JwtConfig;

pub const SECRET: &str = "test-secret";
pub const PASSWORD: &str = "password123";

pub async fn app(pool: &SqlitePool) -> anyhow::Result<Router> {
    std::env::set_var("JWT_SECRET", SECRET);
    Ok(create_app(pool.clone()).await?)
}

pub fn token_for(user_id: i64) -> String {
    let jwt = JwtConfig {
        secret: Arc::new(SECRET.as_bytes().to_vec()),
        exp_hours: 1,
    };
    jwt.encode(user_id).expect("token encodes")
}

pub async fn role_id(pool: &SqlitePool, name: &str) -> anyhow::Result<i64> {
    users_api::db::roles::role_id_by_name(pool, name)
        .await?
        .with_context(|| format!("role {name} missing"))
}

fn password_hash() -> &'static str {
    static HASH: OnceLock<String> = OnceLock::new();
    HASH.get_or_init(|| users_api::utils::hash_password(PASSWORD).expect("hash"))
}

/// Inserts a user with role `role` straight into the table and returns its id.
pub async fn insert_user(pool: &SqlitePool, email: &str, role: &str) -> anyhow::Result<i64> {
    let role_id = role_id(pool, role).await?;
    let now = chrono::Utc::now();

    let id = sqlx::query(
        "INSERT INTO users (email, password_hash, first_name, last_name, role_id, created_at, updated_at) \
         VALUES (?, ?, 'Test', 'User', ?, ?, ?)",
    )
    .bind(email)
    .bind(password_hash())
    .bind(role_id)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?
    .last_insert_rowid();

    Ok(id)
}

pub async fn user_count(pool: &SqlitePool) -> anyhow::Result<i64> {
    Ok(sqlx::query_scalar("SELECT COUNT(1) FROM users").fetch_one(pool).await?)
}

pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> anyhow::Result<(StatusCode, Value)> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    let body = match body {
        Some(value) => {
            builder = builder.header("content-type", "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };

    let resp = app.clone().oneshot(builder.body(body)?).await?;
    let status = resp.status();
    let bytes = body::to_bytes(resp.into_body(), 10_485_760).await?;
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)
            .with_context(|| format!("non-JSON body: {}", String::from_utf8_lossy(&bytes)))?
    };

    Ok((status, value))
}

pub const USER_KEYS: [&str; 12] = [
    "id",
    "email",
    "first_name",
    "last_name",
    "date_of_birth",
    "home_phone_number",
    "cell_phone_number",
    "current_address",
    "previous_address",
    "role_id",
    "created_at",
    "updated_at",
];

pub fn assert_user_shape(user: &Value) {
    let obj = user.as_object().expect("user must be an object");
    for key in USER_KEYS {
        assert!(obj.contains_key(key), "user missing key '{}': {}", key, user);
    }
    assert!(!obj.contains_key("password_hash"), "password hash leaked: {}", user);
    assert!(!obj.contains_key("password"), "password leaked: {}", user);
}
