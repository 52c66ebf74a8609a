use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// Public view of a user; the password hash never leaves the database layer.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct User {
    #[schema(example = 1)]
    pub id: i64,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: Option<String>,
    pub home_phone_number: Option<String>,
    pub cell_phone_number: Option<String>,
    pub current_address: Option<String>,
    pub previous_address: Option<String>,
    pub role_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct DbUser {
    pub id: i64,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: Option<String>,
    pub home_phone_number: Option<String>,
    pub cell_phone_number: Option<String>,
    pub current_address: Option<String>,
    pub previous_address: Option<String>,
    pub role_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<DbUser> for User {
    fn from(value: DbUser) -> Self {
        User {
            id: value.id,
            email: value.email,
            first_name: value.first_name,
            last_name: value.last_name,
            date_of_birth: value.date_of_birth,
            home_phone_number: value.home_phone_number,
            cell_phone_number: value.cell_phone_number,
            current_address: value.current_address,
            previous_address: value.previous_address,
            role_id: value.role_id,
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UserCreateRequest {
    #[schema(example = "dignityapps@gmail.com")]
    pub email: String,
    #[schema(example = "test9876")]
    pub password: String,
    #[schema(example = "Dignity")]
    pub first_name: String,
    #[schema(example = "Applications")]
    pub last_name: String,
    #[schema(example = "10/01/1990")]
    pub date_of_birth: Option<String>,
    #[schema(example = "704-885-8342")]
    pub home_phone_number: Option<String>,
    #[schema(example = "704-111-3357")]
    pub cell_phone_number: Option<String>,
    #[schema(example = "1234 Test St., Wilmington NC 28412")]
    pub current_address: Option<String>,
    #[schema(example = "4321 Test Rd., Testville NC 28110")]
    pub previous_address: Option<String>,
    /// Defaults to the configured default role when omitted.
    pub role_id: Option<i64>,
}

/// Partial update; absent fields keep their stored value.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UserUpdateRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    #[schema(example = "Jerry")]
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub date_of_birth: Option<String>,
    pub home_phone_number: Option<String>,
    pub cell_phone_number: Option<String>,
    pub current_address: Option<String>,
    pub previous_address: Option<String>,
    pub role_id: Option<i64>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    #[schema(example = "dignityapps@gmail.com")]
    pub email: String,
    #[schema(example = "test9876")]
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Session {
    pub token: String,
    pub user: User,
}
