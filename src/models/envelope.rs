use serde::Serialize;
use utoipa::ToSchema;

use super::user::{Session, User};

pub const STATUS_SUCCESS: &str = "good!";
pub const STATUS_FAILURE: &str = "no good :(";

/// `{"status": "good!", "data": [...]}` wrapper returned by the user endpoints.
#[derive(Debug, Serialize, ToSchema)]
pub struct UsersResponse {
    #[schema(example = "good!")]
    pub status: &'static str,
    pub data: Vec<User>,
}

impl UsersResponse {
    pub fn many(data: Vec<User>) -> Self {
        Self { status: STATUS_SUCCESS, data }
    }

    pub fn one(user: User) -> Self {
        Self::many(vec![user])
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SessionResponse {
    #[schema(example = "good!")]
    pub status: &'static str,
    pub data: Session,
}

impl SessionResponse {
    pub fn new(data: Session) -> Self {
        Self { status: STATUS_SUCCESS, data }
    }
}
