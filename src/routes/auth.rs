use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::app::AppState;
use crate::db;
use crate::errors::{AppError, AppResult, ErrorResponse};
use crate::extract::ApiJson;
use crate::jwt::AuthUser;
use crate::models::envelope::{SessionResponse, UsersResponse};
use crate::models::user::{LoginRequest, Session};
use crate::utils::verify_password;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/me", get(me))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = SessionResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse)
    )
)]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> AppResult<Json<SessionResponse>> {
    let db_user = db::users::find_user_by_email(&state.pool, &payload.email)
        .await?
        .ok_or_else(|| AppError::unauthorized("invalid credentials"))?;

    if !verify_password(&payload.password, &db_user.password_hash)? {
        return Err(AppError::unauthorized("invalid credentials"));
    }

    let token = state.jwt.encode(db_user.id)?;
    tracing::info!(user_id = db_user.id, "login");

    Ok(Json(SessionResponse::new(Session {
        token,
        user: db_user.into(),
    })))
}

#[utoipa::path(
    get,
    path = "/api/v1/auth/me",
    tag = "Auth",
    responses(
        (status = 200, description = "Current user", body = UsersResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse)
    ),
    security(("bearerAuth" = []))
)]
pub async fn me(State(state): State<AppState>, auth: AuthUser) -> AppResult<Json<UsersResponse>> {
    let user = db::users::find_user(&state.pool, auth.user_id)
        .await?
        .ok_or_else(|| AppError::unauthorized("account no longer exists"))?;

    Ok(Json(UsersResponse::one(user.into())))
}
