//! `/api/v1/users` CRUD routes.
//!
//! Every handler asks the authorization engine before touching the database.
//! Target-bearing routes resolve the target first, so a missing user is a 404
//! rather than a denial.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};

use crate::app::AppState;
use crate::authz::{actions, target_scope, Principal, Scope, UserVerb};
use crate::db;
use crate::errors::{AppError, AppResult, ErrorResponse};
use crate::extract::{ApiJson, ApiPath};
use crate::jwt::CurrentActor;
use crate::models::envelope::UsersResponse;
use crate::models::user::{DbUser, UserCreateRequest, UserUpdateRequest};
use crate::utils::{hash_password, require_email, require_text};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/:id", get(get_user).put(update_user).delete(delete_user))
}

#[utoipa::path(
    get,
    path = "/api/v1/users",
    tag = "Users",
    responses(
        (status = 200, description = "All users", body = UsersResponse),
        (status = 401, description = "Not allowed to see users", body = ErrorResponse)
    )
)]
pub async fn list_users(State(state): State<AppState>, actor: CurrentActor) -> AppResult<Json<UsersResponse>> {
    ensure_allowed(&state, actor.principal(), actions::SEE_ANY_USER, &Scope::Any).await?;

    let users = db::users::list_users(&state.pool).await?;
    Ok(Json(UsersResponse::many(users.into_iter().map(Into::into).collect())))
}

#[utoipa::path(
    get,
    path = "/api/v1/users/{id}",
    tag = "Users",
    params(("id" = i64, Path, description = "User id")),
    responses(
        (status = 200, description = "The user", body = UsersResponse),
        (status = 401, description = "Not allowed to see this user", body = ErrorResponse),
        (status = 404, description = "That user does not exist", body = ErrorResponse)
    )
)]
pub async fn get_user(
    State(state): State<AppState>,
    actor: CurrentActor,
    ApiPath(id): ApiPath<i64>,
) -> AppResult<Json<UsersResponse>> {
    let target = fetch_target(&state, id).await?;
    authorize_target(&state, actor.principal(), UserVerb::See, &target).await?;

    Ok(Json(UsersResponse::one(target.into())))
}

#[utoipa::path(
    post,
    path = "/api/v1/users",
    tag = "Users",
    request_body = UserCreateRequest,
    responses(
        (status = 201, description = "User created", body = UsersResponse),
        (status = 400, description = "Malformed payload", body = ErrorResponse),
        (status = 401, description = "Not allowed to add users to this role", body = ErrorResponse),
        (status = 409, description = "Email already in use", body = ErrorResponse)
    )
)]
pub async fn create_user(
    State(state): State<AppState>,
    actor: CurrentActor,
    ApiJson(payload): ApiJson<UserCreateRequest>,
) -> AppResult<(StatusCode, Json<UsersResponse>)> {
    let role_id = match payload.role_id {
        Some(role_id) => role_id,
        None => db::roles::role_id_by_name(&state.pool, &state.authz_config.default_role)
            .await?
            .ok_or_else(|| {
                AppError::configuration(format!(
                    "default role '{}' does not exist",
                    state.authz_config.default_role
                ))
            })?,
    };

    let role_name = state.authz.resolve_role_name(role_id).await?;
    ensure_allowed(&state, actor.principal(), actions::ADD_USER, &Scope::Role(role_name)).await?;

    require_email(&payload.email)?;
    require_text("first_name", &payload.first_name)?;
    require_text("last_name", &payload.last_name)?;

    if db::users::email_taken(&state.pool, &payload.email, None).await? {
        return Err(AppError::conflict("email already in use"));
    }

    let password_hash = hash_password(&payload.password)?;
    let user = db::users::insert_user(&state.pool, &payload, &password_hash, role_id).await?;
    tracing::info!(user_id = user.id, role_id, "user created");

    Ok((StatusCode::CREATED, Json(UsersResponse::one(user.into()))))
}

#[utoipa::path(
    put,
    path = "/api/v1/users/{id}",
    tag = "Users",
    params(("id" = i64, Path, description = "User id")),
    request_body = UserUpdateRequest,
    responses(
        (status = 200, description = "User updated", body = UsersResponse),
        (status = 400, description = "Malformed payload", body = ErrorResponse),
        (status = 401, description = "Not allowed to update this user or assign the role", body = ErrorResponse),
        (status = 404, description = "That user does not exist", body = ErrorResponse),
        (status = 409, description = "Email already in use", body = ErrorResponse)
    )
)]
pub async fn update_user(
    State(state): State<AppState>,
    actor: CurrentActor,
    ApiPath(id): ApiPath<i64>,
    ApiJson(payload): ApiJson<UserUpdateRequest>,
) -> AppResult<Json<UsersResponse>> {
    let target = fetch_target(&state, id).await?;
    let actor = actor.principal();
    authorize_target(&state, actor, UserVerb::Update, &target).await?;

    // moving a user into another role also needs the right to add users to that role
    if let Some(new_role_id) = payload.role_id.filter(|role_id| *role_id != target.role_id) {
        let new_role = state.authz.resolve_role_name(new_role_id).await?;
        ensure_allowed(&state, actor, actions::ADD_USER, &Scope::Role(new_role)).await?;
    }

    if let Some(email) = payload.email.as_deref() {
        require_email(email)?;
        if db::users::email_taken(&state.pool, email, Some(id)).await? {
            return Err(AppError::conflict("email already in use"));
        }
    }
    if let Some(first_name) = payload.first_name.as_deref() {
        require_text("first_name", first_name)?;
    }
    if let Some(last_name) = payload.last_name.as_deref() {
        require_text("last_name", last_name)?;
    }

    let password_hash = payload.password.as_deref().map(hash_password).transpose()?;
    let user = db::users::update_user(&state.pool, id, &payload, password_hash.as_deref())
        .await?
        .ok_or_else(AppError::user_not_found)?;
    tracing::info!(user_id = user.id, "user updated");

    Ok(Json(UsersResponse::one(user.into())))
}

#[utoipa::path(
    delete,
    path = "/api/v1/users/{id}",
    tag = "Users",
    params(("id" = i64, Path, description = "User id")),
    responses(
        (status = 200, description = "User deleted", body = UsersResponse),
        (status = 401, description = "Not allowed to delete this user", body = ErrorResponse),
        (status = 404, description = "That user does not exist", body = ErrorResponse)
    )
)]
pub async fn delete_user(
    State(state): State<AppState>,
    actor: CurrentActor,
    ApiPath(id): ApiPath<i64>,
) -> AppResult<Json<UsersResponse>> {
    let target = fetch_target(&state, id).await?;
    authorize_target(&state, actor.principal(), UserVerb::Delete, &target).await?;

    let user = db::users::delete_user(&state.pool, id)
        .await?
        .ok_or_else(AppError::user_not_found)?;
    tracing::info!(user_id = user.id, "user deleted");

    Ok(Json(UsersResponse::one(user.into())))
}

async fn fetch_target(state: &AppState, id: i64) -> AppResult<DbUser> {
    db::users::find_user(&state.pool, id)
        .await?
        .ok_or_else(AppError::user_not_found)
}

async fn authorize_target(
    state: &AppState,
    actor: Option<&Principal>,
    verb: UserVerb,
    target: &DbUser,
) -> AppResult<()> {
    let role_name = state.authz.resolve_role_name(target.role_id).await?;
    let scope = target_scope(actor, target.id, role_name);
    ensure_allowed(state, actor, verb.action(&scope), &scope).await
}

async fn ensure_allowed(state: &AppState, actor: Option<&Principal>, action: &str, scope: &Scope) -> AppResult<()> {
    if state.authz.can_do(actor, action, scope).await? {
        Ok(())
    } else {
        Err(AppError::permission_denied())
    }
}
