use std::sync::Arc;
use std::time::Duration;

use axum::http::Method;
use axum::routing::get;
use axum::Router;
use sqlx::SqlitePool;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::authz::{AuthzConfig, PolicyEvaluator, RolePolicyEvaluator};
use crate::db::roles::SqlRoleStore;
use crate::errors::AppError;
use crate::jwt::JwtConfig;
use crate::routes::{auth, health, users};

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub jwt: Arc<JwtConfig>,
    pub authz: Arc<dyn PolicyEvaluator>,
    pub authz_config: Arc<AuthzConfig>,
}

impl AppState {
    /// Wires the role-table evaluator over the database's role store.
    pub fn new(pool: SqlitePool, jwt: JwtConfig, authz_config: AuthzConfig) -> Self {
        let evaluator = RolePolicyEvaluator::new(SqlRoleStore::new(pool.clone()))
            .with_guest_role(authz_config.guest_role.clone());

        Self::with_evaluator(pool, jwt, authz_config, Arc::new(evaluator))
    }

    pub fn with_evaluator(
        pool: SqlitePool,
        jwt: JwtConfig,
        authz_config: AuthzConfig,
        authz: Arc<dyn PolicyEvaluator>,
    ) -> Self {
        Self {
            pool,
            jwt: Arc::new(jwt),
            authz,
            authz_config: Arc::new(authz_config),
        }
    }
}

pub async fn create_app(pool: SqlitePool) -> Result<Router, AppError> {
    let jwt_config = JwtConfig::from_env()?;
    let authz_config = AuthzConfig::from_env()?;
    let state = AppState::new(pool, jwt_config, authz_config);

    Ok(router(state, request_timeout()?))
}

pub fn router(state: AppState, timeout: Duration) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_origin(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/health", get(health::health))
        .nest("/api/v1/auth", auth::routes())
        .nest("/api/v1/users", users::routes())
        .with_state(state)
        .layer(TimeoutLayer::new(timeout))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

fn request_timeout() -> Result<Duration, AppError> {
    let secs = match std::env::var("REQUEST_TIMEOUT_SECS") {
        Ok(value) => value
            .parse::<u64>()
            .map_err(|_| AppError::configuration("REQUEST_TIMEOUT_SECS must be a whole number of seconds"))?,
        Err(_) => DEFAULT_REQUEST_TIMEOUT_SECS,
    };
    Ok(Duration::from_secs(secs))
}
