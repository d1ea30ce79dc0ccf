// HTTP request handlers

use crate::api::responses::{ApiError, HealthResponse};
use crate::api::validation::ValidatedJson;
use crate::api::AppState;
use crate::auth::auth_middleware::client_address;
use crate::core::errors::AccountError;
use crate::core::models::{
    AuthenticationRequest, AuthenticationResponse, CommonResponse, CurrentUser, GetUserResponse,
    RegisterRequest,
};
use axum::{
    extract::{ConnectInfo, State},
    http::HeaderMap,
    Extension, Json,
};
use std::net::SocketAddr;
use std::time::Duration;
use tracing::{debug, info, warn};

const HEALTH_PING_TIMEOUT: Duration = Duration::from_millis(500);
const HEALTH_CHECK_TIMEOUT: Duration = Duration::from_millis(800);

/// POST /api/account/user
pub async fn register_handler(
    State(app_state): State<AppState>,
    ValidatedJson(request): ValidatedJson<RegisterRequest>,
) -> Result<Json<CommonResponse>, ApiError> {
    let response = app_state.authentication_service.register(request).await?;
    Ok(Json(response))
}

/// POST /api/account/login
pub async fn authenticate_handler(
    State(app_state): State<AppState>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    ValidatedJson(request): ValidatedJson<AuthenticationRequest>,
) -> Result<Json<AuthenticationResponse>, ApiError> {
    let client = client_address(&headers, connect_info.map(|ConnectInfo(addr)| addr));

    let response = app_state
        .authentication_service
        .authenticate(request, client.as_deref())
        .await?;
    Ok(Json(response))
}

/// POST /api/account/logout
pub async fn logout_handler(
    State(app_state): State<AppState>,
    principal: Option<Extension<CurrentUser>>,
) -> Result<Json<CommonResponse>, ApiError> {
    let user = principal.map(|Extension(CurrentUser(user))| user);

    let response = app_state
        .authentication_service
        .logout(user.as_ref())
        .await?;
    Ok(Json(response))
}

/// GET /api/account/me
pub async fn get_user_handler(
    State(app_state): State<AppState>,
    principal: Option<Extension<CurrentUser>>,
) -> Result<Json<GetUserResponse>, ApiError> {
    let user = principal.map(|Extension(CurrentUser(user))| user);

    app_state
        .authentication_service
        .get_user(user.as_ref())
        .map(Json)
        .ok_or_else(|| ApiError::from(AccountError::NotAuthenticated))
}

/// GET /api/test/hello
///
/// Broadcasts `hello!!` to every connected socket.
pub async fn socket_hello_handler(State(app_state): State<AppState>) -> &'static str {
    info!("hello from web socket controller");
    let delivered = app_state.socket_hub.broadcast("hello!!").await;
    debug!(delivered, "Test broadcast sent");
    "OK!"
}

/// GET /health
///
/// Checks:
/// - Server is running
/// - Redis connectivity
/// - Database connectivity
pub async fn health_handler(State(app_state): State<AppState>) -> Json<HealthResponse> {
    let token_store = app_state.token_store.clone();
    let redis_check = tokio::spawn(async move {
        match tokio::time::timeout(HEALTH_PING_TIMEOUT, token_store.ping()).await {
            Ok(Ok(())) => "connected".to_string(),
            Ok(Err(e)) => {
                warn!(error = %e, "Redis ping failed");
                "disconnected".to_string()
            }
            Err(_) => {
                debug!("Redis ping timed out in health check");
                "slow: timeout".to_string()
            }
        }
    });

    let user_store = app_state.user_store.clone();
    let database_check = tokio::spawn(async move {
        match tokio::time::timeout(HEALTH_PING_TIMEOUT, user_store.ping()).await {
            Ok(Ok(())) => "connected".to_string(),
            Ok(Err(e)) => {
                warn!(error = %e, "Database ping failed");
                "disconnected".to_string()
            }
            Err(_) => {
                debug!("Database ping timed out in health check");
                "slow: timeout".to_string()
            }
        }
    });

    let redis = await_check(redis_check).await;
    let database = await_check(database_check).await;

    let status = if redis == "connected" && database == "connected" {
        "healthy"
    } else {
        "degraded"
    };

    Json(HealthResponse {
        status: status.to_string(),
        redis,
        database,
    })
}

async fn await_check(task: tokio::task::JoinHandle<String>) -> String {
    match tokio::time::timeout(HEALTH_CHECK_TIMEOUT, task).await {
        Ok(Ok(status)) => status,
        Ok(Err(_)) => "slow: task error".to_string(),
        Err(_) => "slow: check timeout".to_string(),
    }
}
