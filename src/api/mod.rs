// Axum web server layer

use axum::{
    error_handling::HandleErrorLayer,
    http::StatusCode,
    routing::{get, post},
    BoxError, Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::limit::RequestBodyLimitLayer;

pub mod handlers;
pub mod middleware;
pub mod responses;
pub mod socket;
pub mod validation;

use crate::auth::audit_logger::AuditLogger;
use crate::auth::auth_middleware;
use crate::auth::jwt::JwtService;
use crate::core::errors::AccountError;
use crate::core::models::{NewUser, User};
use crate::service::authentication::AuthenticationService;
use socket::SocketHub;

pub use crate::config::Config;

/// Application state containing all shared dependencies
///
/// All components are wrapped in Arc for shared ownership across async tasks.
#[derive(Clone)]
pub struct AppState {
    pub authentication_service: Arc<AuthenticationService>,
    pub jwt_service: Arc<JwtService>,
    pub user_store: Arc<dyn UserStore + Send + Sync>,
    pub token_store: Arc<dyn TokenStore + Send + Sync>,
    pub socket_hub: Arc<SocketHub>,
    pub audit_logger: Arc<AuditLogger>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Wire the services on top of the given stores
    pub fn new(
        config: Arc<Config>,
        user_store: Arc<dyn UserStore + Send + Sync>,
        token_store: Arc<dyn TokenStore + Send + Sync>,
        password_encoder: Arc<dyn PasswordEncoder + Send + Sync>,
    ) -> Result<Self, AccountError> {
        let jwt_service = Arc::new(JwtService::from_config(&config, token_store.clone())?);
        let audit_logger = Arc::new(AuditLogger::new());

        let authentication_service = Arc::new(AuthenticationService::new(
            user_store.clone(),
            password_encoder,
            jwt_service.clone(),
            audit_logger.clone(),
        ));

        Ok(Self {
            authentication_service,
            jwt_service,
            user_store,
            token_store,
            socket_hub: Arc::new(SocketHub::new()),
            audit_logger,
            config,
        })
    }
}

/// Account persistence
#[async_trait::async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AccountError>;
    async fn save(&self, user: NewUser) -> Result<User, AccountError>;
    async fn ping(&self) -> Result<(), AccountError>;
}

/// Active-token registry with per-key expiry
#[async_trait::async_trait]
pub trait TokenStore: Send + Sync {
    async fn save_token(&self, key: &str, token: &str, ttl: Duration) -> Result<(), AccountError>;
    async fn get_token(&self, key: &str) -> Result<Option<String>, AccountError>;
    async fn delete_token(&self, key: &str) -> Result<(), AccountError>;
    async fn ping(&self) -> Result<(), AccountError>;
}

/// One-way password hashing
pub trait PasswordEncoder: Send + Sync {
    fn encode(&self, raw_password: &str) -> Result<String, AccountError>;
    fn matches(&self, raw_password: &str, encoded_password: &str) -> bool;
}

/// Create the Axum router with all routes and middleware
///
/// Middleware stack (outermost to innermost):
/// - Request timeout (tower::timeout)
/// - Tracing (tower-http::trace)
/// - Body size limit (tower-http::limit)
/// - JWT authentication filter - attaches the principal, never rejects
/// - Controller logging
/// - Authentication guard (protected routes only)
pub fn create_router(app_state: AppState) -> Router {
    let public = Router::new()
        .route("/api/account/user", post(handlers::register_handler))
        .route("/api/account/login", post(handlers::authenticate_handler))
        .route("/api/test/hello", get(handlers::socket_hello_handler))
        .route("/api/socket", get(socket::socket_handler))
        .route("/health", get(handlers::health_handler));

    let protected = Router::new()
        .route("/api/account/logout", post(handlers::logout_handler))
        .route("/api/account/me", get(handlers::get_user_handler))
        .route_layer(axum::middleware::from_fn(
            auth_middleware::require_authentication,
        ));

    let body_limit = app_state.config.body_size_limit_bytes;
    let timeout_secs = app_state.config.request_timeout_secs;

    let router = public
        .merge(protected)
        .layer(axum::middleware::from_fn(middleware::controller_logging))
        .layer(axum::middleware::from_fn_with_state(
            app_state.clone(),
            auth_middleware::jwt_authentication_filter,
        ))
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(middleware::tracing_layer());

    // HandleErrorLayer must come BEFORE timeout to catch the timeout error
    let middleware_stack = ServiceBuilder::new()
        .layer(HandleErrorLayer::new(|e: BoxError| async move {
            let status = if e.is::<tower::timeout::error::Elapsed>() {
                StatusCode::REQUEST_TIMEOUT
            } else {
                StatusCode::INTERNAL_SERVER_ERROR
            };
            (status, e.to_string())
        }))
        .timeout(Duration::from_secs(timeout_secs))
        .into_inner();

    router.layer(middleware_stack).with_state(app_state)
}
