// Axum authentication middleware

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use std::net::SocketAddr;
use tracing::error;
use crate::api::responses::ApiError;
use crate::api::AppState;
use crate::auth::audit_logger::AuthEvent;
use crate::core::errors::AccountError;
use crate::core::models::CurrentUser;

const BEARER_PREFIX: &str = "Bearer ";

/// JWT authentication filter
///
/// Runs on every request. Resolves the `Bearer` token to a user and attaches
/// it as `CurrentUser` when the token is valid. Never rejects a request;
/// access decisions belong to `require_authentication`.
pub async fn jwt_authentication_filter(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let client_address = client_address(request.headers(), peer);
    let audit = &state.audit_logger;

    // 1. Extract bearer token
    let token = match extract_bearer_token(request.headers()) {
        Some(token) => token,
        None => {
            audit.log_auth_event(&AuthEvent::TokenMissing, None, client_address.as_deref());
            return next.run(request).await;
        }
    };

    // 2. Verify signature and expiry
    let username = match state.jwt_service.extract_username(&token) {
        Some(username) => username,
        None => {
            audit.log_auth_event(&AuthEvent::NotAuthorized, None, client_address.as_deref());
            return next.run(request).await;
        }
    };

    // 3. Resolve the user and check the token registry
    if request.extensions().get::<CurrentUser>().is_none() {
        match state.user_store.find_by_email(&username).await {
            Ok(Some(user)) => match state.jwt_service.is_token_valid(&token, &user).await {
                Ok(true) => {
                    audit.log_auth_event(
                        &AuthEvent::TokenAccepted,
                        Some(&username),
                        client_address.as_deref(),
                    );
                    request.extensions_mut().insert(CurrentUser(user));
                }
                Ok(false) => {
                    audit.log_auth_event(
                        &AuthEvent::TokenRejected,
                        Some(&username),
                        client_address.as_deref(),
                    );
                }
                Err(e) => {
                    error!(error = %e, email = %username, "Token validation failed");
                }
            },
            Ok(None) => {
                audit.log_auth_event(
                    &AuthEvent::TokenRejected,
                    Some(&username),
                    client_address.as_deref(),
                );
            }
            Err(e) => {
                error!(error = %e, email = %username, "User lookup failed");
            }
        }
    }

    next.run(request).await
}

/// Guard for protected routes: 403 unless the filter attached a principal
pub async fn require_authentication(request: Request, next: Next) -> Result<Response, ApiError> {
    if request.extensions().get::<CurrentUser>().is_none() {
        return Err(ApiError::from(AccountError::AccessDenied));
    }

    Ok(next.run(request).await)
}

/// Extract the token from an `Authorization: Bearer <token>` header
fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix(BEARER_PREFIX))
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
}

/// Client address of the request
///
/// The socket peer address wins. Without one, the first hop of
/// `X-Forwarded-For` is used, then `X-Real-IP`.
pub fn client_address(headers: &HeaderMap, peer: Option<SocketAddr>) -> Option<String> {
    if let Some(addr) = peer {
        return Some(addr.ip().to_string());
    }

    let forwarded = headers
        .get("X-Forwarded-For")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|hop| !hop.is_empty());

    forwarded
        .or_else(|| {
            headers
                .get("X-Real-IP")
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|ip| !ip.is_empty())
        })
        .map(str::to_string)
}
