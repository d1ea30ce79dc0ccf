// Middleware for observability

use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// Tracing middleware
///
/// Logs: method, path, status, duration
pub fn tracing_layer() -> TraceLayer<tower_http::classify::SharedClassifier<tower_http::classify::ServerErrorsAsFailures>> {
    TraceLayer::new_for_http()
}

/// Controller logging around every routed handler
///
/// Logs `Controller before` / `Controller after` with the matched route, and
/// `Controller error` when the handler answers with a 4xx or 5xx.
pub async fn controller_logging(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());

    info!(method = %method, route = %route, "Controller before");

    let response = next.run(request).await;
    let status = response.status();

    if status.is_client_error() || status.is_server_error() {
        error!(method = %method, route = %route, status = status.as_u16(), "Controller error");
    }

    info!(method = %method, route = %route, status = status.as_u16(), "Controller after");
    response
}
