// Unit tests for API handlers

use crate::common::*;
use axum::extract::State;
use axum::http::StatusCode;
use axum::{Extension, Json};
use lifusic_account::api::handlers::*;
use lifusic_account::core::models::{CurrentUser, Role};
use std::sync::atomic::Ordering;

#[tokio::test]
async fn test_health_handler_reports_connected() {
    let ctx = test_context();

    let Json(health) = health_handler(State(ctx.app_state.clone())).await;

    assert_eq!(health.status, "healthy");
    assert_eq!(health.redis, "connected");
    assert_eq!(health.database, "connected");
}

#[tokio::test]
async fn test_health_handler_reports_degraded_redis() {
    let ctx = test_context();
    ctx.token_store.ping_should_fail.store(true, Ordering::SeqCst);

    let Json(health) = health_handler(State(ctx.app_state.clone())).await;

    assert_eq!(health.status, "degraded");
    assert_eq!(health.redis, "disconnected");
    assert_eq!(health.database, "connected");
}

#[tokio::test]
async fn test_health_handler_reports_degraded_database() {
    let ctx = test_context();
    ctx.user_store.ping_should_fail.store(true, Ordering::SeqCst);

    let Json(health) = health_handler(State(ctx.app_state.clone())).await;

    assert_eq!(health.status, "degraded");
    assert_eq!(health.database, "disconnected");
}

#[tokio::test]
async fn test_get_user_handler_without_principal() {
    let ctx = test_context();

    let result = get_user_handler(State(ctx.app_state.clone()), None).await;

    let err = result.unwrap_err();
    assert_eq!(err.status, StatusCode::NOT_FOUND);
    assert_eq!(err.message, "Error occurred");
}

#[tokio::test]
async fn test_get_user_handler_with_principal() {
    let ctx = test_context();
    let user = create_test_user("test@email.com", Role::Customer);

    let Json(response) = get_user_handler(
        State(ctx.app_state.clone()),
        Some(Extension(CurrentUser(user))),
    )
    .await
    .unwrap();

    assert_eq!(response.email, "test@email.com");
    assert_eq!(response.role, "customer");
}

#[tokio::test]
async fn test_logout_handler_without_principal() {
    let ctx = test_context();

    let err = logout_handler(State(ctx.app_state.clone()), None)
        .await
        .unwrap_err();

    assert_eq!(err.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_socket_hello_handler_broadcasts() {
    let ctx = test_context();
    let (_id, mut rx) = ctx.app_state.socket_hub.register().await;

    let body = socket_hello_handler(State(ctx.app_state.clone())).await;

    assert_eq!(body, "OK!");
    assert_eq!(rx.recv().await, Some("hello!!".to_string()));
}
