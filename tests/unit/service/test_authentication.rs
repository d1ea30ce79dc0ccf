// Unit tests for AuthenticationService

use crate::common::*;
use lifusic_account::core::errors::AccountError;
use lifusic_account::core::models::{AuthenticationRequest, RegisterRequest, Role};
use std::sync::atomic::Ordering;
use std::sync::Arc;

fn register_request(email: &str, role: &str) -> RegisterRequest {
    RegisterRequest {
        name: "test".to_string(),
        email: email.to_string(),
        role: role.to_string(),
        password: "1234".to_string(),
    }
}

fn login_request(email: &str, password: &str) -> AuthenticationRequest {
    AuthenticationRequest {
        email: email.to_string(),
        password: password.to_string(),
    }
}

#[tokio::test]
async fn test_register_with_already_existing_email() {
    let ctx = test_context();
    ctx.user_store
        .insert(create_test_user("test@email.com", Role::Admin))
        .await;

    let result = ctx
        .app_state
        .authentication_service
        .register(register_request("test@email.com", "admin"))
        .await;

    match result {
        Err(e @ AccountError::AlreadyExists) => {
            assert_eq!(e.status_code(), 400);
            assert_eq!(e.error_type().as_str(), "AUTHENTICATION");
        }
        other => panic!("expected AlreadyExists, got {:?}", other),
    }
}

#[tokio::test]
async fn test_register_stores_hashed_password() {
    let ctx = test_context();

    let response = ctx
        .app_state
        .authentication_service
        .register(register_request("test@email.com", "admin"))
        .await
        .unwrap();

    assert!(response.success);

    let stored = ctx.user_store.get("test@email.com").await.unwrap();
    assert_eq!(stored.name, "test");
    assert_eq!(stored.role, Role::Admin);
    assert_ne!(stored.password, "1234");
    assert_eq!(stored.password, format!("{}1234", ENCODED_PREFIX));
}

#[tokio::test]
async fn test_register_unknown_role_falls_back_to_customer() {
    let ctx = test_context();

    ctx.app_state
        .authentication_service
        .register(register_request("test@email.com", "superuser"))
        .await
        .unwrap();

    let stored = ctx.user_store.get("test@email.com").await.unwrap();
    assert_eq!(stored.role, Role::Customer);
}

#[tokio::test]
async fn test_register_propagates_store_failure() {
    let ctx = test_context();
    ctx.user_store
        .find_should_fail
        .store(true, std::sync::atomic::Ordering::SeqCst);

    let result = ctx
        .app_state
        .authentication_service
        .register(register_request("test@email.com", "admin"))
        .await;

    assert!(matches!(result, Err(AccountError::DatabaseError(_))));
}

#[tokio::test]
async fn test_authenticate_with_wrong_password() {
    let ctx = test_context();
    ctx.user_store
        .insert(create_test_user("test@email.com", Role::Admin))
        .await;

    let result = ctx
        .app_state
        .authentication_service
        .authenticate(login_request("test@email.com", "12345"), Some("127.0.0.1"))
        .await;

    match result {
        Err(e @ AccountError::BadCredentials) => assert_eq!(e.status_code(), 401),
        other => panic!("expected BadCredentials, got {:?}", other),
    }
    assert!(ctx.token_store.token_for("test@email.com").await.is_none());
}

#[tokio::test]
async fn test_authenticate_with_unknown_email() {
    let ctx = test_context();

    let result = ctx
        .app_state
        .authentication_service
        .authenticate(login_request("nobody@email.com", "1234"), None)
        .await;

    assert!(matches!(result, Err(AccountError::BadCredentials)));
}

#[tokio::test]
async fn test_unknown_email_still_verifies_a_password() {
    let encoder = Arc::new(CountingPasswordEncoder::default());
    let ctx = test_context_with_encoder(encoder.clone());
    let service = &ctx.app_state.authentication_service;

    let result = service
        .authenticate(login_request("nobody@email.com", "1234"), None)
        .await;
    assert!(matches!(result, Err(AccountError::BadCredentials)));
    assert_eq!(encoder.matches_calls.load(Ordering::SeqCst), 1);
    assert_eq!(encoder.encode_calls.load(Ordering::SeqCst), 1);

    // The placeholder hash is computed once and reused
    let result = service
        .authenticate(login_request("other@email.com", "1234"), None)
        .await;
    assert!(matches!(result, Err(AccountError::BadCredentials)));
    assert_eq!(encoder.matches_calls.load(Ordering::SeqCst), 2);
    assert_eq!(encoder.encode_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_known_email_verifies_once() {
    let encoder = Arc::new(CountingPasswordEncoder::default());
    let ctx = test_context_with_encoder(encoder.clone());
    ctx.user_store
        .insert(create_test_user("test@email.com", Role::Admin))
        .await;

    let result = ctx
        .app_state
        .authentication_service
        .authenticate(login_request("test@email.com", "wrong"), None)
        .await;

    assert!(matches!(result, Err(AccountError::BadCredentials)));
    assert_eq!(encoder.matches_calls.load(Ordering::SeqCst), 1);
    assert_eq!(encoder.encode_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_authenticate_issues_and_stores_token() {
    let ctx = test_context();
    ctx.user_store
        .insert(create_test_user("test@email.com", Role::Admin))
        .await;

    let response = ctx
        .app_state
        .authentication_service
        .authenticate(login_request("test@email.com", "1234"), None)
        .await
        .unwrap();

    assert_eq!(
        ctx.app_state.jwt_service.extract_username(&response.token),
        Some("test@email.com".to_string())
    );
    assert_eq!(
        ctx.token_store.token_for("test@email.com").await,
        Some(response.token)
    );
    assert_eq!(
        ctx.token_store.ttl_for("test@email.com").await,
        Some(std::time::Duration::from_millis(3_600_000))
    );
}

#[tokio::test]
async fn test_logout_without_principal() {
    let ctx = test_context();

    let result = ctx.app_state.authentication_service.logout(None).await;

    match result {
        Err(e @ AccountError::NotAuthenticated) => {
            assert_eq!(e.status_code(), 404);
            assert_eq!(e.user_message(), "Error occurred");
        }
        other => panic!("expected NotAuthenticated, got {:?}", other),
    }
}

#[tokio::test]
async fn test_logout_removes_token() {
    let ctx = test_context();
    let user = create_test_user("test@email.com", Role::Admin);
    ctx.user_store.insert(user.clone()).await;

    let service = &ctx.app_state.authentication_service;
    let login = service
        .authenticate(login_request("test@email.com", "1234"), None)
        .await
        .unwrap();
    assert!(ctx.app_state.jwt_service.is_token_valid(&login.token, &user).await.unwrap());

    let response = service.logout(Some(&user)).await.unwrap();

    assert!(response.success);
    assert!(ctx.token_store.token_for("test@email.com").await.is_none());
    assert!(!ctx.app_state.jwt_service.is_token_valid(&login.token, &user).await.unwrap());
}

#[tokio::test]
async fn test_get_user_without_principal() {
    let ctx = test_context();
    assert!(ctx.app_state.authentication_service.get_user(None).is_none());
}

#[tokio::test]
async fn test_get_user_with_principal() {
    let ctx = test_context();
    let user = create_test_user("test@email.com", Role::Admin);

    let response = ctx
        .app_state
        .authentication_service
        .get_user(Some(&user))
        .unwrap();

    assert_eq!(response.id, 1);
    assert_eq!(response.email, "test@email.com");
    assert_eq!(response.name, "test");
    assert_eq!(response.role, "admin");
}
