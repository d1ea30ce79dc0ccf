// Registration, login, logout and current-user lookup

use crate::api::{PasswordEncoder, UserStore};
use crate::auth::audit_logger::{AuditLogger, AuthEvent};
use crate::auth::jwt::JwtService;
use crate::core::errors::AccountError;
use crate::core::models::{
    AuthenticationRequest, AuthenticationResponse, CommonResponse, GetUserResponse, NewUser,
    RegisterRequest, Role, User,
};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{info, instrument};

// Verified against when the email is unknown; hashed on first use
const UNKNOWN_USER_PASSWORD: &str = "userNotFoundPassword";

pub struct AuthenticationService {
    user_store: Arc<dyn UserStore + Send + Sync>,
    password_encoder: Arc<dyn PasswordEncoder + Send + Sync>,
    jwt_service: Arc<JwtService>,
    audit_logger: Arc<AuditLogger>,
    unknown_user_hash: OnceCell<String>,
}

impl AuthenticationService {
    pub fn new(
        user_store: Arc<dyn UserStore + Send + Sync>,
        password_encoder: Arc<dyn PasswordEncoder + Send + Sync>,
        jwt_service: Arc<JwtService>,
        audit_logger: Arc<AuditLogger>,
    ) -> Self {
        Self {
            user_store,
            password_encoder,
            jwt_service,
            audit_logger,
            unknown_user_hash: OnceCell::new(),
        }
    }

    /// Create an account. Unknown roles fall back to `CUSTOMER`.
    #[instrument(skip_all, fields(email = %request.email))]
    pub async fn register(&self, request: RegisterRequest) -> Result<CommonResponse, AccountError> {
        if self.user_store.find_by_email(&request.email).await?.is_some() {
            return Err(AccountError::AlreadyExists);
        }

        let role = Role::parse_or_default(&request.role);
        let password_hash = self.encode_password(request.password).await?;

        let user = self
            .user_store
            .save(NewUser {
                name: request.name,
                email: request.email,
                password_hash,
                role,
            })
            .await?;

        info!(user_id = user.id, role = %user.role, "User registered");
        Ok(CommonResponse::ok())
    }

    /// Check credentials and issue a token
    #[instrument(skip_all, fields(email = %request.email))]
    pub async fn authenticate(
        &self,
        request: AuthenticationRequest,
        client_address: Option<&str>,
    ) -> Result<AuthenticationResponse, AccountError> {
        let user = match self.user_store.find_by_email(&request.email).await? {
            Some(user) => user,
            None => {
                let dummy_hash = self
                    .unknown_user_hash
                    .get_or_try_init(|| self.encode_password(UNKNOWN_USER_PASSWORD.to_string()))
                    .await?;
                self.password_matches(request.password, dummy_hash.clone()).await?;

                self.audit_logger.log_auth_event(
                    &AuthEvent::LoginFailed { reason: "Unknown email".to_string() },
                    Some(&request.email),
                    client_address,
                );
                return Err(AccountError::BadCredentials);
            }
        };

        if !self.password_matches(request.password, user.password.clone()).await? {
            self.audit_logger.log_auth_event(
                &AuthEvent::LoginFailed { reason: "Password mismatch".to_string() },
                Some(&request.email),
                client_address,
            );
            return Err(AccountError::BadCredentials);
        }

        let token = self.jwt_service.generate_token(&user).await?;

        self.audit_logger
            .log_auth_event(&AuthEvent::LoginSucceeded, Some(&user.email), client_address);

        Ok(AuthenticationResponse { token })
    }

    /// Revoke the principal's active token
    pub async fn logout(&self, principal: Option<&User>) -> Result<CommonResponse, AccountError> {
        let user = principal.ok_or(AccountError::NotAuthenticated)?;

        self.jwt_service.expire_token(&user.email).await?;

        info!(email = %user.email, "User logged out");
        Ok(CommonResponse::ok())
    }

    /// Profile of the principal, if any
    pub fn get_user(&self, principal: Option<&User>) -> Option<GetUserResponse> {
        principal.map(GetUserResponse::from)
    }

    async fn encode_password(&self, raw_password: String) -> Result<String, AccountError> {
        let encoder = self.password_encoder.clone();
        tokio::task::spawn_blocking(move || encoder.encode(&raw_password))
            .await
            .map_err(|e| AccountError::PasswordError(format!("Hashing task failed: {}", e)))?
    }

    async fn password_matches(
        &self,
        raw_password: String,
        encoded_password: String,
    ) -> Result<bool, AccountError> {
        let encoder = self.password_encoder.clone();
        tokio::task::spawn_blocking(move || encoder.matches(&raw_password, &encoded_password))
            .await
            .map_err(|e| AccountError::PasswordError(format!("Verification task failed: {}", e)))
    }
}
