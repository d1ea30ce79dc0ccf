// Domain error types - Secure error handling with no information disclosure

use serde::Serialize;
use thiserror::Error;

/// Category reported to clients in the `errorType` field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExceptionType {
    Authentication,
    Validation,
    Internal,
}

impl ExceptionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExceptionType::Authentication => "AUTHENTICATION",
            ExceptionType::Validation => "VALIDATION",
            ExceptionType::Internal => "INTERNAL",
        }
    }
}

/// Main error type for the account service
#[derive(Error, Debug)]
pub enum AccountError {
    /// Registration with an email that is already taken (HTTP 400)
    #[error("User already Exists")]
    AlreadyExists,

    /// Unknown email or wrong password (HTTP 401)
    #[error("Bad credentials")]
    BadCredentials,

    /// Operation needs a principal but none is attached (HTTP 404)
    #[error("Error occurred")]
    NotAuthenticated,

    /// Protected route reached without a valid token (HTTP 403)
    #[error("Access denied")]
    AccessDenied,

    /// Request body failed validation (HTTP 400)
    #[error("Validation failed: {0}")]
    ValidationError(String),

    /// Token could not be built or signed (HTTP 500)
    #[error("Token error: {0}")]
    TokenError(String),

    /// Password hashing failed (HTTP 500)
    #[error("Password error: {0}")]
    PasswordError(String),

    /// Redis state error (HTTP 500)
    #[error("State error: {0}")]
    StateError(String),

    /// Database error (HTTP 500)
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// Configuration error (HTTP 500)
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// Encrypted configuration value could not be resolved (HTTP 500)
    #[error("Secret error: {0}")]
    SecretError(#[from] SecretError),
}

/// Errors raised while handling `ENC(...)` configuration values
#[derive(Error, Debug)]
pub enum SecretError {
    #[error("Invalid encrypted value: {0}")]
    InvalidFormat(String),

    #[error("Encryptor password is not configured")]
    MissingPassword,

    #[error("Failed to decrypt value")]
    DecryptionFailed,

    #[error("Failed to encrypt value")]
    EncryptionFailed,
}

impl AccountError {
    /// Get HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            AccountError::AlreadyExists => 400,
            AccountError::BadCredentials => 401,
            AccountError::NotAuthenticated => 404,
            AccountError::AccessDenied => 403,
            AccountError::ValidationError(_) => 400,
            AccountError::TokenError(_) => 500,
            AccountError::PasswordError(_) => 500,
            AccountError::StateError(_) => 500,
            AccountError::DatabaseError(_) => 500,
            AccountError::ConfigurationError(_) => 500,
            AccountError::SecretError(_) => 500,
        }
    }

    /// Category reported in the error body
    pub fn error_type(&self) -> ExceptionType {
        match self {
            AccountError::AlreadyExists
            | AccountError::BadCredentials
            | AccountError::NotAuthenticated
            | AccountError::AccessDenied => ExceptionType::Authentication,
            AccountError::ValidationError(_) => ExceptionType::Validation,
            _ => ExceptionType::Internal,
        }
    }

    /// Get user-friendly error message (no sensitive information)
    pub fn user_message(&self) -> String {
        match self {
            AccountError::AlreadyExists
            | AccountError::BadCredentials
            | AccountError::NotAuthenticated
            | AccountError::AccessDenied => self.to_string(),
            AccountError::ValidationError(reason) => reason.clone(),
            AccountError::TokenError(_)
            | AccountError::PasswordError(_)
            | AccountError::StateError(_)
            | AccountError::DatabaseError(_)
            | AccountError::ConfigurationError(_)
            | AccountError::SecretError(_) => "Internal error".to_string(),
        }
    }
}
