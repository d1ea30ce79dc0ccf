// Security event logging

use tracing::{info, warn};

/// Authentication event type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    LoginSucceeded,
    LoginFailed { reason: String },
    TokenAccepted,
    TokenRejected,
    TokenMissing,
    NotAuthorized,
}

impl AuthEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthEvent::LoginSucceeded => "LOGIN_SUCCEEDED",
            AuthEvent::LoginFailed { .. } => "LOGIN_FAILED",
            AuthEvent::TokenAccepted => "TOKEN_ACCEPTED",
            AuthEvent::TokenRejected => "TOKEN_REJECTED",
            AuthEvent::TokenMissing => "TOKEN_MISSING",
            AuthEvent::NotAuthorized => "NOT_AUTHORIZED",
        }
    }
}

/// Audit logger for authentication events
///
/// Events go to the structured log only.
#[derive(Debug, Default)]
pub struct AuditLogger;

impl AuditLogger {
    pub fn new() -> Self {
        Self
    }

    /// Log an authentication event with the user and client address, when known
    pub fn log_auth_event(&self, event: &AuthEvent, email: Option<&str>, client_address: Option<&str>) {
        let event_type = event.as_str();

        match event {
            AuthEvent::LoginSucceeded => {
                info!(event_type, email = ?email, client_address = ?client_address, "Login succeeded");
            }
            AuthEvent::LoginFailed { reason } => {
                warn!(
                    event_type,
                    email = ?email,
                    client_address = ?client_address,
                    reason = %reason,
                    "Login failed"
                );
            }
            AuthEvent::TokenAccepted => {
                info!(event_type, email = ?email, client_address = ?client_address, "token valid");
            }
            AuthEvent::TokenRejected => {
                warn!(event_type, email = ?email, client_address = ?client_address, "token Invalid");
            }
            AuthEvent::TokenMissing => {
                warn!(event_type, client_address = ?client_address, "Token invalid");
            }
            AuthEvent::NotAuthorized => {
                warn!(event_type, client_address = ?client_address, "not authorized");
            }
        }
    }
}
