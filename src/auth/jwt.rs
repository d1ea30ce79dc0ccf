// JWT issuing and verification backed by the Redis token registry

use crate::api::{Config, TokenStore};
use crate::core::errors::AccountError;
use crate::core::models::User;
use base64::{engine::general_purpose::STANDARD, Engine};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Claims carried by an access token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Username (email)
    pub sub: String,
    /// Issued-at, seconds since epoch
    pub iat: i64,
    /// Expiry, seconds since epoch
    pub exp: i64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Issues HS256 tokens and tracks the active one per user in the token store
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    inspect_validation: Validation,
    expired_after: Duration,
    token_store: Arc<dyn TokenStore + Send + Sync>,
}

impl JwtService {
    /// Create a service from a base64-encoded secret key
    pub fn new(
        secret_key_b64: &str,
        expired_after_ms: u64,
        token_store: Arc<dyn TokenStore + Send + Sync>,
    ) -> Result<Self, AccountError> {
        let key_bytes = STANDARD.decode(secret_key_b64.trim()).map_err(|e| {
            AccountError::ConfigurationError(format!("Signing key is not base64: {}", e))
        })?;

        if key_bytes.len() < crate::config::MIN_SECRET_KEY_BYTES {
            return Err(AccountError::ConfigurationError(format!(
                "Signing key must be at least {} bytes",
                crate::config::MIN_SECRET_KEY_BYTES
            )));
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        // Signature-only check, used to read expiry of tokens that may be expired
        let mut inspect_validation = Validation::new(Algorithm::HS256);
        inspect_validation.validate_exp = false;
        inspect_validation.leeway = 0;

        Ok(Self {
            encoding_key: EncodingKey::from_secret(&key_bytes),
            decoding_key: DecodingKey::from_secret(&key_bytes),
            validation,
            inspect_validation,
            expired_after: Duration::from_millis(expired_after_ms),
            token_store,
        })
    }

    pub fn from_config(
        config: &Config,
        token_store: Arc<dyn TokenStore + Send + Sync>,
    ) -> Result<Self, AccountError> {
        Self::new(
            config.jwt_secret_key.expose_secret(),
            config.jwt_expired_after_ms,
            token_store,
        )
    }

    /// Token lifetime
    pub fn expired_after(&self) -> Duration {
        self.expired_after
    }

    /// Issue a token for `user` with no extra claims
    pub async fn generate_token(&self, user: &User) -> Result<String, AccountError> {
        self.generate_token_with_claims(Map::new(), user).await
    }

    /// Issue a token for `user` and register it as the user's active token
    ///
    /// `sub`, `iat` and `exp` in `extra_claims` are overwritten.
    pub async fn generate_token_with_claims(
        &self,
        mut extra_claims: Map<String, Value>,
        user: &User,
    ) -> Result<String, AccountError> {
        for reserved in ["sub", "iat", "exp"] {
            extra_claims.remove(reserved);
        }

        let now_ms = chrono::Utc::now().timestamp_millis();
        let lifetime_ms = i64::try_from(self.expired_after.as_millis()).unwrap_or(i64::MAX);

        let claims = Claims {
            sub: user.email.clone(),
            iat: now_ms / 1000,
            exp: now_ms.saturating_add(lifetime_ms) / 1000,
            extra: extra_claims,
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AccountError::TokenError(format!("Failed to sign token: {}", e)))?;

        // JWTs cannot be revoked, so the active token lives in Redis until logout or expiry
        self.token_store
            .save_token(&Self::redis_key(&user.email), &token, self.expired_after)
            .await?;

        Ok(token)
    }

    /// Verify a token and return all of its claims
    pub fn extract_claims(&self, token: &str) -> Result<Claims, AccountError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| AccountError::TokenError(format!("Invalid token: {}", e)))
    }

    /// Username (email) of a verified, unexpired token
    pub fn extract_username(&self, token: &str) -> Option<String> {
        match self.extract_claims(token) {
            Ok(claims) => Some(claims.sub),
            Err(e) => {
                debug!(error = %e, "Could not extract username from token");
                None
            }
        }
    }

    /// True when the expiry cannot be read or lies in the past
    pub fn is_token_expired(&self, token: &str) -> bool {
        match decode::<Claims>(token, &self.decoding_key, &self.inspect_validation) {
            Ok(data) => data.claims.exp < chrono::Utc::now().timestamp(),
            Err(_) => true,
        }
    }

    /// A token is valid for `user` when it names the user, has not expired and
    /// the user still has an active token registered (no logout, TTL not elapsed)
    pub async fn is_token_valid(&self, token: &str, user: &User) -> Result<bool, AccountError> {
        let username = match self.extract_username(token) {
            Some(username) => username,
            None => return Ok(false),
        };

        if username != user.email || self.is_token_expired(token) {
            return Ok(false);
        }

        let registered = self
            .token_store
            .get_token(&Self::redis_key(&username))
            .await?;

        Ok(registered.is_some())
    }

    /// Drop the user's active token (logout)
    pub async fn expire_token(&self, email: &str) -> Result<(), AccountError> {
        let key = Self::redis_key(email);
        if self.token_store.get_token(&key).await?.is_some() {
            self.token_store.delete_token(&key).await?;
        }
        Ok(())
    }

    /// Token registry key for a user
    pub fn redis_key(email: &str) -> String {
        format!("JWT_TOKEN:{}", email)
    }
}
