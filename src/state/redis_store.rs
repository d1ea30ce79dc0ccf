// Redis connection and active-token operations

use crate::api::TokenStore;
use crate::core::errors::AccountError;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};
use std::time::Duration;

/// Redis store for issued JWTs
pub struct RedisStore {
    connection_manager: ConnectionManager,
}

impl RedisStore {
    /// Create a new RedisStore with connection manager
    ///
    /// Retries with linear backoff (3 attempts) and verifies the
    /// connection with PING before returning.
    pub async fn new(redis_url: &str, connect_timeout: Duration) -> Result<Self, AccountError> {
        use tokio::time::sleep;

        const MAX_RETRIES: u32 = 3;
        const INITIAL_DELAY_MS: u64 = 1000;

        let mut connection_errors = Vec::new();

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                let delay_ms = INITIAL_DELAY_MS * attempt as u64; // 1s, 2s
                sleep(Duration::from_millis(delay_ms)).await;
            }

            match Self::try_create_connection(redis_url, connect_timeout).await {
                Ok(store) => match store.ping().await {
                    Ok(_) => {
                        if attempt > 0 {
                            tracing::info!("Redis connection succeeded on attempt {}", attempt + 1);
                        }
                        return Ok(store);
                    }
                    Err(e) => {
                        connection_errors.push(format!("Connection created but ping failed: {}", e));
                    }
                },
                Err(e) => {
                    if attempt < MAX_RETRIES - 1 {
                        tracing::warn!(
                            attempt = attempt + 1,
                            max_attempts = MAX_RETRIES,
                            error = %e,
                            "Redis connection attempt failed, retrying..."
                        );
                    }
                    connection_errors.push(format!("Attempt {} failed: {}", attempt + 1, e));
                }
            }
        }

        Err(AccountError::StateError(format!(
            "Failed to create Redis connection after {} attempts: {}",
            MAX_RETRIES,
            connection_errors.join("; ")
        )))
    }

    async fn try_create_connection(
        redis_url: &str,
        connect_timeout: Duration,
    ) -> Result<Self, AccountError> {
        let client = Client::open(redis_url)
            .map_err(|e| AccountError::StateError(format!("Invalid Redis URL format: {}", e)))?;

        let connection_manager = tokio::time::timeout(connect_timeout, ConnectionManager::new(client))
            .await
            .map_err(|_| {
                AccountError::StateError(format!(
                    "Redis ConnectionManager creation timed out after {}s",
                    connect_timeout.as_secs()
                ))
            })?
            .map_err(|e| {
                AccountError::StateError(format!("Failed to create Redis ConnectionManager: {}", e))
            })?;

        Ok(Self { connection_manager })
    }
}

#[async_trait::async_trait]
impl TokenStore for RedisStore {
    async fn save_token(&self, key: &str, token: &str, ttl: Duration) -> Result<(), AccountError> {
        let mut conn = self.connection_manager.clone();
        let ttl_ms = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1);

        // PSETEX: value and millisecond TTL in one command
        conn.pset_ex::<_, _, ()>(key, token, ttl_ms)
            .await
            .map_err(|e| AccountError::StateError(format!("Failed to store token: {}", e)))
    }

    async fn get_token(&self, key: &str) -> Result<Option<String>, AccountError> {
        let mut conn = self.connection_manager.clone();
        conn.get::<_, Option<String>>(key)
            .await
            .map_err(|e| AccountError::StateError(format!("Failed to read token: {}", e)))
    }

    async fn delete_token(&self, key: &str) -> Result<(), AccountError> {
        let mut conn = self.connection_manager.clone();
        conn.del::<_, ()>(key)
            .await
            .map_err(|e| AccountError::StateError(format!("Failed to delete token: {}", e)))
    }

    /// Ping Redis to check connectivity
    async fn ping(&self) -> Result<(), AccountError> {
        let mut conn = self.connection_manager.clone();
        let result: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| AccountError::StateError(format!("Redis ping failed: {}", e)))?;

        if result == "PONG" {
            Ok(())
        } else {
            Err(AccountError::StateError(format!(
                "Redis ping returned unexpected response: {}",
                result
            )))
        }
    }
}
