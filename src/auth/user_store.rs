// MariaDB-backed user storage with an in-memory lookup cache

use crate::api::UserStore;
use crate::core::errors::AccountError;
use crate::core::models::{NewUser, Role, User};
use async_trait::async_trait;
use moka::future::Cache;
use sqlx::{FromRow, MySqlPool};
use std::time::Duration;
use tracing::{debug, info};

const CREATE_USERS_TABLE: &str = "CREATE TABLE IF NOT EXISTS users (
    id BIGINT NOT NULL AUTO_INCREMENT PRIMARY KEY,
    name VARCHAR(255) NOT NULL,
    email VARCHAR(255) NOT NULL UNIQUE,
    password VARCHAR(255) NOT NULL,
    role VARCHAR(32) NOT NULL
)";

/// Database row structure for user lookup
#[derive(FromRow)]
struct UserRow {
    id: i64,
    name: String,
    email: String,
    password: String,
    role: String,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            name: row.name,
            email: row.email,
            password: row.password,
            role: Role::parse_or_default(&row.role),
        }
    }
}

/// Database-backed user store with in-memory caching
pub struct DbUserStore {
    db_pool: MySqlPool,
    cache: Cache<String, User>,
}

impl DbUserStore {
    pub fn new(db_pool: MySqlPool, cache_ttl: Duration) -> Self {
        let cache = Cache::builder()
            .time_to_live(cache_ttl)
            .max_capacity(10_000)
            .build();

        Self { db_pool, cache }
    }

    /// Create the `users` table if it does not exist yet
    pub async fn ensure_schema(&self) -> Result<(), AccountError> {
        sqlx::query(CREATE_USERS_TABLE)
            .execute(&self.db_pool)
            .await
            .map_err(|e| AccountError::DatabaseError(format!("Schema creation failed: {}", e)))?;

        info!("users table ready");
        Ok(())
    }
}

fn is_unique_violation(error: &sqlx::Error) -> bool {
    error
        .as_database_error()
        .map(|db_error| db_error.is_unique_violation())
        .unwrap_or(false)
}

#[async_trait]
impl UserStore for DbUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AccountError> {
        if let Some(cached) = self.cache.get(email).await {
            debug!(email = %email, "User cache hit");
            return Ok(Some(cached));
        }

        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, name, email, password, role FROM users WHERE email = ?",
        )
        .bind(email)
        .fetch_optional(&self.db_pool)
        .await
        .map_err(|e| AccountError::DatabaseError(format!("User lookup failed: {}", e)))?;

        let user = row.map(User::from);

        // Only hits are cached; a miss may be followed by a registration
        if let Some(ref found) = user {
            self.cache.insert(email.to_string(), found.clone()).await;
        }

        Ok(user)
    }

    async fn save(&self, user: NewUser) -> Result<User, AccountError> {
        let result = sqlx::query(
            "INSERT INTO users (name, email, password, role) VALUES (?, ?, ?, ?)",
        )
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role.name())
        .execute(&self.db_pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AccountError::AlreadyExists
            } else {
                AccountError::DatabaseError(format!("User insert failed: {}", e))
            }
        })?;

        self.cache.invalidate(&user.email).await;

        let id = i64::try_from(result.last_insert_id())
            .map_err(|e| AccountError::DatabaseError(format!("Invalid user id: {}", e)))?;

        Ok(User {
            id,
            name: user.name,
            email: user.email,
            password: user.password_hash,
            role: user.role,
        })
    }

    async fn ping(&self) -> Result<(), AccountError> {
        sqlx::query("SELECT 1")
            .execute(&self.db_pool)
            .await
            .map(|_| ())
            .map_err(|e| AccountError::DatabaseError(format!("Database ping failed: {}", e)))
    }
}
