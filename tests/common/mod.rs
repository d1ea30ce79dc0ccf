// Common test utilities and helpers for all test modules
#![allow(dead_code)]

use lifusic_account::api::{AppState, PasswordEncoder, TokenStore, UserStore};
use lifusic_account::config::Config;
use lifusic_account::core::errors::AccountError;
use lifusic_account::core::models::{NewUser, Role, User};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// In-memory UserStore keyed by email
#[derive(Default)]
pub struct InMemoryUserStore {
    pub users: Mutex<HashMap<String, User>>,
    next_id: AtomicI64,
    pub find_should_fail: AtomicBool,
    pub ping_should_fail: AtomicBool,
}

impl InMemoryUserStore {
    pub async fn insert(&self, user: User) {
        self.users.lock().await.insert(user.email.clone(), user);
    }

    pub async fn get(&self, email: &str) -> Option<User> {
        self.users.lock().await.get(email).cloned()
    }
}

#[async_trait::async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AccountError> {
        if self.find_should_fail.load(Ordering::SeqCst) {
            return Err(AccountError::DatabaseError("connection refused".to_string()));
        }
        Ok(self.users.lock().await.get(email).cloned())
    }

    async fn save(&self, user: NewUser) -> Result<User, AccountError> {
        let mut users = self.users.lock().await;
        if users.contains_key(&user.email) {
            return Err(AccountError::AlreadyExists);
        }

        let saved = User {
            id: self.next_id.fetch_add(1, Ordering::SeqCst) + 1,
            name: user.name,
            email: user.email,
            password: user.password_hash,
            role: user.role,
        };
        users.insert(saved.email.clone(), saved.clone());
        Ok(saved)
    }

    async fn ping(&self) -> Result<(), AccountError> {
        if self.ping_should_fail.load(Ordering::SeqCst) {
            return Err(AccountError::DatabaseError("connection refused".to_string()));
        }
        Ok(())
    }
}

/// In-memory TokenStore; TTLs are recorded, not enforced
#[derive(Default)]
pub struct InMemoryTokenStore {
    pub tokens: Mutex<HashMap<String, (String, Duration)>>,
    pub ping_should_fail: AtomicBool,
}

impl InMemoryTokenStore {
    pub async fn token_for(&self, email: &str) -> Option<String> {
        self.tokens
            .lock()
            .await
            .get(&format!("JWT_TOKEN:{}", email))
            .map(|(token, _)| token.clone())
    }

    pub async fn ttl_for(&self, email: &str) -> Option<Duration> {
        self.tokens
            .lock()
            .await
            .get(&format!("JWT_TOKEN:{}", email))
            .map(|(_, ttl)| *ttl)
    }
}

#[async_trait::async_trait]
impl TokenStore for InMemoryTokenStore {
    async fn save_token(&self, key: &str, token: &str, ttl: Duration) -> Result<(), AccountError> {
        self.tokens
            .lock()
            .await
            .insert(key.to_string(), (token.to_string(), ttl));
        Ok(())
    }

    async fn get_token(&self, key: &str) -> Result<Option<String>, AccountError> {
        Ok(self.tokens.lock().await.get(key).map(|(token, _)| token.clone()))
    }

    async fn delete_token(&self, key: &str) -> Result<(), AccountError> {
        self.tokens.lock().await.remove(key);
        Ok(())
    }

    async fn ping(&self) -> Result<(), AccountError> {
        if self.ping_should_fail.load(Ordering::SeqCst) {
            return Err(AccountError::StateError("Redis connection failed".to_string()));
        }
        Ok(())
    }
}

/// Reversible encoder so tests can tell hashed from raw passwords
pub struct PlainPasswordEncoder;

pub const ENCODED_PREFIX: &str = "{plain}";

impl PasswordEncoder for PlainPasswordEncoder {
    fn encode(&self, raw_password: &str) -> Result<String, AccountError> {
        Ok(format!("{}{}", ENCODED_PREFIX, raw_password))
    }

    fn matches(&self, raw_password: &str, encoded_password: &str) -> bool {
        encoded_password
            .strip_prefix(ENCODED_PREFIX)
            .map(|raw| raw == raw_password)
            .unwrap_or(false)
    }
}

/// PlainPasswordEncoder that counts its calls
#[derive(Default)]
pub struct CountingPasswordEncoder {
    pub encode_calls: AtomicUsize,
    pub matches_calls: AtomicUsize,
}

impl PasswordEncoder for CountingPasswordEncoder {
    fn encode(&self, raw_password: &str) -> Result<String, AccountError> {
        self.encode_calls.fetch_add(1, Ordering::SeqCst);
        PlainPasswordEncoder.encode(raw_password)
    }

    fn matches(&self, raw_password: &str, encoded_password: &str) -> bool {
        self.matches_calls.fetch_add(1, Ordering::SeqCst);
        PlainPasswordEncoder.matches(raw_password, encoded_password)
    }
}

/// Fakes plus the AppState wired on top of them
pub struct TestContext {
    pub app_state: AppState,
    pub user_store: Arc<InMemoryUserStore>,
    pub token_store: Arc<InMemoryTokenStore>,
}

pub fn test_context() -> TestContext {
    test_context_with_encoder(Arc::new(PlainPasswordEncoder))
}

pub fn test_context_with_encoder(
    password_encoder: Arc<dyn PasswordEncoder + Send + Sync>,
) -> TestContext {
    let user_store = Arc::new(InMemoryUserStore::default());
    let token_store = Arc::new(InMemoryTokenStore::default());

    let app_state = AppState::new(
        Arc::new(Config::test_config()),
        user_store.clone(),
        token_store.clone(),
        password_encoder,
    )
    .expect("test AppState");

    TestContext {
        app_state,
        user_store,
        token_store,
    }
}

/// Existing account with password "1234"
pub fn create_test_user(email: &str, role: Role) -> User {
    User {
        id: 1,
        name: "test".to_string(),
        email: email.to_string(),
        password: format!("{}1234", ENCODED_PREFIX),
        role,
    }
}
