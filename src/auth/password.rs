// bcrypt password encoder

use crate::api::PasswordEncoder;
use crate::core::errors::AccountError;
use tracing::warn;

pub struct BcryptPasswordEncoder {
    cost: u32,
}

impl BcryptPasswordEncoder {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }
}

impl PasswordEncoder for BcryptPasswordEncoder {
    fn encode(&self, raw_password: &str) -> Result<String, AccountError> {
        bcrypt::hash(raw_password, self.cost)
            .map_err(|e| AccountError::PasswordError(format!("Failed to hash password: {}", e)))
    }

    fn matches(&self, raw_password: &str, encoded_password: &str) -> bool {
        match bcrypt::verify(raw_password, encoded_password) {
            Ok(matched) => matched,
            Err(e) => {
                warn!(error = %e, "Encoded password does not look like bcrypt");
                false
            }
        }
    }
}
