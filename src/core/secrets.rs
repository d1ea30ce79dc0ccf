// Encrypted configuration values: ENC(...) wrapping, PBKDF2-HMAC-SHA512 + AES-256-GCM

use crate::core::errors::SecretError;
use base64::{engine::general_purpose::STANDARD, Engine};
use ring::aead::{Aad, LessSafeKey, Nonce, UnboundKey, AES_256_GCM, NONCE_LEN};
use ring::pbkdf2;
use ring::rand::{SecureRandom, SystemRandom};
use std::num::NonZeroU32;

const PREFIX: &str = "ENC(";
const SUFFIX: &str = ")";
const SALT_LEN: usize = 16;
const KEY_LEN: usize = 32;
const PBKDF2_ITERATIONS: u32 = 1000;

/// Whether a configuration value is wrapped as `ENC(...)`
pub fn is_encrypted(value: &str) -> bool {
    let trimmed = value.trim();
    trimmed.starts_with(PREFIX) && trimmed.ends_with(SUFFIX)
}

/// Return the plain value, decrypting it first when it is wrapped as `ENC(...)`
///
/// Plain values pass through untouched and do not need a password.
pub fn resolve(value: &str, password: Option<&str>) -> Result<String, SecretError> {
    if !is_encrypted(value) {
        return Ok(value.to_string());
    }

    let password = password
        .filter(|p| !p.is_empty())
        .ok_or(SecretError::MissingPassword)?;

    let trimmed = value.trim();
    let payload = &trimmed[PREFIX.len()..trimmed.len() - SUFFIX.len()];
    decrypt(payload, password)
}

/// Encrypt `plain` and wrap the result as `ENC(...)`
pub fn encrypt_wrapped(plain: &str, password: &str) -> Result<String, SecretError> {
    Ok(format!("{}{}{}", PREFIX, encrypt(plain, password)?, SUFFIX))
}

/// Encrypt a value into `base64(salt || nonce || ciphertext+tag)`
///
/// A fresh random salt and nonce are drawn for every call.
pub fn encrypt(plain: &str, password: &str) -> Result<String, SecretError> {
    let rng = SystemRandom::new();

    let mut salt = [0u8; SALT_LEN];
    rng.fill(&mut salt).map_err(|_| SecretError::EncryptionFailed)?;
    let mut nonce_bytes = [0u8; NONCE_LEN];
    rng.fill(&mut nonce_bytes).map_err(|_| SecretError::EncryptionFailed)?;

    let key = derive_key(password, &salt)?;
    let mut in_out = plain.as_bytes().to_vec();
    key.seal_in_place_append_tag(
        Nonce::assume_unique_for_key(nonce_bytes),
        Aad::empty(),
        &mut in_out,
    )
    .map_err(|_| SecretError::EncryptionFailed)?;

    let mut payload = Vec::with_capacity(SALT_LEN + NONCE_LEN + in_out.len());
    payload.extend_from_slice(&salt);
    payload.extend_from_slice(&nonce_bytes);
    payload.extend_from_slice(&in_out);

    Ok(STANDARD.encode(payload))
}

/// Decrypt a `base64(salt || nonce || ciphertext+tag)` payload
pub fn decrypt(payload: &str, password: &str) -> Result<String, SecretError> {
    let raw = STANDARD
        .decode(payload.trim())
        .map_err(|e| SecretError::InvalidFormat(format!("not base64: {}", e)))?;

    if raw.len() <= SALT_LEN + NONCE_LEN {
        return Err(SecretError::InvalidFormat("payload too short".to_string()));
    }

    let (salt, rest) = raw.split_at(SALT_LEN);
    let (nonce_slice, ciphertext) = rest.split_at(NONCE_LEN);

    let mut nonce_bytes = [0u8; NONCE_LEN];
    nonce_bytes.copy_from_slice(nonce_slice);

    let key = derive_key(password, salt)?;
    let mut in_out = ciphertext.to_vec();
    let plain = key
        .open_in_place(
            Nonce::assume_unique_for_key(nonce_bytes),
            Aad::empty(),
            &mut in_out,
        )
        .map_err(|_| SecretError::DecryptionFailed)?;

    String::from_utf8(plain.to_vec())
        .map_err(|_| SecretError::InvalidFormat("decrypted value is not UTF-8".to_string()))
}

fn derive_key(password: &str, salt: &[u8]) -> Result<LessSafeKey, SecretError> {
    let iterations = NonZeroU32::new(PBKDF2_ITERATIONS).ok_or(SecretError::EncryptionFailed)?;

    let mut key_bytes = [0u8; KEY_LEN];
    pbkdf2::derive(
        pbkdf2::PBKDF2_HMAC_SHA512,
        iterations,
        salt,
        password.as_bytes(),
        &mut key_bytes,
    );

    let unbound = UnboundKey::new(&AES_256_GCM, &key_bytes)
        .map_err(|_| SecretError::EncryptionFailed)?;
    Ok(LessSafeKey::new(unbound))
}
