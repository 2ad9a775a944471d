//! # ra-auth-simple
//!
//! Argon2-based implementation of `AuthProvider`.
//! Handles password hashing for accounts and random tokens for sessions and CSRF.

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use base64::Engine;
use ra_core::traits::AuthProvider;

/// Bytes of OS randomness behind every session or CSRF token.
const TOKEN_BYTES: usize = 32;

#[derive(Default)]
pub struct SimpleAuthProvider {
    argon2: Argon2<'static>,
}

impl SimpleAuthProvider {
    pub fn new() -> Self {
        Self::default()
    }
}

fn random_bytes<const N: usize>() -> anyhow::Result<[u8; N]> {
    let mut buf = [0u8; N];
    getrandom::getrandom(&mut buf).map_err(|e| anyhow::anyhow!("OS randomness unavailable: {e}"))?;
    Ok(buf)
}

impl AuthProvider for SimpleAuthProvider {
    /// Hashes with a fresh 16-byte salt. Output is a PHC string.
    fn hash_password(&self, password: &str) -> anyhow::Result<String> {
        let salt = SaltString::encode_b64(&random_bytes::<16>()?)
            .map_err(|e| anyhow::anyhow!("salt encoding failed: {e}"))?;
        let hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| anyhow::anyhow!("password hashing failed: {e}"))?;
        Ok(hash.to_string())
    }

    /// Verifies if a provided password matches a stored Argon2 hash.
    fn verify_password(&self, password: &str, hash: &str) -> bool {
        let parsed_hash = match PasswordHash::new(hash) {
            Ok(p) => p,
            Err(_) => return false,
        };
        self.argon2
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok()
    }

    /// URL-safe base64 of 32 random bytes (43 characters, no padding).
    fn generate_token(&self) -> anyhow::Result<String> {
        let bytes = random_bytes::<TOKEN_BYTES>()?;
        Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify() {
        let auth = SimpleAuthProvider::new();
        let hash = auth.hash_password("hunter22").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(auth.verify_password("hunter22", &hash));
        assert!(!auth.verify_password("hunter23", &hash));
    }

    #[test]
    fn hashes_are_salted() {
        let auth = SimpleAuthProvider::new();
        assert_ne!(auth.hash_password("same").unwrap(), auth.hash_password("same").unwrap());
    }

    #[test]
    fn garbage_hash_never_verifies() {
        let auth = SimpleAuthProvider::new();
        assert!(!auth.verify_password("anything", "not-a-phc-string"));
    }

    #[test]
    fn tokens_are_unique_and_url_safe() {
        let auth = SimpleAuthProvider::new();
        let a = auth.generate_token().unwrap();
        let b = auth.generate_token().unwrap();
        assert_ne!(a, b);
        assert_eq!(a.len(), 43);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }
}
