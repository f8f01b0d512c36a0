//! Password hashing and bearer tokens.

use anyhow::Result;
use uuid::Uuid;

pub const MIN_PASSWORD_LEN: usize = 8;

/// bcrypt work factor.
pub const HASH_COST: u32 = 10;

/// bcrypt hash in modular crypt format (`$2b$10$...`).
pub fn hash_password(password: &str) -> Result<String> {
    Ok(bcrypt::hash(password, HASH_COST)?)
}

/// A malformed stored hash never verifies.
pub fn verify_password(password: &str, stored: &str) -> bool {
    match bcrypt::verify(password, stored) {
        Ok(valid) => valid,
        Err(e) => {
            tracing::warn!("Unreadable password hash: {}", e);
            false
        }
    }
}

/// Opaque bearer token.
pub fn new_token() -> String {
    Uuid::new_v4().simple().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashed_password_verifies() {
        let stored = hash_password("correct horse").unwrap();
        assert!(verify_password("correct horse", &stored));
        assert!(!verify_password("wrong horse", &stored));
    }

    #[test]
    fn hash_is_bcrypt_with_configured_cost() {
        let stored = hash_password("secret123").unwrap();
        assert!(stored.starts_with("$2b$10$"), "unexpected hash: {}", stored);
    }

    #[test]
    fn same_password_gets_different_salts() {
        assert_ne!(
            hash_password("secret123").unwrap(),
            hash_password("secret123").unwrap()
        );
    }

    #[test]
    fn malformed_hash_never_verifies() {
        assert!(!verify_password("anything", "no-separator"));
        assert!(!verify_password("anything", "salt$deadbeef"));
    }
}
