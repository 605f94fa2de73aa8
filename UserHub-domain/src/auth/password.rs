//! Password hashing with Argon2
//!
//! Hashes are stored in PHC string format, so parameters and salt travel
//! with the hash and verification works across parameter upgrades.

use argon2::password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use tracing::error;

use super::token::SecurityError;

/// Hash a plaintext password into a PHC-format Argon2 string
pub fn hash_password(password: &str) -> Result<String, SecurityError> {
    let salt = SaltString::generate(&mut OsRng);

    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| {
            error!("Failed to hash password: {}", e);
            SecurityError::PasswordHash(e.to_string())
        })?;

    Ok(hash.to_string())
}

/// Verify a plaintext password against a stored PHC-format hash.
/// Returns Ok(false) for a wrong password; Err only for malformed hashes.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, SecurityError> {
    let parsed = PasswordHash::new(hash).map_err(|e| {
        error!("Stored password hash is malformed: {}", e);
        SecurityError::PasswordHash(e.to_string())
    })?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(SecurityError::PasswordHash(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("SecurePassword123!").unwrap();

        // The stored value is a PHC string, not the plaintext
        assert!(hash.starts_with("$argon2"));
        assert_ne!(hash, "SecurePassword123!");

        assert!(verify_password("SecurePassword123!", &hash).unwrap());
        assert!(!verify_password("WrongPassword", &hash).unwrap());
    }

    #[test]
    fn test_same_password_different_hashes() {
        // Fresh salt per hash
        let first = hash_password("SecurePassword123!").unwrap();
        let second = hash_password("SecurePassword123!").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_malformed_hash_is_error() {
        let result = verify_password("anything", "not-a-phc-string");
        assert!(matches!(result, Err(SecurityError::PasswordHash(_))));
    }
}
