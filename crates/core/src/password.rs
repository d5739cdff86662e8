//! Argon2id password hashing behind one small seam. Hashes are stored in PHC
//! string format so parameters and salt travel with the hash.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("password hashing failed: {0}")]
    Hash(String),
}

pub fn hash(password: &SecretString) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.expose_secret().as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|error| PasswordError::Hash(error.to_string()))
}

/// `Ok(false)` for a wrong password; `Err` only for malformed stored hashes.
pub fn verify(password: &SecretString, stored_hash: &str) -> Result<bool, PasswordError> {
    let parsed = PasswordHash::new(stored_hash)
        .map_err(|error| PasswordError::Hash(error.to_string()))?;

    match Argon2::default().verify_password(password.expose_secret().as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(error) => Err(PasswordError::Hash(error.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use secrecy::SecretString;

    use super::{hash, verify};

    #[test]
    fn hash_and_verify_round_trip() {
        let password: SecretString = "correct-horse-battery-staple".to_string().into();
        let stored = hash(&password).expect("hashing succeeds");

        assert!(stored.starts_with("$argon2id$"));
        assert!(verify(&password, &stored).expect("verification runs"));
    }

    #[test]
    fn wrong_password_is_ok_false_not_error() {
        let stored = hash(&"right-password".to_string().into()).expect("hashing succeeds");

        let matched = verify(&"wrong-password".to_string().into(), &stored)
            .expect("verification runs");
        assert!(!matched);
    }

    #[test]
    fn malformed_stored_hash_is_an_error() {
        assert!(verify(&"anything".to_string().into(), "not-a-phc-string").is_err());
    }
}
