//! Argon2id implementation of the [`CredentialHasher`] port.
//!
//! Hashes are stored as PHC strings, so parameters and salt travel with the
//! hash and verification needs no extra configuration.

use argon2::password_hash::SaltString;
use argon2::password_hash::rand_core::OsRng;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};

use crate::domain::ports::{CredentialHashError, CredentialHasher};

/// Argon2 with the crate's default parameters.
#[derive(Clone, Default)]
pub struct Argon2Hasher {
    argon2: Argon2<'static>,
}

impl Argon2Hasher {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CredentialHasher for Argon2Hasher {
    fn hash(&self, password: &str) -> Result<String, CredentialHashError> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|err| CredentialHashError::hashing(err.to_string()))
    }

    fn verify(&self, password: &str, hash: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(hash) else {
            return false;
        };
        self.argon2
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn hash_round_trips_and_salts() {
        let hasher = Argon2Hasher::new();
        let first = hasher.hash("admin123").expect("hash");
        let second = hasher.hash("admin123").expect("hash");

        assert_ne!(first, second);
        assert!(first.starts_with("$argon2"));
        assert!(hasher.verify("admin123", &first));
        assert!(!hasher.verify("admin124", &first));
    }

    #[rstest]
    #[case("")]
    #[case("plaintext")]
    fn malformed_hashes_never_verify(#[case] stored: &str) {
        assert!(!Argon2Hasher::new().verify(stored, stored));
    }
}
