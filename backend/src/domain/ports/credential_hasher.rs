//! Port for one-way password hashing.

use super::define_port_error;

define_port_error! {
    /// Errors raised while hashing a credential.
    pub enum CredentialHashError {
        /// The hashing backend rejected the input or parameters.
        Hashing { message: String } => "password hashing failed: {message}",
    }
}

/// Hashes and verifies staff passwords.
///
/// Implementations must produce self-describing hashes (algorithm, parameters,
/// and salt embedded) so `verify` needs no extra state.
#[cfg_attr(test, mockall::automock)]
pub trait CredentialHasher: Send + Sync {
    fn hash(&self, password: &str) -> Result<String, CredentialHashError>;

    /// `false` for a wrong password and for an unparseable stored hash.
    fn verify(&self, password: &str, password_hash: &str) -> bool;
}
