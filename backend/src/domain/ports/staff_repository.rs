//! Port abstraction for staff account persistence.
use async_trait::async_trait;

use crate::domain::{Role, StaffId, StaffMember, StaffUpdate};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by staff repository adapters.
    pub enum StaffRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "staff repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "staff repository query failed: {message}",
        /// Another account already uses this email.
        DuplicateEmail { email: String } => "a staff account with email {email} already exists",
    }
}

/// Staff account together with its stored credential hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaffCredentials {
    pub member: StaffMember,
    pub password_hash: String,
}

/// Row written when a staff account is created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewStaffAccount {
    pub email: String,
    pub name: String,
    pub role: Role,
    pub password_hash: String,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StaffRepository: Send + Sync {
    /// Look up an account by normalised email.
    async fn find_by_email(
        &self,
        email: &str,
    ) -> Result<Option<StaffCredentials>, StaffRepositoryError>;

    async fn find_by_id(
        &self,
        id: &StaffId,
    ) -> Result<Option<StaffCredentials>, StaffRepositoryError>;

    /// All accounts, newest first.
    async fn list(&self) -> Result<Vec<StaffMember>, StaffRepositoryError>;

    async fn count(&self) -> Result<i64, StaffRepositoryError>;

    async fn create(&self, account: &NewStaffAccount)
    -> Result<StaffMember, StaffRepositoryError>;

    /// Returns `Ok(None)` when no account has this id.
    async fn update(
        &self,
        id: &StaffId,
        update: &StaffUpdate,
    ) -> Result<Option<StaffMember>, StaffRepositoryError>;

    /// Returns `false` when no account has this id.
    async fn set_password_hash(
        &self,
        id: &StaffId,
        password_hash: &str,
    ) -> Result<bool, StaffRepositoryError>;

    /// Returns `false` when no account has this id.
    async fn delete(&self, id: &StaffId) -> Result<bool, StaffRepositoryError>;
}
