//! Driving port for authentication and staff-account management.
//!
//! Inbound adapters resolve and authorize the caller first; methods here only
//! enforce account rules (credential checks, unique emails, no self-deletion).

use async_trait::async_trait;

use crate::domain::{
    Error, LoginCredentials, NewPassword, Principal, StaffDraft, StaffId, StaffMember, StaffUpdate,
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StaffAccounts: Send + Sync {
    /// Verify credentials. Unknown emails and wrong passwords are
    /// indistinguishable to the caller.
    async fn authenticate(&self, credentials: &LoginCredentials) -> Result<StaffMember, Error>;

    async fn profile(&self, id: &StaffId) -> Result<StaffMember, Error>;

    /// Replace the caller's password after verifying the current one.
    async fn change_password(
        &self,
        id: &StaffId,
        current_password: &str,
        new_password: &NewPassword,
    ) -> Result<(), Error>;

    async fn list(&self) -> Result<Vec<StaffMember>, Error>;

    async fn create(&self, draft: &StaffDraft) -> Result<StaffMember, Error>;

    async fn update(&self, id: &StaffId, update: &StaffUpdate) -> Result<StaffMember, Error>;

    /// Delete an account. Deleting the acting principal's own account is
    /// always rejected.
    async fn delete(&self, actor: &Principal, id: &StaffId) -> Result<(), Error>;

    async fn reset_password(&self, id: &StaffId, new_password: &NewPassword) -> Result<(), Error>;
}
