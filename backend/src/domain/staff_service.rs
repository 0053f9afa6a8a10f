//! Staff account service implementing the [`StaffAccounts`] driving port.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::info;

use crate::domain::ports::{
    CredentialHashError, CredentialHasher, NewStaffAccount, StaffAccounts, StaffCredentials,
    StaffRepository, StaffRepositoryError,
};
use crate::domain::{
    Error, LoginCredentials, NewPassword, Principal, Role, StaffDraft, StaffId, StaffMember,
    StaffUpdate,
};

fn map_repository_error(error: StaffRepositoryError) -> Error {
    match error {
        StaffRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("staff repository unavailable: {message}"))
        }
        StaffRepositoryError::Query { message } => {
            Error::internal(format!("staff repository error: {message}"))
        }
        StaffRepositoryError::DuplicateEmail { email } => {
            Error::conflict("a staff account with this email already exists")
                .with_details(json!({ "field": "email", "value": email }))
        }
    }
}

fn map_hash_error(error: CredentialHashError) -> Error {
    Error::internal(error.to_string())
}

fn staff_not_found(id: &StaffId) -> Error {
    Error::not_found(format!("staff member {id} not found"))
}

/// Staff account service.
#[derive(Clone)]
pub struct StaffService<R, H> {
    staff_repo: Arc<R>,
    hasher: Arc<H>,
}

impl<R, H> StaffService<R, H> {
    pub fn new(staff_repo: Arc<R>, hasher: Arc<H>) -> Self {
        Self { staff_repo, hasher }
    }
}

impl<R, H> StaffService<R, H>
where
    R: StaffRepository,
    H: CredentialHasher,
{
    /// Create the first manager account when no staff exist yet.
    ///
    /// Returns the created account, or `None` when staff already exist.
    pub async fn ensure_bootstrap_manager(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<Option<StaffMember>, Error> {
        let existing = self.staff_repo.count().await.map_err(map_repository_error)?;
        if existing > 0 {
            return Ok(None);
        }
        let draft = StaffDraft::try_from_parts(email, password, name, Role::Manager.as_str())
            .map_err(|err| Error::invalid_request(format!("invalid bootstrap manager: {err}")))?;
        let member = self.create(&draft).await?;
        info!(staff_id = %member.id, email = %member.email, "bootstrap manager created");
        Ok(Some(member))
    }

    async fn load(&self, id: &StaffId) -> Result<StaffCredentials, Error> {
        self.staff_repo
            .find_by_id(id)
            .await
            .map_err(map_repository_error)?
            .ok_or_else(|| staff_not_found(id))
    }

    async fn store_password(&self, id: &StaffId, password: &NewPassword) -> Result<(), Error> {
        let hash = self.hasher.hash(password.as_str()).map_err(map_hash_error)?;
        let updated = self
            .staff_repo
            .set_password_hash(id, &hash)
            .await
            .map_err(map_repository_error)?;
        if updated {
            Ok(())
        } else {
            Err(staff_not_found(id))
        }
    }
}

#[async_trait]
impl<R, H> StaffAccounts for StaffService<R, H>
where
    R: StaffRepository,
    H: CredentialHasher,
{
    async fn authenticate(&self, credentials: &LoginCredentials) -> Result<StaffMember, Error> {
        let account = self
            .staff_repo
            .find_by_email(credentials.email())
            .await
            .map_err(map_repository_error)?;
        match account {
            Some(account)
                if self
                    .hasher
                    .verify(credentials.password(), &account.password_hash) =>
            {
                Ok(account.member)
            }
            _ => Err(Error::unauthorized("invalid credentials")),
        }
    }

    async fn profile(&self, id: &StaffId) -> Result<StaffMember, Error> {
        Ok(self.load(id).await?.member)
    }

    async fn change_password(
        &self,
        id: &StaffId,
        current_password: &str,
        new_password: &NewPassword,
    ) -> Result<(), Error> {
        let account = self.load(id).await?;
        if !self.hasher.verify(current_password, &account.password_hash) {
            return Err(Error::unauthorized("current password is incorrect"));
        }
        self.store_password(id, new_password).await
    }

    async fn list(&self) -> Result<Vec<StaffMember>, Error> {
        self.staff_repo.list().await.map_err(map_repository_error)
    }

    async fn create(&self, draft: &StaffDraft) -> Result<StaffMember, Error> {
        let password_hash = self
            .hasher
            .hash(draft.password().as_str())
            .map_err(map_hash_error)?;
        self.staff_repo
            .create(&NewStaffAccount {
                email: draft.email().to_owned(),
                name: draft.name().to_owned(),
                role: draft.role(),
                password_hash,
            })
            .await
            .map_err(map_repository_error)
    }

    async fn update(&self, id: &StaffId, update: &StaffUpdate) -> Result<StaffMember, Error> {
        self.staff_repo
            .update(id, update)
            .await
            .map_err(map_repository_error)?
            .ok_or_else(|| staff_not_found(id))
    }

    async fn delete(&self, actor: &Principal, id: &StaffId) -> Result<(), Error> {
        if actor.staff_id() == *id {
            return Err(Error::invalid_request("cannot delete your own account")
                .with_details(json!({ "code": "self_deletion" })));
        }
        let deleted = self.staff_repo.delete(id).await.map_err(map_repository_error)?;
        if deleted {
            info!(staff_id = %id, actor = %actor.staff_id(), "staff account deleted");
            Ok(())
        } else {
            Err(staff_not_found(id))
        }
    }

    async fn reset_password(&self, id: &StaffId, new_password: &NewPassword) -> Result<(), Error> {
        self.store_password(id, new_password).await
    }
}

#[cfg(test)]
#[path = "staff_service_tests.rs"]
mod tests;
