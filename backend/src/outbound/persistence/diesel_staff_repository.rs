//! PostgreSQL-backed `StaffRepository` implementation using Diesel ORM.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::domain::ports::{
    NewStaffAccount, StaffCredentials, StaffRepository, StaffRepositoryError,
};
use crate::domain::{StaffId, StaffMember, StaffUpdate};

use super::diesel_helpers::{DbFailure, collect_rows};
use super::models::{NewStaffRow, StaffChangeset, StaffRow};
use super::pool::DbPool;
use super::schema::staff;

/// Diesel-backed implementation of the `StaffRepository` port.
#[derive(Clone)]
pub struct DieselStaffRepository {
    pool: DbPool,
}

impl DieselStaffRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_failure(failure: DbFailure, email: Option<&str>) -> StaffRepositoryError {
    match failure {
        DbFailure::Connection(message) => StaffRepositoryError::connection(message),
        DbFailure::UniqueViolation { .. } => {
            StaffRepositoryError::duplicate_email(email.unwrap_or_default())
        }
        DbFailure::Query(message) => StaffRepositoryError::query(message),
    }
}

fn map_error(error: impl Into<DbFailure>) -> StaffRepositoryError {
    map_failure(error.into(), None)
}

fn to_credentials(row: StaffRow) -> Result<StaffCredentials, String> {
    row.into_parts().map(|(member, password_hash)| StaffCredentials {
        member,
        password_hash,
    })
}

fn to_member(row: StaffRow) -> Result<StaffMember, String> {
    row.into_parts().map(|(member, _)| member)
}

#[async_trait]
impl StaffRepository for DieselStaffRepository {
    async fn find_by_email(
        &self,
        email: &str,
    ) -> Result<Option<StaffCredentials>, StaffRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_error)?;
        let row: Option<StaffRow> = staff::table
            .filter(staff::email.eq(email.to_lowercase()))
            .select(StaffRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_error)?;
        row.map(to_credentials)
            .transpose()
            .map_err(StaffRepositoryError::query)
    }

    async fn find_by_id(
        &self,
        id: &StaffId,
    ) -> Result<Option<StaffCredentials>, StaffRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_error)?;
        let row: Option<StaffRow> = staff::table
            .find(id.as_uuid())
            .select(StaffRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_error)?;
        row.map(to_credentials)
            .transpose()
            .map_err(StaffRepositoryError::query)
    }

    async fn list(&self) -> Result<Vec<StaffMember>, StaffRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_error)?;
        let rows: Vec<StaffRow> = staff::table
            .select(StaffRow::as_select())
            .order_by(staff::created_at.desc())
            .load(&mut conn)
            .await
            .map_err(map_error)?;
        collect_rows(rows.into_iter().map(to_member), StaffRepositoryError::query)
    }

    async fn count(&self) -> Result<i64, StaffRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_error)?;
        staff::table
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_error)
    }

    async fn create(&self, account: &NewStaffAccount) -> Result<StaffMember, StaffRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_error)?;
        let new_row = NewStaffRow {
            id: Uuid::new_v4(),
            email: &account.email,
            password_hash: &account.password_hash,
            name: &account.name,
            role: account.role.as_str(),
        };
        let row: StaffRow = diesel::insert_into(staff::table)
            .values(&new_row)
            .returning(StaffRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(|err| map_failure(err.into(), Some(&account.email)))?;
        to_member(row).map_err(StaffRepositoryError::query)
    }

    async fn update(
        &self,
        id: &StaffId,
        update: &StaffUpdate,
    ) -> Result<Option<StaffMember>, StaffRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_error)?;
        let row: Option<StaffRow> = diesel::update(staff::table.find(id.as_uuid()))
            .set(&StaffChangeset {
                name: &update.name,
                role: update.role.as_str(),
            })
            .returning(StaffRow::as_returning())
            .get_result(&mut conn)
            .await
            .optional()
            .map_err(map_error)?;
        row.map(to_member)
            .transpose()
            .map_err(StaffRepositoryError::query)
    }

    async fn set_password_hash(
        &self,
        id: &StaffId,
        password_hash: &str,
    ) -> Result<bool, StaffRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_error)?;
        let updated = diesel::update(staff::table.find(id.as_uuid()))
            .set(staff::password_hash.eq(password_hash))
            .execute(&mut conn)
            .await
            .map_err(map_error)?;
        Ok(updated > 0)
    }

    async fn delete(&self, id: &StaffId) -> Result<bool, StaffRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_error)?;
        let deleted = diesel::delete(staff::table.find(id.as_uuid()))
            .execute(&mut conn)
            .await
            .map_err(map_error)?;
        Ok(deleted > 0)
    }
}
