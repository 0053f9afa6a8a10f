//! PostgreSQL-backed `EngagementRepository` implementation using Diesel ORM.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::domain::ports::{EngagementRepository, EngagementRepositoryError};
use crate::domain::{EngagementEvent, EngagementId, NewEngagementEvent};

use super::diesel_helpers::DbFailure;
use super::models::{EngagementEventRow, NewEngagementEventRow};
use super::pool::DbPool;
use super::schema::engagement_events;

/// Diesel-backed implementation of the `EngagementRepository` port.
#[derive(Clone)]
pub struct DieselEngagementRepository {
    pool: DbPool,
}

impl DieselEngagementRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_error(error: impl Into<DbFailure>) -> EngagementRepositoryError {
    match error.into() {
        DbFailure::Connection(message) => EngagementRepositoryError::connection(message),
        DbFailure::UniqueViolation { .. } => {
            EngagementRepositoryError::query("engagement event already recorded")
        }
        DbFailure::Query(message) => EngagementRepositoryError::query(message),
    }
}

#[async_trait]
impl EngagementRepository for DieselEngagementRepository {
    async fn record(
        &self,
        event: &NewEngagementEvent,
    ) -> Result<EngagementEvent, EngagementRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_error)?;
        let row: EngagementEventRow = diesel::insert_into(engagement_events::table)
            .values(&NewEngagementEventRow {
                id: Uuid::new_v4(),
                customer_id: event.customer_id.map(|id| *id.as_uuid()),
                platform: &event.platform,
                engagement_type: event.engagement_type.as_str(),
                customer_email: event.customer_email.as_deref(),
                content: event.content.as_deref(),
            })
            .returning(EngagementEventRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(map_error)?;
        EngagementEvent::try_from(row).map_err(EngagementRepositoryError::query)
    }

    async fn mark_email_sent(&self, id: &EngagementId) -> Result<(), EngagementRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_error)?;
        diesel::update(engagement_events::table.find(id.as_uuid()))
            .set(engagement_events::email_sent.eq(true))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_error)
    }
}
