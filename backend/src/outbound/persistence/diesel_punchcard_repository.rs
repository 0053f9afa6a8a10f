//! PostgreSQL-backed `PunchcardRepository` implementation using Diesel ORM.
//!
//! Every state change is a guarded write. Punches only apply when the stored
//! count still equals the count the caller read and the card is unredeemed;
//! redemption only applies to a full, unredeemed card, and commits the log
//! entry plus the replacement card in the same transaction. A guard that
//! matches no rows is reported to the caller instead of retried here.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};
use tracing::debug;
use uuid::Uuid;

use crate::domain::ports::{PunchcardRepository, PunchcardRepositoryError};
use crate::domain::{
    Capacity, CustomerId, Punchcard, PunchcardId, PunchcardListing, RedeemOutcome, Redemption,
    RedemptionRecord, RedemptionRequest,
};

use super::diesel_helpers::{DbFailure, collect_rows};
use super::models::{NewPunchcardRow, PunchcardRow, RedemptionRow};
use super::pool::DbPool;
use super::schema::{customers, punchcards, redemptions, staff};

/// Diesel-backed implementation of the `PunchcardRepository` port.
#[derive(Clone)]
pub struct DieselPunchcardRepository {
    pool: DbPool,
}

impl DieselPunchcardRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_error(error: impl Into<DbFailure>) -> PunchcardRepositoryError {
    match error.into() {
        DbFailure::Connection(message) => PunchcardRepositoryError::connection(message),
        DbFailure::UniqueViolation { constraint } => PunchcardRepositoryError::query(format!(
            "unique constraint violated: {}",
            constraint.unwrap_or_default()
        )),
        DbFailure::Query(message) => PunchcardRepositoryError::query(message),
    }
}

fn to_card(row: PunchcardRow) -> Result<Punchcard, PunchcardRepositoryError> {
    Punchcard::try_from(row).map_err(PunchcardRepositoryError::query)
}

/// Failure inside the redemption transaction.
#[derive(Debug)]
enum RedeemTxError {
    /// The card was redeemed, emptied, or removed since it was read.
    Stale,
    Database(DieselError),
}

impl From<DieselError> for RedeemTxError {
    fn from(error: DieselError) -> Self {
        Self::Database(error)
    }
}

type ListingRow = (PunchcardRow, String, Option<String>);
type RedemptionLogRow = (RedemptionRow, String, Option<String>);

#[async_trait]
impl PunchcardRepository for DieselPunchcardRepository {
    async fn find(&self, id: &PunchcardId) -> Result<Option<Punchcard>, PunchcardRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_error)?;
        let row: Option<PunchcardRow> = punchcards::table
            .find(id.as_uuid())
            .select(PunchcardRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_error)?;
        row.map(to_card).transpose()
    }

    async fn active_for(
        &self,
        customer_id: &CustomerId,
    ) -> Result<Option<Punchcard>, PunchcardRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_error)?;
        let pointed: Option<PunchcardRow> = punchcards::table
            .inner_join(
                customers::table.on(customers::active_punchcard_id.eq(punchcards::id.nullable())),
            )
            .filter(customers::id.eq(customer_id.as_uuid()))
            .filter(punchcards::redeemed_at.is_null())
            .select(PunchcardRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_error)?;
        if let Some(row) = pointed {
            return to_card(row).map(Some);
        }

        // Rows written before the reference existed fall back to the newest open card.
        let row: Option<PunchcardRow> = punchcards::table
            .filter(punchcards::customer_id.eq(customer_id.as_uuid()))
            .filter(punchcards::redeemed_at.is_null())
            .select(PunchcardRow::as_select())
            .order_by(punchcards::created_at.desc())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_error)?;
        row.map(to_card).transpose()
    }

    async fn list_for_customer(
        &self,
        customer_id: &CustomerId,
    ) -> Result<Vec<Punchcard>, PunchcardRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_error)?;
        let rows: Vec<PunchcardRow> = punchcards::table
            .filter(punchcards::customer_id.eq(customer_id.as_uuid()))
            .select(PunchcardRow::as_select())
            .order_by(punchcards::created_at.desc())
            .load(&mut conn)
            .await
            .map_err(map_error)?;
        collect_rows(
            rows.into_iter().map(Punchcard::try_from),
            PunchcardRepositoryError::query,
        )
    }

    async fn list_all(&self) -> Result<Vec<PunchcardListing>, PunchcardRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_error)?;
        let rows: Vec<ListingRow> = punchcards::table
            .inner_join(customers::table)
            .left_join(staff::table.on(punchcards::redeemed_by.eq(staff::id.nullable())))
            .select((
                PunchcardRow::as_select(),
                customers::name,
                staff::name.nullable(),
            ))
            .order_by(punchcards::created_at.desc())
            .load(&mut conn)
            .await
            .map_err(map_error)?;
        collect_rows(
            rows.into_iter()
                .map(|(row, customer_name, redeemed_by_name)| {
                    Punchcard::try_from(row).map(|punchcard| PunchcardListing {
                        punchcard,
                        customer_name,
                        redeemed_by_name,
                    })
                }),
            PunchcardRepositoryError::query,
        )
    }

    async fn compare_and_set_punches(
        &self,
        id: &PunchcardId,
        expected: u16,
        next: u16,
    ) -> Result<Option<Punchcard>, PunchcardRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_error)?;
        let row: Option<PunchcardRow> = diesel::update(
            punchcards::table
                .find(id.as_uuid())
                .filter(punchcards::punches.eq(i32::from(expected)))
                .filter(punchcards::redeemed_at.is_null()),
        )
        .set(punchcards::punches.eq(i32::from(next)))
        .returning(PunchcardRow::as_returning())
        .get_result(&mut conn)
        .await
        .optional()
        .map_err(map_error)?;
        if row.is_none() {
            debug!(punchcard_id = %id, expected, "punch guard matched no rows");
        }
        row.map(to_card).transpose()
    }

    async fn open_active_card(
        &self,
        customer_id: &CustomerId,
        capacity: Capacity,
        punches: u16,
    ) -> Result<Option<Punchcard>, PunchcardRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_error)?;
        let new_row = NewPunchcardRow::issue(*customer_id.as_uuid(), capacity, punches);

        let result = conn
            .transaction::<_, DieselError, _>(|conn| {
                async move {
                    let row: PunchcardRow = diesel::insert_into(punchcards::table)
                        .values(&new_row)
                        .returning(PunchcardRow::as_returning())
                        .get_result(conn)
                        .await?;
                    diesel::update(customers::table.find(row.customer_id))
                        .set(customers::active_punchcard_id.eq(row.id))
                        .execute(conn)
                        .await?;
                    Ok(row)
                }
                .scope_boxed()
            })
            .await;

        match result {
            Ok(row) => to_card(row).map(Some),
            // Another request opened the customer's card first.
            Err(DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _)) => {
                debug!(customer_id = %customer_id, "open card already exists");
                Ok(None)
            }
            Err(err) => Err(map_error(err)),
        }
    }

    async fn commit_redemption(
        &self,
        request: &RedemptionRequest,
    ) -> Result<RedeemOutcome, PunchcardRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_error)?;
        let punchcard_id = *request.punchcard_id.as_uuid();
        let actor = *request.actor.as_uuid();
        let notes = request.notes.clone();
        let redeemed_at = request.redeemed_at;

        let result = conn
            .transaction::<_, RedeemTxError, _>(|conn| {
                async move {
                    let redeemed: PunchcardRow = diesel::update(
                        punchcards::table
                            .find(punchcard_id)
                            .filter(punchcards::redeemed_at.is_null())
                            .filter(punchcards::punches.ge(punchcards::capacity)),
                    )
                    .set((
                        punchcards::redeemed_at.eq(Some(redeemed_at)),
                        punchcards::redeemed_by.eq(Some(actor)),
                    ))
                    .returning(PunchcardRow::as_returning())
                    .get_result(conn)
                    .await
                    .optional()?
                    .ok_or(RedeemTxError::Stale)?;

                    let log_row: RedemptionRow = diesel::insert_into(redemptions::table)
                        .values(&RedemptionRow {
                            id: Uuid::new_v4(),
                            customer_id: redeemed.customer_id,
                            punchcard_id,
                            redeemed_by: Some(actor),
                            notes,
                            redeemed_at,
                        })
                        .returning(RedemptionRow::as_returning())
                        .get_result(conn)
                        .await?;

                    let replacement: PunchcardRow = diesel::insert_into(punchcards::table)
                        .values(&NewPunchcardRow {
                            id: Uuid::new_v4(),
                            customer_id: redeemed.customer_id,
                            punches: 0,
                            capacity: redeemed.capacity,
                        })
                        .returning(PunchcardRow::as_returning())
                        .get_result(conn)
                        .await?;

                    diesel::update(customers::table.find(redeemed.customer_id))
                        .set(customers::active_punchcard_id.eq(replacement.id))
                        .execute(conn)
                        .await?;

                    Ok((redeemed, log_row, replacement))
                }
                .scope_boxed()
            })
            .await;

        match result {
            Ok((redeemed, log_row, replacement)) => Ok(RedeemOutcome {
                redemption: Redemption::from(log_row),
                redeemed: to_card(redeemed)?,
                new_punchcard: to_card(replacement)?,
            }),
            Err(RedeemTxError::Stale) => Err(PunchcardRepositoryError::stale_card(
                request.punchcard_id.to_string(),
            )),
            Err(RedeemTxError::Database(err)) => Err(map_error(err)),
        }
    }

    async fn list_redemptions(&self) -> Result<Vec<RedemptionRecord>, PunchcardRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_error)?;
        let rows: Vec<RedemptionLogRow> = redemptions::table
            .inner_join(customers::table)
            .left_join(staff::table.on(redemptions::redeemed_by.eq(staff::id.nullable())))
            .select((
                RedemptionRow::as_select(),
                customers::name,
                staff::name.nullable(),
            ))
            .order_by(redemptions::redeemed_at.desc())
            .load(&mut conn)
            .await
            .map_err(map_error)?;
        Ok(rows
            .into_iter()
            .map(|(row, customer_name, staff_name)| RedemptionRecord {
                redemption: Redemption::from(row),
                customer_name,
                staff_name,
            })
            .collect())
    }
}
