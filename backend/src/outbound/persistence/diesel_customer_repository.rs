//! PostgreSQL-backed `CustomerRepository` implementation using Diesel ORM.
//!
//! Customer creation inserts the customer, its first card, and the active
//! card pointer in one transaction so a customer is never visible without a
//! card to punch.

use std::collections::HashMap;

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};
use uuid::Uuid;

use crate::domain::ports::{CustomerRepository, CustomerRepositoryError};
use crate::domain::{
    Capacity, Customer, CustomerId, CustomerProfile, CustomerSummary, ExternalCustomerId,
    NewCustomer, Punchcard, PurchaseStats,
};

use super::diesel_helpers::DbFailure;
use super::models::{
    CustomerProfileChangeset, CustomerRow, ExternalCustomerChangeset, NewCustomerRow,
    NewPunchcardRow, PunchcardRow,
};
use super::pool::DbPool;
use super::schema::{customers, punchcards, redemptions};

/// Diesel-backed implementation of the `CustomerRepository` port.
#[derive(Clone)]
pub struct DieselCustomerRepository {
    pool: DbPool,
}

impl DieselCustomerRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Values a write attempted, reported back on a unique violation.
#[derive(Default)]
struct Attempted<'a> {
    email: Option<&'a str>,
    external_id: Option<&'a str>,
}

fn map_failure(failure: DbFailure, attempted: &Attempted<'_>) -> CustomerRepositoryError {
    match failure {
        DbFailure::Connection(message) => CustomerRepositoryError::connection(message),
        ref unique if unique.violates("shopify_customer_id") => {
            CustomerRepositoryError::duplicate_external_id(
                attempted.external_id.unwrap_or_default(),
            )
        }
        ref unique if unique.violates("email") => {
            CustomerRepositoryError::duplicate_email(attempted.email.unwrap_or_default())
        }
        DbFailure::UniqueViolation { constraint } => CustomerRepositoryError::query(format!(
            "unique constraint violated: {}",
            constraint.unwrap_or_default()
        )),
        DbFailure::Query(message) => CustomerRepositoryError::query(message),
    }
}

fn map_error(error: impl Into<DbFailure>) -> CustomerRepositoryError {
    map_failure(error.into(), &Attempted::default())
}

/// Escape `LIKE` wildcards so user input matches literally.
fn like_pattern(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len() + 2);
    escaped.push('%');
    for ch in query.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}

fn count_by_customer(rows: Vec<(Uuid, i64)>) -> HashMap<Uuid, i64> {
    rows.into_iter().collect()
}

#[async_trait]
impl CustomerRepository for DieselCustomerRepository {
    async fn list_summaries(&self) -> Result<Vec<CustomerSummary>, CustomerRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_error)?;

        // One transaction so the counts match the customer rows.
        let (customer_rows, card_counts, redemption_counts, open_cards) = conn
            .transaction::<_, diesel::result::Error, _>(|conn| {
                async move {
                    let customer_rows: Vec<CustomerRow> = customers::table
                        .select(CustomerRow::as_select())
                        .order_by(customers::created_at.desc())
                        .load(conn)
                        .await?;
                    let card_counts: Vec<(Uuid, i64)> = punchcards::table
                        .group_by(punchcards::customer_id)
                        .select((punchcards::customer_id, diesel::dsl::count(punchcards::id)))
                        .load(conn)
                        .await?;
                    let redemption_counts: Vec<(Uuid, i64)> = redemptions::table
                        .group_by(redemptions::customer_id)
                        .select((redemptions::customer_id, diesel::dsl::count(redemptions::id)))
                        .load(conn)
                        .await?;
                    let open_cards: Vec<(Uuid, i32)> = punchcards::table
                        .filter(punchcards::redeemed_at.is_null())
                        .select((punchcards::customer_id, punchcards::punches))
                        .load(conn)
                        .await?;
                    Ok((customer_rows, card_counts, redemption_counts, open_cards))
                }
                .scope_boxed()
            })
            .await
            .map_err(map_error)?;

        let card_counts = count_by_customer(card_counts);
        let redemption_counts = count_by_customer(redemption_counts);
        let open_cards: HashMap<Uuid, u16> = open_cards
            .into_iter()
            .filter_map(|(customer_id, punches)| {
                u16::try_from(punches).ok().map(|p| (customer_id, p))
            })
            .collect();

        Ok(customer_rows
            .into_iter()
            .map(|row| {
                let id = row.id;
                CustomerSummary {
                    customer: Customer::from(row),
                    punchcard_count: card_counts.get(&id).copied().unwrap_or(0),
                    redemption_count: redemption_counts.get(&id).copied().unwrap_or(0),
                    active_punches: open_cards.get(&id).copied(),
                }
            })
            .collect())
    }

    async fn search(&self, query: &str) -> Result<Vec<Customer>, CustomerRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_error)?;
        let pattern = like_pattern(query);
        let rows: Vec<CustomerRow> = customers::table
            .filter(
                customers::name
                    .ilike(pattern.as_str())
                    .or(customers::email.ilike(pattern.as_str()))
                    .or(customers::phone.ilike(pattern.as_str())),
            )
            .select(CustomerRow::as_select())
            .order_by(customers::name.asc())
            .load(&mut conn)
            .await
            .map_err(map_error)?;
        Ok(rows.into_iter().map(Customer::from).collect())
    }

    async fn find(&self, id: &CustomerId) -> Result<Option<Customer>, CustomerRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_error)?;
        let row: Option<CustomerRow> = customers::table
            .find(id.as_uuid())
            .select(CustomerRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_error)?;
        Ok(row.map(Customer::from))
    }

    async fn find_by_email(
        &self,
        email: &str,
    ) -> Result<Option<Customer>, CustomerRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_error)?;
        let row: Option<CustomerRow> = customers::table
            .filter(customers::email.eq(email.to_lowercase()))
            .select(CustomerRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_error)?;
        Ok(row.map(Customer::from))
    }

    async fn find_by_external_id(
        &self,
        external_id: &ExternalCustomerId,
    ) -> Result<Option<Customer>, CustomerRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_error)?;
        let row: Option<CustomerRow> = customers::table
            .filter(customers::shopify_customer_id.eq(external_id.as_str()))
            .select(CustomerRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_error)?;
        Ok(row.map(Customer::from))
    }

    async fn create_with_punchcard(
        &self,
        customer: &NewCustomer,
        capacity: Capacity,
    ) -> Result<(Customer, Punchcard), CustomerRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_error)?;
        let new_row = NewCustomerRow {
            id: Uuid::new_v4(),
            name: customer.profile.name(),
            email: customer.profile.email(),
            phone: customer.profile.phone(),
            shopify_customer_id: customer.external_id.as_ref().map(ExternalCustomerId::as_str),
            total_purchases: customer.stats.total_purchases,
            total_spent: customer.stats.total_spent,
        };
        let card_row = NewPunchcardRow::issue(new_row.id, capacity, 0);

        let (customer_row, punchcard_row) = conn
            .transaction::<_, diesel::result::Error, _>(|conn| {
                async move {
                    diesel::insert_into(customers::table)
                        .values(&new_row)
                        .execute(conn)
                        .await?;
                    let punchcard_row: PunchcardRow = diesel::insert_into(punchcards::table)
                        .values(&card_row)
                        .returning(PunchcardRow::as_returning())
                        .get_result(conn)
                        .await?;
                    let customer_row: CustomerRow =
                        diesel::update(customers::table.find(new_row.id))
                            .set(customers::active_punchcard_id.eq(punchcard_row.id))
                            .returning(CustomerRow::as_returning())
                            .get_result(conn)
                            .await?;
                    Ok((customer_row, punchcard_row))
                }
                .scope_boxed()
            })
            .await
            .map_err(|err| {
                map_failure(
                    err.into(),
                    &Attempted {
                        email: customer.profile.email(),
                        external_id: customer.external_id.as_ref().map(ExternalCustomerId::as_str),
                    },
                )
            })?;

        let punchcard = Punchcard::try_from(punchcard_row).map_err(CustomerRepositoryError::query)?;
        Ok((Customer::from(customer_row), punchcard))
    }

    async fn update_profile(
        &self,
        id: &CustomerId,
        profile: &CustomerProfile,
    ) -> Result<Option<Customer>, CustomerRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_error)?;
        let row: Option<CustomerRow> = diesel::update(customers::table.find(id.as_uuid()))
            .set(&CustomerProfileChangeset {
                name: profile.name(),
                email: profile.email(),
                phone: profile.phone(),
            })
            .returning(CustomerRow::as_returning())
            .get_result(&mut conn)
            .await
            .optional()
            .map_err(|err| {
                map_failure(
                    err.into(),
                    &Attempted {
                        email: profile.email(),
                        external_id: None,
                    },
                )
            })?;
        Ok(row.map(Customer::from))
    }

    async fn apply_external(
        &self,
        id: &CustomerId,
        profile: &CustomerProfile,
        stats: &PurchaseStats,
    ) -> Result<Option<Customer>, CustomerRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_error)?;
        let row: Option<CustomerRow> = diesel::update(customers::table.find(id.as_uuid()))
            .set(&ExternalCustomerChangeset {
                name: profile.name(),
                email: profile.email(),
                phone: profile.phone(),
                total_purchases: stats.total_purchases,
                total_spent: stats.total_spent,
            })
            .returning(CustomerRow::as_returning())
            .get_result(&mut conn)
            .await
            .optional()
            .map_err(|err| {
                map_failure(
                    err.into(),
                    &Attempted {
                        email: profile.email(),
                        external_id: None,
                    },
                )
            })?;
        Ok(row.map(Customer::from))
    }

    async fn delete(&self, id: &CustomerId) -> Result<bool, CustomerRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_error)?;
        let customer_id = *id.as_uuid();
        let deleted = conn
            .transaction::<_, diesel::result::Error, _>(|conn| {
                async move {
                    // Drop the pointer first so the cascade to punchcards does
                    // not have to update the row being deleted.
                    diesel::update(customers::table.find(customer_id))
                        .set(customers::active_punchcard_id.eq(None::<Uuid>))
                        .execute(conn)
                        .await?;
                    diesel::delete(customers::table.find(customer_id))
                        .execute(conn)
                        .await
                }
                .scope_boxed()
            })
            .await
            .map_err(map_error)?;
        Ok(deleted > 0)
    }
}
