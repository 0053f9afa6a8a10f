//! Commerce-system reconciliation implementing the [`CustomerSync`] port.
//!
//! The local customer keyed by external id is created on first sight and
//! overwritten from the external record afterwards. Punchcards are never
//! touched by a sync; a newly created customer gets one empty card the same
//! way staff-created customers do.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::{info, warn};

use crate::domain::customer_service::map_customer_error;
use crate::domain::ports::{
    CustomerRepository, CustomerRepositoryError, CustomerSource, CustomerSourceError, CustomerSync,
};
use crate::domain::{
    Capacity, Customer, Error, ExternalCustomer, ExternalCustomerId, ExternalPage, NewCustomer,
    SyncAction, SyncFailure, SyncOutcome, SyncSummary,
};

/// Page size used when none is configured.
pub const DEFAULT_SYNC_PAGE_SIZE: usize = 250;

fn map_source_error(error: CustomerSourceError) -> Error {
    match error {
        CustomerSourceError::NotConfigured => Error::service_unavailable(error.to_string()),
        CustomerSourceError::NotFound { .. } => Error::not_found(error.to_string()),
        CustomerSourceError::Upstream { status, ref message } => {
            Error::external_service(error.to_string()).with_details(json!({
                "upstreamStatus": status,
                "message": message,
            }))
        }
        CustomerSourceError::Transport { .. } | CustomerSourceError::Decode { .. } => {
            Error::external_service(error.to_string())
        }
    }
}

/// Reconciles local customers against a [`CustomerSource`].
#[derive(Clone)]
pub struct CustomerSyncService<C, S> {
    customer_repo: Arc<C>,
    source: Arc<S>,
    page_size: usize,
}

impl<C, S> CustomerSyncService<C, S> {
    pub fn new(customer_repo: Arc<C>, source: Arc<S>, page_size: usize) -> Self {
        Self {
            customer_repo,
            source,
            page_size: page_size.max(1),
        }
    }
}

impl<C, S> CustomerSyncService<C, S>
where
    C: CustomerRepository,
    S: CustomerSource,
{
    async fn apply(&self, local: &Customer, record: &ExternalCustomer) -> Result<SyncOutcome, Error> {
        let profile = record
            .profile()
            .map_err(|err| Error::invalid_request(err.to_string()))?;
        let customer = self
            .customer_repo
            .apply_external(&local.id, &profile, &record.stats())
            .await
            .map_err(map_customer_error)?
            .ok_or_else(|| Error::not_found(format!("customer {} not found", local.id)))?;
        Ok(SyncOutcome {
            action: SyncAction::Updated,
            customer,
        })
    }

    /// Create-or-update the local customer for one external record.
    async fn reconcile(&self, record: &ExternalCustomer) -> Result<SyncOutcome, Error> {
        let existing = self
            .customer_repo
            .find_by_external_id(&record.id)
            .await
            .map_err(map_customer_error)?;
        if let Some(local) = existing {
            return self.apply(&local, record).await;
        }

        let profile = record
            .profile()
            .map_err(|err| Error::invalid_request(err.to_string()))?;
        let created = self
            .customer_repo
            .create_with_punchcard(
                &NewCustomer {
                    profile,
                    external_id: Some(record.id.clone()),
                    stats: record.stats(),
                },
                Capacity::DEFAULT,
            )
            .await;
        match created {
            Ok((customer, _)) => Ok(SyncOutcome {
                action: SyncAction::Created,
                customer,
            }),
            // A concurrent sync linked the record first.
            Err(CustomerRepositoryError::DuplicateExternalId { .. }) => {
                let local = self
                    .customer_repo
                    .find_by_external_id(&record.id)
                    .await
                    .map_err(map_customer_error)?
                    .ok_or_else(|| {
                        Error::conflict("external customer changed concurrently, retry the sync")
                    })?;
                self.apply(&local, record).await
            }
            Err(err) => Err(map_customer_error(err)),
        }
    }
}

#[async_trait]
impl<C, S> CustomerSync for CustomerSyncService<C, S>
where
    C: CustomerRepository,
    S: CustomerSource,
{
    async fn sync_one(&self, external_id: &ExternalCustomerId) -> Result<SyncOutcome, Error> {
        let record = self
            .source
            .fetch_customer(external_id)
            .await
            .map_err(map_source_error)?;
        let outcome = self.reconcile(&record).await?;
        info!(
            external_id = %external_id,
            customer_id = %outcome.customer.id,
            action = ?outcome.action,
            "external customer synced"
        );
        Ok(outcome)
    }

    async fn sync_all(&self) -> Result<SyncSummary, Error> {
        let ExternalPage { customers, rejected } = self
            .source
            .fetch_page(self.page_size)
            .await
            .map_err(map_source_error)?;

        for failure in &rejected {
            warn!(
                external_id = %failure.external_id,
                reason = %failure.reason,
                "external customer record could not be decoded"
            );
        }
        let mut summary = SyncSummary {
            total: customers.len() + rejected.len(),
            failures: rejected,
            ..SyncSummary::default()
        };
        for record in &customers {
            match self.reconcile(record).await {
                Ok(outcome) => summary.record(outcome.action),
                Err(err) => {
                    warn!(external_id = %record.id, error = %err, "external customer sync failed");
                    summary.failures.push(SyncFailure {
                        external_id: record.id.to_string(),
                        reason: err.message().to_owned(),
                    });
                }
            }
        }
        info!(
            total = summary.total,
            created = summary.created,
            updated = summary.updated,
            failed = summary.failures.len(),
            "external customer batch sync finished"
        );
        Ok(summary)
    }

    async fn search(&self, query: &str) -> Result<Vec<ExternalCustomer>, Error> {
        let query = query.trim();
        if query.is_empty() {
            return Err(Error::invalid_request("search query must not be empty")
                .with_details(json!({ "field": "q", "code": "missing_field" })));
        }
        self.source.search(query).await.map_err(map_source_error)
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::domain::ports::{MockCustomerRepository, MockCustomerSource};
    use crate::domain::{CustomerId, ErrorCode, Punchcard, PunchcardId, PurchaseStats};
    use chrono::Utc;
    use rstest::rstest;

    fn record(id: &str, first: &str) -> ExternalCustomer {
        ExternalCustomer {
            id: ExternalCustomerId::new(id).expect("id"),
            first_name: Some(first.to_owned()),
            last_name: Some("Tester".to_owned()),
            email: Some(format!("{}@shop.test", first.to_lowercase())),
            phone: None,
            orders_count: 4,
            total_spent: 120.5,
        }
    }

    fn local(external_id: &ExternalCustomerId, name: &str, stats: PurchaseStats) -> Customer {
        Customer {
            id: CustomerId::random(),
            name: name.to_owned(),
            email: None,
            phone: None,
            external_id: Some(external_id.clone()),
            stats,
            active_punchcard_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn empty_card(customer_id: CustomerId, capacity: Capacity) -> Punchcard {
        Punchcard {
            id: PunchcardId::random(),
            customer_id,
            punches: 0,
            capacity,
            redemption: None,
            created_at: Utc::now(),
        }
    }

    fn creating_repo() -> MockCustomerRepository {
        let mut repo = MockCustomerRepository::new();
        repo.expect_find_by_external_id().returning(|_| Ok(None));
        repo.expect_create_with_punchcard().returning(|new, capacity| {
            let external_id = new.external_id.clone().expect("linked");
            let customer = local(&external_id, new.profile.name(), new.stats);
            let card = empty_card(customer.id, capacity);
            Ok((customer, card))
        });
        repo
    }

    fn service(
        repo: MockCustomerRepository,
        source: MockCustomerSource,
    ) -> CustomerSyncService<MockCustomerRepository, MockCustomerSource> {
        CustomerSyncService::new(Arc::new(repo), Arc::new(source), DEFAULT_SYNC_PAGE_SIZE)
    }

    #[rstest]
    #[tokio::test]
    async fn first_sync_creates_linked_customer() {
        let mut source = MockCustomerSource::new();
        source
            .expect_fetch_customer()
            .return_once(|id| Ok(record(id.as_str(), "Grace")));

        let id = ExternalCustomerId::new("9001").expect("id");
        let outcome = service(creating_repo(), source)
            .sync_one(&id)
            .await
            .expect("synced");

        assert_eq!(outcome.action, SyncAction::Created);
        assert_eq!(outcome.customer.name, "Grace Tester");
        assert_eq!(outcome.customer.external_id, Some(id));
        assert_eq!(outcome.customer.stats.total_purchases, 4);
    }

    #[rstest]
    #[tokio::test]
    async fn second_sync_updates_without_touching_cards() {
        let id = ExternalCustomerId::new("9001").expect("id");
        let existing = local(&id, "Old Name", PurchaseStats::default());
        let existing_id = existing.id;
        let mut repo = MockCustomerRepository::new();
        repo.expect_find_by_external_id()
            .return_once(move |_| Ok(Some(existing)));
        repo.expect_create_with_punchcard().times(0);
        repo.expect_apply_external()
            .withf(move |cid, profile, stats| {
                *cid == existing_id && profile.name() == "Grace Tester" && stats.total_purchases == 4
            })
            .times(1)
            .return_once(|cid, profile, stats| {
                let mut updated = local(
                    &ExternalCustomerId::new("9001").expect("id"),
                    profile.name(),
                    *stats,
                );
                updated.id = *cid;
                Ok(Some(updated))
            });
        let mut source = MockCustomerSource::new();
        source
            .expect_fetch_customer()
            .return_once(|id| Ok(record(id.as_str(), "Grace")));

        let outcome = service(repo, source).sync_one(&id).await.expect("synced");
        assert_eq!(outcome.action, SyncAction::Updated);
        assert_eq!(outcome.customer.id, existing_id);
    }

    #[rstest]
    #[case(CustomerSourceError::not_configured(), ErrorCode::ServiceUnavailable)]
    #[case(CustomerSourceError::not_found("1"), ErrorCode::NotFound)]
    #[case(CustomerSourceError::upstream(429_u16, "slow down"), ErrorCode::ExternalService)]
    #[case(CustomerSourceError::transport("timed out"), ErrorCode::ExternalService)]
    #[tokio::test]
    async fn source_errors_are_mapped(#[case] failure: CustomerSourceError, #[case] code: ErrorCode) {
        let mut source = MockCustomerSource::new();
        source.expect_fetch_customer().return_once(move |_| Err(failure));
        let mut repo = MockCustomerRepository::new();
        repo.expect_find_by_external_id().times(0);

        let err = service(repo, source)
            .sync_one(&ExternalCustomerId::new("1").expect("id"))
            .await
            .expect_err("source failure");
        assert_eq!(err.code(), code);
    }

    #[rstest]
    #[tokio::test]
    async fn upstream_status_is_carried_in_details() {
        let mut source = MockCustomerSource::new();
        source
            .expect_fetch_page()
            .return_once(|_| Err(CustomerSourceError::upstream(401_u16, "bad token")));

        let err = service(MockCustomerRepository::new(), source)
            .sync_all()
            .await
            .expect_err("unauthorised upstream");
        let status = err
            .details()
            .and_then(|d| d.get("upstreamStatus"))
            .and_then(serde_json::Value::as_u64);
        assert_eq!(status, Some(401));
    }

    #[rstest]
    #[tokio::test]
    async fn batch_sync_isolates_record_failures() {
        let mut repo = MockCustomerRepository::new();
        repo.expect_find_by_external_id().returning(|id| {
            if id.as_str() == "2" {
                Err(CustomerRepositoryError::query("deadlock detected"))
            } else {
                Ok(None)
            }
        });
        repo.expect_create_with_punchcard().returning(|new, capacity| {
            let external_id = new.external_id.clone().expect("linked");
            let customer = local(&external_id, new.profile.name(), new.stats);
            let card = empty_card(customer.id, capacity);
            Ok((customer, card))
        });
        let mut source = MockCustomerSource::new();
        source
            .expect_fetch_page()
            .withf(|limit| *limit == DEFAULT_SYNC_PAGE_SIZE)
            .return_once(|_| {
                Ok(ExternalPage {
                    customers: vec![record("1", "Ada"), record("2", "Bob"), record("3", "Cy")],
                    rejected: Vec::new(),
                })
            });

        let summary = service(repo, source).sync_all().await.expect("batch");
        assert_eq!(summary.total, 3);
        assert_eq!(summary.created, 2);
        assert_eq!(summary.updated, 0);
        assert_eq!(summary.failures.len(), 1);
        assert_eq!(summary.failures[0].external_id, "2");
    }

    #[rstest]
    #[tokio::test]
    async fn undecodable_records_are_reported_alongside_good_ones() {
        let mut source = MockCustomerSource::new();
        source.expect_fetch_page().return_once(|_| {
            Ok(ExternalPage {
                customers: vec![record("1", "Ada")],
                rejected: vec![SyncFailure {
                    external_id: "2".to_owned(),
                    reason: "invalid total_spent 'n/a'".to_owned(),
                }],
            })
        });

        let summary = service(creating_repo(), source).sync_all().await.expect("batch");
        assert_eq!(summary.total, 2);
        assert_eq!(summary.created, 1);
        assert_eq!(summary.failures.len(), 1);
        assert_eq!(summary.failures[0].external_id, "2");
        assert!(summary.failures[0].reason.contains("n/a"));
    }

    #[rstest]
    #[tokio::test]
    async fn racing_creation_falls_back_to_update() {
        let id = ExternalCustomerId::new("77").expect("id");
        let linked = local(&id, "Linked", PurchaseStats::default());
        let linked_id = linked.id;
        let mut repo = MockCustomerRepository::new();
        let mut lookups = 0;
        repo.expect_find_by_external_id().times(2).returning(move |_| {
            lookups += 1;
            Ok((lookups > 1).then(|| linked.clone()))
        });
        repo.expect_create_with_punchcard()
            .return_once(|_, _| Err(CustomerRepositoryError::duplicate_external_id("77")));
        repo.expect_apply_external()
            .times(1)
            .return_once(|cid, profile, stats| {
                let mut updated = local(
                    &ExternalCustomerId::new("77").expect("id"),
                    profile.name(),
                    *stats,
                );
                updated.id = *cid;
                Ok(Some(updated))
            });
        let mut source = MockCustomerSource::new();
        source
            .expect_fetch_customer()
            .return_once(|id| Ok(record(id.as_str(), "Dee")));

        let outcome = service(repo, source).sync_one(&id).await.expect("synced");
        assert_eq!(outcome.action, SyncAction::Updated);
        assert_eq!(outcome.customer.id, linked_id);
    }

    #[rstest]
    #[tokio::test]
    async fn blank_search_never_reaches_the_source() {
        let mut source = MockCustomerSource::new();
        source.expect_search().times(0);
        let err = service(MockCustomerRepository::new(), source)
            .search("  ")
            .await
            .expect_err("blank");
        assert_eq!(err.code(), ErrorCode::InvalidRequest);
    }
}
