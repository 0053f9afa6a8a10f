//! Driving port for commerce-system reconciliation.

use async_trait::async_trait;

use crate::domain::{Error, ExternalCustomer, ExternalCustomerId, SyncOutcome, SyncSummary};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CustomerSync: Send + Sync {
    /// Create-or-update one local customer from its external record.
    async fn sync_one(&self, external_id: &ExternalCustomerId) -> Result<SyncOutcome, Error>;

    /// Reconcile one page of external customers. Records fail independently.
    async fn sync_all(&self) -> Result<SyncSummary, Error>;

    /// Pass-through search against the commerce system.
    async fn search(&self, query: &str) -> Result<Vec<ExternalCustomer>, Error>;
}
