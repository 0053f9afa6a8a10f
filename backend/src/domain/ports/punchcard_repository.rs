//! Port abstraction for the punchcard ledger and redemption log.
//!
//! Every mutating method is guarded: adapters apply the change only if the
//! row still matches what the service validated, and report a lost race
//! instead of overwriting.
use async_trait::async_trait;

use crate::domain::{
    Capacity, CustomerId, Punchcard, PunchcardId, PunchcardListing, RedeemOutcome,
    RedemptionRecord, RedemptionRequest,
};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by punchcard repository adapters.
    pub enum PunchcardRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "punchcard repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "punchcard repository query failed: {message}",
        /// The card no longer matched the redemption guard.
        StaleCard { punchcard_id: String } =>
            "punchcard {punchcard_id} changed before the update could be applied",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PunchcardRepository: Send + Sync {
    async fn find(&self, id: &PunchcardId) -> Result<Option<Punchcard>, PunchcardRepositoryError>;

    /// The card the customer's active pointer references, if any.
    async fn active_for(
        &self,
        customer_id: &CustomerId,
    ) -> Result<Option<Punchcard>, PunchcardRepositoryError>;

    /// Every card the customer has held, newest first.
    async fn list_for_customer(
        &self,
        customer_id: &CustomerId,
    ) -> Result<Vec<Punchcard>, PunchcardRepositoryError>;

    /// Every card, newest first, with customer and redeemer names.
    async fn list_all(&self) -> Result<Vec<PunchcardListing>, PunchcardRepositoryError>;

    /// Set the punch count to `next` if the card is unredeemed and still
    /// holds `expected` punches. `Ok(None)` when the guard did not match.
    async fn compare_and_set_punches(
        &self,
        id: &PunchcardId,
        expected: u16,
        next: u16,
    ) -> Result<Option<Punchcard>, PunchcardRepositoryError>;

    /// Issue a card with `punches` and make it the customer's active card,
    /// but only while the customer has no active card. `Ok(None)` when the
    /// customer already has one or no longer exists.
    async fn open_active_card(
        &self,
        customer_id: &CustomerId,
        capacity: Capacity,
        punches: u16,
    ) -> Result<Option<Punchcard>, PunchcardRepositoryError>;

    /// In one transaction: mark the card redeemed, append the redemption
    /// record, issue a replacement card with the same capacity, and point the
    /// customer at it. Fails with [`PunchcardRepositoryError::StaleCard`] and
    /// commits nothing when the card is not full and unredeemed.
    async fn commit_redemption(
        &self,
        request: &RedemptionRequest,
    ) -> Result<RedeemOutcome, PunchcardRepositoryError>;

    /// Redemption log, newest first.
    async fn list_redemptions(&self) -> Result<Vec<RedemptionRecord>, PunchcardRepositoryError>;
}
