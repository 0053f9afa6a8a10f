//! Driving port for punchcard and redemption use-cases.

use async_trait::async_trait;

use crate::domain::{
    CustomerId, Error, PunchOutcome, Punchcard, PunchcardId, PunchcardListing, RedeemOutcome,
    RedemptionRecord, StaffId,
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PunchcardLedger: Send + Sync {
    /// Punch the customer's active card, opening one with a single punch
    /// when they have none.
    async fn add_punch(&self, customer_id: &CustomerId) -> Result<PunchOutcome, Error>;

    /// Redeem a full card and issue its replacement.
    async fn redeem(
        &self,
        punchcard_id: &PunchcardId,
        actor: &StaffId,
        notes: Option<String>,
    ) -> Result<RedeemOutcome, Error>;

    async fn list_all(&self) -> Result<Vec<PunchcardListing>, Error>;

    async fn list_for_customer(&self, customer_id: &CustomerId) -> Result<Vec<Punchcard>, Error>;

    async fn list_redemptions(&self) -> Result<Vec<RedemptionRecord>, Error>;
}
