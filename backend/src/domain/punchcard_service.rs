//! Punchcard ledger service implementing the [`PunchcardLedger`] driving port.
//!
//! Punches use optimistic concurrency: the service validates the transition
//! against the card it read, then asks the repository to apply it only if the
//! row is unchanged. A lost race re-reads and retries a bounded number of
//! times before reporting a conflict, so two concurrent punches can never
//! both land on the last free slot.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use serde_json::json;
use tracing::{debug, info};

use crate::domain::customer_service::{customer_not_found, map_customer_error, map_punchcard_error};
use crate::domain::ports::{
    CustomerRepository, PunchcardLedger, PunchcardRepository, PunchcardRepositoryError,
};
use crate::domain::{
    Capacity, CustomerId, Error, PunchOutcome, Punchcard, PunchcardId, PunchcardListing,
    PunchcardRuleError, RedeemOutcome, RedemptionRecord, RedemptionRequest, StaffId,
};

/// Attempts made before a contended punch is reported as a conflict.
const MAX_PUNCH_ATTEMPTS: usize = 3;

fn rule_conflict(error: PunchcardRuleError) -> Error {
    let details = match error {
        PunchcardRuleError::CardFull { capacity } => json!({
            "code": "card_full",
            "capacity": capacity,
        }),
        PunchcardRuleError::NotFull { punches, capacity } => json!({
            "code": "card_not_full",
            "punches": punches,
            "capacity": capacity,
        }),
        PunchcardRuleError::AlreadyRedeemed => json!({ "code": "already_redeemed" }),
    };
    Error::conflict(error.to_string()).with_details(details)
}

fn punchcard_not_found(id: &PunchcardId) -> Error {
    Error::not_found(format!("punchcard {id} not found"))
}

/// Punchcard ledger service.
#[derive(Clone)]
pub struct PunchcardService<C, P> {
    customer_repo: Arc<C>,
    punchcard_repo: Arc<P>,
    clock: Arc<dyn Clock>,
    capacity: Capacity,
}

impl<C, P> PunchcardService<C, P> {
    pub fn new(customer_repo: Arc<C>, punchcard_repo: Arc<P>, clock: Arc<dyn Clock>) -> Self {
        Self {
            customer_repo,
            punchcard_repo,
            clock,
            capacity: Capacity::DEFAULT,
        }
    }
}

impl<C, P> PunchcardService<C, P>
where
    C: CustomerRepository,
    P: PunchcardRepository,
{
    /// One read-validate-write round. `Ok(None)` means the write lost a race.
    async fn try_punch(&self, customer_id: &CustomerId) -> Result<Option<Punchcard>, Error> {
        let active = self
            .punchcard_repo
            .active_for(customer_id)
            .await
            .map_err(map_punchcard_error)?;

        match active {
            None => {
                self.customer_repo
                    .find(customer_id)
                    .await
                    .map_err(map_customer_error)?
                    .ok_or_else(|| customer_not_found(customer_id))?;
                let opened = self
                    .punchcard_repo
                    .open_active_card(customer_id, self.capacity, 1)
                    .await
                    .map_err(map_punchcard_error)?;
                if let Some(card) = &opened {
                    info!(customer_id = %customer_id, punchcard_id = %card.id, "punchcard opened");
                }
                Ok(opened)
            }
            Some(card) => {
                let next = card.next_punch_count().map_err(rule_conflict)?;
                self.punchcard_repo
                    .compare_and_set_punches(&card.id, card.punches, next)
                    .await
                    .map_err(map_punchcard_error)
            }
        }
    }

    /// Explain why a guarded redemption did not apply, using the card's
    /// current state.
    async fn stale_redemption(&self, id: &PunchcardId) -> Error {
        match self.punchcard_repo.find(id).await {
            Ok(Some(card)) => match card.ensure_redeemable() {
                Err(rule) => rule_conflict(rule),
                Ok(()) => map_punchcard_error(PunchcardRepositoryError::stale_card(id.to_string())),
            },
            Ok(None) => punchcard_not_found(id),
            Err(err) => map_punchcard_error(err),
        }
    }
}

#[async_trait]
impl<C, P> PunchcardLedger for PunchcardService<C, P>
where
    C: CustomerRepository,
    P: PunchcardRepository,
{
    async fn add_punch(&self, customer_id: &CustomerId) -> Result<PunchOutcome, Error> {
        for attempt in 1..=MAX_PUNCH_ATTEMPTS {
            if let Some(card) = self.try_punch(customer_id).await? {
                return Ok(PunchOutcome::from(card));
            }
            debug!(customer_id = %customer_id, attempt, "punch lost a concurrent update; retrying");
        }
        Err(Error::conflict("punchcard is busy, retry the request")
            .with_details(json!({ "code": "punch_contended" })))
    }

    async fn redeem(
        &self,
        punchcard_id: &PunchcardId,
        actor: &StaffId,
        notes: Option<String>,
    ) -> Result<RedeemOutcome, Error> {
        let card = self
            .punchcard_repo
            .find(punchcard_id)
            .await
            .map_err(map_punchcard_error)?
            .ok_or_else(|| punchcard_not_found(punchcard_id))?;
        card.ensure_redeemable().map_err(rule_conflict)?;

        let request =
            RedemptionRequest::new(*punchcard_id, *actor, notes.as_deref(), self.clock.utc());
        match self.punchcard_repo.commit_redemption(&request).await {
            Ok(outcome) => {
                info!(
                    punchcard_id = %punchcard_id,
                    customer_id = %outcome.redemption.customer_id,
                    new_punchcard_id = %outcome.new_punchcard.id,
                    staff_id = %actor,
                    "punchcard redeemed"
                );
                Ok(outcome)
            }
            Err(PunchcardRepositoryError::StaleCard { .. }) => {
                Err(self.stale_redemption(punchcard_id).await)
            }
            Err(err) => Err(map_punchcard_error(err)),
        }
    }

    async fn list_all(&self) -> Result<Vec<PunchcardListing>, Error> {
        self.punchcard_repo
            .list_all()
            .await
            .map_err(map_punchcard_error)
    }

    async fn list_for_customer(&self, customer_id: &CustomerId) -> Result<Vec<Punchcard>, Error> {
        self.customer_repo
            .find(customer_id)
            .await
            .map_err(map_customer_error)?
            .ok_or_else(|| customer_not_found(customer_id))?;
        self.punchcard_repo
            .list_for_customer(customer_id)
            .await
            .map_err(map_punchcard_error)
    }

    async fn list_redemptions(&self) -> Result<Vec<RedemptionRecord>, Error> {
        self.punchcard_repo
            .list_redemptions()
            .await
            .map_err(map_punchcard_error)
    }
}

#[cfg(test)]
#[path = "punchcard_service_tests.rs"]
mod tests;
