//! Append-only redemption log.

use chrono::{DateTime, Utc};

use crate::domain::{CustomerId, Punchcard, PunchcardId, RedemptionId, StaffId};

/// One redemption event. Written once, never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redemption {
    pub id: RedemptionId,
    pub customer_id: CustomerId,
    pub punchcard_id: PunchcardId,
    pub redeemed_by: Option<StaffId>,
    pub notes: Option<String>,
    pub redeemed_at: DateTime<Utc>,
}

/// Everything a redemption commits atomically.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedemptionRequest {
    pub punchcard_id: PunchcardId,
    pub actor: StaffId,
    pub notes: Option<String>,
    pub redeemed_at: DateTime<Utc>,
}

impl RedemptionRequest {
    /// Blank notes are dropped.
    pub fn new(
        punchcard_id: PunchcardId,
        actor: StaffId,
        notes: Option<&str>,
        redeemed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            punchcard_id,
            actor,
            notes: notes
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map(str::to_owned),
            redeemed_at,
        }
    }
}

/// Result of a committed redemption.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedeemOutcome {
    pub redemption: Redemption,
    pub redeemed: Punchcard,
    /// Replacement card issued in the same transaction.
    pub new_punchcard: Punchcard,
}

/// Log row joined with display names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedemptionRecord {
    pub redemption: Redemption,
    pub customer_name: String,
    pub staff_name: Option<String>,
}
