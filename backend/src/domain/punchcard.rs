//! Punchcard lifecycle.
//!
//! A card moves `Active -> Full -> Redeemed`. Punches only ever increase, the
//! capacity is fixed when the card is issued, and `Redeemed` is terminal. The
//! rules here are pure; the ledger service enforces them against storage with
//! compare-and-swap updates.

use std::fmt;

use chrono::{DateTime, Utc};

use crate::domain::{CustomerId, PunchcardId, StaffId};

/// Number of punches a card holds before it can be redeemed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Capacity(u16);

impl Capacity {
    /// Capacity given to every newly issued card.
    pub const DEFAULT: Self = Self(10);

    /// Returns `None` for a zero capacity.
    #[must_use]
    pub const fn new(value: u16) -> Option<Self> {
        if value == 0 { None } else { Some(Self(value)) }
    }

    #[must_use]
    pub const fn get(self) -> u16 {
        self.0
    }
}

impl Default for Capacity {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Observable state of a card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PunchcardState {
    Active,
    Full,
    Redeemed,
}

/// Who redeemed a card, and when.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RedemptionStamp {
    pub redeemed_at: DateTime<Utc>,
    /// `None` once the redeeming staff account has been deleted.
    pub redeemed_by: Option<StaffId>,
}

/// Lifecycle rule violations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PunchcardRuleError {
    /// The card already holds `capacity` punches and must be redeemed first.
    CardFull { capacity: u16 },
    /// Redemption requested before the card is full.
    NotFull { punches: u16, capacity: u16 },
    /// The card was redeemed earlier.
    AlreadyRedeemed,
}

impl fmt::Display for PunchcardRuleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CardFull { .. } => write!(f, "punchcard is full, redeem it first"),
            Self::NotFull { punches, capacity } => write!(
                f,
                "punchcard is not full yet ({punches}/{capacity} punches)"
            ),
            Self::AlreadyRedeemed => write!(f, "punchcard has already been redeemed"),
        }
    }
}

impl std::error::Error for PunchcardRuleError {}

/// A customer's punchcard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Punchcard {
    pub id: PunchcardId,
    pub customer_id: CustomerId,
    pub punches: u16,
    pub capacity: Capacity,
    pub redemption: Option<RedemptionStamp>,
    pub created_at: DateTime<Utc>,
}

impl Punchcard {
    /// Current lifecycle state.
    ///
    /// # Examples
    /// ```
    /// use chrono::Utc;
    /// use punchcard::domain::{Capacity, CustomerId, Punchcard, PunchcardId, PunchcardState};
    ///
    /// let card = Punchcard {
    ///     id: PunchcardId::random(),
    ///     customer_id: CustomerId::random(),
    ///     punches: 10,
    ///     capacity: Capacity::DEFAULT,
    ///     redemption: None,
    ///     created_at: Utc::now(),
    /// };
    /// assert_eq!(card.state(), PunchcardState::Full);
    /// ```
    pub fn state(&self) -> PunchcardState {
        if self.redemption.is_some() {
            PunchcardState::Redeemed
        } else if self.punches >= self.capacity.get() {
            PunchcardState::Full
        } else {
            PunchcardState::Active
        }
    }

    pub fn is_redeemed(&self) -> bool {
        self.redemption.is_some()
    }

    /// Punches still needed before the card is full.
    pub fn remaining(&self) -> u16 {
        self.capacity.get().saturating_sub(self.punches)
    }

    /// Punch count after one more punch, if the card accepts it.
    pub fn next_punch_count(&self) -> Result<u16, PunchcardRuleError> {
        match self.state() {
            PunchcardState::Active => Ok(self.punches + 1),
            PunchcardState::Full => Err(PunchcardRuleError::CardFull {
                capacity: self.capacity.get(),
            }),
            PunchcardState::Redeemed => Err(PunchcardRuleError::AlreadyRedeemed),
        }
    }

    /// Succeeds only for a full, unredeemed card.
    pub fn ensure_redeemable(&self) -> Result<(), PunchcardRuleError> {
        match self.state() {
            PunchcardState::Full => Ok(()),
            PunchcardState::Active => Err(PunchcardRuleError::NotFull {
                punches: self.punches,
                capacity: self.capacity.get(),
            }),
            PunchcardState::Redeemed => Err(PunchcardRuleError::AlreadyRedeemed),
        }
    }
}

/// Result of a successful punch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PunchOutcome {
    pub punchcard: Punchcard,
    pub punches: u16,
    pub remaining: u16,
    /// True when this punch filled the card.
    pub is_full: bool,
}

impl From<Punchcard> for PunchOutcome {
    fn from(punchcard: Punchcard) -> Self {
        Self {
            punches: punchcard.punches,
            remaining: punchcard.remaining(),
            is_full: punchcard.state() == PunchcardState::Full,
            punchcard,
        }
    }
}

/// Card list row joined with display names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PunchcardListing {
    pub punchcard: Punchcard,
    pub customer_name: String,
    pub redeemed_by_name: Option<String>,
}
