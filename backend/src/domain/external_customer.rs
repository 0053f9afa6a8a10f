//! Customer records owned by the external commerce system.

use std::fmt;

use crate::domain::{Customer, CustomerProfile, CustomerValidationError, PurchaseStats};

/// Identifier assigned by the commerce system.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExternalCustomerId(String);

/// Returned for a blank external identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmptyExternalId;

impl fmt::Display for EmptyExternalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "external customer id must not be empty")
    }
}

impl std::error::Error for EmptyExternalId {}

impl ExternalCustomerId {
    pub fn new(raw: impl AsRef<str>) -> Result<Self, EmptyExternalId> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(EmptyExternalId);
        }
        Ok(Self(trimmed.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ExternalCustomerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Customer as reported by the commerce API.
#[derive(Debug, Clone, PartialEq)]
pub struct ExternalCustomer {
    pub id: ExternalCustomerId,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub orders_count: i32,
    pub total_spent: f64,
}

const UNNAMED_CUSTOMER: &str = "Unnamed customer";

impl ExternalCustomer {
    /// "First Last", falling back to the email and then a placeholder when the
    /// commerce record has no name.
    pub fn display_name(&self) -> String {
        let joined = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if !joined.is_empty() {
            return joined;
        }
        self.email
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .unwrap_or(UNNAMED_CUSTOMER)
            .to_owned()
    }

    /// Local profile fields the commerce system is authoritative for.
    pub fn profile(&self) -> Result<CustomerProfile, CustomerValidationError> {
        CustomerProfile::try_from_parts(
            &self.display_name(),
            self.email.as_deref(),
            self.phone.as_deref(),
        )
    }

    pub fn stats(&self) -> PurchaseStats {
        PurchaseStats {
            total_purchases: self.orders_count.max(0),
            total_spent: self.total_spent,
        }
    }
}

/// Which reconciliation branch a sync took.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncAction {
    Created,
    Updated,
}

/// Result of syncing one external customer.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncOutcome {
    pub action: SyncAction,
    pub customer: Customer,
}

/// One record that could not be reconciled during a batch sync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncFailure {
    pub external_id: String,
    pub reason: String,
}

/// One page of external customers. Records that could not be decoded are
/// carried as failures so the batch can still process the rest.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExternalPage {
    pub customers: Vec<ExternalCustomer>,
    pub rejected: Vec<SyncFailure>,
}

/// Aggregate counts for a batch sync.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncSummary {
    pub total: usize,
    pub created: usize,
    pub updated: usize,
    pub failures: Vec<SyncFailure>,
}

impl SyncSummary {
    pub fn record(&mut self, action: SyncAction) {
        match action {
            SyncAction::Created => self.created += 1,
            SyncAction::Updated => self.updated += 1,
        }
    }
}
