//! Customer registry model.

use std::fmt;

use chrono::{DateTime, Utc};

use crate::domain::{CustomerId, ExternalCustomerId, Punchcard, PunchcardId};

/// Validation errors for customer profile input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CustomerValidationError {
    EmptyName,
}

impl fmt::Display for CustomerValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "name is required"),
        }
    }
}

impl std::error::Error for CustomerValidationError {}

/// Staff-editable customer fields.
///
/// ## Invariants
/// - `name` is trimmed and non-empty.
/// - Blank `email` and `phone` are stored as absent; a present email is
///   lower-cased so the uniqueness constraint is case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerProfile {
    name: String,
    email: Option<String>,
    phone: Option<String>,
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
}

impl CustomerProfile {
    /// Validate raw profile fields.
    ///
    /// # Examples
    /// ```
    /// use punchcard::domain::CustomerProfile;
    ///
    /// let profile = CustomerProfile::try_from_parts(" Ada ", Some(""), Some("555-0100")).unwrap();
    /// assert_eq!(profile.name(), "Ada");
    /// assert!(profile.email().is_none());
    /// ```
    pub fn try_from_parts(
        name: &str,
        email: Option<&str>,
        phone: Option<&str>,
    ) -> Result<Self, CustomerValidationError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CustomerValidationError::EmptyName);
        }
        Ok(Self {
            name: name.to_owned(),
            email: non_blank(email).map(|e| e.to_lowercase()),
            phone: non_blank(phone),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    pub fn phone(&self) -> Option<&str> {
        self.phone.as_deref()
    }
}

/// Purchase statistics owned by the external commerce system.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PurchaseStats {
    pub total_purchases: i32,
    pub total_spent: f64,
}

impl Default for PurchaseStats {
    fn default() -> Self {
        Self {
            total_purchases: 0,
            total_spent: 0.0,
        }
    }
}

/// Input for creating a customer row together with its first punchcard.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCustomer {
    pub profile: CustomerProfile,
    pub external_id: Option<ExternalCustomerId>,
    pub stats: PurchaseStats,
}

/// A registered customer.
#[derive(Debug, Clone, PartialEq)]
pub struct Customer {
    pub id: CustomerId,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub external_id: Option<ExternalCustomerId>,
    pub stats: PurchaseStats,
    /// Card that receives the next punch.
    pub active_punchcard_id: Option<PunchcardId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// List view row with aggregate card information.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomerSummary {
    pub customer: Customer,
    pub punchcard_count: i64,
    pub redemption_count: i64,
    /// Punches on the active card, when the customer has one.
    pub active_punches: Option<u16>,
}

/// Customer together with every card they have held, newest first.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomerDetail {
    pub customer: Customer,
    pub punchcards: Vec<Punchcard>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("")]
    #[case("   ")]
    fn blank_names_are_rejected(#[case] name: &str) {
        assert_eq!(
            CustomerProfile::try_from_parts(name, None, None),
            Err(CustomerValidationError::EmptyName)
        );
    }

    #[rstest]
    fn email_is_normalised() {
        let profile = CustomerProfile::try_from_parts("Ada", Some(" Ada@Example.COM "), Some(" "))
            .expect("valid profile");
        assert_eq!(profile.email(), Some("ada@example.com"));
        assert!(profile.phone().is_none());
    }
}
