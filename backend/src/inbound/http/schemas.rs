//! Response payloads shared across handler modules.
//!
//! Domain types stay free of serde and utoipa concerns for everything except
//! the error envelope. These DTOs render domain values as camelCase JSON and
//! carry the OpenAPI schemas.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::{
    Customer, Punchcard, PunchcardListing, PunchcardState, Redemption, RedemptionRecord,
    StaffMember,
};

/// Staff account without credentials.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StaffResponse {
    #[schema(example = "3fa85f64-5717-4562-b3fc-2c963f66afa6")]
    pub id: String,
    #[schema(example = "sam@cafe.test")]
    pub email: String,
    pub name: String,
    #[schema(example = "manager")]
    pub role: String,
    pub created_at: DateTime<Utc>,
}

impl From<StaffMember> for StaffResponse {
    fn from(value: StaffMember) -> Self {
        Self {
            id: value.id.to_string(),
            email: value.email,
            name: value.name,
            role: value.role.as_str().to_owned(),
            created_at: value.created_at,
        }
    }
}

/// Customer registry entry.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomerResponse {
    pub id: String,
    #[schema(example = "Ada Lovelace")]
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    #[schema(example = "207119551")]
    pub shopify_customer_id: Option<String>,
    pub total_purchases: i32,
    pub total_spent: f64,
    pub active_punchcard_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Customer> for CustomerResponse {
    fn from(value: Customer) -> Self {
        Self {
            id: value.id.to_string(),
            name: value.name,
            email: value.email,
            phone: value.phone,
            shopify_customer_id: value.external_id.map(|id| id.as_str().to_owned()),
            total_purchases: value.stats.total_purchases,
            total_spent: value.stats.total_spent,
            active_punchcard_id: value.active_punchcard_id.map(|id| id.to_string()),
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}

/// A punchcard and its lifecycle state.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PunchcardResponse {
    pub id: String,
    pub customer_id: String,
    #[schema(example = 7)]
    pub punches: u16,
    #[schema(example = 10)]
    pub capacity: u16,
    /// One of `active`, `full`, or `redeemed`.
    #[schema(example = "active")]
    pub state: String,
    pub is_redeemed: bool,
    pub redeemed_at: Option<DateTime<Utc>>,
    pub redeemed_by: Option<String>,
    pub created_at: DateTime<Utc>,
}

fn state_name(state: PunchcardState) -> &'static str {
    match state {
        PunchcardState::Active => "active",
        PunchcardState::Full => "full",
        PunchcardState::Redeemed => "redeemed",
    }
}

impl From<Punchcard> for PunchcardResponse {
    fn from(value: Punchcard) -> Self {
        let state = state_name(value.state()).to_owned();
        Self {
            id: value.id.to_string(),
            customer_id: value.customer_id.to_string(),
            punches: value.punches,
            capacity: value.capacity.get(),
            state,
            is_redeemed: value.redemption.is_some(),
            redeemed_at: value.redemption.map(|stamp| stamp.redeemed_at),
            redeemed_by: value
                .redemption
                .and_then(|stamp| stamp.redeemed_by)
                .map(|id| id.to_string()),
            created_at: value.created_at,
        }
    }
}

/// Punchcard joined with the names shown on the dashboard.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PunchcardListingResponse {
    #[serde(flatten)]
    pub punchcard: PunchcardResponse,
    pub customer_name: String,
    pub redeemed_by_name: Option<String>,
}

impl From<PunchcardListing> for PunchcardListingResponse {
    fn from(value: PunchcardListing) -> Self {
        Self {
            punchcard: value.punchcard.into(),
            customer_name: value.customer_name,
            redeemed_by_name: value.redeemed_by_name,
        }
    }
}

/// Redemption log entry.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RedemptionResponse {
    pub id: String,
    pub customer_id: String,
    pub punchcard_id: String,
    pub redeemed_by: Option<String>,
    pub notes: Option<String>,
    pub redeemed_at: DateTime<Utc>,
}

impl From<Redemption> for RedemptionResponse {
    fn from(value: Redemption) -> Self {
        Self {
            id: value.id.to_string(),
            customer_id: value.customer_id.to_string(),
            punchcard_id: value.punchcard_id.to_string(),
            redeemed_by: value.redeemed_by.map(|id| id.to_string()),
            notes: value.notes,
            redeemed_at: value.redeemed_at,
        }
    }
}

/// Redemption joined with customer and staff names.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RedemptionRecordResponse {
    #[serde(flatten)]
    pub redemption: RedemptionResponse,
    pub customer_name: String,
    /// `None` once the redeeming staff account has been deleted.
    pub staff_name: Option<String>,
}

impl From<RedemptionRecord> for RedemptionRecordResponse {
    fn from(value: RedemptionRecord) -> Self {
        Self {
            redemption: value.redemption.into(),
            customer_name: value.customer_name,
            staff_name: value.staff_name,
        }
    }
}

/// Plain acknowledgement for operations without a payload.
#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    #[schema(example = "Logout successful")]
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Capacity, CustomerId, PunchcardId, RedemptionStamp, StaffId};
    use chrono::TimeZone;
    use rstest::rstest;
    use serde_json::{Value, json};

    fn card(punches: u16, redemption: Option<RedemptionStamp>) -> Punchcard {
        Punchcard {
            id: PunchcardId::random(),
            customer_id: CustomerId::random(),
            punches,
            capacity: Capacity::DEFAULT,
            redemption,
            created_at: Utc.with_ymd_and_hms(2026, 3, 14, 9, 15, 0).unwrap(),
        }
    }

    #[rstest]
    #[case(card(3, None), "active", false)]
    #[case(card(10, None), "full", false)]
    #[case(
        card(10, Some(RedemptionStamp {
            redeemed_at: Utc.with_ymd_and_hms(2026, 3, 15, 12, 0, 0).unwrap(),
            redeemed_by: Some(StaffId::random()),
        })),
        "redeemed",
        true
    )]
    fn punchcard_renders_lifecycle_state(
        #[case] card: Punchcard,
        #[case] state: &str,
        #[case] redeemed: bool,
    ) {
        let value = serde_json::to_value(PunchcardResponse::from(card)).expect("serialise");
        assert_eq!(value.get("state").and_then(Value::as_str), Some(state));
        assert_eq!(value.get("isRedeemed").and_then(Value::as_bool), Some(redeemed));
        assert_eq!(value.get("capacity"), Some(&json!(10)));
    }

    #[test]
    fn listing_flattens_card_fields() {
        let listing = PunchcardListing {
            punchcard: card(4, None),
            customer_name: "Ada".to_owned(),
            redeemed_by_name: None,
        };
        let value = serde_json::to_value(PunchcardListingResponse::from(listing)).expect("serialise");
        assert_eq!(value.get("punches"), Some(&json!(4)));
        assert_eq!(value.get("customerName"), Some(&json!("Ada")));
        assert_eq!(value.get("redeemedByName"), Some(&Value::Null));
    }
}
