//! Internal Diesel row structs for database operations.
//!
//! These types are implementation details of the persistence layer and must
//! never be exposed to the domain. Conversions into domain types fail with a
//! message when a stored value violates a domain invariant.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::{
    Capacity, Customer, CustomerId, EngagementEvent, EngagementId, EngagementType,
    ExternalCustomerId, Punchcard, PunchcardId, PurchaseStats, Redemption, RedemptionId,
    RedemptionStamp, Role, StaffId, StaffMember,
};

use super::schema::{customers, engagement_events, punchcards, redemptions, staff};

// ---------------------------------------------------------------------------
// Staff
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = staff)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct StaffRow {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = staff)]
pub(crate) struct NewStaffRow<'a> {
    pub id: Uuid,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub name: &'a str,
    pub role: &'a str,
}

#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = staff)]
pub(crate) struct StaffChangeset<'a> {
    pub name: &'a str,
    pub role: &'a str,
}

impl StaffRow {
    /// Split into the public member and the stored hash.
    pub(crate) fn into_parts(self) -> Result<(StaffMember, String), String> {
        let role: Role = self
            .role
            .parse()
            .map_err(|err| format!("staff {}: {err}", self.id))?;
        Ok((
            StaffMember {
                id: StaffId::from_uuid(self.id),
                email: self.email,
                name: self.name,
                role,
                created_at: self.created_at,
            },
            self.password_hash,
        ))
    }
}

// ---------------------------------------------------------------------------
// Customers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = customers)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct CustomerRow {
    pub id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub shopify_customer_id: Option<String>,
    pub total_purchases: i32,
    pub total_spent: f64,
    pub active_punchcard_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = customers)]
pub(crate) struct NewCustomerRow<'a> {
    pub id: Uuid,
    pub name: &'a str,
    pub email: Option<&'a str>,
    pub phone: Option<&'a str>,
    pub shopify_customer_id: Option<&'a str>,
    pub total_purchases: i32,
    pub total_spent: f64,
}

/// Staff-editable profile fields. `None` clears the column.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = customers)]
#[diesel(treat_none_as_null = true)]
pub(crate) struct CustomerProfileChangeset<'a> {
    pub name: &'a str,
    pub email: Option<&'a str>,
    pub phone: Option<&'a str>,
}

/// Fields the commerce system is authoritative for.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = customers)]
#[diesel(treat_none_as_null = true)]
pub(crate) struct ExternalCustomerChangeset<'a> {
    pub name: &'a str,
    pub email: Option<&'a str>,
    pub phone: Option<&'a str>,
    pub total_purchases: i32,
    pub total_spent: f64,
}

impl From<CustomerRow> for Customer {
    fn from(row: CustomerRow) -> Self {
        Self {
            id: CustomerId::from_uuid(row.id),
            name: row.name,
            email: row.email,
            phone: row.phone,
            external_id: row
                .shopify_customer_id
                .and_then(|raw| ExternalCustomerId::new(raw).ok()),
            stats: PurchaseStats {
                total_purchases: row.total_purchases,
                total_spent: row.total_spent,
            },
            active_punchcard_id: row.active_punchcard_id.map(PunchcardId::from_uuid),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

// ---------------------------------------------------------------------------
// Punchcards
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = punchcards)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct PunchcardRow {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub punches: i32,
    pub capacity: i32,
    pub redeemed_at: Option<DateTime<Utc>>,
    pub redeemed_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = punchcards)]
pub(crate) struct NewPunchcardRow {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub punches: i32,
    pub capacity: i32,
}

impl NewPunchcardRow {
    pub(crate) fn issue(customer_id: Uuid, capacity: Capacity, punches: u16) -> Self {
        Self {
            id: Uuid::new_v4(),
            customer_id,
            punches: i32::from(punches),
            capacity: i32::from(capacity.get()),
        }
    }
}

impl TryFrom<PunchcardRow> for Punchcard {
    type Error = String;

    fn try_from(row: PunchcardRow) -> Result<Self, Self::Error> {
        let punches = u16::try_from(row.punches)
            .map_err(|_| format!("punchcard {}: invalid punches {}", row.id, row.punches))?;
        let capacity = u16::try_from(row.capacity)
            .ok()
            .and_then(Capacity::new)
            .ok_or_else(|| format!("punchcard {}: invalid capacity {}", row.id, row.capacity))?;
        Ok(Self {
            id: PunchcardId::from_uuid(row.id),
            customer_id: CustomerId::from_uuid(row.customer_id),
            punches,
            capacity,
            redemption: row.redeemed_at.map(|redeemed_at| RedemptionStamp {
                redeemed_at,
                redeemed_by: row.redeemed_by.map(StaffId::from_uuid),
            }),
            created_at: row.created_at,
        })
    }
}

// ---------------------------------------------------------------------------
// Redemptions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = redemptions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct RedemptionRow {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub punchcard_id: Uuid,
    pub redeemed_by: Option<Uuid>,
    pub notes: Option<String>,
    pub redeemed_at: DateTime<Utc>,
}

impl From<RedemptionRow> for Redemption {
    fn from(row: RedemptionRow) -> Self {
        Self {
            id: RedemptionId::from_uuid(row.id),
            customer_id: CustomerId::from_uuid(row.customer_id),
            punchcard_id: PunchcardId::from_uuid(row.punchcard_id),
            redeemed_by: row.redeemed_by.map(StaffId::from_uuid),
            notes: row.notes,
            redeemed_at: row.redeemed_at,
        }
    }
}

// ---------------------------------------------------------------------------
// Engagement events
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = engagement_events)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct EngagementEventRow {
    pub id: Uuid,
    pub customer_id: Option<Uuid>,
    pub platform: String,
    pub engagement_type: String,
    pub customer_email: Option<String>,
    pub content: Option<String>,
    pub email_sent: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = engagement_events)]
pub(crate) struct NewEngagementEventRow<'a> {
    pub id: Uuid,
    pub customer_id: Option<Uuid>,
    pub platform: &'a str,
    pub engagement_type: &'a str,
    pub customer_email: Option<&'a str>,
    pub content: Option<&'a str>,
}

impl TryFrom<EngagementEventRow> for EngagementEvent {
    type Error = String;

    fn try_from(row: EngagementEventRow) -> Result<Self, Self::Error> {
        let engagement_type: EngagementType = row
            .engagement_type
            .parse()
            .map_err(|err| format!("engagement event {}: {err}", row.id))?;
        Ok(Self {
            id: EngagementId::from_uuid(row.id),
            customer_id: row.customer_id.map(CustomerId::from_uuid),
            platform: row.platform,
            engagement_type,
            customer_email: row.customer_email,
            content: row.content,
            email_sent: row.email_sent,
            created_at: row.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    //! Row conversion checks.
    use super::*;
    use rstest::rstest;

    fn card_row(punches: i32, capacity: i32) -> PunchcardRow {
        PunchcardRow {
            id: Uuid::new_v4(),
            customer_id: Uuid::new_v4(),
            punches,
            capacity,
            redeemed_at: None,
            redeemed_by: None,
            created_at: Utc::now(),
        }
    }

    #[rstest]
    fn punchcard_row_converts() {
        let card = Punchcard::try_from(card_row(3, 10)).expect("valid row");
        assert_eq!(card.punches, 3);
        assert_eq!(card.capacity, Capacity::DEFAULT);
        assert!(card.redemption.is_none());
    }

    #[rstest]
    #[case(-1, 10)]
    #[case(0, 0)]
    #[case(0, 70_000)]
    fn corrupt_punchcard_rows_are_rejected(#[case] punches: i32, #[case] capacity: i32) {
        assert!(Punchcard::try_from(card_row(punches, capacity)).is_err());
    }

    #[rstest]
    fn unknown_role_is_rejected() {
        let row = StaffRow {
            id: Uuid::new_v4(),
            email: "x@cafe.test".to_owned(),
            password_hash: "hash".to_owned(),
            name: "X".to_owned(),
            role: "owner".to_owned(),
            created_at: Utc::now(),
        };
        assert!(row.into_parts().is_err());
    }

    #[rstest]
    fn blank_external_id_is_treated_as_unlinked() {
        let row = CustomerRow {
            id: Uuid::new_v4(),
            name: "Ada".to_owned(),
            email: None,
            phone: None,
            shopify_customer_id: Some(" ".to_owned()),
            total_purchases: 0,
            total_spent: 0.0,
            active_punchcard_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert!(Customer::from(row).external_id.is_none());
    }
}
