//! Domain primitives, aggregates, and services.
//!
//! Purpose: hold the punchcard lifecycle, customer reconciliation, and staff
//! rules independent of HTTP and storage. Services depend only on the traits
//! in [`ports`]; adapters in `inbound` and `outbound` plug into them.
//!
//! Public surface:
//! - Error / ErrorCode: transport-agnostic failure payload.
//! - Punchcard, Capacity, PunchOutcome: the card state machine.
//! - Customer, CustomerProfile: the local registry.
//! - ExternalCustomer, SyncSummary: commerce-system reconciliation.
//! - EngagementReport, OutboundEmail: webhook-triggered notifications.

pub mod auth;
pub mod customer;
pub mod engagement;
pub mod error;
pub mod external_customer;
pub mod ids;
pub mod ports;
pub mod punchcard;
pub mod redemption;
pub mod staff;
pub mod trace_id;

mod customer_service;
mod engagement_service;
mod punchcard_service;
mod staff_service;
mod sync_service;

pub use self::auth::{
    Capability, LoginCredentials, LoginValidationError, NewPassword, Principal, Role,
    RoleParseError,
};
pub use self::customer::{
    Customer, CustomerDetail, CustomerProfile, CustomerSummary, CustomerValidationError,
    NewCustomer, PurchaseStats,
};
pub use self::customer_service::CustomerService;
pub use self::engagement::{
    EngagementEvent, EngagementOutcome, EngagementReport, EngagementType,
    EngagementValidationError, NewEngagementEvent, NotificationStatus, OutboundEmail,
};
pub use self::engagement_service::EngagementService;
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::external_customer::{
    EmptyExternalId, ExternalCustomer, ExternalCustomerId, ExternalPage, SyncAction, SyncFailure,
    SyncOutcome, SyncSummary,
};
pub use self::ids::{CustomerId, EngagementId, PunchcardId, RedemptionId, StaffId};
pub use self::punchcard::{
    Capacity, PunchOutcome, Punchcard, PunchcardListing, PunchcardRuleError, PunchcardState,
    RedemptionStamp,
};
pub use self::punchcard_service::PunchcardService;
pub use self::redemption::{RedeemOutcome, Redemption, RedemptionRecord, RedemptionRequest};
pub use self::staff::{StaffDraft, StaffMember, StaffUpdate, StaffValidationError};
pub use self::staff_service::StaffService;
pub use self::sync_service::CustomerSyncService;
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};
