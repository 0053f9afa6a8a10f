//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] registers every `/api/v1` handler, the probes, and the
//! response DTOs from `inbound::http`. The session cookie security scheme
//! is added by a modifier; login, the webhook, and the probes opt out of it.
//!
//! The generated document is served by Swagger UI in debug builds.

use crate::domain::{Error, ErrorCode};
use crate::inbound::http::auth::{ChangePasswordRequest, LoginRequest};
use crate::inbound::http::customers::{
    CustomerDetailResponse, CustomerRequest, CustomerSummaryResponse,
};
use crate::inbound::http::punchcards::{PunchResponse, RedeemRequest, RedeemResponse};
use crate::inbound::http::schemas::{
    CustomerResponse, MessageResponse, PunchcardListingResponse, PunchcardResponse,
    RedemptionRecordResponse, RedemptionResponse, StaffResponse,
};
use crate::inbound::http::shopify::{
    ExternalCustomerResponse, SyncFailureResponse, SyncOutcomeResponse, SyncSummaryResponse,
};
use crate::inbound::http::staff::{CreateStaffRequest, ResetPasswordRequest, UpdateStaffRequest};
use crate::inbound::http::webhooks::{EngagementRequest, EngagementResponse};
use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// Enrich the generated document with the session cookie security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "SessionCookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                "session",
                "Session cookie issued by POST /api/v1/login.",
            ))),
        );
    }
}

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Punchcard back office API",
        description = "Staff-facing loyalty punchcards, customer registry, commerce sync, and engagement webhooks."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("SessionCookie" = [])),
    paths(
        crate::inbound::http::auth::login,
        crate::inbound::http::auth::logout,
        crate::inbound::http::auth::me,
        crate::inbound::http::auth::change_password,
        crate::inbound::http::customers::list_customers,
        crate::inbound::http::customers::search_customers,
        crate::inbound::http::customers::get_customer,
        crate::inbound::http::customers::create_customer,
        crate::inbound::http::customers::update_customer,
        crate::inbound::http::customers::delete_customer,
        crate::inbound::http::punchcards::list_punchcards,
        crate::inbound::http::punchcards::list_customer_punchcards,
        crate::inbound::http::punchcards::add_punch,
        crate::inbound::http::punchcards::redeem,
        crate::inbound::http::punchcards::list_redemptions,
        crate::inbound::http::staff::list_staff,
        crate::inbound::http::staff::create_staff,
        crate::inbound::http::staff::update_staff,
        crate::inbound::http::staff::delete_staff,
        crate::inbound::http::staff::reset_password,
        crate::inbound::http::shopify::sync_one,
        crate::inbound::http::shopify::sync_all,
        crate::inbound::http::shopify::search,
        crate::inbound::http::webhooks::social_engagement,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        Error,
        ErrorCode,
        LoginRequest,
        ChangePasswordRequest,
        StaffResponse,
        CreateStaffRequest,
        UpdateStaffRequest,
        ResetPasswordRequest,
        CustomerRequest,
        CustomerResponse,
        CustomerSummaryResponse,
        CustomerDetailResponse,
        PunchcardResponse,
        PunchcardListingResponse,
        PunchResponse,
        RedeemRequest,
        RedeemResponse,
        RedemptionResponse,
        RedemptionRecordResponse,
        ExternalCustomerResponse,
        SyncOutcomeResponse,
        SyncFailureResponse,
        SyncSummaryResponse,
        EngagementRequest,
        EngagementResponse,
        MessageResponse,
    )),
    tags(
        (name = "auth", description = "Staff login and session"),
        (name = "customers", description = "Customer registry"),
        (name = "punchcards", description = "Punches, redemptions, and the redemption log"),
        (name = "staff", description = "Manager-only staff administration"),
        (name = "shopify", description = "Commerce-system synchronisation"),
        (name = "webhooks", description = "Inbound social engagement events"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;
