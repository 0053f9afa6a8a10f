//! Punchcard lifecycle handlers: punching, redeeming, and the redemption log.

use actix_web::{get, post, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{
    Capability, CustomerId, Error, PunchOutcome, PunchcardId, RedeemOutcome,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::{
    PunchcardListingResponse, PunchcardResponse, RedemptionRecordResponse, RedemptionResponse,
};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, parse_id};

const CUSTOMER_ID: FieldName = FieldName::new("customerId");
const PUNCHCARD_ID: FieldName = FieldName::new("punchcardId");

/// Result of a punch.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PunchResponse {
    pub punchcard: PunchcardResponse,
    pub punches: u16,
    pub remaining: u16,
    pub is_full: bool,
}

impl From<PunchOutcome> for PunchResponse {
    fn from(value: PunchOutcome) -> Self {
        Self {
            punchcard: value.punchcard.into(),
            punches: value.punches,
            remaining: value.remaining,
            is_full: value.is_full,
        }
    }
}

/// Optional redemption note.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct RedeemRequest {
    #[schema(example = "Free flat white")]
    pub notes: Option<String>,
}

/// Result of a redemption.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RedeemResponse {
    pub redemption: RedemptionResponse,
    pub redeemed_punchcard: PunchcardResponse,
    pub new_punchcard: PunchcardResponse,
}

impl From<RedeemOutcome> for RedeemResponse {
    fn from(value: RedeemOutcome) -> Self {
        Self {
            redemption: value.redemption.into(),
            redeemed_punchcard: value.redeemed.into(),
            new_punchcard: value.new_punchcard.into(),
        }
    }
}

/// Every punchcard with customer and redeemer names.
#[utoipa::path(
    get,
    path = "/api/v1/punchcards",
    responses(
        (status = 200, description = "Punchcards", body = [PunchcardListingResponse]),
        (status = 401, description = "Unauthorised", body = Error)
    ),
    tags = ["punchcards"],
    operation_id = "listPunchcards"
)]
#[get("/punchcards")]
pub async fn list_punchcards(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<Vec<PunchcardListingResponse>>> {
    session.require(Capability::Staff)?;
    let cards = state.punchcards.list_all().await?;
    Ok(web::Json(
        cards
            .into_iter()
            .map(PunchcardListingResponse::from)
            .collect(),
    ))
}

/// A customer's punchcards, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/customers/{id}/punchcards",
    params(("id" = String, Path, description = "Customer id")),
    responses(
        (status = 200, description = "Punchcards", body = [PunchcardResponse]),
        (status = 404, description = "Unknown customer", body = Error)
    ),
    tags = ["punchcards"],
    operation_id = "listCustomerPunchcards"
)]
#[get("/customers/{id}/punchcards")]
pub async fn list_customer_punchcards(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<Vec<PunchcardResponse>>> {
    session.require(Capability::Staff)?;
    let id: CustomerId = parse_id(&path.into_inner(), CUSTOMER_ID)?;
    let cards = state.punchcards.list_for_customer(&id).await?;
    Ok(web::Json(
        cards.into_iter().map(PunchcardResponse::from).collect(),
    ))
}

/// Add one punch to the customer's active card.
#[utoipa::path(
    post,
    path = "/api/v1/customers/{id}/punch",
    params(("id" = String, Path, description = "Customer id")),
    responses(
        (status = 200, description = "Punch recorded", body = PunchResponse),
        (status = 404, description = "Unknown customer or no active card", body = Error),
        (status = 409, description = "Card full or concurrently modified", body = Error)
    ),
    tags = ["punchcards"],
    operation_id = "addPunch"
)]
#[post("/customers/{id}/punch")]
pub async fn add_punch(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<PunchResponse>> {
    session.require(Capability::Staff)?;
    let id: CustomerId = parse_id(&path.into_inner(), CUSTOMER_ID)?;
    let outcome = state.punchcards.add_punch(&id).await?;
    Ok(web::Json(outcome.into()))
}

/// Redeem a full card and open the customer's next one.
#[utoipa::path(
    post,
    path = "/api/v1/punchcards/{id}/redeem",
    params(("id" = String, Path, description = "Punchcard id")),
    request_body = RedeemRequest,
    responses(
        (status = 200, description = "Card redeemed", body = RedeemResponse),
        (status = 404, description = "Unknown punchcard", body = Error),
        (status = 409, description = "Card not full or already redeemed", body = Error)
    ),
    tags = ["punchcards"],
    operation_id = "redeemPunchcard"
)]
#[post("/punchcards/{id}/redeem")]
pub async fn redeem(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: Option<web::Json<RedeemRequest>>,
) -> ApiResult<web::Json<RedeemResponse>> {
    let principal = session.require(Capability::Staff)?;
    let id: PunchcardId = parse_id(&path.into_inner(), PUNCHCARD_ID)?;
    let notes = payload
        .and_then(|body| body.into_inner().notes)
        .map(|notes| notes.trim().to_owned())
        .filter(|notes| !notes.is_empty());
    let outcome = state
        .punchcards
        .redeem(&id, &principal.staff_id(), notes)
        .await?;
    Ok(web::Json(outcome.into()))
}

/// Redemption log, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/redemptions",
    responses(
        (status = 200, description = "Redemptions", body = [RedemptionRecordResponse]),
        (status = 401, description = "Unauthorised", body = Error)
    ),
    tags = ["punchcards"],
    operation_id = "listRedemptions"
)]
#[get("/redemptions")]
pub async fn list_redemptions(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<Vec<RedemptionRecordResponse>>> {
    session.require(Capability::Staff)?;
    let records = state.punchcards.list_redemptions().await?;
    Ok(web::Json(
        records
            .into_iter()
            .map(RedemptionRecordResponse::from)
            .collect(),
    ))
}
