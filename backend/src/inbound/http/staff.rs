//! Manager-only staff account administration.

use actix_web::{HttpResponse, delete, get, post, put, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

use crate::domain::{
    Capability, Error, NewPassword, StaffDraft, StaffId, StaffUpdate, StaffValidationError,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::{MessageResponse, StaffResponse};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, missing_field_error, parse_id, required};

const STAFF_ID: FieldName = FieldName::new("id");

/// Body for `POST /api/v1/staff`.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateStaffRequest {
    pub email: String,
    pub password: String,
    pub name: String,
    /// `staff` or `manager`.
    #[schema(example = "staff")]
    pub role: String,
}

/// Body for `PUT /api/v1/staff/{id}`.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateStaffRequest {
    pub name: String,
    pub role: String,
}

/// Body for `POST /api/v1/staff/{id}/reset-password`.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct ResetPasswordRequest {
    pub new_password: Option<String>,
}

fn map_staff_validation_error(err: StaffValidationError) -> Error {
    let field = err.field();
    let code = match err {
        StaffValidationError::InvalidRole { .. } => "invalid_role",
        _ => "missing_field",
    };
    Error::invalid_request(err.to_string()).with_details(json!({ "field": field, "code": code }))
}

/// List every staff account.
#[utoipa::path(
    get,
    path = "/api/v1/staff",
    responses(
        (status = 200, description = "Staff accounts", body = [StaffResponse]),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Manager access required", body = Error)
    ),
    tags = ["staff"],
    operation_id = "listStaff"
)]
#[get("/staff")]
pub async fn list_staff(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<Vec<StaffResponse>>> {
    session.require(Capability::Manager)?;
    let staff = state.staff.list().await?;
    Ok(web::Json(staff.into_iter().map(StaffResponse::from).collect()))
}

/// Create a staff account.
#[utoipa::path(
    post,
    path = "/api/v1/staff",
    request_body = CreateStaffRequest,
    responses(
        (status = 201, description = "Account created", body = StaffResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 403, description = "Manager access required", body = Error),
        (status = 409, description = "Email already registered", body = Error)
    ),
    tags = ["staff"],
    operation_id = "createStaff"
)]
#[post("/staff")]
pub async fn create_staff(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<CreateStaffRequest>,
) -> ApiResult<HttpResponse> {
    session.require(Capability::Manager)?;
    let CreateStaffRequest {
        email,
        password,
        name,
        role,
    } = payload.into_inner();
    let draft = StaffDraft::try_from_parts(&email, &password, &name, &role)
        .map_err(map_staff_validation_error)?;
    let created = state.staff.create(&draft).await?;
    Ok(HttpResponse::Created().json(StaffResponse::from(created)))
}

/// Change a staff member's name and role.
#[utoipa::path(
    put,
    path = "/api/v1/staff/{id}",
    params(("id" = String, Path, description = "Staff id")),
    request_body = UpdateStaffRequest,
    responses(
        (status = 200, description = "Account updated", body = StaffResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 403, description = "Manager access required", body = Error),
        (status = 404, description = "Unknown staff member", body = Error)
    ),
    tags = ["staff"],
    operation_id = "updateStaff"
)]
#[put("/staff/{id}")]
pub async fn update_staff(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<UpdateStaffRequest>,
) -> ApiResult<web::Json<StaffResponse>> {
    session.require(Capability::Manager)?;
    let id: StaffId = parse_id(&path.into_inner(), STAFF_ID)?;
    let UpdateStaffRequest { name, role } = payload.into_inner();
    let update = StaffUpdate::try_from_parts(&name, &role).map_err(map_staff_validation_error)?;
    let updated = state.staff.update(&id, &update).await?;
    Ok(web::Json(updated.into()))
}

/// Delete a staff account. Managers cannot delete themselves.
#[utoipa::path(
    delete,
    path = "/api/v1/staff/{id}",
    params(("id" = String, Path, description = "Staff id")),
    responses(
        (status = 200, description = "Account deleted", body = MessageResponse),
        (status = 400, description = "Attempted self-deletion", body = Error),
        (status = 403, description = "Manager access required", body = Error),
        (status = 404, description = "Unknown staff member", body = Error)
    ),
    tags = ["staff"],
    operation_id = "deleteStaff"
)]
#[delete("/staff/{id}")]
pub async fn delete_staff(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<MessageResponse>> {
    let principal = session.require(Capability::Manager)?;
    let id: StaffId = parse_id(&path.into_inner(), STAFF_ID)?;
    state.staff.delete(&principal, &id).await?;
    Ok(web::Json(MessageResponse::new("Staff member deleted")))
}

/// Set a new password for another staff member.
#[utoipa::path(
    post,
    path = "/api/v1/staff/{id}/reset-password",
    params(("id" = String, Path, description = "Staff id")),
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password reset", body = MessageResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 403, description = "Manager access required", body = Error),
        (status = 404, description = "Unknown staff member", body = Error)
    ),
    tags = ["staff"],
    operation_id = "resetStaffPassword"
)]
#[post("/staff/{id}/reset-password")]
pub async fn reset_password(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<ResetPasswordRequest>,
) -> ApiResult<web::Json<MessageResponse>> {
    session.require(Capability::Manager)?;
    let id: StaffId = parse_id(&path.into_inner(), STAFF_ID)?;
    let field = FieldName::new("newPassword");
    let raw = required(payload.into_inner().new_password, field)?;
    let password = NewPassword::new(&raw).map_err(|_| missing_field_error(field))?;
    state.staff.reset_password(&id, &password).await?;
    Ok(web::Json(MessageResponse::new("Password reset successfully")))
}
