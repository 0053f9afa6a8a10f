//! Staff authentication handlers.
//!
//! ```text
//! POST /api/v1/login {"email":"admin@example.com","password":"admin123"}
//! POST /api/v1/logout
//! GET /api/v1/me
//! POST /api/v1/change-password {"currentPassword":"…","newPassword":"…"}
//! ```

use actix_web::{HttpResponse, get, post, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

use crate::domain::{
    Capability, Error, LoginCredentials, LoginValidationError, NewPassword, Principal,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::{MessageResponse, StaffResponse};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, missing_field_error, required};

/// Login request body for `POST /api/v1/login`.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct LoginRequest {
    #[schema(example = "admin@example.com")]
    pub email: String,
    pub password: String,
}

impl TryFrom<LoginRequest> for LoginCredentials {
    type Error = LoginValidationError;

    fn try_from(value: LoginRequest) -> Result<Self, Self::Error> {
        Self::try_from_parts(&value.email, &value.password)
    }
}

/// Body for `POST /api/v1/change-password`.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct ChangePasswordRequest {
    pub current_password: Option<String>,
    pub new_password: Option<String>,
}

fn map_login_validation_error(err: LoginValidationError) -> Error {
    match err {
        LoginValidationError::EmptyEmail => Error::invalid_request("email must not be empty")
            .with_details(json!({ "field": "email", "code": "empty_email" })),
        LoginValidationError::EmptyPassword => Error::invalid_request("password must not be empty")
            .with_details(json!({ "field": "password", "code": "empty_password" })),
    }
}

/// Authenticate a staff member and establish a session.
#[utoipa::path(
    post,
    path = "/api/v1/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login success", body = StaffResponse,
            headers(("Set-Cookie" = String, description = "Session cookie"))),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Invalid credentials", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["auth"],
    operation_id = "login",
    security([])
)]
#[post("/login")]
pub async fn login(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<LoginRequest>,
) -> ApiResult<web::Json<StaffResponse>> {
    let credentials =
        LoginCredentials::try_from(payload.into_inner()).map_err(map_login_validation_error)?;
    let staff = state.staff.authenticate(&credentials).await?;
    session.persist_principal(&Principal::new(staff.id, staff.role))?;
    Ok(web::Json(staff.into()))
}

/// End the current session.
#[utoipa::path(
    post,
    path = "/api/v1/logout",
    responses((status = 200, description = "Session cleared", body = MessageResponse)),
    tags = ["auth"],
    operation_id = "logout"
)]
#[post("/logout")]
pub async fn logout(session: SessionContext) -> HttpResponse {
    session.clear();
    HttpResponse::Ok().json(MessageResponse::new("Logout successful"))
}

/// Profile of the logged-in staff member.
#[utoipa::path(
    get,
    path = "/api/v1/me",
    responses(
        (status = 200, description = "Current staff member", body = StaffResponse),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Account no longer exists", body = Error)
    ),
    tags = ["auth"],
    operation_id = "currentStaff"
)]
#[get("/me")]
pub async fn me(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<StaffResponse>> {
    let principal = session.require(Capability::Staff)?;
    let staff = state.staff.profile(&principal.staff_id()).await?;
    Ok(web::Json(staff.into()))
}

/// Replace the caller's password after verifying the current one.
#[utoipa::path(
    post,
    path = "/api/v1/change-password",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed", body = MessageResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised or wrong current password", body = Error)
    ),
    tags = ["auth"],
    operation_id = "changePassword"
)]
#[post("/change-password")]
pub async fn change_password(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<ChangePasswordRequest>,
) -> ApiResult<web::Json<MessageResponse>> {
    let principal = session.require(Capability::Staff)?;
    let ChangePasswordRequest {
        current_password,
        new_password,
    } = payload.into_inner();
    let current = current_password
        .filter(|password| !password.is_empty())
        .ok_or_else(|| missing_field_error(FieldName::new("currentPassword")))?;
    let new_password = required(new_password, FieldName::new("newPassword"))
        .and_then(|raw| NewPassword::new(&raw).map_err(map_login_validation_error))?;

    state
        .staff
        .change_password(&principal.staff_id(), &current, &new_password)
        .await?;
    Ok(web::Json(MessageResponse::new("Password changed successfully")))
}
