//! Customer registry handlers.
//!
//! `GET /customers/search` must be registered ahead of `GET /customers/{id}`;
//! [`configure`] does so.

use actix_web::{HttpResponse, delete, get, post, put, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::{IntoParams, ToSchema};

use crate::domain::{
    Capability, CustomerDetail, CustomerId, CustomerProfile, CustomerSummary,
    CustomerValidationError, Error,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::{CustomerResponse, MessageResponse, PunchcardResponse};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, parse_id};

const CUSTOMER_ID: FieldName = FieldName::new("id");

/// Editable customer fields for create and update.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct CustomerRequest {
    #[schema(example = "Ada Lovelace")]
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl TryFrom<CustomerRequest> for CustomerProfile {
    type Error = CustomerValidationError;

    fn try_from(value: CustomerRequest) -> Result<Self, Self::Error> {
        Self::try_from_parts(&value.name, value.email.as_deref(), value.phone.as_deref())
    }
}

/// Query string for search endpoints.
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct SearchQuery {
    /// Case-insensitive substring.
    pub q: Option<String>,
}

/// Registry row with activity counters.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomerSummaryResponse {
    #[serde(flatten)]
    pub customer: CustomerResponse,
    pub punchcard_count: i64,
    pub redemption_count: i64,
    /// Punches on the active card, if the customer has one.
    pub active_punches: Option<u16>,
}

impl From<CustomerSummary> for CustomerSummaryResponse {
    fn from(value: CustomerSummary) -> Self {
        Self {
            customer: value.customer.into(),
            punchcard_count: value.punchcard_count,
            redemption_count: value.redemption_count,
            active_punches: value.active_punches,
        }
    }
}

/// Customer with every punchcard, newest first.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomerDetailResponse {
    #[serde(flatten)]
    pub customer: CustomerResponse,
    pub punchcards: Vec<PunchcardResponse>,
}

impl From<CustomerDetail> for CustomerDetailResponse {
    fn from(value: CustomerDetail) -> Self {
        Self {
            customer: value.customer.into(),
            punchcards: value
                .punchcards
                .into_iter()
                .map(PunchcardResponse::from)
                .collect(),
        }
    }
}

fn map_profile_error(err: CustomerValidationError) -> Error {
    match err {
        CustomerValidationError::EmptyName => Error::invalid_request(err.to_string())
            .with_details(json!({ "field": "name", "code": "missing_field" })),
    }
}

/// Register the customer routes in matching order.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(search_customers)
        .service(list_customers)
        .service(create_customer)
        .service(get_customer)
        .service(update_customer)
        .service(delete_customer);
}

/// List customers, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/customers",
    responses(
        (status = 200, description = "Customers", body = [CustomerSummaryResponse]),
        (status = 401, description = "Unauthorised", body = Error)
    ),
    tags = ["customers"],
    operation_id = "listCustomers"
)]
#[get("/customers")]
pub async fn list_customers(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<Vec<CustomerSummaryResponse>>> {
    session.require(Capability::Staff)?;
    let customers = state.customers.list().await?;
    Ok(web::Json(
        customers
            .into_iter()
            .map(CustomerSummaryResponse::from)
            .collect(),
    ))
}

/// Search customers by name, email, or phone.
#[utoipa::path(
    get,
    path = "/api/v1/customers/search",
    params(SearchQuery),
    responses(
        (status = 200, description = "Matching customers", body = [CustomerResponse]),
        (status = 400, description = "Missing query", body = Error),
        (status = 401, description = "Unauthorised", body = Error)
    ),
    tags = ["customers"],
    operation_id = "searchCustomers"
)]
#[get("/customers/search")]
pub async fn search_customers(
    state: web::Data<HttpState>,
    session: SessionContext,
    query: web::Query<SearchQuery>,
) -> ApiResult<web::Json<Vec<CustomerResponse>>> {
    session.require(Capability::Staff)?;
    let q = query.into_inner().q.unwrap_or_default();
    let customers = state.customers.search(&q).await?;
    Ok(web::Json(
        customers.into_iter().map(CustomerResponse::from).collect(),
    ))
}

/// Fetch one customer with their punchcards.
#[utoipa::path(
    get,
    path = "/api/v1/customers/{id}",
    params(("id" = String, Path, description = "Customer id")),
    responses(
        (status = 200, description = "Customer", body = CustomerDetailResponse),
        (status = 400, description = "Malformed id", body = Error),
        (status = 404, description = "Unknown customer", body = Error)
    ),
    tags = ["customers"],
    operation_id = "getCustomer"
)]
#[get("/customers/{id}")]
pub async fn get_customer(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<CustomerDetailResponse>> {
    session.require(Capability::Staff)?;
    let id: CustomerId = parse_id(&path.into_inner(), CUSTOMER_ID)?;
    let detail = state.customers.get(&id).await?;
    Ok(web::Json(detail.into()))
}

/// Register a customer and open their first punchcard.
#[utoipa::path(
    post,
    path = "/api/v1/customers",
    request_body = CustomerRequest,
    responses(
        (status = 201, description = "Customer created", body = CustomerDetailResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 409, description = "Email already registered", body = Error)
    ),
    tags = ["customers"],
    operation_id = "createCustomer"
)]
#[post("/customers")]
pub async fn create_customer(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<CustomerRequest>,
) -> ApiResult<HttpResponse> {
    session.require(Capability::Staff)?;
    let profile = CustomerProfile::try_from(payload.into_inner()).map_err(map_profile_error)?;
    let detail = state.customers.create(&profile).await?;
    Ok(HttpResponse::Created().json(CustomerDetailResponse::from(detail)))
}

/// Edit a customer's name, email, and phone.
#[utoipa::path(
    put,
    path = "/api/v1/customers/{id}",
    params(("id" = String, Path, description = "Customer id")),
    request_body = CustomerRequest,
    responses(
        (status = 200, description = "Customer updated", body = CustomerResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 404, description = "Unknown customer", body = Error),
        (status = 409, description = "Email already registered", body = Error)
    ),
    tags = ["customers"],
    operation_id = "updateCustomer"
)]
#[put("/customers/{id}")]
pub async fn update_customer(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<CustomerRequest>,
) -> ApiResult<web::Json<CustomerResponse>> {
    session.require(Capability::Staff)?;
    let id: CustomerId = parse_id(&path.into_inner(), CUSTOMER_ID)?;
    let profile = CustomerProfile::try_from(payload.into_inner()).map_err(map_profile_error)?;
    let customer = state.customers.update(&id, &profile).await?;
    Ok(web::Json(customer.into()))
}

/// Delete a customer with their punchcards and redemptions.
#[utoipa::path(
    delete,
    path = "/api/v1/customers/{id}",
    params(("id" = String, Path, description = "Customer id")),
    responses(
        (status = 200, description = "Customer deleted", body = MessageResponse),
        (status = 404, description = "Unknown customer", body = Error)
    ),
    tags = ["customers"],
    operation_id = "deleteCustomer"
)]
#[delete("/customers/{id}")]
pub async fn delete_customer(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<MessageResponse>> {
    session.require(Capability::Staff)?;
    let id: CustomerId = parse_id(&path.into_inner(), CUSTOMER_ID)?;
    state.customers.delete(&id).await?;
    Ok(web::Json(MessageResponse::new("Customer deleted")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        Capacity, Customer, Punchcard, PunchcardId, PurchaseStats, Role,
    };
    use crate::inbound::http::test_utils::{MockPorts, login_as, test_app};
    use actix_web::http::StatusCode;
    use actix_web::test as actix_test;
    use chrono::{TimeZone, Utc};
    use serde_json::Value;

    fn customer(name: &str) -> Customer {
        let stamp = Utc.with_ymd_and_hms(2026, 4, 2, 10, 0, 0).unwrap();
        Customer {
            id: CustomerId::random(),
            name: name.to_owned(),
            email: Some("ada@example.com".to_owned()),
            phone: None,
            external_id: None,
            stats: PurchaseStats::default(),
            active_punchcard_id: None,
            created_at: stamp,
            updated_at: stamp,
        }
    }

    #[actix_web::test]
    async fn anonymous_callers_are_rejected() {
        let app = actix_test::init_service(test_app(MockPorts::default().into_state(), configure)).await;
        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::get().uri("/api/v1/customers").to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn list_includes_counters() {
        let mut ports = MockPorts::default();
        ports.customers.expect_list().times(1).return_once(|| {
            Ok(vec![CustomerSummary {
                customer: customer("Ada"),
                punchcard_count: 2,
                redemption_count: 1,
                active_punches: Some(4),
            }])
        });
        let app = actix_test::init_service(test_app(ports.into_state(), configure)).await;
        let cookie = login_as(&app, Role::Staff).await;

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri("/api/v1/customers")
                .cookie(cookie)
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = actix_test::read_body_json(res).await;
        let first = body.get(0).expect("one customer");
        assert_eq!(first.get("name"), Some(&json!("Ada")));
        assert_eq!(first.get("punchcardCount"), Some(&json!(2)));
        assert_eq!(first.get("activePunches"), Some(&json!(4)));
    }

    #[actix_web::test]
    async fn search_is_not_captured_by_id_route() {
        let mut ports = MockPorts::default();
        ports
            .customers
            .expect_search()
            .withf(|q| q == "ada")
            .times(1)
            .return_once(|_| Ok(vec![customer("Ada")]));
        let app = actix_test::init_service(test_app(ports.into_state(), configure)).await;
        let cookie = login_as(&app, Role::Staff).await;

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri("/api/v1/customers/search?q=ada")
                .cookie(cookie)
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn create_returns_customer_with_initial_card() {
        let mut ports = MockPorts::default();
        ports
            .customers
            .expect_create()
            .withf(|profile| profile.name() == "Ada" && profile.email().is_none())
            .times(1)
            .return_once(|profile| {
                let mut created = customer(profile.name());
                created.email = None;
                let card = Punchcard {
                    id: PunchcardId::random(),
                    customer_id: created.id,
                    punches: 0,
                    capacity: Capacity::DEFAULT,
                    redemption: None,
                    created_at: created.created_at,
                };
                created.active_punchcard_id = Some(card.id);
                Ok(CustomerDetail {
                    customer: created,
                    punchcards: vec![card],
                })
            });
        let app = actix_test::init_service(test_app(ports.into_state(), configure)).await;
        let cookie = login_as(&app, Role::Staff).await;

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/v1/customers")
                .cookie(cookie)
                .set_json(json!({ "name": " Ada ", "email": "  " }))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::CREATED);
        let body: Value = actix_test::read_body_json(res).await;
        assert_eq!(body.pointer("/punchcards/0/punches"), Some(&json!(0)));
        assert_eq!(
            body.get("activePunchcardId"),
            body.pointer("/punchcards/0/id")
        );
    }

    #[actix_web::test]
    async fn create_requires_a_name() {
        let app = actix_test::init_service(test_app(MockPorts::default().into_state(), configure)).await;
        let cookie = login_as(&app, Role::Staff).await;

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/v1/customers")
                .cookie(cookie)
                .set_json(json!({ "email": "ada@example.com" }))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn missing_customer_is_not_found() {
        let mut ports = MockPorts::default();
        ports
            .customers
            .expect_get()
            .return_once(|_| Err(Error::not_found("customer not found")));
        let app = actix_test::init_service(test_app(ports.into_state(), configure)).await;
        let cookie = login_as(&app, Role::Staff).await;

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri(&format!("/api/v1/customers/{}", CustomerId::random()))
                .cookie(cookie)
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }
}
