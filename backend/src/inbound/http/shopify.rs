//! Commerce-system synchronisation handlers.

use actix_web::{get, post, web};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::{
    Capability, Error, ExternalCustomer, ExternalCustomerId, SyncAction, SyncFailure,
    SyncOutcome, SyncSummary,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::customers::SearchQuery;
use crate::inbound::http::schemas::CustomerResponse;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, invalid_field_error};

/// Customer record as returned by the commerce system.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExternalCustomerResponse {
    #[schema(example = "207119551")]
    pub id: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub orders_count: i32,
    pub total_spent: f64,
}

impl From<ExternalCustomer> for ExternalCustomerResponse {
    fn from(value: ExternalCustomer) -> Self {
        Self {
            id: value.id.as_str().to_owned(),
            first_name: value.first_name,
            last_name: value.last_name,
            email: value.email,
            phone: value.phone,
            orders_count: value.orders_count,
            total_spent: value.total_spent,
        }
    }
}

/// Which branch a single-customer sync took.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SyncOutcomeResponse {
    /// `created` or `updated`.
    #[schema(example = "created")]
    pub action: String,
    pub customer: CustomerResponse,
}

impl From<SyncOutcome> for SyncOutcomeResponse {
    fn from(value: SyncOutcome) -> Self {
        let action = match value.action {
            SyncAction::Created => "created",
            SyncAction::Updated => "updated",
        };
        Self {
            action: action.to_owned(),
            customer: value.customer.into(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SyncFailureResponse {
    pub external_id: String,
    pub reason: String,
}

impl From<SyncFailure> for SyncFailureResponse {
    fn from(value: SyncFailure) -> Self {
        Self {
            external_id: value.external_id,
            reason: value.reason,
        }
    }
}

/// Counts for a batch sync. Records listed in `failures` were skipped.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SyncSummaryResponse {
    pub total: usize,
    pub created: usize,
    pub updated: usize,
    pub failures: Vec<SyncFailureResponse>,
}

impl From<SyncSummary> for SyncSummaryResponse {
    fn from(value: SyncSummary) -> Self {
        Self {
            total: value.total,
            created: value.created,
            updated: value.updated,
            failures: value
                .failures
                .into_iter()
                .map(SyncFailureResponse::from)
                .collect(),
        }
    }
}

/// Create or update one local customer from the commerce system.
#[utoipa::path(
    post,
    path = "/api/v1/shopify/customers/{externalId}/sync",
    params(("externalId" = String, Path, description = "Commerce-system customer id")),
    responses(
        (status = 200, description = "Customer reconciled", body = SyncOutcomeResponse),
        (status = 404, description = "Unknown external customer", body = Error),
        (status = 502, description = "Commerce system failure", body = Error),
        (status = 503, description = "Commerce system not configured", body = Error)
    ),
    tags = ["shopify"],
    operation_id = "syncShopifyCustomer"
)]
#[post("/shopify/customers/{external_id}/sync")]
pub async fn sync_one(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<SyncOutcomeResponse>> {
    session.require(Capability::Staff)?;
    let external_id = ExternalCustomerId::new(path.into_inner()).map_err(|err| {
        invalid_field_error(FieldName::new("externalId"), err.to_string())
    })?;
    let outcome = state.sync.sync_one(&external_id).await?;
    Ok(web::Json(outcome.into()))
}

/// Reconcile one page of commerce customers.
#[utoipa::path(
    post,
    path = "/api/v1/shopify/customers/sync",
    responses(
        (status = 200, description = "Batch summary", body = SyncSummaryResponse),
        (status = 502, description = "Commerce system failure", body = Error),
        (status = 503, description = "Commerce system not configured", body = Error)
    ),
    tags = ["shopify"],
    operation_id = "syncAllShopifyCustomers"
)]
#[post("/shopify/customers/sync")]
pub async fn sync_all(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<SyncSummaryResponse>> {
    session.require(Capability::Staff)?;
    let summary = state.sync.sync_all().await?;
    Ok(web::Json(summary.into()))
}

/// Search the commerce system directly. Nothing is stored.
#[utoipa::path(
    get,
    path = "/api/v1/shopify/customers/search",
    params(SearchQuery),
    responses(
        (status = 200, description = "External records", body = [ExternalCustomerResponse]),
        (status = 400, description = "Missing query", body = Error),
        (status = 503, description = "Commerce system not configured", body = Error)
    ),
    tags = ["shopify"],
    operation_id = "searchShopifyCustomers"
)]
#[get("/shopify/customers/search")]
pub async fn search(
    state: web::Data<HttpState>,
    session: SessionContext,
    query: web::Query<SearchQuery>,
) -> ApiResult<web::Json<Vec<ExternalCustomerResponse>>> {
    session.require(Capability::Staff)?;
    let q = query.into_inner().q.unwrap_or_default();
    let customers = state.sync.search(&q).await?;
    Ok(web::Json(
        customers
            .into_iter()
            .map(ExternalCustomerResponse::from)
            .collect(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Customer, CustomerId, PurchaseStats, Role};
    use crate::inbound::http::test_utils::{MockPorts, login_as, test_app};
    use actix_web::http::StatusCode;
    use actix_web::test as actix_test;
    use chrono::{TimeZone, Utc};
    use serde_json::{Value, json};

    fn routes(cfg: &mut web::ServiceConfig) {
        cfg.service(search).service(sync_all).service(sync_one);
    }

    fn synced_customer(external_id: &ExternalCustomerId) -> Customer {
        let stamp = Utc.with_ymd_and_hms(2026, 6, 1, 8, 0, 0).unwrap();
        Customer {
            id: CustomerId::random(),
            name: "Ada Lovelace".to_owned(),
            email: Some("ada@example.com".to_owned()),
            phone: None,
            external_id: Some(external_id.clone()),
            stats: PurchaseStats {
                total_purchases: 3,
                total_spent: 199.65,
            },
            active_punchcard_id: None,
            created_at: stamp,
            updated_at: stamp,
        }
    }

    #[actix_web::test]
    async fn sync_one_reports_action() {
        let mut ports = MockPorts::default();
        ports
            .sync
            .expect_sync_one()
            .withf(|id| id.as_str() == "207119551")
            .times(1)
            .return_once(|id| {
                Ok(SyncOutcome {
                    action: SyncAction::Created,
                    customer: synced_customer(id),
                })
            });
        let app = actix_test::init_service(test_app(ports.into_state(), routes)).await;
        let cookie = login_as(&app, Role::Staff).await;

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/v1/shopify/customers/207119551/sync")
                .cookie(cookie)
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = actix_test::read_body_json(res).await;
        assert_eq!(body.get("action"), Some(&json!("created")));
        assert_eq!(
            body.pointer("/customer/shopifyCustomerId"),
            Some(&json!("207119551"))
        );
    }

    #[actix_web::test]
    async fn sync_all_lists_failures() {
        let mut ports = MockPorts::default();
        ports.sync.expect_sync_all().times(1).return_once(|| {
            Ok(SyncSummary {
                total: 3,
                created: 1,
                updated: 1,
                failures: vec![SyncFailure {
                    external_id: "42".to_owned(),
                    reason: "email already registered".to_owned(),
                }],
            })
        });
        let app = actix_test::init_service(test_app(ports.into_state(), routes)).await;
        let cookie = login_as(&app, Role::Staff).await;

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/v1/shopify/customers/sync")
                .cookie(cookie)
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = actix_test::read_body_json(res).await;
        assert_eq!(body.get("total"), Some(&json!(3)));
        assert_eq!(body.pointer("/failures/0/externalId"), Some(&json!("42")));
    }

    #[actix_web::test]
    async fn unconfigured_commerce_system_is_unavailable() {
        let mut ports = MockPorts::default();
        ports
            .sync
            .expect_search()
            .return_once(|_| Err(Error::service_unavailable("Shopify API not configured")));
        let app = actix_test::init_service(test_app(ports.into_state(), routes)).await;
        let cookie = login_as(&app, Role::Staff).await;

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri("/api/v1/shopify/customers/search?q=ada")
                .cookie(cookie)
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body: Value = actix_test::read_body_json(res).await;
        assert_eq!(body.get("message"), Some(&json!("Shopify API not configured")));
    }

    #[actix_web::test]
    async fn upstream_status_is_surfaced() {
        let mut ports = MockPorts::default();
        ports.sync.expect_sync_all().return_once(|| {
            Err(Error::external_service("Shopify request failed")
                .with_details(json!({ "upstreamStatus": 429 })))
        });
        let app = actix_test::init_service(test_app(ports.into_state(), routes)).await;
        let cookie = login_as(&app, Role::Staff).await;

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/v1/shopify/customers/sync")
                .cookie(cookie)
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);
    }
}
