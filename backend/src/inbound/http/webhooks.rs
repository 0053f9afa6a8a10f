//! Social engagement webhook.
//!
//! Unauthenticated; when a shared secret is configured the caller must send
//! it in the `X-Webhook-Secret` header or the `webhookSecret` body field.
//! The secret is checked before the payload is validated.

use actix_web::{HttpRequest, post, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sha2::{Digest, Sha256};
use tracing::warn;
use utoipa::ToSchema;

use crate::domain::{
    EngagementOutcome, EngagementReport, EngagementValidationError, Error, NotificationStatus,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::state::HttpState;

/// Header carrying the shared webhook secret.
pub const WEBHOOK_SECRET_HEADER: &str = "x-webhook-secret";

/// Engagement reported by a social platform integration.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct EngagementRequest {
    #[schema(example = "instagram")]
    pub platform: Option<String>,
    /// `like`, `comment`, or `share`.
    #[schema(example = "comment")]
    pub engagement_type: Option<String>,
    pub customer_email: Option<String>,
    pub customer_name: Option<String>,
    pub content: Option<String>,
    /// Alternative to the `X-Webhook-Secret` header.
    pub webhook_secret: Option<String>,
}

/// What the webhook caller is told about the event.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EngagementResponse {
    pub event_id: String,
    pub email_sent: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_error: Option<String>,
}

impl From<EngagementOutcome> for EngagementResponse {
    fn from(value: EngagementOutcome) -> Self {
        let (email_sent, email_error) = match value.notification {
            NotificationStatus::Sent => (true, None),
            NotificationStatus::SentUnrecorded { reason } => {
                (true, Some(format!("email sent but not recorded: {reason}")))
            }
            NotificationStatus::Skipped => (false, None),
            NotificationStatus::Failed { reason } => (false, Some(reason)),
        };
        Self {
            event_id: value.event_id.to_string(),
            email_sent,
            email_error,
        }
    }
}

fn map_engagement_validation_error(err: EngagementValidationError) -> Error {
    let (field, code) = match &err {
        EngagementValidationError::MissingPlatform => ("platform", "missing_field"),
        EngagementValidationError::MissingType => ("engagementType", "missing_field"),
        EngagementValidationError::InvalidType { .. } => ("engagementType", "invalid_value"),
    };
    Error::invalid_request(err.to_string()).with_details(json!({ "field": field, "code": code }))
}

/// Compare SHA-256 digests without branching on their contents, so the time
/// taken does not depend on how much of the secret was guessed.
fn secret_matches(expected: &str, presented: Option<&str>) -> bool {
    let Some(presented) = presented else {
        return false;
    };
    let expected = Sha256::digest(expected.as_bytes());
    let presented = Sha256::digest(presented.as_bytes());
    expected
        .iter()
        .zip(presented.iter())
        .fold(0_u8, |diff, (a, b)| diff | (a ^ b))
        == 0
}

fn presented_secret<'a>(request: &'a HttpRequest, body: Option<&'a str>) -> Option<&'a str> {
    request
        .headers()
        .get(WEBHOOK_SECRET_HEADER)
        .and_then(|value| value.to_str().ok())
        .or(body)
}

/// Record a social engagement and send the thank-you email.
#[utoipa::path(
    post,
    path = "/api/v1/webhooks/social-engagement",
    request_body = EngagementRequest,
    params(("X-Webhook-Secret" = Option<String>, Header, description = "Shared webhook secret")),
    responses(
        (status = 200, description = "Event recorded", body = EngagementResponse),
        (status = 400, description = "Invalid payload", body = Error),
        (status = 401, description = "Wrong or missing secret", body = Error)
    ),
    tags = ["webhooks"],
    operation_id = "socialEngagement",
    security([])
)]
#[post("/webhooks/social-engagement")]
pub async fn social_engagement(
    state: web::Data<HttpState>,
    request: HttpRequest,
    payload: web::Json<EngagementRequest>,
) -> ApiResult<web::Json<EngagementResponse>> {
    let body = payload.into_inner();
    if let Some(expected) = state.webhook_secret() {
        let presented = presented_secret(&request, body.webhook_secret.as_deref());
        if !secret_matches(expected, presented) {
            warn!("rejected engagement webhook with missing or wrong secret");
            return Err(Error::unauthorized("invalid webhook secret"));
        }
    }

    let report = EngagementReport::try_from_parts(
        body.platform.as_deref(),
        body.engagement_type.as_deref(),
        body.customer_email.as_deref(),
        body.customer_name.as_deref(),
        body.content.as_deref(),
    )
    .map_err(map_engagement_validation_error)?;

    let outcome = state.engagements.record(&report).await?;
    Ok(web::Json(outcome.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{EngagementId, EngagementType};
    use crate::inbound::http::test_utils::{MockPorts, test_app};
    use actix_web::http::StatusCode;
    use actix_web::test as actix_test;
    use rstest::rstest;
    use serde_json::Value;
    use zeroize::Zeroizing;

    fn routes(cfg: &mut web::ServiceConfig) {
        cfg.service(social_engagement);
    }

    fn state_with_secret(ports: MockPorts, secret: Option<&str>) -> web::Data<HttpState> {
        web::Data::new(
            ports
                .into_http_state()
                .with_webhook_secret(secret.map(|s| Zeroizing::new(s.to_owned()))),
        )
    }

    fn outcome(notification: NotificationStatus) -> EngagementOutcome {
        EngagementOutcome {
            event_id: EngagementId::random(),
            notification,
        }
    }

    #[actix_web::test]
    async fn records_engagement_and_reports_email() {
        let mut ports = MockPorts::default();
        ports
            .engagements
            .expect_record()
            .withf(|report| {
                report.platform() == "instagram"
                    && report.engagement_type() == EngagementType::Comment
                    && report.customer_email() == Some("fan@example.com")
            })
            .times(1)
            .return_once(|_| Ok(outcome(NotificationStatus::Sent)));
        let app = actix_test::init_service(test_app(state_with_secret(ports, None), routes)).await;

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/v1/webhooks/social-engagement")
                .set_json(json!({
                    "platform": "instagram",
                    "engagementType": "comment",
                    "customerEmail": "Fan@Example.com",
                    "content": "Love it"
                }))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = actix_test::read_body_json(res).await;
        assert_eq!(body.get("emailSent"), Some(&json!(true)));
        assert!(body.get("emailError").is_none());
    }

    #[rstest]
    #[case(Some("hook-secret"), true)]
    #[case(Some("hook-secreT"), false)]
    #[case(Some("hook-secret-longer"), false)]
    #[case(Some(""), false)]
    #[case(None, false)]
    fn secret_comparison(#[case] presented: Option<&str>, #[case] accepted: bool) {
        assert_eq!(secret_matches("hook-secret", presented), accepted);
    }

    #[actix_web::test]
    async fn unsaved_sent_flag_still_reports_email_sent() {
        let mut ports = MockPorts::default();
        ports.engagements.expect_record().return_once(|_| {
            Ok(outcome(NotificationStatus::SentUnrecorded {
                reason: "engagement repository connection failed: refused".to_owned(),
            }))
        });
        let app = actix_test::init_service(test_app(state_with_secret(ports, None), routes)).await;

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/v1/webhooks/social-engagement")
                .set_json(json!({
                    "platform": "facebook",
                    "engagementType": "like",
                    "customerEmail": "fan@example.com"
                }))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = actix_test::read_body_json(res).await;
        assert_eq!(body.get("emailSent"), Some(&json!(true)));
        let error = body
            .get("emailError")
            .and_then(Value::as_str)
            .expect("unsaved flag reported");
        assert!(error.starts_with("email sent but not recorded"));
    }

    #[actix_web::test]
    async fn failed_email_is_reported_not_raised() {
        let mut ports = MockPorts::default();
        ports.engagements.expect_record().return_once(|_| {
            Ok(outcome(NotificationStatus::Failed {
                reason: "email not configured".to_owned(),
            }))
        });
        let app = actix_test::init_service(test_app(state_with_secret(ports, None), routes)).await;

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/v1/webhooks/social-engagement")
                .set_json(json!({
                    "platform": "tiktok",
                    "engagementType": "share",
                    "customerEmail": "fan@example.com"
                }))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = actix_test::read_body_json(res).await;
        assert_eq!(body.get("emailSent"), Some(&json!(false)));
        assert_eq!(body.get("emailError"), Some(&json!("email not configured")));
    }

    #[rstest]
    #[case(json!({ "engagementType": "like" }), "platform")]
    #[case(json!({ "platform": "x" }), "engagementType")]
    #[case(json!({ "platform": "x", "engagementType": "follow" }), "engagementType")]
    #[actix_web::test]
    async fn invalid_payloads_are_rejected(#[case] body: Value, #[case] field: &str) {
        let app = actix_test::init_service(test_app(
            state_with_secret(MockPorts::default(), None),
            routes,
        ))
        .await;

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/v1/webhooks/social-engagement")
                .set_json(body)
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body: Value = actix_test::read_body_json(res).await;
        assert_eq!(
            body.pointer("/details/field").and_then(Value::as_str),
            Some(field)
        );
    }

    #[rstest]
    #[case(None, None)]
    #[case(Some("wrong"), None)]
    #[case(None, Some("wrong"))]
    #[actix_web::test]
    async fn wrong_secret_is_rejected_before_validation(
        #[case] header: Option<&str>,
        #[case] body_secret: Option<&str>,
    ) {
        let app = actix_test::init_service(test_app(
            state_with_secret(MockPorts::default(), Some("hook-secret")),
            routes,
        ))
        .await;

        let mut request = actix_test::TestRequest::post()
            .uri("/api/v1/webhooks/social-engagement")
            .set_json(json!({ "webhookSecret": body_secret }));
        if let Some(value) = header {
            request = request.insert_header((WEBHOOK_SECRET_HEADER, value));
        }
        let res = actix_test::call_service(&app, request.to_request()).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[rstest]
    #[case(Some("hook-secret"), None)]
    #[case(None, Some("hook-secret"))]
    #[actix_web::test]
    async fn secret_accepted_from_header_or_body(
        #[case] header: Option<&str>,
        #[case] body_secret: Option<&str>,
    ) {
        let mut ports = MockPorts::default();
        ports
            .engagements
            .expect_record()
            .times(1)
            .return_once(|_| Ok(outcome(NotificationStatus::Skipped)));
        let app = actix_test::init_service(test_app(
            state_with_secret(ports, Some("hook-secret")),
            routes,
        ))
        .await;

        let mut request = actix_test::TestRequest::post()
            .uri("/api/v1/webhooks/social-engagement")
            .set_json(json!({
                "platform": "instagram",
                "engagementType": "like",
                "webhookSecret": body_secret
            }));
        if let Some(value) = header {
            request = request.insert_header((WEBHOOK_SECRET_HEADER, value));
        }
        let res = actix_test::call_service(&app, request.to_request()).await;
        assert_eq!(res.status(), StatusCode::OK);
    }
}
