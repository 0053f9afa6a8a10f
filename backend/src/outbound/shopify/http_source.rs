//! Reqwest-backed Shopify customer source.
//!
//! This adapter owns transport details only: URL construction, the access
//! token header, timeout and status mapping, and JSON decoding into domain
//! customers. An adapter built without credentials answers every call with
//! [`CustomerSourceError::NotConfigured`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use zeroize::Zeroizing;

use super::dto::{CustomerEnvelopeDto, CustomerListDto};
use crate::domain::ports::{CustomerSource, CustomerSourceError};
use crate::domain::{ExternalCustomer, ExternalCustomerId, ExternalPage};

const ACCESS_TOKEN_HEADER: &str = "X-Shopify-Access-Token";
const USER_AGENT: &str = concat!("punchcard-backend/", env!("CARGO_PKG_VERSION"));

/// Store coordinates and credentials for the Admin API.
pub struct ShopifyEndpoint {
    /// Store host, for example `my-cafe.myshopify.com`.
    pub store_domain: String,
    pub access_token: String,
    /// Admin API version, for example `2024-01`.
    pub api_version: String,
}

/// Raised when the adapter cannot be constructed.
#[derive(Debug, thiserror::Error)]
pub enum ShopifySetupError {
    #[error("invalid Shopify store address: {0}")]
    InvalidStore(String),
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

struct Connection {
    client: Client,
    base: Url,
    access_token: Zeroizing<String>,
}

/// Shopify Admin API customer source.
pub struct ShopifyHttpSource {
    connection: Option<Connection>,
}

impl ShopifyHttpSource {
    /// Adapter for deployments without Shopify credentials.
    pub fn unconfigured() -> Self {
        Self { connection: None }
    }

    /// Build an adapter with an explicit per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error when the store address does not form a valid URL or
    /// the reqwest client cannot be constructed.
    pub fn new(endpoint: ShopifyEndpoint, timeout: Duration) -> Result<Self, ShopifySetupError> {
        let ShopifyEndpoint {
            store_domain,
            access_token,
            api_version,
        } = endpoint;
        let store = store_domain
            .trim()
            .trim_start_matches("https://")
            .trim_end_matches('/');
        let base = Url::parse(&format!("https://{store}/admin/api/{}/", api_version.trim()))
            .map_err(|err| ShopifySetupError::InvalidStore(format!("{store}: {err}")))?;
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self {
            connection: Some(Connection {
                client,
                base,
                access_token: Zeroizing::new(access_token),
            }),
        })
    }

    pub fn is_configured(&self) -> bool {
        self.connection.is_some()
    }

    fn connection(&self) -> Result<&Connection, CustomerSourceError> {
        self.connection
            .as_ref()
            .ok_or_else(CustomerSourceError::not_configured)
    }
}

impl Connection {
    fn url(&self, segments: &[&str], query: &[(&str, &str)]) -> Result<Url, CustomerSourceError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| CustomerSourceError::transport("store URL cannot carry a path"))?
            .pop_if_empty()
            .extend(segments);
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, CustomerSourceError> {
        debug!(path = url.path(), "shopify request");
        let response = self
            .client
            .get(url)
            .header(ACCESS_TOKEN_HEADER, self.access_token.as_str())
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(map_status_error(status, body.as_ref()));
        }
        serde_json::from_slice(body.as_ref()).map_err(|err| {
            CustomerSourceError::decode(format!("invalid Shopify JSON payload: {err}"))
        })
    }
}

#[async_trait]
impl CustomerSource for ShopifyHttpSource {
    async fn fetch_customer(
        &self,
        id: &ExternalCustomerId,
    ) -> Result<ExternalCustomer, CustomerSourceError> {
        let connection = self.connection()?;
        let url = connection.url(&["customers", &format!("{id}.json")], &[])?;
        let envelope: CustomerEnvelopeDto = match connection.get_json(url).await {
            Err(CustomerSourceError::Upstream { status: 404, .. }) => {
                return Err(CustomerSourceError::not_found(id.as_str()));
            }
            other => other?,
        };
        envelope
            .customer
            .into_domain()
            .map_err(CustomerSourceError::decode)
    }

    async fn fetch_page(&self, limit: usize) -> Result<ExternalPage, CustomerSourceError> {
        let connection = self.connection()?;
        let limit = limit.to_string();
        let url = connection.url(&["customers.json"], &[("limit", limit.as_str())])?;
        let page: CustomerListDto = connection.get_json(url).await?;
        Ok(page.into_page())
    }

    async fn search(&self, query: &str) -> Result<Vec<ExternalCustomer>, CustomerSourceError> {
        let connection = self.connection()?;
        let url = connection.url(&["customers", "search.json"], &[("query", query)])?;
        let page: CustomerListDto = connection.get_json(url).await?;
        let ExternalPage { customers, rejected } = page.into_page();
        for failure in &rejected {
            warn!(
                external_id = %failure.external_id,
                reason = %failure.reason,
                "skipping malformed search result"
            );
        }
        Ok(customers)
    }
}

fn map_transport_error(error: reqwest::Error) -> CustomerSourceError {
    if error.is_timeout() {
        CustomerSourceError::transport(format!("request timed out: {error}"))
    } else {
        CustomerSourceError::transport(error.to_string())
    }
}

fn map_status_error(status: StatusCode, body: &[u8]) -> CustomerSourceError {
    let preview = body_preview(body);
    let message = if preview.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("unexpected status")
            .to_owned()
    } else {
        preview
    };
    CustomerSourceError::upstream(status.as_u16(), message)
}

fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for non-network Shopify mapping helpers.

    use super::*;
    use rstest::rstest;

    fn source() -> ShopifyHttpSource {
        ShopifyHttpSource::new(
            ShopifyEndpoint {
                store_domain: "corner-cafe.myshopify.com".to_owned(),
                access_token: "shpat_test".to_owned(),
                api_version: "2024-01".to_owned(),
            },
            Duration::from_secs(10),
        )
        .expect("adapter should build")
    }

    #[test]
    fn builds_admin_api_urls() {
        let source = source();
        let connection = source.connection().expect("configured");

        let single = connection
            .url(&["customers", "207119551.json"], &[])
            .expect("url");
        assert_eq!(
            single.as_str(),
            "https://corner-cafe.myshopify.com/admin/api/2024-01/customers/207119551.json"
        );

        let search = connection
            .url(&["customers", "search.json"], &[("query", "ada lovelace")])
            .expect("url");
        assert_eq!(search.path(), "/admin/api/2024-01/customers/search.json");
        assert_eq!(search.query(), Some("query=ada+lovelace"));
    }

    #[test]
    fn path_segments_are_escaped() {
        let source = source();
        let connection = source.connection().expect("configured");
        let url = connection
            .url(&["customers", "../orders.json"], &[])
            .expect("url");
        assert!(url.path().ends_with("/customers/..%2Forders.json"));
    }

    #[tokio::test]
    async fn unconfigured_source_reports_not_configured() {
        let source = ShopifyHttpSource::unconfigured();
        assert!(!source.is_configured());
        let err = source.fetch_page(250).await.expect_err("no credentials");
        assert_eq!(err, CustomerSourceError::NotConfigured);
        assert_eq!(err.to_string(), "Shopify API not configured");
    }

    #[rstest]
    #[case(StatusCode::UNAUTHORIZED, 401)]
    #[case(StatusCode::TOO_MANY_REQUESTS, 429)]
    #[case(StatusCode::BAD_GATEWAY, 502)]
    fn non_success_statuses_keep_upstream_code(#[case] status: StatusCode, #[case] code: u16) {
        let error = map_status_error(status, b"{\"errors\":\"[API] Invalid API key\"}");
        match error {
            CustomerSourceError::Upstream { status, message } => {
                assert_eq!(status, code);
                assert!(message.contains("Invalid API key"));
            }
            other => panic!("expected upstream error, got {other:?}"),
        }
    }

    #[test]
    fn decodes_customers_with_string_money() {
        let body = r#"{
            "customers": [
                {
                    "id": 207119551,
                    "first_name": "Ada",
                    "last_name": "Lovelace",
                    "email": "ada@example.com",
                    "phone": null,
                    "orders_count": 3,
                    "total_spent": "199.65"
                },
                { "id": 207119552, "first_name": null, "last_name": null, "email": null }
            ]
        }"#;
        let page: CustomerListDto = serde_json::from_str(body).expect("JSON should decode");
        let ExternalPage { customers, rejected } = page.into_page();

        assert!(rejected.is_empty());
        assert_eq!(customers.len(), 2);
        assert_eq!(customers[0].id.as_str(), "207119551");
        assert_eq!(customers[0].orders_count, 3);
        assert!((customers[0].total_spent - 199.65).abs() < f64::EPSILON);
        assert_eq!(customers[1].orders_count, 0);
        assert_eq!(customers[1].display_name(), "Unnamed customer");
    }

    #[test]
    fn malformed_records_are_rejected_individually() {
        let body = r#"{
            "customers": [
                { "id": 1, "first_name": "Ada", "total_spent": "10.00" },
                { "id": 2, "first_name": "Bob", "total_spent": "n/a" },
                { "id": "3", "orders_count": "many" },
                { "first_name": "Nobody" },
                { "id": 5, "first_name": "Eve" }
            ]
        }"#;
        let page: CustomerListDto = serde_json::from_str(body).expect("JSON should decode");
        let ExternalPage { customers, rejected } = page.into_page();

        let kept: Vec<&str> = customers.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(kept, ["1", "5"]);
        let failed: Vec<&str> = rejected.iter().map(|f| f.external_id.as_str()).collect();
        assert_eq!(failed, ["2", "3", "unknown"]);
        assert!(rejected[0].reason.contains("n/a"));
    }

    #[test]
    fn rejects_unparseable_money() {
        let body = r#"{ "customer": { "id": 1, "total_spent": "lots" } }"#;
        let envelope: CustomerEnvelopeDto = serde_json::from_str(body).expect("JSON should decode");
        assert!(envelope.customer.into_domain().is_err());
    }
}
