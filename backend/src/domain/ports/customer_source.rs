//! Port for reading customers from the external commerce system.
//!
//! The source is read-only. Adapters apply their own request timeout; a
//! timed-out call surfaces as [`CustomerSourceError::Transport`].
use async_trait::async_trait;

use crate::domain::{ExternalCustomer, ExternalCustomerId, ExternalPage};

use super::define_port_error;

define_port_error! {
    /// Errors raised by commerce-system adapters.
    pub enum CustomerSourceError {
        /// Store address or access token is missing.
        NotConfigured => "Shopify API not configured",
        /// The commerce system has no customer with this id.
        NotFound { external_id: String } => "external customer {external_id} not found",
        /// The commerce API answered with a non-success status.
        Upstream { status: u16, message: String } =>
            "commerce API returned status {status}: {message}",
        /// The request could not be completed.
        Transport { message: String } => "commerce API request failed: {message}",
        /// The response body did not match the expected shape.
        Decode { message: String } => "commerce API response could not be decoded: {message}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CustomerSource: Send + Sync {
    async fn fetch_customer(
        &self,
        id: &ExternalCustomerId,
    ) -> Result<ExternalCustomer, CustomerSourceError>;

    /// First `limit` customers as ordered by the commerce system. Malformed
    /// records land in [`ExternalPage::rejected`] instead of failing the page.
    async fn fetch_page(&self, limit: usize) -> Result<ExternalPage, CustomerSourceError>;

    async fn search(&self, query: &str) -> Result<Vec<ExternalCustomer>, CustomerSourceError>;
}
