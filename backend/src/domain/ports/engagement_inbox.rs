//! Driving port for inbound engagement webhooks.

use async_trait::async_trait;

use crate::domain::{EngagementOutcome, EngagementReport, Error};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EngagementInbox: Send + Sync {
    /// Record the event, then attempt the thank-you email. A failed email is
    /// reported in the outcome and never fails the call.
    async fn record(&self, report: &EngagementReport) -> Result<EngagementOutcome, Error>;
}
