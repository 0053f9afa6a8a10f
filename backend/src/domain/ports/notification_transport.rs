//! Port for delivering rendered emails.
use async_trait::async_trait;

use crate::domain::OutboundEmail;

use super::define_port_error;

define_port_error! {
    /// Delivery failures reported by notification transports.
    pub enum NotificationError {
        /// No sender identity has been configured.
        NotConfigured => "email not configured",
        /// The transport accepted the call but could not deliver.
        Delivery { message: String } => "email delivery failed: {message}",
    }
}

/// Sends one email per call. Callers make a single attempt; transports do
/// not retry.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationTransport: Send + Sync {
    async fn send(&self, email: &OutboundEmail) -> Result<(), NotificationError>;
}
