//! Port abstraction for recorded engagement events.
use async_trait::async_trait;

use crate::domain::{EngagementEvent, EngagementId, NewEngagementEvent};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by engagement repository adapters.
    pub enum EngagementRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "engagement repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "engagement repository query failed: {message}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EngagementRepository: Send + Sync {
    /// Insert the event with `email_sent = false`.
    async fn record(
        &self,
        event: &NewEngagementEvent,
    ) -> Result<EngagementEvent, EngagementRepositoryError>;

    async fn mark_email_sent(&self, id: &EngagementId) -> Result<(), EngagementRepositoryError>;
}
