//! Engagement inbox service implementing the [`EngagementInbox`] port.
//!
//! The event is always recorded before delivery is attempted. Delivery is a
//! single attempt; its failure is reported in the outcome and logged, never
//! returned as an error.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::domain::customer_service::map_customer_error;
use crate::domain::ports::{
    CustomerRepository, EngagementInbox, EngagementRepository, EngagementRepositoryError,
    NotificationTransport,
};
use crate::domain::{
    EngagementOutcome, EngagementReport, Error, NewEngagementEvent, NotificationStatus,
    OutboundEmail,
};

fn map_engagement_error(error: EngagementRepositoryError) -> Error {
    match error {
        EngagementRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("engagement repository unavailable: {message}"))
        }
        EngagementRepositoryError::Query { message } => {
            Error::internal(format!("engagement repository error: {message}"))
        }
    }
}

/// Records social engagement and thanks the customer by email.
#[derive(Clone)]
pub struct EngagementService<C, E, N> {
    customer_repo: Arc<C>,
    engagement_repo: Arc<E>,
    transport: Arc<N>,
    business_name: String,
}

impl<C, E, N> EngagementService<C, E, N> {
    pub fn new(
        customer_repo: Arc<C>,
        engagement_repo: Arc<E>,
        transport: Arc<N>,
        business_name: impl Into<String>,
    ) -> Self {
        Self {
            customer_repo,
            engagement_repo,
            transport,
            business_name: business_name.into(),
        }
    }
}

#[async_trait]
impl<C, E, N> EngagementInbox for EngagementService<C, E, N>
where
    C: CustomerRepository,
    E: EngagementRepository,
    N: NotificationTransport,
{
    async fn record(&self, report: &EngagementReport) -> Result<EngagementOutcome, Error> {
        let known = match report.customer_email() {
            Some(email) => self
                .customer_repo
                .find_by_email(email)
                .await
                .map_err(map_customer_error)?,
            None => None,
        };

        let event = self
            .engagement_repo
            .record(&NewEngagementEvent {
                customer_id: known.as_ref().map(|c| c.id),
                platform: report.platform().to_owned(),
                engagement_type: report.engagement_type(),
                customer_email: report.customer_email().map(str::to_owned),
                content: report.content().map(str::to_owned),
            })
            .await
            .map_err(map_engagement_error)?;
        info!(
            event_id = %event.id,
            platform = %event.platform,
            engagement_type = %event.engagement_type,
            known_customer = known.is_some(),
            "engagement recorded"
        );

        let Some(email) = OutboundEmail::thank_you(
            report,
            known.as_ref().map(|c| c.name.as_str()),
            &self.business_name,
        ) else {
            return Ok(EngagementOutcome {
                event_id: event.id,
                notification: NotificationStatus::Skipped,
            });
        };

        let notification = match self.transport.send(&email).await {
            Ok(()) => match self.engagement_repo.mark_email_sent(&event.id).await {
                Ok(()) => NotificationStatus::Sent,
                Err(err) => {
                    warn!(event_id = %event.id, error = %err, "failed to flag engagement email as sent");
                    NotificationStatus::SentUnrecorded {
                        reason: err.to_string(),
                    }
                }
            },
            Err(err) => {
                warn!(event_id = %event.id, error = %err, "thank-you email not delivered");
                NotificationStatus::Failed {
                    reason: err.to_string(),
                }
            }
        };
        Ok(EngagementOutcome {
            event_id: event.id,
            notification,
        })
    }
}
