//! Amazon SES (v2) notification transport.
//!
//! The transport sends exactly one HTML email per call. Deployments without
//! a sender address get a transport that reports
//! [`NotificationError::NotConfigured`] so webhook handling carries on.

use async_trait::async_trait;
use aws_sdk_sesv2::Client as SesClient;
use aws_sdk_sesv2::error::DisplayErrorContext;
use aws_sdk_sesv2::types::{Body, Content, Destination, EmailContent, Message};
use tracing::info;

use crate::domain::OutboundEmail;
use crate::domain::ports::{NotificationError, NotificationTransport};

const CHARSET: &str = "UTF-8";

/// SES client paired with the verified sender identity.
pub struct SesSender {
    pub client: SesClient,
    pub from_address: String,
}

/// Notification transport backed by SES.
pub struct SesTransport {
    sender: Option<SesSender>,
}

impl SesTransport {
    pub fn new(sender: SesSender) -> Self {
        Self {
            sender: Some(sender),
        }
    }

    /// Transport used when no sender address is configured.
    pub fn unconfigured() -> Self {
        Self { sender: None }
    }

    pub fn is_configured(&self) -> bool {
        self.sender.is_some()
    }
}

fn content(data: &str) -> Result<Content, NotificationError> {
    Content::builder()
        .data(data)
        .charset(CHARSET)
        .build()
        .map_err(|err| NotificationError::delivery(err.to_string()))
}

fn message(email: &OutboundEmail) -> Result<Message, NotificationError> {
    let body = Body::builder().html(content(&email.html_body)?).build();
    Ok(Message::builder()
        .subject(content(&email.subject)?)
        .body(body)
        .build())
}

#[async_trait]
impl NotificationTransport for SesTransport {
    async fn send(&self, email: &OutboundEmail) -> Result<(), NotificationError> {
        let sender = self
            .sender
            .as_ref()
            .ok_or_else(NotificationError::not_configured)?;

        sender
            .client
            .send_email()
            .from_email_address(&sender.from_address)
            .destination(
                Destination::builder()
                    .to_addresses(&email.recipient)
                    .build(),
            )
            .content(EmailContent::builder().simple(message(email)?).build())
            .send()
            .await
            .map_err(|err| NotificationError::delivery(DisplayErrorContext(&err).to_string()))?;

        info!(to = %email.recipient, subject = %email.subject, "thank-you email sent");
        Ok(())
    }
}
