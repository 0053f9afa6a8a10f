//! Social engagement events and the thank-you notification they trigger.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};

use crate::domain::{CustomerId, EngagementId};

/// Kind of social interaction reported by a webhook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngagementType {
    Like,
    Comment,
    Share,
}

impl EngagementType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Like => "like",
            Self::Comment => "comment",
            Self::Share => "share",
        }
    }
}

impl fmt::Display for EngagementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EngagementType {
    type Err = EngagementValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "like" => Ok(Self::Like),
            "comment" => Ok(Self::Comment),
            "share" => Ok(Self::Share),
            other => Err(EngagementValidationError::InvalidType {
                value: other.to_owned(),
            }),
        }
    }
}

/// Validation errors for inbound engagement reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngagementValidationError {
    MissingPlatform,
    MissingType,
    InvalidType { value: String },
}

impl fmt::Display for EngagementValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingPlatform | Self::MissingType => {
                write!(f, "platform and engagement type are required")
            }
            Self::InvalidType { value } => write!(
                f,
                "invalid engagement type '{value}': expected like, comment, or share"
            ),
        }
    }
}

impl std::error::Error for EngagementValidationError {}

/// Validated webhook payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngagementReport {
    platform: String,
    engagement_type: EngagementType,
    customer_email: Option<String>,
    customer_name: Option<String>,
    content: Option<String>,
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
}

impl EngagementReport {
    /// Validate raw webhook fields.
    ///
    /// # Examples
    /// ```
    /// use punchcard::domain::{EngagementReport, EngagementType};
    ///
    /// let report = EngagementReport::try_from_parts(
    ///     Some("instagram"),
    ///     Some("share"),
    ///     Some("Fan@Example.com"),
    ///     None,
    ///     None,
    /// )
    /// .unwrap();
    /// assert_eq!(report.engagement_type(), EngagementType::Share);
    /// assert_eq!(report.customer_email(), Some("fan@example.com"));
    /// ```
    pub fn try_from_parts(
        platform: Option<&str>,
        engagement_type: Option<&str>,
        customer_email: Option<&str>,
        customer_name: Option<&str>,
        content: Option<&str>,
    ) -> Result<Self, EngagementValidationError> {
        let platform = non_blank(platform).ok_or(EngagementValidationError::MissingPlatform)?;
        let engagement_type = non_blank(engagement_type)
            .ok_or(EngagementValidationError::MissingType)?
            .parse()?;
        Ok(Self {
            platform,
            engagement_type,
            customer_email: non_blank(customer_email).map(|e| e.to_lowercase()),
            customer_name: non_blank(customer_name),
            content: non_blank(content),
        })
    }

    pub fn platform(&self) -> &str {
        &self.platform
    }

    pub fn engagement_type(&self) -> EngagementType {
        self.engagement_type
    }

    pub fn customer_email(&self) -> Option<&str> {
        self.customer_email.as_deref()
    }

    pub fn customer_name(&self) -> Option<&str> {
        self.customer_name.as_deref()
    }

    pub fn content(&self) -> Option<&str> {
        self.content.as_deref()
    }
}

/// Row to insert for a newly reported event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEngagementEvent {
    pub customer_id: Option<CustomerId>,
    pub platform: String,
    pub engagement_type: EngagementType,
    pub customer_email: Option<String>,
    pub content: Option<String>,
}

/// A recorded engagement event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngagementEvent {
    pub id: EngagementId,
    pub customer_id: Option<CustomerId>,
    pub platform: String,
    pub engagement_type: EngagementType,
    pub customer_email: Option<String>,
    pub content: Option<String>,
    pub email_sent: bool,
    pub created_at: DateTime<Utc>,
}

/// Outcome of the notification attempt for one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationStatus {
    Sent,
    /// The email went out but the event's `email_sent` flag could not be
    /// stored, so the stored record still reads unsent.
    SentUnrecorded { reason: String },
    /// No recipient address was supplied.
    Skipped,
    Failed { reason: String },
}

/// What the webhook caller is told.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngagementOutcome {
    pub event_id: EngagementId,
    pub notification: NotificationStatus,
}

/// A rendered email ready for a notification transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundEmail {
    pub recipient: String,
    pub subject: String,
    pub html_body: String,
}

const FALLBACK_GREETING_NAME: &str = "Valued Customer";

fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

fn thank_you_line(engagement_type: EngagementType, platform: &str) -> String {
    match engagement_type {
        EngagementType::Like => format!(
            "We noticed you liked our content on {platform}! Thank you for your support."
        ),
        EngagementType::Comment => format!(
            "Thank you for commenting on our {platform} post! We appreciate your engagement."
        ),
        EngagementType::Share => format!(
            "Wow! Thank you for sharing our content on {platform}! Your support means the world to us."
        ),
    }
}

impl OutboundEmail {
    /// Render the thank-you email for `report`. Returns `None` when the
    /// report carries no recipient address.
    ///
    /// `known_name` is the registered customer's name and wins over the name
    /// supplied by the webhook.
    pub fn thank_you(
        report: &EngagementReport,
        known_name: Option<&str>,
        business_name: &str,
    ) -> Option<Self> {
        let recipient = report.customer_email()?.to_owned();
        let name = known_name
            .or(report.customer_name())
            .unwrap_or(FALLBACK_GREETING_NAME);
        let platform = escape_html(report.platform());
        let quoted = report
            .content()
            .map(|content| {
                format!(
                    "\n  <blockquote style=\"color: #777;\">{}</blockquote>",
                    escape_html(content)
                )
            })
            .unwrap_or_default();
        let html_body = format!(
            r#"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto; padding: 20px;">
  <h2 style="color: #333;">Hi {name},</h2>
  <p style="font-size: 16px; color: #555;">{line}</p>{quoted}
  <p style="font-size: 16px; color: #555;">As a token of our appreciation, don't forget to ask about our loyalty punchcard program on your next visit!</p>
  <p style="font-size: 16px; color: #555;">We look forward to seeing you soon!<br>{business}</p>
  <hr style="border: 1px solid #eee; margin: 20px 0;">
  <p style="font-size: 14px; color: #999; text-align: center;">This is an automated message. Please do not reply to this email.</p>
</div>"#,
            name = escape_html(name),
            line = thank_you_line(report.engagement_type(), &platform),
            business = escape_html(business_name),
        );
        Some(Self {
            recipient,
            subject: format!(
                "Thank you for your {} on {}!",
                report.engagement_type(),
                report.platform()
            ),
            html_body,
        })
    }
}
