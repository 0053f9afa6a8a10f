//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain ports (use-cases) and remain testable without I/O.

use std::sync::Arc;

use zeroize::Zeroizing;

use crate::domain::ports::{
    CustomerRegistry, CustomerSync, EngagementInbox, PunchcardLedger, StaffAccounts,
};

/// Parameter object bundling all port implementations for HTTP handlers.
#[derive(Clone)]
pub struct HttpStatePorts {
    pub staff: Arc<dyn StaffAccounts>,
    pub customers: Arc<dyn CustomerRegistry>,
    pub punchcards: Arc<dyn PunchcardLedger>,
    pub sync: Arc<dyn CustomerSync>,
    pub engagements: Arc<dyn EngagementInbox>,
}

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub staff: Arc<dyn StaffAccounts>,
    pub customers: Arc<dyn CustomerRegistry>,
    pub punchcards: Arc<dyn PunchcardLedger>,
    pub sync: Arc<dyn CustomerSync>,
    pub engagements: Arc<dyn EngagementInbox>,
    webhook_secret: Option<Arc<Zeroizing<String>>>,
}

impl From<HttpStatePorts> for HttpState {
    fn from(ports: HttpStatePorts) -> Self {
        Self::new(ports)
    }
}

impl HttpState {
    /// Construct state from a ports bundle. Webhooks are accepted without a
    /// secret until [`HttpState::with_webhook_secret`] sets one.
    pub fn new(ports: HttpStatePorts) -> Self {
        let HttpStatePorts {
            staff,
            customers,
            punchcards,
            sync,
            engagements,
        } = ports;
        Self {
            staff,
            customers,
            punchcards,
            sync,
            engagements,
            webhook_secret: None,
        }
    }

    #[must_use]
    pub fn with_webhook_secret(mut self, secret: Option<Zeroizing<String>>) -> Self {
        self.webhook_secret = secret.map(Arc::new);
        self
    }

    pub fn webhook_secret(&self) -> Option<&str> {
        self.webhook_secret.as_deref().map(|secret| secret.as_str())
    }
}
