//! Outbound email delivery.

mod ses_transport;

pub use ses_transport::{SesSender, SesTransport};
