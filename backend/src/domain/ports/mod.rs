//! Domain ports defining the edges of the hexagon.
//!
//! Driven ports (`*Repository`, [`CustomerSource`], [`NotificationTransport`],
//! [`CredentialHasher`]) describe what the domain needs from infrastructure
//! and expose typed errors. Driving ports ([`StaffAccounts`],
//! [`CustomerRegistry`], [`PunchcardLedger`], [`CustomerSync`],
//! [`EngagementInbox`]) are the use-cases inbound adapters call, returning
//! the domain [`crate::domain::Error`].

mod macros;
pub(crate) use macros::define_port_error;

mod credential_hasher;
mod customer_registry;
mod customer_repository;
mod customer_source;
mod customer_sync;
mod engagement_inbox;
mod engagement_repository;
mod notification_transport;
mod punchcard_ledger;
mod punchcard_repository;
mod staff_accounts;
mod staff_repository;

pub use credential_hasher::{CredentialHashError, CredentialHasher};
pub use customer_registry::CustomerRegistry;
pub use customer_repository::{CustomerRepository, CustomerRepositoryError};
pub use customer_source::{CustomerSource, CustomerSourceError};
pub use customer_sync::CustomerSync;
pub use engagement_inbox::EngagementInbox;
pub use engagement_repository::{EngagementRepository, EngagementRepositoryError};
pub use notification_transport::{NotificationError, NotificationTransport};
pub use punchcard_ledger::PunchcardLedger;
pub use punchcard_repository::{PunchcardRepository, PunchcardRepositoryError};
pub use staff_accounts::StaffAccounts;
pub use staff_repository::{
    NewStaffAccount, StaffCredentials, StaffRepository, StaffRepositoryError,
};

#[cfg(test)]
pub use credential_hasher::MockCredentialHasher;
#[cfg(test)]
pub use customer_registry::MockCustomerRegistry;
#[cfg(test)]
pub use customer_repository::MockCustomerRepository;
#[cfg(test)]
pub use customer_source::MockCustomerSource;
#[cfg(test)]
pub use customer_sync::MockCustomerSync;
#[cfg(test)]
pub use engagement_inbox::MockEngagementInbox;
#[cfg(test)]
pub use engagement_repository::MockEngagementRepository;
#[cfg(test)]
pub use notification_transport::MockNotificationTransport;
#[cfg(test)]
pub use punchcard_ledger::MockPunchcardLedger;
#[cfg(test)]
pub use punchcard_repository::MockPunchcardRepository;
#[cfg(test)]
pub use staff_accounts::MockStaffAccounts;
#[cfg(test)]
pub use staff_repository::MockStaffRepository;
