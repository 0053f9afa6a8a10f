//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **persistence**: PostgreSQL-backed repositories using Diesel ORM
//! - **credentials**: Argon2 password hashing
//! - **shopify**: Shopify Admin API customer source over reqwest
//! - **email**: Amazon SES notification transport
//!
//! Adapters are thin translators that convert between domain types and
//! infrastructure-specific representations. They contain no business logic.

pub mod credentials;
pub mod email;
pub mod persistence;
pub mod shopify;
