//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! Concrete implementations of the domain repository ports, backed by
//! PostgreSQL through `diesel-async` with `bb8` pooling.
//!
//! - **Thin adapters**: repositories translate between Diesel rows and domain
//!   types. Business rules stay in the domain services; the adapters only
//!   enforce them as guarded writes.
//! - **Internal models**: row structs (`models.rs`) and the schema
//!   (`schema.rs`) never leave this module.
//! - **Typed errors**: pool and Diesel failures map onto each port's error.
//!
//! # Example
//!
//! ```ignore
//! use punchcard::outbound::persistence::{DbPool, DieselCustomerRepository, PoolConfig};
//!
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/punchcard")).await?;
//! let customers = DieselCustomerRepository::new(pool);
//! ```

pub(crate) mod diesel_helpers;
mod diesel_customer_repository;
mod diesel_engagement_repository;
mod diesel_punchcard_repository;
mod diesel_staff_repository;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_customer_repository::DieselCustomerRepository;
pub use diesel_engagement_repository::DieselEngagementRepository;
pub use diesel_punchcard_repository::DieselPunchcardRepository;
pub use diesel_staff_repository::DieselStaffRepository;
pub use migrations::{MigrationError, run_pending_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};
