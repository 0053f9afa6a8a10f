//! Loyalty punchcard back office.
//!
//! Domain services live in [`domain`]; the REST surface in [`inbound`];
//! Postgres, Shopify, and SES adapters in [`outbound`].

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
pub use domain::TraceId;
pub use middleware::Trace;
