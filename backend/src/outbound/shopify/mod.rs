//! Shopify Admin API adapter for the [`crate::domain::ports::CustomerSource`]
//! port.

mod dto;
mod http_source;

pub use http_source::{ShopifyEndpoint, ShopifyHttpSource, ShopifySetupError};
