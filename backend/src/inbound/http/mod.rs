//! HTTP inbound adapter exposing REST endpoints.
//!
//! Handlers depend only on the driving ports bundled in [`state::HttpState`]
//! and resolve the caller through [`session::SessionContext`].

pub mod auth;
pub mod customers;
pub mod error;
pub mod health;
pub mod punchcards;
pub mod schemas;
pub mod session;
pub mod shopify;
pub mod staff;
pub mod state;
#[cfg(test)]
pub mod test_utils;
pub mod validation;
pub mod webhooks;

use actix_web::web;

pub use error::ApiResult;

/// Register every `/api/v1` route. Mount inside a scope that carries the
/// session middleware.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(auth::login)
        .service(auth::logout)
        .service(auth::me)
        .service(auth::change_password)
        .configure(customers::configure)
        .service(punchcards::list_punchcards)
        .service(punchcards::list_customer_punchcards)
        .service(punchcards::add_punch)
        .service(punchcards::redeem)
        .service(punchcards::list_redemptions)
        .service(staff::list_staff)
        .service(staff::create_staff)
        .service(staff::update_staff)
        .service(staff::delete_staff)
        .service(staff::reset_password)
        .service(shopify::search)
        .service(shopify::sync_all)
        .service(shopify::sync_one)
        .service(webhooks::social_engagement);
}
