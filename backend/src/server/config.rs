//! HTTP server configuration object and helpers.

use std::net::SocketAddr;

use actix_web::cookie::{Key, SameSite};

use punchcard::outbound::persistence::DbPool;

/// Builder-style configuration for creating the HTTP server.
pub struct ServerConfig {
    pub(crate) key: Key,
    pub(crate) cookie_secure: bool,
    pub(crate) same_site: SameSite,
    pub(crate) session_ttl_hours: i64,
    pub(crate) bind_addr: SocketAddr,
    pub(crate) db_pool: DbPool,
}

impl ServerConfig {
    /// Sessions default to an eight hour lifetime and `SameSite=Lax`.
    #[must_use]
    pub fn new(key: Key, cookie_secure: bool, bind_addr: SocketAddr, db_pool: DbPool) -> Self {
        Self {
            key,
            cookie_secure,
            same_site: SameSite::Lax,
            session_ttl_hours: 8,
            bind_addr,
            db_pool,
        }
    }

    #[must_use]
    pub fn with_session_ttl_hours(mut self, hours: i64) -> Self {
        self.session_ttl_hours = hours.max(1);
        self
    }
}
