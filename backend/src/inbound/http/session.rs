//! Session helpers to keep HTTP handlers free of framework-specific logic.
//!
//! The session cookie carries the staff id and role captured at login. Every
//! protected handler resolves a [`Principal`] through [`SessionContext::require`],
//! which is the single authorization gate for the HTTP surface.

use actix_session::Session;
use actix_web::{FromRequest, HttpRequest, dev::Payload};
use futures_util::future::LocalBoxFuture;

use crate::domain::{Capability, Error, Principal, Role, StaffId};

pub(crate) const STAFF_ID_KEY: &str = "staff_id";
pub(crate) const ROLE_KEY: &str = "role";

/// Newtype wrapper that exposes higher-level session operations.
#[derive(Clone)]
pub struct SessionContext(Session);

impl SessionContext {
    /// Construct a new wrapper from the underlying Actix session.
    pub fn new(session: Session) -> Self {
        Self(session)
    }

    /// Persist the authenticated principal in the session cookie.
    pub fn persist_principal(&self, principal: &Principal) -> Result<(), Error> {
        self.0.renew();
        self.0
            .insert(STAFF_ID_KEY, principal.staff_id().to_string())
            .and_then(|()| self.0.insert(ROLE_KEY, principal.role().as_str()))
            .map_err(|error| Error::internal(format!("failed to persist session: {error}")))
    }

    /// Drop every session value and expire the cookie.
    pub fn clear(&self) {
        self.0.purge();
    }

    /// Fetch the current principal, if a valid one is present.
    pub fn principal(&self) -> Result<Option<Principal>, Error> {
        let read = |key: &str| {
            self.0
                .get::<String>(key)
                .map_err(|error| Error::internal(format!("failed to read session: {error}")))
        };
        let (Some(raw_id), Some(raw_role)) = (read(STAFF_ID_KEY)?, read(ROLE_KEY)?) else {
            return Ok(None);
        };
        let staff_id = match raw_id.parse::<StaffId>() {
            Ok(id) => id,
            Err(error) => {
                tracing::warn!("invalid staff id in session cookie: {error}");
                return Ok(None);
            }
        };
        match raw_role.parse::<Role>() {
            Ok(role) => Ok(Some(Principal::new(staff_id, role))),
            Err(error) => {
                tracing::warn!("invalid role in session cookie: {error}");
                Ok(None)
            }
        }
    }

    /// Require an authenticated principal or return `401 Unauthorized`.
    pub fn require_principal(&self) -> Result<Principal, Error> {
        self.principal()?
            .ok_or_else(|| Error::unauthorized("login required"))
    }

    /// Require a principal holding `capability`: `401` without a session,
    /// `403` when the role falls short.
    pub fn require(&self, capability: Capability) -> Result<Principal, Error> {
        let principal = self.require_principal()?;
        principal.authorize(capability)?;
        Ok(principal)
    }
}

impl FromRequest for SessionContext {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let fut = Session::from_request(req, payload);
        Box::pin(async move { fut.await.map(SessionContext::new) })
    }
}
