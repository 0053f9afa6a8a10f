//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::{Cookie, Key};
use actix_web::dev::{Service, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, Error as ActixError, HttpResponse, test, web};

use crate::domain::ports::{
    MockCustomerRegistry, MockCustomerSync, MockEngagementInbox, MockPunchcardLedger,
    MockStaffAccounts,
};
use crate::domain::{Error, Principal, Role, StaffId};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::{HttpState, HttpStatePorts};

/// Staff id stored by [`seed_session`].
pub const SESSION_STAFF_ID: &str = "8d3c6a1e-2f4b-4c3d-9e8f-7a6b5c4d3e2f";

/// Build a session middleware configured for tests.
///
/// - Generates a fresh signing/encryption key per invocation.
/// - Sets the cookie name to `session` and disables the `Secure` flag for
///   local HTTP tests.
pub fn test_session_middleware() -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
        .cookie_name("session".to_owned())
        .cookie_secure(false)
        .build()
}

/// Mock driving ports; configure expectations, then call [`MockPorts::into_state`].
#[derive(Default)]
pub struct MockPorts {
    pub staff: MockStaffAccounts,
    pub customers: MockCustomerRegistry,
    pub punchcards: MockPunchcardLedger,
    pub sync: MockCustomerSync,
    pub engagements: MockEngagementInbox,
}

impl MockPorts {
    pub fn into_http_state(self) -> HttpState {
        HttpState::new(HttpStatePorts {
            staff: Arc::new(self.staff),
            customers: Arc::new(self.customers),
            punchcards: Arc::new(self.punchcards),
            sync: Arc::new(self.sync),
            engagements: Arc::new(self.engagements),
        })
    }

    pub fn into_state(self) -> web::Data<HttpState> {
        web::Data::new(self.into_http_state())
    }
}

pub fn session_staff_id() -> StaffId {
    SESSION_STAFF_ID.parse().expect("fixture staff id")
}

/// Route handler that logs the caller in as `{role}` with [`SESSION_STAFF_ID`].
///
/// Mount with `.route("/test-login/{role}", web::post().to(seed_session))`.
pub async fn seed_session(
    session: SessionContext,
    role: web::Path<String>,
) -> Result<HttpResponse, Error> {
    let role = role
        .parse::<Role>()
        .map_err(|err| Error::invalid_request(err.to_string()))?;
    session.persist_principal(&Principal::new(session_staff_id(), role))?;
    Ok(HttpResponse::NoContent().finish())
}

/// Log in through [`seed_session`] and return the session cookie.
pub async fn login_as<S>(app: &S, role: Role) -> Cookie<'static>
where
    S: Service<actix_http::Request, Response = ServiceResponse, Error = ActixError>,
{
    let res = test::call_service(
        app,
        test::TestRequest::post()
            .uri(&format!("/test-login/{}", role.as_str()))
            .to_request(),
    )
    .await;
    assert!(res.status().is_success(), "test login failed");
    res.response()
        .cookies()
        .find(|cookie| cookie.name() == "session")
        .expect("session cookie set")
        .into_owned()
}

/// App with a test session, the [`seed_session`] route, and `routes` under
/// `/api/v1`.
pub fn test_app<F>(
    state: web::Data<HttpState>,
    routes: F,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = ActixError,
        InitError = (),
    >,
>
where
    F: FnOnce(&mut web::ServiceConfig),
{
    App::new()
        .app_data(state)
        .wrap(test_session_middleware())
        .route("/test-login/{role}", web::post().to(seed_session))
        .service(web::scope("/api/v1").configure(routes))
}
