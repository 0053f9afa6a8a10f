//! Server construction and middleware wiring.

mod config;
pub mod session_key;
pub mod settings;
pub mod state_builders;

pub use config::ServerConfig;

use actix_session::{
    SessionMiddleware,
    config::{CookieContentSecurity, PersistentSession},
    storage::CookieSessionStore,
};
use actix_web::cookie::{Key, SameSite};
use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};
use async_trait::async_trait;
use tracing::info;

use punchcard::Trace;
#[cfg(debug_assertions)]
use punchcard::doc::ApiDoc;
use punchcard::inbound::http;
use punchcard::inbound::http::health::{DependencyProbe, HealthState, live, ready};
use punchcard::inbound::http::state::HttpState;
use punchcard::outbound::persistence::DbPool;
#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

/// Readiness check that round-trips `SELECT 1` through the pool.
pub struct DatabaseProbe(pub DbPool);

#[async_trait]
impl DependencyProbe for DatabaseProbe {
    fn name(&self) -> &'static str {
        "database"
    }

    async fn check(&self) -> Result<(), String> {
        self.0.ping().await.map_err(|err| err.to_string())
    }
}

#[derive(Clone)]
struct AppDependencies {
    health_state: web::Data<HealthState>,
    http_state: web::Data<HttpState>,
    key: Key,
    cookie_secure: bool,
    same_site: SameSite,
    session_ttl_hours: i64,
}

fn build_app(
    deps: AppDependencies,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let AppDependencies {
        health_state,
        http_state,
        key,
        cookie_secure,
        same_site,
        session_ttl_hours,
    } = deps;

    let session = SessionMiddleware::builder(CookieSessionStore::default(), key)
        .cookie_name("session".into())
        .cookie_path("/".into())
        .cookie_secure(cookie_secure)
        .cookie_http_only(true)
        .cookie_content_security(CookieContentSecurity::Private)
        .cookie_same_site(same_site)
        .session_lifecycle(
            PersistentSession::default()
                .session_ttl(actix_web::cookie::time::Duration::hours(session_ttl_hours)),
        )
        .build();

    let api = web::scope("/api/v1").wrap(session).configure(http::configure);

    let app = App::new()
        .app_data(health_state)
        .app_data(http_state)
        .wrap(Trace)
        .service(api)
        .service(ready)
        .service(live);

    #[cfg(debug_assertions)]
    let app = app.service(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));

    app
}

/// Construct an Actix HTTP server.
///
/// The readiness probe reports ready once the listener is bound and the
/// database answers.
///
/// # Errors
/// Propagates [`std::io::Error`] when binding the socket fails.
pub fn create_server(http_state: HttpState, config: ServerConfig) -> std::io::Result<Server> {
    let ServerConfig {
        key,
        cookie_secure,
        same_site,
        session_ttl_hours,
        bind_addr,
        db_pool,
    } = config;
    let health_state =
        web::Data::new(HealthState::new().with_dependency(std::sync::Arc::new(DatabaseProbe(db_pool))));
    let http_state = web::Data::new(http_state);
    let deps = AppDependencies {
        health_state: health_state.clone(),
        http_state,
        key,
        cookie_secure,
        same_site,
        session_ttl_hours,
    };

    let server = HttpServer::new(move || build_app(deps.clone()))
        .bind(bind_addr)?
        .run();

    health_state.mark_ready();
    info!(%bind_addr, "HTTP server listening");
    Ok(server)
}
