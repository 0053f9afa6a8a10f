//! Backend entry-point: loads settings, migrates the schema, seeds the first
//! manager, and serves the REST API.
#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]

mod server;

use color_eyre::eyre::{Context, Result};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use punchcard::outbound::persistence::{DbPool, PoolConfig, run_pending_migrations};

use server::session_key::{BuildMode, load_session_key};
use server::settings::Settings;
use server::state_builders::{
    Adapters, build_email_transport, build_http_state, build_shopify_source, build_staff_service,
};
use server::{ServerConfig, create_server};

/// Application bootstrap.
#[actix_web::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = Settings::load().wrap_err("load settings")?;
    let database_url = settings.database.url()?.to_owned();

    let migration_url = database_url.clone();
    let applied = tokio::task::spawn_blocking(move || run_pending_migrations(&migration_url))
        .await
        .wrap_err("migration task panicked")?
        .wrap_err("apply migrations")?;
    info!(applied, "database schema up to date");

    let pool = DbPool::new(
        PoolConfig::new(database_url).with_max_size(settings.database.max_connections()),
    )
    .await
    .wrap_err("create database pool")?;

    let staff = build_staff_service(&pool);
    let bootstrap = &settings.bootstrap;
    staff
        .ensure_bootstrap_manager(
            &bootstrap.admin_email(),
            &bootstrap.admin_password(),
            &bootstrap.admin_name(),
        )
        .await
        .wrap_err("create bootstrap manager")?;

    let adapters = Adapters {
        pool: pool.clone(),
        staff,
        shopify: build_shopify_source(&settings.shopify).wrap_err("configure Shopify client")?,
        email: build_email_transport(&settings.email).await,
    };
    let http_state = build_http_state(adapters, &settings);

    let key = load_session_key(
        &settings.server.session_key_file(),
        BuildMode::from_debug_assertions(),
        settings.server.session_allow_ephemeral,
    )?;
    let config = ServerConfig::new(
        key,
        settings.server.cookie_secure,
        settings.server.bind_addr()?,
        pool,
    )
    .with_session_ttl_hours(settings.server.session_ttl_hours());

    create_server(http_state, config)?.await?;
    Ok(())
}
