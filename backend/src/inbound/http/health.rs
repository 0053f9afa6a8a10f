//! Health endpoints: liveness and readiness probes for orchestration and load
//! balancers.
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use actix_web::{HttpResponse, get, http::header, web};
use async_trait::async_trait;
use tracing::warn;

/// A dependency that must answer before the service reports ready.
#[async_trait]
pub trait DependencyProbe: Send + Sync {
    /// Name used in logs, for example `database`.
    fn name(&self) -> &'static str;

    async fn check(&self) -> Result<(), String>;
}

/// Shared health state for readiness and liveness checks.
pub struct HealthState {
    ready: AtomicBool,
    live: AtomicBool,
    dependencies: Vec<Arc<dyn DependencyProbe>>,
}

impl Default for HealthState {
    fn default() -> Self {
        Self {
            ready: AtomicBool::new(false),
            live: AtomicBool::new(true),
            dependencies: Vec::new(),
        }
    }
}

impl HealthState {
    /// Create a new health state starting as not ready but live.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a dependency the readiness probe round-trips on every call.
    #[must_use]
    pub fn with_dependency(mut self, probe: Arc<dyn DependencyProbe>) -> Self {
        self.dependencies.push(probe);
        self
    }

    pub fn mark_ready(&self) {
        self.ready.store(true, Ordering::Release);
    }

    /// Flag the service as unhealthy so liveness checks fail fast during shutdown.
    pub fn mark_unhealthy(&self) {
        self.live.store(false, Ordering::Release);
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    /// When false, liveness probes emit 503 to trigger restarts.
    pub fn is_alive(&self) -> bool {
        self.live.load(Ordering::Acquire)
    }

    async fn dependencies_ok(&self) -> bool {
        for probe in &self.dependencies {
            if let Err(reason) = probe.check().await {
                warn!(dependency = probe.name(), %reason, "readiness check failed");
                return false;
            }
        }
        true
    }

    fn probe_response(probe_ok: bool) -> HttpResponse {
        let mut response = if probe_ok {
            HttpResponse::Ok()
        } else {
            HttpResponse::ServiceUnavailable()
        };

        response
            .insert_header((header::CACHE_CONTROL, "no-store"))
            .finish()
    }
}

/// Readiness probe. Return 200 once startup has finished and every dependency
/// answers; return 503 otherwise.
#[utoipa::path(
    get,
    path = "/health/ready",
    tags = ["health"],
    security([]),
    responses(
        (status = 200, description = "Server is ready to handle traffic"),
        (status = 503, description = "Server or database is not ready")
    )
)]
#[get("/health/ready")]
pub async fn ready(state: web::Data<HealthState>) -> HttpResponse {
    let ok = state.is_ready() && state.dependencies_ok().await;
    HealthState::probe_response(ok)
}

/// Liveness probe. Return 200 while the process is marked alive and 503 once draining.
#[utoipa::path(
    get,
    path = "/health/live",
    tags = ["health"],
    security([]),
    responses(
        (status = 200, description = "Server is alive"),
        (status = 503, description = "Server is shutting down")
    )
)]
#[get("/health/live")]
pub async fn live(state: web::Data<HealthState>) -> HttpResponse {
    HealthState::probe_response(state.is_alive())
}
