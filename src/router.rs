use axum::{
    extract::{Request, State},
    middleware::{self, Next},
    response::Response,
    routing::{delete, get, put},
    Router,
};
use prometheus::IntGauge;
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;

use crate::handlers::mods::{delete_mod, find_mod, list_mods, route_not_found, upsert_mod};
use crate::observability::{metrics::Metrics, Logger};
use crate::store::ModStore;

/// Shared per-process dependencies handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ModStore>,
    pub logger: Logger,
    pub metrics: Arc<Metrics>,
    pub legacy_pagination: bool,
}

impl AppState {
    pub fn new(store: Arc<dyn ModStore>, logger: Logger, metrics: Arc<Metrics>, legacy_pagination: bool) -> Self {
        Self { store, logger, metrics, legacy_pagination }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/mods", get(list_mods))
        .route("/create", put(upsert_mod))
        .route("/delete/:name", delete(delete_mod))
        .route("/find/:name", get(find_mod))
        .fallback(route_not_found)
        .layer(middleware::from_fn_with_state(state.clone(), track_request))
        .with_state(state)
}

/// Holds one unit of the in-flight gauge; released on drop, including when
/// the request future is cancelled by a client disconnect.
struct InFlightGuard(IntGauge);

impl InFlightGuard {
    fn enter(gauge: &IntGauge) -> Self {
        gauge.inc();
        Self(gauge.clone())
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.dec();
    }
}

async fn track_request(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let method = req.method().to_string();
    let path = req.uri().path().to_string();
    let start = Instant::now();
    let in_flight = InFlightGuard::enter(&state.metrics.requests_in_flight);

    let response = next.run(req).await;

    let elapsed = start.elapsed();
    drop(in_flight);
    state.metrics.http_requests_total.inc();
    state.metrics.http_request_duration_seconds.observe(elapsed.as_secs_f64());

    let status = response.status();
    let context = json!({
        "method": method,
        "path": path,
        "status": status.as_u16(),
        "duration_ms": elapsed.as_millis() as u64,
    });
    if status.is_client_error() || status.is_server_error() {
        state.metrics.http_request_errors_total.inc();
        state.logger.warn("Request failed", Some(&context));
    } else {
        state.logger.info("Request handled", Some(&context));
    }

    response
}
