//! API routes.

use axum::extract::State;
use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::limit::RequestBodyLimitLayer;

use crate::handlers::{
    clear_jobs, delete_job, get_job, health, list_jobs, ready, root, submit_job,
};
use crate::metrics::{metrics_middleware, set_queue_length};
use crate::middleware::{cors_layer, request_id, request_logging, security_headers};
use crate::state::AppState;

/// Create the API router.
pub fn create_router(state: AppState, metrics_handle: Option<PrometheusHandle>) -> Router {
    let job_routes = Router::new()
        .route("/save-to-s3", post(submit_job))
        .route("/jobs", post(submit_job).get(list_jobs).delete(clear_jobs))
        .route("/jobs/:job_id", get(get_job).delete(delete_job));

    let health_routes = Router::new()
        .route("/health", get(health))
        .route("/healthz", get(health))
        .route("/ready", get(ready));

    // Metrics endpoint (if enabled)
    let metrics_routes = if let Some(handle) = metrics_handle {
        Router::new().route(
            "/metrics",
            get(move |State(state): State<AppState>| async move {
                set_queue_length(state.jobs.queue_len());
                handle.render()
            }),
        )
    } else {
        Router::new()
    };

    Router::new()
        .route("/", get(root))
        .merge(job_routes)
        .merge(health_routes)
        .merge(metrics_routes)
        .layer(RequestBodyLimitLayer::new(state.config.max_body_size))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(security_headers))
        .layer(middleware::from_fn(request_logging))
        .layer(middleware::from_fn(request_id))
        .layer(cors_layer(&state.config.cors_origins))
        .with_state(state)
}
