use crate::infra::{AppState, ScoringService};
use agri_credit::credit::credit_router;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Extension, Json};
use serde_json::json;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::warn;

const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4";

pub(crate) fn with_credit_routes(service: Arc<ScoringService>) -> axum::Router {
    credit_router(service)
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
}

pub(crate) async fn healthcheck(Extension(state): Extension<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "rule_set_version": state.rule_set_version,
    }))
}

/// 503 until the listener is bound, then reports how many profiles were seeded.
pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> Response {
    if !state.readiness.load(Ordering::Acquire) {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "starting" })),
        )
            .into_response();
    }

    match state.store.profile_count() {
        Ok(profiles) => Json(json!({ "status": "ready", "profiles": profiles })).into_response(),
        Err(err) => {
            warn!(error = %err, "profile store unavailable during readiness probe");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "degraded", "error": err.to_string() })),
            )
                .into_response()
        }
    }
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, PROMETHEUS_CONTENT_TYPE)],
        state.metrics.render(),
    )
}
