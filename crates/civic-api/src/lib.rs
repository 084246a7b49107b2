//! # civic-api: Civic Grievance HTTP Service
//!
//! Citizens file complaints that are triaged on intake (category, severity,
//! routing department, SLA deadline). Officials work a department-scoped
//! queue and move complaints through their status lifecycle; citizens rate
//! resolved complaints.
//!
//! ## API Surface
//!
//! | Prefix                   | Module                          | Auth |
//! |--------------------------|---------------------------------|------|
//! | `/api/complaints/public` | [`routes::complaints`]          | none |
//! | `/api/complaints/*`      | [`routes::complaints`]          | bearer |
//! | `/api/notifications/*`   | [`routes::notifications`]       | bearer |
//! | `/openapi.json`          | [`openapi`]                     | none |
//! | `/health/*`, `/metrics`  | this module                     | none |
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! TraceLayer → MetricsMiddleware → AuthMiddleware → RateLimitMiddleware → Handler
//! ```

pub mod auth;
pub mod bootstrap;
pub mod db;
pub mod error;
pub mod extractors;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod state;

use axum::extract::{DefaultBodyLimit, State};
use axum::http::StatusCode;
use axum::middleware::from_fn;
use axum::response::IntoResponse;
use axum::{Extension, Router};
use chrono::Utc;

use crate::error::AppError;
use crate::middleware::metrics::ApiMetrics;
use crate::middleware::rate_limit::{RateLimitConfig, RateLimiter};
use crate::state::AppState;

/// Request body limit. Evidence images arrive inline as base64.
pub const BODY_LIMIT_BYTES: usize = 12 * 1024 * 1024;

/// `CIVIC_METRICS_ENABLED`: anything but `"false"` (or unset) enables metrics.
fn metrics_enabled() -> bool {
    std::env::var("CIVIC_METRICS_ENABLED")
        .map(|v| v.to_lowercase() != "false")
        .unwrap_or(true)
}

/// Assemble the full application router.
///
/// Health probes, `/metrics`, `/openapi.json` and the public complaint
/// listing are mounted outside the auth middleware.
pub fn app(state: AppState) -> Router {
    let limiter = RateLimiter::new(RateLimitConfig::default());
    let metrics = if metrics_enabled() {
        match ApiMetrics::new() {
            Ok(m) => Some(m),
            Err(e) => {
                tracing::error!(error = %e, "failed to build metrics registry, metrics disabled");
                None
            }
        }
    } else {
        None
    };

    // Auth runs before rate limiting so rejected tokens never consume quota.
    let mut api = Router::new()
        .merge(routes::complaints::router())
        .merge(routes::notifications::router())
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .layer(from_fn(middleware::rate_limit::rate_limit_middleware))
        .layer(from_fn(auth::auth_middleware));

    let mut public = Router::new()
        .merge(routes::complaints::public_router())
        .merge(openapi::router());

    if let Some(m) = &metrics {
        api = api
            .layer(from_fn(middleware::metrics::metrics_middleware))
            .layer(Extension(m.clone()));
        public = public
            .layer(from_fn(middleware::metrics::metrics_middleware))
            .layer(Extension(m.clone()));
    }

    let api = api
        .layer(middleware::tracing_layer::layer())
        .layer(Extension(state.auth.clone()))
        .layer(Extension(limiter))
        .with_state(state.clone());

    let public = public
        .layer(middleware::tracing_layer::layer())
        .with_state(state.clone());

    let mut probes = Router::new()
        .route("/health/liveness", axum::routing::get(liveness))
        .route("/health/readiness", axum::routing::get(readiness));

    if let Some(m) = metrics {
        probes = probes
            .route("/metrics", axum::routing::get(prometheus_metrics))
            .layer(Extension(m));
    }

    Router::new()
        .merge(probes.with_state(state))
        .merge(public)
        .merge(api)
}

/// GET /metrics: Prometheus scrape endpoint.
///
/// Complaint gauges are recomputed from the store on every scrape.
async fn prometheus_metrics(
    State(state): State<AppState>,
    Extension(metrics): Extension<ApiMetrics>,
) -> impl IntoResponse {
    metrics.observe_complaints(&state.complaints.list(), Utc::now());

    match metrics.gather_and_encode() {
        Ok(body) => (
            StatusCode::OK,
            [(
                axum::http::header::CONTENT_TYPE,
                "text/plain; version=0.0.4; charset=utf-8",
            )],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Failed to encode Prometheus metrics: {e}");
            (StatusCode::INTERNAL_SERVER_ERROR, e).into_response()
        }
    }
}

/// Liveness probe: 200 while the process is running.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe: 503 when a configured database is unreachable.
async fn readiness(State(state): State<AppState>) -> Result<&'static str, AppError> {
    if let Some(pool) = &state.db_pool {
        sqlx::query("SELECT 1").execute(pool).await.map_err(|e| {
            tracing::warn!("Database health check failed: {e}");
            AppError::ServiceUnavailable("database unreachable".to_string())
        })?;
    }
    Ok("ready")
}
