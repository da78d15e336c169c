//! Liveness and readiness at `/health`, outside the versioned API.

use std::time::Instant;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Readiness {
    Ok,
    /// The process is up but Postgres did not answer.
    Degraded,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub status: Readiness,
    pub version: &'static str,
    pub db_healthy: bool,
    /// Round trip of `SELECT 1`; absent when it failed.
    pub db_latency_ms: Option<u64>,
}

impl HealthReport {
    fn status_code(&self) -> StatusCode {
        match self.status {
            Readiness::Ok => StatusCode::OK,
            Readiness::Degraded => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

/// A degraded report answers 503 so load balancers stop routing here.
async fn report(State(state): State<AppState>) -> (StatusCode, Json<HealthReport>) {
    let started = Instant::now();
    let report = match taskhub_db::health_check(&state.pool).await {
        Ok(()) => HealthReport {
            status: Readiness::Ok,
            version: env!("CARGO_PKG_VERSION"),
            db_healthy: true,
            db_latency_ms: Some(started.elapsed().as_millis() as u64),
        },
        Err(err) => {
            tracing::warn!(error = %err, "Database health check failed");
            HealthReport {
                status: Readiness::Degraded,
                version: env!("CARGO_PKG_VERSION"),
                db_healthy: false,
                db_latency_ms: None,
            }
        }
    };
    (report.status_code(), Json(report))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(report))
}
