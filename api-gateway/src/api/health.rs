//! Health check

use std::sync::Arc;
use std::time::Instant;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;

use crate::AppState;

/// Check outcome for one dependency
#[derive(Debug, Serialize, ToSchema)]
pub struct ComponentHealth {
    /// `up` or `down`
    pub status: String,
    /// Backend name (`memory`, `postgres`, `mock`, `fixed`)
    pub backend: String,
    pub latency_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Health report
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthReport {
    /// `healthy` or `degraded`
    pub status: String,
    pub version: String,
    pub timestamp: String,
    pub uptime_seconds: u64,
    pub repository: ComponentHealth,
    pub quote_feed: ComponentHealth,
    pub active_sessions: usize,
    pub memory_usage_mb: u64,
    pub health_check_latency_ms: u64,
}

fn component<E: ToString>(backend: &str, started: Instant, result: Result<(), E>) -> ComponentHealth {
    let latency_ms = started.elapsed().as_millis() as u64;
    match result {
        Ok(()) => ComponentHealth {
            status: "up".to_string(),
            backend: backend.to_string(),
            latency_ms,
            error: None,
        },
        Err(e) => ComponentHealth {
            status: "down".to_string(),
            backend: backend.to_string(),
            latency_ms,
            error: Some(e.to_string()),
        },
    }
}

/// Repository and quote feed checks
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "All dependencies up", body = HealthReport),
        (status = 503, description = "A dependency is down", body = HealthReport)
    ),
    tag = "health"
)]
pub async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let start_time = Instant::now();

    let repo = state.account_service.repository();
    let repo_start = Instant::now();
    let repository = component(repo.name(), repo_start, repo.ping().await);

    let quotes = state.market_data_service.provider();
    let quote_start = Instant::now();
    let quote_feed = component(quotes.name(), quote_start, quotes.ping().await);

    let healthy = repository.status == "up" && quote_feed.status == "up";
    let report = HealthReport {
        status: if healthy { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        uptime_seconds: state.started_at.elapsed().as_secs(),
        repository,
        quote_feed,
        active_sessions: state.sessions.len(),
        memory_usage_mb: memory_usage_mb(),
        health_check_latency_ms: start_time.elapsed().as_millis() as u64,
    };

    let status = if healthy { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status, Json(report))
}

/// Resident set size in MB, 0 where unavailable
fn memory_usage_mb() -> u64 {
    #[cfg(target_os = "linux")]
    {
        if let Ok(status) = std::fs::read_to_string("/proc/self/status") {
            let kb = status
                .lines()
                .find(|l| l.starts_with("VmRSS:"))
                .and_then(|line| line.split_whitespace().nth(1))
                .and_then(|kb| kb.parse::<u64>().ok());
            if let Some(kb) = kb {
                return kb / 1024;
            }
        }
    }

    0
}
