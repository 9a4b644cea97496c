//! Health check and status endpoints.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::errors::ApiResponse;
use crate::AppState;

/// Process and storage health.
#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub uptime_secs: u64,
    /// Resident set size in KiB; `None` where the platform does not expose it.
    pub memory_rss_kb: Option<u64>,
    pub version: &'static str,
    pub environment: String,
    pub storage: &'static str,
    pub database: String,
}

/// Database connectivity detail.
#[derive(Debug, Serialize)]
pub struct DatabaseStatus {
    pub storage: &'static str,
    pub database: String,
    pub pool_size: Option<u32>,
    pub idle_connections: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct ApiStatus {
    pub name: &'static str,
    pub version: &'static str,
    pub storage: &'static str,
    pub endpoints: &'static [&'static str],
}

const ENDPOINTS: &[&str] = &[
    "GET /api/tasks",
    "POST /api/tasks",
    "GET /api/tasks/stats",
    "GET /api/tasks/filter/priority/{level}",
    "GET /api/tasks/filter/date?start=&end=",
    "GET /api/tasks/search/{text}",
    "GET /api/tasks/{id}",
    "PUT /api/tasks/{id}",
    "DELETE /api/tasks/{id}",
    "PATCH /api/tasks/{id}/complete",
    "GET /api/projects",
    "POST /api/projects",
    "GET /api/projects/stats",
    "GET /api/projects/filter/priority/{level}",
    "GET /api/projects/filter/date?start=&end=",
    "GET /api/projects/{id}",
    "PUT /api/projects/{id}",
    "DELETE /api/projects/{id}",
    "GET /api/projects/{id}/tasks",
    "GET /api/dashboard-stats",
    "GET /api/status",
];

/// `connected`, `error: ...`, or `disconnected` when running on the in-memory store.
async fn database_state(state: &AppState) -> String {
    let Some(pool) = &state.db else {
        return "disconnected".to_string();
    };
    match crate::db::ping(pool).await {
        Ok(()) => "connected".to_string(),
        Err(e) => {
            tracing::warn!(error = %e, "Database health check failed");
            format!("error: {e}")
        }
    }
}

fn resident_memory_kb() -> Option<u64> {
    let status = std::fs::read_to_string("/proc/self/status").ok()?;
    status
        .lines()
        .find_map(|line| line.strip_prefix("VmRSS:"))
        .and_then(|rest| rest.split_whitespace().next())
        .and_then(|kb| kb.parse().ok())
}

/// GET /health
pub async fn health(State(state): State<AppState>) -> Json<ApiResponse<HealthStatus>> {
    let database = database_state(&state).await;
    ApiResponse::success(HealthStatus {
        status: "ok",
        uptime_secs: state.started_at.elapsed().as_secs(),
        memory_rss_kb: resident_memory_kb(),
        version: env!("CARGO_PKG_VERSION"),
        environment: state.config.environment.clone(),
        storage: state.storage_backend(),
        database,
    })
}

/// GET /status-db
pub async fn status_db(State(state): State<AppState>) -> Json<ApiResponse<DatabaseStatus>> {
    let database = database_state(&state).await;
    ApiResponse::success(DatabaseStatus {
        storage: state.storage_backend(),
        database,
        pool_size: state.db.as_ref().map(|pool| pool.size()),
        idle_connections: state.db.as_ref().map(|pool| pool.num_idle()),
    })
}

/// GET /api/status
pub async fn api_status(State(state): State<AppState>) -> Json<ApiResponse<ApiStatus>> {
    ApiResponse::success(ApiStatus {
        name: "taskboard",
        version: env!("CARGO_PKG_VERSION"),
        storage: state.storage_backend(),
        endpoints: ENDPOINTS,
    })
}
