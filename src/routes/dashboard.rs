//! Dashboard routes: aggregated statistics for the overview page.

use axum::{extract::State, Json};

use crate::errors::{ApiResponse, AppError};
use crate::models::stats::DashboardStats;
use crate::services::dashboard;
use crate::AppState;

/// GET /api/dashboard-stats: task, project and per-project statistics.
pub async fn stats(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<DashboardStats>>, AppError> {
    let stats = dashboard::get_summary(&state.repos).await?;
    Ok(ApiResponse::success(stats))
}
