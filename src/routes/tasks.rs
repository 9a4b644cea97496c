//! Task routes: CRUD, completion, filtered lookups and statistics.

use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::{ApiResponse, AppError};
use crate::middleware::extract::{ApiJson, ApiPath, ApiQuery};
use crate::models::priority::Priority;
use crate::models::query::{DateRangeQuery, ListSort};
use crate::models::stats::TaskStats;
use crate::models::task::{CreateTask, Task, TaskFilters, UpdateTask};
use crate::services::task as task_service;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct StatsQuery {
    pub owner: Option<String>,
}

/// GET /api/tasks: list tasks with filters and sort.
pub async fn list(
    State(state): State<AppState>,
    ApiQuery(filters): ApiQuery<TaskFilters>,
    ApiQuery(sort): ApiQuery<ListSort>,
) -> Result<Json<ApiResponse<Vec<Task>>>, AppError> {
    let tasks = task_service::list(&state.repos, &filters, &sort).await?;
    Ok(ApiResponse::success(tasks))
}

/// POST /api/tasks
pub async fn create(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<CreateTask>,
) -> Result<(StatusCode, Json<ApiResponse<Task>>), AppError> {
    let task = task_service::create(&state.repos, &body).await?;
    Ok((StatusCode::CREATED, ApiResponse::success(task)))
}

/// GET /api/tasks/stats: optionally scoped with `?owner=`.
pub async fn stats(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<StatsQuery>,
) -> Result<Json<ApiResponse<TaskStats>>, AppError> {
    let owner = query.owner.as_deref().map(str::trim).filter(|o| !o.is_empty());
    let stats = task_service::stats(&state.repos, owner).await?;
    Ok(ApiResponse::success(stats))
}

/// GET /api/tasks/filter/priority/{level}
pub async fn by_priority(
    State(state): State<AppState>,
    ApiPath(level): ApiPath<String>,
) -> Result<Json<ApiResponse<Vec<Task>>>, AppError> {
    let priority: Priority = level.parse().map_err(AppError::Validation)?;
    let tasks = task_service::by_priority(&state.repos, priority).await?;
    Ok(ApiResponse::success(tasks))
}

/// GET /api/tasks/filter/date?start=..&end=..
pub async fn by_date(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<DateRangeQuery>,
) -> Result<Json<ApiResponse<Vec<Task>>>, AppError> {
    let range = query.into_range()?;
    let tasks = task_service::by_date_range(&state.repos, &range).await?;
    Ok(ApiResponse::success(tasks))
}

/// GET /api/tasks/search/{text}
pub async fn search(
    State(state): State<AppState>,
    ApiPath(text): ApiPath<String>,
) -> Result<Json<ApiResponse<Vec<Task>>>, AppError> {
    let tasks = task_service::search(&state.repos, &text).await?;
    Ok(ApiResponse::success(tasks))
}

/// GET /api/tasks/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<ApiResponse<Task>>, AppError> {
    let task = task_service::find_by_id(&state.repos, id).await?;
    Ok(ApiResponse::success(task))
}

/// PUT /api/tasks/{id}
pub async fn update(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(body): ApiJson<UpdateTask>,
) -> Result<Json<ApiResponse<Task>>, AppError> {
    let task = task_service::update(&state.repos, id, &body).await?;
    Ok(ApiResponse::success(task))
}

/// PATCH /api/tasks/{id}/complete
pub async fn complete(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<ApiResponse<Task>>, AppError> {
    let task = task_service::complete(&state.repos, id).await?;
    Ok(ApiResponse::success(task))
}

/// DELETE /api/tasks/{id}
pub async fn delete(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<StatusCode, AppError> {
    task_service::delete(&state.repos, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
