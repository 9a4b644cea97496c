//! Project routes.

use axum::{extract::State, http::StatusCode, Json};
use uuid::Uuid;

use crate::errors::{ApiResponse, AppError};
use crate::middleware::extract::{ApiJson, ApiPath, ApiQuery};
use crate::models::priority::Priority;
use crate::models::project::{CreateProject, Project, ProjectFilters, UpdateProject};
use crate::models::query::{DateRangeQuery, ListSort};
use crate::models::stats::ProjectStats;
use crate::models::task::Task;
use crate::services::project as project_service;
use crate::AppState;

/// GET /api/projects: list projects with filters and sort.
pub async fn list(
    State(state): State<AppState>,
    ApiQuery(filters): ApiQuery<ProjectFilters>,
    ApiQuery(sort): ApiQuery<ListSort>,
) -> Result<Json<ApiResponse<Vec<Project>>>, AppError> {
    let projects = project_service::list(&state.repos, &filters, &sort).await?;
    Ok(ApiResponse::success(projects))
}

pub async fn create(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<CreateProject>,
) -> Result<(StatusCode, Json<ApiResponse<Project>>), AppError> {
    let project = project_service::create(&state.repos, &body).await?;
    Ok((StatusCode::CREATED, ApiResponse::success(project)))
}

pub async fn stats(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<ProjectStats>>, AppError> {
    let stats = project_service::stats(&state.repos).await?;
    Ok(ApiResponse::success(stats))
}

pub async fn by_priority(
    State(state): State<AppState>,
    ApiPath(level): ApiPath<String>,
) -> Result<Json<ApiResponse<Vec<Project>>>, AppError> {
    let priority: Priority = level.parse().map_err(AppError::Validation)?;
    let projects = project_service::by_priority(&state.repos, priority).await?;
    Ok(ApiResponse::success(projects))
}

pub async fn by_date(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<DateRangeQuery>,
) -> Result<Json<ApiResponse<Vec<Project>>>, AppError> {
    let range = query.into_range()?;
    let projects = project_service::by_date_range(&state.repos, &range).await?;
    Ok(ApiResponse::success(projects))
}

pub async fn get_by_id(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<ApiResponse<Project>>, AppError> {
    let project = project_service::find_by_id(&state.repos, id).await?;
    Ok(ApiResponse::success(project))
}

pub async fn update(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(body): ApiJson<UpdateProject>,
) -> Result<Json<ApiResponse<Project>>, AppError> {
    let project = project_service::update(&state.repos, id, &body).await?;
    Ok(ApiResponse::success(project))
}

/// DELETE /api/projects/{id}: tasks of the project are detached, not removed.
pub async fn delete(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<StatusCode, AppError> {
    project_service::delete(&state.repos, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/projects/{id}/tasks
pub async fn tasks(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<ApiResponse<Vec<Task>>>, AppError> {
    let tasks = project_service::tasks(&state.repos, id).await?;
    Ok(ApiResponse::success(tasks))
}
