//! HTML page routes and the catch-all fallback.

use axum::{
    extract::{OriginalUri, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use chrono::Utc;

use crate::errors::{ApiResponse, AppError, ErrorKind};
use crate::models::project::ProjectFilters;
use crate::models::query::ListSort;
use crate::models::task::TaskFilters;
use crate::services::{
    dashboard as dashboard_service, project as project_service, task as task_service,
};
use crate::views;
use crate::AppState;

/// Render a page, or the error page with status 500 when its data cannot be loaded.
fn render(page: &str, result: Result<String, AppError>) -> Response {
    match result {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            tracing::error!(page, error = %e, "Failed to render page");
            let (_, _, message) = e.classify();
            (StatusCode::INTERNAL_SERVER_ERROR, Html(views::error(&message))).into_response()
        }
    }
}

pub async fn index() -> Html<String> {
    Html(views::index(&Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string()))
}

pub async fn about() -> Html<String> {
    Html(views::about())
}

pub async fn contact() -> Html<String> {
    Html(views::contact())
}

pub async fn tasks(State(state): State<AppState>) -> Response {
    let result = task_service::list(&state.repos, &TaskFilters::default(), &ListSort::default())
        .await
        .map(|tasks| views::tasks(&tasks));
    render("tasks", result)
}

pub async fn projects(State(state): State<AppState>) -> Response {
    let result =
        project_service::list(&state.repos, &ProjectFilters::default(), &ListSort::default())
            .await
            .map(|projects| views::projects(&projects));
    render("projects", result)
}

pub async fn categories(State(state): State<AppState>) -> Response {
    let result = state
        .repos
        .tasks
        .pending_by_project()
        .await
        .map(|counts| views::categories(&counts));
    render("categories", result)
}

pub async fn dashboard(State(state): State<AppState>) -> Response {
    let result = dashboard_service::get_summary(&state.repos)
        .await
        .map(|stats| views::dashboard(&stats));
    render("dashboard", result)
}

/// Unknown `/api` paths get the JSON envelope; everything else the HTML 404 page.
pub async fn not_found(OriginalUri(uri): OriginalUri) -> Response {
    let path = uri.path();
    tracing::debug!(path, "No route matched");
    if path == "/api" || path.starts_with("/api/") {
        let body = ApiResponse::<()>::error(
            ErrorKind::NotFound,
            &format!("Route {path} not found"),
        );
        return (StatusCode::NOT_FOUND, body).into_response();
    }
    (StatusCode::NOT_FOUND, Html(views::not_found(path))).into_response()
}
