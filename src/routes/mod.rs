//! Route definitions for the Taskboard pages and JSON API.

pub mod dashboard;
pub mod health;
pub mod pages;
pub mod projects;
pub mod tasks;

use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    routing::{get, patch},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::AppState;

/// Permissive in development; otherwise only `FRONTEND_URL` may call the API.
fn cors_layer(state: &AppState) -> CorsLayer {
    if state.config.is_development() {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers(Any);
    match state.config.frontend_url.parse::<HeaderValue>() {
        Ok(origin) => cors.allow_origin(origin),
        Err(e) => {
            tracing::warn!(error = %e, url = %state.config.frontend_url, "Invalid FRONTEND_URL, cross-origin requests disabled");
            cors
        }
    }
}

fn task_routes() -> Router<AppState> {
    Router::new()
        .route("/tasks", get(tasks::list).post(tasks::create))
        .route("/tasks/stats", get(tasks::stats))
        .route("/tasks/filter/priority/{level}", get(tasks::by_priority))
        .route("/tasks/filter/date", get(tasks::by_date))
        .route("/tasks/search/{text}", get(tasks::search))
        .route(
            "/tasks/{id}",
            get(tasks::get_by_id)
                .put(tasks::update)
                .delete(tasks::delete),
        )
        .route("/tasks/{id}/complete", patch(tasks::complete))
}

fn project_routes() -> Router<AppState> {
    Router::new()
        .route("/projects", get(projects::list).post(projects::create))
        .route("/projects/stats", get(projects::stats))
        .route(
            "/projects/filter/priority/{level}",
            get(projects::by_priority),
        )
        .route("/projects/filter/date", get(projects::by_date))
        .route(
            "/projects/{id}",
            get(projects::get_by_id)
                .put(projects::update)
                .delete(projects::delete),
        )
        .route("/projects/{id}/tasks", get(projects::tasks))
}

fn page_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(pages::index))
        .route("/tasks", get(pages::tasks))
        .route("/projects", get(pages::projects))
        .route("/dashboard", get(pages::dashboard))
        .route("/about", get(pages::about))
        .route("/contact", get(pages::contact))
        .route("/categories", get(pages::categories))
}

/// Build the full application router.
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .merge(task_routes())
        .merge(project_routes())
        .route("/dashboard-stats", get(dashboard::stats))
        .route("/status", get(health::api_status));

    Router::new()
        .merge(page_routes())
        .route("/health", get(health::health))
        .route("/status-db", get(health::status_db))
        .nest("/api", api)
        .fallback(pages::not_found)
        // Replaces axum's 2 MiB extractor default; oversized JSON bodies become a 413 envelope.
        .layer(DefaultBodyLimit::max(state.config.body_limit_bytes))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&state))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use crate::config::AppConfig;

    async fn send(request: Request<Body>) -> (StatusCode, serde_json::Value) {
        send_with(AppConfig::default(), request).await
    }

    async fn send_with(
        config: AppConfig,
        request: Request<Body>,
    ) -> (StatusCode, serde_json::Value) {
        let app = router(AppState::in_memory(config));
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn empty_list_is_success_envelope() {
        let (status, body) = send(
            Request::get("/api/tasks")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, serde_json::json!({ "ok": true, "data": [] }));
    }

    #[tokio::test]
    async fn create_returns_201() {
        let (status, body) = send(
            Request::post("/api/tasks")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"title":"Write docs","priority":"low"}"#))
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["data"]["priority"], "low");
    }

    #[tokio::test]
    async fn missing_content_type_is_validation_error() {
        let (status, body) = send(
            Request::post("/api/projects")
                .body(Body::from(r#"{"name":"x"}"#))
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error_kind"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn empty_stats() {
        let (status, body) = send(
            Request::get("/api/tasks/stats")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["total"], 0);
        assert_eq!(body["data"]["completion_percentage"], 0);
        assert_eq!(
            body["data"]["by_priority"],
            serde_json::json!({ "high": 0, "medium": 0, "low": 0 })
        );
    }

    #[tokio::test]
    async fn unknown_task_is_not_found() {
        let uri = format!("/api/tasks/{}", uuid::Uuid::new_v4());
        let (status, body) = send(Request::get(uri).body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Task not found");
    }

    fn padded_task_body(padding: usize) -> String {
        format!(
            r#"{{"title":"Big upload","padding":"{}"}}"#,
            "a".repeat(padding)
        )
    }

    #[tokio::test]
    async fn body_above_two_mib_within_limit_is_accepted() {
        let (status, body) = send(
            Request::post("/api/tasks")
                .header("content-type", "application/json")
                .body(Body::from(padded_task_body(3 * 1024 * 1024)))
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["data"]["title"], "Big upload");
    }

    #[tokio::test]
    async fn body_over_configured_limit_is_413_envelope() {
        let config = AppConfig {
            body_limit_bytes: 1024,
            ..AppConfig::default()
        };
        let (status, body) = send_with(
            config,
            Request::post("/api/tasks")
                .header("content-type", "application/json")
                .body(Body::from(padded_task_body(4096)))
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(body["ok"], false);
        assert_eq!(body["error_kind"], "VALIDATION_ERROR");
    }
}
