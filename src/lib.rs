pub mod config;
pub mod db;
pub mod errors;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod views;

use std::time::Instant;

use sqlx::PgPool;

use db::Repositories;

/// Shared application state passed to all Axum handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    pub repos: Repositories,
    /// `None` when running on the in-memory store (degraded mode).
    pub db: Option<PgPool>,
    pub config: config::AppConfig,
    pub started_at: Instant,
}

impl AppState {
    /// State backed by the in-memory store.
    pub fn in_memory(config: config::AppConfig) -> Self {
        Self {
            repos: Repositories::in_memory(),
            db: None,
            config,
            started_at: Instant::now(),
        }
    }

    /// State backed by PostgreSQL.
    pub fn with_pool(pool: PgPool, config: config::AppConfig) -> Self {
        Self {
            repos: Repositories::postgres(pool.clone()),
            db: Some(pool),
            config,
            started_at: Instant::now(),
        }
    }

    pub fn storage_backend(&self) -> &'static str {
        if self.db.is_some() {
            "postgres"
        } else {
            "memory"
        }
    }
}
