//! Storage abstraction, connection pool and migration utilities.
//!
//! Services talk to [`TaskRepository`] and [`ProjectRepository`] only, so the
//! backing store can be the in-memory [`memory::MemoryStore`] or the
//! PostgreSQL-backed [`postgres::PgStore`].

pub mod memory;
pub mod postgres;

use std::fmt::Debug;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;
use uuid::Uuid;

use crate::config::DatabaseConfig;
use crate::errors::AppError;
use crate::models::project::{Project, ProjectFilters};
use crate::models::query::ListSort;
use crate::models::stats::{ProjectTally, ProjectTaskCount, TaskTally};
use crate::models::task::{Task, TaskFilters};

/// Persistence for tasks. Implementations store what they are given; domain
/// rules (defaults, completion timestamps) are applied by the service layer.
#[async_trait]
pub trait TaskRepository: Send + Sync + Debug {
    async fn list(&self, filters: &TaskFilters, sort: &ListSort) -> Result<Vec<Task>, AppError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Task>, AppError>;
    async fn insert(&self, task: &Task) -> Result<Task, AppError>;
    /// Persist all mutable fields; `None` when the task no longer exists.
    async fn update(&self, task: &Task) -> Result<Option<Task>, AppError>;
    /// `false` when nothing was deleted.
    async fn delete(&self, id: Uuid) -> Result<bool, AppError>;
    async fn tally(&self, owner: Option<&str>) -> Result<TaskTally, AppError>;
    async fn recently_updated(
        &self,
        owner: Option<&str>,
        limit: usize,
    ) -> Result<Vec<Task>, AppError>;
    /// Pending tasks grouped by project, sorted by descending count.
    async fn pending_by_project(&self) -> Result<Vec<ProjectTaskCount>, AppError>;
}

/// Persistence for projects.
#[async_trait]
pub trait ProjectRepository: Send + Sync + Debug {
    async fn list(
        &self,
        filters: &ProjectFilters,
        sort: &ListSort,
    ) -> Result<Vec<Project>, AppError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Project>, AppError>;
    async fn insert(&self, project: &Project) -> Result<Project, AppError>;
    async fn update(&self, project: &Project) -> Result<Option<Project>, AppError>;
    /// Deleting a project detaches its tasks rather than deleting them.
    async fn delete(&self, id: Uuid) -> Result<bool, AppError>;
    async fn tally(&self) -> Result<ProjectTally, AppError>;
    async fn recently_updated(&self, limit: usize) -> Result<Vec<Project>, AppError>;
}

/// Repository handles injected into services.
#[derive(Debug, Clone)]
pub struct Repositories {
    pub tasks: Arc<dyn TaskRepository>,
    pub projects: Arc<dyn ProjectRepository>,
}

impl Repositories {
    pub fn in_memory() -> Self {
        let store = memory::MemoryStore::default();
        Self {
            tasks: Arc::new(store.clone()),
            projects: Arc::new(store),
        }
    }

    pub fn postgres(pool: PgPool) -> Self {
        let store = postgres::PgStore::new(pool);
        Self {
            tasks: Arc::new(store.clone()),
            projects: Arc::new(store),
        }
    }
}

/// Create a PostgreSQL connection pool.
///
/// `connect_timeout_secs` bounds how long acquiring a connection may take and
/// `statement_timeout_secs` is applied server-side to every statement.
pub async fn create_pool(database_url: &str, config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    let options = PgConnectOptions::from_str(database_url)?
        .options([("statement_timeout", format!("{}s", config.statement_timeout_secs))]);

    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
        .connect_with(options)
        .await
}

/// Apply the embedded schema migrations.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

/// Connect, migrate and ping; any failure is returned for the caller to degrade on.
pub async fn connect(database_url: &str, config: &DatabaseConfig) -> Result<PgPool, AppError> {
    let pool = create_pool(database_url, config).await?;
    run_migrations(&pool)
        .await
        .map_err(|e| AppError::Internal(format!("Migration failed: {e}")))?;
    ping(&pool).await?;
    Ok(pool)
}

pub async fn ping(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await.map(|_| ())
}
