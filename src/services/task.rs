//! Task service: CRUD, filtered lookups and statistics.

use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::db::Repositories;
use crate::errors::AppError;
use crate::models::priority::Priority;
use crate::models::query::{DateRange, ListSort};
use crate::models::stats::TaskStats;
use crate::models::task::{CreateTask, Task, TaskFilters, UpdateTask};

/// Number of recently updated tasks included in statistics.
pub const RECENT_LIMIT: usize = 5;

/// List tasks matching `filters`.
pub async fn list(
    repos: &Repositories,
    filters: &TaskFilters,
    sort: &ListSort,
) -> Result<Vec<Task>, AppError> {
    tracing::debug!(?filters, ?sort, "Listing tasks");
    repos.tasks.list(filters, sort).await
}

/// Find task by ID.
pub async fn find_by_id(repos: &Repositories, id: Uuid) -> Result<Task, AppError> {
    repos
        .tasks
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Task not found".to_string()))
}

/// Create a new task with server-assigned defaults.
pub async fn create(repos: &Repositories, input: &CreateTask) -> Result<Task, AppError> {
    input.validate()?;
    if let Some(project_id) = input.project_id {
        ensure_project_exists(repos, project_id).await?;
    }

    let task = Task::new(input, Utc::now());
    let task = repos.tasks.insert(&task).await?;
    tracing::info!(task_id = %task.id, priority = %task.priority, "Task created");
    Ok(task)
}

/// Update whitelisted fields of a task.
pub async fn update(repos: &Repositories, id: Uuid, input: &UpdateTask) -> Result<Task, AppError> {
    input.validate()?;
    if let Some(Some(project_id)) = input.project_id {
        ensure_project_exists(repos, project_id).await?;
    }

    let mut task = find_by_id(repos, id).await?;
    task.apply_update(input, Utc::now());
    let task = persist(repos, &task).await?;
    tracing::info!(task_id = %task.id, completed = task.completed, "Task updated");
    Ok(task)
}

/// Mark a task as done.
pub async fn complete(repos: &Repositories, id: Uuid) -> Result<Task, AppError> {
    let mut task = find_by_id(repos, id).await?;
    let now = Utc::now();
    task.set_completed(true, now);
    task.updated_at = now;
    let task = persist(repos, &task).await?;
    tracing::info!(task_id = %task.id, "Task completed");
    Ok(task)
}

/// Delete a task; missing ids are a not-found error.
pub async fn delete(repos: &Repositories, id: Uuid) -> Result<(), AppError> {
    if !repos.tasks.delete(id).await? {
        return Err(AppError::NotFound("Task not found".to_string()));
    }
    tracing::info!(task_id = %id, "Task deleted");
    Ok(())
}

/// Tasks with the given priority, in default list order.
pub async fn by_priority(repos: &Repositories, priority: Priority) -> Result<Vec<Task>, AppError> {
    let filters = TaskFilters {
        priority: Some(priority),
        ..Default::default()
    };
    repos.tasks.list(&filters, &ListSort::default()).await
}

/// Tasks created within `range` (inclusive).
pub async fn by_date_range(repos: &Repositories, range: &DateRange) -> Result<Vec<Task>, AppError> {
    let filters = TaskFilters {
        created_from: Some(range.start),
        created_to: Some(range.end),
        ..Default::default()
    };
    repos.tasks.list(&filters, &ListSort::default()).await
}

/// Case-insensitive text search over title and description.
pub async fn search(repos: &Repositories, text: &str) -> Result<Vec<Task>, AppError> {
    if text.trim().is_empty() {
        return Err(AppError::Validation("Search text is required".to_string()));
    }
    let filters = TaskFilters {
        search: Some(text.to_string()),
        ..Default::default()
    };
    repos.tasks.list(&filters, &ListSort::default()).await
}

/// Task statistics, optionally restricted to one owner.
pub async fn stats(repos: &Repositories, owner: Option<&str>) -> Result<TaskStats, AppError> {
    let (tally, recent) = tokio::try_join!(
        repos.tasks.tally(owner),
        repos.tasks.recently_updated(owner, RECENT_LIMIT),
    )
    .map_err(|e| AppError::Internal(format!("Failed to compute task statistics: {e}")))?;
    Ok(TaskStats::from_tally(tally, recent))
}

async fn ensure_project_exists(repos: &Repositories, project_id: Uuid) -> Result<(), AppError> {
    if repos.projects.find_by_id(project_id).await?.is_none() {
        return Err(AppError::Validation("Project not found".to_string()));
    }
    Ok(())
}

async fn persist(repos: &Repositories, task: &Task) -> Result<Task, AppError> {
    repos
        .tasks
        .update(task)
        .await?
        .ok_or_else(|| AppError::NotFound("Task not found".to_string()))
}
