//! Project service: CRUD, the tasks of a project and project statistics.

use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::db::Repositories;
use crate::errors::AppError;
use crate::models::priority::Priority;
use crate::models::project::{CreateProject, Project, ProjectFilters, UpdateProject};
use crate::models::query::{DateRange, ListSort};
use crate::models::stats::ProjectStats;
use crate::models::task::{Task, TaskFilters};

/// Number of recently updated projects included in statistics.
pub const RECENT_LIMIT: usize = 5;

pub async fn list(
    repos: &Repositories,
    filters: &ProjectFilters,
    sort: &ListSort,
) -> Result<Vec<Project>, AppError> {
    tracing::debug!(?filters, ?sort, "Listing projects");
    repos.projects.list(filters, sort).await
}

pub async fn find_by_id(repos: &Repositories, id: Uuid) -> Result<Project, AppError> {
    repos
        .projects
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Project not found".to_string()))
}

pub async fn create(repos: &Repositories, input: &CreateProject) -> Result<Project, AppError> {
    input.validate()?;
    let project = Project::new(input, Utc::now());
    let project = repos.projects.insert(&project).await?;
    tracing::info!(project_id = %project.id, name = %project.name, "Project created");
    Ok(project)
}

pub async fn update(
    repos: &Repositories,
    id: Uuid,
    input: &UpdateProject,
) -> Result<Project, AppError> {
    input.validate()?;
    let mut project = find_by_id(repos, id).await?;
    project.apply_update(input, Utc::now());
    let project = repos
        .projects
        .update(&project)
        .await?
        .ok_or_else(|| AppError::NotFound("Project not found".to_string()))?;
    tracing::info!(project_id = %project.id, status = ?project.status, "Project updated");
    Ok(project)
}

/// Delete a project. Its tasks survive with no project reference.
pub async fn delete(repos: &Repositories, id: Uuid) -> Result<(), AppError> {
    if !repos.projects.delete(id).await? {
        return Err(AppError::NotFound("Project not found".to_string()));
    }
    tracing::info!(project_id = %id, "Project deleted");
    Ok(())
}

/// Tasks referencing the project, in default task order.
pub async fn tasks(repos: &Repositories, id: Uuid) -> Result<Vec<Task>, AppError> {
    find_by_id(repos, id).await?;
    let filters = TaskFilters {
        project_id: Some(id),
        ..Default::default()
    };
    repos.tasks.list(&filters, &ListSort::default()).await
}

pub async fn by_priority(
    repos: &Repositories,
    priority: Priority,
) -> Result<Vec<Project>, AppError> {
    let filters = ProjectFilters {
        priority: Some(priority),
        ..Default::default()
    };
    repos.projects.list(&filters, &ListSort::default()).await
}

pub async fn by_date_range(
    repos: &Repositories,
    range: &DateRange,
) -> Result<Vec<Project>, AppError> {
    let filters = ProjectFilters {
        created_from: Some(range.start),
        created_to: Some(range.end),
        ..Default::default()
    };
    repos.projects.list(&filters, &ListSort::default()).await
}

pub async fn stats(repos: &Repositories) -> Result<ProjectStats, AppError> {
    let (tally, recent) = tokio::try_join!(
        repos.projects.tally(),
        repos.projects.recently_updated(RECENT_LIMIT),
    )
    .map_err(|e| AppError::Internal(format!("Failed to compute project statistics: {e}")))?;
    Ok(ProjectStats::from_tally(tally, recent))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::project::ProjectStatus;
    use crate::models::task::CreateTask;
    use crate::services::task as task_service;

    fn named(name: &str) -> CreateProject {
        CreateProject {
            name: name.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn create_requires_name() {
        let repos = Repositories::in_memory();
        let err = create(&repos, &CreateProject::default()).await.unwrap_err();
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn delete_detaches_tasks_and_missing_is_not_found() {
        let repos = Repositories::in_memory();
        let project = create(&repos, &named("Launch")).await.unwrap();
        let task = task_service::create(
            &repos,
            &CreateTask {
                title: "Press release".to_string(),
                project_id: Some(project.id),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(tasks(&repos, project.id).await.unwrap().len(), 1);

        delete(&repos, project.id).await.unwrap();
        let task = task_service::find_by_id(&repos, task.id).await.unwrap();
        assert_eq!(task.project_id, None);

        assert!(delete(&repos, project.id).await.unwrap_err().is_not_found());
        assert!(tasks(&repos, project.id).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn stats_count_statuses() {
        let repos = Repositories::in_memory();
        let done = create(&repos, &named("Done")).await.unwrap();
        create(&repos, &named("Running")).await.unwrap();
        update(
            &repos,
            done.id,
            &UpdateProject {
                status: Some(ProjectStatus::Completed),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let stats = stats(&repos).await.unwrap();
        assert_eq!(stats.total, 2);
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.active, 1);
        assert_eq!(stats.pending, 1);
        assert_eq!(stats.completion_percentage, 50);
        assert_eq!(stats.by_priority.sum(), 1);
        assert_eq!(stats.recent[0].id, done.id);
    }

    #[tokio::test]
    async fn by_priority_filters() {
        let repos = Repositories::in_memory();
        create(
            &repos,
            &CreateProject {
                name: "Urgent".to_string(),
                priority: Some(Priority::High),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        create(&repos, &named("Normal")).await.unwrap();
        let high = by_priority(&repos, Priority::High).await.unwrap();
        assert_eq!(high.len(), 1);
        assert_eq!(high[0].name, "Urgent");
    }
}
