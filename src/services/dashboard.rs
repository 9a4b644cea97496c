//! Dashboard statistics aggregation.

use crate::db::Repositories;
use crate::errors::AppError;
use crate::models::stats::DashboardStats;
use crate::services::{project, task};

/// Fetch task statistics, project statistics and the pending-task grouping concurrently.
pub async fn get_summary(repos: &Repositories) -> Result<DashboardStats, AppError> {
    let (tasks, projects, tasks_by_project) = tokio::try_join!(
        task::stats(repos, None),
        project::stats(repos),
        repos.tasks.pending_by_project(),
    )
    .map_err(|e| match e {
        AppError::Internal(_) => e,
        other => AppError::Internal(format!("Failed to compute dashboard statistics: {other}")),
    })?;

    Ok(DashboardStats {
        tasks,
        projects,
        tasks_by_project,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::priority::Priority;
    use crate::models::project::CreateProject;
    use crate::models::stats::NO_PROJECT_LABEL;
    use crate::models::task::CreateTask;

    #[tokio::test]
    async fn empty_store_summary() {
        let repos = Repositories::in_memory();
        let summary = get_summary(&repos).await.unwrap();
        assert_eq!(summary.tasks.total, 0);
        assert_eq!(summary.tasks.completion_percentage, 0);
        assert_eq!(summary.projects.total, 0);
        assert!(summary.tasks_by_project.is_empty());
    }

    #[tokio::test]
    async fn groups_pending_tasks_under_projects() {
        let repos = Repositories::in_memory();
        let site = project::create(
            &repos,
            &CreateProject {
                name: "Website".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        for title in ["Header", "Footer"] {
            task::create(
                &repos,
                &CreateTask {
                    title: title.to_string(),
                    project_id: Some(site.id),
                    priority: Some(Priority::High),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        }
        let loose = task::create(
            &repos,
            &CreateTask {
                title: "Groceries".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        task::complete(&repos, loose.id).await.unwrap();
        task::create(
            &repos,
            &CreateTask {
                title: "Laundry".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let summary = get_summary(&repos).await.unwrap();
        assert_eq!(summary.tasks.total, 4);
        assert_eq!(summary.tasks.completed, 1);
        assert_eq!(summary.tasks.completion_percentage, 25);
        assert_eq!(summary.projects.total, 1);
        assert_eq!(summary.tasks_by_project.len(), 2);
        assert_eq!(summary.tasks_by_project[0].project_name, "Website");
        assert_eq!(summary.tasks_by_project[0].count, 2);
        assert_eq!(summary.tasks_by_project[1].project_name, NO_PROJECT_LABEL);
        assert_eq!(summary.tasks_by_project[1].count, 1);
    }
}
