//! In-memory store used when no database is configured or reachable.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{ProjectRepository, TaskRepository};
use crate::errors::AppError;
use crate::models::project::{compare_projects, Project, ProjectFilters};
use crate::models::query::ListSort;
use crate::models::stats::{pending_tasks_by_project, ProjectTally, ProjectTaskCount, TaskTally};
use crate::models::task::{compare_tasks, Task, TaskFilters};

#[derive(Debug, Default)]
struct Inner {
    tasks: HashMap<Uuid, Task>,
    projects: HashMap<Uuid, Project>,
}

/// Both collections live behind one lock so project deletion can detach tasks atomically.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Inner>>,
}

/// Most recently updated first; equal timestamps by ascending id.
fn newest_first<T, F>(mut items: Vec<T>, key: F, limit: usize) -> Vec<T>
where
    F: Fn(&T) -> (chrono::DateTime<chrono::Utc>, Uuid),
{
    items.sort_by_key(|item| {
        let (updated_at, id) = key(item);
        (std::cmp::Reverse(updated_at), id)
    });
    items.truncate(limit);
    items
}

#[async_trait]
impl TaskRepository for MemoryStore {
    async fn list(&self, filters: &TaskFilters, sort: &ListSort) -> Result<Vec<Task>, AppError> {
        let inner = self.inner.read().await;
        let mut tasks: Vec<Task> = inner
            .tasks
            .values()
            .filter(|t| filters.matches(t))
            .cloned()
            .collect();
        tasks.sort_by(|a, b| compare_tasks(a, b, sort));
        Ok(tasks)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Task>, AppError> {
        Ok(self.inner.read().await.tasks.get(&id).cloned())
    }

    async fn insert(&self, task: &Task) -> Result<Task, AppError> {
        let mut inner = self.inner.write().await;
        if let Some(project_id) = task.project_id {
            if !inner.projects.contains_key(&project_id) {
                return Err(AppError::Validation("Project not found".to_string()));
            }
        }
        inner.tasks.insert(task.id, task.clone());
        Ok(task.clone())
    }

    async fn update(&self, task: &Task) -> Result<Option<Task>, AppError> {
        let mut inner = self.inner.write().await;
        if let Some(project_id) = task.project_id {
            if !inner.projects.contains_key(&project_id) {
                return Err(AppError::Validation("Project not found".to_string()));
            }
        }
        match inner.tasks.get_mut(&task.id) {
            Some(existing) => {
                *existing = task.clone();
                Ok(Some(task.clone()))
            }
            None => Ok(None),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        Ok(self.inner.write().await.tasks.remove(&id).is_some())
    }

    async fn tally(&self, owner: Option<&str>) -> Result<TaskTally, AppError> {
        let inner = self.inner.read().await;
        Ok(TaskTally::from_tasks(
            inner
                .tasks
                .values()
                .filter(|t| owner.is_none() || t.owner.as_deref() == owner),
        ))
    }

    async fn recently_updated(
        &self,
        owner: Option<&str>,
        limit: usize,
    ) -> Result<Vec<Task>, AppError> {
        let inner = self.inner.read().await;
        let tasks = inner
            .tasks
            .values()
            .filter(|t| owner.is_none() || t.owner.as_deref() == owner)
            .cloned()
            .collect();
        Ok(newest_first(tasks, |t: &Task| (t.updated_at, t.id), limit))
    }

    async fn pending_by_project(&self) -> Result<Vec<ProjectTaskCount>, AppError> {
        let inner = self.inner.read().await;
        let tasks: Vec<Task> = inner.tasks.values().cloned().collect();
        let projects: Vec<Project> = inner.projects.values().cloned().collect();
        Ok(pending_tasks_by_project(&tasks, &projects))
    }
}

#[async_trait]
impl ProjectRepository for MemoryStore {
    async fn list(
        &self,
        filters: &ProjectFilters,
        sort: &ListSort,
    ) -> Result<Vec<Project>, AppError> {
        let inner = self.inner.read().await;
        let mut projects: Vec<Project> = inner
            .projects
            .values()
            .filter(|p| filters.matches(p))
            .cloned()
            .collect();
        projects.sort_by(|a, b| compare_projects(a, b, sort));
        Ok(projects)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Project>, AppError> {
        Ok(self.inner.read().await.projects.get(&id).cloned())
    }

    async fn insert(&self, project: &Project) -> Result<Project, AppError> {
        self.inner
            .write()
            .await
            .projects
            .insert(project.id, project.clone());
        Ok(project.clone())
    }

    async fn update(&self, project: &Project) -> Result<Option<Project>, AppError> {
        let mut inner = self.inner.write().await;
        match inner.projects.get_mut(&project.id) {
            Some(existing) => {
                *existing = project.clone();
                Ok(Some(project.clone()))
            }
            None => Ok(None),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let mut inner = self.inner.write().await;
        if inner.projects.remove(&id).is_none() {
            return Ok(false);
        }
        for task in inner.tasks.values_mut() {
            if task.project_id == Some(id) {
                task.project_id = None;
            }
        }
        Ok(true)
    }

    async fn tally(&self) -> Result<ProjectTally, AppError> {
        let inner = self.inner.read().await;
        Ok(ProjectTally::from_projects(inner.projects.values()))
    }

    async fn recently_updated(&self, limit: usize) -> Result<Vec<Project>, AppError> {
        let inner = self.inner.read().await;
        let projects = inner.projects.values().cloned().collect();
        Ok(newest_first(projects, |p: &Project| (p.updated_at, p.id), limit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::priority::Priority;
    use crate::models::project::CreateProject;
    use crate::models::task::CreateTask;
    use chrono::Utc;

    fn new_task(title: &str, owner: Option<&str>, project_id: Option<Uuid>) -> Task {
        Task::new(
            &CreateTask {
                title: title.to_string(),
                owner: owner.map(str::to_string),
                project_id,
                ..Default::default()
            },
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn deleting_project_detaches_tasks() {
        let store = MemoryStore::default();
        let project = Project::new(
            &CreateProject {
                name: "Home".to_string(),
                ..Default::default()
            },
            Utc::now(),
        );
        ProjectRepository::insert(&store, &project).await.unwrap();
        let task = new_task("Paint", None, Some(project.id));
        TaskRepository::insert(&store, &task).await.unwrap();

        assert!(ProjectRepository::delete(&store, project.id).await.unwrap());
        let reloaded = TaskRepository::find_by_id(&store, task.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(reloaded.project_id, None);
        assert!(!ProjectRepository::delete(&store, project.id).await.unwrap());
    }

    #[tokio::test]
    async fn rejects_unknown_project_reference() {
        let store = MemoryStore::default();
        let task = new_task("Orphan", None, Some(Uuid::new_v4()));
        let err = TaskRepository::insert(&store, &task).await.unwrap_err();
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn tally_respects_owner_filter() {
        let store = MemoryStore::default();
        let mut done = new_task("a", Some("ana"), None);
        done.set_completed(true, Utc::now());
        TaskRepository::insert(&store, &done).await.unwrap();
        TaskRepository::insert(&store, &new_task("b", Some("ana"), None))
            .await
            .unwrap();
        TaskRepository::insert(&store, &new_task("c", Some("rui"), None))
            .await
            .unwrap();

        let all = TaskRepository::tally(&store, None).await.unwrap();
        assert_eq!(all.total, 3);
        let ana = TaskRepository::tally(&store, Some("ana")).await.unwrap();
        assert_eq!(ana.total, 2);
        assert_eq!(ana.completed, 1);
        assert_eq!(ana.pending_by_priority.get(Priority::Medium), 1);
    }

    #[tokio::test]
    async fn update_of_missing_task_returns_none() {
        let store = MemoryStore::default();
        let task = new_task("ghost", None, None);
        assert!(TaskRepository::update(&store, &task).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn recent_is_limited_and_newest_first() {
        let store = MemoryStore::default();
        for i in 0..7 {
            let mut t = new_task(&format!("t{i}"), None, None);
            t.updated_at = Utc::now() + chrono::Duration::seconds(i);
            TaskRepository::insert(&store, &t).await.unwrap();
        }
        let recent = TaskRepository::recently_updated(&store, None, 5).await.unwrap();
        assert_eq!(recent.len(), 5);
        assert_eq!(recent[0].title, "t6");
    }
}
