//! Statistics shapes served to the dashboard and the tallies stores produce.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::priority::Priority;
use super::project::{Project, ProjectStatus};
use super::task::Task;

/// Label used for pending tasks that reference no project.
pub const NO_PROJECT_LABEL: &str = "No Project";

/// Fixed three-bucket count map. All keys are always present.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PriorityBuckets {
    pub high: i64,
    pub medium: i64,
    pub low: i64,
}

impl PriorityBuckets {
    pub fn increment(&mut self, priority: Priority) {
        match priority {
            Priority::High => self.high += 1,
            Priority::Medium => self.medium += 1,
            Priority::Low => self.low += 1,
        }
    }

    pub fn get(&self, priority: Priority) -> i64 {
        match priority {
            Priority::High => self.high,
            Priority::Medium => self.medium,
            Priority::Low => self.low,
        }
    }

    pub fn sum(&self) -> i64 {
        self.high + self.medium + self.low
    }
}

/// Raw counts over a task collection; `pending_by_priority` counts open tasks only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskTally {
    pub total: i64,
    pub completed: i64,
    pub pending_by_priority: PriorityBuckets,
}

impl TaskTally {
    pub fn from_tasks<'a, I>(tasks: I) -> Self
    where
        I: IntoIterator<Item = &'a Task>,
    {
        tasks.into_iter().fold(Self::default(), |mut tally, task| {
            tally.total += 1;
            if task.completed {
                tally.completed += 1;
            } else {
                tally.pending_by_priority.increment(task.priority);
            }
            tally
        })
    }
}

/// Raw counts over a project collection; `pending_by_priority` skips completed projects.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProjectTally {
    pub total: i64,
    pub completed: i64,
    pub active: i64,
    pub paused: i64,
    pub pending_by_priority: PriorityBuckets,
}

impl ProjectTally {
    pub fn from_projects<'a, I>(projects: I) -> Self
    where
        I: IntoIterator<Item = &'a Project>,
    {
        projects.into_iter().fold(Self::default(), |mut tally, project| {
            tally.total += 1;
            match project.status {
                ProjectStatus::Completed => tally.completed += 1,
                ProjectStatus::Active => tally.active += 1,
                ProjectStatus::Paused => tally.paused += 1,
                ProjectStatus::Pending => {}
            }
            if !project.is_completed() {
                tally.pending_by_priority.increment(project.priority);
            }
            tally
        })
    }
}

/// Pending task count for one project (or the no-project sentinel).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, sqlx::FromRow)]
pub struct ProjectTaskCount {
    pub project_id: Option<Uuid>,
    pub project_name: String,
    pub count: i64,
}

/// `round(completed / total * 100)`, or 0 for an empty collection.
pub fn completion_percentage(completed: i64, total: i64) -> i64 {
    if total <= 0 {
        return 0;
    }
    ((completed as f64 / total as f64) * 100.0).round() as i64
}

/// Group pending tasks by referenced project, most loaded first.
///
/// Tasks without a project, or whose project no longer exists, fall under
/// [`NO_PROJECT_LABEL`].
pub fn pending_tasks_by_project(tasks: &[Task], projects: &[Project]) -> Vec<ProjectTaskCount> {
    let names: HashMap<Uuid, &str> = projects.iter().map(|p| (p.id, p.name.as_str())).collect();
    let mut counts: HashMap<Option<Uuid>, i64> = HashMap::new();
    for task in tasks.iter().filter(|t| !t.completed) {
        let key = task.project_id.filter(|id| names.contains_key(id));
        *counts.entry(key).or_default() += 1;
    }

    let mut grouped: Vec<ProjectTaskCount> = counts
        .into_iter()
        .map(|(project_id, count)| ProjectTaskCount {
            project_id,
            project_name: project_id
                .and_then(|id| names.get(&id).copied())
                .unwrap_or(NO_PROJECT_LABEL)
                .to_string(),
            count,
        })
        .collect();
    sort_project_counts(&mut grouped);
    grouped
}

/// Descending count, then label by byte order, then project id (no project first).
pub fn sort_project_counts(counts: &mut [ProjectTaskCount]) {
    counts.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| a.project_name.cmp(&b.project_name))
            .then_with(|| a.project_id.cmp(&b.project_id))
    });
}

/// Task summary for `/api/tasks/stats` and the dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct TaskStats {
    pub total: i64,
    pub completed: i64,
    pub pending: i64,
    pub completion_percentage: i64,
    pub by_priority: PriorityBuckets,
    pub recent: Vec<Task>,
}

impl TaskStats {
    pub fn from_tally(tally: TaskTally, recent: Vec<Task>) -> Self {
        Self {
            total: tally.total,
            completed: tally.completed,
            pending: tally.total - tally.completed,
            completion_percentage: completion_percentage(tally.completed, tally.total),
            by_priority: tally.pending_by_priority,
            recent,
        }
    }
}

/// Project summary for `/api/projects/stats` and the dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectStats {
    pub total: i64,
    pub completed: i64,
    pub active: i64,
    pub paused: i64,
    pub pending: i64,
    pub completion_percentage: i64,
    pub by_priority: PriorityBuckets,
    pub recent: Vec<Project>,
}

impl ProjectStats {
    pub fn from_tally(tally: ProjectTally, recent: Vec<Project>) -> Self {
        Self {
            total: tally.total,
            completed: tally.completed,
            active: tally.active,
            paused: tally.paused,
            pending: tally.total - tally.completed,
            completion_percentage: completion_percentage(tally.completed, tally.total),
            by_priority: tally.pending_by_priority,
            recent,
        }
    }
}

/// Combined summary served by `/api/dashboard-stats`.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardStats {
    pub tasks: TaskStats,
    pub projects: ProjectStats,
    pub tasks_by_project: Vec<ProjectTaskCount>,
}
