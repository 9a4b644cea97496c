//! Project model: a grouping entity that tasks may reference.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use super::priority::Priority;
use super::query::{ListSort, SortField};
use super::task::{long_text, not_blank, short_text};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "project_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ProjectStatus {
    Pending,
    #[default]
    Active,
    Paused,
    Completed,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub status: ProjectStatus,
    pub priority: Priority,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct CreateProject {
    #[serde(default)]
    #[validate(
        custom(function = "not_blank", message = "Name is required"),
        custom(function = "short_text", message = "Name must be at most 200 characters")
    )]
    pub name: String,
    #[validate(custom(
        function = "long_text",
        message = "Description must be at most 1000 characters"
    ))]
    pub description: Option<String>,
    pub status: Option<ProjectStatus>,
    pub priority: Option<Priority>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateProject {
    #[validate(
        custom(function = "not_blank", message = "Name cannot be blank"),
        custom(function = "short_text", message = "Name must be at most 200 characters")
    )]
    pub name: Option<String>,
    #[validate(custom(
        function = "long_text",
        message = "Description must be at most 1000 characters"
    ))]
    pub description: Option<String>,
    pub status: Option<ProjectStatus>,
    pub priority: Option<Priority>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectFilters {
    pub status: Option<ProjectStatus>,
    pub priority: Option<Priority>,
    pub search: Option<String>,
    #[serde(default, deserialize_with = "super::query::deserialize_start_bound")]
    pub created_from: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "super::query::deserialize_end_bound")]
    pub created_to: Option<DateTime<Utc>>,
}

impl Project {
    pub fn new(input: &CreateProject, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: input.name.trim().to_string(),
            description: input
                .description
                .as_deref()
                .map(str::trim)
                .unwrap_or_default()
                .to_string(),
            status: input.status.unwrap_or_default(),
            priority: input.priority.unwrap_or_default(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == ProjectStatus::Completed
    }

    pub fn apply_update(&mut self, input: &UpdateProject, now: DateTime<Utc>) {
        if let Some(name) = &input.name {
            self.name = name.trim().to_string();
        }
        if let Some(description) = &input.description {
            self.description = description.trim().to_string();
        }
        if let Some(status) = input.status {
            self.status = status;
        }
        if let Some(priority) = input.priority {
            self.priority = priority;
        }
        self.updated_at = now;
    }
}

impl ProjectFilters {
    pub fn search_term(&self) -> Option<&str> {
        self.search.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    pub fn matches(&self, project: &Project) -> bool {
        if self.status.is_some_and(|s| project.status != s) {
            return false;
        }
        if self.priority.is_some_and(|p| project.priority != p) {
            return false;
        }
        if let Some(term) = self.search_term() {
            let term = term.to_lowercase();
            if !project.name.to_lowercase().contains(&term)
                && !project.description.to_lowercase().contains(&term)
            {
                return false;
            }
        }
        if self.created_from.is_some_and(|from| project.created_at < from) {
            return false;
        }
        if self.created_to.is_some_and(|to| project.created_at > to) {
            return false;
        }
        true
    }
}

/// Default ordering is newest first; `sort=title` sorts by name. Ties fall back to id.
pub fn compare_projects(a: &Project, b: &Project, sort: &ListSort) -> Ordering {
    let primary = match sort.sort {
        None => b.created_at.cmp(&a.created_at),
        Some(SortField::Priority) => sort
            .directed(b.priority.rank().cmp(&a.priority.rank()))
            .then_with(|| b.created_at.cmp(&a.created_at)),
        Some(SortField::Title) => {
            sort.directed(a.name.to_lowercase().cmp(&b.name.to_lowercase()))
        }
        Some(SortField::CreatedAt) => sort.directed(a.created_at.cmp(&b.created_at)),
    };
    primary.then_with(|| a.id.cmp(&b.id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_project_defaults() {
        let p = Project::new(
            &CreateProject {
                name: " Website ".to_string(),
                ..Default::default()
            },
            Utc::now(),
        );
        assert_eq!(p.name, "Website");
        assert_eq!(p.status, ProjectStatus::Active);
        assert_eq!(p.priority, Priority::Medium);
        assert!(!p.is_completed());
    }

    #[test]
    fn missing_name_is_invalid() {
        let body: CreateProject = serde_json::from_str("{}").unwrap();
        assert!(body.validate().is_err());
    }

    #[test]
    fn padded_name_within_limit_is_valid() {
        let body = CreateProject {
            name: format!("  {}  ", "n".repeat(199)),
            ..Default::default()
        };
        assert!(body.validate().is_ok());
        let update = UpdateProject {
            name: Some("n".repeat(201)),
            ..Default::default()
        };
        assert!(update.validate().is_err());
    }

    #[test]
    fn status_round_trip() {
        let status: ProjectStatus = serde_json::from_str("\"paused\"").unwrap();
        assert_eq!(status, ProjectStatus::Paused);
        assert!(serde_json::from_str::<ProjectStatus>("\"archived\"").is_err());
    }

    #[test]
    fn update_marks_completed() {
        let mut p = Project::new(
            &CreateProject {
                name: "p".to_string(),
                ..Default::default()
            },
            Utc::now(),
        );
        p.apply_update(
            &UpdateProject {
                status: Some(ProjectStatus::Completed),
                ..Default::default()
            },
            Utc::now(),
        );
        assert!(p.is_completed());
        assert_eq!(p.name, "p");
    }

    #[test]
    fn title_ties_fall_back_to_id() {
        let now = Utc::now();
        let make = || {
            Project::new(
                &CreateProject {
                    name: "Same".to_string(),
                    ..Default::default()
                },
                now,
            )
        };
        let (a, b) = (make(), make());
        let sort = ListSort {
            sort: Some(SortField::Title),
            order: crate::models::query::SortOrder::Asc,
        };
        assert_eq!(compare_projects(&a, &b, &sort), a.id.cmp(&b.id));
        assert_eq!(compare_projects(&b, &a, &sort), b.id.cmp(&a.id));
    }
}
