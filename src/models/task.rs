//! Task model, request DTOs, list filters and ordering.

use std::cmp::Ordering;
use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use super::priority::Priority;
use super::query::{deserialize_end_bound, deserialize_start_bound, ListSort, SortField};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub completed: bool,
    /// Present exactly when `completed` is true.
    pub completed_at: Option<DateTime<Utc>>,
    pub tags: Vec<String>,
    pub owner: Option<String>,
    pub project_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct CreateTask {
    #[serde(default)]
    #[validate(
        custom(function = "not_blank", message = "Title is required"),
        custom(function = "short_text", message = "Title must be at most 200 characters")
    )]
    pub title: String,
    #[validate(custom(
        function = "long_text",
        message = "Description must be at most 1000 characters"
    ))]
    pub description: Option<String>,
    pub priority: Option<Priority>,
    #[serde(default, deserialize_with = "deserialize_tags")]
    pub tags: Option<Vec<String>>,
    pub owner: Option<String>,
    pub project_id: Option<Uuid>,
}

/// Whitelisted mutable fields. Anything else in the request body is ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateTask {
    #[validate(
        custom(function = "not_blank", message = "Title cannot be blank"),
        custom(function = "short_text", message = "Title must be at most 200 characters")
    )]
    pub title: Option<String>,
    #[validate(custom(
        function = "long_text",
        message = "Description must be at most 1000 characters"
    ))]
    pub description: Option<String>,
    pub completed: Option<bool>,
    pub priority: Option<Priority>,
    #[serde(default, deserialize_with = "deserialize_tags")]
    pub tags: Option<Vec<String>>,
    /// `Some(None)` detaches the task from its project.
    #[serde(default, deserialize_with = "deserialize_present")]
    pub project_id: Option<Option<Uuid>>,
}

/// Filters for listing tasks.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskFilters {
    pub completed: Option<bool>,
    pub priority: Option<Priority>,
    pub project_id: Option<Uuid>,
    pub owner: Option<String>,
    /// Case-insensitive substring of title or description.
    pub search: Option<String>,
    /// Comma separated; a task matches when it carries any of them.
    pub tags: Option<String>,
    #[serde(default, deserialize_with = "deserialize_start_bound")]
    pub created_from: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "deserialize_end_bound")]
    pub created_to: Option<DateTime<Utc>>,
}

impl Task {
    /// Build a new task from a validated request, applying server defaults.
    pub fn new(input: &CreateTask, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: input.title.trim().to_string(),
            description: input
                .description
                .as_deref()
                .map(str::trim)
                .unwrap_or_default()
                .to_string(),
            priority: input.priority.unwrap_or_default(),
            completed: false,
            completed_at: None,
            tags: input.tags.as_deref().map(normalize_tags).unwrap_or_default(),
            owner: input
                .owner
                .as_deref()
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(str::to_string),
            project_id: input.project_id,
            created_at: now,
            updated_at: now,
        }
    }

    /// Set the completion flag and keep `completed_at` in sync with it.
    ///
    /// Re-completing an already completed task keeps the original timestamp.
    pub fn set_completed(&mut self, completed: bool, now: DateTime<Utc>) {
        if completed {
            if self.completed_at.is_none() {
                self.completed_at = Some(now);
            }
        } else {
            self.completed_at = None;
        }
        self.completed = completed;
    }

    /// Apply whitelisted changes and bump `updated_at`.
    pub fn apply_update(&mut self, input: &UpdateTask, now: DateTime<Utc>) {
        if let Some(title) = &input.title {
            self.title = title.trim().to_string();
        }
        if let Some(description) = &input.description {
            self.description = description.trim().to_string();
        }
        if let Some(priority) = input.priority {
            self.priority = priority;
        }
        if let Some(tags) = &input.tags {
            self.tags = normalize_tags(tags);
        }
        if let Some(project_id) = input.project_id {
            self.project_id = project_id;
        }
        if let Some(completed) = input.completed {
            self.set_completed(completed, now);
        }
        self.updated_at = now;
    }
}

impl TaskFilters {
    /// Lowercased tag list parsed from the comma separated `tags` parameter.
    pub fn tag_list(&self) -> Vec<String> {
        self.tags
            .as_deref()
            .map(|raw| {
                raw.split(',')
                    .map(|t| t.trim().to_lowercase())
                    .filter(|t| !t.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Trimmed, non-empty search term.
    pub fn search_term(&self) -> Option<&str> {
        self.search.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    pub fn matches(&self, task: &Task) -> bool {
        if self.completed.is_some_and(|c| task.completed != c) {
            return false;
        }
        if self.priority.is_some_and(|p| task.priority != p) {
            return false;
        }
        if self.project_id.is_some() && task.project_id != self.project_id {
            return false;
        }
        if let Some(owner) = &self.owner {
            if task.owner.as_deref() != Some(owner.as_str()) {
                return false;
            }
        }
        if let Some(term) = self.search_term() {
            let term = term.to_lowercase();
            if !task.title.to_lowercase().contains(&term)
                && !task.description.to_lowercase().contains(&term)
            {
                return false;
            }
        }
        let wanted = self.tag_list();
        if !wanted.is_empty()
            && !task
                .tags
                .iter()
                .any(|tag| wanted.contains(&tag.to_lowercase()))
        {
            return false;
        }
        if self.created_from.is_some_and(|from| task.created_at < from) {
            return false;
        }
        if self.created_to.is_some_and(|to| task.created_at > to) {
            return false;
        }
        true
    }
}

/// Compare two tasks for list output.
///
/// Default ordering: incomplete first, then priority rank, then newest first.
pub fn compare_tasks(a: &Task, b: &Task, sort: &ListSort) -> Ordering {
    match sort.sort {
        None => a
            .completed
            .cmp(&b.completed)
            .then_with(|| a.priority.rank().cmp(&b.priority.rank()))
            .then_with(|| b.created_at.cmp(&a.created_at))
            .then_with(|| a.id.cmp(&b.id)),
        // "Descending" priority means most urgent first.
        Some(SortField::Priority) => sort
            .directed(b.priority.rank().cmp(&a.priority.rank()))
            .then_with(|| b.created_at.cmp(&a.created_at))
            .then_with(|| a.id.cmp(&b.id)),
        Some(SortField::Title) => sort
            .directed(
                a.title
                    .to_lowercase()
                    .cmp(&b.title.to_lowercase())
                    .then_with(|| a.created_at.cmp(&b.created_at)),
            )
            .then_with(|| a.id.cmp(&b.id)),
        Some(SortField::CreatedAt) => sort
            .directed(a.created_at.cmp(&b.created_at))
            .then_with(|| a.id.cmp(&b.id)),
    }
}

/// Trim tags, drop empties and case-insensitive duplicates, keep first-seen order.
pub fn normalize_tags<I, S>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    tags.into_iter()
        .map(|t| t.as_ref().trim().to_string())
        .filter(|t| !t.is_empty() && seen.insert(t.to_lowercase()))
        .collect()
}

/// Tags arrive either as a JSON array or a comma separated string.
#[derive(Deserialize)]
#[serde(untagged)]
enum TagsInput {
    List(Vec<String>),
    Csv(String),
}

fn deserialize_tags<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let input: Option<TagsInput> = Option::deserialize(deserializer)?;
    Ok(input.map(|tags| match tags {
        TagsInput::List(list) => normalize_tags(list),
        TagsInput::Csv(raw) => normalize_tags(raw.split(',')),
    }))
}

/// Distinguishes an absent field (`None`) from an explicit `null` (`Some(None)`).
fn deserialize_present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

pub(crate) fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

/// Titles and names: at most 200 characters once trimmed, as stored.
pub(crate) fn short_text(value: &str) -> Result<(), ValidationError> {
    max_trimmed_chars(value, 200)
}

/// Descriptions: at most 1000 characters once trimmed.
pub(crate) fn long_text(value: &str) -> Result<(), ValidationError> {
    max_trimmed_chars(value, 1000)
}

fn max_trimmed_chars(value: &str, max: usize) -> Result<(), ValidationError> {
    if value.trim().chars().count() > max {
        return Err(ValidationError::new("length"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn task(title: &str, priority: Priority, completed: bool, age_minutes: i64) -> Task {
        let now = Utc::now() - Duration::minutes(age_minutes);
        let mut t = Task::new(
            &CreateTask {
                title: title.to_string(),
                priority: Some(priority),
                ..Default::default()
            },
            now,
        );
        t.set_completed(completed, now);
        t
    }

    #[test]
    fn new_task_gets_defaults() {
        let t = Task::new(
            &CreateTask {
                title: "  Write docs  ".to_string(),
                owner: Some("   ".to_string()),
                ..Default::default()
            },
            Utc::now(),
        );
        assert_eq!(t.title, "Write docs");
        assert_eq!(t.priority, Priority::Medium);
        assert!(!t.completed);
        assert!(t.completed_at.is_none());
        assert_eq!(t.description, "");
        assert!(t.owner.is_none());
    }

    #[test]
    fn completion_timestamp_tracks_flag() {
        let mut t = task("a", Priority::Low, false, 0);
        let first = Utc::now();
        t.set_completed(true, first);
        assert_eq!(t.completed_at, Some(first));

        t.set_completed(true, first + Duration::minutes(5));
        assert_eq!(t.completed_at, Some(first), "re-completion keeps timestamp");

        t.set_completed(false, first);
        assert!(!t.completed);
        assert!(t.completed_at.is_none());
    }

    #[test]
    fn update_only_touches_whitelisted_fields() {
        let mut t = task("original", Priority::Low, false, 10);
        let created = t.created_at;
        let now = Utc::now();
        t.apply_update(
            &UpdateTask {
                completed: Some(true),
                priority: Some(Priority::High),
                ..Default::default()
            },
            now,
        );
        assert_eq!(t.title, "original");
        assert_eq!(t.priority, Priority::High);
        assert!(t.completed);
        assert_eq!(t.completed_at, Some(now));
        assert_eq!(t.created_at, created);
        assert_eq!(t.updated_at, now);
    }

    #[test]
    fn explicit_null_detaches_project() {
        let body: UpdateTask = serde_json::from_str(r#"{"project_id": null}"#).unwrap();
        assert_eq!(body.project_id, Some(None));
        let body: UpdateTask = serde_json::from_str(r#"{"title": "x"}"#).unwrap();
        assert_eq!(body.project_id, None);
    }

    #[test]
    fn missing_title_fails_validation() {
        let body: CreateTask = serde_json::from_str(r#"{"priority": "high"}"#).unwrap();
        assert!(body.validate().is_err());
        let body: CreateTask = serde_json::from_str(r#"{"title": "   "}"#).unwrap();
        assert!(body.validate().is_err());
        let body: CreateTask = serde_json::from_str(r#"{"title": "ok"}"#).unwrap();
        assert!(body.validate().is_ok());
    }

    #[test]
    fn title_limit_counts_trimmed_characters() {
        let padded = CreateTask {
            title: format!("  {}  ", "t".repeat(199)),
            ..Default::default()
        };
        assert!(padded.validate().is_ok());
        let exact = CreateTask {
            title: "t".repeat(200),
            description: Some(format!(" {} ", "d".repeat(1000))),
            ..Default::default()
        };
        assert!(exact.validate().is_ok());
        let too_long = CreateTask {
            title: "t".repeat(201),
            ..Default::default()
        };
        assert!(too_long.validate().is_err());
    }

    #[test]
    fn domain_methods_normalize_tags() {
        let now = Utc::now();
        let mut t = Task::new(
            &CreateTask {
                title: "t".to_string(),
                tags: Some(vec!["a".to_string(), " a ".to_string(), String::new()]),
                ..Default::default()
            },
            now,
        );
        assert_eq!(t.tags, vec!["a"]);
        t.apply_update(
            &UpdateTask {
                tags: Some(vec![" x ".to_string(), "X".to_string(), "y".to_string()]),
                ..Default::default()
            },
            now,
        );
        assert_eq!(t.tags, vec!["x", "y"]);
    }

    #[test]
    fn blank_title_update_is_rejected() {
        let body = UpdateTask {
            title: Some(" ".to_string()),
            ..Default::default()
        };
        assert!(body.validate().is_err());
    }

    #[test]
    fn tags_accept_array_or_csv() {
        let body: CreateTask =
            serde_json::from_str(r#"{"title": "t", "tags": ["rust", " Rust ", "", "web"]}"#)
                .unwrap();
        assert_eq!(body.tags.unwrap(), vec!["rust", "web"]);
        let body: CreateTask =
            serde_json::from_str(r#"{"title": "t", "tags": "a, b,,a"}"#).unwrap();
        assert_eq!(body.tags.unwrap(), vec!["a", "b"]);
    }

    #[test]
    fn default_order_puts_open_urgent_recent_first() {
        let mut tasks = vec![
            task("done-high", Priority::High, true, 0),
            task("open-low", Priority::Low, false, 0),
            task("open-high-old", Priority::High, false, 30),
            task("open-high-new", Priority::High, false, 1),
            task("open-medium", Priority::Medium, false, 0),
        ];
        let sort = ListSort::default();
        tasks.sort_by(|a, b| compare_tasks(a, b, &sort));
        let titles: Vec<_> = tasks.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(
            titles,
            vec!["open-high-new", "open-high-old", "open-medium", "open-low", "done-high"]
        );
    }

    #[test]
    fn title_sort_ascending() {
        let mut tasks = vec![
            task("banana", Priority::Low, false, 0),
            task("Apple", Priority::Low, false, 0),
        ];
        let sort = ListSort {
            sort: Some(SortField::Title),
            order: crate::models::query::SortOrder::Asc,
        };
        tasks.sort_by(|a, b| compare_tasks(a, b, &sort));
        assert_eq!(tasks[0].title, "Apple");
    }

    #[test]
    fn filters_match_tags_and_search() {
        let mut t = task("Deploy API", Priority::High, false, 0);
        t.tags = vec!["Backend".to_string()];
        t.description = "ship the Rust service".to_string();

        let by_tag = TaskFilters {
            tags: Some("frontend, backend".to_string()),
            ..Default::default()
        };
        assert!(by_tag.matches(&t));

        let by_search = TaskFilters {
            search: Some("RUST".to_string()),
            ..Default::default()
        };
        assert!(by_search.matches(&t));

        let miss = TaskFilters {
            completed: Some(true),
            ..Default::default()
        };
        assert!(!miss.matches(&t));
    }
}
