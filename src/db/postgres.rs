//! PostgreSQL-backed store. Aggregations run in SQL.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::{ProjectRepository, TaskRepository};
use crate::errors::AppError;
use crate::models::project::{Project, ProjectFilters};
use crate::models::query::{ListSort, SortField, SortOrder};
use crate::models::stats::{
    PriorityBuckets, ProjectTally, ProjectTaskCount, TaskTally, NO_PROJECT_LABEL,
};
use crate::models::task::{Task, TaskFilters};

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Map a foreign-key violation on `project_id` to a validation error.
fn map_write_error(e: sqlx::Error) -> AppError {
    match e {
        sqlx::Error::Database(ref db_err) if db_err.is_foreign_key_violation() => {
            AppError::Validation("Project not found".to_string())
        }
        _ => AppError::Database(e),
    }
}

fn direction(sort: &ListSort) -> &'static str {
    match sort.order {
        SortOrder::Asc => "ASC",
        SortOrder::Desc => "DESC",
    }
}

/// `priority_level` is declared high, medium, low, so ascending enum order is most urgent first.
/// Text sorts use the "C" collation so ties and case match the in-memory store's byte order.
fn task_order_clause(sort: &ListSort) -> String {
    match sort.sort {
        None => "ORDER BY completed ASC, priority ASC, created_at DESC, id ASC".to_string(),
        Some(SortField::Priority) => {
            // descending priority means high first, which is ascending enum order
            let dir = match sort.order {
                SortOrder::Asc => "DESC",
                SortOrder::Desc => "ASC",
            };
            format!("ORDER BY priority {dir}, created_at DESC, id ASC")
        }
        Some(SortField::Title) => format!(
            "ORDER BY lower(title) COLLATE \"C\" {dir}, created_at {dir}, id ASC",
            dir = direction(sort)
        ),
        Some(SortField::CreatedAt) => format!("ORDER BY created_at {}, id ASC", direction(sort)),
    }
}

fn project_order_clause(sort: &ListSort) -> String {
    match sort.sort {
        None => "ORDER BY created_at DESC, id ASC".to_string(),
        Some(SortField::Priority) => {
            let dir = match sort.order {
                SortOrder::Asc => "DESC",
                SortOrder::Desc => "ASC",
            };
            format!("ORDER BY priority {dir}, created_at DESC, id ASC")
        }
        Some(SortField::Title) => format!(
            "ORDER BY lower(name) COLLATE \"C\" {}, id ASC",
            direction(sort)
        ),
        Some(SortField::CreatedAt) => format!("ORDER BY created_at {}, id ASC", direction(sort)),
    }
}

/// Escape LIKE metacharacters and wrap in `%` for substring search.
fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

fn where_clause(conditions: &[String]) -> String {
    if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    }
}

/// Intermediate row for task conditional aggregation.
#[derive(Debug, sqlx::FromRow)]
struct TaskTallyRow {
    total: i64,
    completed: i64,
    pending_high: i64,
    pending_medium: i64,
    pending_low: i64,
}

/// Intermediate row for project conditional aggregation.
#[derive(Debug, sqlx::FromRow)]
struct ProjectTallyRow {
    total: i64,
    completed: i64,
    active: i64,
    paused: i64,
    pending_high: i64,
    pending_medium: i64,
    pending_low: i64,
}

#[async_trait]
impl TaskRepository for PgStore {
    async fn list(&self, filters: &TaskFilters, sort: &ListSort) -> Result<Vec<Task>, AppError> {
        let mut conditions: Vec<String> = Vec::new();
        let mut param_index = 0u32;

        // Build dynamic WHERE clauses
        if filters.completed.is_some() {
            param_index += 1;
            conditions.push(format!("completed = ${param_index}"));
        }
        if filters.priority.is_some() {
            param_index += 1;
            conditions.push(format!("priority = ${param_index}"));
        }
        if filters.project_id.is_some() {
            param_index += 1;
            conditions.push(format!("project_id = ${param_index}"));
        }
        if filters.owner.is_some() {
            param_index += 1;
            conditions.push(format!("owner = ${param_index}"));
        }
        let search = filters.search_term().map(like_pattern);
        if search.is_some() {
            param_index += 1;
            conditions.push(format!(
                "(title ILIKE ${param_index} OR description ILIKE ${param_index})"
            ));
        }
        let tags = filters.tag_list();
        if !tags.is_empty() {
            param_index += 1;
            conditions.push(format!(
                "EXISTS (SELECT 1 FROM unnest(tags) AS tag WHERE lower(tag) = ANY(${param_index}))"
            ));
        }
        if filters.created_from.is_some() {
            param_index += 1;
            conditions.push(format!("created_at >= ${param_index}"));
        }
        if filters.created_to.is_some() {
            param_index += 1;
            conditions.push(format!("created_at <= ${param_index}"));
        }

        let sql = format!(
            "SELECT * FROM tasks {} {}",
            where_clause(&conditions),
            task_order_clause(sort)
        );

        // Bind parameters in the same order the clauses were pushed
        let mut query = sqlx::query_as::<_, Task>(&sql);
        if let Some(completed) = filters.completed {
            query = query.bind(completed);
        }
        if let Some(priority) = filters.priority {
            query = query.bind(priority);
        }
        if let Some(project_id) = filters.project_id {
            query = query.bind(project_id);
        }
        if let Some(ref owner) = filters.owner {
            query = query.bind(owner);
        }
        if let Some(ref pattern) = search {
            query = query.bind(pattern);
        }
        if !tags.is_empty() {
            query = query.bind(&tags);
        }
        if let Some(from) = filters.created_from {
            query = query.bind(from);
        }
        if let Some(to) = filters.created_to {
            query = query.bind(to);
        }

        Ok(query.fetch_all(&self.pool).await?)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Task>, AppError> {
        let task = sqlx::query_as::<_, Task>("SELECT * FROM tasks WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(task)
    }

    async fn insert(&self, task: &Task) -> Result<Task, AppError> {
        sqlx::query_as::<_, Task>(
            r#"
            INSERT INTO tasks (id, title, description, priority, completed, completed_at,
                tags, owner, project_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *
            "#,
        )
        .bind(task.id)
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.priority)
        .bind(task.completed)
        .bind(task.completed_at)
        .bind(&task.tags)
        .bind(&task.owner)
        .bind(task.project_id)
        .bind(task.created_at)
        .bind(task.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(map_write_error)
    }

    async fn update(&self, task: &Task) -> Result<Option<Task>, AppError> {
        sqlx::query_as::<_, Task>(
            r#"
            UPDATE tasks
            SET title = $2, description = $3, priority = $4, completed = $5,
                completed_at = $6, tags = $7, project_id = $8, updated_at = $9
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(task.id)
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.priority)
        .bind(task.completed)
        .bind(task.completed_at)
        .bind(&task.tags)
        .bind(task.project_id)
        .bind(task.updated_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_write_error)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn tally(&self, owner: Option<&str>) -> Result<TaskTally, AppError> {
        let row = sqlx::query_as::<_, TaskTallyRow>(
            r#"
            SELECT
                COUNT(*) AS total,
                COALESCE(SUM(CASE WHEN completed THEN 1 ELSE 0 END), 0) AS completed,
                COALESCE(SUM(CASE WHEN NOT completed AND priority = 'high'   THEN 1 ELSE 0 END), 0) AS pending_high,
                COALESCE(SUM(CASE WHEN NOT completed AND priority = 'medium' THEN 1 ELSE 0 END), 0) AS pending_medium,
                COALESCE(SUM(CASE WHEN NOT completed AND priority = 'low'    THEN 1 ELSE 0 END), 0) AS pending_low
            FROM tasks
            WHERE ($1::text IS NULL OR owner = $1)
            "#,
        )
        .bind(owner)
        .fetch_one(&self.pool)
        .await?;

        Ok(TaskTally {
            total: row.total,
            completed: row.completed,
            pending_by_priority: PriorityBuckets {
                high: row.pending_high,
                medium: row.pending_medium,
                low: row.pending_low,
            },
        })
    }

    async fn recently_updated(
        &self,
        owner: Option<&str>,
        limit: usize,
    ) -> Result<Vec<Task>, AppError> {
        let rows = sqlx::query_as::<_, Task>(
            r#"
            SELECT * FROM tasks
            WHERE ($1::text IS NULL OR owner = $1)
            ORDER BY updated_at DESC, id ASC
            LIMIT $2
            "#,
        )
        .bind(owner)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn pending_by_project(&self) -> Result<Vec<ProjectTaskCount>, AppError> {
        let rows = sqlx::query_as::<_, ProjectTaskCount>(
            r#"
            SELECT p.id AS project_id, COALESCE(p.name, $1) AS project_name, COUNT(*) AS count
            FROM tasks t
            LEFT JOIN projects p ON p.id = t.project_id
            WHERE NOT t.completed
            GROUP BY p.id, p.name
            ORDER BY COUNT(*) DESC, COALESCE(p.name, $1) COLLATE "C" ASC, p.id ASC NULLS FIRST
            "#,
        )
        .bind(NO_PROJECT_LABEL)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}

#[async_trait]
impl ProjectRepository for PgStore {
    async fn list(
        &self,
        filters: &ProjectFilters,
        sort: &ListSort,
    ) -> Result<Vec<Project>, AppError> {
        let mut conditions: Vec<String> = Vec::new();
        let mut param_index = 0u32;

        if filters.status.is_some() {
            param_index += 1;
            conditions.push(format!("status = ${param_index}"));
        }
        if filters.priority.is_some() {
            param_index += 1;
            conditions.push(format!("priority = ${param_index}"));
        }
        let search = filters.search_term().map(like_pattern);
        if search.is_some() {
            param_index += 1;
            conditions.push(format!(
                "(name ILIKE ${param_index} OR description ILIKE ${param_index})"
            ));
        }
        if filters.created_from.is_some() {
            param_index += 1;
            conditions.push(format!("created_at >= ${param_index}"));
        }
        if filters.created_to.is_some() {
            param_index += 1;
            conditions.push(format!("created_at <= ${param_index}"));
        }

        let sql = format!(
            "SELECT * FROM projects {} {}",
            where_clause(&conditions),
            project_order_clause(sort)
        );

        let mut query = sqlx::query_as::<_, Project>(&sql);
        if let Some(status) = filters.status {
            query = query.bind(status);
        }
        if let Some(priority) = filters.priority {
            query = query.bind(priority);
        }
        if let Some(ref pattern) = search {
            query = query.bind(pattern);
        }
        if let Some(from) = filters.created_from {
            query = query.bind(from);
        }
        if let Some(to) = filters.created_to {
            query = query.bind(to);
        }

        Ok(query.fetch_all(&self.pool).await?)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Project>, AppError> {
        let project = sqlx::query_as::<_, Project>("SELECT * FROM projects WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(project)
    }

    async fn insert(&self, project: &Project) -> Result<Project, AppError> {
        let project = sqlx::query_as::<_, Project>(
            r#"
            INSERT INTO projects (id, name, description, status, priority, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(project.id)
        .bind(&project.name)
        .bind(&project.description)
        .bind(project.status)
        .bind(project.priority)
        .bind(project.created_at)
        .bind(project.updated_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(project)
    }

    async fn update(&self, project: &Project) -> Result<Option<Project>, AppError> {
        let project = sqlx::query_as::<_, Project>(
            r#"
            UPDATE projects
            SET name = $2, description = $3, status = $4, priority = $5, updated_at = $6
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(project.id)
        .bind(&project.name)
        .bind(&project.description)
        .bind(project.status)
        .bind(project.priority)
        .bind(project.updated_at)
        .fetch_optional(&self.pool)
        .await?;
        Ok(project)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        // tasks.project_id is ON DELETE SET NULL
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn tally(&self) -> Result<ProjectTally, AppError> {
        let row = sqlx::query_as::<_, ProjectTallyRow>(
            r#"
            SELECT
                COUNT(*) AS total,
                COALESCE(SUM(CASE WHEN status = 'completed' THEN 1 ELSE 0 END), 0) AS completed,
                COALESCE(SUM(CASE WHEN status = 'active'    THEN 1 ELSE 0 END), 0) AS active,
                COALESCE(SUM(CASE WHEN status = 'paused'    THEN 1 ELSE 0 END), 0) AS paused,
                COALESCE(SUM(CASE WHEN status <> 'completed' AND priority = 'high'   THEN 1 ELSE 0 END), 0) AS pending_high,
                COALESCE(SUM(CASE WHEN status <> 'completed' AND priority = 'medium' THEN 1 ELSE 0 END), 0) AS pending_medium,
                COALESCE(SUM(CASE WHEN status <> 'completed' AND priority = 'low'    THEN 1 ELSE 0 END), 0) AS pending_low
            FROM projects
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(ProjectTally {
            total: row.total,
            completed: row.completed,
            active: row.active,
            paused: row.paused,
            pending_by_priority: PriorityBuckets {
                high: row.pending_high,
                medium: row.pending_medium,
                low: row.pending_low,
            },
        })
    }

    async fn recently_updated(&self, limit: usize) -> Result<Vec<Project>, AppError> {
        let rows = sqlx::query_as::<_, Project>(
            "SELECT * FROM projects ORDER BY updated_at DESC, id ASC LIMIT $1",
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_task_order_is_open_urgent_newest() {
        assert_eq!(
            task_order_clause(&ListSort::default()),
            "ORDER BY completed ASC, priority ASC, created_at DESC, id ASC"
        );
    }

    #[test]
    fn priority_desc_means_high_first() {
        let sort = ListSort {
            sort: Some(SortField::Priority),
            order: SortOrder::Desc,
        };
        assert!(task_order_clause(&sort).starts_with("ORDER BY priority ASC"));
        assert!(project_order_clause(&sort).starts_with("ORDER BY priority ASC"));
    }

    #[test]
    fn every_order_ends_with_id_tiebreak() {
        let fields = [
            None,
            Some(SortField::CreatedAt),
            Some(SortField::Title),
            Some(SortField::Priority),
        ];
        for field in fields {
            let sort = ListSort {
                sort: field,
                order: SortOrder::Asc,
            };
            assert!(task_order_clause(&sort).ends_with(", id ASC"));
            assert!(project_order_clause(&sort).ends_with(", id ASC"));
        }
        let title = ListSort {
            sort: Some(SortField::Title),
            order: SortOrder::Asc,
        };
        assert!(project_order_clause(&title).contains("COLLATE \"C\""));
    }

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
    }

    #[test]
    fn where_clause_joins_conditions() {
        assert_eq!(where_clause(&[]), "");
        assert_eq!(
            where_clause(&["a = $1".to_string(), "b = $2".to_string()]),
            "WHERE a = $1 AND b = $2"
        );
    }
}
