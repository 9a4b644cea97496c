//! Server-rendered HTML pages.
//!
//! Every page shares [`layout`]; user-provided text goes through [`escape`].

use crate::models::project::{Project, ProjectStatus};
use crate::models::stats::{DashboardStats, ProjectTaskCount};
use crate::models::task::Task;

const NAV: &[(&str, &str)] = &[
    ("/", "Home"),
    ("/tasks", "Tasks"),
    ("/projects", "Projects"),
    ("/categories", "Categories"),
    ("/dashboard", "Dashboard"),
    ("/about", "About"),
    ("/contact", "Contact"),
];

/// Escape text for HTML element and attribute content.
pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn layout(title: &str, description: &str, body: &str) -> String {
    let nav: String = NAV
        .iter()
        .map(|(href, label)| format!(r#"<a href="{href}">{label}</a>"#))
        .collect::<Vec<_>>()
        .join(" ");
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title} | Taskboard</title>
</head>
<body>
<nav>{nav}</nav>
<main>
<h1>{title}</h1>
<p class="description">{description}</p>
{body}
</main>
<footer>Taskboard v{version}</footer>
</body>
</html>"#,
        title = escape(title),
        description = escape(description),
        version = env!("CARGO_PKG_VERSION"),
    )
}

fn task_rows(tasks: &[Task]) -> String {
    if tasks.is_empty() {
        return "<p>No tasks yet.</p>".to_string();
    }
    let mut out = String::from(
        "<table class=\"tasks\"><tr><th>Title</th><th>Priority</th><th>Status</th><th>Tags</th></tr>",
    );
    for task in tasks {
        out.push_str(&format!(
            r#"<tr class="{class}"><td>{title}</td><td>{priority}</td><td>{status}</td><td>{tags}</td></tr>"#,
            class = if task.completed { "done" } else { "open" },
            title = escape(&task.title),
            priority = task.priority,
            status = if task.completed { "Completed" } else { "Pending" },
            tags = escape(&task.tags.join(", ")),
        ));
    }
    out.push_str("</table>");
    out
}

pub fn index(server_time: &str) -> String {
    let body = format!(
        r#"<p>Keep track of tasks, group them into projects and follow progress on the dashboard.</p>
<p>Server time: {}</p>
<p>The JSON API lives under <a href="/api/status">/api</a>.</p>"#,
        escape(server_time)
    );
    layout("Taskboard", "Welcome to your task manager", &body)
}

pub fn about() -> String {
    let features = [
        "Tasks with priorities, tags and owners",
        "Projects that group related tasks",
        "Statistics and a dashboard summary",
        "REST API with a uniform JSON envelope",
        "PostgreSQL storage with an in-memory fallback",
    ];
    let items: String = features
        .iter()
        .map(|f| format!("<li>{}</li>", escape(f)))
        .collect();
    layout(
        "About",
        "What this application does",
        &format!("<ul class=\"features\">{items}</ul>"),
    )
}

pub fn contact() -> String {
    layout(
        "Contact",
        "Get in touch",
        r#"<dl>
<dt>Email</dt><dd>support@taskboard.local</dd>
<dt>Issues</dt><dd>Report problems through the project issue tracker.</dd>
</dl>"#,
    )
}

pub fn tasks(tasks: &[Task]) -> String {
    let pending = tasks.iter().filter(|t| !t.completed).count();
    let body = format!(
        "<p>{total} tasks, {pending} pending.</p>\n{rows}",
        total = tasks.len(),
        rows = task_rows(tasks),
    );
    layout("Tasks", "Manage your tasks", &body)
}

/// Kanban-style board: one column per project status.
pub fn projects(projects: &[Project]) -> String {
    let columns = [
        (ProjectStatus::Pending, "Pending"),
        (ProjectStatus::Active, "Active"),
        (ProjectStatus::Paused, "Paused"),
        (ProjectStatus::Completed, "Completed"),
    ];
    let mut body = String::from("<div class=\"board\">");
    for (status, label) in columns {
        body.push_str(&format!("<section class=\"column\"><h2>{label}</h2><ul>"));
        for project in projects.iter().filter(|p| p.status == status) {
            body.push_str(&format!(
                "<li><strong>{}</strong> <span class=\"priority\">{}</span></li>",
                escape(&project.name),
                project.priority,
            ));
        }
        body.push_str("</ul></section>");
    }
    body.push_str("</div>");
    layout("Projects", "Projects organised by status", &body)
}

/// Projects with their pending task counts.
pub fn categories(counts: &[ProjectTaskCount]) -> String {
    let body = if counts.is_empty() {
        "<p>No pending tasks.</p>".to_string()
    } else {
        let items: String = counts
            .iter()
            .map(|c| format!("<li>{}: {}</li>", escape(&c.project_name), c.count))
            .collect();
        format!("<ul class=\"categories\">{items}</ul>")
    };
    layout("Categories", "Pending tasks grouped by project", &body)
}

pub fn dashboard(stats: &DashboardStats) -> String {
    let t = &stats.tasks;
    let p = &stats.projects;
    let mut body = format!(
        r#"<section class="task-stats">
<h2>Tasks</h2>
<p>Total: {total} | Completed: {completed} | Pending: {pending} | Progress: {pct}%</p>
<p>Pending by priority: high {high}, medium {medium}, low {low}</p>
</section>
<section class="project-stats">
<h2>Projects</h2>
<p>Total: {p_total} | Active: {p_active} | Paused: {p_paused} | Completed: {p_completed} | Progress: {p_pct}%</p>
</section>
<section class="recent"><h2>Recently updated</h2>{recent}</section>"#,
        total = t.total,
        completed = t.completed,
        pending = t.pending,
        pct = t.completion_percentage,
        high = t.by_priority.high,
        medium = t.by_priority.medium,
        low = t.by_priority.low,
        p_total = p.total,
        p_active = p.active,
        p_paused = p.paused,
        p_completed = p.completed,
        p_pct = p.completion_percentage,
        recent = task_rows(&t.recent),
    );
    body.push_str("<section class=\"by-project\"><h2>Pending by project</h2><ul>");
    for group in &stats.tasks_by_project {
        body.push_str(&format!(
            "<li>{}: {}</li>",
            escape(&group.project_name),
            group.count
        ));
    }
    body.push_str("</ul></section>");
    layout("Dashboard", "Overview of your progress", &body)
}

pub fn not_found(path: &str) -> String {
    layout(
        "Page not found",
        "The page you requested does not exist",
        &format!(
            "<p>No page at <code>{}</code>. <a href=\"/\">Back home</a></p>",
            escape(path)
        ),
    )
}

pub fn error(message: &str) -> String {
    layout(
        "Something went wrong",
        "The page could not be rendered",
        &format!("<p class=\"error\">{}</p>", escape(message)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::stats::{ProjectStats, ProjectTally, TaskStats, TaskTally};
    use crate::models::task::CreateTask;
    use chrono::Utc;

    #[test]
    fn escapes_markup() {
        assert_eq!(
            escape(r#"<b>"Tom" & 'Jerry'</b>"#),
            "&lt;b&gt;&quot;Tom&quot; &amp; &#39;Jerry&#39;&lt;/b&gt;"
        );
    }

    #[test]
    fn task_titles_are_escaped() {
        let task = Task::new(
            &CreateTask {
                title: "<script>alert(1)</script>".to_string(),
                ..Default::default()
            },
            Utc::now(),
        );
        let html = tasks(&[task]);
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains("1 tasks, 1 pending"));
    }

    #[test]
    fn empty_dashboard_renders_zeroes() {
        let stats = DashboardStats {
            tasks: TaskStats::from_tally(TaskTally::default(), Vec::new()),
            projects: ProjectStats::from_tally(ProjectTally::default(), Vec::new()),
            tasks_by_project: Vec::new(),
        };
        let html = dashboard(&stats);
        assert!(html.contains("Total: 0 | Completed: 0 | Pending: 0 | Progress: 0%"));
        assert!(html.contains("<title>Dashboard | Taskboard</title>"));
    }

    #[test]
    fn board_and_dashboard_list_escaped_names() {
        let project = Project::new(
            &crate::models::project::CreateProject {
                name: "R&D".to_string(),
                status: Some(ProjectStatus::Paused),
                ..Default::default()
            },
            Utc::now(),
        );
        let board = projects(&[project]);
        assert!(board.contains("<h2>Paused</h2><ul><li><strong>R&amp;D</strong>"));

        let stats = DashboardStats {
            tasks: TaskStats::from_tally(TaskTally::default(), Vec::new()),
            projects: ProjectStats::from_tally(ProjectTally::default(), Vec::new()),
            tasks_by_project: vec![ProjectTaskCount {
                project_id: None,
                project_name: "No Project".to_string(),
                count: 2,
            }],
        };
        assert!(dashboard(&stats).contains("<li>No Project: 2</li>"));
    }

    #[test]
    fn not_found_echoes_escaped_path() {
        let html = not_found("/missing<x>");
        assert!(html.contains("/missing&lt;x&gt;"));
    }
}
