//! Seed script for development: populates the database with sample projects and tasks.
//!
//! Usage: `cargo run --bin seed`
//!
//! Uses `DATABASE_URL` when set (reads .env). Without it the sample data is
//! loaded into a throwaway in-memory store and only the statistics are printed.

use anyhow::Context;
use taskboard::config::AppConfig;
use taskboard::db::{self, Repositories};
use taskboard::models::priority::Priority;
use taskboard::models::project::{CreateProject, ProjectStatus};
use taskboard::models::query::ListSort;
use taskboard::models::task::{CreateTask, TaskFilters};
use taskboard::services::{dashboard, project, task};
use uuid::Uuid;

struct SampleTask {
    title: &'static str,
    description: &'static str,
    priority: Priority,
    tags: &'static [&'static str],
    project: Option<usize>,
    done: bool,
}

const PROJECTS: &[(&str, &str, ProjectStatus, Priority)] = &[
    ("Backend", "API and storage work", ProjectStatus::Active, Priority::High),
    ("Documentation", "Guides and references", ProjectStatus::Active, Priority::Medium),
    ("Personal", "Things outside work", ProjectStatus::Paused, Priority::Low),
];

const TASKS: &[SampleTask] = &[
    SampleTask {
        title: "Configure PostgreSQL",
        description: "Provision the database and run migrations",
        priority: Priority::High,
        tags: &["database", "setup"],
        project: Some(0),
        done: true,
    },
    SampleTask {
        title: "Add request tracing",
        description: "Structured logs for every request",
        priority: Priority::High,
        tags: &["observability"],
        project: Some(0),
        done: false,
    },
    SampleTask {
        title: "Write unit tests",
        description: "Cover services and statistics",
        priority: Priority::Medium,
        tags: &["tests", "quality"],
        project: Some(0),
        done: false,
    },
    SampleTask {
        title: "Document the API",
        description: "Endpoint reference with examples",
        priority: Priority::Medium,
        tags: &["docs", "api"],
        project: Some(1),
        done: false,
    },
    SampleTask {
        title: "Add response caching",
        description: "Cache dashboard statistics",
        priority: Priority::Low,
        tags: &["performance"],
        project: Some(0),
        done: false,
    },
    SampleTask {
        title: "Set up CI",
        description: "Build and test on every push",
        priority: Priority::Medium,
        tags: &["ci", "deploy"],
        project: None,
        done: true,
    },
    SampleTask {
        title: "Morning run",
        description: "",
        priority: Priority::Low,
        tags: &["health"],
        project: Some(2),
        done: false,
    },
    SampleTask {
        title: "Client meeting",
        description: "Present the new dashboard",
        priority: Priority::High,
        tags: &["meeting", "client"],
        project: None,
        done: false,
    },
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env();

    println!("=== Taskboard Seed Script ===");

    let repos = match &config.database.url {
        Some(url) => {
            let pool = db::connect(url, &config.database)
                .await
                .context("Failed to connect to DATABASE_URL")?;
            println!("[info] Using PostgreSQL");
            Repositories::postgres(pool)
        }
        None => {
            println!("[info] DATABASE_URL not set, seeding a temporary in-memory store");
            Repositories::in_memory()
        }
    };

    let existing = task::list(&repos, &TaskFilters::default(), &ListSort::default()).await?;
    if !existing.is_empty() {
        println!("[skip] {} tasks already present", existing.len());
    } else {
        seed(&repos).await?;
    }

    let summary = dashboard::get_summary(&repos).await?;
    let stats = &summary.tasks;
    println!("\n=== Task statistics ===");
    println!("Total:     {}", stats.total);
    println!("Completed: {}", stats.completed);
    println!("Pending:   {}", stats.pending);
    println!("Progress:  {}%", stats.completion_percentage);
    println!(
        "Pending by priority: high {}, medium {}, low {}",
        stats.by_priority.high, stats.by_priority.medium, stats.by_priority.low
    );
    for group in &summary.tasks_by_project {
        println!("  {}: {}", group.project_name, group.count);
    }

    Ok(())
}

async fn seed(repos: &Repositories) -> anyhow::Result<()> {
    let mut project_ids: Vec<Uuid> = Vec::with_capacity(PROJECTS.len());
    for (name, description, status, priority) in PROJECTS {
        let created = project::create(
            repos,
            &CreateProject {
                name: name.to_string(),
                description: Some(description.to_string()),
                status: Some(*status),
                priority: Some(*priority),
            },
        )
        .await?;
        println!("[done] Project: {}", created.name);
        project_ids.push(created.id);
    }

    for sample in TASKS {
        let created = task::create(
            repos,
            &CreateTask {
                title: sample.title.to_string(),
                description: Some(sample.description.to_string()),
                priority: Some(sample.priority),
                tags: Some(sample.tags.iter().map(|t| t.to_string()).collect()),
                owner: Some("demo".to_string()),
                project_id: sample.project.map(|i| project_ids[i]),
            },
        )
        .await?;
        if sample.done {
            task::complete(repos, created.id).await?;
        }
        println!("[done] Task: {}", created.title);
    }

    Ok(())
}
