//! Domain models and DTOs for tasks, projects and statistics.

pub mod priority;
pub mod project;
pub mod query;
pub mod stats;
pub mod task;
