//! Business logic services.

pub mod dashboard;
pub mod project;
pub mod task;
