//! Request extractors shared by the API handlers.

pub mod extract;
