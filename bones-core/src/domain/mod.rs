//! Core domain types
//!
//! These types represent the entities owned by the project registry and the
//! manifest shape read by the pipeline. They are shared between the server
//! (persistence and API), the pipeline (execution) and the client.

pub mod manifest;
pub mod project;
pub mod project_type;
