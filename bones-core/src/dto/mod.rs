//! Data Transfer Objects
//!
//! Request bodies accepted by the Bones server and sent by the client.

pub mod project;
pub mod project_type;
