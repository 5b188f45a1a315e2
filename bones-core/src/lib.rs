//! Bones Core
//!
//! Core types shared by the Bones provisioning services.
//!
//! This crate contains:
//! - Domain types: Projects, project types, skeleton manifests and their lifecycle
//! - DTOs: Request bodies exchanged between the server, client and CLI

pub mod domain;
pub mod dto;

/// Normalizes a display name into a slug: lowercase, spaces replaced with hyphens.
///
/// Used for project type keys and for the `APP_NAME` value seeded into every pipeline run.
pub fn slugify(name: &str) -> String {
    name.to_lowercase().replace(' ', "-")
}
