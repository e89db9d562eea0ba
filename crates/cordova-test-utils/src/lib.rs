//! Shared test utilities for the cordova workspace.
//!
//! Dev-dependency only. Provides [`TestProject`], a temporary project
//! directory with helpers for writing the manifest, the package descriptor
//! and arbitrary files, and for pinning modification times.

pub mod project;

pub use project::{TestProject, seconds_ago};
