//! Command implementations for cordova-cli

pub mod platform;
pub mod plugin;
pub mod prepare;

use std::path::Path;
use std::sync::Arc;

use colored::Colorize;
use cordova_core::{Cordova, Events, NpmRegistry, Project};

use crate::error::Result;

pub use platform::{run_platform_add, run_platform_list, run_platform_remove, run_platform_update};
pub use plugin::{run_plugin_add, run_plugin_list, run_plugin_remove};
pub use prepare::run_prepare;

/// Open the project containing `path`, wired to npm
fn open(path: &Path) -> Result<Cordova> {
    let project = Project::find(path)?;
    tracing::debug!(root = %project.root().display(), "opened project");
    Ok(Cordova::builder(project)
        .registry(Arc::new(NpmRegistry::default()))
        .build())
}

/// Print the warnings an operation collected
fn print_warnings(events: &Events) {
    for warning in events.warnings() {
        eprintln!("{} {}", "warning:".yellow().bold(), warning);
    }
}
