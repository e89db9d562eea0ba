//! Platform implementations.
//!
//! Each installed platform is driven through a [`PlatformApi`] object that a
//! [`PlatformApiFactory`] creates (on add), recreates (on update) or loads
//! (for an already installed platform).

mod cache;
mod script;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use cordova_config::{ConfigParser, Variables};

pub use cache::PlatformApiCache;
pub use script::{ScriptPlatformApi, ScriptPlatformFactory};

use crate::error::Result;
use crate::events::Events;
use crate::project::Project;

/// Where a platform keeps the files the orchestrator syncs into it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformLocations {
    /// Destination of the project's web assets
    pub www: PathBuf,
    /// Destination of the project's `config.xml`
    pub config_xml: PathBuf,
    /// Platform-provided web assets layered under `www`
    pub platform_www: PathBuf,
}

impl PlatformLocations {
    /// Layout used when the platform does not say otherwise
    pub fn standard(platform_dir: &Path) -> Self {
        Self {
            www: platform_dir.join("www"),
            config_xml: platform_dir.join("config.xml"),
            platform_www: platform_dir.join("platform_www"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformInfo {
    pub name: String,
    pub root: PathBuf,
    pub locations: PlatformLocations,
}

/// A plugin as handed to a platform for installation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginInstall {
    pub id: String,
    pub dir: PathBuf,
    pub variables: Variables,
}

/// Arguments for creating or updating a platform
#[derive(Debug, Clone, Copy)]
pub struct PlatformRequest<'a> {
    pub name: &'a str,
    /// Fetched platform package
    pub template_dir: &'a Path,
    pub platform_dir: &'a Path,
    pub project: &'a Project,
    pub config: &'a ConfigParser,
}

/// Operations a platform implementation performs on its own directory
#[async_trait]
pub trait PlatformApi: Send + Sync {
    fn info(&self) -> &PlatformInfo;

    /// Turn the synced web assets and configuration into a buildable project
    async fn prepare(&self, project: &Project, events: &Events) -> Result<()>;

    async fn add_plugin(&self, plugin: &PluginInstall, events: &Events) -> Result<()>;

    async fn remove_plugin(&self, id: &str, events: &Events) -> Result<()>;
}

/// Produces [`PlatformApi`] objects
#[async_trait]
pub trait PlatformApiFactory: Send + Sync {
    /// Create a new platform directory from a fetched template
    async fn create_platform(
        &self,
        request: PlatformRequest<'_>,
        events: &Events,
    ) -> Result<Arc<dyn PlatformApi>>;

    /// Update an existing platform directory from a fetched template
    async fn update_platform(
        &self,
        request: PlatformRequest<'_>,
        events: &Events,
    ) -> Result<Arc<dyn PlatformApi>>;

    /// Load the API of an installed platform
    fn load(&self, name: &str, platform_dir: &Path) -> Result<Arc<dyn PlatformApi>>;
}
