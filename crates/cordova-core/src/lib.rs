//! Platform and plugin lifecycle orchestration for Cordova projects
//!
//! A project declares its platforms and plugins twice: in `config.xml` and
//! in `package.json`. This crate keeps those declarations and the installed
//! state under `platforms/` and `plugins/` consistent.
//!
//! # Entry point
//!
//! [`Cordova`] bundles a [`Project`] with its collaborators: the hook
//! runner, the package fetcher, the platform API factory and the plugin
//! registry. Every operation is a method on it:
//!
//! - platforms: [`Cordova::platform_add`], [`Cordova::platform_remove`],
//!   [`Cordova::platform_update`], [`Cordova::platform_list`]
//! - plugins: [`Cordova::plugin_add`], [`Cordova::plugin_remove`],
//!   [`Cordova::plugin_list`]
//! - [`Cordova::prepare`], which restores missing platforms and plugins and
//!   then syncs `www/` and `config.xml` into each platform
//!
//! Targets in one call are processed one at a time, in order.
//!
//! # Example
//!
//! ```no_run
//! use cordova_core::{Cordova, PlatformOptions, Project};
//!
//! # async fn example() -> cordova_core::Result<()> {
//! let project = Project::find(std::path::Path::new("."))?;
//! let cordova = Cordova::builder(project).build();
//! let options = PlatformOptions {
//!     save: true,
//!     ..PlatformOptions::default()
//! };
//! cordova.platform_add(&["android@13".to_string()], &options).await?;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod cordova;
pub mod error;
pub mod events;
pub mod fetch;
pub mod handler;
pub mod hooks;
pub mod metadata;
pub mod platform;
pub mod plugin;
pub mod prepare;
pub mod project;
pub mod reconcile;
pub mod registry;
pub mod restore;
pub mod settings;
pub mod state;

pub use api::{
    PlatformApi, PlatformApiCache, PlatformApiFactory, PlatformInfo, PlatformLocations,
    PlatformRequest, PluginInstall, ScriptPlatformApi, ScriptPlatformFactory,
};
pub use cordova::{Cordova, CordovaBuilder};
pub use error::{Error, Result};
pub use events::Events;
pub use fetch::{FetchOptions, Fetcher, NpmFetcher};
pub use handler::{DefaultHandler, LayeredHandler, PlatformHandler, handler_for};
pub use hooks::{HookEvent, HookPayload, HookRunner, ScriptHookRunner};
pub use metadata::{FetchJson, FetchRecord, PlatformsJson, PluginSource};
pub use platform::{
    AvailablePlatform, InstalledPlatform, PlatformListing, PlatformOptions, package_key,
};
pub use plugin::{InstalledPlugin, PluginGraph, PluginOptions};
pub use prepare::PrepareOptions;
pub use project::Project;
pub use reconcile::{ReconcileReport, reconcile_platforms, reconcile_plugins};
pub use registry::{NoRegistry, NpmRegistry, PluginRegistry};
pub use restore::{RestoreReport, restore_target};
pub use settings::ProjectSettings;
pub use state::{TargetProgress, TargetState};
