//! The orchestrator context shared by every operation.

use std::sync::{Arc, OnceLock};

use cordova_config::{ConfigParser, PackageDescriptor};
use cordova_spec::{InstalledVersions, PinnedVersions};

use crate::api::{PlatformApi, PlatformApiCache, PlatformApiFactory, ScriptPlatformFactory};
use crate::error::Result;
use crate::events::Events;
use crate::fetch::{Fetcher, NpmFetcher};
use crate::hooks::{HookRunner, ScriptHookRunner};
use crate::metadata::{FetchJson, PlatformsJson};
use crate::project::Project;
use crate::registry::{NoRegistry, PluginRegistry};
use crate::settings::ProjectSettings;

/// A project plus the collaborators that act on it.
///
/// Platform operations live in [`crate::platform`], plugin operations in
/// [`crate::plugin`], and [`Cordova::prepare`] in [`crate::prepare`].
pub struct Cordova {
    pub(crate) project: Project,
    pub(crate) hooks: Arc<dyn HookRunner>,
    pub(crate) fetcher: Arc<dyn Fetcher>,
    pub(crate) platforms: Arc<dyn PlatformApiFactory>,
    pub(crate) registry: Arc<dyn PluginRegistry>,
    pub(crate) pinned: PinnedVersions,
    pub(crate) host_os: String,
    pub(crate) tool_version: Option<String>,
    pub(crate) events: Events,
    api_cache: PlatformApiCache,
    settings: OnceLock<ProjectSettings>,
}

impl Cordova {
    pub fn builder(project: Project) -> CordovaBuilder {
        CordovaBuilder::new(project)
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    pub fn events(&self) -> &Events {
        &self.events
    }

    /// `.cordova/config.json`, read once. An unreadable file is reported and
    /// treated as defaults.
    pub fn settings(&self) -> &ProjectSettings {
        self.settings.get_or_init(|| {
            ProjectSettings::load(&self.project.settings_path()).unwrap_or_else(|e| {
                self.events
                    .warn(format!("Ignoring unreadable project settings: {e}"));
                ProjectSettings::default()
            })
        })
    }

    /// Whether to write changes back to `config.xml` and `package.json`
    pub(crate) fn should_save(&self, save: bool) -> bool {
        save || self.settings().autosave
    }

    pub(crate) fn api_cache(&self) -> &PlatformApiCache {
        &self.api_cache
    }

    /// API of an installed platform, loaded on first use
    pub fn platform_api(&self, name: &str) -> Result<Arc<dyn PlatformApi>> {
        let dir = self.project.platform_dir(name);
        self.api_cache
            .get_or_try_insert(&dir, || self.platforms.load(name, &dir))
    }

    pub(crate) fn load_documents(&self) -> Result<(ConfigParser, Option<PackageDescriptor>)> {
        Ok((self.project.load_config()?, self.project.load_package()?))
    }

    /// Versions installed in the project, for plugin negotiation
    pub(crate) fn installed_versions(&self) -> Result<InstalledVersions> {
        let mut installed = InstalledVersions::new();
        if let Some(version) = &self.tool_version {
            installed.insert("cordova", version);
        }
        for (name, version) in PlatformsJson::load(&self.project)?.iter() {
            installed.insert(&format!("cordova-{name}"), version);
        }
        for (id, _) in FetchJson::load(&self.project)?.iter() {
            if let Ok(plugin) = cordova_config::PluginXml::load(&self.project.plugin_dir(id))
                && let Some(version) = plugin.version
            {
                installed.insert(id, &version);
            }
        }
        Ok(installed)
    }
}

impl std::fmt::Debug for Cordova {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cordova")
            .field("project", &self.project)
            .field("host_os", &self.host_os)
            .finish_non_exhaustive()
    }
}

/// Builds a [`Cordova`], defaulting every collaborator to the real one
pub struct CordovaBuilder {
    project: Project,
    hooks: Option<Arc<dyn HookRunner>>,
    fetcher: Option<Arc<dyn Fetcher>>,
    platforms: Option<Arc<dyn PlatformApiFactory>>,
    registry: Option<Arc<dyn PluginRegistry>>,
    pinned: PinnedVersions,
    host_os: String,
    tool_version: Option<String>,
}

impl CordovaBuilder {
    pub fn new(project: Project) -> Self {
        Self {
            project,
            hooks: None,
            fetcher: None,
            platforms: None,
            registry: None,
            pinned: PinnedVersions::default(),
            host_os: std::env::consts::OS.to_string(),
            tool_version: None,
        }
    }

    pub fn hooks(mut self, hooks: Arc<dyn HookRunner>) -> Self {
        self.hooks = Some(hooks);
        self
    }

    pub fn fetcher(mut self, fetcher: Arc<dyn Fetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    pub fn platforms(mut self, platforms: Arc<dyn PlatformApiFactory>) -> Self {
        self.platforms = Some(platforms);
        self
    }

    pub fn registry(mut self, registry: Arc<dyn PluginRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn pinned(mut self, pinned: PinnedVersions) -> Self {
        self.pinned = pinned;
        self
    }

    /// Host OS name, as in [`std::env::consts::OS`]
    pub fn host_os(mut self, host_os: impl Into<String>) -> Self {
        self.host_os = host_os.into();
        self
    }

    /// Version of the tool, matched against plugins' `cordova` requirements
    pub fn tool_version(mut self, version: impl Into<String>) -> Self {
        self.tool_version = Some(version.into());
        self
    }

    pub fn build(self) -> Cordova {
        let hooks = self
            .hooks
            .unwrap_or_else(|| Arc::new(ScriptHookRunner::new(self.project.clone())));
        Cordova {
            hooks,
            fetcher: self.fetcher.unwrap_or_else(|| Arc::new(NpmFetcher::default())),
            platforms: self
                .platforms
                .unwrap_or_else(|| Arc::new(ScriptPlatformFactory::new())),
            registry: self.registry.unwrap_or_else(|| Arc::new(NoRegistry)),
            pinned: self.pinned,
            host_os: self.host_os,
            tool_version: self.tool_version,
            events: Events::new(),
            api_cache: PlatformApiCache::new(),
            settings: OnceLock::new(),
            project: self.project,
        }
    }
}
