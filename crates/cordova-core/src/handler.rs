//! Syncing project files into a platform.
//!
//! [`DefaultHandler`] works from the locations the platform API reports.
//! A platform can override single methods with
//! `platforms/<name>/cordova/handler.json`, which [`handler_for`] layers on
//! top of the default through [`LayeredHandler`].

use std::path::{Path, PathBuf};

use cordova_fs::{UpdateOptions, merge_and_update_dir, update_path};
use serde::Deserialize;

use crate::api::PlatformInfo;
use crate::error::Result;
use crate::project::Project;

/// File name of the per-platform override, inside `cordova/`
pub const HANDLER_OVERRIDE: &str = "handler.json";

pub trait PlatformHandler: Send + Sync {
    /// Where the platform keeps its copy of `config.xml`
    fn config_xml(&self, project: &Project) -> PathBuf;

    /// Where the platform keeps its web assets
    fn www_dir(&self, project: &Project) -> PathBuf;

    /// Sources overlaid onto [`PlatformHandler::www_dir`], later ones
    /// winning
    fn www_sources(&self, project: &Project) -> Vec<PathBuf>;

    /// Sync the web assets. Returns `true` if anything changed.
    fn update_www(&self, project: &Project, log: &mut dyn FnMut(&str)) -> Result<bool> {
        let options = UpdateOptions::with_root(project.root());
        let target = self.www_dir(project);
        let sources: Vec<PathBuf> = self
            .www_sources(project)
            .iter()
            .map(|p| project.relative(p).to_path_buf())
            .collect();
        Ok(merge_and_update_dir(
            &options,
            project.relative(&target),
            &sources,
            log,
        )?)
    }

    /// Sync the platform's copy of `config.xml`. Returns `true` if it changed.
    fn update_project(&self, project: &Project, log: &mut dyn FnMut(&str)) -> Result<bool> {
        let options = UpdateOptions::with_root(project.root());
        let source = project.config_xml_path();
        let target = self.config_xml(project);
        Ok(update_path(
            &options,
            project.relative(&target),
            Some(project.relative(&source)),
            log,
        )?)
    }
}

/// Handler driven by the platform API's reported locations
#[derive(Debug, Clone)]
pub struct DefaultHandler {
    info: PlatformInfo,
}

impl DefaultHandler {
    pub fn new(info: PlatformInfo) -> Self {
        Self { info }
    }
}

impl PlatformHandler for DefaultHandler {
    fn config_xml(&self, _project: &Project) -> PathBuf {
        self.info.locations.config_xml.clone()
    }

    fn www_dir(&self, _project: &Project) -> PathBuf {
        self.info.locations.www.clone()
    }

    /// `www`, then the platform's own `platform_www`, then
    /// `merges/<platform>`
    fn www_sources(&self, project: &Project) -> Vec<PathBuf> {
        vec![
            project.www_dir(),
            self.info.locations.platform_www.clone(),
            project.merges_dir(&self.info.name),
        ]
    }
}

/// Contents of `cordova/handler.json`. Paths are relative to the platform
/// directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandlerOverrides {
    pub config_xml: Option<PathBuf>,
    pub www_dir: Option<PathBuf>,
    /// Replaces the default source list; relative to the project root
    pub www_sources: Option<Vec<PathBuf>>,
}

/// A platform's overrides on top of another handler
pub struct LayeredHandler {
    base: Box<dyn PlatformHandler>,
    platform_dir: PathBuf,
    overrides: HandlerOverrides,
}

impl LayeredHandler {
    pub fn new(base: Box<dyn PlatformHandler>, platform_dir: &Path, overrides: HandlerOverrides) -> Self {
        Self {
            base,
            platform_dir: platform_dir.to_path_buf(),
            overrides,
        }
    }
}

impl PlatformHandler for LayeredHandler {
    fn config_xml(&self, project: &Project) -> PathBuf {
        match &self.overrides.config_xml {
            Some(path) => self.platform_dir.join(path),
            None => self.base.config_xml(project),
        }
    }

    fn www_dir(&self, project: &Project) -> PathBuf {
        match &self.overrides.www_dir {
            Some(path) => self.platform_dir.join(path),
            None => self.base.www_dir(project),
        }
    }

    fn www_sources(&self, project: &Project) -> Vec<PathBuf> {
        match &self.overrides.www_sources {
            Some(sources) => sources.iter().map(|p| project.root().join(p)).collect(),
            None => self.base.www_sources(project),
        }
    }
}

/// The handler for an installed platform: the default one, with
/// `cordova/handler.json` layered on top when the platform ships it.
pub fn handler_for(info: &PlatformInfo) -> Result<Box<dyn PlatformHandler>> {
    let base: Box<dyn PlatformHandler> = Box::new(DefaultHandler::new(info.clone()));
    let override_path = info.root.join("cordova").join(HANDLER_OVERRIDE);
    if !override_path.is_file() {
        return Ok(base);
    }
    let content = cordova_fs::read_text(&override_path)?;
    let overrides: HandlerOverrides = serde_json::from_str(&content)?;
    tracing::debug!(platform = %info.name, ?overrides, "using handler overrides");
    Ok(Box::new(LayeredHandler::new(base, &info.root, overrides)))
}
