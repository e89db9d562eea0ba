//! Platforms driven by the scripts their packages ship.
//!
//! A platform package provides `bin/create` and `bin/update`; the created
//! platform directory provides `cordova/prepare`, `cordova/plugin-add` and
//! `cordova/plugin-rm`. Missing per-platform scripts are no-ops. A package
//! without `bin/create` is copied into place as is.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use cordova_fs::{UpdateOptions, merge_and_update_dir};
use tokio::process::Command;

use super::{
    PlatformApi, PlatformApiFactory, PlatformInfo, PlatformLocations, PlatformRequest, PluginInstall,
};
use crate::error::{Error, Result};
use crate::events::Events;
use crate::project::Project;

/// Run `script` if it exists. Returns whether it ran.
async fn run_script(
    platform: &str,
    script: &Path,
    args: &[&OsStr],
    cwd: &Path,
    envs: &[(&str, String)],
) -> Result<bool> {
    if !script.is_file() {
        tracing::debug!(platform, script = %script.display(), "no script, skipping");
        return Ok(false);
    }

    let mut cmd = Command::new(script);
    cmd.args(args).current_dir(cwd);
    for (key, value) in envs {
        cmd.env(key, value);
    }

    tracing::debug!(platform, script = %script.display(), "running platform script");
    let output = cmd.output().await.map_err(|e| Error::Spawn {
        program: script.display().to_string(),
        source: e,
    })?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let message = match stderr.trim() {
            "" => format!(
                "{} exited with status {:?}",
                script.display(),
                output.status.code()
            ),
            text => text.to_string(),
        };
        return Err(Error::PlatformApi {
            platform: platform.to_string(),
            message,
        });
    }
    Ok(true)
}

#[derive(Debug, Clone)]
pub struct ScriptPlatformApi {
    info: PlatformInfo,
}

impl ScriptPlatformApi {
    pub fn new(name: &str, platform_dir: &Path) -> Self {
        Self {
            info: PlatformInfo {
                name: name.to_string(),
                root: platform_dir.to_path_buf(),
                locations: PlatformLocations::standard(platform_dir),
            },
        }
    }

    fn script(&self, name: &str) -> PathBuf {
        self.info.root.join("cordova").join(name)
    }
}

#[async_trait]
impl PlatformApi for ScriptPlatformApi {
    fn info(&self) -> &PlatformInfo {
        &self.info
    }

    async fn prepare(&self, project: &Project, _events: &Events) -> Result<()> {
        run_script(
            &self.info.name,
            &self.script("prepare"),
            &[project.root().as_os_str()],
            &self.info.root,
            &[],
        )
        .await?;
        Ok(())
    }

    async fn add_plugin(&self, plugin: &PluginInstall, events: &Events) -> Result<()> {
        let variables = serde_json::to_string(&plugin.variables)?;
        let ran = run_script(
            &self.info.name,
            &self.script("plugin-add"),
            &[OsStr::new(&plugin.id), plugin.dir.as_os_str()],
            &self.info.root,
            &[("CORDOVA_PLUGIN_VARIABLES", variables)],
        )
        .await?;
        if ran {
            events.info(format!("Installed plugin {} for {}", plugin.id, self.info.name));
        }
        Ok(())
    }

    async fn remove_plugin(&self, id: &str, events: &Events) -> Result<()> {
        let ran = run_script(
            &self.info.name,
            &self.script("plugin-rm"),
            &[OsStr::new(id)],
            &self.info.root,
            &[],
        )
        .await?;
        if ran {
            events.info(format!("Uninstalled plugin {id} from {}", self.info.name));
        }
        Ok(())
    }
}

/// Creates platforms by running the package's `bin/create` and `bin/update`
#[derive(Debug, Clone, Default)]
pub struct ScriptPlatformFactory;

impl ScriptPlatformFactory {
    pub fn new() -> Self {
        Self
    }

    /// Copy the package over the platform directory, skipping its
    /// `node_modules`.
    fn copy_template(request: &PlatformRequest<'_>) -> Result<()> {
        let mut options = UpdateOptions::default();
        options.exclude.push("node_modules".to_string());
        let mut log = |msg: &str| tracing::debug!(platform = request.name, "{msg}");
        merge_and_update_dir(&options, request.platform_dir, &[request.template_dir], &mut log)?;
        Ok(())
    }
}

#[async_trait]
impl PlatformApiFactory for ScriptPlatformFactory {
    async fn create_platform(
        &self,
        request: PlatformRequest<'_>,
        events: &Events,
    ) -> Result<Arc<dyn PlatformApi>> {
        let create = request.template_dir.join("bin").join("create");
        let package_id = request.config.id().unwrap_or("io.cordova.hellocordova").to_string();
        let app_name = request.config.name().unwrap_or("HelloCordova").to_string();

        let ran = run_script(
            request.name,
            &create,
            &[
                request.platform_dir.as_os_str(),
                OsStr::new(&package_id),
                OsStr::new(&app_name),
            ],
            request.project.root(),
            &[],
        )
        .await?;
        if !ran {
            Self::copy_template(&request)?;
        }
        events.info(format!("Created {} platform", request.name));
        Ok(Arc::new(ScriptPlatformApi::new(request.name, request.platform_dir)))
    }

    async fn update_platform(
        &self,
        request: PlatformRequest<'_>,
        events: &Events,
    ) -> Result<Arc<dyn PlatformApi>> {
        let update = request.template_dir.join("bin").join("update");
        let ran = run_script(
            request.name,
            &update,
            &[request.platform_dir.as_os_str()],
            request.project.root(),
            &[],
        )
        .await?;
        if !ran {
            Self::copy_template(&request)?;
        }
        events.info(format!("Updated {} platform", request.name));
        Ok(Arc::new(ScriptPlatformApi::new(request.name, request.platform_dir)))
    }

    fn load(&self, name: &str, platform_dir: &Path) -> Result<Arc<dyn PlatformApi>> {
        if !platform_dir.is_dir() {
            return Err(Error::PlatformNotAdded {
                name: name.to_string(),
            });
        }
        Ok(Arc::new(ScriptPlatformApi::new(name, platform_dir)))
    }
}
