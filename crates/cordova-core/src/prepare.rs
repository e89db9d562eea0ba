//! `prepare`: restore what the project declares, then sync it into each
//! platform.

use crate::cordova::Cordova;
use crate::error::{Error, Result};
use crate::handler::handler_for;
use crate::hooks::{HookEvent, HookPayload};
use crate::platform::PlatformOptions;

#[derive(Debug, Clone, Default)]
pub struct PrepareOptions {
    /// Platforms to prepare; empty means every installed one
    pub platforms: Vec<String>,
    pub searchpath: Option<String>,
}

impl Cordova {
    pub async fn prepare(&self, options: &PrepareOptions) -> Result<()> {
        let payload = HookPayload {
            platforms: options.platforms.clone(),
            searchpath: options.searchpath.clone(),
            ..HookPayload::default()
        };
        self.hooks.fire(HookEvent::BeforePrepare, &payload).await?;

        let restore_options = PlatformOptions {
            save: false,
            searchpath: options.searchpath.clone(),
            restoring: true,
        };
        let filter = (!options.platforms.is_empty()).then_some(options.platforms.as_slice());
        self.restore_platforms(filter, &restore_options).await?;
        self.restore_plugins(&restore_options).await?;

        let installed = self.project.installed_platforms()?;
        if installed.is_empty() {
            return Err(Error::NoPlatforms);
        }
        let targets: Vec<String> = if options.platforms.is_empty() {
            installed
        } else {
            let mut targets = Vec::new();
            for name in &options.platforms {
                if installed.contains(name) {
                    targets.push(name.clone());
                } else {
                    self.events.warn(format!(
                        "Platform \"{name}\" is not installed and could not be restored, skipping."
                    ));
                }
            }
            targets
        };

        for name in &targets {
            self.prepare_platform(name).await?;
        }

        self.hooks.fire(HookEvent::AfterPrepare, &payload).await?;
        Ok(())
    }

    /// Sync web assets and `config.xml` into `name`, then let its API
    /// prepare the native project.
    pub(crate) async fn prepare_platform(&self, name: &str) -> Result<()> {
        let api = self.platform_api(name)?;
        let handler = handler_for(api.info())?;
        let mut log = |message: &str| tracing::debug!(platform = name, "{message}");

        let www_changed = handler.update_www(&self.project, &mut log)?;
        let config_changed = handler.update_project(&self.project, &mut log)?;
        tracing::debug!(platform = name, www_changed, config_changed, "synced project files");

        api.prepare(&self.project, &self.events).await?;
        self.events.info(format!("Prepared platform {name}"));
        Ok(())
    }
}
