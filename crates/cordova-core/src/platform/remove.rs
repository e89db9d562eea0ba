use cordova_spec::Target;

use super::{PlatformOptions, non_blank, package_key};
use crate::cordova::Cordova;
use crate::error::{Error, Result};
use crate::hooks::HookEvent;
use crate::metadata::PlatformsJson;

impl Cordova {
    /// Remove platforms and their installation records. With saving on, the
    /// `config.xml` engine, the `cordova.platforms` entry and the
    /// `cordova-<name>` dependency go too.
    pub async fn platform_remove(&self, targets: &[String], options: &PlatformOptions) -> Result<()> {
        let targets = non_blank(targets);
        if targets.is_empty() {
            return Err(Error::NoTargets {
                kind: "platform",
                action: "remove",
                hint: "platform list",
            });
        }
        let names = targets
            .iter()
            .map(|t| Target::parse(t).map(|parsed| parsed.name))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let payload = options.payload(&names);
        self.hooks.fire(HookEvent::BeforePlatformRm, &payload).await?;

        let mut platforms_json = PlatformsJson::load(&self.project)?;
        for name in &names {
            let dir = self.project.platform_dir(name);
            self.api_cache().remove(&dir);
            if dir.exists() {
                std::fs::remove_dir_all(&dir).map_err(|e| Error::io(&dir, e))?;
                self.events.info(format!("Removed platform {name}"));
            } else {
                tracing::debug!(platform = %name, "platform directory already gone");
            }
            platforms_json.remove(name);
        }
        platforms_json.save()?;

        if self.should_save(options.save) {
            let (mut config, mut package) = self.load_documents()?;
            for name in &names {
                config.remove_engine(name)?;
            }
            config.write()?;
            if let Some(package) = package.as_mut() {
                for name in &names {
                    package.remove_platform(name);
                    package.remove_dependency(&package_key(name));
                }
                package.save()?;
            }
        }

        self.hooks.fire(HookEvent::AfterPlatformRm, &payload).await?;
        Ok(())
    }
}
