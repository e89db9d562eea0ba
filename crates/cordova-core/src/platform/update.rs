use cordova_config::PackageDescriptor;
use cordova_spec::{Target, persisted_spec, resolve_platform_spec};

use super::{PlatformOptions, StagedPlatform, non_blank, package_key, persist_platforms};
use crate::api::PlatformRequest;
use crate::cordova::Cordova;
use crate::error::{Error, Result};
use crate::hooks::HookEvent;
use crate::metadata::PlatformsJson;
use crate::state::{TargetProgress, TargetState};

impl Cordova {
    /// Update installed platforms to the spec given, or the one the project
    /// declares.
    pub async fn platform_update(&self, targets: &[String], options: &PlatformOptions) -> Result<()> {
        let targets = non_blank(targets);
        if targets.is_empty() {
            return Err(Error::NoTargets {
                kind: "platform",
                action: "update",
                hint: "platform list",
            });
        }
        let parsed = targets
            .iter()
            .map(|t| Target::parse(t.as_str()))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        for target in &parsed {
            if !self.project.is_platform_installed(&target.name) {
                return Err(Error::PlatformNotAdded {
                    name: target.name.clone(),
                });
            }
        }

        let payload = options.payload(&targets);
        self.hooks.fire(HookEvent::BeforePlatformUpdate, &payload).await?;

        let root = self.project.root();
        let (mut config, mut package) = self.load_documents()?;
        let mut platforms_json = PlatformsJson::load(&self.project)?;
        let mut staged = Vec::new();

        for target in &parsed {
            let mut progress = TargetProgress::new(target.display_target());
            let resolved = resolve_platform_spec(
                &target.name,
                target.spec.as_deref(),
                package.as_ref(),
                Some(&config),
                &self.pinned,
                root,
            );
            progress.advance(TargetState::SpecResolved)?;

            let fetch_target = match &resolved {
                Some(r) if r.kind.is_location() => r.spec.clone(),
                Some(r) => format!("{}@{}", package_key(&target.name), r.spec),
                None => package_key(&target.name),
            };
            let template_dir = self
                .fetcher
                .fetch(&fetch_target, root, &options.fetch_options())
                .await
                .map_err(|e| Error::fetch("platform", &fetch_target, e))?;
            progress.advance(TargetState::Fetched)?;

            let platform_dir = self.project.platform_dir(&target.name);
            let api = self
                .platforms
                .update_platform(
                    PlatformRequest {
                        name: &target.name,
                        template_dir: &template_dir,
                        platform_dir: &platform_dir,
                        project: &self.project,
                        config: &config,
                    },
                    &self.events,
                )
                .await?;
            self.api_cache().insert(&platform_dir, api);
            progress.advance(TargetState::ApiInvoked)?;
            // Installed plugins stay in place across an update
            progress.advance(TargetState::PluginsInstalled)?;

            let template =
                PackageDescriptor::load(&template_dir.join(PackageDescriptor::FILE_NAME))?;
            let version = template.as_ref().and_then(|t| t.version()).map(str::to_string);
            if let Some(version) = &version {
                platforms_json.insert(&target.name, version);
                platforms_json.save()?;
            }

            let spec = match (&resolved, &version) {
                (Some(r), _) if r.kind.is_location() => Some(r.spec.clone()),
                (Some(r), _) => Some(persisted_spec(&r.spec, root)),
                (None, Some(version)) => Some(format!("~{version}")),
                (None, None) => None,
            };
            staged.push(StagedPlatform {
                name: target.name.clone(),
                spec,
            });
            progress.advance(TargetState::Persisted)?;
            progress.advance(TargetState::Done)?;
            self.events.info(format!("Updated platform {}", target.name));
        }

        if self.should_save(options.save) {
            persist_platforms(&mut config, package.as_mut(), &staged, false)?;
        }

        self.hooks.fire(HookEvent::AfterPlatformUpdate, &payload).await?;
        Ok(())
    }
}
