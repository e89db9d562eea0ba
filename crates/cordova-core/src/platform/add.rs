use std::path::Path;

use cordova_config::{ConfigParser, PackageDescriptor};
use cordova_spec::{
    ResolvedSpec, SpecKind, SpecSource, Target, classify, name_from_url, persisted_spec,
    platform_name_from_package, resolve_platform_spec, supports_host,
};

use super::{PlatformOptions, StagedPlatform, non_blank, package_key, persist_platforms};
use crate::api::{PlatformRequest, PluginInstall};
use crate::cordova::Cordova;
use crate::error::{Error, Result};
use crate::hooks::HookEvent;
use crate::metadata::{FetchJson, PlatformsJson};
use crate::plugin::PluginGraph;
use crate::state::{TargetProgress, TargetState};

/// What a single add target asks for, before fetching
struct Request {
    /// Platform name, when it can be known before fetching
    name: Option<String>,
    resolved: Option<ResolvedSpec>,
    /// The target itself is a URL or directory
    is_location: bool,
}

impl Cordova {
    /// Add platforms to the project.
    ///
    /// Targets are handled one at a time, in order. The first failing target
    /// aborts the batch. `after_platform_add` fires once after every target
    /// went through, including targets skipped while restoring.
    pub async fn platform_add(&self, targets: &[String], options: &PlatformOptions) -> Result<()> {
        let targets = non_blank(targets);
        if targets.is_empty() {
            return Err(Error::NoTargets {
                kind: "platform",
                action: "add",
                hint: "platform list",
            });
        }

        for target in &targets {
            if let Ok(parsed) = Target::parse(target)
                && !supports_host(&parsed.name, &self.host_os)
            {
                self.events.warn(format!(
                    "WARNING: Applications for platform {} can not be built on this OS - {}.",
                    parsed.name, self.host_os
                ));
            }
        }

        let payload = options.payload(&targets);
        self.hooks.fire(HookEvent::BeforePlatformAdd, &payload).await?;

        let (mut config, mut package) = self.load_documents()?;
        let mut platforms_json = PlatformsJson::load(&self.project)?;
        let mut staged = Vec::new();
        let mut progress = Vec::new();

        for target in &targets {
            let mut target_progress = TargetProgress::new(target.as_str());
            let added = self
                .add_platform_target(
                    target,
                    options,
                    &config,
                    package.as_ref(),
                    &mut platforms_json,
                    &mut target_progress,
                )
                .await;
            match added {
                Ok(Some(platform)) => {
                    staged.push(platform);
                    progress.push(target_progress);
                }
                Ok(None) => {}
                Err(e) => {
                    target_progress.fail();
                    return Err(e);
                }
            }
        }

        if self.should_save(options.save) && !staged.is_empty() {
            persist_platforms(&mut config, package.as_mut(), &staged, options.restoring)?;
        }
        for target_progress in &mut progress {
            target_progress.advance(TargetState::Persisted)?;
            target_progress.advance(TargetState::Done)?;
        }

        self.hooks.fire(HookEvent::AfterPlatformAdd, &payload).await?;
        Ok(())
    }

    fn platform_request(
        &self,
        target: &str,
        config: &ConfigParser,
        package: Option<&PackageDescriptor>,
    ) -> Result<Request> {
        let root = self.project.root();
        let kind = classify(target, root);
        if kind.is_location() {
            let name = match &kind {
                SpecKind::LocalPath(dir) => local_platform_name(dir),
                _ => name_from_url(target),
            };
            return Ok(Request {
                name,
                resolved: Some(ResolvedSpec {
                    spec: target.to_string(),
                    source: SpecSource::Explicit,
                    kind,
                }),
                is_location: true,
            });
        }

        let parsed = Target::parse(target)?;
        let resolved = resolve_platform_spec(
            &parsed.name,
            parsed.spec.as_deref(),
            package,
            Some(config),
            &self.pinned,
            root,
        );
        Ok(Request {
            name: Some(parsed.name),
            resolved,
            is_location: false,
        })
    }

    /// Check that `name` can still be added. `Ok(false)` skips it.
    fn check_not_added(&self, name: &str, options: &PlatformOptions) -> Result<bool> {
        if !self.project.is_platform_installed(name) {
            return Ok(true);
        }
        if options.restoring {
            tracing::debug!(platform = name, "already installed, skipping");
            return Ok(false);
        }
        Err(Error::AlreadyAdded {
            name: name.to_string(),
        })
    }

    async fn add_platform_target(
        &self,
        target: &str,
        options: &PlatformOptions,
        config: &ConfigParser,
        package: Option<&PackageDescriptor>,
        platforms_json: &mut PlatformsJson,
        progress: &mut TargetProgress,
    ) -> Result<Option<StagedPlatform>> {
        let root = self.project.root();
        let request = self.platform_request(target, config, package)?;
        progress.advance(TargetState::SpecResolved)?;

        if let Some(name) = &request.name
            && !self.check_not_added(name, options)?
        {
            return Ok(None);
        }

        let fetch_target = match (&request.name, &request.resolved) {
            (_, Some(resolved)) if resolved.kind.is_location() => resolved.spec.clone(),
            (Some(name), Some(resolved)) => format!("{}@{}", package_key(name), resolved.spec),
            (Some(name), None) => package_key(name),
            (None, _) => target.to_string(),
        };
        let template_dir = self
            .fetcher
            .fetch(&fetch_target, root, &options.fetch_options())
            .await
            .map_err(|e| Error::fetch("platform", &fetch_target, e))?;
        progress.advance(TargetState::Fetched)?;

        let template = PackageDescriptor::load(&template_dir.join(PackageDescriptor::FILE_NAME))?;
        let name = match (&request.name, template.as_ref().and_then(|t| t.name())) {
            (_, Some(package_name)) if request.is_location => {
                platform_name_from_package(package_name)
            }
            (Some(name), _) => name.clone(),
            (None, Some(package_name)) => platform_name_from_package(package_name),
            (None, None) => {
                return Err(Error::UnnamedTarget {
                    kind: "platform",
                    target: target.to_string(),
                });
            }
        };
        // A location's real name is only known now
        if request.name.as_deref() != Some(name.as_str()) && !self.check_not_added(&name, options)? {
            return Ok(None);
        }

        let platform_dir = self.project.platform_dir(&name);
        let api = self
            .platforms
            .create_platform(
                PlatformRequest {
                    name: &name,
                    template_dir: &template_dir,
                    platform_dir: &platform_dir,
                    project: &self.project,
                    config,
                },
                &self.events,
            )
            .await?;
        self.api_cache().insert(&platform_dir, api.clone());
        progress.advance(TargetState::ApiInvoked)?;

        if !options.restoring {
            self.prepare_platform(&name).await?;
        }

        let fetch_json = FetchJson::load(&self.project)?;
        let graph = PluginGraph::from_fetch_json(&fetch_json);
        for id in graph.install_order() {
            let Some(record) = fetch_json.get(&id) else {
                continue;
            };
            let dir = self.project.plugin_dir(&id);
            if !dir.is_dir() {
                continue;
            }
            api.add_plugin(
                &PluginInstall {
                    id: id.clone(),
                    dir,
                    variables: record.variables.clone(),
                },
                &self.events,
            )
            .await?;
        }
        progress.advance(TargetState::PluginsInstalled)?;

        if !options.restoring {
            self.prepare_platform(&name).await?;
        }

        let template_version = template.as_ref().and_then(|t| t.version()).map(str::to_string);
        let installed_version = template_version
            .clone()
            .or_else(|| request.resolved.as_ref().map(|r| r.spec.clone()));
        if let Some(version) = &installed_version {
            platforms_json.insert(&name, version);
            platforms_json.save()?;
        }

        let spec = match (&request.resolved, &template_version) {
            (Some(resolved), _) if request.is_location => Some(resolved.spec.clone()),
            (Some(resolved), _) => Some(persisted_spec(&resolved.spec, root)),
            (None, Some(version)) => Some(format!("~{version}")),
            (None, None) => None,
        };
        self.events.info(format!("Added platform {name}"));
        Ok(Some(StagedPlatform { name, spec }))
    }
}

/// Platform name of a local package: from its `package.json`, else from the
/// directory name
fn local_platform_name(dir: &Path) -> Option<String> {
    let from_package = PackageDescriptor::load(&dir.join(PackageDescriptor::FILE_NAME))
        .ok()
        .flatten()
        .and_then(|pkg| pkg.name().map(platform_name_from_package));
    from_package.or_else(|| {
        dir.file_name()
            .and_then(|n| n.to_str())
            .map(platform_name_from_package)
    })
}
