use std::future::Future;
use std::pin::Pin;

use cordova_config::{ConfigParser, PackageDescriptor, PluginDependency, PluginXml};
use cordova_fs::{UpdateOptions, merge_and_update_dir};
use cordova_spec::{SpecKind, Target, classify, negotiate, persisted_spec, resolve_plugin_spec};

use super::{PluginOptions, StagedPlugin, persist_plugins};
use crate::api::PluginInstall;
use crate::cordova::Cordova;
use crate::error::{Error, Result};
use crate::hooks::HookEvent;
use crate::metadata::{FetchJson, FetchRecord, PluginSource};
use crate::platform::non_blank;
use crate::state::{TargetProgress, TargetState};

/// Read-only state shared by one `plugin add` batch
struct InstallContext<'a> {
    options: &'a PluginOptions,
    config: &'a ConfigParser,
    package: Option<&'a PackageDescriptor>,
    platforms: &'a [String],
}

/// Outcome of installing one target
struct Installed {
    id: String,
    /// Spec to write back
    spec: Option<String>,
}

type InstallFuture<'a> = Pin<Box<dyn Future<Output = Result<Installed>> + 'a>>;

impl Cordova {
    /// Add plugins to the project and to every installed platform.
    ///
    /// Declared `<dependency>` plugins are installed first, as non-top-level
    /// plugins. The first failing target aborts the batch.
    pub async fn plugin_add(&self, targets: &[String], options: &PluginOptions) -> Result<()> {
        let targets = non_blank(targets);
        if targets.is_empty() {
            return Err(Error::NoTargets {
                kind: "plugin",
                action: "add",
                hint: "plugin search",
            });
        }

        let payload = options.payload(&targets);
        self.hooks.fire(HookEvent::BeforePluginAdd, &payload).await?;

        let (mut config, mut package) = self.load_documents()?;
        let platforms = self.project.installed_platforms()?;
        let mut fetch_json = FetchJson::load(&self.project)?;
        let mut staged = Vec::new();
        let mut progress = Vec::new();
        {
            let ctx = InstallContext {
                options,
                config: &config,
                package: package.as_ref(),
                platforms: &platforms,
            };
            for target in &targets {
                let mut target_progress = TargetProgress::new(target.as_str());
                let mut chain = Vec::new();
                let installed = self
                    .install_plugin(
                        target,
                        true,
                        &ctx,
                        &mut fetch_json,
                        &mut chain,
                        &mut target_progress,
                    )
                    .await;
                match installed {
                    Ok(installed) => {
                        staged.push(StagedPlugin {
                            id: installed.id,
                            spec: installed.spec,
                            variables: options.variables.clone(),
                        });
                        progress.push(target_progress);
                    }
                    Err(e) => {
                        target_progress.fail();
                        return Err(e);
                    }
                }
            }
        }

        if self.should_save(options.save) && !staged.is_empty() {
            persist_plugins(&mut config, package.as_mut(), &staged, options.restoring)?;
        }
        for target_progress in &mut progress {
            target_progress.advance(TargetState::Persisted)?;
            target_progress.advance(TargetState::Done)?;
        }

        self.hooks.fire(HookEvent::AfterPluginAdd, &payload).await?;
        Ok(())
    }

    fn is_plugin_installed(&self, id: &str, fetch_json: &FetchJson) -> bool {
        fetch_json.contains(id) && self.project.plugin_dir(id).is_dir()
    }

    /// Install one target and, before it, the plugins it depends on.
    ///
    /// `chain` holds the ids being installed further up, so dependency
    /// cycles end instead of recursing.
    fn install_plugin<'a>(
        &'a self,
        target: &'a str,
        top_level: bool,
        ctx: &'a InstallContext<'a>,
        fetch_json: &'a mut FetchJson,
        chain: &'a mut Vec<String>,
        progress: &'a mut TargetProgress,
    ) -> InstallFuture<'a> {
        Box::pin(async move {
            let root = self.project.root();
            let kind = classify(target, root);
            let parsed = if kind.is_location() {
                None
            } else {
                Some(Target::parse(target)?)
            };

            if let Some(parsed) = &parsed
                && self.is_plugin_installed(&parsed.name, fetch_json)
            {
                self.mark_already_installed(&parsed.name, top_level, fetch_json)?;
                return Ok(Installed {
                    id: parsed.name.clone(),
                    spec: parsed.spec.as_deref().map(|s| persisted_spec(s, root)),
                });
            }

            let resolved = parsed.as_ref().and_then(|p| {
                resolve_plugin_spec(&p.name, p.spec.as_deref(), ctx.package, Some(ctx.config), root)
            });
            progress.advance(TargetState::SpecResolved)?;

            let fetch_target = match (&parsed, &resolved) {
                (None, _) => target.to_string(),
                (Some(_), Some(r)) if r.kind.is_location() => r.spec.clone(),
                (Some(p), Some(r)) => format!("{}@{}", p.name, r.spec),
                (Some(p), None) => match self.negotiate_plugin_version(&p.name).await? {
                    Some(version) => format!("{}@{version}", p.name),
                    None => p.name.clone(),
                },
            };
            let fetched = self
                .fetcher
                .fetch(&fetch_target, root, &ctx.options.fetch_options())
                .await
                .map_err(|e| Error::fetch("plugin", &fetch_target, e))?;
            let plugin_xml = PluginXml::load(&fetched)?;
            let id = plugin_xml.id.clone();
            progress.advance(TargetState::Fetched)?;

            let spec = match (&parsed, &resolved, &plugin_xml.version) {
                (None, _, _) => Some(target.to_string()),
                (Some(_), Some(r), _) if r.kind.is_location() => Some(r.spec.clone()),
                (Some(_), Some(r), _) => Some(persisted_spec(&r.spec, root)),
                (Some(_), None, Some(version)) => Some(format!("^{version}")),
                (Some(_), None, None) => None,
            };

            // A location's id is only known now
            if parsed.is_none() && self.is_plugin_installed(&id, fetch_json) {
                self.mark_already_installed(&id, top_level, fetch_json)?;
                return Ok(Installed { id, spec });
            }

            let plugin_dir = self.project.plugin_dir(&id);
            if dunce::canonicalize(&fetched).ok() != dunce::canonicalize(&plugin_dir).ok() {
                let mut copy_options = UpdateOptions::default();
                copy_options.exclude.push("node_modules".to_string());
                let mut log = |msg: &str| tracing::debug!(plugin = %id, "{msg}");
                merge_and_update_dir(&copy_options, &plugin_dir, &[&fetched], &mut log)?;
            }

            chain.push(id.clone());
            let mut dependencies = Vec::new();
            for dep in plugin_dependencies(&plugin_xml, ctx.platforms) {
                dependencies.push(dep.id.clone());
                if chain.contains(&dep.id) {
                    tracing::debug!(plugin = %id, dependency = %dep.id, "dependency cycle, skipping");
                    continue;
                }
                let dep_target = dep.fetch_target();
                let mut dep_progress = TargetProgress::new(dep_target.as_str());
                let installed = self
                    .install_plugin(&dep_target, false, ctx, fetch_json, chain, &mut dep_progress)
                    .await;
                match installed {
                    Ok(_) => {
                        dep_progress.advance(TargetState::Persisted)?;
                        dep_progress.advance(TargetState::Done)?;
                    }
                    Err(e) => {
                        dep_progress.fail();
                        return Err(e);
                    }
                }
            }
            chain.pop();

            let install = PluginInstall {
                id: id.clone(),
                dir: plugin_dir,
                variables: ctx.options.variables.clone(),
            };
            for platform in ctx.platforms {
                let api = self.platform_api(platform)?;
                api.add_plugin(&install, &self.events).await?;
            }
            progress.advance(TargetState::ApiInvoked)?;
            progress.advance(TargetState::PluginsInstalled)?;

            let source = match &kind {
                SpecKind::LocalPath(path) => PluginSource::Local { path: path.clone() },
                SpecKind::Url(_) | SpecKind::GitRemote(_) => PluginSource::Url {
                    url: target.to_string(),
                },
                _ => PluginSource::Registry {
                    id: fetch_target.clone(),
                },
            };
            fetch_json.insert(
                &id,
                FetchRecord {
                    source,
                    is_top_level: top_level,
                    variables: ctx.options.variables.clone(),
                    dependencies,
                },
            );
            fetch_json.save()?;

            self.events.info(format!("Installed plugin {id}"));
            Ok(Installed { id, spec })
        })
    }

    /// Promote an installed dependency that is now requested directly
    fn mark_already_installed(
        &self,
        id: &str,
        top_level: bool,
        fetch_json: &mut FetchJson,
    ) -> Result<()> {
        if top_level
            && let Some(record) = fetch_json.get_mut(id)
            && !record.is_top_level
        {
            record.is_top_level = true;
            fetch_json.save()?;
        }
        self.events
            .info(format!("Plugin \"{id}\" already installed on the project."));
        Ok(())
    }

    /// Version to fetch for a plugin with no declared spec, or `None` to
    /// let the fetcher pick the latest.
    async fn negotiate_plugin_version(&self, id: &str) -> Result<Option<String>> {
        let Some(info) = self.registry.info(id).await? else {
            return Ok(None);
        };
        let negotiation = negotiate(&info, &self.installed_versions()?);
        for unmet in &negotiation.unmet {
            self.events.warn(format!(
                "Latest version of plugin \"{id}\" has an unmet requirement: {unmet}"
            ));
        }
        match (&negotiation.selected, &negotiation.latest) {
            (Some(selected), Some(latest)) if negotiation.is_downgrade() => {
                self.events.warn(format!(
                    "Fetching highest version of \"{id}\" that this project supports: {selected} (latest is {latest})"
                ));
                Ok(Some(selected.to_string()))
            }
            (Some(selected), _) => Ok(Some(selected.to_string())),
            (None, _) => {
                self.events.warn(format!(
                    "Current project does not satisfy the engine requirements of any version of \"{id}\". Fetching latest version anyway."
                ));
                Ok(None)
            }
        }
    }
}

/// Platform-neutral dependencies, then those of each installed platform
fn plugin_dependencies<'p>(plugin: &'p PluginXml, platforms: &[String]) -> Vec<&'p PluginDependency> {
    let mut deps = plugin.dependencies_for(None);
    for platform in platforms {
        for dep in plugin.dependencies_for(Some(platform)) {
            if !deps.iter().any(|d| d.id == dep.id) {
                deps.push(dep);
            }
        }
    }
    deps
}
