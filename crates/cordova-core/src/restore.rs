//! Installing the platforms and plugins a project declares but lacks.
//!
//! Items are installed one at a time. A failing item is reported as a
//! warning, sets a non-zero exit code, and the rest still run.

use cordova_config::{PackageDescriptor, Variables};
use cordova_spec::{SpecKind, classify};

use crate::cordova::Cordova;
use crate::error::Result;
use crate::metadata::FetchJson;
use crate::platform::PlatformOptions;
use crate::plugin::PluginOptions;
use crate::reconcile::{reconcile_platforms, reconcile_plugins};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RestoreReport {
    pub installed: Vec<String>,
    pub failed: Vec<String>,
}

/// Install target for a declared name and spec: `name@range`, the spec
/// itself for URLs and directories, or the bare name.
pub fn restore_target(name: &str, spec: Option<&str>, cwd: &std::path::Path) -> String {
    match spec.map(|s| (s, classify(s, cwd))) {
        Some((spec, kind)) if kind.is_location() => spec.to_string(),
        Some((spec, SpecKind::Version(_) | SpecKind::Range(_) | SpecKind::Fetch(_))) => {
            format!("{name}@{spec}")
        }
        _ => name.to_string(),
    }
}

/// Declared platform names: `cordova.platforms` first, then `config.xml`
/// engines not listed there
fn declared_platforms(package: Option<&PackageDescriptor>, engines: &[String]) -> Vec<String> {
    let mut names: Vec<String> = package.map(|p| p.platforms()).unwrap_or_default();
    for engine in engines {
        if !names.contains(engine) {
            names.push(engine.clone());
        }
    }
    names
}

impl Cordova {
    /// Install declared platforms that have no directory under `platforms/`.
    ///
    /// `filter` limits the restore to the given names.
    pub async fn restore_platforms(
        &self,
        filter: Option<&[String]>,
        options: &PlatformOptions,
    ) -> Result<RestoreReport> {
        reconcile_platforms(&self.project)?;
        let (config, package) = self.load_documents()?;
        let engines: Vec<String> = config.engines().into_iter().map(|e| e.name).collect();

        let mut report = RestoreReport::default();
        for name in declared_platforms(package.as_ref(), &engines) {
            if self.project.is_platform_installed(&name) {
                continue;
            }
            if filter.is_some_and(|names| !names.contains(&name)) {
                continue;
            }
            let spec = package
                .as_ref()
                .and_then(|p| p.platform_spec(&name))
                .map(str::to_string)
                .or_else(|| cordova_spec::engine_spec(&config.engines(), &name));
            let target = restore_target(&name, spec.as_deref(), self.project.root());

            let add_options = PlatformOptions {
                restoring: true,
                ..options.clone()
            };
            self.events.info(format!("Discovered platform \"{target}\". Adding it to the project"));
            match self.platform_add(&[target.clone()], &add_options).await {
                Ok(()) => report.installed.push(name),
                Err(e) => {
                    self.events
                        .warn(format!("Failed to restore platform \"{name}\". You might need to try adding it again. Error: {e}"));
                    self.events.set_exit_code(1);
                    report.failed.push(name);
                }
            }
        }
        Ok(report)
    }

    /// Install declared plugins that are not installed yet
    pub async fn restore_plugins(&self, options: &PlatformOptions) -> Result<RestoreReport> {
        reconcile_plugins(&self.project)?;
        let (config, package) = self.load_documents()?;
        let fetch_json = FetchJson::load(&self.project)?;

        let mut declared: Vec<(String, Variables)> =
            package.as_ref().map(|p| p.plugins()).unwrap_or_default();
        for plugin in config.plugins() {
            if !declared.iter().any(|(id, _)| *id == plugin.name) {
                declared.push((plugin.name.clone(), plugin.variables.clone()));
            }
        }

        let mut report = RestoreReport::default();
        for (id, variables) in declared {
            if fetch_json.contains(&id) && self.project.plugin_dir(&id).is_dir() {
                continue;
            }
            let spec = package
                .as_ref()
                .and_then(|p| p.dependency(&id))
                .map(str::to_string)
                .or_else(|| config.plugin(&id).and_then(|p| p.spec));
            let target = restore_target(&id, spec.as_deref(), self.project.root());

            let plugin_options = PluginOptions {
                save: false,
                searchpath: options.searchpath.clone(),
                variables,
                restoring: true,
            };
            self.events.info(format!("Discovered plugin \"{id}\". Adding it to the project"));
            match self.plugin_add(&[target], &plugin_options).await {
                Ok(()) => report.installed.push(id),
                Err(e) => {
                    self.events.warn(format!("Failed to restore plugin \"{id}\". You might need to try adding it again. Error: {e}"));
                    self.events.set_exit_code(1);
                    report.failed.push(id);
                }
            }
        }
        Ok(report)
    }
}
