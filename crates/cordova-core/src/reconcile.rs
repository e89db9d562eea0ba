//! Bringing `package.json` in line with `config.xml` before a restore.
//!
//! Entries only move from `config.xml` into `package.json`. A project
//! without `package.json` is left alone, and `package.json` is only written
//! when an entry was actually added or changed.

use cordova_config::Variables;

use crate::error::Result;
use crate::platform::package_key;
use crate::project::Project;

/// What reconciliation added to `package.json`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub platforms_added: Vec<String>,
    pub plugins_added: Vec<String>,
    /// Plugins whose variables gained keys from `config.xml`
    pub plugins_updated: Vec<String>,
    /// Whether `package.json` was rewritten
    pub written: bool,
}

/// Add every `config.xml` engine missing from `cordova.platforms`, carrying
/// its spec into `devDependencies` when no spec is declared there yet.
pub fn reconcile_platforms(project: &Project) -> Result<ReconcileReport> {
    let mut report = ReconcileReport::default();
    let Some(mut package) = project.load_package()? else {
        return Ok(report);
    };
    let config = project.load_config()?;

    for engine in config.engines() {
        if package.add_platform(&engine.name) {
            tracing::debug!(platform = %engine.name, "copied platform into package.json");
            report.platforms_added.push(engine.name.clone());
        }
        if let Some(spec) = &engine.spec
            && package.platform_spec(&engine.name).is_none()
        {
            package.add_dev_dependency_if_absent(&package_key(&engine.name), spec);
        }
    }

    report.written = package.save()?;
    Ok(report)
}

/// Copy `config.xml` plugins into `cordova.plugins`.
///
/// A plugin missing from `package.json` is copied with its variables. For a
/// plugin present in both, the variables are merged with `package.json`
/// values winning. Specs go into `devDependencies` when no dependency table
/// declares the plugin yet.
pub fn reconcile_plugins(project: &Project) -> Result<ReconcileReport> {
    let mut report = ReconcileReport::default();
    let Some(mut package) = project.load_package()? else {
        return Ok(report);
    };
    let config = project.load_config()?;

    for plugin in config.plugins() {
        match package.plugin_variables(&plugin.name) {
            None => {
                package.set_plugin(&plugin.name, &plugin.variables);
                report.plugins_added.push(plugin.name.clone());
            }
            Some(existing) => {
                let mut merged: Variables = plugin.variables.clone();
                merged.extend(existing.clone());
                if merged != existing {
                    package.set_plugin(&plugin.name, &merged);
                    report.plugins_updated.push(plugin.name.clone());
                }
            }
        }
        if let Some(spec) = &plugin.spec {
            package.add_dev_dependency_if_absent(&plugin.name, spec);
        }
    }

    report.written = package.save()?;
    Ok(report)
}
