//! Plugin lifecycle: add, remove and list.

mod add;
mod graph;
mod remove;

use cordova_config::{ConfigParser, PackageDescriptor, PluginDecl, Variables};
use serde::Serialize;

pub use graph::PluginGraph;

use crate::error::Result;
use crate::fetch::FetchOptions;
use crate::hooks::HookPayload;

#[derive(Debug, Clone, Default)]
pub struct PluginOptions {
    /// Write the result back to `config.xml` and `package.json`
    pub save: bool,
    /// Extra directories searched for plugins before the registry
    pub searchpath: Option<String>,
    /// Installing what the project already declares
    pub restoring: bool,
    /// Install variables for the requested plugins
    pub variables: Variables,
}

impl PluginOptions {
    pub(crate) fn payload(&self, plugins: &[String]) -> HookPayload {
        HookPayload {
            platforms: Vec::new(),
            plugins: plugins.to_vec(),
            searchpath: self.searchpath.clone(),
            save: self.save,
            restoring: self.restoring,
        }
    }

    pub(crate) fn fetch_options(&self) -> FetchOptions {
        FetchOptions {
            save: false,
            searchpath: self.searchpath.clone(),
        }
    }
}

/// An installed plugin, as reported by `plugin list`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstalledPlugin {
    pub id: String,
    pub version: Option<String>,
    pub name: Option<String>,
    pub is_top_level: bool,
}

/// A top-level plugin whose install succeeded, with what to write back
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct StagedPlugin {
    pub id: String,
    pub spec: Option<String>,
    pub variables: Variables,
}

/// Write installed plugins back to the project documents.
///
/// With `keep_declared`, existing `package.json` specs are left alone.
pub(crate) fn persist_plugins(
    config: &mut ConfigParser,
    package: Option<&mut PackageDescriptor>,
    staged: &[StagedPlugin],
    keep_declared: bool,
) -> Result<()> {
    for plugin in staged {
        config.remove_plugin(&plugin.id)?;
        config.add_plugin(&PluginDecl::new(
            plugin.id.clone(),
            plugin.spec.clone(),
            plugin.variables.clone(),
        ))?;
    }
    config.write()?;

    if let Some(package) = package {
        for plugin in staged {
            package.set_plugin(&plugin.id, &plugin.variables);
            if let Some(spec) = &plugin.spec {
                if keep_declared {
                    package.add_dev_dependency_if_absent(&plugin.id, spec);
                } else {
                    package.set_dependency(&plugin.id, spec);
                }
            }
        }
        package.save()?;
    }
    Ok(())
}
