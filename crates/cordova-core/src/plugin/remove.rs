use cordova_config::PluginXml;
use cordova_spec::Target;

use super::{InstalledPlugin, PluginGraph, PluginOptions};
use crate::cordova::Cordova;
use crate::error::{Error, Result};
use crate::hooks::HookEvent;
use crate::metadata::FetchJson;
use crate::platform::non_blank;

impl Cordova {
    /// Remove plugins, along with dependencies nothing else needs.
    ///
    /// A plugin that a plugin staying installed depends on is refused.
    ///
    /// Plugins are uninstalled from every installed platform before their
    /// directory under `plugins/` goes, dependents before dependencies.
    pub async fn plugin_remove(&self, targets: &[String], options: &PluginOptions) -> Result<()> {
        let targets = non_blank(targets);
        if targets.is_empty() {
            return Err(Error::NoTargets {
                kind: "plugin",
                action: "remove",
                hint: "plugin list",
            });
        }
        let ids = targets
            .iter()
            .map(|t| Target::parse(t).map(|parsed| parsed.name))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut fetch_json = FetchJson::load(&self.project)?;
        for id in &ids {
            if !fetch_json.contains(id) && !self.project.plugin_dir(id).is_dir() {
                return Err(Error::PluginNotInstalled { id: id.clone() });
            }
        }

        let graph = PluginGraph::from_fetch_json(&fetch_json);
        let requested: Vec<&str> = ids.iter().map(String::as_str).collect();
        let removing = graph.removal_set(&requested);
        for id in &ids {
            let dependents: Vec<String> = graph
                .dependents_of(id)
                .into_iter()
                .filter(|d| !removing.contains(*d))
                .map(str::to_string)
                .collect();
            if !dependents.is_empty() {
                return Err(Error::PluginRequired {
                    id: id.clone(),
                    dependents,
                });
            }
        }

        let payload = options.payload(&ids);
        self.hooks.fire(HookEvent::BeforePluginRm, &payload).await?;

        let order = graph.removal_order(&removing);
        tracing::debug!(?order, "plugin removal order");

        let platforms = self.project.installed_platforms()?;
        for id in &order {
            for platform in &platforms {
                let api = self.platform_api(platform)?;
                api.remove_plugin(id, &self.events).await?;
            }
            let dir = self.project.plugin_dir(id);
            if dir.exists() {
                std::fs::remove_dir_all(&dir).map_err(|e| Error::io(&dir, e))?;
            }
            fetch_json.remove(id);
            fetch_json.save()?;
            self.events.info(format!("Removed plugin {id}"));
        }

        if self.should_save(options.save) {
            let (mut config, mut package) = self.load_documents()?;
            for id in &order {
                config.remove_plugin(id)?;
            }
            config.write()?;
            if let Some(package) = package.as_mut() {
                for id in &order {
                    package.remove_plugin(id);
                    package.remove_dependency(id);
                }
                package.save()?;
            }
        }

        self.hooks.fire(HookEvent::AfterPluginRm, &payload).await?;
        Ok(())
    }

    /// Installed plugins, by id. Directories under `plugins/` missing from
    /// `fetch.json` are listed as top-level.
    pub fn plugin_list(&self) -> Result<Vec<InstalledPlugin>> {
        let fetch_json = FetchJson::load(&self.project)?;
        let mut ids: Vec<String> = fetch_json.iter().map(|(id, _)| id.to_string()).collect();
        for dir in self.project.installed_plugin_dirs()? {
            if !ids.contains(&dir) {
                ids.push(dir);
            }
        }
        ids.sort();

        let plugins = ids
            .into_iter()
            .map(|id| {
                let xml = PluginXml::load(&self.project.plugin_dir(&id)).ok();
                InstalledPlugin {
                    version: xml.as_ref().and_then(|x| x.version.clone()),
                    name: xml.and_then(|x| x.name),
                    is_top_level: fetch_json.get(&id).is_none_or(|r| r.is_top_level),
                    id,
                }
            })
            .collect();
        Ok(plugins)
    }
}
