//! Installation records: `platforms/platforms.json` and `plugins/fetch.json`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use cordova_config::Variables;
use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;

use crate::error::{Error, Result};
use crate::project::Project;

fn load_json<T: DeserializeOwned + Default>(path: &Path) -> Result<T> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(T::default()),
        Err(e) => return Err(Error::io(path, e)),
    };
    if content.trim().is_empty() {
        return Ok(T::default());
    }
    Ok(serde_json::from_str(&content)?)
}

fn save_json<T: Serialize>(path: &Path, value: &T) -> Result<bool> {
    let mut content = serde_json::to_string_pretty(value)?;
    content.push('\n');
    Ok(cordova_fs::write_if_changed(path, &content)?)
}

/// Installed platform versions, by platform name
#[derive(Debug, Clone)]
pub struct PlatformsJson {
    path: PathBuf,
    versions: BTreeMap<String, String>,
}

impl PlatformsJson {
    pub const FILE_NAME: &'static str = "platforms.json";

    pub fn load(project: &Project) -> Result<Self> {
        let path = project.platforms_dir().join(Self::FILE_NAME);
        let versions = load_json(&path)?;
        Ok(Self { path, versions })
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.versions.get(name).map(String::as_str)
    }

    pub fn insert(&mut self, name: &str, version: &str) {
        self.versions.insert(name.to_string(), version.to_string());
    }

    pub fn remove(&mut self, name: &str) -> bool {
        self.versions.remove(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.versions.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn save(&self) -> Result<bool> {
        save_json(&self.path, &self.versions)
    }
}

/// Where an installed plugin was fetched from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PluginSource {
    Registry { id: String },
    Local { path: PathBuf },
    Url { url: String },
}

/// One `fetch.json` entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchRecord {
    pub source: PluginSource,
    /// Installed on request rather than as another plugin's dependency
    pub is_top_level: bool,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub variables: Variables,
    /// Ids of the plugins this one depends on
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<String>,
}

/// Installed plugins, by id
#[derive(Debug, Clone)]
pub struct FetchJson {
    path: PathBuf,
    records: BTreeMap<String, FetchRecord>,
}

impl FetchJson {
    pub const FILE_NAME: &'static str = "fetch.json";

    pub fn load(project: &Project) -> Result<Self> {
        let path = project.plugins_dir().join(Self::FILE_NAME);
        let records = load_json(&path)?;
        Ok(Self { path, records })
    }

    pub fn get(&self, id: &str) -> Option<&FetchRecord> {
        self.records.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut FetchRecord> {
        self.records.get_mut(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.records.contains_key(id)
    }

    pub fn insert(&mut self, id: &str, record: FetchRecord) {
        self.records.insert(id.to_string(), record);
    }

    pub fn remove(&mut self, id: &str) -> Option<FetchRecord> {
        self.records.remove(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FetchRecord)> {
        self.records.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn save(&self) -> Result<bool> {
        save_json(&self.path, &self.records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cordova_test_utils::TestProject;
    use pretty_assertions::assert_eq;

    #[test]
    fn platforms_json_round_trips() {
        let test = TestProject::new();
        let project = Project::new(test.root());

        let mut platforms = PlatformsJson::load(&project).unwrap();
        assert_eq!(platforms.iter().count(), 0);
        platforms.insert("ios", "7.1.0");
        platforms.insert("android", "13.0.0");
        assert!(platforms.save().unwrap());
        assert!(!platforms.save().unwrap());

        let reloaded = PlatformsJson::load(&project).unwrap();
        assert_eq!(reloaded.get("android"), Some("13.0.0"));
        assert_eq!(
            test.read_file("platforms/platforms.json"),
            "{\n  \"android\": \"13.0.0\",\n  \"ios\": \"7.1.0\"\n}\n"
        );
    }

    #[test]
    fn fetch_json_reads_sources() {
        let test = TestProject::new().with_file(
            "plugins/fetch.json",
            r#"{
  "cordova-plugin-camera": {
    "source": { "type": "registry", "id": "cordova-plugin-camera@6.0.0" },
    "is_top_level": true,
    "variables": { "CAMERA_USAGE": "photos" },
    "dependencies": ["cordova-plugin-file"]
  },
  "cordova-plugin-file": {
    "source": { "type": "local", "path": "/src/file" },
    "is_top_level": false
  }
}"#,
        );
        let fetch = FetchJson::load(&Project::new(test.root())).unwrap();

        let camera = fetch.get("cordova-plugin-camera").unwrap();
        assert!(camera.is_top_level);
        assert_eq!(camera.dependencies, vec!["cordova-plugin-file"]);
        assert_eq!(camera.variables["CAMERA_USAGE"], "photos");
        assert_eq!(
            fetch.get("cordova-plugin-file").unwrap().source,
            PluginSource::Local {
                path: PathBuf::from("/src/file")
            }
        );
    }
}
