//! Project layout.

use std::fs;
use std::path::{Path, PathBuf};

use cordova_config::{ConfigParser, PackageDescriptor};

use crate::error::{Error, Result};

/// A Cordova project rooted at the directory holding `config.xml` and `www/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    root: PathBuf,
}

impl Project {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Find the project containing `start`: the nearest ancestor (or `start`
    /// itself) with both `config.xml` and a `www` directory.
    pub fn find(start: &Path) -> Result<Self> {
        start
            .ancestors()
            .find(|dir| Self::is_project_root(dir))
            .map(Self::new)
            .ok_or_else(|| Error::NotAProject {
                path: start.to_path_buf(),
            })
    }

    pub fn is_project_root(dir: &Path) -> bool {
        dir.join(ConfigParser::FILE_NAME).is_file() && dir.join("www").is_dir()
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_xml_path(&self) -> PathBuf {
        self.root.join(ConfigParser::FILE_NAME)
    }

    pub fn package_json_path(&self) -> PathBuf {
        self.root.join(PackageDescriptor::FILE_NAME)
    }

    pub fn www_dir(&self) -> PathBuf {
        self.root.join("www")
    }

    pub fn platforms_dir(&self) -> PathBuf {
        self.root.join("platforms")
    }

    pub fn platform_dir(&self, name: &str) -> PathBuf {
        self.platforms_dir().join(name)
    }

    pub fn plugins_dir(&self) -> PathBuf {
        self.root.join("plugins")
    }

    pub fn plugin_dir(&self, id: &str) -> PathBuf {
        self.plugins_dir().join(id)
    }

    /// `merges/<platform>`: per-platform overrides of `www`
    pub fn merges_dir(&self, platform: &str) -> PathBuf {
        self.root.join("merges").join(platform)
    }

    pub fn hooks_dir(&self, event: &str) -> PathBuf {
        self.root.join("hooks").join(event)
    }

    pub fn settings_path(&self) -> PathBuf {
        self.root.join(".cordova").join("config.json")
    }

    pub fn load_config(&self) -> Result<ConfigParser> {
        Ok(ConfigParser::load(&self.config_xml_path())?)
    }

    /// `package.json`, or `None` when the project has none
    pub fn load_package(&self) -> Result<Option<PackageDescriptor>> {
        Ok(PackageDescriptor::load(&self.package_json_path())?)
    }

    pub fn is_platform_installed(&self, name: &str) -> bool {
        self.platform_dir(name).is_dir()
    }

    /// Platform directories present under `platforms/`, sorted by name
    pub fn installed_platforms(&self) -> Result<Vec<String>> {
        sorted_subdirs(&self.platforms_dir())
    }

    /// Plugin directories present under `plugins/`, sorted by id
    pub fn installed_plugin_dirs(&self) -> Result<Vec<String>> {
        sorted_subdirs(&self.plugins_dir())
    }

    /// `path` relative to the project root when it lies inside it
    pub fn relative<'a>(&self, path: &'a Path) -> &'a Path {
        path.strip_prefix(&self.root).unwrap_or(path)
    }
}

fn sorted_subdirs(dir: &Path) -> Result<Vec<String>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(Error::io(dir, e)),
    };
    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| Error::io(dir, e))?;
        if entry.path().is_dir()
            && let Some(name) = entry.file_name().to_str()
            && !name.starts_with('.')
        {
            names.push(name.to_string());
        }
    }
    names.sort();
    Ok(names)
}
