//! The project's `package.json`

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::format::{TextStyle, render_json};

/// Plugin variable name to value
pub type Variables = BTreeMap<String, String>;

const DEPENDENCY_TABLES: [&str; 2] = ["dependencies", "devDependencies"];

/// Package descriptor with format-preserving save.
///
/// Mutators return `true` when they changed something. [`save`](Self::save)
/// only touches the file after such a change, so an untouched descriptor keeps
/// its exact bytes.
#[derive(Debug, Clone)]
pub struct PackageDescriptor {
    path: PathBuf,
    root: Map<String, Value>,
    style: TextStyle,
    dirty: bool,
}

impl PackageDescriptor {
    pub const FILE_NAME: &'static str = "package.json";

    /// Load `path`, or `None` when there is no such file.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        if !path.is_file() {
            return Ok(None);
        }
        let source = cordova_fs::read_text(path)?;
        Self::parse(path, &source).map(Some)
    }

    pub fn parse(path: &Path, source: &str) -> Result<Self> {
        let value: Value =
            serde_json::from_str(source).map_err(|e| Error::parse("JSON", path, e))?;
        let Value::Object(root) = value else {
            return Err(Error::parse("JSON", path, "root must be an object"));
        };
        Ok(Self {
            path: path.to_path_buf(),
            root,
            style: TextStyle::detect(source, "  "),
            dirty: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn name(&self) -> Option<&str> {
        self.root.get("name").and_then(Value::as_str)
    }

    pub fn version(&self) -> Option<&str> {
        self.root.get("version").and_then(Value::as_str)
    }

    pub fn is_modified(&self) -> bool {
        self.dirty
    }

    /// Look `key` up in `dependencies`, then `devDependencies`.
    pub fn dependency(&self, key: &str) -> Option<&str> {
        DEPENDENCY_TABLES
            .iter()
            .filter_map(|table| self.root.get(*table).and_then(Value::as_object))
            .find_map(|deps| deps.get(key).and_then(Value::as_str))
    }

    /// Spec a package of this project declares for platform `name`.
    ///
    /// `cordova-<name>` and then `<name>` are checked in `dependencies`,
    /// then both again in `devDependencies`.
    pub fn platform_spec(&self, name: &str) -> Option<&str> {
        let prefixed = format!("cordova-{name}");
        DEPENDENCY_TABLES
            .iter()
            .filter_map(|table| self.root.get(*table).and_then(Value::as_object))
            .find_map(|deps| {
                deps.get(&prefixed)
                    .or_else(|| deps.get(name))
                    .and_then(Value::as_str)
            })
    }

    /// Add `key: spec` to `devDependencies` unless either table already
    /// declares `key`.
    pub fn add_dev_dependency_if_absent(&mut self, key: &str, spec: &str) -> bool {
        if self.dependency(key).is_some() {
            return false;
        }
        object_entry(&mut self.root, "devDependencies")
            .insert(key.to_string(), Value::String(spec.to_string()));
        self.dirty = true;
        true
    }

    /// Set `key: spec` in the table that already declares `key`, or in
    /// `devDependencies` when neither does.
    pub fn set_dependency(&mut self, key: &str, spec: &str) -> bool {
        if self.dependency(key) == Some(spec) {
            return false;
        }
        let table = DEPENDENCY_TABLES
            .iter()
            .find(|table| {
                self.root
                    .get(**table)
                    .and_then(Value::as_object)
                    .is_some_and(|deps| deps.contains_key(key))
            })
            .copied()
            .unwrap_or("devDependencies");
        object_entry(&mut self.root, table).insert(key.to_string(), Value::String(spec.to_string()));
        self.dirty = true;
        true
    }

    /// Remove `key` from both dependency tables.
    pub fn remove_dependency(&mut self, key: &str) -> bool {
        let mut removed = false;
        for table in DEPENDENCY_TABLES {
            if let Some(deps) = self.root.get_mut(table).and_then(Value::as_object_mut) {
                removed |= deps.shift_remove(key).is_some();
            }
        }
        self.dirty |= removed;
        removed
    }

    fn cordova(&self) -> Option<&Map<String, Value>> {
        self.root.get("cordova").and_then(Value::as_object)
    }

    /// Names in `cordova.platforms`, in file order.
    pub fn platforms(&self) -> Vec<String> {
        self.cordova()
            .and_then(|c| c.get("platforms"))
            .and_then(Value::as_array)
            .map(|list| {
                list.iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn has_platform(&self, name: &str) -> bool {
        self.platforms().iter().any(|p| p == name)
    }

    /// Append `name` to `cordova.platforms` if it is not listed yet.
    pub fn add_platform(&mut self, name: &str) -> bool {
        if self.has_platform(name) {
            return false;
        }
        let cordova = object_entry(&mut self.root, "cordova");
        let platforms = cordova
            .entry("platforms")
            .or_insert_with(|| Value::Array(Vec::new()));
        if !platforms.is_array() {
            *platforms = Value::Array(Vec::new());
        }
        if let Value::Array(list) = platforms {
            list.push(Value::String(name.to_string()));
        }
        self.dirty = true;
        true
    }

    pub fn remove_platform(&mut self, name: &str) -> bool {
        let Some(list) = self
            .root
            .get_mut("cordova")
            .and_then(Value::as_object_mut)
            .and_then(|c| c.get_mut("platforms"))
            .and_then(Value::as_array_mut)
        else {
            return false;
        };
        let before = list.len();
        list.retain(|v| v.as_str() != Some(name));
        let removed = list.len() != before;
        self.dirty |= removed;
        removed
    }

    /// Entries of `cordova.plugins`, in file order.
    pub fn plugins(&self) -> Vec<(String, Variables)> {
        self.cordova()
            .and_then(|c| c.get("plugins"))
            .and_then(Value::as_object)
            .map(|plugins| {
                plugins
                    .iter()
                    .map(|(id, vars)| (id.clone(), variables_from_value(vars)))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn plugin_variables(&self, id: &str) -> Option<Variables> {
        self.cordova()
            .and_then(|c| c.get("plugins"))
            .and_then(|p| p.get(id))
            .map(variables_from_value)
    }

    /// Set the variables of plugin `id`, adding the plugin when missing.
    pub fn set_plugin(&mut self, id: &str, variables: &Variables) -> bool {
        if self.plugin_variables(id).as_ref() == Some(variables) {
            return false;
        }
        let cordova = object_entry(&mut self.root, "cordova");
        let plugins = object_entry(cordova, "plugins");
        let vars = variables
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect();
        plugins.insert(id.to_string(), Value::Object(vars));
        self.dirty = true;
        true
    }

    pub fn remove_plugin(&mut self, id: &str) -> bool {
        let removed = self
            .root
            .get_mut("cordova")
            .and_then(Value::as_object_mut)
            .and_then(|c| c.get_mut("plugins"))
            .and_then(Value::as_object_mut)
            .is_some_and(|plugins| plugins.shift_remove(id).is_some());
        self.dirty |= removed;
        removed
    }

    /// Render the document in its original style.
    pub fn render(&self) -> Result<String> {
        render_json(&Value::Object(self.root.clone()), &self.style)
    }

    /// Write the descriptor back if it was modified. Returns `true` when the
    /// file was written.
    pub fn save(&mut self) -> Result<bool> {
        if !self.dirty {
            return Ok(false);
        }
        let written = cordova_fs::write_if_changed(&self.path, &self.render()?)?;
        self.dirty = false;
        if written {
            tracing::debug!(path = %self.path.display(), "saved package descriptor");
        }
        Ok(written)
    }
}

/// Get `map[key]` as an object, replacing a non-object value.
fn object_entry<'a>(map: &'a mut Map<String, Value>, key: &str) -> &'a mut Map<String, Value> {
    let entry = map
        .entry(key.to_string())
        .or_insert_with(|| Value::Object(Map::new()));
    if !entry.is_object() {
        *entry = Value::Object(Map::new());
    }
    match entry {
        Value::Object(obj) => obj,
        _ => unreachable!("non-object entries are replaced above"),
    }
}

fn variables_from_value(value: &Value) -> Variables {
    value
        .as_object()
        .map(|vars| {
            vars.iter()
                .map(|(k, v)| {
                    let text = match v {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    };
                    (k.clone(), text)
                })
                .collect()
        })
        .unwrap_or_default()
}
