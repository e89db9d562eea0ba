//! [`TestProject`] builder for orchestrator test scenarios.

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tempfile::TempDir;

/// A point in time `secs` seconds before now.
pub fn seconds_ago(secs: u64) -> SystemTime {
    SystemTime::now() - Duration::from_secs(secs)
}

/// A temporary project directory.
///
/// # Example
///
/// ```rust,no_run
/// use cordova_test_utils::TestProject;
///
/// let project = TestProject::new()
///     .with_config_xml(&[("android", Some("^12.0.0"))], &[])
///     .with_www();
/// project.assert_exists("config.xml");
/// ```
pub struct TestProject {
    temp_dir: TempDir,
}

impl Default for TestProject {
    fn default() -> Self {
        Self::new()
    }
}

impl TestProject {
    /// Create an empty temporary directory.
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().unwrap(),
        }
    }

    /// Return the root path of the temporary directory.
    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Absolute path of `rel` inside the project.
    pub fn path(&self, rel: &str) -> PathBuf {
        self.root().join(rel)
    }

    /// Write a `config.xml` declaring the given engines and plugins.
    ///
    /// Plugins are `(name, spec, variables)` triples.
    pub fn with_config_xml(
        self,
        engines: &[(&str, Option<&str>)],
        plugins: &[(&str, Option<&str>, &[(&str, &str)])],
    ) -> Self {
        let mut xml = String::from(
            "<?xml version='1.0' encoding='utf-8'?>\n\
             <widget id=\"io.cordova.hellocordova\" version=\"1.0.0\" xmlns=\"http://www.w3.org/ns/widgets\">\n    \
             <name>HelloCordova</name>\n",
        );
        for (name, spec) in engines {
            match spec {
                Some(spec) => {
                    xml.push_str(&format!("    <engine name=\"{name}\" spec=\"{spec}\" />\n"))
                }
                None => xml.push_str(&format!("    <engine name=\"{name}\" />\n")),
            }
        }
        for (name, spec, variables) in plugins {
            let spec_attr = spec.map(|s| format!(" spec=\"{s}\"")).unwrap_or_default();
            if variables.is_empty() {
                xml.push_str(&format!("    <plugin name=\"{name}\"{spec_attr} />\n"));
            } else {
                xml.push_str(&format!("    <plugin name=\"{name}\"{spec_attr}>\n"));
                for (var, value) in *variables {
                    xml.push_str(&format!(
                        "        <variable name=\"{var}\" value=\"{value}\" />\n"
                    ));
                }
                xml.push_str("    </plugin>\n");
            }
        }
        xml.push_str("</widget>\n");
        self.with_file("config.xml", &xml)
    }

    /// Write `package.json` verbatim.
    pub fn with_package_json(self, content: &str) -> Self {
        self.with_file("package.json", content)
    }

    /// Create `www/index.html`.
    pub fn with_www(self) -> Self {
        self.with_file("www/index.html", "<html></html>\n")
    }

    /// Write a file (creating parents) relative to the project root.
    pub fn with_file(self, rel: &str, content: &str) -> Self {
        self.write_file(rel, content);
        self
    }

    /// Create a directory (and parents) relative to the project root.
    pub fn with_dir(self, rel: &str) -> Self {
        fs::create_dir_all(self.path(rel)).unwrap();
        self
    }

    pub fn write_file(&self, rel: &str, content: &str) {
        let path = self.path(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content)
            .unwrap_or_else(|e| panic!("TestProject: failed to write {}: {e}", path.display()));
    }

    pub fn read_file(&self, rel: &str) -> String {
        let path = self.path(rel);
        fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("TestProject: failed to read {}: {e}", path.display()))
    }

    /// Pin the modification time of a file.
    pub fn set_mtime(&self, rel: &str, mtime: SystemTime) {
        let file = File::options().write(true).open(self.path(rel)).unwrap();
        file.set_modified(mtime).unwrap();
    }

    pub fn mtime(&self, rel: &str) -> SystemTime {
        fs::metadata(self.path(rel)).unwrap().modified().unwrap()
    }

    /// Assert that `rel` exists.
    ///
    /// # Panics
    /// Panics with a descriptive message if the path does not exist.
    pub fn assert_exists(&self, rel: &str) {
        let full_path = self.path(rel);
        assert!(
            full_path.exists(),
            "Expected path to exist: {}",
            full_path.display()
        );
    }

    /// Assert that `rel` does **not** exist.
    pub fn assert_not_exists(&self, rel: &str) {
        let full_path = self.path(rel);
        assert!(
            !full_path.exists(),
            "Expected path NOT to exist: {}",
            full_path.display()
        );
    }
}
