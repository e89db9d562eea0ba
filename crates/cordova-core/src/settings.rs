//! Project-level settings in `.cordova/config.json`.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectSettings {
    /// Persist platform and plugin changes even without `--save`
    #[serde(default)]
    pub autosave: bool,
}

impl ProjectSettings {
    /// Read `path`; a missing file gives the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(Error::io(path, e)),
        };
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_str(&content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cordova_test_utils::TestProject;

    #[test]
    fn missing_file_means_defaults() {
        let test = TestProject::new();
        let settings = ProjectSettings::load(&test.path(".cordova/config.json")).unwrap();
        assert!(!settings.autosave);
    }

    #[test]
    fn reads_autosave() {
        let test = TestProject::new().with_file(".cordova/config.json", r#"{"autosave": true}"#);
        let settings = ProjectSettings::load(&test.path(".cordova/config.json")).unwrap();
        assert!(settings.autosave);
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let test =
            TestProject::new().with_file(".cordova/config.json", r#"{"lib": {}, "browserify": false}"#);
        let settings = ProjectSettings::load(&test.path(".cordova/config.json")).unwrap();
        assert_eq!(settings, ProjectSettings::default());
    }

    #[test]
    fn malformed_file_is_an_error() {
        let test = TestProject::new().with_file(".cordova/config.json", "{");
        assert!(ProjectSettings::load(&test.path(".cordova/config.json")).is_err());
    }
}
