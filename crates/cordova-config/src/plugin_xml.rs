//! A fetched plugin's `plugin.xml`

use std::path::{Path, PathBuf};

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::error::{Error, Result};

/// A `<dependency>` edge declared by a plugin
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginDependency {
    pub id: String,
    /// Version requirement, if any
    pub version: Option<String>,
    /// Git or tarball location, if any
    pub url: Option<String>,
    /// Set when declared inside `<platform name>`
    pub platform: Option<String>,
}

impl PluginDependency {
    /// The fetch target for this dependency: its URL, `id@version`, or `id`.
    pub fn fetch_target(&self) -> String {
        match (&self.url, &self.version) {
            (Some(url), _) => url.clone(),
            (None, Some(version)) => format!("{}@{}", self.id, version),
            (None, None) => self.id.clone(),
        }
    }
}

/// Parsed plugin descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginXml {
    pub path: PathBuf,
    pub id: String,
    pub version: Option<String>,
    pub name: Option<String>,
    pub dependencies: Vec<PluginDependency>,
}

impl PluginXml {
    pub const FILE_NAME: &'static str = "plugin.xml";

    /// Read `<plugin_dir>/plugin.xml`.
    pub fn load(plugin_dir: &Path) -> Result<Self> {
        let path = plugin_dir.join(Self::FILE_NAME);
        let source = cordova_fs::read_text(&path)?;
        Self::parse(&path, &source)
    }

    pub fn parse(path: &Path, source: &str) -> Result<Self> {
        let mut reader = Reader::from_str(source);
        let mut plugin: Option<PluginXml> = None;
        let mut depth = 0usize;
        let mut platform: Option<String> = None;
        let mut in_name = false;

        loop {
            let event = reader
                .read_event()
                .map_err(|e| Error::parse("XML", path, e))?;
            match event {
                Event::Start(e) => {
                    depth += 1;
                    match (depth, e.local_name().as_ref()) {
                        (1, b"plugin") => plugin = Some(Self::root(path, &e)?),
                        (2, b"platform") => platform = attr(&e, "name"),
                        (2, b"name") => in_name = true,
                        (2, b"dependency") | (3, b"dependency") => {
                            push_dependency(&mut plugin, &e, &platform, depth)
                        }
                        _ => {}
                    }
                }
                Event::Empty(e) => match (depth + 1, e.local_name().as_ref()) {
                    (1, b"plugin") => plugin = Some(Self::root(path, &e)?),
                    (2, b"dependency") | (3, b"dependency") => {
                        push_dependency(&mut plugin, &e, &platform, depth + 1)
                    }
                    _ => {}
                },
                Event::Text(text) if in_name => {
                    if let Some(plugin) = &mut plugin {
                        let value = text.unescape().map_err(|e| Error::parse("XML", path, e))?;
                        plugin.name = Some(value.trim().to_string());
                    }
                }
                Event::End(e) => {
                    match (depth, e.local_name().as_ref()) {
                        (2, b"platform") => platform = None,
                        (2, b"name") => in_name = false,
                        _ => {}
                    }
                    depth = depth.saturating_sub(1);
                }
                Event::Eof => break,
                _ => {}
            }
        }

        plugin.ok_or_else(|| Error::MissingRoot {
            path: path.to_path_buf(),
            element: "plugin",
        })
    }

    fn root(path: &Path, element: &BytesStart<'_>) -> Result<Self> {
        let id = attr(element, "id")
            .ok_or_else(|| Error::parse("XML", path, "<plugin> has no id attribute"))?;
        Ok(Self {
            path: path.to_path_buf(),
            id,
            version: attr(element, "version"),
            name: None,
            dependencies: Vec::new(),
        })
    }

    /// Dependencies that apply to `platform`, or only the platform-neutral
    /// ones when `platform` is `None`.
    pub fn dependencies_for(&self, platform: Option<&str>) -> Vec<&PluginDependency> {
        self.dependencies
            .iter()
            .filter(|d| d.platform.is_none() || d.platform.as_deref() == platform)
            .collect()
    }
}

fn push_dependency(
    plugin: &mut Option<PluginXml>,
    element: &BytesStart<'_>,
    platform: &Option<String>,
    depth: usize,
) {
    let Some(plugin) = plugin else {
        return;
    };
    // Depth 3 only counts inside <platform>
    if depth == 3 && platform.is_none() {
        return;
    }
    if let Some(id) = attr(element, "id") {
        plugin.dependencies.push(PluginDependency {
            id,
            version: attr(element, "version"),
            url: attr(element, "url"),
            platform: if depth == 3 { platform.clone() } else { None },
        });
    }
}

fn attr(element: &BytesStart<'_>, name: &str) -> Option<String> {
    element
        .try_get_attribute(name)
        .ok()
        .flatten()
        .and_then(|a| a.unescape_value().ok())
        .map(|v| v.into_owned())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<plugin xmlns="http://apache.org/cordova/ns/plugins/1.0" id="cordova-plugin-file-transfer" version="2.0.0">
    <name>File Transfer</name>
    <dependency id="cordova-plugin-file" version="^8.0.0" />
    <platform name="android">
        <dependency id="cordova-plugin-compat" url="https://github.com/apache/cordova-plugin-compat.git" />
    </platform>
</plugin>
"#;

    #[test]
    fn parses_identity_and_dependencies() {
        let plugin = PluginXml::parse(Path::new("plugin.xml"), SAMPLE).unwrap();
        assert_eq!(plugin.id, "cordova-plugin-file-transfer");
        assert_eq!(plugin.version.as_deref(), Some("2.0.0"));
        assert_eq!(plugin.name.as_deref(), Some("File Transfer"));
        assert_eq!(plugin.dependencies.len(), 2);
        assert_eq!(
            plugin.dependencies[1].platform.as_deref(),
            Some("android")
        );
    }

    #[test]
    fn dependencies_for_filters_by_platform() {
        let plugin = PluginXml::parse(Path::new("plugin.xml"), SAMPLE).unwrap();
        let ids = |p: Option<&str>| {
            plugin
                .dependencies_for(p)
                .iter()
                .map(|d| d.id.clone())
                .collect::<Vec<_>>()
        };
        assert_eq!(ids(None), vec!["cordova-plugin-file"]);
        assert_eq!(ids(Some("ios")), vec!["cordova-plugin-file"]);
        assert_eq!(
            ids(Some("android")),
            vec!["cordova-plugin-file", "cordova-plugin-compat"]
        );
    }

    #[test]
    fn fetch_target_prefers_url() {
        let plugin = PluginXml::parse(Path::new("plugin.xml"), SAMPLE).unwrap();
        assert_eq!(
            plugin.dependencies[0].fetch_target(),
            "cordova-plugin-file@^8.0.0"
        );
        assert_eq!(
            plugin.dependencies[1].fetch_target(),
            "https://github.com/apache/cordova-plugin-compat.git"
        );
    }

    #[test]
    fn missing_id_is_an_error() {
        let err = PluginXml::parse(Path::new("plugin.xml"), "<plugin version=\"1\"/>").unwrap_err();
        assert!(err.to_string().contains("no id attribute"));
    }
}
