//! Plugin metadata lookup for version negotiation.

use std::collections::BTreeMap;

use async_trait::async_trait;
use cordova_spec::RegistryInfo;
use serde::Deserialize;
use serde_json::Value;
use tokio::process::Command;

use crate::error::{Error, Result};

#[async_trait]
pub trait PluginRegistry: Send + Sync {
    /// Published versions and engine requirements of `id`, or `None` when
    /// the registry knows nothing about it.
    async fn info(&self, id: &str) -> Result<Option<RegistryInfo>>;
}

/// A registry that knows nothing. Plugins without a declared spec are then
/// fetched at their latest version.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRegistry;

#[async_trait]
impl PluginRegistry for NoRegistry {
    async fn info(&self, _id: &str) -> Result<Option<RegistryInfo>> {
        Ok(None)
    }
}

/// Queries `npm view <id> --json`
#[derive(Debug, Clone)]
pub struct NpmRegistry {
    program: String,
}

impl Default for NpmRegistry {
    fn default() -> Self {
        Self {
            program: "npm".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct NpmView {
    name: String,
    #[serde(default)]
    versions: Versions,
    #[serde(default)]
    engines: Option<Engines>,
}

/// `npm view` prints a lone version as a string
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Versions {
    Many(Vec<String>),
    One(String),
}

impl Default for Versions {
    fn default() -> Self {
        Self::Many(Vec::new())
    }
}

#[derive(Debug, Deserialize)]
struct Engines {
    #[serde(default, rename = "cordovaDependencies")]
    cordova_dependencies: BTreeMap<String, Value>,
}

impl NpmRegistry {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn parse_view(json: &str) -> Result<RegistryInfo> {
        let view: NpmView = serde_json::from_str(json)?;
        let versions = match view.versions {
            Versions::Many(versions) => versions,
            Versions::One(version) => vec![version],
        };
        Ok(RegistryInfo {
            name: view.name,
            versions,
            cordova_dependencies: view
                .engines
                .map(|e| e.cordova_dependencies)
                .unwrap_or_default(),
        })
    }
}

#[async_trait]
impl PluginRegistry for NpmRegistry {
    async fn info(&self, id: &str) -> Result<Option<RegistryInfo>> {
        let output = Command::new(&self.program)
            .args(["view", id, "name", "versions", "engines", "--json"])
            .output()
            .await
            .map_err(|e| Error::Spawn {
                program: self.program.clone(),
                source: e,
            })?;
        if !output.status.success() {
            tracing::debug!(
                plugin = id,
                stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                "registry lookup failed"
            );
            return Ok(None);
        }
        let stdout = String::from_utf8_lossy(&output.stdout);
        if stdout.trim().is_empty() {
            return Ok(None);
        }
        Self::parse_view(&stdout).map(Some)
    }
}
