use cordova_spec::platforms::KNOWN_PLATFORMS;

use crate::cordova::Cordova;
use crate::error::Result;
use crate::metadata::PlatformsJson;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledPlatform {
    pub name: String,
    /// From `platforms.json`, when recorded
    pub version: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvailablePlatform {
    pub name: String,
    pub spec: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlatformListing {
    pub installed: Vec<InstalledPlatform>,
    /// Known platforms that can be built on this host and are not installed
    pub available: Vec<AvailablePlatform>,
}

impl Cordova {
    pub fn platform_list(&self) -> Result<PlatformListing> {
        let platforms_json = PlatformsJson::load(&self.project)?;
        let installed: Vec<InstalledPlatform> = self
            .project
            .installed_platforms()?
            .into_iter()
            .map(|name| InstalledPlatform {
                version: platforms_json.get(&name).map(str::to_string),
                name,
            })
            .collect();

        let available = KNOWN_PLATFORMS
            .iter()
            .filter(|p| cordova_spec::supports_host(p.name, &self.host_os))
            .filter(|p| !installed.iter().any(|i| i.name == p.name))
            .map(|p| AvailablePlatform {
                name: p.name.to_string(),
                spec: self.pinned.get(p.name).unwrap_or(p.pinned).to_string(),
            })
            .collect();

        Ok(PlatformListing {
            installed,
            available,
        })
    }
}
