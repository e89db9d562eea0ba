//! Platforms known to the tool and their pinned default versions.

use std::collections::BTreeMap;

/// A platform the tool ships a default spec for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KnownPlatform {
    pub name: &'static str,
    /// Spec used when nothing else names one
    pub pinned: &'static str,
    /// Host operating systems (as in [`std::env::consts::OS`]) the platform
    /// builds on. Empty means any.
    pub hosts: &'static [&'static str],
}

pub const KNOWN_PLATFORMS: &[KnownPlatform] = &[
    KnownPlatform {
        name: "android",
        pinned: "^13.0.0",
        hosts: &[],
    },
    KnownPlatform {
        name: "browser",
        pinned: "^7.0.0",
        hosts: &[],
    },
    KnownPlatform {
        name: "electron",
        pinned: "^4.0.0",
        hosts: &[],
    },
    KnownPlatform {
        name: "ios",
        pinned: "^7.1.1",
        hosts: &["macos"],
    },
    KnownPlatform {
        name: "osx",
        pinned: "^7.0.0",
        hosts: &["macos"],
    },
    KnownPlatform {
        name: "windows",
        pinned: "^8.0.0",
        hosts: &["windows"],
    },
];

pub fn known_platform(name: &str) -> Option<&'static KnownPlatform> {
    KNOWN_PLATFORMS.iter().find(|p| p.name == name)
}

/// Whether `platform` can be built on `host_os`. Unknown platforms are
/// assumed to build anywhere.
pub fn supports_host(platform: &str, host_os: &str) -> bool {
    known_platform(platform).is_none_or(|p| p.hosts.is_empty() || p.hosts.contains(&host_os))
}

/// Pinned default specs, by platform name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PinnedVersions {
    specs: BTreeMap<String, String>,
}

impl Default for PinnedVersions {
    fn default() -> Self {
        Self {
            specs: KNOWN_PLATFORMS
                .iter()
                .map(|p| (p.name.to_string(), p.pinned.to_string()))
                .collect(),
        }
    }
}

impl PinnedVersions {
    /// No pinned versions at all.
    pub fn empty() -> Self {
        Self {
            specs: BTreeMap::new(),
        }
    }

    /// Override or add the pinned spec of `name`.
    pub fn with(mut self, name: &str, spec: &str) -> Self {
        self.specs.insert(name.to_string(), spec.to_string());
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.specs.get(name).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.specs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}
