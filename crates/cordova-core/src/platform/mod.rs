//! Platform lifecycle: add, remove, update and list.

mod add;
mod list;
mod remove;
mod update;

use cordova_config::{ConfigParser, PackageDescriptor};

pub use list::{AvailablePlatform, InstalledPlatform, PlatformListing};

use crate::error::Result;
use crate::fetch::FetchOptions;
use crate::hooks::HookPayload;

#[derive(Debug, Clone, Default)]
pub struct PlatformOptions {
    /// Write the result back to `config.xml` and `package.json`
    pub save: bool,
    /// Extra directory searched for packages before the registry
    pub searchpath: Option<String>,
    /// Installing what the project already declares
    pub restoring: bool,
}

impl PlatformOptions {
    pub(crate) fn payload(&self, platforms: &[String]) -> HookPayload {
        HookPayload {
            platforms: platforms.to_vec(),
            plugins: Vec::new(),
            searchpath: self.searchpath.clone(),
            save: self.save,
            restoring: self.restoring,
        }
    }

    pub(crate) fn fetch_options(&self) -> FetchOptions {
        FetchOptions {
            save: false,
            searchpath: self.searchpath.clone(),
        }
    }
}

/// npm package name of a platform: `android` is `cordova-android`
pub fn package_key(name: &str) -> String {
    if name.starts_with("cordova-") || name.starts_with('@') {
        name.to_string()
    } else {
        format!("cordova-{name}")
    }
}

/// Targets with blank entries dropped
pub(crate) fn non_blank(targets: &[String]) -> Vec<String> {
    targets
        .iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// A platform whose install succeeded, with the spec to write back
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct StagedPlatform {
    pub name: String,
    pub spec: Option<String>,
}

/// Write installed platforms back to the project documents.
///
/// With `keep_declared`, platforms `config.xml` already declares keep their
/// engine entry and existing `package.json` specs are left alone.
pub(crate) fn persist_platforms(
    config: &mut ConfigParser,
    package: Option<&mut PackageDescriptor>,
    staged: &[StagedPlatform],
    keep_declared: bool,
) -> Result<()> {
    for platform in staged {
        let declared = config.engines().iter().any(|e| e.name == platform.name);
        if keep_declared && declared {
            continue;
        }
        config.remove_engine(&platform.name)?;
        config.add_engine(&platform.name, platform.spec.as_deref())?;
    }
    config.write()?;

    if let Some(package) = package {
        for platform in staged {
            package.add_platform(&platform.name);
            if let Some(spec) = &platform.spec {
                let key = package_key(&platform.name);
                if keep_declared {
                    package.add_dev_dependency_if_absent(&key, spec);
                } else {
                    package.set_dependency(&key, spec);
                }
            }
        }
        package.save()?;
    }
    Ok(())
}
