//! Package fetching.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use cordova_spec::{SpecKind, Target, classify};
use tokio::process::Command;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Default)]
pub struct FetchOptions {
    /// Record the package in the project's `package.json`
    pub save: bool,
    /// Extra directory searched before the registry
    pub searchpath: Option<String>,
}

/// Retrieves a platform or plugin package and reports where it landed
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch `target` (`name`, `name@spec`, URL or local path) into the
    /// project at `project_root`. Returns the package directory.
    async fn fetch(&self, target: &str, project_root: &Path, options: &FetchOptions)
    -> Result<PathBuf>;
}

/// Fetches through `npm install`
#[derive(Debug, Clone)]
pub struct NpmFetcher {
    program: String,
}

impl Default for NpmFetcher {
    fn default() -> Self {
        Self {
            program: "npm".to_string(),
        }
    }
}

impl NpmFetcher {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn searchpath_candidate(target: &Target, searchpath: &str) -> Option<PathBuf> {
        searchpath
            .split([':', ';'])
            .filter(|p| !p.is_empty())
            .map(|dir| Path::new(dir).join(&target.name))
            .find(|candidate| candidate.is_dir())
    }
}

#[async_trait]
impl Fetcher for NpmFetcher {
    async fn fetch(
        &self,
        target: &str,
        project_root: &Path,
        options: &FetchOptions,
    ) -> Result<PathBuf> {
        // Local directories are used in place
        let kind = classify(target, project_root);
        if let SpecKind::LocalPath(dir) = &kind {
            tracing::debug!(target_dir = %dir.display(), "using local package");
            return Ok(dir.clone());
        }

        // Locations carry no package name to split off
        let parsed = if kind.is_location() {
            None
        } else {
            Target::parse(target).ok()
        };
        if let (Some(parsed), Some(searchpath)) = (&parsed, &options.searchpath)
            && let Some(dir) = Self::searchpath_candidate(parsed, searchpath)
        {
            tracing::debug!(target_dir = %dir.display(), "found package on searchpath");
            return Ok(dir);
        }

        let modules = project_root.join("node_modules");
        let before = installed_packages(&modules)?;

        let mut cmd = Command::new(&self.program);
        cmd.arg("install")
            .arg(if options.save { "--save-dev" } else { "--no-save" })
            .arg(target)
            .current_dir(project_root);

        tracing::debug!(program = %self.program, package = target, "fetching");
        let output = cmd.output().await.map_err(|e| Error::Spawn {
            program: self.program.clone(),
            source: e,
        })?;
        if !output.status.success() {
            return Err(Error::CommandFailed {
                program: format!("{} install {target}", self.program),
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let after = installed_packages(&modules)?;
        let mut added = after.difference(&before);
        let name = match (added.next(), added.next()) {
            (Some(only), None) => only.clone(),
            // Already present, or several packages landed: fall back to the
            // name in the target
            _ => match parsed {
                Some(parsed) => parsed.name,
                _ => {
                    return Err(Error::UnnamedTarget {
                        kind: "package",
                        target: target.to_string(),
                    });
                }
            },
        };
        Ok(modules.join(name))
    }
}

/// Package names under `node_modules`, scoped ones as `@scope/name`
fn installed_packages(modules: &Path) -> Result<BTreeSet<String>> {
    let mut names = BTreeSet::new();
    let entries = match std::fs::read_dir(modules) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(names),
        Err(e) => return Err(Error::io(modules, e)),
    };
    for entry in entries {
        let entry = entry.map_err(|e| Error::io(modules, e))?;
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            continue;
        };
        if name.starts_with('.') {
            continue;
        }
        if name.starts_with('@') {
            let scope_dir = entry.path();
            let scoped = std::fs::read_dir(&scope_dir).map_err(|e| Error::io(&scope_dir, e))?;
            for inner in scoped {
                let inner = inner.map_err(|e| Error::io(&scope_dir, e))?;
                if let Some(pkg) = inner.file_name().to_str() {
                    names.insert(format!("{name}/{pkg}"));
                }
            }
        } else {
            names.insert(name);
        }
    }
    Ok(names)
}
