//! `name@spec` command targets.

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

use crate::error::{Error, Result};

/// `cordova-<name>` package naming, with an optional npm scope.
static PLATFORM_PACKAGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:@[^/]+/)?cordova-([a-z0-9][a-z0-9._-]*)$").unwrap());

/// A platform or plugin argument split into its name and optional spec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub name: String,
    pub spec: Option<String>,
}

impl Target {
    /// Split `name@spec`.
    ///
    /// A leading `@` belongs to an npm scope, so `@scope/pkg@1.0.0` splits
    /// into `@scope/pkg` and `1.0.0`. An empty spec after `@` counts as none.
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        let search_from = usize::from(raw.starts_with('@'));
        let (name, spec) = match raw[search_from..].find('@') {
            Some(at) => {
                let at = at + search_from;
                (&raw[..at], Some(&raw[at + 1..]))
            }
            None => (raw, None),
        };
        if name.is_empty() || (name.starts_with('@') && !name.contains('/')) {
            return Err(Error::InvalidTarget(raw.to_string()));
        }
        Ok(Self {
            name: name.to_string(),
            spec: spec.filter(|s| !s.is_empty()).map(str::to_string),
        })
    }

    /// `name@spec`, or just `name`.
    pub fn display_target(&self) -> String {
        match &self.spec {
            Some(spec) => format!("{}@{}", self.name, spec),
            None => self.name.clone(),
        }
    }
}

/// Platform name from an npm package name: `cordova-android` and
/// `@scope/cordova-android` give `android`. Other names are returned as is.
pub fn platform_name_from_package(package: &str) -> String {
    PLATFORM_PACKAGE
        .captures(package)
        .and_then(|caps| caps.get(1))
        .map_or_else(|| package.to_string(), |m| m.as_str().to_string())
}

/// Platform name guessed from a git or tarball URL's last path segment.
///
/// `https://github.com/apache/cordova-android.git#12.0.0` gives `android`.
pub fn name_from_url(url: &str) -> Option<String> {
    let last = match Url::parse(url) {
        Ok(parsed) => parsed
            .path_segments()?
            .filter(|s| !s.is_empty())
            .next_back()?
            .to_string(),
        // scp-like git remotes: `git@host:owner/repo.git`
        Err(_) => url
            .split('#')
            .next()
            .unwrap_or(url)
            .trim_end_matches('/')
            .rsplit(['/', ':'])
            .next()?
            .to_string(),
    };
    let segment = last.as_str();
    let segment = segment
        .strip_suffix(".git")
        .or_else(|| segment.strip_suffix(".tgz"))
        .or_else(|| segment.strip_suffix(".tar.gz"))
        .unwrap_or(segment);
    if segment.is_empty() {
        return None;
    }
    Some(platform_name_from_package(segment))
}
