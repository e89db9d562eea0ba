//! Spec classification.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use semver::Version;
use url::Url;

use crate::range::NpmRange;

/// scp-style git remote: `user@host.tld:owner/repo.git`. The host needs a
/// dot so npm aliases like `name@npm:pkg` stay package specs.
static SCP_REMOTE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\w.-]+@[\w-]+(?:\.[\w-]+)+:[^/:\s][^\s]*$").unwrap());

/// What kind of thing a spec string names.
///
/// Checked in declaration order: the first kind that fits wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecKind {
    /// An existing local directory
    LocalPath(PathBuf),
    Url(Url),
    /// scp-style git remote, which URL syntax cannot express
    GitRemote(String),
    /// A single exact version
    Version(Version),
    Range(NpmRange),
    /// Anything else, handed to the fetcher unchanged (npm package name,
    /// dist-tag, git shorthand)
    Fetch(String),
}

impl SpecKind {
    pub fn is_version(&self) -> bool {
        matches!(self, Self::Version(_))
    }

    /// Version or range: something that selects from a registry.
    pub fn is_semver(&self) -> bool {
        matches!(self, Self::Version(_) | Self::Range(_))
    }

    /// URL, git remote or local directory: the spec itself is the fetch
    /// target.
    pub fn is_location(&self) -> bool {
        matches!(self, Self::LocalPath(_) | Self::Url(_) | Self::GitRemote(_))
    }
}

/// Parse an exact version, accepting a leading `v` or `=` and surrounding
/// whitespace.
pub fn parse_version(spec: &str) -> Option<Version> {
    let trimmed = spec.trim();
    let trimmed = trimmed.strip_prefix('=').unwrap_or(trimmed);
    let trimmed = trimmed
        .strip_prefix('v')
        .or_else(|| trimmed.strip_prefix('V'))
        .unwrap_or(trimmed);
    Version::parse(trimmed.trim()).ok()
}

/// Classify `spec`. Relative paths are resolved against `cwd`.
pub fn classify(spec: &str, cwd: &Path) -> SpecKind {
    let path_spec = spec.strip_prefix("file:").unwrap_or(spec);
    let candidate = cwd.join(path_spec);
    if !path_spec.is_empty() && candidate.is_dir() {
        return SpecKind::LocalPath(candidate);
    }
    if let Some(url) = parse_url(spec) {
        return SpecKind::Url(url);
    }
    if SCP_REMOTE.is_match(spec.trim()) {
        return SpecKind::GitRemote(spec.trim().to_string());
    }
    if let Some(version) = parse_version(spec) {
        return SpecKind::Version(version);
    }
    match NpmRange::parse(spec) {
        Ok(range) if !spec.trim().is_empty() => SpecKind::Range(range),
        _ => SpecKind::Fetch(spec.to_string()),
    }
}

/// URL syntax: a scheme of at least two characters (so a Windows drive letter
/// does not count) followed by something.
fn parse_url(spec: &str) -> Option<Url> {
    let url = Url::parse(spec).ok()?;
    (url.scheme().len() > 1).then_some(url)
}

/// The spec to write back after a successful install.
///
/// A bare version becomes `~<version>` so a later restore accepts patch
/// releases; every other spec is kept verbatim.
pub fn persisted_spec(spec: &str, cwd: &Path) -> String {
    match classify(spec, cwd) {
        SpecKind::Version(version) => format!("~{version}"),
        _ => spec.to_string(),
    }
}
