//! Plugin version negotiation against a project's installed versions.
//!
//! Plugins publish `engines.cordovaDependencies`, a map from a version key to
//! the requirements that apply from that key on:
//!
//! ```json
//! {
//!   "1.0.0": { "cordova-android": ">=6.0.0" },
//!   "2.0.0": { "cordova": ">=8.0.0", "cordova-plugin-file": "^6.0.0" },
//!   "<3.0.0": { "cordova-ios": "<7.0.0" }
//! }
//! ```
//!
//! A single-version key applies to every release from that version up to the
//! next single-version key. An upper-bound key (`<x.y.z`) applies to every
//! release below the bound; of several, only the tightest applies. The
//! selected release is the highest non-pre-release whose requirements are
//! all met by the project.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use semver::Version;
use serde::Deserialize;
use serde_json::Value;

use crate::range::NpmRange;
use crate::version::parse_version;

static UPPER_BOUND: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^<\d+\.\d+\.\d+$").unwrap());

/// What the registry publishes about a plugin
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RegistryInfo {
    pub name: String,
    #[serde(default)]
    pub versions: Vec<String>,
    /// `engines.cordovaDependencies`; values are kept raw so malformed
    /// entries can be skipped
    #[serde(default, rename = "cordovaDependencies")]
    pub cordova_dependencies: BTreeMap<String, Value>,
}

/// Installed versions in the current project.
///
/// Keys follow requirement naming: `cordova` for the tool,
/// `cordova-<platform>` for platforms, plugin ids for plugins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstalledVersions {
    versions: BTreeMap<String, Version>,
}

impl InstalledVersions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cordova(mut self, version: &str) -> Self {
        self.insert("cordova", version);
        self
    }

    pub fn with_platform(mut self, platform: &str, version: &str) -> Self {
        self.insert(&format!("cordova-{platform}"), version);
        self
    }

    pub fn with_plugin(mut self, id: &str, version: &str) -> Self {
        self.insert(id, version);
        self
    }

    /// Record `version` under `key`. Non-semver versions (git or path
    /// installs) are ignored.
    pub fn insert(&mut self, key: &str, version: &str) {
        if let Some(v) = parse_version(version) {
            self.versions.insert(key.to_string(), v);
        }
    }

    pub fn get(&self, key: &str) -> Option<&Version> {
        self.versions.get(key)
    }
}

/// A requirement the project does not meet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnmetRequirement {
    pub dependency: String,
    pub installed: Version,
    pub required: String,
}

impl fmt::Display for UnmetRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({} in project, {} required)",
            self.dependency, self.installed, self.required
        )
    }
}

/// Outcome of [`negotiate`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Negotiation {
    /// Highest compatible release, `None` when nothing fits
    pub selected: Option<Version>,
    /// Highest published release
    pub latest: Option<Version>,
    /// Requirements of the latest release the project misses
    pub unmet: Vec<UnmetRequirement>,
}

impl Negotiation {
    /// A compatible release exists but is older than the latest one.
    pub fn is_downgrade(&self) -> bool {
        matches!((&self.selected, &self.latest), (Some(s), Some(l)) if s < l)
    }
}

type Requirements = Vec<(String, NpmRange)>;

/// Pick the highest release of `info` whose requirements `installed` meets.
pub fn negotiate(info: &RegistryInfo, installed: &InstalledVersions) -> Negotiation {
    let mut releases: Vec<Version> = info
        .versions
        .iter()
        .filter_map(|v| Version::parse(v).ok())
        .filter(|v| v.pre.is_empty())
        .collect();
    releases.sort();
    releases.dedup();

    let Some(latest) = releases.last().cloned() else {
        return Negotiation::default();
    };

    let mut lower_bounds: Vec<(Version, Requirements)> = Vec::new();
    let mut upper_bounds: Vec<(Version, Requirements)> = Vec::new();

    for (key, value) in &info.cordova_dependencies {
        let Some(reqs) = requirements(&info.name, key, value) else {
            continue;
        };
        if let Some(version) = parse_version(key) {
            if version > latest {
                tracing::debug!(plugin = %info.name, key, "ignoring requirement key above latest release");
                continue;
            }
            lower_bounds.push((version, reqs));
            continue;
        }
        let compact: String = key.split_whitespace().collect();
        match compact.strip_prefix('<').and_then(parse_version) {
            Some(bound) if UPPER_BOUND.is_match(&compact) => upper_bounds.push((bound, reqs)),
            _ => tracing::debug!(
                plugin = %info.name,
                key,
                "ignoring requirement key: must be a single version or an upper bound"
            ),
        }
    }
    lower_bounds.push((Version::new(0, 0, 0), Vec::new()));
    lower_bounds.sort_by(|a, b| a.0.cmp(&b.0));
    upper_bounds.sort_by(|a, b| a.0.cmp(&b.0));

    let requirements_of = |release: &Version| -> Vec<&(String, NpmRange)> {
        let segment = lower_bounds
            .iter()
            .rev()
            .find(|(from, _)| from <= release)
            .map(|(_, reqs)| reqs.iter());
        let bound = upper_bounds
            .iter()
            .find(|(below, _)| release < below)
            .map(|(_, reqs)| reqs.iter());
        segment
            .into_iter()
            .flatten()
            .chain(bound.into_iter().flatten())
            .collect()
    };

    let unmet_for = |release: &Version| -> Vec<UnmetRequirement> {
        requirements_of(release)
            .into_iter()
            .filter_map(|(dependency, range)| {
                let have = installed.get(dependency)?;
                (!range.matches(have)).then(|| UnmetRequirement {
                    dependency: dependency.clone(),
                    installed: have.clone(),
                    required: range.to_string(),
                })
            })
            .collect()
    };

    let selected = releases
        .iter()
        .rev()
        .find(|release| unmet_for(release).is_empty())
        .cloned();
    let unmet = if selected.as_ref() == Some(&latest) {
        Vec::new()
    } else {
        unmet_for(&latest)
    };

    tracing::debug!(
        plugin = %info.name,
        latest = %latest,
        selected = ?selected.as_ref().map(ToString::to_string),
        "negotiated plugin version"
    );
    Negotiation {
        selected,
        latest: Some(latest),
        unmet,
    }
}

/// Requirement map under one key. Non-object values and unparsable ranges
/// are skipped.
fn requirements(plugin: &str, key: &str, value: &Value) -> Option<Requirements> {
    let Some(map) = value.as_object() else {
        tracing::debug!(plugin, key, "ignoring non-object requirement entry");
        return None;
    };
    let reqs = map
        .iter()
        .filter_map(|(dependency, range)| {
            let parsed = range.as_str().and_then(|r| NpmRange::parse(r).ok());
            if parsed.is_none() {
                tracing::debug!(plugin, key, dependency, "ignoring malformed requirement");
            }
            parsed.map(|r| (dependency.clone(), r))
        })
        .collect();
    Some(reqs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn info(versions: &[&str], deps: Value) -> RegistryInfo {
        RegistryInfo {
            name: "cordova-plugin-test".into(),
            versions: versions.iter().map(|v| v.to_string()).collect(),
            cordova_dependencies: serde_json::from_value(deps).unwrap(),
        }
    }

    fn v(s: &str) -> Version {
        Version::parse(s).unwrap()
    }

    #[test]
    fn unmet_single_version_requirement_falls_back() {
        let info = info(
            &["1.0.0", "1.1.0", "2.0.0"],
            json!({"2.0.0": {"cordova-android": ">5.0.0"}}),
        );
        let installed = InstalledVersions::new().with_platform("android", "3.1.0");

        let result = negotiate(&info, &installed);

        assert_eq!(result.selected, Some(v("1.1.0")));
        assert_eq!(result.unmet.len(), 1);
        assert_eq!(
            result.unmet[0].to_string(),
            "cordova-android (3.1.0 in project, >5.0.0 required)"
        );
        assert!(result.is_downgrade());
    }

    #[test]
    fn met_requirements_select_latest() {
        let info = info(
            &["1.0.0", "2.0.0"],
            json!({"2.0.0": {"cordova-android": ">5.0.0", "cordova": ">=9.0.0"}}),
        );
        let installed = InstalledVersions::new()
            .with_platform("android", "12.0.0")
            .with_cordova("12.0.0");

        let result = negotiate(&info, &installed);

        assert_eq!(result.selected, Some(v("2.0.0")));
        assert!(result.unmet.is_empty());
    }

    #[test]
    fn missing_dependency_is_not_a_failure() {
        let info = info(&["1.0.0", "2.0.0"], json!({"2.0.0": {"cordova-ios": ">=7.0.0"}}));
        let result = negotiate(&info, &InstalledVersions::new());
        assert_eq!(result.selected, Some(v("2.0.0")));
    }

    #[test]
    fn upper_bound_applies_below_bound_only() {
        let info = info(
            &["1.0.0", "2.0.0", "3.0.0"],
            json!({"< 3.0.0": {"cordova-plugin-file": "<2.0.0"}}),
        );
        let installed = InstalledVersions::new().with_plugin("cordova-plugin-file", "6.0.0");

        assert_eq!(negotiate(&info, &installed).selected, Some(v("3.0.0")));

        let info = info_with_latest_constrained();
        assert_eq!(negotiate(&info, &installed).selected, None);
    }

    fn info_with_latest_constrained() -> RegistryInfo {
        info(
            &["1.0.0", "2.0.0"],
            json!({
                "1.0.0": {"cordova-plugin-file": ">=7.0.0"},
                "<3.0.0": {"cordova-plugin-file": "<2.0.0"}
            }),
        )
    }

    #[test]
    fn tightest_upper_bound_wins() {
        let info = info(
            &["1.0.0", "2.0.0", "3.0.0"],
            json!({
                "<2.0.0": {"cordova-android": "<4.0.0"},
                "<3.0.0": {"cordova-android": "<10.0.0"}
            }),
        );
        let installed = InstalledVersions::new().with_platform("android", "6.0.0");

        // 3.0.0 has no bound; 2.0.0 gets <10.0.0 only
        assert_eq!(negotiate(&info, &installed).selected, Some(v("3.0.0")));
        let mut capped = info.clone();
        capped.versions.pop();
        assert_eq!(negotiate(&capped, &installed).selected, Some(v("2.0.0")));
    }

    #[test]
    fn nothing_satisfies_returns_none_with_warnings() {
        let info = info(
            &["1.0.0", "2.0.0"],
            json!({"0.0.1": {"cordova": ">=99.0.0"}}),
        );
        let installed = InstalledVersions::new().with_cordova("12.0.0");

        let result = negotiate(&info, &installed);

        assert_eq!(result.selected, None);
        assert_eq!(result.latest, Some(v("2.0.0")));
        assert_eq!(result.unmet[0].dependency, "cordova");
    }

    #[test]
    fn malformed_entries_are_skipped() {
        let info = info(
            &["1.0.0", "2.0.0"],
            json!({
                "2.0.0": "not an object",
                "banana": {"cordova": ">=99.0.0"},
                "9.0.0": {"cordova": ">=99.0.0"},
                "1.5.0": {"cordova": "not a range", "cordova-android": ">=1.0.0"}
            }),
        );
        let installed = InstalledVersions::new()
            .with_cordova("12.0.0")
            .with_platform("android", "12.0.0");

        assert_eq!(negotiate(&info, &installed).selected, Some(v("2.0.0")));
    }

    #[test]
    fn prereleases_are_never_selected() {
        let info = info(&["1.0.0", "2.0.0-rc.1"], json!({}));
        let result = negotiate(&info, &InstalledVersions::new());
        assert_eq!(result.selected, Some(v("1.0.0")));
        assert_eq!(result.latest, Some(v("1.0.0")));
    }

    #[test]
    fn no_releases_selects_nothing() {
        let result = negotiate(&info(&[], json!({})), &InstalledVersions::new());
        assert_eq!(result, Negotiation::default());
    }

    #[test]
    fn registry_info_deserializes_from_json() {
        let info: RegistryInfo = serde_json::from_value(json!({
            "name": "cordova-plugin-x",
            "versions": ["1.0.0"],
            "cordovaDependencies": {"1.0.0": {"cordova": ">=9"}}
        }))
        .unwrap();
        assert_eq!(info.cordova_dependencies.len(), 1);
    }
}
