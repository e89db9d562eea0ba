//! Choosing one spec from the places a project can declare it.

use std::path::Path;

use cordova_config::{ConfigParser, EngineDecl, PackageDescriptor};

use crate::platforms::PinnedVersions;
use crate::version::{SpecKind, classify};

/// Where a resolved spec came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecSource {
    /// Given on the command line
    Explicit,
    PackageDescriptor,
    Manifest,
    Pinned,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSpec {
    pub spec: String,
    pub source: SpecSource,
    pub kind: SpecKind,
}

impl ResolvedSpec {
    fn new(spec: &str, source: SpecSource, cwd: &Path) -> Self {
        Self {
            spec: spec.to_string(),
            source,
            kind: classify(spec, cwd),
        }
    }
}

/// Resolve the spec for platform `name`.
///
/// First match wins: the explicit spec, then the package descriptor
/// (`cordova-<name>`, then `<name>`, in `dependencies` and then
/// `devDependencies`), then the last `config.xml` engine whose name matches
/// case-insensitively, then the pinned default. `None` leaves the choice to
/// the fetcher.
pub fn resolve_platform_spec(
    name: &str,
    explicit: Option<&str>,
    package: Option<&PackageDescriptor>,
    manifest: Option<&ConfigParser>,
    pinned: &PinnedVersions,
    cwd: &Path,
) -> Option<ResolvedSpec> {
    let resolved = explicit
        .map(|spec| ResolvedSpec::new(spec, SpecSource::Explicit, cwd))
        .or_else(|| {
            package
                .and_then(|pkg| pkg.platform_spec(name))
                .map(|spec| ResolvedSpec::new(spec, SpecSource::PackageDescriptor, cwd))
        })
        .or_else(|| {
            manifest
                .and_then(|config| engine_spec(&config.engines(), name))
                .map(|spec| ResolvedSpec::new(&spec, SpecSource::Manifest, cwd))
        })
        .or_else(|| {
            pinned
                .get(name)
                .map(|spec| ResolvedSpec::new(spec, SpecSource::Pinned, cwd))
        });

    match &resolved {
        Some(r) => tracing::debug!(platform = name, spec = %r.spec, source = ?r.source, "resolved spec"),
        None => tracing::debug!(platform = name, "no spec declared"),
    }
    resolved
}

/// Resolve the spec for plugin `id`: the explicit spec, then the package
/// descriptor dependency, then the `config.xml` `<plugin spec>`.
pub fn resolve_plugin_spec(
    id: &str,
    explicit: Option<&str>,
    package: Option<&PackageDescriptor>,
    manifest: Option<&ConfigParser>,
    cwd: &Path,
) -> Option<ResolvedSpec> {
    explicit
        .map(|spec| ResolvedSpec::new(spec, SpecSource::Explicit, cwd))
        .or_else(|| {
            package
                .and_then(|pkg| pkg.dependency(id))
                .map(|spec| ResolvedSpec::new(spec, SpecSource::PackageDescriptor, cwd))
        })
        .or_else(|| {
            manifest
                .and_then(|config| config.plugin(id))
                .and_then(|plugin| plugin.spec)
                .map(|spec| ResolvedSpec::new(&spec, SpecSource::Manifest, cwd))
        })
}

/// Spec of the last engine named `name`, compared case-insensitively.
pub fn engine_spec(engines: &[EngineDecl], name: &str) -> Option<String> {
    engines
        .iter()
        .filter(|e| e.name.eq_ignore_ascii_case(name))
        .next_back()
        .and_then(|e| e.spec.clone())
}
