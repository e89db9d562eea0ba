//! Version spec handling for the Cordova project orchestrator
//!
//! A *spec* names which version of a platform or plugin to install: a semver
//! version, an npm-style range, a URL, a local directory, or any other string
//! handed to the package fetcher as-is.
//!
//! - [`target`] splits `name@spec` command arguments.
//! - [`range`] parses npm-style ranges onto [`semver`].
//! - [`version`] classifies specs and computes the spec to persist.
//! - [`resolve`] picks one spec from the command line, `package.json`,
//!   `config.xml` and the pinned defaults.
//! - [`platforms`] lists the platforms the tool knows about.
//! - [`engines`] negotiates which plugin version a project can use.

pub mod engines;
pub mod error;
pub mod platforms;
pub mod range;
pub mod resolve;
pub mod target;
pub mod version;

pub use engines::{InstalledVersions, Negotiation, RegistryInfo, UnmetRequirement, negotiate};
pub use error::{Error, Result};
pub use platforms::{KnownPlatform, PinnedVersions, known_platform, supports_host};
pub use range::NpmRange;
pub use resolve::{
    ResolvedSpec, SpecSource, engine_spec, resolve_platform_spec, resolve_plugin_spec,
};
pub use target::{Target, name_from_url, platform_name_from_package};
pub use version::{SpecKind, classify, parse_version, persisted_spec};
