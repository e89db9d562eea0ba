//! Project documents for the Cordova project orchestrator
//!
//! Three documents describe a project:
//!
//! - [`PackageDescriptor`]: `package.json`, holding npm dependencies plus the
//!   `cordova.platforms` list and the `cordova.plugins` variable maps.
//! - [`ConfigParser`]: the `config.xml` manifest with its `<engine>`,
//!   `<plugin>` and `<hook>` declarations.
//! - [`PluginXml`]: a fetched plugin's `plugin.xml`, read for its id, version
//!   and `<dependency>` edges.
//!
//! Rewrites keep the existing indentation, newline convention and key order.
//! Nothing is written when the content did not change.

pub mod config_xml;
pub mod error;
pub mod format;
pub mod package;
pub mod plugin_xml;

pub use config_xml::{ConfigParser, EngineDecl, HookDecl, PluginDecl};
pub use error::{Error, Result};
pub use format::{Newline, TextStyle, render_json};
pub use package::{PackageDescriptor, Variables};
pub use plugin_xml::{PluginDependency, PluginXml};
