//! Error types for cordova-core

use std::path::PathBuf;

use crate::state::TargetState;

/// Result type for cordova-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while orchestrating platforms and plugins
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A command was given no usable targets
    #[error("No {kind} specified. Please specify a {kind} to {action}. See `cordova {hint}`.")]
    NoTargets {
        kind: &'static str,
        action: &'static str,
        hint: &'static str,
    },

    #[error("Platform {name} already added.")]
    AlreadyAdded { name: String },

    #[error("Platform \"{name}\" is not yet added. See `cordova platform list`.")]
    PlatformNotAdded { name: String },

    #[error("No platforms added to this project. Please use `cordova platform add <platform>`.")]
    NoPlatforms,

    #[error("Plugin \"{id}\" is not present in the project. See `cordova plugin list`.")]
    PluginNotInstalled { id: String },

    /// Removing the plugin would leave installed plugins without a dependency
    #[error("Plugin \"{id}\" is required by ({}) and cannot be removed", dependents.join(", "))]
    PluginRequired { id: String, dependents: Vec<String> },

    /// The package fetcher failed; `source` is the fetcher's own error
    #[error(
        "Failed to fetch {kind} {target}\n\
         Probably this is either a connection problem, or {kind} spec is incorrect.\n\
         Check your connection and {kind} name/version/URL.\n\
         {source}"
    )]
    Fetch {
        kind: &'static str,
        target: String,
        source: Box<Error>,
    },

    /// Raised by a platform implementation, shown as is
    #[error("{message}")]
    PlatformApi { platform: String, message: String },

    #[error("Hook '{event}' failed running {script}: {message}")]
    HookFailed {
        event: String,
        script: String,
        message: String,
    },

    #[error("Current working directory is not a Cordova-based project: {}", path.display())]
    NotAProject { path: PathBuf },

    #[error("Could not determine the {kind} name for '{target}'")]
    UnnamedTarget { kind: &'static str, target: String },

    #[error("{target}: cannot move from {from:?} to {to:?}")]
    InvalidTransition {
        target: String,
        from: TargetState,
        to: TargetState,
    },

    #[error("Failed to run '{program}': {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    #[error("'{program}' failed: {message}")]
    CommandFailed { program: String, message: String },

    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(transparent)]
    Config(#[from] cordova_config::Error),

    #[error(transparent)]
    Fs(#[from] cordova_fs::Error),

    #[error(transparent)]
    Spec(#[from] cordova_spec::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn fetch(kind: &'static str, target: &str, source: Error) -> Self {
        Self::Fetch {
            kind,
            target: target.to_string(),
            source: Box::new(source),
        }
    }
}
