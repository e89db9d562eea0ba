//! Error types for cordova-spec

/// Result type for cordova-spec operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur handling version specs
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Not a valid npm-style version range.
    #[error("invalid version range '{range}': {reason}")]
    InvalidRange { range: String, reason: String },

    /// A target argument with no name part.
    #[error("invalid target '{0}': expected <name> or <name>@<spec>")]
    InvalidTarget(String),
}
