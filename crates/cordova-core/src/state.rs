//! Per-target progress through an add or update.

use crate::error::{Error, Result};

/// Stage a single platform target has reached.
///
/// Targets move forward one stage at a time; `Error` is reachable from any
/// non-terminal stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetState {
    Pending,
    SpecResolved,
    Fetched,
    ApiInvoked,
    PluginsInstalled,
    Persisted,
    Done,
    Error,
}

impl TargetState {
    /// The stage that follows this one on success
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Pending => Some(Self::SpecResolved),
            Self::SpecResolved => Some(Self::Fetched),
            Self::Fetched => Some(Self::ApiInvoked),
            Self::ApiInvoked => Some(Self::PluginsInstalled),
            Self::PluginsInstalled => Some(Self::Persisted),
            Self::Persisted => Some(Self::Done),
            Self::Done | Self::Error => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Error)
    }
}

/// Tracks one target's [`TargetState`]
#[derive(Debug, Clone)]
pub struct TargetProgress {
    target: String,
    state: TargetState,
}

impl TargetProgress {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            state: TargetState::Pending,
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn state(&self) -> TargetState {
        self.state
    }

    /// Move to `to`, which must be the stage directly after the current one.
    pub fn advance(&mut self, to: TargetState) -> Result<()> {
        if self.state.next() != Some(to) {
            return Err(Error::InvalidTransition {
                target: self.target.clone(),
                from: self.state,
                to,
            });
        }
        tracing::debug!(target_name = %self.target, from = ?self.state, to = ?to, "target progress");
        self.state = to;
        Ok(())
    }

    pub fn fail(&mut self) {
        if !self.state.is_terminal() {
            tracing::debug!(target_name = %self.target, from = ?self.state, "target failed");
            self.state = TargetState::Error;
        }
    }
}
