//! User-facing event sink.
//!
//! Operations report warnings here instead of failing when a single item of
//! a batch goes wrong. The CLI prints them and exits with [`Events::exit_code`].

use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::{Mutex, PoisonError};

#[derive(Debug, Default)]
pub struct Events {
    warnings: Mutex<Vec<String>>,
    exit_code: AtomicI32,
}

impl Events {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn info(&self, message: impl AsRef<str>) {
        tracing::info!("{}", message.as_ref());
    }

    pub fn warn(&self, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!("{message}");
        self.warnings
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message);
    }

    /// Warnings recorded so far, oldest first
    pub fn warnings(&self) -> Vec<String> {
        self.warnings
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn set_exit_code(&self, code: i32) {
        self.exit_code.store(code, Ordering::SeqCst);
    }

    pub fn exit_code(&self) -> i32 {
        self.exit_code.load(Ordering::SeqCst)
    }
}
