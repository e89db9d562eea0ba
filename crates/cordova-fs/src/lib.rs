//! Filesystem primitives for the Cordova project orchestrator
//!
//! Provides atomic file writes and the directory tree differ used to keep
//! platform web asset directories in sync with the project sources.

pub mod error;
pub mod io;
pub mod updater;

pub use error::{Error, Result};
pub use io::{read_text, write_atomic, write_if_changed};
pub use updater::{
    DirEntry, EntryKind, EntryStats, GlobFilter, MergedPathEntry, MergedPathMap, PathMap,
    UpdateOptions, map_directory, merge_and_update_dir, merge_path_maps, update_path,
    update_path_with_stats,
};
