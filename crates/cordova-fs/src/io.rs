//! Atomic I/O operations with file locking

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use fs2::FileExt;

use crate::{Error, Result};

/// Write content atomically to a file with locking.
///
/// Writes to a temp file in the same directory, then renames it over the
/// target, so a crash mid-write never leaves a truncated file behind.
pub fn write_atomic(path: &Path, content: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }

    // Same directory keeps the rename on one filesystem
    let temp_name = format!(
        ".{}.{}.tmp",
        path.file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default(),
        std::process::id()
    );
    let temp_path = path.with_file_name(&temp_name);

    let mut temp_file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&temp_path)
        .map_err(|e| Error::io(&temp_path, e))?;

    temp_file
        .lock_exclusive()
        .map_err(|_| Error::LockFailed {
            path: path.to_path_buf(),
        })?;

    temp_file
        .write_all(content)
        .map_err(|e| Error::io(&temp_path, e))?;
    temp_file.sync_all().map_err(|e| Error::io(&temp_path, e))?;

    temp_file.unlock().map_err(|_| Error::LockFailed {
        path: path.to_path_buf(),
    })?;

    fs::rename(&temp_path, path).map_err(|e| Error::io(path, e))?;

    tracing::debug!(path = %path.display(), bytes = content.len(), "wrote file atomically");
    Ok(())
}

/// Write `content` only when it differs from what is already on disk.
///
/// Returns `true` if the file was written. An unchanged file keeps its
/// bytes and its modification time.
pub fn write_if_changed(path: &Path, content: &str) -> Result<bool> {
    if let Ok(existing) = fs::read(path)
        && existing == content.as_bytes()
    {
        return Ok(false);
    }
    write_atomic(path, content.as_bytes())?;
    Ok(true)
}

/// Read text content from a file.
pub fn read_text(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| Error::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn write_atomic_creates_parent_directories() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested/dir/file.json");

        write_atomic(&path, b"{}").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "{}");
    }

    #[test]
    fn write_atomic_leaves_no_temp_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.xml");

        write_atomic(&path, b"<widget/>").unwrap();

        let names: Vec<_> = fs::read_dir(temp.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["config.xml".to_string()]);
    }

    #[test]
    fn write_if_changed_skips_identical_content() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("package.json");
        fs::write(&path, "{\n  \"name\": \"app\"\n}\n").unwrap();
        let before = fs::metadata(&path).unwrap().modified().unwrap();

        let written = write_if_changed(&path, "{\n  \"name\": \"app\"\n}\n").unwrap();

        assert!(!written);
        assert_eq!(fs::metadata(&path).unwrap().modified().unwrap(), before);
    }

    #[test]
    fn write_if_changed_writes_new_content() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("package.json");
        fs::write(&path, "{}").unwrap();

        assert!(write_if_changed(&path, "{\"a\":1}").unwrap());
        assert_eq!(read_text(&path).unwrap(), "{\"a\":1}");
    }

    #[test]
    fn read_text_reports_path_on_error() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("missing.txt");

        let err = read_text(&missing).unwrap_err();
        assert!(err.to_string().contains("missing.txt"));
    }
}
