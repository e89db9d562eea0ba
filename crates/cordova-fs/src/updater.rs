//! Directory tree diffing and synchronization.
//!
//! The updater maps a target directory and one or more ordered source
//! directories, overlays the sources (later sources override earlier ones),
//! and applies the minimal set of filesystem operations that makes the target
//! match the merged view:
//!
//! | target | source | action |
//! |---|---|---|
//! | absent | dir | mkdir |
//! | dir | absent | rmdir -rf |
//! | absent | file | copy |
//! | file | absent | delete |
//! | file | file | copy when the source is newer, or when forced |
//! | dir | file | delete dir, copy |
//! | file | dir | delete file, mkdir |
//!
//! Relative paths are keyed with forward slashes and kept in a `BTreeMap`, so
//! iteration always visits a directory before anything below it.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use walkdir::WalkDir;

use crate::error::{Error, Result};

/// Include globs used when no explicit filter is given.
pub const DEFAULT_INCLUDE: &[&str] = &["**"];

/// Exclude globs used when no explicit filter is given.
pub const DEFAULT_EXCLUDE: &[&str] = &[];

/// What a scanned path turned out to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Directory,
    File,
    Other,
}

/// The subset of filesystem metadata the updater decides on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryStats {
    pub kind: EntryKind,
    pub mtime: SystemTime,
}

impl EntryStats {
    pub fn directory(mtime: SystemTime) -> Self {
        Self {
            kind: EntryKind::Directory,
            mtime,
        }
    }

    pub fn file(mtime: SystemTime) -> Self {
        Self {
            kind: EntryKind::File,
            mtime,
        }
    }

    pub fn from_metadata(meta: &fs::Metadata) -> Self {
        let kind = if meta.is_dir() {
            EntryKind::Directory
        } else if meta.is_file() {
            EntryKind::File
        } else {
            EntryKind::Other
        };
        Self {
            kind,
            mtime: meta.modified().unwrap_or(SystemTime::UNIX_EPOCH),
        }
    }

    /// Stat a path, following symlinks. Any failure reads as "absent".
    pub fn stat(path: &Path) -> Option<Self> {
        fs::metadata(path).ok().map(|meta| Self::from_metadata(&meta))
    }

    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }

    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }
}

/// One scanned path of a directory tree.
///
/// `stats == None` means the path is absent from this tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    /// The scanned directory (relative to the root) this entry belongs to.
    pub sub_dir: PathBuf,
    pub stats: Option<EntryStats>,
}

/// Relative path (forward slashes, `""` for the tree root) to scanned entry.
pub type PathMap = BTreeMap<String, DirEntry>;

/// One relative path after overlaying all source trees onto the target tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedPathEntry {
    pub target_path: PathBuf,
    pub target_stats: Option<EntryStats>,
    pub source_path: Option<PathBuf>,
    pub source_stats: Option<EntryStats>,
}

pub type MergedPathMap = BTreeMap<String, MergedPathEntry>;

/// Compiled include/exclude globs. Exclusion always wins over inclusion.
#[derive(Debug, Clone)]
pub struct GlobFilter {
    include: GlobSet,
    exclude: GlobSet,
}

impl GlobFilter {
    pub fn new<S: AsRef<str>>(include: &[S], exclude: &[S]) -> Result<Self> {
        Ok(Self {
            include: compile_globs(include)?,
            exclude: compile_globs(exclude)?,
        })
    }

    /// Include everything, exclude nothing.
    pub fn include_all() -> Result<Self> {
        Self::new(DEFAULT_INCLUDE, DEFAULT_EXCLUDE)
    }

    pub fn is_excluded(&self, relative_path: &str) -> bool {
        self.exclude.is_match(relative_path)
    }

    pub fn is_included(&self, relative_path: &str) -> bool {
        self.include.is_match(relative_path) && !self.is_excluded(relative_path)
    }
}

fn compile_globs<S: AsRef<str>>(globs: &[S]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for glob in globs {
        let glob = glob.as_ref();
        let compiled = GlobBuilder::new(glob)
            .literal_separator(true)
            .build()
            .map_err(|e| Error::InvalidGlob {
                glob: glob.to_string(),
                message: e.to_string(),
            })?;
        builder.add(compiled);
    }
    builder.build().map_err(|e| Error::InvalidGlob {
        glob: globs
            .iter()
            .map(|g| g.as_ref())
            .collect::<Vec<_>>()
            .join(", "),
        message: e.to_string(),
    })
}

/// Options shared by the update operations.
#[derive(Debug, Clone)]
pub struct UpdateOptions {
    /// Directory that relative target/source paths are joined onto.
    /// `None` uses the paths as given.
    pub root_dir: Option<PathBuf>,
    /// Copy files even when the target is as new as the source.
    pub force: bool,
    pub include: Vec<String>,
    pub exclude: Vec<String>,
}

impl Default for UpdateOptions {
    fn default() -> Self {
        Self {
            root_dir: None,
            force: false,
            include: DEFAULT_INCLUDE.iter().map(|g| g.to_string()).collect(),
            exclude: DEFAULT_EXCLUDE.iter().map(|g| g.to_string()).collect(),
        }
    }
}

impl UpdateOptions {
    pub fn with_root(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: Some(root_dir.into()),
            ..Self::default()
        }
    }

    pub fn forced(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        match &self.root_dir {
            Some(root) => root.join(path),
            None => path.to_path_buf(),
        }
    }

    fn root(&self) -> &Path {
        self.root_dir.as_deref().unwrap_or_else(|| Path::new(""))
    }
}

/// Recursively map `sub_dir` under `root`.
///
/// The result holds the directory itself under `""` and every descendant that
/// passes the include/exclude filter. Excluded paths are pruned together with
/// everything below them. A directory is kept when it matches an include glob
/// or when something below it was kept. A `sub_dir` that does not exist maps
/// to an empty map.
pub fn map_directory<S: AsRef<str>>(
    root: &Path,
    sub_dir: &Path,
    include: &[S],
    exclude: &[S],
) -> Result<PathMap> {
    let filter = GlobFilter::new(include, exclude)?;
    map_with_filter(root, sub_dir, &filter)
}

fn map_with_filter(root: &Path, sub_dir: &Path, filter: &GlobFilter) -> Result<PathMap> {
    let base = root.join(sub_dir);
    let mut map = PathMap::new();

    let Some(base_stats) = EntryStats::stat(&base) else {
        return Ok(map);
    };
    map.insert(
        String::new(),
        DirEntry {
            sub_dir: sub_dir.to_path_buf(),
            stats: Some(base_stats),
        },
    );
    if !base_stats.is_dir() {
        return Ok(map);
    }

    // Directories seen during the walk but not (yet) known to be included
    let mut pending_dirs: BTreeMap<String, EntryStats> = BTreeMap::new();

    let walker = WalkDir::new(&base)
        .min_depth(1)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| match relative_key(&base, entry.path()) {
            Some(rel) => !filter.is_excluded(&rel),
            None => true,
        });

    for entry in walker {
        let entry = entry.map_err(|e| walk_error(&base, e))?;
        let Some(rel) = relative_key(&base, entry.path()) else {
            continue;
        };
        let meta = entry.metadata().map_err(|e| walk_error(&base, e))?;
        let stats = EntryStats::from_metadata(&meta);

        let included = filter.is_included(&rel);
        if stats.is_dir() && !included {
            pending_dirs.insert(rel, stats);
            continue;
        }
        if stats.is_dir() || (stats.is_file() && included) {
            promote_ancestors(&rel, &mut pending_dirs, &mut map, sub_dir);
            map.insert(
                rel,
                DirEntry {
                    sub_dir: sub_dir.to_path_buf(),
                    stats: Some(stats),
                },
            );
        }
    }

    Ok(map)
}

/// Move every pending ancestor directory of `rel` into the result map.
fn promote_ancestors(
    rel: &str,
    pending: &mut BTreeMap<String, EntryStats>,
    map: &mut PathMap,
    sub_dir: &Path,
) {
    let mut end = 0;
    while let Some(offset) = rel[end..].find('/') {
        end += offset;
        if let Some(stats) = pending.remove(&rel[..end]) {
            map.insert(
                rel[..end].to_string(),
                DirEntry {
                    sub_dir: sub_dir.to_path_buf(),
                    stats: Some(stats),
                },
            );
        }
        end += 1;
    }
}

fn relative_key(base: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(base).ok()?;
    let key = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/");
    (!key.is_empty()).then_some(key)
}

fn walk_error(base: &Path, err: walkdir::Error) -> Error {
    let path = err
        .path()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| base.to_path_buf());
    match err.into_io_error() {
        Some(source) => Error::io(path, source),
        None => Error::Walk {
            path,
            message: "filesystem loop detected".to_string(),
        },
    }
}

fn join_relative(base: &Path, rel: &str) -> PathBuf {
    if rel.is_empty() {
        base.to_path_buf()
    } else {
        base.join(rel)
    }
}

/// Overlay the source maps onto the target map.
///
/// Keys are the union of all maps. For a key defined by several sources the
/// last source in `source_maps` wins. Keys missing from the target carry
/// `target_stats: None`; keys missing from every source carry `None` source
/// path and stats.
pub fn merge_path_maps(
    target_dir: &Path,
    target_map: &PathMap,
    source_maps: &[PathMap],
) -> MergedPathMap {
    let mut merged = MergedPathMap::new();

    for source_map in source_maps {
        for (rel, entry) in source_map {
            merged.insert(
                rel.clone(),
                MergedPathEntry {
                    target_path: join_relative(target_dir, rel),
                    target_stats: None,
                    source_path: Some(join_relative(&entry.sub_dir, rel)),
                    source_stats: entry.stats,
                },
            );
        }
    }

    for (rel, entry) in target_map {
        merged
            .entry(rel.clone())
            .and_modify(|m| m.target_stats = entry.stats)
            .or_insert_with(|| MergedPathEntry {
                target_path: join_relative(target_dir, rel),
                target_stats: entry.stats,
                source_path: None,
                source_stats: None,
            });
    }

    merged
}

/// Bring one target path in line with one source path, given both stats.
///
/// Returns `true` when the filesystem was modified.
pub fn update_path_with_stats(
    options: &UpdateOptions,
    target_path: &Path,
    target_stats: Option<&EntryStats>,
    source_path: Option<&Path>,
    source_stats: Option<&EntryStats>,
    log: &mut dyn FnMut(&str),
) -> Result<bool> {
    let target_full = options.resolve(target_path);

    let (Some(source_path), Some(source_stats)) = (source_path, source_stats) else {
        // No source: whatever is at the target goes away
        let Some(existing) = target_stats else {
            return Ok(false);
        };
        if existing.is_dir() {
            log(&format!("rmdir  {} (no source)", target_path.display()));
        } else {
            log(&format!("delete {} (no source)", target_path.display()));
        }
        remove_path(&target_full, existing)?;
        return Ok(true);
    };

    let source_full = options.resolve(source_path);
    let mut updated = false;
    let mut target_stats = target_stats;

    if let Some(existing) = target_stats
        && existing.is_dir() != source_stats.is_dir()
    {
        log(&format!("delete {}", target_path.display()));
        remove_path(&target_full, existing)?;
        target_stats = None;
        updated = true;
    }

    match target_stats {
        None if source_stats.is_dir() => {
            log(&format!("mkdir  {}", target_path.display()));
            fs::create_dir_all(&target_full).map_err(|e| Error::io(&target_full, e))?;
            updated = true;
        }
        None if source_stats.is_file() => {
            log(&format!(
                "copy   {} {}{}",
                source_path.display(),
                target_path.display(),
                if options.force { "" } else { " (new file)" }
            ));
            copy_file(&source_full, &target_full)?;
            updated = true;
        }
        Some(existing)
            if existing.is_file()
                && source_stats.is_file()
                && (options.force || source_stats.mtime > existing.mtime) =>
        {
            log(&format!(
                "copy   {} {}{}",
                source_path.display(),
                target_path.display(),
                if options.force { "" } else { " (updated file)" }
            ));
            copy_file(&source_full, &target_full)?;
            updated = true;
        }
        _ => {}
    }

    Ok(updated)
}

/// Stat `target` and `source` (failures read as absent) and update the target.
///
/// The target's parent directory is created first when the target does not
/// exist yet.
pub fn update_path(
    options: &UpdateOptions,
    target_path: &Path,
    source_path: Option<&Path>,
    log: &mut dyn FnMut(&str),
) -> Result<bool> {
    let target_full = options.resolve(target_path);
    let target_stats = EntryStats::stat(&target_full);
    let source_stats = source_path.and_then(|s| EntryStats::stat(&options.resolve(s)));

    if target_stats.is_none()
        && let Some(parent) = target_full.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }

    update_path_with_stats(
        options,
        target_path,
        target_stats.as_ref(),
        source_path,
        source_stats.as_ref(),
        log,
    )
}

/// Make `target_sub_path` match the overlay of `source_sub_paths`.
///
/// Sources are applied in order, later ones overriding earlier ones. A missing
/// target is created; missing sources contribute nothing. Returns `true` if
/// anything changed.
pub fn merge_and_update_dir<P: AsRef<Path>>(
    options: &UpdateOptions,
    target_sub_path: &Path,
    source_sub_paths: &[P],
    log: &mut dyn FnMut(&str),
) -> Result<bool> {
    let filter = GlobFilter::new(options.include.as_slice(), options.exclude.as_slice())?;
    let root = options.root();

    let source_maps = source_sub_paths
        .iter()
        .map(|source| map_with_filter(root, source.as_ref(), &filter))
        .collect::<Result<Vec<_>>>()?;

    let target_map = if root.join(target_sub_path).exists() {
        map_with_filter(root, target_sub_path, &filter)?
    } else {
        PathMap::new()
    };

    let merged = merge_path_maps(target_sub_path, &target_map, &source_maps);

    let mut updated = false;
    for entry in merged.values() {
        updated |= update_path_with_stats(
            options,
            &entry.target_path,
            entry.target_stats.as_ref(),
            entry.source_path.as_deref(),
            entry.source_stats.as_ref(),
            log,
        )?;
    }

    tracing::debug!(
        target = %target_sub_path.display(),
        sources = source_sub_paths.len(),
        updated,
        "merged directory"
    );
    Ok(updated)
}

fn copy_file(source: &Path, target: &Path) -> Result<()> {
    fs::copy(source, target).map_err(|e| Error::io(source, e))?;
    Ok(())
}

fn remove_path(path: &Path, stats: &EntryStats) -> Result<()> {
    let result = if stats.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };
    match result {
        Ok(()) => Ok(()),
        // Already gone together with a removed ancestor
        Err(e) if matches!(e.kind(), ErrorKind::NotFound | ErrorKind::NotADirectory) => Ok(()),
        Err(e) => Err(Error::io(path, e)),
    }
}
