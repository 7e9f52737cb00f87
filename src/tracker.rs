// SPDX-License-Identifier: Apache-2.0

//! File discovery and change detection.
//!
//! The tracker owns one [`LogFileState`] per discovered file and decides,
//! from mtime alone, which files need an incremental read. File identity is
//! the path string: a renamed or rotated-in file is a brand-new file and is
//! re-read from the start.

use glob::glob;
use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tracing::debug;

use crate::error::{Error, Result};

/// Per-file ingestion state
#[derive(Debug, Clone)]
pub struct LogFileState {
    /// Path to the file, also its identity
    pub path: PathBuf,
    /// Modification time observed at the last reconcile
    pub modified: SystemTime,
    /// Number of lines already consumed; only ever increases
    pub lines_read: u64,
    /// Whether the file has unread appended content
    pub dirty: bool,
}

/// Recursively list files under `root` matching `pattern`.
///
/// Fails with [`Error::MissingRoot`] when the root directory does not exist;
/// the caller surfaces that as an in-band warning record.
pub fn discover_files(root: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        return Err(Error::MissingRoot(root.to_path_buf()));
    }

    let full_pattern = root.join("**").join(pattern);
    let matches = glob(&full_pattern.to_string_lossy())
        .map_err(|e| Error::InvalidGlob(e.to_string()))?;

    let mut seen = HashSet::new();
    let mut paths = Vec::new();

    for entry in matches {
        let path = entry.map_err(|e| Error::Io(e.into_error()))?;

        // Skip directories
        if path.is_dir() {
            continue;
        }

        if seen.insert(path.clone()) {
            paths.push(path);
        }
    }

    debug!(root = %root.display(), count = paths.len(), "discovered log files");

    Ok(paths)
}

/// FileSetTracker maintains the per-file state table across scan passes.
///
/// The table is explicitly owned by whoever constructs the tracker; callers
/// are expected to serialize access (the ingestor holds it behind its
/// session lock).
#[derive(Debug)]
pub struct FileSetTracker {
    root: PathBuf,
    pattern: String,
    states: HashMap<PathBuf, LogFileState>,
}

impl FileSetTracker {
    /// Create a tracker scanning `root` for files matching `pattern`
    pub fn new(root: PathBuf, pattern: String) -> Self {
        Self {
            root,
            pattern,
            states: HashMap::new(),
        }
    }

    /// Root directory this tracker scans
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File name pattern this tracker matches
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Discover candidate files under the tracker's root
    pub fn discover(&self) -> Result<Vec<PathBuf>> {
        discover_files(&self.root, &self.pattern)
    }

    /// Reconcile the state table against a discovery result.
    ///
    /// Unseen paths get a fresh dirty state; seen paths with a changed mtime
    /// are marked dirty without touching `lines_read` (the reader decides how
    /// much is new). A path whose mtime is unchanged keeps its current flag,
    /// so a file left dirty by an aborted pass is retried. Paths missing from
    /// `discovered` go stale: their state stays in the table but they are
    /// excluded from dirty iteration.
    ///
    /// Returns the dirty paths in discovery order.
    pub fn reconcile(&mut self, discovered: &[PathBuf]) -> Vec<PathBuf> {
        let mut dirty = Vec::new();

        for path in discovered {
            let modified = match fs::metadata(path).and_then(|m| m.modified()) {
                Ok(modified) => modified,
                Err(e) => {
                    debug!(path = %path.display(), error = %e, "skipping file without readable metadata");
                    continue;
                }
            };

            match self.states.entry(path.clone()) {
                Entry::Vacant(vacant) => {
                    vacant.insert(LogFileState {
                        path: path.clone(),
                        modified,
                        lines_read: 0,
                        dirty: true,
                    });
                    dirty.push(path.clone());
                }
                Entry::Occupied(mut occupied) => {
                    let state = occupied.get_mut();
                    if state.modified != modified {
                        state.modified = modified;
                        state.dirty = true;
                    }
                    if state.dirty {
                        dirty.push(path.clone());
                    }
                }
            }
        }

        debug!(dirty = dirty.len(), tracked = self.states.len(), "reconciled file set");

        dirty
    }

    /// Record that `consumed` newly read lines of `path` were fully parsed
    /// and appended, and clear its dirty flag.
    pub fn commit(&mut self, path: &Path, consumed: u64) {
        if let Some(state) = self.states.get_mut(path) {
            state.lines_read += consumed;
            state.dirty = false;
        }
    }

    /// Look up the state for a tracked path
    pub fn state(&self, path: &Path) -> Option<&LogFileState> {
        self.states.get(path)
    }

    /// Number of lines already consumed from `path`
    pub fn lines_read(&self, path: &Path) -> u64 {
        self.states.get(path).map(|s| s.lines_read).unwrap_or(0)
    }

    /// Number of files currently tracked, stale entries included
    pub fn tracked_count(&self) -> usize {
        self.states.len()
    }

    /// Drop all per-file state ahead of a full re-scan
    pub fn reset(&mut self) {
        self.states.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use std::time::Duration;
    use tempfile::TempDir;

    fn write_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        path
    }

    /// Force a visible mtime change regardless of filesystem granularity
    fn bump_mtime(path: &Path) {
        let file = File::options().write(true).open(path).unwrap();
        let later = SystemTime::now() + Duration::from_secs(5);
        file.set_modified(later).unwrap();
    }

    #[test]
    fn test_discover_missing_root() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("no-such-dir");

        let result = discover_files(&missing, "*.log");
        assert!(matches!(result, Err(Error::MissingRoot(_))));
    }

    #[test]
    fn test_discover_recursive_extension_filter() {
        let dir = TempDir::new().unwrap();
        write_file(&dir, "app.log", "x");
        write_file(&dir, "notes.txt", "x");
        write_file(&dir, "nested/deep/worker.log", "x");

        let paths = discover_files(dir.path(), "*.log").unwrap();

        assert_eq!(paths.len(), 2);
        assert!(paths.iter().any(|p| p.ends_with("app.log")));
        assert!(paths.iter().any(|p| p.ends_with("worker.log")));
        assert!(!paths.iter().any(|p| p.ends_with("notes.txt")));
    }

    #[test]
    fn test_reconcile_new_files_are_dirty() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "app.log", "line\n");

        let mut tracker = FileSetTracker::new(dir.path().to_path_buf(), "*.log".into());
        let discovered = tracker.discover().unwrap();
        let dirty = tracker.reconcile(&discovered);

        assert_eq!(dirty, vec![path.clone()]);
        let state = tracker.state(&path).unwrap();
        assert!(state.dirty);
        assert_eq!(state.lines_read, 0);
    }

    #[test]
    fn test_reconcile_unchanged_mtime_is_clean() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "app.log", "line\n");

        let mut tracker = FileSetTracker::new(dir.path().to_path_buf(), "*.log".into());
        let discovered = tracker.discover().unwrap();
        tracker.reconcile(&discovered);
        tracker.commit(&path, 1);

        // Nothing changed on disk, so a second reconcile finds nothing dirty
        let dirty = tracker.reconcile(&discovered);
        assert!(dirty.is_empty());
        assert_eq!(tracker.lines_read(&path), 1);
    }

    #[test]
    fn test_reconcile_changed_mtime_keeps_lines_read() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "app.log", "line\n");

        let mut tracker = FileSetTracker::new(dir.path().to_path_buf(), "*.log".into());
        let discovered = tracker.discover().unwrap();
        tracker.reconcile(&discovered);
        tracker.commit(&path, 1);

        bump_mtime(&path);

        let dirty = tracker.reconcile(&discovered);
        assert_eq!(dirty, vec![path.clone()]);
        // The incremental reader decides how much is new
        assert_eq!(tracker.lines_read(&path), 1);
    }

    #[test]
    fn test_reconcile_retries_aborted_file() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "app.log", "line\n");

        let mut tracker = FileSetTracker::new(dir.path().to_path_buf(), "*.log".into());
        let discovered = tracker.discover().unwrap();
        tracker.reconcile(&discovered);

        // No commit happened (pass aborted); the file stays dirty
        let dirty = tracker.reconcile(&discovered);
        assert_eq!(dirty, vec![path]);
    }

    #[test]
    fn test_stale_files_excluded_from_dirty_checks() {
        let dir = TempDir::new().unwrap();
        let kept = write_file(&dir, "kept.log", "line\n");
        let removed = write_file(&dir, "removed.log", "line\n");

        let mut tracker = FileSetTracker::new(dir.path().to_path_buf(), "*.log".into());
        let discovered = tracker.discover().unwrap();
        tracker.reconcile(&discovered);
        tracker.commit(&kept, 1);
        tracker.commit(&removed, 1);

        fs::remove_file(&removed).unwrap();

        let discovered = tracker.discover().unwrap();
        let dirty = tracker.reconcile(&discovered);
        assert!(dirty.is_empty());
        // State persists but the file no longer participates
        assert_eq!(tracker.tracked_count(), 2);
    }

    #[test]
    fn test_reset_clears_state() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "app.log", "line\n");

        let mut tracker = FileSetTracker::new(dir.path().to_path_buf(), "*.log".into());
        let discovered = tracker.discover().unwrap();
        tracker.reconcile(&discovered);
        tracker.commit(&path, 1);

        tracker.reset();
        assert_eq!(tracker.tracked_count(), 0);

        // After a reset everything is read from the start again
        let dirty = tracker.reconcile(&discovered);
        assert_eq!(dirty, vec![path.clone()]);
        assert_eq!(tracker.lines_read(&path), 0);
    }
}
