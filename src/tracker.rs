//! File set tracking
//!
//! Keeps the list of watched files with their last seen modification time,
//! enumerates matching files in a directory, and polls individual files.
//! Entries are never pruned: a file that disappears stays tracked and is
//! skipped until it comes back, so memory grows by one entry per file ever
//! seen in the directory.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::config::WATCHED_EXTENSIONS;
use crate::error::WatchError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WatchMode {
    SingleFile,
    Directory,
}

/// The path given on the command line, classified once at startup.
#[derive(Clone, Debug)]
pub struct WatchTarget {
    path: PathBuf,
    mode: WatchMode,
}

impl WatchTarget {
    /// Stats `path` and decides between single-file and directory mode.
    pub fn inspect(path: &Path) -> Result<Self, WatchError> {
        let metadata = fs::metadata(path).map_err(|source| WatchError::PathNotFound {
            path: path.to_path_buf(),
            source,
        })?;
        let mode = if metadata.is_dir() {
            WatchMode::Directory
        } else if metadata.is_file() {
            WatchMode::SingleFile
        } else {
            return Err(WatchError::PathNotFound {
                path: path.to_path_buf(),
                source: io::Error::new(
                    io::ErrorKind::InvalidInput,
                    "not a regular file or directory",
                ),
            });
        };
        Ok(Self {
            path: path.to_path_buf(),
            mode,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn mode(&self) -> WatchMode {
        self.mode
    }
}

#[derive(Clone, Debug)]
pub struct TrackedFile {
    pub path: PathBuf,
    pub modified: SystemTime,
    /// False while the last poll failed.
    pub available: bool,
}

impl TrackedFile {
    fn new(path: PathBuf, modified: SystemTime) -> Self {
        Self {
            path,
            modified,
            available: true,
        }
    }
}

/// Initial scan of the target.
///
/// A single file yields one entry. A directory yields every immediate entry
/// with a watched extension, which may be none at all.
pub fn initialize(target: &WatchTarget) -> Result<Vec<TrackedFile>, WatchError> {
    let not_found = |source| WatchError::PathNotFound {
        path: target.path.clone(),
        source,
    };
    match target.mode {
        WatchMode::SingleFile => {
            let file = File::open(&target.path).map_err(not_found)?;
            let modified = file.metadata().and_then(|m| m.modified()).map_err(not_found)?;
            Ok(vec![TrackedFile::new(target.path.clone(), modified)])
        }
        WatchMode::Directory => scan_dir(&target.path).map_err(not_found),
    }
}

/// Re-enumerates matching files in `dir` with fresh timestamps.
///
/// Does not touch any tracked state; see [`FileSet::merge`].
pub fn rescan(dir: &Path) -> Result<Vec<TrackedFile>, WatchError> {
    scan_dir(dir).map_err(|source| WatchError::TransientFile {
        path: dir.to_path_buf(),
        source,
    })
}

/// Opens the file and reads its current modification time.
pub fn poll_one(file: &TrackedFile) -> Result<SystemTime, WatchError> {
    File::open(&file.path)
        .and_then(|f| f.metadata())
        .and_then(|m| m.modified())
        .map_err(|source| WatchError::TransientFile {
            path: file.path.clone(),
            source,
        })
}

pub fn is_watched_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| WATCHED_EXTENSIONS.contains(&ext))
        .unwrap_or(false)
}

fn scan_dir(dir: &Path) -> io::Result<Vec<TrackedFile>> {
    let mut found = Vec::new();
    for entry in fs::read_dir(dir)? {
        // Entries that vanish or can't be stat-ed mid-listing are picked up
        // on a later rescan.
        let Ok(entry) = entry else { continue };
        let path = entry.path();
        if !is_watched_extension(&path) {
            continue;
        }
        let Ok(metadata) = fs::metadata(&path) else {
            continue;
        };
        if !metadata.is_file() {
            continue;
        }
        if let Ok(modified) = metadata.modified() {
            found.push(TrackedFile::new(path, modified));
        }
    }
    found.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(found)
}

/// Result of comparing a poll against the stored timestamp.
#[derive(Debug, PartialEq, Eq)]
pub enum Observation {
    Unchanged,
    Modified,
}

/// The tracked files, in insertion order. Paths are unique.
#[derive(Debug, Default)]
pub struct FileSet {
    files: Vec<TrackedFile>,
}

impl FileSet {
    pub fn new(files: Vec<TrackedFile>) -> Self {
        let mut set = Self::default();
        set.merge(files);
        set
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn files(&self) -> &[TrackedFile] {
        &self.files
    }

    pub fn files_mut(&mut self) -> &mut [TrackedFile] {
        &mut self.files
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.files.iter().any(|f| f.path == path)
    }

    /// Appends scanned entries whose path is not tracked yet.
    ///
    /// Returns the paths that were added.
    pub fn merge(&mut self, scanned: Vec<TrackedFile>) -> Vec<PathBuf> {
        let mut added = Vec::new();
        for file in scanned {
            if self.contains(&file.path) {
                continue;
            }
            added.push(file.path.clone());
            self.files.push(file);
        }
        added
    }
}

/// Records a polled timestamp. Only a strictly newer time counts as a change,
/// and it is stored whether or not a reload follows.
pub fn observe(file: &mut TrackedFile, current: SystemTime) -> Observation {
    if current > file.modified {
        file.modified = current;
        Observation::Modified
    } else {
        Observation::Unchanged
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::OpenOptions;
    use std::time::Duration;
    use tempfile::tempdir;

    fn touch(path: &Path, modified: SystemTime) {
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(path)
            .unwrap();
        file.set_modified(modified).unwrap();
    }

    fn at(secs: u64) -> SystemTime {
        SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000 + secs)
    }

    #[test]
    fn test_inspect_missing_path_is_fatal() {
        let dir = tempdir().unwrap();
        let err = WatchTarget::inspect(&dir.path().join("nope.p8")).unwrap_err();
        assert!(matches!(err, WatchError::PathNotFound { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_inspect_rejects_special_files() {
        let err = WatchTarget::inspect(Path::new("/dev/null")).unwrap_err();
        assert!(matches!(err, WatchError::PathNotFound { .. }));
        assert!(err.to_string().contains("not a regular file or directory"));
    }

    #[test]
    fn test_inspect_detects_mode() {
        let dir = tempdir().unwrap();
        let cart = dir.path().join("game.p8");
        touch(&cart, at(0));

        assert_eq!(
            WatchTarget::inspect(dir.path()).unwrap().mode(),
            WatchMode::Directory
        );
        assert_eq!(
            WatchTarget::inspect(&cart).unwrap().mode(),
            WatchMode::SingleFile
        );
    }

    #[test]
    fn test_initialize_single_file() {
        let dir = tempdir().unwrap();
        let cart = dir.path().join("notes.txt");
        touch(&cart, at(5));

        // Single-file mode ignores the extension filter
        let target = WatchTarget::inspect(&cart).unwrap();
        let files = initialize(&target).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].path, cart);
        assert_eq!(files[0].modified, at(5));
    }

    #[test]
    fn test_initialize_directory_filters_extensions() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("main.lua"), at(1));
        touch(&dir.path().join("game.p8"), at(1));
        touch(&dir.path().join("README.md"), at(1));
        touch(&dir.path().join("upper.LUA"), at(1));
        touch(&dir.path().join("sprites.p8.png"), at(1));
        fs::create_dir(dir.path().join("lib.lua")).unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        touch(&dir.path().join("nested").join("deep.lua"), at(1));

        let target = WatchTarget::inspect(dir.path()).unwrap();
        let files = initialize(&target).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|f| f.path.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["game.p8", "main.lua"]);
    }

    #[test]
    fn test_initialize_empty_directory_is_ok() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("notes.txt"), at(1));

        let target = WatchTarget::inspect(dir.path()).unwrap();
        assert!(initialize(&target).unwrap().is_empty());
    }

    #[test]
    fn test_rescan_missing_directory_is_transient() {
        let dir = tempdir().unwrap();
        let gone = dir.path().join("gone");
        let err = rescan(&gone).unwrap_err();
        assert!(matches!(err, WatchError::TransientFile { .. }));
    }

    #[test]
    fn test_poll_one_reads_timestamp() {
        let dir = tempdir().unwrap();
        let cart = dir.path().join("game.p8");
        touch(&cart, at(1));
        let tracked = TrackedFile::new(cart.clone(), at(0));

        assert_eq!(poll_one(&tracked).unwrap(), at(1));

        fs::remove_file(&cart).unwrap();
        assert!(matches!(
            poll_one(&tracked),
            Err(WatchError::TransientFile { .. })
        ));
    }

    #[test]
    fn test_observe_requires_strictly_newer() {
        let mut file = TrackedFile::new(PathBuf::from("a.lua"), at(10));

        assert_eq!(observe(&mut file, at(10)), Observation::Unchanged);
        assert_eq!(observe(&mut file, at(9)), Observation::Unchanged);
        assert_eq!(file.modified, at(10));

        assert_eq!(observe(&mut file, at(11)), Observation::Modified);
        assert_eq!(file.modified, at(11));
        assert_eq!(observe(&mut file, at(11)), Observation::Unchanged);
    }

    #[test]
    fn test_merge_is_idempotent() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("a.lua"), at(1));
        touch(&dir.path().join("b.p8"), at(1));

        let mut set = FileSet::new(rescan(dir.path()).unwrap());
        assert_eq!(set.len(), 2);

        let added = set.merge(rescan(dir.path()).unwrap());
        assert!(added.is_empty());
        assert_eq!(set.len(), 2);

        touch(&dir.path().join("c.lua"), at(2));
        let added = set.merge(rescan(dir.path()).unwrap());
        assert_eq!(added, vec![dir.path().join("c.lua")]);
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn test_merge_keeps_existing_timestamp() {
        let mut set = FileSet::new(vec![TrackedFile::new(PathBuf::from("a.lua"), at(1))]);
        let added = set.merge(vec![TrackedFile::new(PathBuf::from("a.lua"), at(5))]);

        assert!(added.is_empty());
        assert_eq!(set.files()[0].modified, at(1));
    }
}
