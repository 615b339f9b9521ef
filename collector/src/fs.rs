//! Narrow filesystem contract.
//!
//! The engine never calls a filesystem API directly; everything goes through
//! [`FileStore`] so tests can substitute a fake and the atomic-finalize
//! guarantee lives in one place.

use crate::error::{CollectorError, CollectorResult};
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

/// Filesystem operations the engine relies on.
pub trait FileStore: Send + Sync {
    fn create_dir_all(&self, dir: &Path) -> CollectorResult<()>;
    fn file_exists(&self, path: &Path) -> bool;
    fn open_read(&self, path: &Path) -> CollectorResult<Box<dyn Read + Send>>;
    fn read(&self, path: &Path) -> CollectorResult<Vec<u8>>;
    fn read_to_string(&self, path: &Path) -> CollectorResult<String>;

    /// Writes `bytes` so that `path` either keeps its old content or holds
    /// the complete new content, never a truncated intermediate state.
    fn write_atomic(&self, path: &Path, bytes: &[u8]) -> CollectorResult<()>;

    fn copy(&self, from: &Path, to: &Path) -> CollectorResult<()>;
    fn remove_file(&self, path: &Path) -> CollectorResult<()>;

    /// Regular files in `dir` whose extension matches `extension`
    /// (case-insensitive, no leading dot), sorted by filename so that batch
    /// passes are deterministic.
    fn list_with_extension(&self, dir: &Path, extension: &str) -> CollectorResult<Vec<PathBuf>>;
}

/// The real filesystem.
#[derive(Debug, Clone, Default)]
pub struct OsFileStore;

impl FileStore for OsFileStore {
    fn create_dir_all(&self, dir: &Path) -> CollectorResult<()> {
        fs::create_dir_all(dir).map_err(|e| CollectorError::io(dir, e))
    }

    fn file_exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn open_read(&self, path: &Path) -> CollectorResult<Box<dyn Read + Send>> {
        let file = fs::File::open(path).map_err(|e| CollectorError::io(path, e))?;
        Ok(Box::new(file))
    }

    fn read(&self, path: &Path) -> CollectorResult<Vec<u8>> {
        fs::read(path).map_err(|e| CollectorError::io(path, e))
    }

    fn read_to_string(&self, path: &Path) -> CollectorResult<String> {
        fs::read_to_string(path).map_err(|e| CollectorError::io(path, e))
    }

    fn write_atomic(&self, path: &Path, bytes: &[u8]) -> CollectorResult<()> {
        let parent = path.parent().unwrap_or_else(|| Path::new("."));
        let mut tmp =
            tempfile::NamedTempFile::new_in(parent).map_err(|e| CollectorError::io(parent, e))?;
        tmp.write_all(bytes)
            .and_then(|_| tmp.flush())
            .map_err(|e| CollectorError::io(path, e))?;
        tmp.persist(path)
            .map_err(|e| CollectorError::io(path, e.error))?;
        Ok(())
    }

    fn copy(&self, from: &Path, to: &Path) -> CollectorResult<()> {
        fs::copy(from, to)
            .map(|_| ())
            .map_err(|e| CollectorError::io(to, e))
    }

    fn remove_file(&self, path: &Path) -> CollectorResult<()> {
        fs::remove_file(path).map_err(|e| CollectorError::io(path, e))
    }

    fn list_with_extension(&self, dir: &Path, extension: &str) -> CollectorResult<Vec<PathBuf>> {
        let entries = fs::read_dir(dir).map_err(|e| CollectorError::io(dir, e))?;
        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| CollectorError::io(dir, e))?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let matches = path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| e.eq_ignore_ascii_case(extension))
                .unwrap_or(false);
            if matches {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }
}
