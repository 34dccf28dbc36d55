//! Storage layer for studylog
//!
//! All persisted state lives in a single data directory. Each store owns one
//! document and is the only writer of it.
//!
//! # Directory Structure
//!
//! ```text
//! <data-dir>/
//!   studylog.toml             # Optional configuration
//!   immersion.jsonl           # Immersion minutes, one row per date
//!   checklist.jsonl           # Checklist days, one row per date
//!   tasks.json                # Custom task catalog
//!   tasks/
//!     <task-key>.jsonl        # Logged values for one custom task
//! ```
//!
//! Stores talk to a [`Backend`] rather than to the filesystem directly, so
//! tests can swap in [`MemoryBackend`].

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use serde::{de::DeserializeOwned, Serialize};
use tempfile::NamedTempFile;

use crate::error::{Error, Result};

/// Environment variable overriding the data directory
pub const DATA_DIR_ENV: &str = "STUDYLOG_DIR";

/// Fallback data directory when no platform directory is available
pub const FALLBACK_DIR: &str = ".studylog";

/// Name of the configuration file inside the data directory
pub const CONFIG_FILE: &str = "studylog.toml";

/// Storage key of the immersion store
pub const IMMERSION_KEY: &str = "immersion.jsonl";

/// Storage key of the checklist store
pub const CHECKLIST_KEY: &str = "checklist.jsonl";

/// Storage key of the task catalog document
pub const CATALOG_KEY: &str = "tasks.json";

/// Directory holding per-task stores
pub const TASKS_DIR: &str = "tasks";

/// Persistence collaborator for stores and the catalog.
///
/// Keys are relative document names such as `immersion.jsonl`. A document
/// that does not exist yet reads as `None`, never as an error.
pub trait Backend {
    /// Read a whole document
    fn read_all(&self, key: &str) -> Result<Option<String>>;

    /// Replace a whole document
    fn write_all(&self, key: &str, contents: &str) -> Result<()>;

    /// Remove a document; removing a missing document succeeds
    fn remove(&self, key: &str) -> Result<()>;
}

/// Shared handle to a backend
pub type SharedBackend = Arc<dyn Backend>;

/// Storage key of the store backing a custom task
pub fn task_store_key(task_id: &str) -> String {
    format!("{}/{}.jsonl", TASKS_DIR, encode_key(task_id))
}

/// Make a task id safe to use as a file name.
///
/// Alphanumerics (any script), `-` and `_` pass through; every other byte is
/// percent-encoded, so two distinct ids never map to the same key.
fn encode_key(id: &str) -> String {
    let mut key = String::with_capacity(id.len());
    for ch in id.chars() {
        if ch.is_alphanumeric() || ch == '-' || ch == '_' {
            key.push(ch);
        } else {
            let mut buf = [0u8; 4];
            for byte in ch.encode_utf8(&mut buf).bytes() {
                key.push_str(&format!("%{:02X}", byte));
            }
        }
    }
    if key.is_empty() {
        "%".to_string()
    } else {
        key
    }
}

// =============================================================================
// Filesystem backend
// =============================================================================

/// Backend rooted at a data directory
#[derive(Debug, Clone)]
pub struct FsBackend {
    root: PathBuf,
}

impl FsBackend {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Path to the data directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the document behind a key
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }

    /// Path to the configuration file
    pub fn config_file(&self) -> PathBuf {
        self.root.join(CONFIG_FILE)
    }
}

impl Backend for FsBackend {
    fn read_all(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(Error::Io(err)),
        }
    }

    fn write_all(&self, key: &str, contents: &str) -> Result<()> {
        write_atomic(&self.path_for(key), contents.as_bytes())
    }

    fn remove(&self, key: &str) -> Result<()> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(Error::Io(err)),
        }
    }
}

/// Write data atomically using temp file + rename
///
/// The temp file lives in the target directory so the rename never crosses
/// filesystems. The document is either fully replaced or left untouched.
pub fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&parent)?;

    let mut temp = NamedTempFile::new_in(&parent)?;
    temp.write_all(data)?;
    temp.as_file().sync_all()?;

    temp.persist(path).map_err(|err| Error::Io(err.error))?;
    Ok(())
}

// =============================================================================
// In-memory backend
// =============================================================================

/// Backend keeping documents in memory
#[derive(Debug, Default)]
pub struct MemoryBackend {
    documents: Mutex<BTreeMap<String, String>>,
    fail_writes: AtomicBool,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write and remove fail with an I/O error
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Names of the documents currently held
    pub fn keys(&self) -> Vec<String> {
        self.documents().keys().cloned().collect()
    }

    /// Insert a raw document, bypassing failure injection
    pub fn insert_raw(&self, key: &str, contents: &str) {
        self.documents()
            .insert(key.to_string(), contents.to_string());
    }

    fn documents(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, String>> {
        self.documents
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn check_writable(&self, key: &str) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::Io(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("write to {key} refused"),
            )));
        }
        Ok(())
    }
}

impl Backend for MemoryBackend {
    fn read_all(&self, key: &str) -> Result<Option<String>> {
        Ok(self.documents().get(key).cloned())
    }

    fn write_all(&self, key: &str, contents: &str) -> Result<()> {
        self.check_writable(key)?;
        self.documents()
            .insert(key.to_string(), contents.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.check_writable(key)?;
        self.documents().remove(key);
        Ok(())
    }
}

// =============================================================================
// Document encoding
// =============================================================================

/// Encode rows as JSONL (one JSON object per line)
pub fn encode_jsonl<T: Serialize>(rows: &[T]) -> Result<String> {
    let mut out = String::new();
    for row in rows {
        out.push_str(&serde_json::to_string(row)?);
        out.push('\n');
    }
    Ok(out)
}

/// Decode JSONL rows, skipping blank lines
///
/// A line that fails to parse is reported as corrupt data with its line
/// number.
pub fn decode_jsonl<T: DeserializeOwned>(key: &str, content: &str) -> Result<Vec<T>> {
    let mut rows = Vec::new();
    for (idx, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let row = serde_json::from_str(line).map_err(|err| Error::CorruptData {
            store: key.to_string(),
            reason: format!("line {}: {}", idx + 1, err),
        })?;
        rows.push(row);
    }
    Ok(rows)
}

// =============================================================================
// Data directory resolution
// =============================================================================

/// Resolve the data directory: explicit path, then `STUDYLOG_DIR`, then the
/// platform data directory, then `./.studylog`.
pub fn resolve_data_dir(explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }

    if let Ok(value) = std::env::var(DATA_DIR_ENV) {
        let value = value.trim();
        if !value.is_empty() {
            return PathBuf::from(value);
        }
    }

    directories::ProjectDirs::from("", "", "studylog")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from(FALLBACK_DIR))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_fs_backend_missing_reads_none() {
        let temp = TempDir::new().unwrap();
        let backend = FsBackend::new(temp.path());

        assert!(backend.read_all(IMMERSION_KEY).unwrap().is_none());
        backend.remove(IMMERSION_KEY).unwrap();
    }

    #[test]
    fn test_fs_backend_write_read_remove() {
        let temp = TempDir::new().unwrap();
        let backend = FsBackend::new(temp.path().join("nested"));

        let key = task_store_key("reading");
        backend.write_all(&key, "first\n").unwrap();
        backend.write_all(&key, "second\n").unwrap();

        assert_eq!(backend.read_all(&key).unwrap().as_deref(), Some("second\n"));
        assert!(temp.path().join("nested/tasks/reading.jsonl").exists());

        backend.remove(&key).unwrap();
        assert!(backend.read_all(&key).unwrap().is_none());
    }

    #[test]
    fn test_atomic_write_leaves_no_temp_files() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("data.jsonl");

        write_atomic(&path, b"{\"a\":1}\n").unwrap();
        write_atomic(&path, b"{\"a\":2}\n").unwrap();

        let names: Vec<_> = fs::read_dir(temp.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(names.len(), 1);
        assert_eq!(fs::read_to_string(&path).unwrap(), "{\"a\":2}\n");
    }

    #[test]
    fn test_task_store_key_encoding() {
        assert_eq!(task_store_key("reading_1"), "tasks/reading_1.jsonl");
        assert_eq!(task_store_key("a/b"), "tasks/a%2Fb.jsonl");
        assert_eq!(task_store_key("a%2Fb"), "tasks/a%252Fb.jsonl");
        assert_eq!(task_store_key("長文読解"), "tasks/長文読解.jsonl");
        assert_ne!(task_store_key("a.b"), task_store_key("a_b"));
    }

    #[test]
    fn test_memory_backend_failure_injection() {
        let backend = MemoryBackend::new();
        backend.write_all("x", "1").unwrap();

        backend.set_fail_writes(true);
        assert!(matches!(backend.write_all("x", "2"), Err(Error::Io(_))));
        assert!(matches!(backend.remove("x"), Err(Error::Io(_))));
        assert_eq!(backend.read_all("x").unwrap().as_deref(), Some("1"));

        backend.set_fail_writes(false);
        backend.remove("x").unwrap();
        assert!(backend.keys().is_empty());
    }

    #[test]
    fn test_jsonl_round_trip_and_corruption() {
        #[derive(Serialize, serde::Deserialize, PartialEq, Debug)]
        struct Record {
            id: u32,
        }

        let encoded = encode_jsonl(&[Record { id: 1 }, Record { id: 2 }]).unwrap();
        let decoded: Vec<Record> = decode_jsonl("t", &format!("{encoded}\n\n")).unwrap();
        assert_eq!(decoded, vec![Record { id: 1 }, Record { id: 2 }]);

        let err = decode_jsonl::<Record>("t", "{\"id\":1}\nnot json\n").unwrap_err();
        match err {
            Error::CorruptData { store, reason } => {
                assert_eq!(store, "t");
                assert!(reason.starts_with("line 2"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_resolve_explicit_dir_wins() {
        let dir = PathBuf::from("/tmp/somewhere");
        assert_eq!(resolve_data_dir(Some(&dir)), dir);
    }
}
