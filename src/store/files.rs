use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use std::time::SystemTime;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::{CmsError, Result};

/// Parsed document plus the file metadata it was read at.
struct CachedDoc {
    modified: Option<SystemTime>,
    len: u64,
    value: Value,
}

/// JSON documents under one data directory.
///
/// Reads are cached in memory and revalidated against the file's mtime and
/// length on every access, so a document edited on disk by another process
/// is picked up on the next read. Writes replace the whole file through a
/// temp file + rename.
pub struct JsonFiles {
    root: PathBuf,
    cache: RwLock<HashMap<PathBuf, CachedDoc>>,
}

impl JsonFiles {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(JsonFiles {
            root,
            cache: RwLock::new(HashMap::new()),
        })
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    /// Read and deserialize `name`. A missing or empty file yields `T::default()`.
    pub fn read_json_file<T: DeserializeOwned + Default>(&self, name: &str) -> Result<T> {
        let path = self.path(name);
        let meta = match fs::metadata(&path) {
            Ok(m) => m,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                self.forget(&path);
                return Ok(T::default());
            }
            Err(e) => return Err(e.into()),
        };
        let modified = meta.modified().ok();
        let len = meta.len();

        {
            let cache = self.cache.read().unwrap_or_else(|e| e.into_inner());
            if let Some(doc) = cache.get(&path) {
                if doc.modified == modified && doc.len == len {
                    return Ok(serde_json::from_value(doc.value.clone())?);
                }
            }
        }

        let raw = fs::read_to_string(&path)?;
        if raw.trim().is_empty() {
            return Ok(T::default());
        }
        let value: Value = serde_json::from_str(&raw).map_err(|e| {
            CmsError::Serialization(format!("{}: {}", path.display(), e))
        })?;
        let parsed: T = serde_json::from_value(value.clone()).map_err(|e| {
            CmsError::Serialization(format!("{}: {}", path.display(), e))
        })?;

        let mut cache = self.cache.write().unwrap_or_else(|e| e.into_inner());
        cache.insert(path, CachedDoc { modified, len, value });
        Ok(parsed)
    }

    /// Like `read_json_file`, but logs and falls back to the default on error.
    /// Only for read paths; writers must use the strict variant so a corrupt
    /// document is never overwritten with an empty one.
    pub fn read_json_file_or_default<T: DeserializeOwned + Default>(&self, name: &str) -> T {
        match self.read_json_file(name) {
            Ok(v) => v,
            Err(e) => {
                log::error!("Failed to read {}: {}", name, e);
                T::default()
            }
        }
    }

    /// Serialize `value` and atomically replace `name`.
    pub fn write_json_file<T: Serialize>(&self, name: &str, value: &T) -> Result<()> {
        let path = self.path(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let value = serde_json::to_value(value)?;
        let body = serde_json::to_string_pretty(&value)?;

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "doc.json".to_string());
        let tmp = path.with_file_name(format!(".{}.{}.tmp", file_name, uuid::Uuid::new_v4()));
        if let Err(e) = fs::write(&tmp, body.as_bytes()) {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }
        if let Err(e) = fs::rename(&tmp, &path) {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }

        let meta = fs::metadata(&path)?;
        let mut cache = self.cache.write().unwrap_or_else(|e| e.into_inner());
        cache.insert(
            path,
            CachedDoc {
                modified: meta.modified().ok(),
                len: meta.len(),
                value,
            },
        );
        Ok(())
    }

    /// Delete `name`. Returns whether a file was removed.
    pub fn remove_file(&self, name: &str) -> Result<bool> {
        let path = self.path(name);
        self.forget(&path);
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Run `f` while holding an exclusive advisory lock tied to `name`.
    /// Other writers going through this method (in any process) wait.
    pub fn with_locked_file<R>(&self, name: &str, f: impl FnOnce() -> Result<R>) -> Result<R> {
        let lock_path = self.path(&format!("{}.lock", name));
        if let Some(parent) = lock_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = fs::OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)?;
        let _guard = FileLock::acquire(&file)?;
        f()
    }

    /// Total size of every file under the data directory.
    pub fn total_bytes(&self) -> u64 {
        fn walk(dir: &Path) -> u64 {
            let Ok(entries) = fs::read_dir(dir) else {
                return 0;
            };
            entries
                .flatten()
                .map(|e| {
                    let p = e.path();
                    if p.is_dir() {
                        walk(&p)
                    } else {
                        e.metadata().map(|m| m.len()).unwrap_or(0)
                    }
                })
                .sum()
        }
        walk(&self.root)
    }

    fn forget(&self, path: &Path) {
        let mut cache = self.cache.write().unwrap_or_else(|e| e.into_inner());
        cache.remove(path);
    }
}

/// `flock(LOCK_EX)` held until drop.
struct FileLock<'a> {
    #[allow(dead_code)]
    file: &'a fs::File,
}

impl<'a> FileLock<'a> {
    #[cfg(unix)]
    fn acquire(file: &'a fs::File) -> Result<Self> {
        use std::os::unix::io::AsRawFd;
        let rc = unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_EX) };
        if rc != 0 {
            return Err(std::io::Error::last_os_error().into());
        }
        Ok(FileLock { file })
    }

    #[cfg(not(unix))]
    fn acquire(file: &'a fs::File) -> Result<Self> {
        Ok(FileLock { file })
    }
}

impl Drop for FileLock<'_> {
    fn drop(&mut self) {
        #[cfg(unix)]
        {
            use std::os::unix::io::AsRawFd;
            unsafe {
                libc::flock(self.file.as_raw_fd(), libc::LOCK_UN);
            }
        }
    }
}
