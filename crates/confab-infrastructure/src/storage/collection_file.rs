//! Atomic TOML collection files.
//!
//! Each registry collection is stored as one TOML blob; every mutation
//! rewrites the whole file. Writes go through a temp file, fsync and an
//! atomic rename, guarded by an advisory lock against concurrent writers.

use confab_core::{ConfabError, Result};
use serde::{Serialize, de::DeserializeOwned};
use std::fs::{self, File, OpenOptions};
use std::io::Write as IoWrite;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

/// A typed handle to one collection blob on disk.
pub struct CollectionFile<T> {
    path: PathBuf,
    _phantom: PhantomData<T>,
}

impl<T> CollectionFile<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            _phantom: PhantomData,
        }
    }

    /// Loads and deserializes the collection.
    ///
    /// Returns `None` when the file does not exist or is empty, so a
    /// fresh deployment starts from an empty collection.
    pub fn load(&self) -> Result<Option<T>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(None);
        }
        let data: T = toml::from_str(&content)?;
        Ok(Some(data))
    }

    /// Replaces the collection on disk atomically.
    ///
    /// The caller may only treat the mutation as durable once this
    /// returns `Ok`.
    pub fn save(&self, data: &T) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }
        let _lock = FileLock::acquire(&self.path)?;

        let rendered = toml::to_string_pretty(data)?;
        let tmp_path = self.temp_path()?;
        let mut tmp_file = File::create(&tmp_path)?;
        tmp_file.write_all(rendered.as_bytes())?;
        tmp_file.sync_all()?;
        drop(tmp_file);

        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }

    fn temp_path(&self) -> Result<PathBuf> {
        let parent = self
            .path
            .parent()
            .ok_or_else(|| ConfabError::io("collection path has no parent directory"))?;
        let file_name = self
            .path
            .file_name()
            .ok_or_else(|| ConfabError::io("collection path has no file name"))?;
        Ok(parent.join(format!(".{}.tmp", file_name.to_string_lossy())))
    }
}

/// Advisory lock released on drop.
struct FileLock {
    #[allow(dead_code)]
    file: File,
    lock_path: PathBuf,
}

impl FileLock {
    fn acquire(path: &Path) -> Result<Self> {
        let lock_path = path.with_extension("lock");
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)?;

        #[cfg(unix)]
        {
            use fs2::FileExt;
            file.lock_exclusive().map_err(|err| {
                ConfabError::data_access(format!("failed to lock {:?}: {err}", lock_path))
            })?;
        }

        Ok(FileLock { file, lock_path })
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        // Unlock is automatic when the file handle is dropped.
        let _ = fs::remove_file(&self.lock_path);
    }
}
