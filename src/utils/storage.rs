//! Keyed JSON storage on the local filesystem
//!
//! Each key maps to one file `{dir}/{urlencoded key}.json`. Writes go to a
//! `.tmp` sibling first, are synced, then renamed over the final path, so a
//! reader sees either the old value or the new one.

use std::fs::{self, File};
use std::io::{self, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

/// Errors raised by [`LocalStored`]
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to encode stored value: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Storage key remembering which participant this client is in `poker_id`
pub fn participant_storage_key(poker_id: &str) -> String {
    format!("devpokerapp:participant:{poker_id}")
}

/// One persisted value of type `T`
#[derive(Debug, Clone)]
pub struct LocalStored<T> {
    key: String,
    path: PathBuf,
    _value: PhantomData<fn() -> T>,
}

impl<T: Serialize + DeserializeOwned> LocalStored<T> {
    pub fn new(dir: impl AsRef<Path>, key: impl Into<String>) -> Self {
        let key = key.into();
        let file_name = format!("{}.json", urlencoding::encode(&key));
        Self {
            path: dir.as_ref().join(file_name),
            key,
            _value: PhantomData,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the stored value.
    ///
    /// A missing file is `None`. So is a file that no longer parses as `T`;
    /// it is logged and left in place for the next `set` to overwrite.
    pub fn get(&self) -> Option<T> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!(error = %e, key = %self.key, "failed to read stored value");
                return None;
            }
        };
        serde_json::from_str(&raw)
            .map_err(|e| warn!(error = %e, key = %self.key, "discarding unreadable stored value"))
            .ok()
    }

    /// Persist `value`, replacing any previous one
    pub fn set(&self, value: &T) -> Result<(), StorageError> {
        let content = serde_json::to_string(value)?;
        self.write_atomic(content.as_bytes())
            .map_err(|source| StorageError::Io {
                path: self.path.clone(),
                source,
            })?;
        debug!(key = %self.key, "stored value written");
        Ok(())
    }

    /// Forget the stored value. Clearing an absent key is not an error.
    pub fn clear(&self) -> Result<(), StorageError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StorageError::Io {
                path: self.path.clone(),
                source,
            }),
        }
    }

    fn write_atomic(&self, content: &[u8]) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let temp_path = self.path.with_extension("json.tmp");
        let mut file = File::create(&temp_path)?;
        file.write_all(content)?;
        file.sync_all()?;
        fs::rename(&temp_path, &self.path)
    }
}
