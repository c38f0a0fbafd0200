//! Durable storage for the single trusted checkpoint.
//!
//! The engine serializes the whole load-verify-save cycle behind one mutex,
//! so implementations only need plain `load`/`save`; they are always called
//! with the engine's lock held.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use verivote_types::Checkpoint;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("checkpoint i/o error: {0}")]
    Io(#[from] io::Error),

    #[error("checkpoint serialization error: {0}")]
    Serialization(String),
}

/// Persistence contract for the trusted checkpoint.
pub trait CheckpointStore: Send {
    /// The last trusted checkpoint, or `None` if nothing was ever trusted.
    fn load(&mut self) -> Result<Option<Checkpoint>, CacheError>;

    /// Replace the trusted checkpoint. Only called after verification.
    fn save(&mut self, checkpoint: &Checkpoint) -> Result<(), CacheError>;
}

impl<T: CheckpointStore + ?Sized> CheckpointStore for Box<T> {
    fn load(&mut self) -> Result<Option<Checkpoint>, CacheError> {
        (**self).load()
    }

    fn save(&mut self, checkpoint: &Checkpoint) -> Result<(), CacheError> {
        (**self).save(checkpoint)
    }
}

/// In-memory checkpoint store (tests, short-lived clients).
#[derive(Default)]
pub struct MemoryCheckpointStore {
    checkpoint: Option<Checkpoint>,
}

impl MemoryCheckpointStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CheckpointStore for MemoryCheckpointStore {
    fn load(&mut self) -> Result<Option<Checkpoint>, CacheError> {
        Ok(self.checkpoint.clone())
    }

    fn save(&mut self, checkpoint: &Checkpoint) -> Result<(), CacheError> {
        self.checkpoint = Some(checkpoint.clone());
        Ok(())
    }
}

/// On-disk JSON serialization of a checkpoint.
#[derive(Serialize, Deserialize)]
struct CheckpointFile {
    checkpoint: Checkpoint,
}

/// File-backed checkpoint store, surviving restarts.
///
/// Writes go to a sibling temp file first and are renamed into place, so a
/// crash mid-save leaves the previous checkpoint intact.
pub struct FileCheckpointStore {
    path: PathBuf,
}

impl FileCheckpointStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    fn temp_path(&self) -> PathBuf {
        let mut p = self.path.as_os_str().to_owned();
        p.push(".tmp");
        PathBuf::from(p)
    }
}

impl CheckpointStore for FileCheckpointStore {
    fn load(&mut self) -> Result<Option<Checkpoint>, CacheError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let file: CheckpointFile = serde_json::from_str(&contents)
            .map_err(|e| CacheError::Serialization(e.to_string()))?;
        Ok(Some(file.checkpoint))
    }

    fn save(&mut self, checkpoint: &Checkpoint) -> Result<(), CacheError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let file = CheckpointFile {
            checkpoint: checkpoint.clone(),
        };
        let json = serde_json::to_string_pretty(&file)
            .map_err(|e| CacheError::Serialization(e.to_string()))?;
        let temp = self.temp_path();
        fs::write(&temp, json)?;
        fs::rename(&temp, &self.path)?;
        Ok(())
    }
}
