//! Storage backends for the progress record
use std::cell::RefCell;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use thiserror::Error;

use crate::ProgressStorage;
use crate::constants::DEFAULT_PROGRESS_FILE;
use crate::progress::ProgressRecord;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to read {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to write {}: {source}", path.display())]
    Write { path: PathBuf, source: io::Error },
    #[error("progress data in {} is corrupt: {source}", path.display())]
    Corrupt {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("failed to serialize progress: {0}")]
    Serialize(#[source] serde_json::Error),
    #[error("progress storage is read-only")]
    ReadOnly,
}

/// Serialize a record the way it is stored on disk: four-space indented
/// JSON with a trailing newline.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn encode_record(record: &ProgressRecord) -> Result<Vec<u8>, serde_json::Error> {
    let mut buf = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    record.serialize(&mut ser)?;
    buf.push(b'\n');
    Ok(buf)
}

/// Parse stored bytes, backfilling absent fields with their defaults.
///
/// # Errors
///
/// Returns an error if the bytes are not a JSON object matching the record.
pub fn decode_record(bytes: &[u8]) -> Result<ProgressRecord, serde_json::Error> {
    serde_json::from_slice(bytes)
}

/// Progress kept in a single JSON file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(std::ffi::OsStr::to_os_string)
            .unwrap_or_else(|| DEFAULT_PROGRESS_FILE.into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn write_err(&self, source: io::Error) -> StorageError {
        StorageError::Write {
            path: self.path.clone(),
            source,
        }
    }
}

impl ProgressStorage for JsonFileStorage {
    type Error = StorageError;

    fn load(&self) -> Result<Option<ProgressRecord>, Self::Error> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                log::debug!("no progress file at {}", self.path.display());
                return Ok(None);
            }
            Err(source) => {
                return Err(StorageError::Read {
                    path: self.path.clone(),
                    source,
                });
            }
        };
        decode_record(&bytes)
            .map(Some)
            .map_err(|source| StorageError::Corrupt {
                path: self.path.clone(),
                source,
            })
    }

    fn save(&self, record: &ProgressRecord) -> Result<(), Self::Error> {
        let bytes = encode_record(record).map_err(StorageError::Serialize)?;
        let temp = self.temp_path();
        {
            let mut file = File::create(&temp).map_err(|e| self.write_err(e))?;
            file.write_all(&bytes).map_err(|e| self.write_err(e))?;
            file.sync_all().map_err(|e| self.write_err(e))?;
        }
        if let Err(err) = fs::rename(&temp, &self.path) {
            let _ = fs::remove_file(&temp);
            return Err(self.write_err(err));
        }
        log::debug!("saved progress to {}", self.path.display());
        Ok(())
    }
}

#[derive(Debug, Default)]
struct MemorySlot {
    bytes: Option<Vec<u8>>,
    read_only: bool,
    saves: usize,
}

/// In-memory storage holding the encoded record. Clones share the same slot.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    slot: Rc<RefCell<MemorySlot>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage pre-seeded with raw stored content.
    #[must_use]
    pub fn with_contents(contents: impl Into<Vec<u8>>) -> Self {
        let storage = Self::default();
        storage.slot.borrow_mut().bytes = Some(contents.into());
        storage
    }

    /// Stored content as text, if anything has been saved.
    #[must_use]
    pub fn contents(&self) -> Option<String> {
        self.slot
            .borrow()
            .bytes
            .as_ref()
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
    }

    /// Number of successful saves.
    #[must_use]
    pub fn save_count(&self) -> usize {
        self.slot.borrow().saves
    }

    /// Make subsequent saves fail with [`StorageError::ReadOnly`].
    pub fn set_read_only(&self, read_only: bool) {
        self.slot.borrow_mut().read_only = read_only;
    }
}

impl ProgressStorage for MemoryStorage {
    type Error = StorageError;

    fn load(&self) -> Result<Option<ProgressRecord>, Self::Error> {
        let slot = self.slot.borrow();
        slot.bytes
            .as_deref()
            .map(decode_record)
            .transpose()
            .map_err(|source| StorageError::Corrupt {
                path: PathBuf::from("<memory>"),
                source,
            })
    }

    fn save(&self, record: &ProgressRecord) -> Result<(), Self::Error> {
        let mut slot = self.slot.borrow_mut();
        if slot.read_only {
            return Err(StorageError::ReadOnly);
        }
        slot.bytes = Some(encode_record(record).map_err(StorageError::Serialize)?);
        slot.saves += 1;
        Ok(())
    }
}
