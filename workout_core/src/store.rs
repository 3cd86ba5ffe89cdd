//! Session progress persistence with file locking.
//!
//! All records live in one JSON document. Every write runs as a transaction
//! under an exclusive lock on a sibling `.lock` file and replaces the
//! document atomically, so concurrent read-modify-write cycles from threads
//! or processes serialize instead of losing updates.

use crate::{Error, Result, SessionProgress};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use uuid::Uuid;

/// Persistence for session progress records
pub trait ProgressStore {
    /// Find the record for a (session, student) pair
    fn find(&self, session_id: &str, student_id: &str) -> Result<Option<SessionProgress>>;

    fn find_by_id(&self, id: Uuid) -> Result<Option<SessionProgress>>;

    /// Insert a new record, failing with `Conflict` if the pair already has one
    fn create(&self, record: SessionProgress) -> Result<SessionProgress>;

    /// Replace an existing record by id
    fn update(&self, record: &SessionProgress) -> Result<()>;

    /// Read, modify and write one record as a single transaction
    ///
    /// If `f` returns an error nothing is written.
    fn update_with<F>(&self, id: Uuid, f: F) -> Result<SessionProgress>
    where
        F: FnOnce(&mut SessionProgress) -> Result<()>;

    fn list_for_student(&self, student_id: &str) -> Result<Vec<SessionProgress>>;
}

/// On-disk document holding every record
#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreDocument {
    #[serde(default)]
    records: Vec<SessionProgress>,
}

/// JSON-file store with fs2 locking
pub struct JsonFileStore {
    path: PathBuf,
    lock_path: PathBuf,
}

impl JsonFileStore {
    /// Create a store for the given document path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mut lock_name = path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "progress.json".into());
        lock_name.push(".lock");
        let lock_path = path.with_file_name(lock_name);
        Self { path, lock_path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn open_lock(&self) -> Result<File> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.lock_path)?;
        Ok(file)
    }

    /// Load the document for reading; a corrupted file reads as empty
    fn read_lenient(&self) -> Result<StoreDocument> {
        if !self.path.exists() {
            return Ok(StoreDocument::default());
        }
        let contents = std::fs::read_to_string(&self.path)?;
        match serde_json::from_str::<StoreDocument>(&contents) {
            Ok(doc) => Ok(doc),
            Err(e) => {
                tracing::warn!(
                    "Failed to parse progress store {:?}: {}. Treating as empty for reads.",
                    self.path,
                    e
                );
                Ok(StoreDocument::default())
            }
        }
    }

    /// Load the document for writing; corruption is a hard error
    fn read_strict(&self) -> Result<StoreDocument> {
        if !self.path.exists() {
            return Ok(StoreDocument::default());
        }
        let contents = std::fs::read_to_string(&self.path)?;
        if contents.trim().is_empty() {
            return Ok(StoreDocument::default());
        }
        Ok(serde_json::from_str(&contents)?)
    }

    fn write_document(&self, doc: &StoreDocument) -> Result<()> {
        let parent = self.path.parent().ok_or_else(|| {
            Error::Config(format!("progress store path {:?} has no parent", self.path))
        })?;

        let temp = NamedTempFile::new_in(parent)?;
        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            serde_json::to_writer(&mut writer, doc)?;
            writer.flush()?;
        }
        temp.as_file().sync_all()?;
        temp.persist(&self.path).map_err(|e| Error::Io(e.error))?;
        Ok(())
    }

    fn read<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(StoreDocument) -> T,
    {
        let lock = self.open_lock()?;
        lock.lock_shared()?;
        let doc = self.read_lenient();
        lock.unlock()?;
        Ok(f(doc?))
    }

    fn transact<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut StoreDocument) -> Result<T>,
    {
        let lock = self.open_lock()?;
        lock.lock_exclusive()?;

        let result = self.read_strict().and_then(|mut doc| {
            let out = f(&mut doc)?;
            self.write_document(&doc)?;
            Ok(out)
        });

        lock.unlock()?;
        result
    }
}

impl ProgressStore for JsonFileStore {
    fn find(&self, session_id: &str, student_id: &str) -> Result<Option<SessionProgress>> {
        self.read(|doc| {
            doc.records
                .into_iter()
                .find(|r| r.session_id == session_id && r.student_id == student_id)
        })
    }

    fn find_by_id(&self, id: Uuid) -> Result<Option<SessionProgress>> {
        self.read(|doc| doc.records.into_iter().find(|r| r.id == id))
    }

    fn create(&self, record: SessionProgress) -> Result<SessionProgress> {
        self.transact(|doc| {
            if doc
                .records
                .iter()
                .any(|r| r.session_id == record.session_id && r.student_id == record.student_id)
            {
                return Err(Error::Conflict(format!(
                    "progress for session {} and student {} already exists",
                    record.session_id, record.student_id
                )));
            }
            doc.records.push(record.clone());
            tracing::debug!("Created progress record {}", record.id);
            Ok(record)
        })
    }

    fn update(&self, record: &SessionProgress) -> Result<()> {
        self.transact(|doc| {
            let slot = doc
                .records
                .iter_mut()
                .find(|r| r.id == record.id)
                .ok_or_else(|| Error::NotFound(format!("progress {} not found", record.id)))?;
            *slot = record.clone();
            tracing::debug!("Updated progress record {}", record.id);
            Ok(())
        })
    }

    fn update_with<F>(&self, id: Uuid, f: F) -> Result<SessionProgress>
    where
        F: FnOnce(&mut SessionProgress) -> Result<()>,
    {
        self.transact(|doc| {
            let record = doc
                .records
                .iter_mut()
                .find(|r| r.id == id)
                .ok_or_else(|| Error::NotFound(format!("progress {} not found", id)))?;
            f(record)?;
            tracing::debug!("Updated progress record {}", id);
            Ok(record.clone())
        })
    }

    fn list_for_student(&self, student_id: &str) -> Result<Vec<SessionProgress>> {
        self.read(|doc| {
            doc.records
                .into_iter()
                .filter(|r| r.student_id == student_id)
                .collect()
        })
    }
}
