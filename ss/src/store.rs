//! Core Store implementation

use eyre::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// A record that can be persisted in the store
///
/// Records live in a named collection and are addressed by an opaque id.
pub trait Record: Serialize + DeserializeOwned {
    /// Opaque identifier, unique within the collection
    fn id(&self) -> &str;

    /// Last update timestamp (Unix milliseconds)
    fn updated_at(&self) -> i64;

    /// Collection (directory) the record is stored in
    fn collection_name() -> &'static str;
}

/// Summary of one stored record, as seen on disk
#[derive(Debug, Clone)]
pub struct RecordEntry {
    /// Record id (file stem)
    pub id: String,
    /// Size of the serialized record in bytes
    pub bytes: u64,
    /// File modification time (Unix milliseconds)
    pub modified_ms: i64,
}

/// Statistics for a collection
#[derive(Debug, Clone)]
pub struct CollectionStats {
    /// Collection name
    pub name: String,
    /// Number of records
    pub record_count: usize,
    /// Total bytes stored
    pub total_bytes: u64,
}

/// File-backed record store
///
/// Layout: `{base}/{collection}/{id}.json`. Writes go to a uniquely named
/// temp file in the same directory and are renamed into place, so readers
/// never observe a partial record and the last completed write wins.
#[derive(Debug, Clone)]
pub struct Store {
    /// Base path for storage
    base_path: PathBuf,
}

impl Store {
    /// Open or create a store at the given path
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let base_path = path.as_ref().to_path_buf();
        fs::create_dir_all(&base_path).context("Failed to create store directory")?;
        debug!(?base_path, "Opened session store");
        Ok(Self { base_path })
    }

    /// Base directory of the store
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Create or replace a record
    pub fn put<R: Record>(&self, record: &R) -> Result<()> {
        let id = record.id();
        validate_id(id)?;
        let dir = self.collection_dir(R::collection_name());
        fs::create_dir_all(&dir).context(format!("Failed to create collection {}", R::collection_name()))?;

        let content = serde_json::to_string_pretty(record)?;
        let tmp_path = dir.join(format!(".{}.{}.tmp", id, Uuid::now_v7()));
        fs::write(&tmp_path, content).context(format!("Failed to write record {}", id))?;
        fs::rename(&tmp_path, self.record_path(R::collection_name(), id))
            .context(format!("Failed to commit record {}", id))?;

        debug!(collection = R::collection_name(), id, "Stored record");
        Ok(())
    }

    /// Read a record, returning None if it does not exist
    pub fn get<R: Record>(&self, id: &str) -> Result<Option<R>> {
        validate_id(id)?;
        let path = self.record_path(R::collection_name(), id);
        if !path.exists() {
            debug!(collection = R::collection_name(), id, "Record not found");
            return Ok(None);
        }

        let content = fs::read_to_string(&path).context(format!("Failed to read record {}", id))?;
        let record = serde_json::from_str(&content).context(format!("Failed to parse record {}", id))?;
        Ok(Some(record))
    }

    /// Delete a record; deleting a missing record is not an error
    pub fn delete<R: Record>(&self, id: &str) -> Result<bool> {
        self.delete_raw(R::collection_name(), id)
    }

    /// Delete a record from a collection by name
    pub fn delete_raw(&self, collection: &str, id: &str) -> Result<bool> {
        validate_id(id)?;
        let path = self.record_path(collection, id);
        if path.exists() {
            fs::remove_file(&path)?;
            info!(collection, id, "Deleted record");
            return Ok(true);
        }
        Ok(false)
    }

    /// Load every record in a collection, newest first
    ///
    /// Records that fail to parse are skipped with a warning.
    pub fn list<R: Record>(&self) -> Result<Vec<R>> {
        let mut records = Vec::new();
        for entry in self.entries(R::collection_name())? {
            match self.get::<R>(&entry.id) {
                Ok(Some(record)) => records.push(record),
                Ok(None) => {}
                Err(e) => warn!(id = %entry.id, error = %e, "Skipping unreadable record"),
            }
        }
        records.sort_by_key(|r| std::cmp::Reverse(r.updated_at()));
        Ok(records)
    }

    /// Raw JSON of a record by collection name
    pub fn get_raw(&self, collection: &str, id: &str) -> Result<Option<String>> {
        validate_id(id)?;
        let path = self.record_path(collection, id);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(&path)?))
    }

    /// List the records of a collection as stored on disk
    pub fn entries(&self, collection: &str) -> Result<Vec<RecordEntry>> {
        let dir = self.collection_dir(collection);
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut entries = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().map(|e| e == "json").unwrap_or(false)
                && let Some(stem) = path.file_stem().and_then(|s| s.to_str())
            {
                let metadata = entry.metadata()?;
                let modified_ms = metadata
                    .modified()
                    .ok()
                    .map(|t| chrono::DateTime::<chrono::Utc>::from(t).timestamp_millis())
                    .unwrap_or(0);
                entries.push(RecordEntry {
                    id: stem.to_string(),
                    bytes: metadata.len(),
                    modified_ms,
                });
            }
        }

        entries.sort_by(|a, b| b.modified_ms.cmp(&a.modified_ms).then_with(|| a.id.cmp(&b.id)));
        Ok(entries)
    }

    /// List collection names
    pub fn collections(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.base_path)? {
            let entry = entry?;
            if entry.path().is_dir()
                && let Some(name) = entry.file_name().to_str()
            {
                names.push(name.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    /// Statistics for every collection
    pub fn stats(&self) -> Result<Vec<CollectionStats>> {
        let mut stats = Vec::new();
        for name in self.collections()? {
            let entries = self.entries(&name)?;
            stats.push(CollectionStats {
                record_count: entries.len(),
                total_bytes: entries.iter().map(|e| e.bytes).sum(),
                name,
            });
        }
        Ok(stats)
    }

    fn collection_dir(&self, collection: &str) -> PathBuf {
        self.base_path.join(collection)
    }

    fn record_path(&self, collection: &str, id: &str) -> PathBuf {
        self.collection_dir(collection).join(format!("{}.json", id))
    }
}

/// Ids become file names; reject anything that could escape the collection
fn validate_id(id: &str) -> Result<()> {
    if id.is_empty() || id.starts_with('.') || id.contains(['/', '\\']) || id.contains("..") {
        return Err(eyre::eyre!("Invalid record id: {:?}", id));
    }
    Ok(())
}
