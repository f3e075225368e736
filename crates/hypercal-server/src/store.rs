//! Persistent store of registered preferences.
//!
//! Records live in memory and are written to a JSON file on every
//! registration. The file maps identifiers to records:
//!
//! ```json
//! {"5f0c...": [{"url": "https://...", "ignore": [], "subjects": {}}]}
//! ```

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use hypercal_core::PreferenceRecord;

/// Errors raised by [`PreferenceStore`].
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store file cannot be read or written.
    #[error("Cannot access preference store {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The store file does not hold valid preferences.
    #[error("Preference store {path} is corrupted: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The records cannot be serialized.
    #[error("Cannot encode preferences: {0}")]
    Encode(#[from] serde_json::Error),
}

type Records = HashMap<Uuid, PreferenceRecord>;

/// Registered preference records keyed by identifier.
///
/// Records are never updated in place: a registration always creates a new
/// identifier.
#[derive(Debug, Default)]
pub struct PreferenceStore {
    path: Option<PathBuf>,
    records: RwLock<Records>,
}

impl PreferenceStore {
    /// Creates a store that is never persisted.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Opens the store backed by `path`.
    ///
    /// A missing file yields an empty store; the file is created on the
    /// first registration.
    ///
    /// # Errors
    ///
    /// Fails when the file exists but cannot be read or decoded.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let records = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice::<Records>(&bytes).map_err(|source| {
                StoreError::Corrupt {
                    path: path.clone(),
                    source,
                }
            })?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!(path = %path.display(), "No preference store yet, starting empty");
                Records::new()
            }
            Err(source) => return Err(StoreError::Io { path, source }),
        };

        info!(path = %path.display(), records = records.len(), "Loaded preferences");
        Ok(Self {
            path: Some(path),
            records: RwLock::new(records),
        })
    }

    /// Returns the backing file, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Returns a copy of the record registered under `id`.
    pub async fn get(&self, id: &Uuid) -> Option<PreferenceRecord> {
        self.records.read().await.get(id).cloned()
    }

    /// Stores `record` under a fresh identifier and persists the store.
    ///
    /// # Errors
    ///
    /// Fails when the store file cannot be written; the record is then not
    /// kept.
    pub async fn register(&self, record: PreferenceRecord) -> Result<Uuid, StoreError> {
        let mut records = self.records.write().await;

        let mut id = Uuid::new_v4();
        while records.contains_key(&id) {
            id = Uuid::new_v4();
        }

        records.insert(id, record);
        if let Err(e) = self.persist(&records).await {
            records.remove(&id);
            return Err(e);
        }

        debug!(id = %id, "Registered preference");
        Ok(id)
    }

    /// Returns the number of stored records.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Returns true if no record is stored.
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    /// Writes the whole map, through a temporary file so readers of the
    /// file never see a partial write.
    async fn persist(&self, records: &Records) -> Result<(), StoreError> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let data = serde_json::to_vec_pretty(records)?;
        let tmp = path.with_extension("json.tmp");
        let io_err = |source| StoreError::Io {
            path: path.clone(),
            source,
        };

        tokio::fs::write(&tmp, data).await.map_err(io_err)?;
        tokio::fs::rename(&tmp, path).await.map_err(io_err)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hypercal_core::FeedPreference;
    use tempfile::TempDir;

    fn record(url: &str) -> PreferenceRecord {
        PreferenceRecord::new(vec![
            FeedPreference::new(url)
                .with_ignored("A-BCDE-123")
                .with_subject("B-INFO-204", "Algo"),
        ])
    }

    #[tokio::test]
    async fn missing_file_opens_empty() {
        let dir = TempDir::new().unwrap();
        let store = PreferenceStore::open(dir.path().join("preferences.json"))
            .await
            .unwrap();

        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn register_persists_and_reloads() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("preferences.json");

        let store = PreferenceStore::open(&path).await.unwrap();
        let first = store.register(record("https://hplanning.example/a.ics")).await.unwrap();
        let second = store.register(record("https://hplanning.example/a.ics")).await.unwrap();
        assert_ne!(first, second);
        assert!(path.exists());

        let reopened = PreferenceStore::open(&path).await.unwrap();
        assert_eq!(reopened.len().await, 2);
        assert_eq!(
            reopened.get(&first).await,
            Some(record("https://hplanning.example/a.ics"))
        );
    }

    #[tokio::test]
    async fn reads_legacy_file_without_optional_fields() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("preferences.json");
        let id = Uuid::new_v4();
        std::fs::write(
            &path,
            format!(r#"{{"{id}": [{{"url": "https://hplanning.example/a.ics"}}]}}"#),
        )
        .unwrap();

        let store = PreferenceStore::open(&path).await.unwrap();
        let stored = store.get(&id).await.unwrap();
        assert_eq!(stored.feeds[0].url, "https://hplanning.example/a.ics");
        assert!(stored.feeds[0].ignore.is_empty());
    }

    #[tokio::test]
    async fn corrupted_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("preferences.json");
        std::fs::write(&path, "not json").unwrap();

        let err = PreferenceStore::open(&path).await.unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { .. }));
    }

    #[tokio::test]
    async fn failed_write_keeps_nothing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing-dir").join("preferences.json");
        let store = PreferenceStore::open(&path).await.unwrap();

        let err = store
            .register(record("https://hplanning.example/a.ics"))
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::Io { .. }));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn unknown_id_is_absent() {
        let store = PreferenceStore::in_memory();
        assert!(store.get(&Uuid::new_v4()).await.is_none());

        let id = store.register(record("https://hplanning.example/a.ics")).await.unwrap();
        assert!(store.get(&id).await.is_some());
        assert!(store.path().is_none());
    }
}
