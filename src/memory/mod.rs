//! Key-value memory store
//!
//! A flat topic → content mapping shared by the voice and messaging
//! workers. Topics are case-normalized. Every write persists a full snapshot
//! through an injected [`MemoryPersistence`]; the snapshot is written while
//! the store lock is held, so concurrent writers cannot interleave
//! snapshots. Persistence failures are logged and the in-memory map stays
//! authoritative.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::{Error, Result};

/// The persisted form of the store
pub type Snapshot = BTreeMap<String, String>;

/// Where the memory snapshot lives
pub trait MemoryPersistence: Send + Sync {
    /// Load the last snapshot; an absent snapshot is an empty map
    ///
    /// # Errors
    ///
    /// Returns `Error::Memory` if a snapshot exists but cannot be read
    fn load(&self) -> Result<Snapshot>;

    /// Replace the stored snapshot
    ///
    /// # Errors
    ///
    /// Returns `Error::Memory` if the snapshot cannot be written
    fn save(&self, snapshot: &Snapshot) -> Result<()>;
}

/// Pretty-printed JSON file, replaced atomically on every save
#[derive(Debug, Clone)]
pub struct JsonFilePersistence {
    path: PathBuf,
}

impl JsonFilePersistence {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl MemoryPersistence for JsonFilePersistence {
    fn load(&self) -> Result<Snapshot> {
        if !self.path.exists() {
            return Ok(Snapshot::new());
        }
        let content = std::fs::read_to_string(&self.path)
            .map_err(|e| Error::Memory(format!("failed to read {}: {e}", self.path.display())))?;
        serde_json::from_str(&content)
            .map_err(|e| Error::Memory(format!("failed to parse {}: {e}", self.path.display())))
    }

    fn save(&self, snapshot: &Snapshot) -> Result<()> {
        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(dir)?;

        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        serde_json::to_writer_pretty(&mut tmp, snapshot)?;
        tmp.flush()?;
        tmp.persist(&self.path)
            .map_err(|e| Error::Memory(format!("failed to replace {}: {e}", self.path.display())))?;
        Ok(())
    }
}

/// Volatile persistence; keeps the last snapshot in memory
#[derive(Debug, Default)]
pub struct InMemoryPersistence {
    snapshot: Mutex<Snapshot>,
}

impl InMemoryPersistence {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The last saved snapshot
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        self.snapshot.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl MemoryPersistence for InMemoryPersistence {
    fn load(&self) -> Result<Snapshot> {
        Ok(self.snapshot())
    }

    fn save(&self, snapshot: &Snapshot) -> Result<()> {
        *self.snapshot.lock().unwrap_or_else(|e| e.into_inner()) = snapshot.clone();
        Ok(())
    }
}

/// The memory store
pub struct MemoryStore {
    entries: Mutex<Snapshot>,
    persistence: Box<dyn MemoryPersistence>,
}

impl MemoryStore {
    /// Open a store, loading the existing snapshot
    ///
    /// An unreadable snapshot is logged and the store starts empty.
    #[must_use]
    pub fn open(persistence: Box<dyn MemoryPersistence>) -> Self {
        let entries = persistence.load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "failed to load memory, starting empty");
            Snapshot::new()
        });
        tracing::info!(topics = entries.len(), "memory loaded");
        Self {
            entries: Mutex::new(entries),
            persistence,
        }
    }

    /// Store content under a topic, replacing any previous content
    pub fn save(&self, topic: &str, content: &str) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(normalize(topic), content.to_string());
        self.persist(&entries);
    }

    /// Content stored under a topic
    #[must_use]
    pub fn retrieve(&self, topic: &str) -> Option<String> {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&normalize(topic))
            .cloned()
    }

    /// Number of stored topics
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Whether the store is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of the current mapping
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Write the current snapshot; used on shutdown
    pub fn flush(&self) {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        self.persist(&entries);
    }

    fn persist(&self, entries: &Snapshot) {
        if let Err(e) = self.persistence.save(entries) {
            tracing::warn!(error = %e, "failed to persist memory, keeping in-memory state");
        }
    }
}

fn normalize(topic: &str) -> String {
    topic.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct BrokenPersistence;

    impl MemoryPersistence for BrokenPersistence {
        fn load(&self) -> Result<Snapshot> {
            Err(Error::Memory("disk on fire".to_string()))
        }

        fn save(&self, _snapshot: &Snapshot) -> Result<()> {
            Err(Error::Memory("disk on fire".to_string()))
        }
    }

    #[test]
    fn test_topics_are_case_normalized() {
        let store = MemoryStore::open(Box::new(InMemoryPersistence::new()));
        store.save("  Alarm ", "7am");
        assert_eq!(store.retrieve("ALARM").as_deref(), Some("7am"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_save_replaces() {
        let store = MemoryStore::open(Box::new(InMemoryPersistence::new()));
        store.save("alarm", "7am");
        store.save("alarm", "8am");
        assert_eq!(store.retrieve("alarm").as_deref(), Some("8am"));
    }

    #[test]
    fn test_every_save_writes_snapshot() {
        let persistence = std::sync::Arc::new(InMemoryPersistence::new());

        struct Shared(std::sync::Arc<InMemoryPersistence>);
        impl MemoryPersistence for Shared {
            fn load(&self) -> Result<Snapshot> {
                self.0.load()
            }
            fn save(&self, snapshot: &Snapshot) -> Result<()> {
                self.0.save(snapshot)
            }
        }

        let store = MemoryStore::open(Box::new(Shared(persistence.clone())));
        store.save("wifi", "hunter2");
        assert_eq!(persistence.snapshot().get("wifi").map(String::as_str), Some("hunter2"));
    }

    #[test]
    fn test_persistence_failure_keeps_memory() {
        let store = MemoryStore::open(Box::new(BrokenPersistence));
        assert!(store.is_empty());
        store.save("alarm", "7am");
        assert_eq!(store.retrieve("alarm").as_deref(), Some("7am"));
        store.flush();
    }

    #[test]
    fn test_json_file_missing_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let persistence = JsonFilePersistence::new(dir.path().join("memory.json"));
        assert!(persistence.load().unwrap().is_empty());
    }

    #[test]
    fn test_json_file_corrupt_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("memory.json");
        std::fs::write(&path, "{not json").unwrap();

        let store = MemoryStore::open(Box::new(JsonFilePersistence::new(&path)));
        assert!(store.is_empty());
    }

    #[test]
    fn test_json_file_keeps_hebrew_readable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("memory.json");
        let store = MemoryStore::open(Box::new(JsonFilePersistence::new(&path)));
        store.save("שעון מעורר", "שבע בבוקר");

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("שבע בבוקר"));
    }
}
