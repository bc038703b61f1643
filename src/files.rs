//! Local file store
//!
//! The shopping list is a line-per-item text file. Named notes live in a
//! `files/` directory and are addressed by bare file names only.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::capabilities::FileStore;
use crate::{Error, Result};

const LIST_FILE: &str = "list.txt";
const FILES_DIR: &str = "files";

/// File store rooted at the data directory
pub struct LocalFileStore {
    root: PathBuf,
    // Serializes read-modify-write cycles on the list file
    list_lock: Mutex<()>,
}

impl LocalFileStore {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            list_lock: Mutex::new(()),
        }
    }

    fn list_path(&self) -> PathBuf {
        self.root.join(LIST_FILE)
    }

    fn file_path(&self, name: &str) -> Result<PathBuf> {
        Ok(self.root.join(FILES_DIR).join(sanitize_name(name)?))
    }

    async fn read_list(&self) -> Result<Vec<String>> {
        match tokio::fs::read_to_string(self.list_path()).await {
            Ok(content) => Ok(content
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(ToString::to_string)
                .collect()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(Error::FileStore(format!("failed to read list: {e}"))),
        }
    }

    async fn write_list(&self, items: &[String]) -> Result<()> {
        tokio::fs::create_dir_all(&self.root).await?;
        let mut content = items.join("\n");
        if !content.is_empty() {
            content.push('\n');
        }
        tokio::fs::write(self.list_path(), content)
            .await
            .map_err(|e| Error::FileStore(format!("failed to write list: {e}")))
    }

    /// Current list items, in insertion order
    ///
    /// # Errors
    ///
    /// Returns `Error::FileStore` if the list cannot be read
    pub async fn list_items(&self) -> Result<Vec<String>> {
        let _guard = self.list_lock.lock().await;
        self.read_list().await
    }
}

#[async_trait]
impl FileStore for LocalFileStore {
    async fn add_to_list(&self, item: &str) -> Result<()> {
        let item = list_entry(item)?;
        let _guard = self.list_lock.lock().await;
        let mut items = self.read_list().await?;
        items.push(item);
        self.write_list(&items).await
    }

    async fn remove_from_list(&self, item: &str) -> Result<()> {
        let _guard = self.list_lock.lock().await;
        let mut items = self.read_list().await?;
        let wanted = list_entry(item)?.to_lowercase();
        let position = items
            .iter()
            .position(|i| i.to_lowercase() == wanted)
            .ok_or_else(|| Error::NotFound(format!("'{item}' is not on the list")))?;
        items.remove(position);
        self.write_list(&items).await
    }

    async fn read(&self, name: &str) -> Result<String> {
        let path = self.file_path(name)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(Error::NotFound(format!("file '{name}'")))
            }
            Err(e) => Err(Error::FileStore(format!("failed to read {}: {e}", path.display()))),
        }
    }

    async fn write(&self, name: &str, content: &str) -> Result<()> {
        let path = self.file_path(name)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, content)
            .await
            .map_err(|e| Error::FileStore(format!("failed to write {}: {e}", path.display())))?;
        tracing::debug!(path = %path.display(), bytes = content.len(), "file written");
        Ok(())
    }
}

/// One list line: whitespace runs, newlines included, collapse to a space
fn list_entry(item: &str) -> Result<String> {
    let entry = item.split_whitespace().collect::<Vec<_>>().join(" ");
    if entry.is_empty() {
        return Err(Error::InvalidInput("empty list item".to_string()));
    }
    Ok(entry)
}

/// Accept only a bare file name inside the store
fn sanitize_name(name: &str) -> Result<&str> {
    let name = name.trim();
    let valid = !name.is_empty()
        && !name.starts_with('.')
        && !name.contains(['/', '\\', '\0'])
        && Path::new(name).file_name().is_some_and(|f| f == name);

    if valid {
        Ok(name)
    } else {
        Err(Error::InvalidInput(format!("'{name}' is not a valid file name")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_name() {
        assert_eq!(sanitize_name(" notes.txt ").unwrap(), "notes.txt");
        assert_eq!(sanitize_name("מתכון").unwrap(), "מתכון");
        assert!(sanitize_name("../etc/passwd").is_err());
        assert!(sanitize_name("/etc/passwd").is_err());
        assert!(sanitize_name("a\\b").is_err());
        assert!(sanitize_name("..").is_err());
        assert!(sanitize_name(".hidden").is_err());
        assert!(sanitize_name("  ").is_err());
    }

    #[tokio::test]
    async fn test_list_add_and_remove() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalFileStore::new(dir.path());

        store.add_to_list("milk").await.unwrap();
        store.add_to_list("חלב").await.unwrap();
        store.add_to_list("eggs").await.unwrap();
        store.remove_from_list("MILK").await.unwrap();

        assert_eq!(store.list_items().await.unwrap(), vec!["חלב", "eggs"]);
    }

    #[tokio::test]
    async fn test_multiline_item_stays_one_entry() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalFileStore::new(dir.path());

        store.add_to_list("olive\noil").await.unwrap();
        assert_eq!(store.list_items().await.unwrap(), vec!["olive oil"]);

        store.remove_from_list("olive\noil").await.unwrap();
        assert!(store.list_items().await.unwrap().is_empty());

        assert!(matches!(
            store.add_to_list(" \n ").await,
            Err(Error::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_remove_missing_item() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalFileStore::new(dir.path());
        let err = store.remove_from_list("bread").await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalFileStore::new(dir.path());

        store.write("notes.txt", "buy a ladder").await.unwrap();
        assert_eq!(store.read("notes.txt").await.unwrap(), "buy a ladder");
        assert!(dir.path().join("files").join("notes.txt").exists());
    }

    #[tokio::test]
    async fn test_read_missing_and_escaping() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalFileStore::new(dir.path());

        assert!(matches!(store.read("nope.txt").await, Err(Error::NotFound(_))));
        assert!(matches!(store.read("../list.txt").await, Err(Error::InvalidInput(_))));
    }
}
