//! Task store persisted as a JSON list

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::capabilities::TaskStore;
use crate::{Error, Result};

/// A recorded task or reminder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub description: String,
    /// Free-form due time as spoken ("tomorrow at 9", "מחר בבוקר")
    pub when: String,
    pub created_at: DateTime<Utc>,
}

/// JSON-file task store
pub struct JsonTaskStore {
    path: PathBuf,
    tasks: Mutex<Vec<Task>>,
}

impl JsonTaskStore {
    /// Open the store, loading existing tasks
    ///
    /// An unreadable file is logged and the store starts empty.
    #[must_use]
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let tasks = match std::fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!(path = %path.display(), error = %e, "failed to parse tasks, starting empty");
                Vec::new()
            }),
            Err(_) => Vec::new(),
        };
        Self {
            path,
            tasks: Mutex::new(tasks),
        }
    }

    /// All tasks, oldest first
    pub async fn tasks(&self) -> Vec<Task> {
        self.tasks.lock().await.clone()
    }

    async fn persist(&self, tasks: &[Task]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let content = serde_json::to_string_pretty(tasks)?;
        tokio::fs::write(&self.path, content)
            .await
            .map_err(|e| Error::Task(format!("failed to write {}: {e}", self.path.display())))
    }
}

#[async_trait]
impl TaskStore for JsonTaskStore {
    async fn create_task(&self, description: &str, when: &str) -> Result<()> {
        let mut tasks = self.tasks.lock().await;
        let task = Task {
            id: Uuid::new_v4(),
            description: description.trim().to_string(),
            when: when.trim().to_string(),
            created_at: Utc::now(),
        };
        tasks.push(task);
        if let Err(e) = self.persist(&tasks).await {
            tasks.pop();
            return Err(e);
        }
        if let Some(task) = tasks.last() {
            tracing::info!(id = %task.id, description = %task.description, when = %task.when, "task created");
        }
        Ok(())
    }

    async fn cancel_task(&self, description: &str) -> Result<()> {
        let mut tasks = self.tasks.lock().await;
        let wanted = description.trim().to_lowercase();
        let position = tasks
            .iter()
            .position(|t| t.description.to_lowercase() == wanted)
            .ok_or_else(|| Error::NotFound(format!("task '{description}'")))?;
        let task = tasks.remove(position);
        if let Err(e) = self.persist(&tasks).await {
            tasks.insert(position, task);
            return Err(e);
        }
        tracing::info!(id = %task.id, "task cancelled");
        Ok(())
    }
}
