use crate::errors::AppError;
use crate::models::{Reminder, TaskData};
use async_trait::async_trait;
use serde_json::Value;
use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};
use tokio::{fs, sync::Mutex};
use tracing::error;

pub const TASK_DATA_KEY: &str = "taskData";
pub const REMINDERS_KEY: &str = "reminders";

/// Key-value store holding whole JSON blobs. Every `set` replaces the blob.
#[async_trait]
pub trait Store: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Value>, AppError>;
    async fn set(&self, key: &str, value: Value) -> Result<(), AppError>;
}

/// One pretty-printed JSON file per key under `dir`.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self, AppError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).await?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

#[async_trait]
impl Store for FileStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, AppError> {
        let path = self.path_for(key);
        match fs::read(&path).await {
            Ok(bytes) => match serde_json::from_slice(&bytes) {
                Ok(value) => Ok(Some(value)),
                Err(err) => {
                    error!("failed to parse {}: {err}", path.display());
                    Ok(None)
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    /// Writes beside the target and renames over it, so readers never see a
    /// half-written file.
    async fn set(&self, key: &str, value: Value) -> Result<(), AppError> {
        let payload = serde_json::to_vec_pretty(&value)?;
        let path = self.path_for(key);
        let staging = path.with_extension("json.tmp");
        fs::write(&staging, payload).await?;
        fs::rename(&staging, &path).await?;
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, AppError> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), AppError> {
        self.entries.lock().await.insert(key.to_string(), value);
        Ok(())
    }
}

pub async fn load_task_data(store: &dyn Store) -> TaskData {
    load_or_default(store, TASK_DATA_KEY).await
}

pub async fn load_reminders(store: &dyn Store) -> Vec<Reminder> {
    load_or_default(store, REMINDERS_KEY).await
}

async fn load_or_default<T>(store: &dyn Store, key: &str) -> T
where
    T: serde::de::DeserializeOwned + Default,
{
    match store.get(key).await {
        Ok(Some(value)) => match serde_json::from_value(value) {
            Ok(data) => data,
            Err(err) => {
                error!("failed to decode {key}: {err}");
                T::default()
            }
        },
        Ok(None) => T::default(),
        Err(err) => {
            error!("failed to read {key}: {err}");
            T::default()
        }
    }
}

pub async fn persist_task_data(store: &dyn Store, data: &TaskData) -> Result<(), AppError> {
    store.set(TASK_DATA_KEY, serde_json::to_value(data)?).await
}

pub async fn persist_reminders(store: &dyn Store, reminders: &[Reminder]) -> Result<(), AppError> {
    store.set(REMINDERS_KEY, serde_json::to_value(reminders)?).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir() -> PathBuf {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!("task_tracker_store_{}_{nanos}", std::process::id()))
    }

    #[tokio::test]
    async fn file_store_missing_key_is_none() {
        let store = FileStore::open(temp_dir()).await.unwrap();
        assert!(store.get(TASK_DATA_KEY).await.unwrap().is_none());
        assert!(load_task_data(&store).await.tasks.is_empty());
    }

    #[tokio::test]
    async fn file_store_overwrites_whole_blob() {
        let store = FileStore::open(temp_dir()).await.unwrap();
        let data = TaskData {
            tasks: Vec::new(),
            level: 3,
            points: 310,
        };
        persist_task_data(&store, &data).await.unwrap();
        store
            .set(TASK_DATA_KEY, serde_json::json!({ "points": 5 }))
            .await
            .unwrap();

        let loaded = load_task_data(&store).await;
        assert_eq!(loaded.points, 5);
        assert_eq!(loaded.level, 0);
        let staging = store.path_for(TASK_DATA_KEY).with_extension("json.tmp");
        assert!(!staging.exists());
        fs::remove_dir_all(store.dir()).await.unwrap();
    }

    #[tokio::test]
    async fn malformed_file_falls_back_to_defaults() {
        let store = FileStore::open(temp_dir()).await.unwrap();
        fs::write(store.path_for(REMINDERS_KEY), b"{not json")
            .await
            .unwrap();
        assert!(load_reminders(&store).await.is_empty());
        fs::remove_dir_all(store.dir()).await.unwrap();
    }

    #[tokio::test]
    async fn memory_store_keeps_last_write() {
        let store = MemoryStore::new();
        store.set("k", serde_json::json!([1])).await.unwrap();
        store.set("k", serde_json::json!([2])).await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some(serde_json::json!([2])));
    }
}
