use async_trait::async_trait;
use indexmap::IndexMap;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::info;

use super::ParameterStore;
use crate::error::TransportError;

/// 以单个 JSON 文件 (`{"key": "value"}`) 保存参数
#[derive(Debug, Clone)]
pub struct FileParameterStore {
    path: PathBuf,
}

impl FileParameterStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    async fn load(&self) -> Result<IndexMap<String, String>, TransportError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(text) if text.trim().is_empty() => Ok(IndexMap::new()),
            Ok(text) => Ok(serde_json::from_str(&text)?),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(IndexMap::new()),
            Err(err) => Err(err.into()),
        }
    }
}

#[async_trait]
impl ParameterStore for FileParameterStore {
    async fn get(&self, key: &str) -> Result<String, TransportError> {
        self.load()
            .await?
            .get(key)
            .cloned()
            .ok_or_else(|| TransportError::ParameterNotFound(key.to_string()))
    }

    async fn put(&self, key: &str, value: &str) -> Result<(), TransportError> {
        let mut parameters = self.load().await?;
        parameters.insert(key.to_string(), value.to_string());
        let text = serde_json::to_string_pretty(&parameters)?;

        // 写临时文件后改名替换
        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, text).await?;
        tokio::fs::rename(&tmp, &self.path).await?;

        info!("Parameter '{}' was updated to '{}'", key, value);
        Ok(())
    }
}

/// 内存参数存储
#[derive(Debug, Default)]
pub struct MemoryParameterStore {
    values: Mutex<IndexMap<String, String>>,
}

impl MemoryParameterStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(key: &str, value: &str) -> Self {
        let store = Self::new();
        store.set(key, value);
        store
    }

    pub fn set(&self, key: &str, value: &str) {
        self.values
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(key.to_string(), value.to_string());
    }

    pub fn value(&self, key: &str) -> Option<String> {
        self.values
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(key)
            .cloned()
    }
}

#[async_trait]
impl ParameterStore for MemoryParameterStore {
    async fn get(&self, key: &str) -> Result<String, TransportError> {
        self.value(key)
            .ok_or_else(|| TransportError::ParameterNotFound(key.to_string()))
    }

    async fn put(&self, key: &str, value: &str) -> Result<(), TransportError> {
        self.set(key, value);
        info!("Parameter '{}' was updated to '{}'", key, value);
        Ok(())
    }
}
