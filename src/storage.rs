//! 本地持久化
//!
//! 状态容器在创建时读取、在每次修改后写回。`JsonFileStorage` 在配置目录下
//! 为每个键保存一个 JSON 文件，`MemoryStorage` 用于测试和临时会话。

use crate::error::{AppError, AppResult};
use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

/// 简单的键值存储，值是序列化后的 JSON 文本。
pub trait Storage: Send + Sync {
    fn get_item(&self, key: &str) -> AppResult<Option<String>>;
    fn set_item(&self, key: &str, value: &str) -> AppResult<()>;
    fn remove_item(&self, key: &str) -> AppResult<()>;
}

/// 读取并反序列化，不存在时返回 `None`。
pub fn load_json<T: DeserializeOwned>(storage: &dyn Storage, key: &str) -> AppResult<Option<T>> {
    match storage.get_item(key)? {
        Some(text) => Ok(Some(serde_json::from_str(&text)?)),
        None => Ok(None),
    }
}

pub fn save_json<T: Serialize>(storage: &dyn Storage, key: &str, value: &T) -> AppResult<()> {
    let json = serde_json::to_string_pretty(value)?;
    storage.set_item(key, &json)
}

pub struct JsonFileStorage {
    dir: PathBuf,
}

impl JsonFileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        JsonFileStorage { dir: dir.into() }
    }

    /// 默认目录：系统配置目录下的 `kb-admin/store`
    pub fn in_config_dir() -> AppResult<Self> {
        let mut path =
            dirs::config_dir().ok_or_else(|| AppError::Config("无法获取系统配置目录".into()))?;
        path.push(crate::config::APP_DIR_NAME);
        path.push("store");
        Ok(JsonFileStorage::new(path))
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl Storage for JsonFileStorage {
    fn get_item(&self, key: &str) -> AppResult<Option<String>> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(path)?))
    }

    fn set_item(&self, key: &str, value: &str) -> AppResult<()> {
        if !self.dir.exists() {
            fs::create_dir_all(&self.dir)?;
        }
        fs::write(self.path_for(key), value)?;
        Ok(())
    }

    fn remove_item(&self, key: &str) -> AppResult<()> {
        let path = self.path_for(key);
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct MemoryStorage(pub Arc<DashMap<String, String>>);

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn get_item(&self, key: &str) -> AppResult<Option<String>> {
        Ok(self.0.get(key).map(|v| v.value().clone()))
    }

    fn set_item(&self, key: &str, value: &str) -> AppResult<()> {
        self.0.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> AppResult<()> {
        self.0.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[test]
    fn file_storage_creates_dir_and_round_trips() {
        let tmp = tempfile::tempdir().unwrap();
        let storage = JsonFileStorage::new(tmp.path().join("nested"));

        assert!(load_json::<Value>(&storage, "user").unwrap().is_none());
        save_json(&storage, "user", &json!({ "token": "t" })).unwrap();
        let loaded: Value = load_json(&storage, "user").unwrap().unwrap();
        assert_eq!(loaded["token"], json!("t"));

        storage.remove_item("user").unwrap();
        assert!(storage.get_item("user").unwrap().is_none());
    }

    #[test]
    fn memory_storage_is_shared_between_clones() {
        let storage = MemoryStorage::new();
        let other = storage.clone();
        storage.set_item("k", "v").unwrap();
        assert_eq!(other.get_item("k").unwrap().as_deref(), Some("v"));
    }

    #[test]
    fn corrupt_json_is_an_error() {
        let storage = MemoryStorage::new();
        storage.set_item("user", "{not json").unwrap();
        assert!(matches!(
            load_json::<Value>(&storage, "user"),
            Err(AppError::Json(_))
        ));
    }
}
