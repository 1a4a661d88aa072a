use serde::{Deserialize, Serialize};
use std::fs; // 导入标准库文件系统模块
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

/// 配置目录名，位于系统配置目录之下
pub const APP_DIR_NAME: &str = "kb-admin";
pub const DEFAULT_API_URL: &str = "http://localhost:8777/api";

/// 应用程序的全局配置文件结构。
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// 后端 API 基地址。
    #[serde(rename = "apiUrl")]
    pub api_url: String,
    /// 默认日志级别，`RUST_LOG` 优先。
    #[serde(rename = "logLevel", default = "default_log_level")]
    pub log_level: String,
    /// 状态持久化目录，为空时使用配置目录下的 `store`。
    #[serde(rename = "storageDir", default)]
    pub storage_dir: Option<PathBuf>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            api_url: DEFAULT_API_URL.to_string(),
            log_level: default_log_level(),
            storage_dir: None,
        }
    }
}

impl AppConfig {
    /// 环境变量覆盖：`KB_ADMIN_API_URL`、`KB_ADMIN_LOG_LEVEL`
    pub fn apply_env_overrides(mut self) -> Self {
        if let Ok(url) = std::env::var("KB_ADMIN_API_URL") {
            if !url.trim().is_empty() {
                self.api_url = url.trim().to_string();
            }
        }
        if let Ok(level) = std::env::var("KB_ADMIN_LOG_LEVEL") {
            if !level.trim().is_empty() {
                self.log_level = level.trim().to_lowercase();
            }
        }
        self
    }
}

/// 默认配置文件路径，如 Linux 下的 `~/.config/kb-admin/config.json`
pub fn default_config_path() -> AppResult<PathBuf> {
    let mut path =
        dirs::config_dir().ok_or_else(|| AppError::Config("无法获取系统配置目录".into()))?;
    path.push(APP_DIR_NAME);
    path.push("config.json");
    Ok(path)
}

/// 保存配置，目录不存在时自动创建
pub fn save_app_config(path: &Path, config: &AppConfig) -> AppResult<()> {
    if let Some(dir) = path.parent() {
        if !dir.exists() {
            fs::create_dir_all(dir)?;
        }
    }
    let json = serde_json::to_string_pretty(config)?;
    fs::write(path, json)?;
    Ok(())
}

/// 读取配置，文件不存在时返回默认配置
pub fn load_app_config(path: &Path) -> AppResult<AppConfig> {
    if !path.exists() {
        return Ok(AppConfig::default());
    }
    let content = fs::read_to_string(path)?;
    let config: AppConfig = serde_json::from_str(&content)?;
    if config.api_url.trim().is_empty() {
        return Err(AppError::Config("apiUrl 不能为空".into()));
    }
    Ok(config)
}
