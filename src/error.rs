//! 错误类型定义
//!
//! 库内部统一使用 `AppError`，二进制入口再用 `anyhow` 包装。

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    /// 网络层失败（连接、超时、读取响应体等）
    #[error("网络请求失败: {0}")]
    Http(#[from] reqwest::Error),

    /// 服务端返回非 2xx 状态且响应体不是标准信封
    #[error("服务端错误: {status} {body}")]
    Status { status: u16, body: String },

    #[error("JSON 解析失败: {0}")]
    Json(#[from] serde_json::Error),

    #[error("文件读写失败: {0}")]
    Io(#[from] std::io::Error),

    /// 请求参数无法序列化为 JSON 对象
    #[error("请求参数无效: {0}")]
    InvalidParams(String),

    #[error("未知接口: {0}")]
    UnknownEndpoint(String),

    /// 业务层失败，对应信封中的非 200 `code`
    #[error("接口返回错误 (code {code}): {msg}")]
    Api { code: i64, msg: String },

    #[error("配置错误: {0}")]
    Config(String),

    #[error("接口注册表校验失败: {0}")]
    Registry(String),
}

impl AppError {
    /// 给用户看的提示文本，空消息时返回 `None` 以便调用方使用兜底文案
    pub fn user_message(&self) -> Option<String> {
        let text = match self {
            AppError::Api { msg, .. } => msg.trim().to_string(),
            other => other.to_string(),
        };
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
