//! # 数据模型模块
//!
//! 该模块定义了客户端与后端交互时使用的核心数据结构：
//! 响应信封、用户会话、知识库条目以及页面状态。
//!
//! 所有结构都配合 `serde` 做 JSON 序列化，字段名与后端保持一致。

use crate::error::AppError;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// 后端统一的响应信封 `{code, data, msg}`。
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Envelope {
    /// 业务状态码，200 表示成功。后端有时会以字符串形式返回。
    #[serde(deserialize_with = "lenient_code")]
    pub code: i64,
    #[serde(default)]
    pub data: Value,
    #[serde(default)]
    pub msg: String,
}

impl Envelope {
    pub const SUCCESS: i64 = 200;
    pub const SERVER_ERROR: i64 = 500;

    pub fn ok(data: Value) -> Self {
        Envelope {
            code: Self::SUCCESS,
            data,
            msg: String::new(),
        }
    }

    pub fn error(code: i64, msg: impl Into<String>) -> Self {
        Envelope {
            code,
            data: Value::Null,
            msg: msg.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.code == Self::SUCCESS
    }

    /// 把信封转换为 `Result`，非 200 时返回 `AppError::Api`。
    pub fn into_result(self) -> Result<Value, AppError> {
        if self.is_success() {
            Ok(self.data)
        } else {
            Err(AppError::Api {
                code: self.code,
                msg: self.msg,
            })
        }
    }
}

fn lenient_code<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    match Value::deserialize(deserializer)? {
        Value::Number(num) => num
            .as_i64()
            .or_else(|| num.as_f64().map(|f| f as i64))
            .ok_or_else(|| D::Error::custom("code 不是整数")),
        Value::String(text) => text
            .trim()
            .parse::<i64>()
            .map_err(|_| D::Error::custom(format!("code 无法解析: {}", text))),
        other => Err(D::Error::custom(format!("code 类型不支持: {}", other))),
    }
}

/// 当前登录用户的会话信息，持久化到本地存储。
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct UserInfo {
    pub token: String,
    /// 手机号，未填写时为哨兵值 `"1"`。
    pub phone_number: String,
    pub user_id: String,
    pub role: String,
}

impl UserInfo {
    pub const PHONE_PLACEHOLDER: &'static str = "1";
}

impl Default for UserInfo {
    fn default() -> Self {
        UserInfo {
            token: String::new(),
            phone_number: Self::PHONE_PLACEHOLDER.to_string(),
            user_id: String::new(),
            role: String::new(),
        }
    }
}

/// `set_user_info` 的入参，只覆盖身份相关的三个字段。
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionUpdate {
    pub token: String,
    pub user_id: String,
    pub role: String,
}

/// 登录接口 `data` 字段的内容。
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct LoginData {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<f64>,
    pub user_id: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub user_name: Option<String>,
}

impl From<LoginData> for SessionUpdate {
    fn from(data: LoginData) -> Self {
        SessionUpdate {
            token: data.access_token,
            user_id: data.user_id,
            role: data.role,
        }
    }
}

/// 知识库列表中的一项。未声明的字段原样保留在 `extra` 中。
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct KnowledgeItem {
    #[serde(default)]
    pub kb_id: String,
    #[serde(default)]
    pub kb_name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl KnowledgeItem {
    pub fn new(kb_id: impl Into<String>, kb_name: impl Into<String>) -> Self {
        KnowledgeItem {
            kb_id: kb_id.into(),
            kb_name: kb_name.into(),
            extra: Map::new(),
        }
    }
}

/// 知识库页面的展示状态。
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PageStatus {
    /// 首次拉取完成之前
    #[default]
    Initing,
    /// 有知识库，正常展示列表
    Normal,
    /// 没有知识库或拉取失败，展示默认页
    Default,
}
