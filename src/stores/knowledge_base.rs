//! 知识库列表与选中状态
//!
//! `get_list` 拉取当前用户可见的知识库。拉取为空和拉取失败都会落到
//! `PageStatus::Default` 并清空列表，两者只在提示消息上有区别。
//!
//! 状态锁不会跨越网络等待，多个并发的 `get_list` 按各自返回的先后覆盖状态。

use crate::dispatcher::Dispatcher;
use crate::error::AppError;
use crate::models::{Envelope, KnowledgeItem, PageStatus};
use crate::notify::{message_or_fallback, Notifier};
use crate::registry::EndpointKey;
use crate::storage::{load_json, save_json, Storage};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

pub const KNOWLEDGE_BASE_STORE_KEY: &str = "knowledgeBase";

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct KnowledgeBaseState {
    /// 当前操作的知识库 id
    pub current_id: String,
    pub current_kb_name: String,
    /// 选中的知识库 id，保持插入顺序
    pub select_list: Vec<String>,
    pub knowledge_base_list: Vec<KnowledgeItem>,
    pub show_default: PageStatus,
    pub show_delete_modal: bool,
}

pub struct KnowledgeBaseStore {
    state: Mutex<KnowledgeBaseState>,
    storage: Arc<dyn Storage>,
    dispatcher: Dispatcher,
    notifier: Arc<dyn Notifier>,
}

impl KnowledgeBaseStore {
    pub fn load(
        storage: Arc<dyn Storage>,
        dispatcher: Dispatcher,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let state =
            match load_json::<KnowledgeBaseState>(storage.as_ref(), KNOWLEDGE_BASE_STORE_KEY) {
                Ok(state) => state.unwrap_or_default(),
                Err(e) => {
                    warn!("知识库状态恢复失败，使用默认值: {}", e);
                    KnowledgeBaseState::default()
                }
            };
        KnowledgeBaseStore {
            state: Mutex::new(state),
            storage,
            dispatcher,
            notifier,
        }
    }

    pub fn snapshot(&self) -> KnowledgeBaseState {
        self.state.lock().clone()
    }

    pub fn knowledge_base_list(&self) -> Vec<KnowledgeItem> {
        self.state.lock().knowledge_base_list.clone()
    }

    pub fn select_list(&self) -> Vec<String> {
        self.state.lock().select_list.clone()
    }

    pub fn show_default(&self) -> PageStatus {
        self.state.lock().show_default
    }

    pub fn set_current_id(&self, id: impl Into<String>) {
        let id = id.into();
        debug!(current_id = %id, "current knowledge base changed");
        self.mutate(|state| state.current_id = id);
    }

    pub fn set_current_kb_name(&self, name: impl Into<String>) {
        let name = name.into();
        self.mutate(|state| state.current_kb_name = name);
    }

    pub fn set_select_list(&self, list: Vec<String>) {
        self.mutate(|state| state.select_list = list);
    }

    pub fn set_knowledge_base_list(&self, list: Vec<KnowledgeItem>) {
        self.mutate(|state| state.knowledge_base_list = list);
    }

    pub fn set_default(&self, status: PageStatus) {
        self.mutate(|state| state.show_default = status);
    }

    pub fn set_show_delete_modal(&self, flag: bool) {
        self.mutate(|state| state.show_delete_modal = flag);
    }

    /// 拉取知识库列表并更新页面状态，失败只通过提示反馈，不向上返回错误
    pub async fn get_list(&self) {
        match self.dispatcher.call(EndpointKey::KbList, None, None).await {
            Ok(envelope) => self.apply_list_response(envelope),
            Err(e) => self.fail(&e),
        }
    }

    fn apply_list_response(&self, envelope: Envelope) {
        match envelope.code {
            Envelope::SUCCESS => match parse_items(envelope.data) {
                Ok(items) if !items.is_empty() => {
                    self.mutate(|state| {
                        if state.select_list.is_empty() && !items[0].kb_id.is_empty() {
                            state.select_list.push(items[0].kb_id.clone());
                        }
                        state.knowledge_base_list = items;
                        state.show_default = PageStatus::Normal;
                    });
                }
                Ok(_) => self.reset_to_default(),
                Err(e) => self.fail(&e),
            },
            Envelope::SERVER_ERROR => {
                self.reset_to_default();
                self.notifier
                    .error(&message_or_fallback(Some(envelope.msg.as_str())));
            }
            // 其它状态码不改动页面
            code => warn!(code, msg = %envelope.msg, "unexpected knowledge base list code"),
        }
    }

    fn fail(&self, error: &AppError) {
        warn!("知识库列表获取失败: {}", error);
        self.reset_to_default();
        self.notifier
            .error(&message_or_fallback(error.user_message().as_deref()));
    }

    fn reset_to_default(&self) {
        self.mutate(|state| {
            state.knowledge_base_list.clear();
            state.show_default = PageStatus::Default;
        });
    }

    fn mutate(&self, f: impl FnOnce(&mut KnowledgeBaseState)) {
        let mut state = self.state.lock();
        f(&mut *state);
        if let Err(e) = save_json(self.storage.as_ref(), KNOWLEDGE_BASE_STORE_KEY, &*state) {
            warn!("知识库状态保存失败: {}", e);
        }
    }
}

/// `data` 为空或不是数组时视为空列表
fn parse_items(data: Value) -> Result<Vec<KnowledgeItem>, AppError> {
    match data {
        Value::Array(items) if !items.is_empty() => {
            Ok(serde_json::from_value(Value::Array(items))?)
        }
        _ => Ok(Vec::new()),
    }
}
