//! 用户会话状态
//!
//! 保存令牌、用户 ID、角色和手机号，并控制"补充手机号"弹窗的开关。
//! 每次修改后立即写回存储，创建时从存储恢复。

use crate::dispatcher::SessionSource;
use crate::models::{SessionUpdate, UserInfo};
use crate::registry::ParamContext;
use crate::storage::{load_json, save_json, Storage};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

pub const USER_STORE_KEY: &str = "user";

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserState {
    #[serde(default)]
    pub user_info: UserInfo,
    #[serde(default)]
    pub user_phone_dialog_open: bool,
}

pub struct UserStore {
    state: Mutex<UserState>,
    storage: Arc<dyn Storage>,
}

impl UserStore {
    /// 从存储恢复状态，读取失败时退回默认值
    pub fn load(storage: Arc<dyn Storage>) -> Self {
        let state = match load_json::<UserState>(storage.as_ref(), USER_STORE_KEY) {
            Ok(Some(state)) => state,
            Ok(None) => UserState::default(),
            Err(e) => {
                warn!("用户状态恢复失败，使用默认值: {}", e);
                UserState::default()
            }
        };
        UserStore {
            state: Mutex::new(state),
            storage,
        }
    }

    pub fn snapshot(&self) -> UserState {
        self.state.lock().clone()
    }

    pub fn user_info(&self) -> UserInfo {
        self.state.lock().user_info.clone()
    }

    pub fn user_phone_dialog_open(&self) -> bool {
        self.state.lock().user_phone_dialog_open
    }

    /// 一次性覆盖令牌、用户 ID 和角色，手机号保持不变
    pub fn set_user_info(&self, update: SessionUpdate) {
        self.mutate(|state| {
            state.user_info.token = update.token;
            state.user_info.user_id = update.user_id;
            state.user_info.role = update.role;
        });
        info!(user_id = %self.user_info().user_id, "session updated");
    }

    pub fn set_phone_number(&self, phone: impl Into<String>) {
        let phone = phone.into();
        self.mutate(|state| state.user_info.phone_number = phone);
    }

    pub fn set_user_phone_dialog_open(&self, open: bool) {
        self.mutate(|state| state.user_phone_dialog_open = open);
    }

    /// 手机号仍是占位值 `"1"` 时返回 `false` 并打开补充手机号弹窗
    pub fn check_phone(&self) -> bool {
        let cached = self.user_info().phone_number;
        if cached.trim() == UserInfo::PHONE_PLACEHOLDER {
            self.set_user_phone_dialog_open(true);
            return false;
        }
        true
    }

    /// 退出登录：清空身份字段，保留手机号
    pub fn clear_session(&self) {
        self.set_user_info(SessionUpdate::default());
    }

    fn mutate(&self, f: impl FnOnce(&mut UserState)) {
        let mut state = self.state.lock();
        f(&mut *state);
        if let Err(e) = save_json(self.storage.as_ref(), USER_STORE_KEY, &*state) {
            warn!("用户状态保存失败: {}", e);
        }
    }
}

impl SessionSource for UserStore {
    fn param_context(&self) -> ParamContext {
        let info = self.user_info();
        ParamContext {
            user_id: info.user_id,
            user_info: info.phone_number,
        }
    }

    fn token(&self) -> Option<String> {
        let token = self.user_info().token;
        if token.is_empty() {
            None
        } else {
            Some(token)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    fn store() -> (UserStore, MemoryStorage) {
        let storage = MemoryStorage::new();
        (UserStore::load(Arc::new(storage.clone())), storage)
    }

    #[test]
    fn check_phone_opens_dialog_for_placeholder() {
        let (store, _) = store();
        assert!(!store.user_phone_dialog_open());
        assert!(!store.check_phone());
        assert!(store.user_phone_dialog_open());
    }

    #[test]
    fn check_phone_trims_before_comparing() {
        let (store, _) = store();
        store.set_phone_number(" 1 ");
        assert!(!store.check_phone());
    }

    #[test]
    fn check_phone_passes_and_leaves_flag_alone() {
        let (store, _) = store();
        store.set_phone_number("13800000000");
        assert!(store.check_phone());
        assert!(!store.user_phone_dialog_open());
    }

    #[test]
    fn set_user_info_keeps_phone_number() {
        let (store, _) = store();
        store.set_phone_number("13800000000");
        store.set_user_info(SessionUpdate {
            token: "tok".into(),
            user_id: "u1".into(),
            role: "admin".into(),
        });
        let info = store.user_info();
        assert_eq!(info.token, "tok");
        assert_eq!(info.user_id, "u1");
        assert_eq!(info.role, "admin");
        assert_eq!(info.phone_number, "13800000000");
    }

    #[test]
    fn state_survives_reload() {
        let (store, storage) = store();
        store.set_user_info(SessionUpdate {
            token: "tok".into(),
            user_id: "u1".into(),
            role: "user".into(),
        });
        drop(store);

        let reloaded = UserStore::load(Arc::new(storage));
        assert_eq!(reloaded.user_info().user_id, "u1");
        assert_eq!(reloaded.token().as_deref(), Some("tok"));
    }

    #[test]
    fn partial_record_keeps_the_stored_token() {
        let storage = MemoryStorage::new();
        storage.0.insert(
            USER_STORE_KEY.to_string(),
            r#"{"userInfo":{"token":"tok","userId":"u1"}}"#.to_string(),
        );
        let store = UserStore::load(Arc::new(storage));
        let info = store.user_info();
        assert_eq!(info.token, "tok");
        assert_eq!(info.user_id, "u1");
        assert_eq!(info.phone_number, UserInfo::PHONE_PLACEHOLDER);
        assert!(info.role.is_empty());
    }

    #[test]
    fn corrupt_state_falls_back_to_default() {
        let storage = MemoryStorage::new();
        storage.0.insert(USER_STORE_KEY.to_string(), "garbage".to_string());
        let store = UserStore::load(Arc::new(storage));
        assert_eq!(store.snapshot(), UserState::default());
    }

    #[test]
    fn session_source_exposes_defaults_for_requests() {
        let (store, _) = store();
        assert!(store.token().is_none());
        store.set_user_info(SessionUpdate {
            token: "tok".into(),
            user_id: "u7".into(),
            role: "user".into(),
        });
        let ctx = store.param_context();
        assert_eq!(ctx.user_id, "u7");
        assert_eq!(ctx.user_info, "1");
    }
}
