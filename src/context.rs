//! 应用上下文：把配置、存储、会话、派发器和状态容器组装在一起。
//!
//! 所有依赖都在这里显式创建并注入，没有全局单例。

use crate::config::AppConfig;
use crate::dispatcher::{Dispatcher, SessionSource, Transport};
use crate::error::AppResult;
use crate::notify::{Notifier, TracingNotifier};
use crate::registry::validate_registry;
use crate::router::{CookieJar, LogProgress, NavigationGuard, StorageCookieJar};
use crate::storage::{JsonFileStorage, Storage};
use crate::stores::{KnowledgeBaseStore, UserStore};
use crate::transport::HttpTransport;
use std::sync::Arc;
use tracing::info;

pub struct AppContext {
    pub config: AppConfig,
    pub user: Arc<UserStore>,
    pub dispatcher: Dispatcher,
    pub knowledge_base: Arc<KnowledgeBaseStore>,
    pub cookies: Arc<dyn CookieJar>,
    pub guard: NavigationGuard,
}

impl AppContext {
    /// 按配置创建：JSON 文件存储 + HTTP 传输 + 日志提示
    pub fn from_config(config: AppConfig) -> AppResult<Self> {
        let storage: Arc<dyn Storage> = match &config.storage_dir {
            Some(dir) => Arc::new(JsonFileStorage::new(dir.clone())),
            None => Arc::new(JsonFileStorage::in_config_dir()?),
        };
        let user = Arc::new(UserStore::load(storage.clone()));
        let session: Arc<dyn SessionSource> = user.clone();
        let transport: Arc<dyn Transport> =
            Arc::new(HttpTransport::new(config.api_url.clone(), session));
        let cookies: Arc<dyn CookieJar> = Arc::new(StorageCookieJar::new(storage.clone()));

        Self::assemble(
            config,
            storage,
            user,
            transport,
            cookies,
            Arc::new(TracingNotifier),
        )
    }

    /// 由调用方提供各协作方，测试中用来替换传输层和提示
    pub fn assemble(
        config: AppConfig,
        storage: Arc<dyn Storage>,
        user: Arc<UserStore>,
        transport: Arc<dyn Transport>,
        cookies: Arc<dyn CookieJar>,
        notifier: Arc<dyn Notifier>,
    ) -> AppResult<Self> {
        validate_registry()?;

        let dispatcher = Dispatcher::new(transport, user.clone());
        let knowledge_base = Arc::new(KnowledgeBaseStore::load(
            storage,
            dispatcher.clone(),
            notifier,
        ));
        let guard = NavigationGuard::new(cookies.clone(), Arc::new(LogProgress));

        info!(api_url = %config.api_url, "application context ready");
        Ok(AppContext {
            config,
            user,
            dispatcher,
            knowledge_base,
            cookies,
            guard,
        })
    }
}
