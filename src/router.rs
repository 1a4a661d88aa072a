//! 导航守卫
//!
//! 每次导航依次执行：启动进度条并触发版本检查（不等待结果）、登录校验、
//! 导航结束后关闭进度条。未登录访问非登录页时重定向到 `/login`。

use crate::storage::{load_json, save_json, Storage};
use dashmap::DashMap;
use futures_util::future::BoxFuture;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

pub const LOGIN_PATH: &str = "/login";
/// 登录态 cookie 名
pub const TOKEN_COOKIE: &str = "token";

pub trait CookieJar: Send + Sync {
    fn get(&self, name: &str) -> Option<String>;
    fn set(&self, name: &str, value: &str);
    fn remove(&self, name: &str);
}

#[derive(Clone, Default)]
pub struct MemoryCookieJar(Arc<DashMap<String, String>>);

impl MemoryCookieJar {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CookieJar for MemoryCookieJar {
    fn get(&self, name: &str) -> Option<String> {
        self.0.get(name).map(|v| v.value().clone())
    }

    fn set(&self, name: &str, value: &str) {
        self.0.insert(name.to_string(), value.to_string());
    }

    fn remove(&self, name: &str) {
        self.0.remove(name);
    }
}

pub const COOKIE_STORE_KEY: &str = "cookies";

/// 写进本地存储的 cookie，命令行多次运行之间保持登录态
pub struct StorageCookieJar {
    storage: Arc<dyn Storage>,
}

impl StorageCookieJar {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        StorageCookieJar { storage }
    }

    fn read(&self) -> HashMap<String, String> {
        match load_json::<HashMap<String, String>>(self.storage.as_ref(), COOKIE_STORE_KEY) {
            Ok(cookies) => cookies.unwrap_or_default(),
            Err(e) => {
                warn!("cookie 读取失败: {}", e);
                HashMap::new()
            }
        }
    }

    fn write(&self, cookies: &HashMap<String, String>) {
        if let Err(e) = save_json(self.storage.as_ref(), COOKIE_STORE_KEY, cookies) {
            warn!("cookie 保存失败: {}", e);
        }
    }
}

impl CookieJar for StorageCookieJar {
    fn get(&self, name: &str) -> Option<String> {
        self.read().remove(name)
    }

    fn set(&self, name: &str, value: &str) {
        let mut cookies = self.read();
        cookies.insert(name.to_string(), value.to_string());
        self.write(&cookies);
    }

    fn remove(&self, name: &str) {
        let mut cookies = self.read();
        if cookies.remove(name).is_some() {
            self.write(&cookies);
        }
    }
}

pub trait ProgressIndicator: Send + Sync {
    fn start(&self);
    fn close(&self);
}

/// 没有界面时使用，只打日志
#[derive(Clone, Copy, Debug, Default)]
pub struct LogProgress;

impl ProgressIndicator for LogProgress {
    fn start(&self) {
        debug!("navigation started");
    }

    fn close(&self) {
        debug!("navigation finished");
    }
}

pub trait VersionChecker: Send + Sync {
    fn check(&self) -> BoxFuture<'static, ()>;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NavigationOutcome {
    Proceed(String),
    Redirect(String),
}

impl NavigationOutcome {
    /// 最终停留的路径
    pub fn path(&self) -> &str {
        match self {
            NavigationOutcome::Proceed(path) | NavigationOutcome::Redirect(path) => path,
        }
    }
}

pub struct NavigationGuard {
    cookies: Arc<dyn CookieJar>,
    progress: Arc<dyn ProgressIndicator>,
    version: Option<Arc<dyn VersionChecker>>,
}

impl NavigationGuard {
    pub fn new(cookies: Arc<dyn CookieJar>, progress: Arc<dyn ProgressIndicator>) -> Self {
        NavigationGuard {
            cookies,
            progress,
            version: None,
        }
    }

    pub fn with_version_checker(mut self, checker: Arc<dyn VersionChecker>) -> Self {
        self.version = Some(checker);
        self
    }

    /// 前置守卫：进度条 + 版本检查，然后做登录校验
    pub fn before_each(&self, to: &str) -> NavigationOutcome {
        self.progress.start();
        self.trigger_version_check();
        self.auth_gate(to)
    }

    pub fn after_each(&self) {
        self.progress.close();
    }

    /// 跑完整个守卫链，返回本次导航的结果
    pub fn navigate(&self, to: &str) -> NavigationOutcome {
        let outcome = self.before_each(to);
        self.after_each();
        outcome
    }

    pub fn auth_gate(&self, to: &str) -> NavigationOutcome {
        let authenticated = self
            .cookies
            .get(TOKEN_COOKIE)
            .map(|token| !token.is_empty())
            .unwrap_or(false);

        if to != LOGIN_PATH && !authenticated {
            debug!(target_path = to, "not logged in, redirecting");
            NavigationOutcome::Redirect(LOGIN_PATH.to_string())
        } else {
            NavigationOutcome::Proceed(to.to_string())
        }
    }

    fn trigger_version_check(&self) {
        let Some(checker) = self.version.as_ref() else {
            return;
        };
        // 不等待结果；没有运行时（同步调用场景）就跳过
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(checker.check());
            }
            Err(_) => debug!("no async runtime, skipping version check"),
        }
    }
}
