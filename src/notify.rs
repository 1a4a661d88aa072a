//! 用户可见的提示。界面层负责展示，这里只定义接口和默认的日志实现。

use tracing::error;

/// 请求失败且没有可用消息时的兜底文案
pub const FALLBACK_ERROR: &str = "出错了，请稍后重试";

pub trait Notifier: Send + Sync {
    fn error(&self, message: &str);
}

/// 把提示写进日志，命令行和无界面环境下使用
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn error(&self, message: &str) {
        error!(target: "notify", "{}", message);
    }
}

/// 消息为空白时替换为兜底文案
pub fn message_or_fallback(message: Option<&str>) -> String {
    message
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .unwrap_or(FALLBACK_ERROR)
        .to_string()
}
