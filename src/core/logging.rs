//! 日志初始化
//!
//! 基于 tracing 框架。`RUST_LOG` 环境变量优先于配置中的日志级别。

use crate::config::{LogLevel, LoggingConfig};
use tracing_subscriber::EnvFilter;

/// 初始化日志系统
///
/// 重复调用是安全的：已经安装过全局订阅者时直接返回。
pub fn init_logging(config: &LoggingConfig) {
    if !config.log_to_console {
        return;
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.as_filter()));

    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
    tracing::debug!(target: "skeleton_renderer", "Logging initialized at {:?}", config.level);
}

impl LogLevel {
    /// 转换为 EnvFilter 指令
    pub fn as_filter(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}
