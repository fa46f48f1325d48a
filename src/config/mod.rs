/// 渲染器配置系统
///
/// 提供TOML/JSON配置文件、环境变量和运行时动态调整
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::impl_default;
use crate::render::blend::BlendFunc;

pub mod debug;

pub use debug::DebugConfig;

/// 配置错误
#[derive(Error, Debug)]
pub enum ConfigError {
    /// 文件读取错误
    #[error("Config file error: {0}")]
    FileError(#[from] std::io::Error),
    /// 解析错误
    #[error("Config parse error: {0}")]
    ParseError(String),
    /// 验证错误
    #[error("Config validation error: {0}")]
    ValidationError(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// 单个附件允许的最大世界顶点浮点数（x, y 交错）
pub const DEFAULT_MAX_WORLD_VERTICES: usize = 1000;
/// 单个批次允许的最大顶点数
pub const DEFAULT_BATCH_CAPACITY: usize = 2000;

/// 骨骼渲染器主配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RendererConfig {
    /// 纹理是否为预乘 Alpha（同时决定顶点颜色是否乘以 alpha）
    pub premultiplied_alpha: bool,

    /// NORMAL 混合模式使用的基础混合函数
    pub blend_func: BlendFunc,

    /// 顶点暂存缓冲区容量（浮点数）
    pub max_world_vertices: usize,

    /// 批次容量（顶点数），超出时批次自行提交
    pub batch_capacity: usize,

    /// 动画播放速度
    pub time_scale: f32,

    /// 调试绘制配置
    #[serde(default)]
    pub debug: DebugConfig,

    /// 日志配置
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl_default!(RendererConfig {
    premultiplied_alpha: true,
    blend_func: BlendFunc::ALPHA_PREMULTIPLIED,
    max_world_vertices: DEFAULT_MAX_WORLD_VERTICES,
    batch_capacity: DEFAULT_BATCH_CAPACITY,
    time_scale: 1.0,
    debug: DebugConfig::default(),
    logging: LoggingConfig::default(),
});

impl RendererConfig {
    /// 创建默认配置
    pub fn new() -> Self {
        Self::default()
    }

    /// 默认配置叠加环境变量
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env_overrides();
        config
    }

    /// 从TOML文件加载配置
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(ConfigError::FileError)?;
        Self::from_toml_str(&content)
    }

    /// 从TOML字符串解析配置
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// 从JSON文件加载配置
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(ConfigError::FileError)?;
        Self::from_json_str(&content)
    }

    /// 从JSON字符串解析配置
    pub fn from_json_str(content: &str) -> ConfigResult<Self> {
        serde_json::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// 保存为TOML文件
    pub fn save_toml<P: AsRef<Path>>(&self, path: P) -> ConfigResult<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        fs::write(path, content).map_err(ConfigError::FileError)
    }

    /// 保存为JSON文件
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> ConfigResult<()> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;
        fs::write(path, content).map_err(ConfigError::FileError)
    }

    /// 从环境变量覆盖配置
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = env::var("SKELETON_RENDERER_PREMULTIPLIED_ALPHA") {
            self.premultiplied_alpha = val.parse().unwrap_or(self.premultiplied_alpha);
        }
        if let Ok(val) = env::var("SKELETON_RENDERER_TIME_SCALE") {
            if let Ok(scale) = val.parse() {
                self.time_scale = scale;
            }
        }
        if let Ok(val) = env::var("SKELETON_RENDERER_MAX_WORLD_VERTICES") {
            if let Ok(capacity) = val.parse() {
                self.max_world_vertices = capacity;
            }
        }
        if let Ok(val) = env::var("SKELETON_RENDERER_BATCH_CAPACITY") {
            if let Ok(capacity) = val.parse() {
                self.batch_capacity = capacity;
            }
        }

        // 调试绘制
        if let Ok(val) = env::var("SKELETON_RENDERER_DEBUG_SLOTS") {
            self.debug.slots = val.parse().unwrap_or(self.debug.slots);
        }
        if let Ok(val) = env::var("SKELETON_RENDERER_DEBUG_BONES") {
            self.debug.bones = val.parse().unwrap_or(self.debug.bones);
        }
    }

    /// 验证配置
    pub fn validate(&self) -> ConfigResult<()> {
        if self.max_world_vertices < 8 {
            return Err(ConfigError::ValidationError(format!(
                "max_world_vertices must hold at least one quad (8 floats), got {}",
                self.max_world_vertices
            )));
        }
        if self.batch_capacity < self.max_world_vertices {
            return Err(ConfigError::ValidationError(format!(
                "batch_capacity ({}) must not be smaller than max_world_vertices ({})",
                self.batch_capacity, self.max_world_vertices
            )));
        }
        if !self.time_scale.is_finite() || self.time_scale < 0.0 {
            return Err(ConfigError::ValidationError(format!(
                "time_scale must be finite and non-negative, got {}",
                self.time_scale
            )));
        }
        Ok(())
    }
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// 日志级别
    pub level: LogLevel,

    /// 是否输出到控制台
    pub log_to_console: bool,
}

impl_default!(LoggingConfig {
    level: LogLevel::Info,
    log_to_console: true,
});

/// 日志级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogLevel {
    /// 跟踪
    Trace,
    /// 调试
    Debug,
    /// 信息
    Info,
    /// 警告
    Warn,
    /// 错误
    Error,
}
