//! 统一错误处理模块
//!
//! 提供渲染器范围内的错误类型定义
//!
//! ## 错误类型分层
//!
//! - **构造期错误** (`RendererError`): 骨骼数据或配置无效，渲染器无法创建
//! - **配置错误** (`config::ConfigError`): 配置文件读取、解析、验证失败
//! - **绑定错误** (`bone_sprite::BoneSpriteError`): 骨骼精灵绑定时的可恢复错误
//!
//! 运行期的可恢复错误（名称找不到、容量超限）只记录日志，不会中断一帧的渲染。

use crate::bone_sprite::{BoneSpriteError, RejectedSprite};
use crate::config::ConfigError;
use thiserror::Error;

/// 渲染器构造错误类型
#[derive(Error, Debug)]
pub enum RendererError {
    #[error("Invalid skeleton data: {0}")]
    InvalidSkeletonData(String),

    #[error("Renderer config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Bone sprite error: {0}")]
    BoneSprite(#[from] BoneSpriteError),
}

/// 丢弃被拒绝的精灵，只保留错误
impl From<RejectedSprite> for RendererError {
    fn from(rejected: RejectedSprite) -> Self {
        RendererError::BoneSprite(rejected.error)
    }
}

/// 渲染器结果类型
pub type RendererResult<T> = Result<T, RendererError>;
