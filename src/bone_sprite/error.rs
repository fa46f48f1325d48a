use thiserror::Error;

use super::visual::SpriteVisual;

/// 骨骼精灵绑定错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BoneSpriteError {
    #[error("Bone not found: {0}")]
    BoneNotFound(String),

    #[error("Slot not found: {0}")]
    SlotNotFound(String),

    #[error("Slot '{0}' has no region attachment")]
    NotRegionSlot(String),
}

/// 被拒绝的绑定请求，精灵原样交还调用方
///
/// 精灵不要求 `Send`，因此本类型不能直接经 `?` 转入 `anyhow::Error`；
/// 先转换为 `RendererError`（会丢弃精灵）。
#[derive(Error, Debug)]
#[error("{error}")]
pub struct RejectedSprite {
    #[source]
    pub error: BoneSpriteError,
    pub sprite: Box<dyn SpriteVisual>,
}

impl RejectedSprite {
    pub fn new(error: BoneSpriteError, sprite: Box<dyn SpriteVisual>) -> Self {
        Self { error, sprite }
    }

    /// 取回精灵
    pub fn into_sprite(self) -> Box<dyn SpriteVisual> {
        self.sprite
    }
}
