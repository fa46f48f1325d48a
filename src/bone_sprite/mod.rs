//! 骨骼精灵
//!
//! 把任意精灵刚性地挂到骨骼或插槽上，跟随骨骼每帧的姿态移动。
//! 精灵自带的旋转和缩放在绑定时烘焙进四边形偏移，
//! 骨骼绑定时已有的旋转在之后每帧扣除，避免重复应用。

pub mod error;
pub mod registry;
pub mod visual;

pub use error::{BoneSpriteError, RejectedSprite};
pub use registry::{BoneHandle, BoneSprite, BoneSpriteRegistry, SPRITE_UVS};
pub use visual::{Sprite, SpriteVisual};
