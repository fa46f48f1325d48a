//! 骨架数据模块
//!
//! 提供骨骼、插槽、附件和皮肤的内存模型，以及渲染需要的世界顶点计算。
//!
//! ## 功能特性
//!
//! - 父先子后的骨骼世界变换
//! - 区域 / 网格 / 蒙皮网格附件的世界顶点
//! - 皮肤切换和按名称设置附件
//! - 外部姿态驱动器接口
//!
//! ## 使用示例
//!
//! ```rust
//! use std::sync::Arc;
//! use skeleton_renderer::render::TextureId;
//! use skeleton_renderer::skeleton::{
//!     Attachment, BoneData, RegionAttachment, Skeleton, SkeletonData, SlotData,
//! };
//!
//! let mut data = SkeletonData::new("hero");
//! let root = data.add_bone(BoneData::new("root", None));
//! let body = data.add_slot(SlotData::new("body", root).with_attachment("body"));
//! data.add_default_attachment(
//!     body,
//!     Attachment::Region(RegionAttachment::new("body", TextureId(1), 32.0, 64.0)),
//! );
//!
//! let skeleton = Skeleton::new(Arc::new(data));
//! assert!(skeleton.slots[body].attachment.is_some());
//! ```

pub mod attachment;
pub mod bone;
pub mod data;
pub mod instance;
pub mod pose;
pub mod skin;
pub mod slot;

pub use attachment::{
    Attachment, BoundingBoxAttachment, MeshAttachment, RegionAttachment, RenderParts,
    SkinnedMeshAttachment,
};
pub use bone::{Bone, BoneData};
pub use data::SkeletonData;
pub use instance::Skeleton;
pub use pose::PoseDriver;
pub use skin::Skin;
pub use slot::{BlendMode, Slot, SlotCorners, SlotData};
