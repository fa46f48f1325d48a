//! 骨骼渲染器
//!
//! 面向宿主的入口：每帧 `update` 推进姿态，`draw` 把骨架和绑定的精灵提交给批处理器。
//!
//! ## 使用示例
//!
//! ```rust
//! use std::sync::Arc;
//! use glam::Mat4;
//! use skeleton_renderer::bone_sprite::Sprite;
//! use skeleton_renderer::config::RendererConfig;
//! use skeleton_renderer::render::{PolygonSpriteBatch, TextureId};
//! use skeleton_renderer::renderer::SkeletonRenderer;
//! use skeleton_renderer::skeleton::{
//!     Attachment, BoneData, RegionAttachment, SkeletonData, SlotData,
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
//! let mut renderer = SkeletonRenderer::new(Arc::new(data), RendererConfig::default()).unwrap();
//! renderer
//!     .add_sprite_to_bone("root", Box::new(Sprite::new(TextureId(2), 8.0, 8.0)))
//!     .unwrap();
//!
//! // 批处理器跨帧累积，每帧提交给 GPU 后由宿主 `clear`
//! let mut batch = PolygonSpriteBatch::new(2000);
//! for _ in 0..2 {
//!     batch.clear();
//!     renderer.update(1.0 / 60.0);
//!     let stats = renderer.draw(&mut batch, &Mat4::IDENTITY);
//!     assert_eq!(stats.bone_sprites_drawn, 1);
//! }
//! assert_eq!(batch.draw_calls().len(), 2);
//! ```

use glam::{Mat4, Vec2};
use std::sync::Arc;

use crate::bone_sprite::{
    BoneHandle, BoneSpriteError, BoneSpriteRegistry, RejectedSprite, SpriteVisual,
};
use crate::config::RendererConfig;
use crate::core::error::RendererResult;
use crate::render::blend::BlendFunc;
use crate::render::debug::{draw_debug_overlay, DebugDraw, DebugOptions};
use crate::render::pipeline::{DrawPipeline, DrawSettings, FrameStats};
use crate::render::resolver::VertexResolver;
use crate::render::PolygonBatch;
use crate::skeleton::{Attachment, Bone, PoseDriver, Skeleton, SkeletonData, Slot};

pub mod node;

pub use node::{NodeState, Rect};

/// 骨骼渲染器
///
/// 绑定的精灵随渲染器一起释放（先 `on_exit`，再销毁）。
pub struct SkeletonRenderer {
    skeleton: Skeleton,
    sprites: BoneSpriteRegistry,
    resolver: VertexResolver,
    pipeline: DrawPipeline,
    pose_driver: Option<Box<dyn PoseDriver>>,
    node: NodeState,
    time_scale: f32,
    debug: DebugOptions,
    blend_func: BlendFunc,
    premultiplied_alpha: bool,
}

impl SkeletonRenderer {
    /// 创建渲染器
    ///
    /// 骨骼数据或配置无效时返回错误。
    pub fn new(data: Arc<SkeletonData>, config: RendererConfig) -> RendererResult<Self> {
        config.validate()?;
        data.validate()?;

        tracing::info!(
            target: "skeleton_renderer",
            "Creating renderer for skeleton '{}' ({} bones, {} slots, {} skins)",
            data.name,
            data.bones.len(),
            data.slots.len(),
            data.skins.len()
        );

        Ok(Self {
            skeleton: Skeleton::new(data),
            sprites: BoneSpriteRegistry::new(),
            resolver: VertexResolver::new(config.max_world_vertices),
            pipeline: DrawPipeline::new(),
            pose_driver: None,
            node: NodeState::default(),
            time_scale: config.time_scale,
            debug: DebugOptions {
                slots: config.debug.slots,
                bones: config.debug.bones,
            },
            blend_func: config.blend_func,
            premultiplied_alpha: config.premultiplied_alpha,
        })
    }

    /// 使用默认配置创建
    pub fn with_data(data: Arc<SkeletonData>) -> RendererResult<Self> {
        Self::new(data, RendererConfig::default())
    }

    // ------------------------------------------------------------------
    // 每帧入口
    // ------------------------------------------------------------------

    /// 推进一帧：时间缩放后交给姿态驱动器，然后更新世界变换
    pub fn update(&mut self, delta_time: f32) {
        let delta = delta_time * self.time_scale;
        self.skeleton.update(delta);
        if let Some(driver) = self.pose_driver.as_mut() {
            driver.apply(&mut self.skeleton, delta);
        }
        self.skeleton.update_world_transform();
    }

    /// 绘制骨架和绑定的精灵
    pub fn draw(&mut self, batch: &mut dyn PolygonBatch, transform: &Mat4) -> FrameStats {
        self.skeleton.color = self.node.tint();
        let settings = DrawSettings {
            premultiplied_alpha: self.premultiplied_alpha,
            blend_func: self.blend_func,
            node_position: self.node.position,
        };
        self.pipeline.draw(
            &mut self.skeleton,
            &mut self.resolver,
            &mut self.sprites,
            batch,
            transform,
            &settings,
        )
    }

    /// 绘制调试覆盖层（插槽、骨骼开关都关闭时什么也不画）
    pub fn draw_debug(&self, debug: &mut dyn DebugDraw, transform: &Mat4) {
        draw_debug_overlay(&self.skeleton, debug, transform, self.debug);
    }

    /// 上一次绘制的统计
    pub fn last_frame_stats(&self) -> FrameStats {
        self.pipeline.last_stats()
    }

    /// 所有插槽附件的包围盒
    ///
    /// 局部坐标先乘节点缩放，再加节点位置。没有可绘制附件时返回位于节点位置的零尺寸矩形。
    pub fn bounding_box(&mut self) -> Rect {
        let scale = self.node.scale;
        let mut min = Vec2::splat(f32::INFINITY);
        let mut max = Vec2::splat(f32::NEG_INFINITY);

        for slot_index in 0..self.skeleton.slots.len() {
            let Some(floats) = self.resolver.compute_world_vertices(&self.skeleton, slot_index)
            else {
                continue;
            };
            for p in self.resolver.vertices(floats).chunks_exact(2) {
                let v = Vec2::new(p[0], p[1]) * scale;
                min = min.min(v);
                max = max.max(v);
            }
        }

        if min.x > max.x {
            return Rect::from_min_max(self.node.position, self.node.position);
        }
        Rect::from_min_max(self.node.position + min, self.node.position + max)
    }

    // ------------------------------------------------------------------
    // 设置
    // ------------------------------------------------------------------

    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }

    /// 设置时间缩放，非有限值或负值被忽略并返回 false
    pub fn set_time_scale(&mut self, time_scale: f32) -> bool {
        if !time_scale.is_finite() || time_scale < 0.0 {
            tracing::warn!(
                target: "skeleton_renderer",
                "Ignoring invalid time scale: {}",
                time_scale
            );
            return false;
        }
        self.time_scale = time_scale;
        true
    }

    pub fn debug_slots(&self) -> bool {
        self.debug.slots
    }

    pub fn set_debug_slots(&mut self, enabled: bool) {
        self.debug.slots = enabled;
    }

    pub fn debug_bones(&self) -> bool {
        self.debug.bones
    }

    pub fn set_debug_bones(&mut self, enabled: bool) {
        self.debug.bones = enabled;
    }

    /// Normal 混合模式使用的混合函数
    pub fn blend_func(&self) -> BlendFunc {
        self.blend_func
    }

    pub fn set_blend_func(&mut self, blend_func: BlendFunc) {
        self.blend_func = blend_func;
    }

    /// 不透明度是否影响 RGB（预乘 Alpha）
    pub fn premultiplied_alpha(&self) -> bool {
        self.premultiplied_alpha
    }

    pub fn set_premultiplied_alpha(&mut self, premultiplied_alpha: bool) {
        self.premultiplied_alpha = premultiplied_alpha;
    }

    pub fn set_pose_driver(&mut self, driver: impl PoseDriver + 'static) {
        self.pose_driver = Some(Box::new(driver));
    }

    pub fn clear_pose_driver(&mut self) {
        self.pose_driver = None;
    }

    pub fn node(&self) -> &NodeState {
        &self.node
    }

    pub fn node_mut(&mut self) -> &mut NodeState {
        &mut self.node
    }

    // ------------------------------------------------------------------
    // 骨架
    // ------------------------------------------------------------------

    pub fn skeleton(&self) -> &Skeleton {
        &self.skeleton
    }

    pub fn skeleton_mut(&mut self) -> &mut Skeleton {
        &mut self.skeleton
    }

    pub fn update_world_transform(&mut self) {
        self.skeleton.update_world_transform();
    }

    pub fn set_to_setup_pose(&mut self) {
        self.skeleton.set_to_setup_pose();
    }

    pub fn set_bones_to_setup_pose(&mut self) {
        self.skeleton.set_bones_to_setup_pose();
    }

    pub fn set_slots_to_setup_pose(&mut self) {
        self.skeleton.set_slots_to_setup_pose();
    }

    pub fn find_bone(&self, name: &str) -> Option<&Bone> {
        self.skeleton
            .find_bone(name)
            .and_then(|i| self.skeleton.bone(i))
    }

    pub fn find_slot(&self, name: &str) -> Option<&Slot> {
        self.skeleton
            .find_slot(name)
            .and_then(|i| self.skeleton.slot(i))
    }

    /// 切换皮肤，`None` 清除；找不到皮肤返回 false
    pub fn set_skin(&mut self, name: Option<&str>) -> bool {
        let found = self.skeleton.set_skin_by_name(name);
        if !found {
            tracing::warn!(target: "skeleton_renderer", "Skin not found: {:?}", name);
        }
        found
    }

    /// 先查当前皮肤再查默认皮肤
    pub fn attachment(&self, slot_name: &str, attachment_name: &str) -> Option<Arc<Attachment>> {
        self.skeleton
            .attachment_for_slot_name(slot_name, attachment_name)
    }

    /// 设置插槽附件，`None` 清空；插槽或附件不存在返回 false
    pub fn set_attachment(&mut self, slot_name: &str, attachment_name: Option<&str>) -> bool {
        let found = self.skeleton.set_attachment(slot_name, attachment_name);
        if !found {
            tracing::warn!(
                target: "skeleton_renderer",
                "Cannot set attachment {:?} on slot '{}'",
                attachment_name,
                slot_name
            );
        }
        found
    }

    /// 设置插槽垂直翻转，插槽不存在返回 false
    pub fn set_slot_flip_y(&mut self, slot_name: &str, flip_y: bool) -> bool {
        match self
            .skeleton
            .find_slot(slot_name)
            .and_then(|i| self.skeleton.slot_mut(i))
        {
            Some(slot) => {
                slot.flip_y = flip_y;
                true
            }
            None => {
                tracing::warn!(target: "skeleton_renderer", "Slot not found: {}", slot_name);
                false
            }
        }
    }

    // ------------------------------------------------------------------
    // 骨骼精灵
    // ------------------------------------------------------------------

    /// 把精灵绑定到骨骼上，以骨骼名为键
    ///
    /// 骨骼不存在时精灵随错误交还。
    pub fn add_sprite_to_bone(
        &mut self,
        bone_name: &str,
        sprite: Box<dyn SpriteVisual>,
    ) -> Result<(), RejectedSprite> {
        let Some(index) = self.skeleton.find_bone(bone_name) else {
            return Err(self.reject(BoneSpriteError::BoneNotFound(bone_name.to_string()), sprite));
        };
        let bone = &self.skeleton.bones[index];
        self.sprites
            .bind(bone_name, BoneHandle(index), bone, sprite, false, false);
        Ok(())
    }

    /// 把精灵绑定到插槽的区域四边形上，以插槽名为键
    ///
    /// 插槽不存在或当前附件不是区域附件时精灵随错误交还。
    pub fn add_sprite_to_slot(
        &mut self,
        slot_name: &str,
        sprite: Box<dyn SpriteVisual>,
        flip_y: bool,
    ) -> Result<(), RejectedSprite> {
        let Some(slot) = self.find_slot(slot_name) else {
            return Err(self.reject(BoneSpriteError::SlotNotFound(slot_name.to_string()), sprite));
        };
        if !slot.attachment.as_deref().is_some_and(Attachment::is_region) {
            return Err(self.reject(BoneSpriteError::NotRegionSlot(slot_name.to_string()), sprite));
        }

        let index = slot.bone;
        let bone = &self.skeleton.bones[index];
        self.sprites
            .bind(slot_name, BoneHandle(index), bone, sprite, true, flip_y);
        Ok(())
    }

    fn reject(&self, error: BoneSpriteError, sprite: Box<dyn SpriteVisual>) -> RejectedSprite {
        tracing::warn!(target: "bone_sprite", "Bone sprite rejected: {}", error);
        RejectedSprite::new(error, sprite)
    }

    /// 解除绑定，键不存在返回 false
    pub fn remove_bone_sprite(&mut self, key: &str) -> bool {
        self.sprites.unbind(key)
    }

    pub fn remove_all_bone_sprites(&mut self) {
        self.sprites.unbind_all();
    }

    /// 以骨骼名或插槽名查询绑定的精灵
    pub fn sprite_for_bone(&self, key: &str) -> Option<&dyn SpriteVisual> {
        self.sprites.sprite(key)
    }

    /// 设置插槽绑定的垂直翻转，键不存在返回 false
    pub fn set_bone_sprite_flip_y(&mut self, key: &str, flip_y: bool) -> bool {
        self.sprites.set_flip_y(key, flip_y)
    }

    pub fn bone_sprites(&self) -> &BoneSpriteRegistry {
        &self.sprites
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bone_sprite::Sprite;
    use crate::core::error::RendererError;
    use crate::render::batch::TextureId;
    use crate::render::debug::DebugRecorder;
    use crate::render::sprite_batch::PolygonSpriteBatch;
    use crate::skeleton::{
        BoundingBoxAttachment, BoneData, RegionAttachment, Skin, SlotData,
    };

    fn region(name: &str, texture: u64, width: f32, height: f32) -> Attachment {
        Attachment::Region(RegionAttachment::new(name, TextureId(texture), width, height))
    }

    fn data() -> Arc<SkeletonData> {
        let mut data = SkeletonData::new("hero");
        let root = data.add_bone(BoneData::new("root", None).with_length(20.0));
        let arm = data.add_bone(BoneData::new("arm", Some(root)).with_position(10.0, 0.0));
        let body = data.add_slot(SlotData::new("body", root).with_attachment("body"));
        let hand = data.add_slot(SlotData::new("hand", arm).with_attachment("hand"));
        let hit = data.add_slot(SlotData::new("hit", root).with_attachment("hit"));
        data.add_default_attachment(body, region("body", 1, 4.0, 4.0));
        data.add_default_attachment(hand, region("hand", 1, 2.0, 2.0));
        data.add_default_attachment(
            hit,
            Attachment::BoundingBox(BoundingBoxAttachment::new("hit", vec![0.0; 8])),
        );

        let mut skin = Skin::new("gold");
        skin.add_attachment(body, "body", region("body", 2, 4.0, 4.0));
        data.skins.push(skin);
        Arc::new(data)
    }

    fn renderer() -> SkeletonRenderer {
        SkeletonRenderer::with_data(data()).unwrap()
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = RendererConfig {
            max_world_vertices: 4,
            ..Default::default()
        };
        let result = SkeletonRenderer::new(data(), config);
        assert!(matches!(result, Err(RendererError::Config(_))));
    }

    #[test]
    fn test_invalid_data_is_rejected() {
        let result = SkeletonRenderer::with_data(Arc::new(SkeletonData::new("empty")));
        assert!(matches!(result, Err(RendererError::InvalidSkeletonData(_))));
    }

    #[test]
    fn test_update_applies_time_scale_and_driver() {
        let mut renderer = renderer();
        assert!(renderer.set_time_scale(2.0));
        renderer.set_pose_driver(|skeleton: &mut Skeleton, delta: f32| {
            skeleton.bones[0].x += delta * 10.0;
        });

        renderer.update(0.5);
        assert_eq!(renderer.skeleton().time, 1.0);
        assert_eq!(renderer.find_bone("root").unwrap().world_x, 10.0);
        assert_eq!(renderer.find_bone("arm").unwrap().world_x, 20.0);
    }

    #[test]
    fn test_invalid_time_scale_is_ignored() {
        let mut renderer = renderer();
        assert!(renderer.set_time_scale(0.5));
        assert!(!renderer.set_time_scale(f32::NAN));
        assert!(!renderer.set_time_scale(-1.0));
        assert!(!renderer.set_time_scale(f32::INFINITY));
        assert_eq!(renderer.time_scale(), 0.5);

        renderer.update(1.0);
        assert_eq!(renderer.skeleton().time, 0.5);
    }

    #[test]
    fn test_draw_uses_node_tint() {
        let mut renderer = renderer();
        renderer.node_mut().opacity = 0;
        let mut batch = PolygonSpriteBatch::new(2000);
        let stats = renderer.draw(&mut batch, &Mat4::IDENTITY);

        assert_eq!(stats.slots_drawn, 2);
        assert_eq!(stats.slots_skipped, 1);
        assert!(batch.vertices().iter().all(|v| v.color == [0.0; 4]));
    }

    #[test]
    fn test_bounding_box() {
        let mut renderer = renderer();
        renderer.node_mut().position = Vec2::new(100.0, 50.0);
        renderer.node_mut().scale = Vec2::new(2.0, 1.0);

        // body: (-2,-2)-(2,2)，hand: (9,-1)-(11,1)
        let rect = renderer.bounding_box();
        assert_eq!(rect.origin, Vec2::new(96.0, 48.0));
        assert_eq!(rect.size, Vec2::new(26.0, 4.0));
    }

    #[test]
    fn test_bounding_box_without_attachments() {
        let mut renderer = renderer();
        renderer.node_mut().position = Vec2::new(5.0, 6.0);
        for slot in ["body", "hand", "hit"] {
            assert!(renderer.set_attachment(slot, None));
        }
        let rect = renderer.bounding_box();
        assert_eq!(rect, Rect::new(5.0, 6.0, 0.0, 0.0));
    }

    #[test]
    fn test_skin_and_attachment_passthrough() {
        let mut renderer = renderer();
        assert!(renderer.set_skin(Some("gold")));
        let body = renderer.find_slot("body").unwrap();
        match body.attachment.as_deref() {
            Some(Attachment::Region(r)) => assert_eq!(r.texture, TextureId(2)),
            other => panic!("unexpected attachment {other:?}"),
        }

        assert!(!renderer.set_skin(Some("missing")));
        assert!(renderer.set_skin(None));
        assert!(renderer.attachment("hand", "hand").is_some());
        assert!(!renderer.set_attachment("hand", Some("missing")));
        assert!(!renderer.set_attachment("missing", None));
    }

    #[test]
    fn test_slot_flip_y() {
        let mut renderer = renderer();
        assert!(renderer.set_slot_flip_y("hand", true));
        assert!(renderer.find_slot("hand").unwrap().flip_y);
        assert!(!renderer.set_slot_flip_y("missing", true));
    }

    #[test]
    fn test_add_sprite_to_unknown_bone_returns_sprite() {
        let mut renderer = renderer();
        let sprite = Box::new(Sprite::new(TextureId(9), 1.0, 1.0).with_position(3.0, 4.0));
        let rejected = renderer.add_sprite_to_bone("tail", sprite).unwrap_err();

        assert_eq!(rejected.error, BoneSpriteError::BoneNotFound("tail".into()));
        assert_eq!(rejected.into_sprite().position(), Vec2::new(3.0, 4.0));
        assert!(renderer.bone_sprites().is_empty());
    }

    #[test]
    fn test_add_sprite_to_non_region_slot() {
        let mut renderer = renderer();
        let rejected = renderer
            .add_sprite_to_slot("hit", Box::new(Sprite::new(TextureId(9), 1.0, 1.0)), false)
            .unwrap_err();
        assert_eq!(rejected.error, BoneSpriteError::NotRegionSlot("hit".into()));

        let rejected = renderer
            .add_sprite_to_slot("nope", Box::new(Sprite::new(TextureId(9), 1.0, 1.0)), false)
            .unwrap_err();
        assert_eq!(rejected.error, BoneSpriteError::SlotNotFound("nope".into()));
        assert!(renderer.bone_sprites().is_empty());
    }

    #[test]
    fn test_bone_sprite_lifecycle() {
        let mut renderer = renderer();
        renderer
            .add_sprite_to_bone("arm", Box::new(Sprite::new(TextureId(9), 1.0, 1.0)))
            .unwrap();
        renderer
            .add_sprite_to_slot("body", Box::new(Sprite::new(TextureId(8), 1.0, 1.0)), false)
            .unwrap();

        assert!(renderer.sprite_for_bone("arm").is_some());
        assert!(renderer.set_bone_sprite_flip_y("body", true));

        let mut batch = PolygonSpriteBatch::new(2000);
        let stats = renderer.draw(&mut batch, &Mat4::IDENTITY);
        assert_eq!(stats.bone_sprites_drawn, 2);
        assert_eq!(
            renderer.sprite_for_bone("arm").unwrap().position(),
            Vec2::new(10.0, 0.0)
        );

        assert!(renderer.remove_bone_sprite("arm"));
        assert!(!renderer.remove_bone_sprite("arm"));
        renderer.remove_all_bone_sprites();
        assert!(renderer.bone_sprites().is_empty());
    }

    #[test]
    fn test_debug_flags() {
        let mut renderer = renderer();
        let mut recorder = DebugRecorder::new();
        renderer.draw_debug(&mut recorder, &Mat4::IDENTITY);
        assert!(recorder.commands.is_empty());

        renderer.set_debug_slots(true);
        renderer.set_debug_bones(true);
        assert!(renderer.debug_slots() && renderer.debug_bones());
        renderer.draw_debug(&mut recorder, &Mat4::IDENTITY);
        // 2 个区域插槽 + 2 条骨骼线 + 2 个原点
        assert_eq!(recorder.commands.len(), 6);
    }

    #[test]
    fn test_rejected_sprite_converts_to_renderer_error() {
        let mut renderer = renderer();
        let result: RendererResult<()> = renderer
            .add_sprite_to_bone("tail", Box::new(Sprite::new(TextureId(9), 1.0, 1.0)))
            .map_err(RendererError::from);
        assert!(matches!(result, Err(RendererError::BoneSprite(_))));
    }
}
