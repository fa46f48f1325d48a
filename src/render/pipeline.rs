//! 批处理绘制管线
//!
//! 按绘制顺序遍历插槽，把附件几何体交给批处理器。混合模式变化时先刷新再切换，
//! 绑定在插槽/骨骼上的辅助精灵紧跟在所属插槽之后单独绘制。

use glam::{Mat4, Vec2};

use crate::bone_sprite::{BoneSprite, BoneSpriteRegistry};
use crate::impl_default_and_new;
use crate::math::transform::QUAD_TRIANGLES;
use crate::skeleton::attachment::Attachment;
use crate::skeleton::instance::Skeleton;

use super::batch::PolygonBatch;
use super::blend::{blend_func_for, BlendFunc, BlendState};
use super::color::composite_color;
use super::resolver::VertexResolver;

/// 一次绘制的参数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawSettings {
    pub premultiplied_alpha: bool,
    /// Normal 模式使用的混合函数
    pub blend_func: BlendFunc,
    /// 节点位置，用于插槽四角缓存和精灵位置回写
    pub node_position: Vec2,
}

impl Default for DrawSettings {
    fn default() -> Self {
        Self {
            premultiplied_alpha: true,
            blend_func: BlendFunc::ALPHA_PREMULTIPLIED,
            node_position: Vec2::ZERO,
        }
    }
}

/// 一帧的绘制统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub slots_drawn: usize,
    pub bone_sprites_drawn: usize,
    /// 因不可绘制或超出容量而跳过的插槽
    pub slots_skipped: usize,
    pub blend_switches: usize,
}

/// 绘制管线
#[derive(Debug)]
pub struct DrawPipeline {
    blend: BlendState,
    last_stats: FrameStats,
}

impl_default_and_new!(DrawPipeline {
    blend: BlendState::new(),
    last_stats: FrameStats::default(),
});

impl DrawPipeline {
    /// 上一帧的统计
    pub fn last_stats(&self) -> FrameStats {
        self.last_stats
    }

    /// 绘制一帧
    pub fn draw(
        &mut self,
        skeleton: &mut Skeleton,
        resolver: &mut VertexResolver,
        sprites: &mut BoneSpriteRegistry,
        batch: &mut dyn PolygonBatch,
        transform: &Mat4,
        settings: &DrawSettings,
    ) -> FrameStats {
        batch.set_model_view(transform);
        self.blend.reset();

        let mut stats = FrameStats::default();
        let mut active = settings.blend_func;

        for order in 0..skeleton.draw_order().len() {
            let slot_index = skeleton.draw_order()[order];
            let Some(attachment) = skeleton.slots[slot_index].attachment.clone() else {
                continue;
            };
            let Some(parts) = attachment.render_parts() else {
                stats.slots_skipped += 1;
                continue;
            };
            let Some(floats) = resolver.resolve_slot(skeleton, slot_index, settings.node_position)
            else {
                stats.slots_skipped += 1;
                continue;
            };

            let slot = &skeleton.slots[slot_index];
            if self.blend.transition(slot.blend_mode) {
                batch.flush();
                active = blend_func_for(
                    slot.blend_mode,
                    settings.premultiplied_alpha,
                    settings.blend_func,
                );
                batch.set_blend_func(active);
                stats.blend_switches += 1;
            }

            let color = composite_color(
                &skeleton.color,
                &slot.color,
                &parts.color,
                settings.premultiplied_alpha,
            );
            batch.add(
                parts.texture,
                resolver.vertices(floats),
                parts.uvs,
                parts.triangles,
                color,
            );
            stats.slots_drawn += 1;

            if let Some(sprite) = find_bound_sprite(skeleton, slot_index, &attachment, sprites) {
                if let Some(quad) =
                    resolver.resolve_bone_sprite(skeleton, sprite, settings.node_position)
                {
                    batch.flush();
                    batch.set_blend_func(BlendFunc::ALPHA_PREMULTIPLIED);
                    batch.add(
                        sprite.texture(),
                        &quad,
                        sprite.uvs(),
                        &QUAD_TRIANGLES,
                        sprite.color(),
                    );
                    batch.flush();
                    batch.set_blend_func(active);
                    stats.bone_sprites_drawn += 1;
                }
            }
        }
        batch.flush();

        tracing::trace!(
            target: "render.batch",
            "Frame drawn: {} slots, {} bone sprites, {} skipped, {} blend switches",
            stats.slots_drawn,
            stats.bone_sprites_drawn,
            stats.slots_skipped,
            stats.blend_switches
        );
        self.last_stats = stats;
        stats
    }
}

/// 查找紧跟插槽绘制的精灵
///
/// 区域附件优先使用以插槽名绑定的插槽模式精灵，否则使用所属骨骼上的骨骼模式精灵；
/// 网格附件只看所属骨骼；蒙皮网格按骨骼表顺序取第一个绑定了精灵的骨骼。
fn find_bound_sprite<'a>(
    skeleton: &Skeleton,
    slot_index: usize,
    attachment: &Attachment,
    sprites: &'a mut BoneSpriteRegistry,
) -> Option<&'a mut BoneSprite> {
    let slot = &skeleton.slots[slot_index];
    let bone_key = |bone: usize| {
        skeleton
            .bones
            .get(bone)
            .map(|b| b.name.as_str())
            .filter(|name| sprites.get(name).is_some_and(|s| !s.is_to_slot()))
    };

    let key = match attachment {
        Attachment::Region(_) => {
            if sprites.get(&slot.name).is_some_and(BoneSprite::is_to_slot) {
                Some(slot.name.as_str())
            } else {
                bone_key(slot.bone)
            }
        }
        Attachment::Mesh(_) => bone_key(slot.bone),
        Attachment::SkinnedMesh(skinned) => skinned.weighted_bones().find_map(bone_key),
        Attachment::BoundingBox(_) => None,
    }?;
    sprites.get_mut(key)
}
