//! 每帧顶点解析
//!
//! 把插槽附件和骨骼精灵解析为世界坐标顶点，写入实例持有的暂存缓冲区。

use glam::Vec2;

use crate::bone_sprite::BoneSprite;
use crate::math::transform::{mirror_quad_vertical, QUAD_FLOATS};
use crate::skeleton::attachment::Attachment;
use crate::skeleton::instance::Skeleton;
use crate::skeleton::slot::SlotCorners;

/// 固定容量的世界顶点暂存缓冲区（浮点数）
#[derive(Debug, Clone)]
pub struct WorldVertexBuffer {
    data: Vec<f32>,
}

impl WorldVertexBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            data: vec![0.0; capacity],
        }
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// 前 `len` 个浮点数
    pub fn slice(&self, len: usize) -> &[f32] {
        &self.data[..len.min(self.data.len())]
    }

    fn slice_mut(&mut self, len: usize) -> Option<&mut [f32]> {
        self.data.get_mut(..len)
    }
}

/// 顶点解析器
#[derive(Debug, Clone)]
pub struct VertexResolver {
    buffer: WorldVertexBuffer,
}

impl VertexResolver {
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: WorldVertexBuffer::new(capacity),
        }
    }

    pub fn capacity(&self) -> usize {
        self.buffer.capacity()
    }

    /// 最近一次解析结果的前 `len` 个浮点数
    pub fn vertices(&self, len: usize) -> &[f32] {
        self.buffer.slice(len)
    }

    /// 计算插槽当前附件的世界顶点，返回写入的浮点数
    ///
    /// 没有附件、附件不可绘制或超出缓冲区容量时返回 None，缓冲区保持不变。
    pub fn compute_world_vertices(&mut self, skeleton: &Skeleton, slot_index: usize) -> Option<usize> {
        let slot = skeleton.slots.get(slot_index)?;
        let attachment = slot.attachment.as_deref()?;
        if let Attachment::BoundingBox(_) = attachment {
            return None;
        }

        let floats = attachment.world_vertex_floats();
        let capacity = self.buffer.capacity();
        let Some(out) = self.buffer.slice_mut(floats) else {
            tracing::warn!(
                target: "skeleton_renderer",
                "Attachment '{}' on slot '{}' needs {} floats, world vertex buffer holds {}; skipped",
                attachment.name(),
                slot.name,
                floats,
                capacity
            );
            return None;
        };

        let bone = skeleton.bones.get(slot.bone)?;
        match attachment {
            Attachment::Region(region) => {
                region.compute_world_vertices(skeleton.x, skeleton.y, bone, out)
            }
            Attachment::Mesh(mesh) => {
                mesh.compute_world_vertices(skeleton.x, skeleton.y, bone, &slot.deform, out)
            }
            Attachment::SkinnedMesh(skinned) => skinned.compute_world_vertices(
                skeleton.x,
                skeleton.y,
                &skeleton.bones,
                &slot.deform,
                out,
            ),
            Attachment::BoundingBox(_) => return None,
        }
        Some(floats)
    }

    /// 解析插槽顶点用于绘制
    ///
    /// 区域附件在插槽翻转时先做垂直镜像，再把四角（加节点位置）缓存到插槽上。
    pub fn resolve_slot(
        &mut self,
        skeleton: &mut Skeleton,
        slot_index: usize,
        origin: Vec2,
    ) -> Option<usize> {
        let floats = self.compute_world_vertices(skeleton, slot_index)?;
        let slot = skeleton.slots.get_mut(slot_index)?;
        if slot.attachment.as_deref().is_some_and(Attachment::is_region) {
            if let Some(quad) = self.buffer.slice_mut(QUAD_FLOATS) {
                if slot.flip_y {
                    mirror_quad_vertical(quad);
                }
                slot.corners = SlotCorners::from_quad(quad, origin);
            }
        }
        Some(floats)
    }

    /// 解析骨骼精灵的四边形
    ///
    /// 插槽模式复用刚解析的插槽四边形；骨骼模式按骨骼当前变换计算，
    /// 并把精灵位置更新为节点位置加骨骼世界坐标。
    pub fn resolve_bone_sprite(
        &self,
        skeleton: &Skeleton,
        sprite: &mut BoneSprite,
        node_position: Vec2,
    ) -> Option<[f32; QUAD_FLOATS]> {
        if sprite.is_to_slot() {
            return Some(sprite.slot_vertices(self.buffer.slice(QUAD_FLOATS)));
        }

        let bone = skeleton.bones.get(sprite.bone().0)?;
        let vertices = sprite.compute_world_vertices(skeleton.x, skeleton.y, bone);
        sprite.sync_position(node_position, bone);
        Some(vertices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bone_sprite::{BoneHandle, Sprite};
    use crate::math::transform::{signed_triangle_area, QUAD_TRIANGLES};
    use crate::render::batch::TextureId;
    use crate::skeleton::{
        BoneData, BoundingBoxAttachment, MeshAttachment, RegionAttachment, SkeletonData, SlotData,
    };
    use std::sync::Arc;

    fn skeleton_with(attachment: Attachment) -> Skeleton {
        let mut data = SkeletonData::new("test");
        let root = data.add_bone(BoneData::new("root", None).with_position(10.0, 0.0));
        let name = attachment.name().to_string();
        let slot = data.add_slot(SlotData::new("slot", root).with_attachment(name));
        data.add_default_attachment(slot, attachment);
        Skeleton::new(Arc::new(data))
    }

    fn region() -> Attachment {
        Attachment::Region(RegionAttachment::new("quad", TextureId(1), 2.0, 2.0))
    }

    #[test]
    fn test_region_resolves_corners() {
        let mut skeleton = skeleton_with(region());
        let mut resolver = VertexResolver::new(1000);

        let floats = resolver.resolve_slot(&mut skeleton, 0, Vec2::new(100.0, 0.0));
        assert_eq!(floats, Some(8));
        assert_eq!(
            resolver.vertices(8),
            &[9.0, -1.0, 9.0, 1.0, 11.0, 1.0, 11.0, -1.0]
        );
        let corners = skeleton.slots[0].corners;
        assert_eq!(corners.left_bottom, Vec2::new(109.0, -1.0));
        assert_eq!(corners.right_top, Vec2::new(111.0, 1.0));
    }

    #[test]
    fn test_flipped_region_swaps_corners() {
        let mut skeleton = skeleton_with(region());
        skeleton.slots[0].flip_y = true;
        let mut resolver = VertexResolver::new(1000);

        resolver.resolve_slot(&mut skeleton, 0, Vec2::ZERO);
        let vertices = resolver.vertices(8);
        assert_eq!(vertices, &[9.0, 1.0, 9.0, -1.0, 11.0, -1.0, 11.0, 1.0]);

        let corners = skeleton.slots[0].corners;
        assert_eq!(corners.left_bottom, Vec2::new(9.0, 1.0));
        assert_eq!(corners.left_top, Vec2::new(9.0, -1.0));

        for tri in QUAD_TRIANGLES.chunks_exact(3) {
            let area = signed_triangle_area(vertices, tri[0], tri[1], tri[2]);
            assert!(area.abs() > 0.0);
        }
    }

    #[test]
    fn test_oversize_attachment_is_skipped() {
        let mesh = MeshAttachment::new(
            "big",
            TextureId(2),
            vec![1.0; 20],
            vec![0.0; 20],
            vec![0, 1, 2],
        );
        let skeleton = skeleton_with(Attachment::Mesh(mesh));
        let mut resolver = VertexResolver::new(16);

        assert_eq!(resolver.compute_world_vertices(&skeleton, 0), None);
        assert!(resolver.vertices(16).iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_bounding_box_is_not_resolved() {
        let bbox = BoundingBoxAttachment::new("hit", vec![0.0; 8]);
        let skeleton = skeleton_with(Attachment::BoundingBox(bbox));
        let mut resolver = VertexResolver::new(1000);
        assert_eq!(resolver.compute_world_vertices(&skeleton, 0), None);
    }

    #[test]
    fn test_bone_sprite_follows_bone() {
        let mut skeleton = skeleton_with(region());
        skeleton.x = 1.0;
        let resolver = VertexResolver::new(1000);
        let mut sprite = BoneSprite::new(
            BoneHandle(0),
            &skeleton.bones[0],
            Box::new(Sprite::new(TextureId(5), 2.0, 2.0)),
            false,
            false,
        );

        skeleton.bones[0].x = 20.0;
        skeleton.update_world_transform();
        let quad = resolver
            .resolve_bone_sprite(&skeleton, &mut sprite, Vec2::new(50.0, 50.0))
            .unwrap();

        assert_eq!(quad, [20.0, -1.0, 20.0, 1.0, 22.0, 1.0, 22.0, -1.0]);
        assert_eq!(sprite.visual().position(), Vec2::new(70.0, 50.0));
    }

    #[test]
    fn test_bone_sprite_compensates_bind_rotation() {
        for own_rotation in [0.0, 45.0] {
            let mut skeleton = skeleton_with(region());
            skeleton.x = 3.0;
            skeleton.bones[0].rotation = 30.0;
            skeleton.update_world_transform();

            let resolver = VertexResolver::new(1000);
            let mut sprite = BoneSprite::new(
                BoneHandle(0),
                &skeleton.bones[0],
                Box::new(Sprite::new(TextureId(5), 4.0, 2.0).with_rotation(own_rotation)),
                false,
                false,
            );
            let offset = *sprite.offset();

            // 绑定后骨骼再转 90 度，精灵只跟着转这 90 度
            skeleton.bones[0].rotation = 120.0;
            skeleton.update_world_transform();
            let quad = resolver
                .resolve_bone_sprite(&skeleton, &mut sprite, Vec2::ZERO)
                .unwrap();

            for (corner, local) in quad.chunks_exact(2).zip(offset.chunks_exact(2)) {
                let expected = Vec2::new(-local[1] + 13.0, local[0]);
                assert!(
                    (Vec2::new(corner[0], corner[1]) - expected).length() < 1e-4,
                    "rotation {own_rotation}: {quad:?}"
                );
            }
        }
    }

    #[test]
    fn test_slot_sprite_reuses_slot_quad() {
        let mut skeleton = skeleton_with(region());
        let mut resolver = VertexResolver::new(1000);
        resolver.resolve_slot(&mut skeleton, 0, Vec2::ZERO);

        let mut sprite = BoneSprite::new(
            BoneHandle(0),
            &skeleton.bones[0],
            Box::new(Sprite::new(TextureId(5), 4.0, 4.0)),
            true,
            false,
        );
        let quad = resolver
            .resolve_bone_sprite(&skeleton, &mut sprite, Vec2::ZERO)
            .unwrap();
        assert_eq!(&quad[..], resolver.vertices(8));
    }
}
