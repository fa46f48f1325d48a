//! 骨骼精灵注册表
//!
//! 以名称为键保存精灵与骨骼的绑定。键在注册表内唯一：重复绑定会先释放旧精灵。

use glam::Vec2;
use std::collections::HashMap;

use crate::impl_default_and_new;
use crate::math::transform::{
    compose_rotation, mirror_quad_vertical, quad_offsets, transform_point, QUAD_FLOATS,
};
use crate::render::batch::TextureId;
use crate::render::color::Color4B;
use crate::skeleton::bone::Bone;

use super::visual::SpriteVisual;

/// 骨骼句柄（骨架骨骼表中的索引）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BoneHandle(pub usize);

/// 精灵四角的纹理坐标：左下、左上、右上、右下
pub const SPRITE_UVS: [f32; QUAD_FLOATS] = [0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 1.0, 1.0];

/// 一个绑定到骨骼（或插槽）的精灵
#[derive(Debug)]
pub struct BoneSprite {
    bone: BoneHandle,
    visual: Box<dyn SpriteVisual>,
    uvs: [f32; QUAD_FLOATS],
    /// 绑定时的四边形偏移
    offset: [f32; QUAD_FLOATS],
    /// 绑定时骨骼已有的旋转，每帧从骨骼旋转中扣除
    origin_rotation: f32,
    to_slot: bool,
    flip_y: bool,
}

impl BoneSprite {
    /// 根据精灵当前的尺寸、缩放、旋转和位置计算几何基准
    pub fn new(
        bone: BoneHandle,
        bone_state: &Bone,
        visual: Box<dyn SpriteVisual>,
        to_slot: bool,
        flip_y: bool,
    ) -> Self {
        let size = visual.content_size();
        let scale = visual.scale();
        let position = visual.position();

        let local_x = -size.x / 2.0 * scale.x;
        let local_y = -size.y / 2.0 * scale.y;
        let local_x2 = local_x + size.x * scale.x;
        let local_y2 = local_y + size.y * scale.y;
        let offset = quad_offsets(
            local_x,
            local_y,
            local_x2,
            local_y2,
            -visual.rotation().to_radians(),
            position.x,
            position.y,
        );

        Self {
            bone,
            visual,
            uvs: SPRITE_UVS,
            offset,
            origin_rotation: bone_state.m00.clamp(-1.0, 1.0).acos(),
            to_slot,
            flip_y,
        }
    }

    pub fn bone(&self) -> BoneHandle {
        self.bone
    }

    pub fn visual(&self) -> &dyn SpriteVisual {
        self.visual.as_ref()
    }

    pub fn visual_mut(&mut self) -> &mut dyn SpriteVisual {
        self.visual.as_mut()
    }

    pub fn uvs(&self) -> &[f32; QUAD_FLOATS] {
        &self.uvs
    }

    pub fn offset(&self) -> &[f32; QUAD_FLOATS] {
        &self.offset
    }

    pub fn origin_rotation(&self) -> f32 {
        self.origin_rotation
    }

    /// 是否复用插槽的四边形
    pub fn is_to_slot(&self) -> bool {
        self.to_slot
    }

    pub fn flip_y(&self) -> bool {
        self.flip_y
    }

    pub fn set_flip_y(&mut self, flip_y: bool) {
        self.flip_y = flip_y;
    }

    pub fn texture(&self) -> TextureId {
        self.visual.texture()
    }

    pub fn color(&self) -> Color4B {
        self.visual.color()
    }

    /// 按骨骼当前变换计算四边形世界顶点
    ///
    /// 旋转先扣除绑定时的 `origin_rotation`，平移为骨架位置加骨骼世界坐标。
    pub fn compute_world_vertices(
        &self,
        skeleton_x: f32,
        skeleton_y: f32,
        bone: &Bone,
    ) -> [f32; QUAD_FLOATS] {
        let (cosine, sine) = compose_rotation(bone.m00, bone.m10, self.origin_rotation);
        let x = skeleton_x + bone.world_x;
        let y = skeleton_y + bone.world_y;

        let mut vertices = [0.0; QUAD_FLOATS];
        for (dst, src) in vertices
            .chunks_exact_mut(2)
            .zip(self.offset.chunks_exact(2))
        {
            let (px, py) = transform_point(src[0], src[1], cosine, sine, x, y);
            dst[0] = px;
            dst[1] = py;
        }
        vertices
    }

    /// 复用插槽区域四边形，`flip_y` 时再做一次垂直镜像
    pub fn slot_vertices(&self, slot_quad: &[f32]) -> [f32; QUAD_FLOATS] {
        let mut vertices = [0.0; QUAD_FLOATS];
        vertices.copy_from_slice(&slot_quad[..QUAD_FLOATS]);
        if self.flip_y {
            mirror_quad_vertical(&mut vertices);
        }
        vertices
    }

    /// 回写精灵位置（节点位置 + 骨骼世界坐标）
    pub fn sync_position(&mut self, node_position: Vec2, bone: &Bone) {
        self.visual
            .set_position(node_position + Vec2::new(bone.world_x, bone.world_y));
    }

    fn release(mut self) {
        self.visual.on_exit();
    }
}

/// 骨骼精灵注册表
#[derive(Debug)]
pub struct BoneSpriteRegistry {
    sprites: HashMap<String, BoneSprite>,
}

impl_default_and_new!(BoneSpriteRegistry {
    sprites: HashMap::new(),
});

impl BoneSpriteRegistry {
    /// 绑定精灵
    ///
    /// 同名键上已有的绑定先被解除，然后精灵进入运行状态并由注册表持有。
    pub fn bind(
        &mut self,
        key: impl Into<String>,
        bone: BoneHandle,
        bone_state: &Bone,
        mut visual: Box<dyn SpriteVisual>,
        to_slot: bool,
        flip_y: bool,
    ) {
        let key = key.into();
        if let Some(previous) = self.sprites.remove(&key) {
            tracing::debug!(target: "bone_sprite", "Replacing bone sprite '{}'", key);
            previous.release();
        }

        visual.on_enter();
        let sprite = BoneSprite::new(bone, bone_state, visual, to_slot, flip_y);
        tracing::debug!(
            target: "bone_sprite",
            "Bound sprite '{}' to bone {} (to_slot: {}, flip_y: {})",
            key,
            bone.0,
            to_slot,
            flip_y
        );
        self.sprites.insert(key, sprite);
    }

    /// 解除绑定，键不存在时返回 false
    pub fn unbind(&mut self, key: &str) -> bool {
        match self.sprites.remove(key) {
            Some(sprite) => {
                sprite.release();
                true
            }
            None => {
                tracing::warn!(target: "bone_sprite", "No bone sprite bound to '{}'", key);
                false
            }
        }
    }

    /// 解除全部绑定
    pub fn unbind_all(&mut self) {
        for (_, sprite) in self.sprites.drain() {
            sprite.release();
        }
    }

    pub fn get(&self, key: &str) -> Option<&BoneSprite> {
        self.sprites.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut BoneSprite> {
        self.sprites.get_mut(key)
    }

    /// 获取绑定的精灵
    pub fn sprite(&self, key: &str) -> Option<&dyn SpriteVisual> {
        self.sprites.get(key).map(BoneSprite::visual)
    }

    /// 设置插槽绑定的垂直翻转，键不存在时返回 false
    pub fn set_flip_y(&mut self, key: &str, flip_y: bool) -> bool {
        match self.sprites.get_mut(key) {
            Some(sprite) => {
                sprite.set_flip_y(flip_y);
                true
            }
            None => {
                tracing::warn!(target: "bone_sprite", "No bone sprite bound to '{}'", key);
                false
            }
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.sprites.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.sprites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sprites.is_empty()
    }
}

impl Drop for BoneSpriteRegistry {
    fn drop(&mut self) {
        self.unbind_all();
    }
}
