//! 插槽附件
//!
//! 附件是插槽上可见的几何体，由骨骼数据持有并在各次渲染间只读共享。
//! 每种附件只携带自己需要的字段，渲染时用穷尽匹配分派。

use crate::math::transform::{quad_offsets, QUAD_FLOATS, QUAD_TRIANGLES};
use crate::render::batch::TextureId;
use crate::render::color::Color;

use super::bone::Bone;

/// 插槽附件
#[derive(Clone, Debug)]
pub enum Attachment {
    /// 固定四边形
    Region(RegionAttachment),
    /// 单骨骼网格
    Mesh(MeshAttachment),
    /// 多骨骼加权蒙皮网格
    SkinnedMesh(SkinnedMeshAttachment),
    /// 包围盒（无纹理，不参与绘制）
    BoundingBox(BoundingBoxAttachment),
}

impl Attachment {
    /// 附件名称
    pub fn name(&self) -> &str {
        match self {
            Attachment::Region(a) => &a.name,
            Attachment::Mesh(a) => &a.name,
            Attachment::SkinnedMesh(a) => &a.name,
            Attachment::BoundingBox(a) => &a.name,
        }
    }

    pub fn is_region(&self) -> bool {
        matches!(self, Attachment::Region(_))
    }

    /// 世界顶点所需的浮点数
    pub fn world_vertex_floats(&self) -> usize {
        match self {
            Attachment::Region(_) => QUAD_FLOATS,
            Attachment::Mesh(a) => a.vertices.len(),
            Attachment::SkinnedMesh(a) => a.uvs.len(),
            Attachment::BoundingBox(a) => a.vertices.len(),
        }
    }

    /// 提交给批处理器的纹理、UV、三角形和附件颜色
    ///
    /// 包围盒没有可绘制的部分，返回 None。
    pub fn render_parts(&self) -> Option<RenderParts<'_>> {
        match self {
            Attachment::Region(a) => Some(RenderParts {
                texture: a.texture,
                uvs: &a.uvs,
                triangles: &QUAD_TRIANGLES,
                color: a.color,
            }),
            Attachment::Mesh(a) => Some(RenderParts {
                texture: a.texture,
                uvs: &a.uvs,
                triangles: &a.triangles,
                color: a.color,
            }),
            Attachment::SkinnedMesh(a) => Some(RenderParts {
                texture: a.texture,
                uvs: &a.uvs,
                triangles: &a.triangles,
                color: a.color,
            }),
            Attachment::BoundingBox(_) => None,
        }
    }
}

/// 附件的可绘制部分
#[derive(Debug, Clone, Copy)]
pub struct RenderParts<'a> {
    pub texture: TextureId,
    pub uvs: &'a [f32],
    pub triangles: &'a [u16],
    pub color: Color,
}

// ============================================================================
// 区域附件
// ============================================================================

/// 区域附件：一个带局部变换的纹理四边形
#[derive(Clone, Debug)]
pub struct RegionAttachment {
    pub name: String,
    pub texture: TextureId,
    pub x: f32,
    pub y: f32,
    /// 旋转（角度）
    pub rotation: f32,
    pub scale_x: f32,
    pub scale_y: f32,
    pub width: f32,
    pub height: f32,
    /// 纹理坐标，角点顺序同顶点
    pub uvs: [f32; QUAD_FLOATS],
    pub color: Color,
    offset: [f32; QUAD_FLOATS],
}

impl RegionAttachment {
    /// 创建覆盖整张纹理的区域附件
    pub fn new(name: impl Into<String>, texture: TextureId, width: f32, height: f32) -> Self {
        let mut attachment = Self {
            name: name.into(),
            texture,
            x: 0.0,
            y: 0.0,
            rotation: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            width,
            height,
            uvs: [0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 1.0, 1.0],
            color: Color::WHITE,
            offset: [0.0; QUAD_FLOATS],
        };
        attachment.update_offset();
        attachment
    }

    pub fn with_position(mut self, x: f32, y: f32) -> Self {
        self.x = x;
        self.y = y;
        self.update_offset();
        self
    }

    pub fn with_rotation(mut self, degrees: f32) -> Self {
        self.rotation = degrees;
        self.update_offset();
        self
    }

    pub fn with_scale(mut self, scale_x: f32, scale_y: f32) -> Self {
        self.scale_x = scale_x;
        self.scale_y = scale_y;
        self.update_offset();
        self
    }

    pub fn with_uvs(mut self, uvs: [f32; QUAD_FLOATS]) -> Self {
        self.uvs = uvs;
        self
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    /// 骨骼空间中的四边形偏移
    pub fn offset(&self) -> &[f32; QUAD_FLOATS] {
        &self.offset
    }

    /// 局部变换改变后重新计算偏移
    pub fn update_offset(&mut self) {
        let local_x = -self.width / 2.0 * self.scale_x;
        let local_y = -self.height / 2.0 * self.scale_y;
        let local_x2 = local_x + self.width * self.scale_x;
        let local_y2 = local_y + self.height * self.scale_y;
        self.offset = quad_offsets(
            local_x,
            local_y,
            local_x2,
            local_y2,
            self.rotation.to_radians(),
            self.x,
            self.y,
        );
    }

    /// 计算世界顶点（8 个浮点数）
    pub fn compute_world_vertices(
        &self,
        skeleton_x: f32,
        skeleton_y: f32,
        bone: &Bone,
        out: &mut [f32],
    ) {
        let x = skeleton_x + bone.world_x;
        let y = skeleton_y + bone.world_y;
        for (dst, src) in out[..QUAD_FLOATS]
            .chunks_exact_mut(2)
            .zip(self.offset.chunks_exact(2))
        {
            dst[0] = src[0] * bone.m00 + src[1] * bone.m01 + x;
            dst[1] = src[0] * bone.m10 + src[1] * bone.m11 + y;
        }
    }
}

// ============================================================================
// 网格附件
// ============================================================================

/// 网格附件：跟随插槽骨骼的任意多边形
#[derive(Clone, Debug)]
pub struct MeshAttachment {
    pub name: String,
    pub texture: TextureId,
    /// 骨骼空间顶点（x, y 交错）
    pub vertices: Vec<f32>,
    pub uvs: Vec<f32>,
    pub triangles: Vec<u16>,
    pub color: Color,
}

impl MeshAttachment {
    pub fn new(
        name: impl Into<String>,
        texture: TextureId,
        vertices: Vec<f32>,
        uvs: Vec<f32>,
        triangles: Vec<u16>,
    ) -> Self {
        Self {
            name: name.into(),
            texture,
            vertices,
            uvs,
            triangles,
            color: Color::WHITE,
        }
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    /// 计算世界顶点
    ///
    /// `deform` 长度与顶点数一致时替换局部顶点。
    pub fn compute_world_vertices(
        &self,
        skeleton_x: f32,
        skeleton_y: f32,
        bone: &Bone,
        deform: &[f32],
        out: &mut [f32],
    ) {
        let x = skeleton_x + bone.world_x;
        let y = skeleton_y + bone.world_y;
        let vertices = if deform.len() == self.vertices.len() {
            deform
        } else {
            &self.vertices
        };
        for (dst, src) in out[..vertices.len()]
            .chunks_exact_mut(2)
            .zip(vertices.chunks_exact(2))
        {
            dst[0] = src[0] * bone.m00 + src[1] * bone.m01 + x;
            dst[1] = src[0] * bone.m10 + src[1] * bone.m11 + y;
        }
    }
}

// ============================================================================
// 蒙皮网格附件
// ============================================================================

/// 蒙皮网格附件：每个顶点由若干骨骼加权混合
///
/// `bones` 由若干段 `[count, bone_index * count]` 组成，每段对应一个顶点；
/// `weights` 对每个 (顶点, 骨骼) 存放 `[x, y, weight]`。
#[derive(Clone, Debug)]
pub struct SkinnedMeshAttachment {
    pub name: String,
    pub texture: TextureId,
    pub bones: Vec<usize>,
    pub weights: Vec<f32>,
    pub uvs: Vec<f32>,
    pub triangles: Vec<u16>,
    pub color: Color,
}

impl SkinnedMeshAttachment {
    pub fn new(
        name: impl Into<String>,
        texture: TextureId,
        bones: Vec<usize>,
        weights: Vec<f32>,
        uvs: Vec<f32>,
        triangles: Vec<u16>,
    ) -> Self {
        Self {
            name: name.into(),
            texture,
            bones,
            weights,
            uvs,
            triangles,
            color: Color::WHITE,
        }
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    /// 按骨骼表顺序遍历参与加权的骨骼索引（可能重复）
    pub fn weighted_bones(&self) -> impl Iterator<Item = usize> + '_ {
        let mut v = 0;
        std::iter::from_fn(move || {
            while v < self.bones.len() {
                let count = self.bones[v];
                let run = &self.bones[v + 1..(v + 1 + count).min(self.bones.len())];
                v += 1 + count;
                if !run.is_empty() {
                    return Some(run);
                }
            }
            None
        })
        .flatten()
        .copied()
    }

    /// 计算世界顶点
    ///
    /// `deform` 非空时按 (顶点, 骨骼) 给出局部坐标偏移，长度为 `weights.len() / 3 * 2`。
    pub fn compute_world_vertices(
        &self,
        skeleton_x: f32,
        skeleton_y: f32,
        bones: &[Bone],
        deform: &[f32],
        out: &mut [f32],
    ) {
        let use_deform = !deform.is_empty() && deform.len() == self.weights.len() / 3 * 2;
        let (mut v, mut b, mut f, mut w) = (0, 0, 0, 0);
        while v < self.bones.len() {
            let mut wx = 0.0;
            let mut wy = 0.0;
            let nn = self.bones[v] + v;
            v += 1;
            while v <= nn {
                let bone = &bones[self.bones[v]];
                let (mut vx, mut vy) = (self.weights[b], self.weights[b + 1]);
                let weight = self.weights[b + 2];
                if use_deform {
                    vx += deform[f];
                    vy += deform[f + 1];
                }
                wx += (vx * bone.m00 + vy * bone.m01 + bone.world_x) * weight;
                wy += (vx * bone.m10 + vy * bone.m11 + bone.world_y) * weight;
                v += 1;
                b += 3;
                f += 2;
            }
            out[w] = wx + skeleton_x;
            out[w + 1] = wy + skeleton_y;
            w += 2;
        }
    }
}

// ============================================================================
// 包围盒附件
// ============================================================================

/// 包围盒附件，仅用于命中测试
#[derive(Clone, Debug)]
pub struct BoundingBoxAttachment {
    pub name: String,
    pub vertices: Vec<f32>,
}

impl BoundingBoxAttachment {
    pub fn new(name: impl Into<String>, vertices: Vec<f32>) -> Self {
        Self {
            name: name.into(),
            vertices,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::skeleton::bone::BoneData;

    fn bone_at(x: f32, y: f32, degrees: f32) -> Bone {
        let data = BoneData::new("b", None)
            .with_position(x, y)
            .with_rotation(degrees);
        let mut bone = Bone::new(&data);
        bone.update_world_transform(None);
        bone
    }

    #[test]
    fn test_region_offset_and_uvs() {
        let region = RegionAttachment::new("head", TextureId(1), 4.0, 2.0);
        assert_eq!(
            region.offset(),
            &[-2.0, -1.0, -2.0, 1.0, 2.0, 1.0, 2.0, -1.0]
        );
        assert_eq!(region.uvs, [0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 1.0, 1.0]);
    }

    #[test]
    fn test_region_world_vertices_translate() {
        let region = RegionAttachment::new("head", TextureId(1), 4.0, 2.0);
        let bone = bone_at(10.0, 20.0, 0.0);
        let mut out = [0.0; 8];
        region.compute_world_vertices(1.0, 1.0, &bone, &mut out);
        assert_eq!(out, [9.0, 20.0, 9.0, 22.0, 13.0, 22.0, 13.0, 20.0]);
    }

    #[test]
    fn test_mesh_uses_deform_when_sized() {
        let mesh = MeshAttachment::new(
            "cape",
            TextureId(2),
            vec![0.0, 0.0, 1.0, 0.0, 1.0, 1.0],
            vec![0.0; 6],
            vec![0, 1, 2],
        );
        let bone = bone_at(5.0, 0.0, 0.0);
        let mut out = [0.0; 6];

        mesh.compute_world_vertices(0.0, 0.0, &bone, &[], &mut out);
        assert_eq!(out, [5.0, 0.0, 6.0, 0.0, 6.0, 1.0]);

        let deform = [0.0, 1.0, 2.0, 1.0, 2.0, 2.0];
        mesh.compute_world_vertices(0.0, 0.0, &bone, &deform, &mut out);
        assert_eq!(out, [5.0, 1.0, 7.0, 1.0, 7.0, 2.0]);
    }

    #[test]
    fn test_skinned_mesh_blends_bones() {
        let bones = vec![bone_at(0.0, 0.0, 0.0), bone_at(10.0, 0.0, 0.0)];
        // 顶点 0: 两根骨骼各占一半；顶点 1: 只跟随骨骼 1
        let skinned = SkinnedMeshAttachment::new(
            "body",
            TextureId(3),
            vec![2, 0, 1, 1, 1],
            vec![0.0, 2.0, 0.5, 0.0, 2.0, 0.5, 1.0, 0.0, 1.0],
            vec![0.0; 4],
            vec![],
        );
        let mut out = [0.0; 4];
        skinned.compute_world_vertices(0.0, 0.0, &bones, &[], &mut out);
        assert_eq!(out, [5.0, 2.0, 11.0, 0.0]);
        assert_eq!(skinned.weighted_bones().collect::<Vec<_>>(), vec![0, 1, 1]);
    }

    fn two_bone_skin() -> SkinnedMeshAttachment {
        SkinnedMeshAttachment::new(
            "body",
            TextureId(3),
            vec![2, 0, 1, 1, 1],
            vec![0.0, 2.0, 0.5, 0.0, 2.0, 0.5, 1.0, 0.0, 1.0],
            vec![0.0; 4],
            vec![],
        )
    }

    #[test]
    fn test_skinned_mesh_deform_offsets() {
        let bones = vec![bone_at(0.0, 0.0, 0.0), bone_at(10.0, 0.0, 0.0)];
        let skinned = two_bone_skin();

        // 每个 (顶点, 骨骼) 一对偏移，先加到局部坐标再加权
        let deform = [2.0, 0.0, 0.0, 0.0, 0.0, 4.0];
        let mut out = [0.0; 4];
        skinned.compute_world_vertices(1.0, 1.0, &bones, &deform, &mut out);
        assert_eq!(out, [7.0, 3.0, 12.0, 5.0]);
    }

    #[test]
    fn test_skinned_mesh_ignores_mismatched_deform() {
        let bones = vec![bone_at(0.0, 0.0, 0.0), bone_at(10.0, 0.0, 0.0)];
        let skinned = two_bone_skin();

        let mut out = [0.0; 4];
        skinned.compute_world_vertices(0.0, 0.0, &bones, &[9.0; 4], &mut out);
        assert_eq!(out, [5.0, 2.0, 11.0, 0.0]);
    }

    #[test]
    fn test_world_vertex_floats() {
        let region = Attachment::Region(RegionAttachment::new("r", TextureId(0), 1.0, 1.0));
        let bbox = Attachment::BoundingBox(BoundingBoxAttachment::new("b", vec![0.0; 10]));
        assert_eq!(region.world_vertex_floats(), 8);
        assert_eq!(bbox.world_vertex_floats(), 10);
        assert!(region.is_region());
        assert_eq!(bbox.name(), "b");
    }

    #[test]
    fn test_render_parts() {
        let region = Attachment::Region(RegionAttachment::new("r", TextureId(7), 1.0, 1.0));
        let parts = region.render_parts().unwrap();
        assert_eq!(parts.texture, TextureId(7));
        assert_eq!(parts.triangles, &QUAD_TRIANGLES);

        let atlas_uvs = [0.5, 1.0, 0.5, 0.5, 1.0, 0.5, 1.0, 1.0];
        let packed =
            Attachment::Region(RegionAttachment::new("p", TextureId(7), 1.0, 1.0).with_uvs(atlas_uvs));
        assert_eq!(packed.render_parts().unwrap().uvs, &atlas_uvs);

        let bbox = Attachment::BoundingBox(BoundingBoxAttachment::new("b", vec![0.0; 4]));
        assert!(bbox.render_parts().is_none());
    }
}
