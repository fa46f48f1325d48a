//! 骨骼数据
//!
//! 从外部资源加载完成的只读数据，多个渲染器实例可以通过 `Arc` 共享。

use crate::core::error::{RendererError, RendererResult};

use super::attachment::Attachment;
use super::bone::BoneData;
use super::skin::Skin;
use super::slot::SlotData;

/// 骨骼数据
#[derive(Clone, Debug, Default)]
pub struct SkeletonData {
    pub name: String,
    /// 骨骼（父骨骼必须排在子骨骼之前）
    pub bones: Vec<BoneData>,
    /// 插槽（设置姿态下的绘制顺序）
    pub slots: Vec<SlotData>,
    pub skins: Vec<Skin>,
    pub default_skin: Option<Skin>,
}

impl SkeletonData {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// 添加骨骼，返回其索引
    pub fn add_bone(&mut self, bone: BoneData) -> usize {
        self.bones.push(bone);
        self.bones.len() - 1
    }

    /// 添加插槽，返回其索引
    pub fn add_slot(&mut self, slot: SlotData) -> usize {
        self.slots.push(slot);
        self.slots.len() - 1
    }

    /// 向默认皮肤添加附件
    pub fn add_default_attachment(&mut self, slot_index: usize, attachment: Attachment) {
        let name = attachment.name().to_string();
        self.default_skin
            .get_or_insert_with(|| Skin::new("default"))
            .add_attachment(slot_index, name, attachment);
    }

    pub fn find_bone(&self, name: &str) -> Option<usize> {
        self.bones.iter().position(|b| b.name == name)
    }

    pub fn find_slot(&self, name: &str) -> Option<usize> {
        self.slots.iter().position(|s| s.name == name)
    }

    pub fn find_skin(&self, name: &str) -> Option<usize> {
        self.skins.iter().position(|s| s.name == name)
    }

    /// 校验数据的引用完整性
    pub fn validate(&self) -> RendererResult<()> {
        if self.bones.is_empty() {
            return Err(invalid("skeleton has no bones".to_string()));
        }

        for (i, bone) in self.bones.iter().enumerate() {
            if let Some(parent) = bone.parent {
                if parent >= i {
                    return Err(invalid(format!(
                        "bone '{}' must come after its parent (index {})",
                        bone.name, parent
                    )));
                }
            } else if i != 0 {
                return Err(invalid(format!("bone '{}' is a second root", bone.name)));
            }
            if self.bones[..i].iter().any(|b| b.name == bone.name) {
                return Err(invalid(format!("duplicate bone name '{}'", bone.name)));
            }
        }

        for (i, slot) in self.slots.iter().enumerate() {
            if slot.bone >= self.bones.len() {
                return Err(invalid(format!(
                    "slot '{}' references missing bone {}",
                    slot.name, slot.bone
                )));
            }
            if self.slots[..i].iter().any(|s| s.name == slot.name) {
                return Err(invalid(format!("duplicate slot name '{}'", slot.name)));
            }
        }

        for skin in self.skins.iter().chain(self.default_skin.iter()) {
            for (slot, name, attachment) in skin.iter() {
                if slot >= self.slots.len() {
                    return Err(invalid(format!(
                        "skin '{}' attachment '{}' references missing slot {}",
                        skin.name, name, slot
                    )));
                }
                self.validate_attachment(attachment)?;
            }
        }

        Ok(())
    }

    fn validate_attachment(&self, attachment: &Attachment) -> RendererResult<()> {
        match attachment {
            Attachment::Region(_) => Ok(()),
            Attachment::Mesh(mesh) => {
                if mesh.vertices.len() % 2 != 0 || mesh.uvs.len() != mesh.vertices.len() {
                    return Err(invalid(format!(
                        "mesh '{}' has {} vertex floats but {} uv floats",
                        mesh.name,
                        mesh.vertices.len(),
                        mesh.uvs.len()
                    )));
                }
                check_triangles(&mesh.name, &mesh.triangles, mesh.vertices.len() / 2)
            }
            Attachment::SkinnedMesh(skinned) => {
                let mut v = 0;
                let mut vertex_count = 0;
                let mut weight_count = 0;
                while v < skinned.bones.len() {
                    let count = skinned.bones[v];
                    let end = v + 1 + count;
                    if end > skinned.bones.len() {
                        return Err(invalid(format!(
                            "skinned mesh '{}' has a truncated bone table",
                            skinned.name
                        )));
                    }
                    if let Some(bad) = skinned.bones[v + 1..end]
                        .iter()
                        .find(|&&b| b >= self.bones.len())
                    {
                        return Err(invalid(format!(
                            "skinned mesh '{}' references missing bone {}",
                            skinned.name, bad
                        )));
                    }
                    vertex_count += 1;
                    weight_count += count;
                    v = end;
                }
                if skinned.weights.len() != weight_count * 3 || skinned.uvs.len() != vertex_count * 2 {
                    return Err(invalid(format!(
                        "skinned mesh '{}' weights/uvs do not match its bone table",
                        skinned.name
                    )));
                }
                check_triangles(&skinned.name, &skinned.triangles, vertex_count)
            }
            Attachment::BoundingBox(_) => Ok(()),
        }
    }
}

fn check_triangles(name: &str, triangles: &[u16], vertex_count: usize) -> RendererResult<()> {
    if triangles.len() % 3 != 0 {
        return Err(invalid(format!(
            "'{}' triangle list is not a multiple of 3",
            name
        )));
    }
    if let Some(bad) = triangles.iter().find(|&&i| i as usize >= vertex_count) {
        return Err(invalid(format!(
            "'{}' triangle index {} exceeds vertex count {}",
            name, bad, vertex_count
        )));
    }
    Ok(())
}

fn invalid(message: String) -> RendererError {
    RendererError::InvalidSkeletonData(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::batch::TextureId;
    use crate::skeleton::attachment::{MeshAttachment, SkinnedMeshAttachment};

    fn base() -> SkeletonData {
        let mut data = SkeletonData::new("test");
        data.add_bone(BoneData::new("root", None));
        data.add_slot(SlotData::new("body", 0));
        data
    }

    #[test]
    fn test_valid_data() {
        assert!(base().validate().is_ok());
    }

    #[test]
    fn test_no_bones() {
        assert!(SkeletonData::new("empty").validate().is_err());
    }

    #[test]
    fn test_parent_order() {
        let mut data = base();
        data.bones[0].parent = Some(1);
        data.add_bone(BoneData::new("child", None));
        assert!(data.validate().is_err());
    }

    #[test]
    fn test_slot_bone_range() {
        let mut data = base();
        data.add_slot(SlotData::new("ghost", 7));
        let err = data.validate().unwrap_err();
        assert!(err.to_string().contains("ghost"));
    }

    #[test]
    fn test_mesh_triangle_range() {
        let mut data = base();
        data.add_default_attachment(
            0,
            Attachment::Mesh(MeshAttachment::new(
                "cape",
                TextureId(1),
                vec![0.0; 6],
                vec![0.0; 6],
                vec![0, 1, 3],
            )),
        );
        assert!(data.validate().is_err());
    }

    #[test]
    fn test_skinned_bone_range() {
        let mut data = base();
        data.add_default_attachment(
            0,
            Attachment::SkinnedMesh(SkinnedMeshAttachment::new(
                "body",
                TextureId(1),
                vec![1, 5],
                vec![0.0, 0.0, 1.0],
                vec![0.0, 0.0],
                vec![],
            )),
        );
        assert!(data.validate().is_err());
    }

    #[test]
    fn test_find_by_name() {
        let data = base();
        assert_eq!(data.find_bone("root"), Some(0));
        assert_eq!(data.find_slot("body"), Some(0));
        assert_eq!(data.find_slot("nope"), None);
    }
}
