//! 插槽
//!
//! 插槽挂在骨骼上，携带当前可见附件、颜色和混合模式，按绘制顺序排列。

use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::render::color::Color;

use super::attachment::Attachment;

/// 插槽混合模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BlendMode {
    #[default]
    Normal,
    Additive,
    Multiply,
    Screen,
}

/// 插槽设置数据
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SlotData {
    /// 插槽名称
    pub name: String,
    /// 所属骨骼索引
    pub bone: usize,
    pub color: Color,
    /// 设置姿态下的附件名称
    pub attachment_name: Option<String>,
    pub blend_mode: BlendMode,
}

impl SlotData {
    pub fn new(name: impl Into<String>, bone: usize) -> Self {
        Self {
            name: name.into(),
            bone,
            color: Color::WHITE,
            attachment_name: None,
            blend_mode: BlendMode::Normal,
        }
    }

    pub fn with_attachment(mut self, attachment_name: impl Into<String>) -> Self {
        self.attachment_name = Some(attachment_name.into());
        self
    }

    pub fn with_blend_mode(mut self, blend_mode: BlendMode) -> Self {
        self.blend_mode = blend_mode;
        self
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }
}

/// 插槽四角的屏幕坐标缓存（左下、左上、右上、右下）
///
/// 由顶点解析器每帧刷新，供命中测试等外部逻辑读取。
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SlotCorners {
    pub left_bottom: Vec2,
    pub left_top: Vec2,
    pub right_top: Vec2,
    pub right_bottom: Vec2,
}

impl SlotCorners {
    /// 由四边形世界顶点加上节点位置得到
    pub fn from_quad(vertices: &[f32], origin: Vec2) -> Self {
        Self {
            left_bottom: Vec2::new(vertices[0], vertices[1]) + origin,
            left_top: Vec2::new(vertices[2], vertices[3]) + origin,
            right_top: Vec2::new(vertices[4], vertices[5]) + origin,
            right_bottom: Vec2::new(vertices[6], vertices[7]) + origin,
        }
    }
}

/// 运行时插槽
#[derive(Clone, Debug)]
pub struct Slot {
    pub name: String,
    /// 所属骨骼索引
    pub bone: usize,
    pub color: Color,
    pub attachment: Option<Arc<Attachment>>,
    pub blend_mode: BlendMode,
    /// 垂直翻转
    pub flip_y: bool,
    /// 屏幕坐标缓存
    pub corners: SlotCorners,
    /// 网格顶点变形（为空表示不变形）
    pub deform: Vec<f32>,
}

impl Slot {
    pub fn new(data: &SlotData) -> Self {
        Self {
            name: data.name.clone(),
            bone: data.bone,
            color: data.color,
            attachment: None,
            blend_mode: data.blend_mode,
            flip_y: false,
            corners: SlotCorners::default(),
            deform: Vec::new(),
        }
    }

    /// 更换附件，变形数据随之失效
    pub fn set_attachment(&mut self, attachment: Option<Arc<Attachment>>) {
        let same = match (&self.attachment, &attachment) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        };
        if !same {
            self.deform.clear();
        }
        self.attachment = attachment;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::batch::TextureId;
    use crate::skeleton::attachment::RegionAttachment;

    #[test]
    fn test_corners_from_quad() {
        let quad = [0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0, 0.0];
        let corners = SlotCorners::from_quad(&quad, Vec2::new(10.0, 10.0));
        assert_eq!(corners.left_bottom, Vec2::new(10.0, 10.0));
        assert_eq!(corners.right_top, Vec2::new(11.0, 11.0));
    }

    #[test]
    fn test_set_attachment_resets_deform() {
        let mut slot = Slot::new(&SlotData::new("hand", 0));
        let region = Arc::new(Attachment::Region(RegionAttachment::new(
            "hand",
            TextureId(1),
            1.0,
            1.0,
        )));
        slot.set_attachment(Some(region.clone()));
        slot.deform = vec![1.0, 2.0];

        slot.set_attachment(Some(region));
        assert_eq!(slot.deform.len(), 2);

        slot.set_attachment(None);
        assert!(slot.deform.is_empty());
    }
}
