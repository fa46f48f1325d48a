use glam::Vec2;

use crate::render::color::Color;

/// 宿主场景节点的状态
///
/// 由宿主在绘制前写入，渲染器只读取。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeState {
    pub position: Vec2,
    pub scale: Vec2,
    pub color: [u8; 3],
    pub opacity: u8,
}

impl Default for NodeState {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            scale: Vec2::ONE,
            color: [255, 255, 255],
            opacity: 255,
        }
    }
}

impl NodeState {
    /// 作为骨架整体颜色使用的浮点颜色
    pub fn tint(&self) -> Color {
        Color::from_rgb8(self.color, self.opacity)
    }
}

/// 轴对齐矩形
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rect {
    pub origin: Vec2,
    pub size: Vec2,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            origin: Vec2::new(x, y),
            size: Vec2::new(width, height),
        }
    }

    /// 由最小、最大角点构造
    pub fn from_min_max(min: Vec2, max: Vec2) -> Self {
        Self {
            origin: min,
            size: max - min,
        }
    }

    pub fn max(&self) -> Vec2 {
        self.origin + self.size
    }

    pub fn contains(&self, point: Vec2) -> bool {
        let max = self.max();
        point.x >= self.origin.x && point.x <= max.x && point.y >= self.origin.y && point.y <= max.y
    }
}
