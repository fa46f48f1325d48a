//! 调试覆盖层
//!
//! 插槽四边形与骨骼线段/原点的调试绘制。画线和画点的原语由宿主提供。

use glam::{Mat4, Vec2};

use crate::skeleton::attachment::Attachment;
use crate::skeleton::instance::Skeleton;

use super::color::Color4B;

/// 调试绘制原语
pub trait DebugDraw {
    fn set_model_view(&mut self, transform: &Mat4);

    /// 绘制多边形轮廓
    fn draw_poly(&mut self, points: &[Vec2], closed: bool, color: Color4B, line_width: f32);

    fn draw_line(&mut self, from: Vec2, to: Vec2, color: Color4B, line_width: f32);

    fn draw_point(&mut self, point: Vec2, color: Color4B, size: f32);
}

pub const SLOT_COLOR: Color4B = Color4B::BLUE;
pub const SLOT_LINE_WIDTH: f32 = 1.0;
pub const BONE_COLOR: Color4B = Color4B::RED;
pub const BONE_LINE_WIDTH: f32 = 2.0;
pub const ROOT_POINT_COLOR: Color4B = Color4B::BLUE;
pub const POINT_COLOR: Color4B = Color4B::GREEN;
pub const POINT_SIZE: f32 = 4.0;

/// 调试覆盖层选项
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DebugOptions {
    pub slots: bool,
    pub bones: bool,
}

impl DebugOptions {
    pub fn any(&self) -> bool {
        self.slots || self.bones
    }
}

/// 绘制调试覆盖层
///
/// 插槽四边形按绘制顺序重新计算（不含翻转），骨骼线段从原点沿 x 轴方向延伸骨骼长度。
pub fn draw_debug_overlay(
    skeleton: &Skeleton,
    debug: &mut dyn DebugDraw,
    transform: &Mat4,
    options: DebugOptions,
) {
    if !options.any() {
        return;
    }
    debug.set_model_view(transform);

    if options.slots {
        let mut vertices = [0.0; 8];
        for &slot_index in skeleton.draw_order() {
            let Some(slot) = skeleton.slots.get(slot_index) else {
                continue;
            };
            let Some(Attachment::Region(region)) = slot.attachment.as_deref() else {
                continue;
            };
            let Some(bone) = skeleton.bones.get(slot.bone) else {
                continue;
            };
            region.compute_world_vertices(skeleton.x, skeleton.y, bone, &mut vertices);
            let points: Vec<Vec2> = vertices
                .chunks_exact(2)
                .map(|p| Vec2::new(p[0], p[1]))
                .collect();
            debug.draw_poly(&points, true, SLOT_COLOR, SLOT_LINE_WIDTH);
        }
    }

    if options.bones {
        let origin = Vec2::new(skeleton.x, skeleton.y);
        for bone in &skeleton.bones {
            let (tip_x, tip_y) = bone.tip();
            debug.draw_line(
                origin + Vec2::new(bone.world_x, bone.world_y),
                origin + Vec2::new(tip_x, tip_y),
                BONE_COLOR,
                BONE_LINE_WIDTH,
            );
        }
        for bone in &skeleton.bones {
            let color = if bone.is_root() {
                ROOT_POINT_COLOR
            } else {
                POINT_COLOR
            };
            debug.draw_point(
                origin + Vec2::new(bone.world_x, bone.world_y),
                color,
                POINT_SIZE,
            );
        }
    }
}

/// 记录下来的调试绘制命令
#[derive(Debug, Clone, PartialEq)]
pub enum DebugCommand {
    Poly {
        points: Vec<Vec2>,
        closed: bool,
        color: Color4B,
        line_width: f32,
    },
    Line {
        from: Vec2,
        to: Vec2,
        color: Color4B,
        line_width: f32,
    },
    Point {
        point: Vec2,
        color: Color4B,
        size: f32,
    },
}

/// 只记录命令的调试绘制器
#[derive(Debug, Clone, Default)]
pub struct DebugRecorder {
    pub model_view: Mat4,
    pub commands: Vec<DebugCommand>,
}

impl DebugRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }
}

impl DebugDraw for DebugRecorder {
    fn set_model_view(&mut self, transform: &Mat4) {
        self.model_view = *transform;
    }

    fn draw_poly(&mut self, points: &[Vec2], closed: bool, color: Color4B, line_width: f32) {
        self.commands.push(DebugCommand::Poly {
            points: points.to_vec(),
            closed,
            color,
            line_width,
        });
    }

    fn draw_line(&mut self, from: Vec2, to: Vec2, color: Color4B, line_width: f32) {
        self.commands.push(DebugCommand::Line {
            from,
            to,
            color,
            line_width,
        });
    }

    fn draw_point(&mut self, point: Vec2, color: Color4B, size: f32) {
        self.commands.push(DebugCommand::Point { point, color, size });
    }
}
