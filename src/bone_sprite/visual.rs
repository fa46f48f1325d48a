use glam::Vec2;
use std::fmt;

use crate::render::batch::TextureId;
use crate::render::color::Color4B;

/// 可以绑定到骨骼上的辅助精灵
///
/// 由宿主引擎实现，渲染器在绑定时读取一次尺寸、缩放、旋转和位置，
/// 之后每帧只回写位置，供宿主做坐标转换。
pub trait SpriteVisual: fmt::Debug {
    /// 纹理
    fn texture(&self) -> TextureId;

    /// 内容尺寸（未缩放）
    fn content_size(&self) -> Vec2;

    fn scale(&self) -> Vec2;

    /// 旋转角度（顺时针为正）
    fn rotation(&self) -> f32;

    fn position(&self) -> Vec2;

    fn set_position(&mut self, position: Vec2);

    /// 顶点颜色：RGB 为精灵颜色，A 为不透明度，不做预乘
    fn color(&self) -> Color4B;

    /// 绑定时调用
    fn on_enter(&mut self) {}

    /// 解绑时调用，随后精灵被释放
    fn on_exit(&mut self) {}
}

/// 基础精灵实现
#[derive(Debug, Clone, PartialEq)]
pub struct Sprite {
    pub texture: TextureId,
    pub content_size: Vec2,
    pub scale: Vec2,
    pub rotation: f32,
    pub position: Vec2,
    pub color: [u8; 3],
    pub opacity: u8,
    running: bool,
}

impl Sprite {
    pub fn new(texture: TextureId, width: f32, height: f32) -> Self {
        Self {
            texture,
            content_size: Vec2::new(width, height),
            scale: Vec2::ONE,
            rotation: 0.0,
            position: Vec2::ZERO,
            color: [255, 255, 255],
            opacity: 255,
            running: false,
        }
    }

    pub fn with_scale(mut self, scale_x: f32, scale_y: f32) -> Self {
        self.scale = Vec2::new(scale_x, scale_y);
        self
    }

    pub fn with_rotation(mut self, degrees: f32) -> Self {
        self.rotation = degrees;
        self
    }

    pub fn with_position(mut self, x: f32, y: f32) -> Self {
        self.position = Vec2::new(x, y);
        self
    }

    pub fn with_color(mut self, color: [u8; 3], opacity: u8) -> Self {
        self.color = color;
        self.opacity = opacity;
        self
    }

    /// 是否处于绑定状态
    pub fn is_running(&self) -> bool {
        self.running
    }
}

impl SpriteVisual for Sprite {
    fn texture(&self) -> TextureId {
        self.texture
    }

    fn content_size(&self) -> Vec2 {
        self.content_size
    }

    fn scale(&self) -> Vec2 {
        self.scale
    }

    fn rotation(&self) -> f32 {
        self.rotation
    }

    fn position(&self) -> Vec2 {
        self.position
    }

    fn set_position(&mut self, position: Vec2) {
        self.position = position;
    }

    fn color(&self) -> Color4B {
        Color4B::new(self.color[0], self.color[1], self.color[2], self.opacity)
    }

    fn on_enter(&mut self) {
        self.running = true;
    }

    fn on_exit(&mut self) {
        self.running = false;
    }
}
