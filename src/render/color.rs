use serde::{Deserialize, Serialize};

/// 浮点颜色（0.0 - 1.0）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const WHITE: Self = Self::new(1.0, 1.0, 1.0, 1.0);

    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// 从 8 位颜色和不透明度转换
    pub fn from_rgb8(rgb: [u8; 3], opacity: u8) -> Self {
        Self {
            r: rgb[0] as f32 / 255.0,
            g: rgb[1] as f32 / 255.0,
            b: rgb[2] as f32 / 255.0,
            a: opacity as f32 / 255.0,
        }
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

/// 8 位顶点颜色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color4B {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color4B {
    pub const WHITE: Self = Self::new(255, 255, 255, 255);
    pub const RED: Self = Self::new(255, 0, 0, 255);
    pub const GREEN: Self = Self::new(0, 255, 0, 255);
    pub const BLUE: Self = Self::new(0, 0, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// 转换为 [f32; 4]，用于顶点数据
    pub fn to_array(self) -> [f32; 4] {
        [
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
            self.a as f32 / 255.0,
        ]
    }
}

#[inline]
fn to_byte(value: f32) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

/// 计算插槽最终顶点颜色
///
/// alpha = 骨架 × 插槽 × 附件 × 255。预乘模式下 RGB 的乘数是取整后的 alpha 字节，
/// 否则是 255。
pub fn composite_color(
    skeleton: &Color,
    slot: &Color,
    attachment: &Color,
    premultiplied_alpha: bool,
) -> Color4B {
    let a = to_byte(skeleton.a * slot.a * attachment.a * 255.0);
    let multiplier = if premultiplied_alpha { a as f32 } else { 255.0 };
    Color4B {
        r: to_byte(skeleton.r * slot.r * attachment.r * multiplier),
        g: to_byte(skeleton.g * slot.g * attachment.g * multiplier),
        b: to_byte(skeleton.b * slot.b * attachment.b * multiplier),
        a,
    }
}
