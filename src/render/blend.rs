//! 混合状态
//!
//! 绘制顺序中插槽的混合模式一旦变化，必须先刷新批次再切换 GPU 混合函数。
//! 这里把这个隐式状态机显式化：一个状态变量（当前混合模式）
//! 加一个纯函数（上一个模式, 下一个模式）→ 是否刷新。

use serde::{Deserialize, Serialize};

use crate::skeleton::slot::BlendMode;

/// 混合因子
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlendFactor {
    Zero,
    One,
    SrcColor,
    OneMinusSrcColor,
    SrcAlpha,
    OneMinusSrcAlpha,
    DstColor,
    OneMinusDstColor,
    DstAlpha,
    OneMinusDstAlpha,
}

impl BlendFactor {
    /// 转换为 wgpu 混合因子
    pub fn to_wgpu(self) -> wgpu::BlendFactor {
        match self {
            BlendFactor::Zero => wgpu::BlendFactor::Zero,
            BlendFactor::One => wgpu::BlendFactor::One,
            BlendFactor::SrcColor => wgpu::BlendFactor::Src,
            BlendFactor::OneMinusSrcColor => wgpu::BlendFactor::OneMinusSrc,
            BlendFactor::SrcAlpha => wgpu::BlendFactor::SrcAlpha,
            BlendFactor::OneMinusSrcAlpha => wgpu::BlendFactor::OneMinusSrcAlpha,
            BlendFactor::DstColor => wgpu::BlendFactor::Dst,
            BlendFactor::OneMinusDstColor => wgpu::BlendFactor::OneMinusDst,
            BlendFactor::DstAlpha => wgpu::BlendFactor::DstAlpha,
            BlendFactor::OneMinusDstAlpha => wgpu::BlendFactor::OneMinusDstAlpha,
        }
    }
}

/// 混合函数 (src, dst)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlendFunc {
    pub src: BlendFactor,
    pub dst: BlendFactor,
}

impl BlendFunc {
    /// 预乘 Alpha 纹理的标准混合
    pub const ALPHA_PREMULTIPLIED: Self = Self::new(BlendFactor::One, BlendFactor::OneMinusSrcAlpha);
    /// 非预乘 Alpha 纹理的标准混合
    pub const ALPHA_NON_PREMULTIPLIED: Self =
        Self::new(BlendFactor::SrcAlpha, BlendFactor::OneMinusSrcAlpha);
    pub const ADDITIVE: Self = Self::new(BlendFactor::SrcAlpha, BlendFactor::One);

    pub const fn new(src: BlendFactor, dst: BlendFactor) -> Self {
        Self { src, dst }
    }

    /// 转换为 wgpu 混合状态（颜色和 alpha 使用同一组因子）
    pub fn to_wgpu(self) -> wgpu::BlendState {
        let component = wgpu::BlendComponent {
            src_factor: self.src.to_wgpu(),
            dst_factor: self.dst.to_wgpu(),
            operation: wgpu::BlendOperation::Add,
        };
        wgpu::BlendState {
            color: component,
            alpha: component,
        }
    }
}

/// 插槽混合模式对应的混合函数
pub fn blend_func_for(mode: BlendMode, premultiplied_alpha: bool, base: BlendFunc) -> BlendFunc {
    match mode {
        BlendMode::Additive => BlendFunc::new(
            if premultiplied_alpha {
                BlendFactor::One
            } else {
                BlendFactor::SrcAlpha
            },
            BlendFactor::One,
        ),
        BlendMode::Multiply => BlendFunc::new(BlendFactor::DstColor, BlendFactor::OneMinusSrcAlpha),
        BlendMode::Screen => BlendFunc::new(BlendFactor::One, BlendFactor::OneMinusSrcColor),
        BlendMode::Normal => base,
    }
}

/// 一帧内的混合模式状态机
#[derive(Debug, Clone, Copy, Default)]
pub struct BlendState {
    current: Option<BlendMode>,
}

impl BlendState {
    pub fn new() -> Self {
        Self::default()
    }

    /// 从 `previous` 切换到 `next` 是否需要刷新批次
    ///
    /// 帧首（`previous` 为 None）总是需要设置一次混合函数。
    pub fn needs_flush(previous: Option<BlendMode>, next: BlendMode) -> bool {
        previous != Some(next)
    }

    /// 进入 `next` 模式，返回是否发生了切换
    pub fn transition(&mut self, next: BlendMode) -> bool {
        if Self::needs_flush(self.current, next) {
            self.current = Some(next);
            true
        } else {
            false
        }
    }

    pub fn current(&self) -> Option<BlendMode> {
        self.current
    }

    pub fn reset(&mut self) {
        self.current = None;
    }
}
