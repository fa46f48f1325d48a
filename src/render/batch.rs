//! GPU 批处理接口
//!
//! 真正提交绘制调用的批处理原语由宿主引擎提供，这里只定义它需要满足的接口。

use glam::Mat4;
use serde::{Deserialize, Serialize};

use super::blend::BlendFunc;
use super::color::Color4B;

/// 纹理句柄
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TextureId(pub u64);

/// 多边形批处理器
///
/// 累积纹理三角形直到显式刷新或容量不足，每段连续的同纹理同混合函数几何体对应一次绘制调用。
pub trait PolygonBatch {
    /// 设置本次绘制使用的模型视图矩阵
    fn set_model_view(&mut self, transform: &Mat4);

    /// 设置后续几何体的混合函数
    ///
    /// 调用方负责在切换之前刷新批次。
    fn set_blend_func(&mut self, blend_func: BlendFunc);

    /// 添加一组三角形
    ///
    /// `vertices` 与 `uvs` 都是 x, y 交错的浮点数组，顶点数为 `vertices.len() / 2`。
    fn add(
        &mut self,
        texture: TextureId,
        vertices: &[f32],
        uvs: &[f32],
        triangles: &[u16],
        color: Color4B,
    );

    /// 提交累积的几何体，批次为空时不产生绘制调用
    fn flush(&mut self);
}
