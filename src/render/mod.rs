//! 渲染模块
//!
//! 顶点解析、混合状态、批处理绘制管线与调试覆盖层。
//! GPU 批处理原语通过 [`PolygonBatch`] 接入，[`PolygonSpriteBatch`] 是 CPU 端的参考实现。

pub mod batch;
pub mod blend;
pub mod color;
pub mod debug;
pub mod pipeline;
pub mod resolver;
pub mod sprite_batch;

pub use batch::{PolygonBatch, TextureId};
pub use blend::{blend_func_for, BlendFactor, BlendFunc, BlendState};
pub use color::{composite_color, Color, Color4B};
pub use debug::{draw_debug_overlay, DebugCommand, DebugDraw, DebugOptions, DebugRecorder};
pub use pipeline::{DrawPipeline, DrawSettings, FrameStats};
pub use resolver::{VertexResolver, WorldVertexBuffer};
pub use sprite_batch::{DrawCall, PolygonSpriteBatch, Vertex};
