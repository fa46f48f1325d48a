use glam::{Mat4, Vec2};
use wgpu::{Buffer, BufferUsages, Device, Queue};

use crate::config::RendererConfig;

use super::batch::{PolygonBatch, TextureId};
use super::blend::BlendFunc;
use super::color::Color4B;

/// 顶点数据
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    /// 位置
    pub position: [f32; 2],
    /// 纹理坐标
    pub uv: [f32; 2],
    /// 颜色 (RGBA)
    pub color: [f32; 4],
}

/// 一次绘制调用
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCall {
    pub texture: TextureId,
    pub blend_func: BlendFunc,
    pub model_view: Mat4,
    pub index_start: u32,
    pub index_count: u32,
}

/// CPU 端多边形批处理器
///
/// 记录每次刷新产生的绘制调用，所有顶点/索引保存在帧级数组中，
/// 可以一次性上传到 GPU 缓冲区。
///
/// 批处理器不会自行清空：顶点和绘制调用跨帧累积，宿主在每帧提交后调用 [`clear`](Self::clear)。
pub struct PolygonSpriteBatch {
    /// 帧内全部顶点
    vertices: Vec<Vertex>,
    /// 帧内全部索引
    indices: Vec<u32>,
    /// 已提交的绘制调用
    draw_calls: Vec<DrawCall>,
    /// 当前批次的纹理
    texture: Option<TextureId>,
    /// 当前批次起始位置
    pending_vertex_start: usize,
    pending_index_start: usize,
    blend_func: BlendFunc,
    model_view: Mat4,
    /// 单个批次最大顶点数
    capacity: usize,
    /// 显式 flush 调用次数
    flush_count: usize,
    vertex_buffer: Option<Buffer>,
    index_buffer: Option<Buffer>,
}

impl PolygonSpriteBatch {
    /// 创建新的批处理器
    pub fn new(capacity: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(capacity),
            indices: Vec::with_capacity(capacity * 3),
            draw_calls: Vec::new(),
            texture: None,
            pending_vertex_start: 0,
            pending_index_start: 0,
            blend_func: BlendFunc::ALPHA_PREMULTIPLIED,
            model_view: Mat4::IDENTITY,
            capacity,
            flush_count: 0,
            vertex_buffer: None,
            index_buffer: None,
        }
    }

    /// 使用配置中的批次容量
    pub fn from_config(config: &RendererConfig) -> Self {
        Self::new(config.batch_capacity)
    }

    /// 清空一帧的数据
    pub fn clear(&mut self) {
        self.vertices.clear();
        self.indices.clear();
        self.draw_calls.clear();
        self.texture = None;
        self.pending_vertex_start = 0;
        self.pending_index_start = 0;
        self.flush_count = 0;
    }

    pub fn draw_calls(&self) -> &[DrawCall] {
        &self.draw_calls
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// 显式 flush 调用次数（包括空批次）
    pub fn flush_count(&self) -> usize {
        self.flush_count
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn pending_vertices(&self) -> usize {
        self.vertices.len() - self.pending_vertex_start
    }

    fn pending_indices(&self) -> usize {
        self.indices.len() - self.pending_index_start
    }

    /// 提交当前批次
    fn submit(&mut self) {
        let index_count = self.pending_indices();
        if let (Some(texture), true) = (self.texture, index_count > 0) {
            self.draw_calls.push(DrawCall {
                texture,
                blend_func: self.blend_func,
                model_view: self.model_view,
                index_start: self.pending_index_start as u32,
                index_count: index_count as u32,
            });
        }
        self.pending_vertex_start = self.vertices.len();
        self.pending_index_start = self.indices.len();
    }

    /// 更新顶点和索引缓冲区
    pub fn update_buffers(&mut self, device: &Device, queue: &Queue) {
        if self.vertices.is_empty() {
            return;
        }

        let vertex_bytes: &[u8] = bytemuck::cast_slice(&self.vertices);
        let index_bytes: &[u8] = bytemuck::cast_slice(&self.indices);

        if self
            .vertex_buffer
            .as_ref()
            .map_or(true, |b| b.size() < vertex_bytes.len() as u64)
        {
            self.vertex_buffer = Some(device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("Skeleton Vertex Buffer"),
                size: vertex_bytes.len().next_power_of_two() as u64,
                usage: BufferUsages::VERTEX | BufferUsages::COPY_DST,
                mapped_at_creation: false,
            }));
        }
        if self
            .index_buffer
            .as_ref()
            .map_or(true, |b| b.size() < index_bytes.len() as u64)
        {
            self.index_buffer = Some(device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("Skeleton Index Buffer"),
                size: index_bytes.len().next_power_of_two() as u64,
                usage: BufferUsages::INDEX | BufferUsages::COPY_DST,
                mapped_at_creation: false,
            }));
        }

        // 写入数据
        if let Some(buffer) = &self.vertex_buffer {
            queue.write_buffer(buffer, 0, vertex_bytes);
        }
        if let Some(buffer) = &self.index_buffer {
            queue.write_buffer(buffer, 0, index_bytes);
        }
    }

    /// 获取顶点缓冲区
    pub fn vertex_buffer(&self) -> Option<&Buffer> {
        self.vertex_buffer.as_ref()
    }

    /// 获取索引缓冲区
    pub fn index_buffer(&self) -> Option<&Buffer> {
        self.index_buffer.as_ref()
    }
}

impl PolygonBatch for PolygonSpriteBatch {
    fn set_model_view(&mut self, transform: &Mat4) {
        self.model_view = *transform;
    }

    fn set_blend_func(&mut self, blend_func: BlendFunc) {
        if blend_func != self.blend_func && self.pending_indices() > 0 {
            tracing::debug!(target: "render.batch", "Blend function changed with pending geometry, submitting");
            self.submit();
        }
        self.blend_func = blend_func;
    }

    fn add(
        &mut self,
        texture: TextureId,
        vertices: &[f32],
        uvs: &[f32],
        triangles: &[u16],
        color: Color4B,
    ) {
        let vertex_count = vertices.len() / 2;
        if vertex_count > self.capacity || triangles.len() > self.capacity * 3 {
            tracing::warn!(
                target: "render.batch",
                "Dropping {} vertices for texture {:?}: exceeds batch capacity {}",
                vertex_count,
                texture,
                self.capacity
            );
            return;
        }

        if self.texture != Some(texture)
            || self.pending_vertices() + vertex_count > self.capacity
            || self.pending_indices() + triangles.len() > self.capacity * 3
        {
            self.submit();
            self.texture = Some(texture);
        }

        let rgba = color.to_array();
        let base = (self.vertices.len() - self.pending_vertex_start) as u32;
        let vertex_start = self.pending_vertex_start as u32;
        self.vertices.extend(
            vertices
                .chunks_exact(2)
                .zip(uvs.chunks_exact(2))
                .map(|(p, uv)| Vertex {
                    position: Vec2::new(p[0], p[1]).to_array(),
                    uv: [uv[0], uv[1]],
                    color: rgba,
                }),
        );
        self.indices
            .extend(triangles.iter().map(|&i| vertex_start + base + i as u32));
    }

    fn flush(&mut self) {
        self.flush_count += 1;
        self.submit();
    }
}
