//! 二维变换工具
//!
//! 骨骼世界矩阵只用到线性部分的 (m00, m10) 列和平移 (worldX, worldY)。
//! 四边形顶点以 `[x1, y1, x2, y2, x3, y3, x4, y4]` 交错存放，
//! 角点顺序为 左下、左上、右上、右下。

/// 四边形三角形索引
pub const QUAD_TRIANGLES: [u16; 6] = [0, 1, 2, 2, 3, 0];

/// 四边形顶点浮点数
pub const QUAD_FLOATS: usize = 8;

pub const VERTEX_X1: usize = 0;
pub const VERTEX_Y1: usize = 1;
pub const VERTEX_X2: usize = 2;
pub const VERTEX_Y2: usize = 3;
pub const VERTEX_X3: usize = 4;
pub const VERTEX_Y3: usize = 5;
pub const VERTEX_X4: usize = 6;
pub const VERTEX_Y4: usize = 7;

/// 组合旋转
///
/// `existing_cos`/`existing_sin` 取自骨骼矩阵的 m00/m10，
/// 返回值等价于 `(cos(a - base), sin(a - base))`，用来抵消绑定时已烘焙的旋转。
#[inline]
pub fn compose_rotation(existing_cos: f32, existing_sin: f32, base_rotation: f32) -> (f32, f32) {
    let (sine_offset, cosine_offset) = base_rotation.sin_cos();
    let cosine = existing_cos * cosine_offset + existing_sin * sine_offset;
    let sine = existing_sin * cosine_offset - sine_offset * existing_cos;
    (cosine, sine)
}

/// 通过旋转和平移变换一个点
#[inline]
pub fn transform_point(
    offset_x: f32,
    offset_y: f32,
    cos: f32,
    sin: f32,
    translate_x: f32,
    translate_y: f32,
) -> (f32, f32) {
    (
        offset_x * cos - offset_y * sin + translate_x,
        offset_x * sin + offset_y * cos + translate_y,
    )
}

/// `transform_point` 的逆变换（先减平移，再反向旋转）
///
/// 仅在 `cos² + sin²` 为 1 时精确。
#[inline]
pub fn inverse_transform_point(
    x: f32,
    y: f32,
    cos: f32,
    sin: f32,
    translate_x: f32,
    translate_y: f32,
) -> (f32, f32) {
    let dx = x - translate_x;
    let dy = y - translate_y;
    (dx * cos + dy * sin, -dx * sin + dy * cos)
}

/// 垂直镜像四边形：交换角点 1↔2、3↔4
///
/// 执行两次等于恒等变换，`QUAD_TRIANGLES` 的索引依然有效。
pub fn mirror_quad_vertical(vertices: &mut [f32]) {
    debug_assert!(vertices.len() >= QUAD_FLOATS);
    vertices.swap(VERTEX_X1, VERTEX_X2);
    vertices.swap(VERTEX_Y1, VERTEX_Y2);
    vertices.swap(VERTEX_X3, VERTEX_X4);
    vertices.swap(VERTEX_Y3, VERTEX_Y4);
}

/// 由局部矩形构建四边形偏移
///
/// 矩形 `(local_x, local_y)`-`(local_x2, local_y2)` 先按 `radians` 旋转，再平移 `(x, y)`。
pub fn quad_offsets(
    local_x: f32,
    local_y: f32,
    local_x2: f32,
    local_y2: f32,
    radians: f32,
    x: f32,
    y: f32,
) -> [f32; QUAD_FLOATS] {
    let (sine, cosine) = radians.sin_cos();
    let corners = [
        (local_x, local_y),
        (local_x, local_y2),
        (local_x2, local_y2),
        (local_x2, local_y),
    ];

    let mut offset = [0.0; QUAD_FLOATS];
    for (i, (cx, cy)) in corners.into_iter().enumerate() {
        let (px, py) = transform_point(cx, cy, cosine, sine, x, y);
        offset[i * 2] = px;
        offset[i * 2 + 1] = py;
    }
    offset
}

/// 计算三角形的有向面积（逆时针为正）
pub fn signed_triangle_area(vertices: &[f32], a: u16, b: u16, c: u16) -> f32 {
    let (a, b, c) = (a as usize * 2, b as usize * 2, c as usize * 2);
    let (ax, ay) = (vertices[a], vertices[a + 1]);
    let (bx, by) = (vertices[b], vertices[b + 1]);
    let (cx, cy) = (vertices[c], vertices[c + 1]);
    ((bx - ax) * (cy - ay) - (cx - ax) * (by - ay)) * 0.5
}
