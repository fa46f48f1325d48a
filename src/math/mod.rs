//! 数学工具模块

pub mod transform;

pub use transform::{
    compose_rotation, inverse_transform_point, mirror_quad_vertical, quad_offsets,
    transform_point, QUAD_FLOATS, QUAD_TRIANGLES,
};
