//! # Skeleton Renderer
//!
//! Bone-driven 2D skeleton rendering into batched textured triangles, with
//! auxiliary sprites rigidly attached to bones or slots.
//!
//! ## Features
//!
//! - **Skeleton model**: bones, slots, skins and region / mesh / skinned-mesh attachments
//! - **Vertex resolver**: per-frame world vertices into an instance-owned scratch buffer
//! - **Batching pipeline**: draw-order traversal with an explicit blend-mode state machine
//! - **Bone sprites**: key-based registry of sprites following a bone's live transform
//! - **Debug overlay**: slot quads, bone lines and origins
//!
//! ## Architecture Design
//!
//! The GPU batch primitive, debug line drawing and pose evaluation are owned by the host
//! and plugged in through traits:
//! - [`render::PolygonBatch`]: textured triangle batching and flushing
//! - [`render::DebugDraw`]: debug polygons, lines and points
//! - [`skeleton::PoseDriver`]: per-frame pose updates (animation timelines, procedural poses)
//!
//! ## Modules
//!
//! - [`core`]: error types, logging and shared macros
//! - [`config`]: renderer configuration
//! - [`math`]: 2D transform utilities
//! - [`skeleton`]: skeleton data model
//! - [`render`]: resolver, blend state, pipeline and debug overlay
//! - [`bone_sprite`]: sprite-to-bone bindings
//! - [`renderer`]: host-facing renderer

/// Error types, logging initialization and macros
pub mod core;
/// Configuration system
pub mod config;
/// 2D transform utilities
pub mod math;
/// Skeleton data model
pub mod skeleton;
/// Rendering pipeline
pub mod render;
/// Sprites bound to bones and slots
pub mod bone_sprite;
/// Host-facing skeleton renderer
pub mod renderer;

pub use crate::core::{RendererError, RendererResult};
pub use renderer::SkeletonRenderer;
