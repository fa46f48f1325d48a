use std::sync::Arc;

use glam::{Mat4, Vec2};
use skeleton_renderer::bone_sprite::Sprite;
use skeleton_renderer::config::RendererConfig;
use skeleton_renderer::core::{init_logging, RendererResult};
use skeleton_renderer::render::{DebugRecorder, PolygonSpriteBatch, TextureId};
use skeleton_renderer::skeleton::{
    Attachment, BlendMode, BoneData, RegionAttachment, Skeleton, SkeletonData, SlotData,
};
use skeleton_renderer::SkeletonRenderer;

fn demo_skeleton() -> SkeletonData {
    let mut data = SkeletonData::new("demo");
    let root = data.add_bone(BoneData::new("root", None).with_length(40.0));
    let arm = data.add_bone(
        BoneData::new("arm", Some(root))
            .with_position(40.0, 0.0)
            .with_length(30.0),
    );

    let body = data.add_slot(SlotData::new("body", root).with_attachment("body"));
    let glow = data.add_slot(
        SlotData::new("glow", arm)
            .with_attachment("glow")
            .with_blend_mode(BlendMode::Additive),
    );
    data.add_default_attachment(
        body,
        Attachment::Region(RegionAttachment::new("body", TextureId(1), 64.0, 96.0)),
    );
    data.add_default_attachment(
        glow,
        Attachment::Region(RegionAttachment::new("glow", TextureId(2), 32.0, 32.0)),
    );
    data
}

fn run() -> RendererResult<()> {
    let config = RendererConfig::from_env();
    init_logging(&config.logging);

    let mut renderer = SkeletonRenderer::new(Arc::new(demo_skeleton()), config.clone())?;
    renderer.node_mut().position = Vec2::new(320.0, 240.0);
    renderer.set_pose_driver(|skeleton: &mut Skeleton, _delta: f32| {
        if let Some(arm) = skeleton.find_bone("arm") {
            skeleton.bones[arm].rotation = (skeleton.time * 90.0) % 360.0;
        }
    });
    renderer.add_sprite_to_bone("arm", Box::new(Sprite::new(TextureId(3), 16.0, 16.0)))?;

    let mut batch = PolygonSpriteBatch::from_config(&config);
    let mut debug = DebugRecorder::new();
    for frame in 0..3 {
        batch.clear();
        debug.clear();
        renderer.update(1.0 / 60.0);
        let stats = renderer.draw(&mut batch, &Mat4::IDENTITY);
        renderer.draw_debug(&mut debug, &Mat4::IDENTITY);
        tracing::info!(
            target: "skeleton_renderer",
            "Frame {}: {} draw calls, {} vertices, {:?}",
            frame,
            batch.draw_calls().len(),
            batch.vertices().len(),
            stats
        );
    }

    let bounds = renderer.bounding_box();
    tracing::info!(target: "skeleton_renderer", "Bounding box: {:?}", bounds);
    Ok(())
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Skeleton renderer demo failed: {}", e);
        std::process::exit(1);
    }
}
