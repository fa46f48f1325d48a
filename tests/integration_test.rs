use std::cell::Cell;
use std::rc::Rc;
use std::sync::Arc;

use glam::{Mat4, Vec2};
use skeleton_renderer::bone_sprite::{BoneSpriteError, Sprite, SpriteVisual};
use skeleton_renderer::config::RendererConfig;
use skeleton_renderer::render::{
    BlendFunc, Color4B, DebugCommand, DebugRecorder, PolygonSpriteBatch, TextureId,
};
use skeleton_renderer::skeleton::{
    Attachment, BlendMode, BoneData, MeshAttachment, RegionAttachment, Skeleton, SkeletonData,
    SlotData,
};
use skeleton_renderer::{RendererError, SkeletonRenderer};

fn hero() -> Arc<SkeletonData> {
    let mut data = SkeletonData::new("hero");
    let root = data.add_bone(BoneData::new("root", None).with_length(50.0));
    let arm = data.add_bone(
        BoneData::new("arm", Some(root))
            .with_position(50.0, 0.0)
            .with_length(20.0),
    );

    let body = data.add_slot(SlotData::new("body", root).with_attachment("body"));
    let cape = data.add_slot(SlotData::new("cape", root).with_attachment("cape"));
    let hand = data.add_slot(
        SlotData::new("hand", arm)
            .with_attachment("hand")
            .with_blend_mode(BlendMode::Additive),
    );
    data.add_default_attachment(
        body,
        Attachment::Region(RegionAttachment::new("body", TextureId(1), 20.0, 40.0)),
    );
    data.add_default_attachment(
        cape,
        Attachment::Mesh(MeshAttachment::new(
            "cape",
            TextureId(1),
            vec![0.0, 0.0, 10.0, 0.0, 10.0, -30.0],
            vec![0.0, 0.0, 1.0, 0.0, 1.0, 1.0],
            vec![0, 1, 2],
        )),
    );
    data.add_default_attachment(
        hand,
        Attachment::Region(RegionAttachment::new("hand", TextureId(2), 8.0, 8.0)),
    );
    Arc::new(data)
}

#[test]
fn test_full_frame() -> anyhow::Result<()> {
    let mut renderer = SkeletonRenderer::new(hero(), RendererConfig::default())?;
    renderer.node_mut().position = Vec2::new(200.0, 100.0);
    renderer.set_pose_driver(|skeleton: &mut Skeleton, delta: f32| {
        skeleton.bones[1].rotation += 90.0 * delta;
    });
    renderer
        .add_sprite_to_bone("arm", Box::new(Sprite::new(TextureId(5), 4.0, 4.0)))
        .map_err(RendererError::from)?;

    let mut batch = PolygonSpriteBatch::new(2000);
    renderer.update(1.0);
    let stats = renderer.draw(&mut batch, &Mat4::IDENTITY);

    assert_eq!(stats.slots_drawn, 3);
    assert_eq!(stats.bone_sprites_drawn, 1);
    assert_eq!(stats.blend_switches, 2);

    // body + cape 合并为一次，hand（Additive），精灵单独一次
    let calls = batch.draw_calls();
    assert_eq!(calls.len(), 3);
    assert_eq!(calls[0].texture, TextureId(1));
    assert_eq!(calls[0].index_count, 9);
    assert_eq!(calls[1].texture, TextureId(2));
    assert_eq!(calls[2].texture, TextureId(5));
    assert_eq!(calls[2].blend_func, BlendFunc::ALPHA_PREMULTIPLIED);

    // 手臂旋转 90 度，手的区域中心在 (50, 0)
    let hand = renderer.find_slot("hand").unwrap().corners;
    let center = (hand.left_bottom + hand.right_top) * 0.5;
    assert!((center - Vec2::new(250.0, 100.0)).length() < 1e-3);
    Ok(())
}

#[test]
fn test_non_region_slot_binding_keeps_ownership() {
    let mut renderer = SkeletonRenderer::with_data(hero()).unwrap();
    let sprite = Sprite::new(TextureId(5), 4.0, 4.0).with_color([1, 2, 3], 4);

    let rejected = renderer
        .add_sprite_to_slot("cape", Box::new(sprite.clone()), true)
        .unwrap_err();
    assert_eq!(rejected.error, BoneSpriteError::NotRegionSlot("cape".into()));

    let returned = rejected.into_sprite();
    assert_eq!(returned.color(), Color4B::new(1, 2, 3, 4));
    assert!(renderer.sprite_for_bone("cape").is_none());
}

fn bind_missing_bone(renderer: &mut SkeletonRenderer) -> anyhow::Result<()> {
    renderer
        .add_sprite_to_bone("tail", Box::new(Sprite::new(TextureId(5), 4.0, 4.0)))
        .map_err(RendererError::from)?;
    Ok(())
}

#[test]
fn test_failed_binding_propagates_through_anyhow() {
    let mut renderer = SkeletonRenderer::with_data(hero()).unwrap();
    let err = bind_missing_bone(&mut renderer).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<RendererError>(),
        Some(RendererError::BoneSprite(BoneSpriteError::BoneNotFound(name))) if name == "tail"
    ));
    assert!(renderer.bone_sprites().is_empty());
}

#[derive(Debug)]
struct TrackedSprite {
    inner: Sprite,
    live: Rc<Cell<i32>>,
}

impl TrackedSprite {
    fn boxed(live: &Rc<Cell<i32>>) -> Box<dyn SpriteVisual> {
        live.set(live.get() + 1);
        Box::new(Self {
            inner: Sprite::new(TextureId(5), 2.0, 2.0),
            live: Rc::clone(live),
        })
    }
}

impl Drop for TrackedSprite {
    fn drop(&mut self) {
        self.live.set(self.live.get() - 1);
    }
}

impl SpriteVisual for TrackedSprite {
    fn texture(&self) -> TextureId {
        self.inner.texture
    }
    fn content_size(&self) -> Vec2 {
        self.inner.content_size
    }
    fn scale(&self) -> Vec2 {
        self.inner.scale
    }
    fn rotation(&self) -> f32 {
        self.inner.rotation
    }
    fn position(&self) -> Vec2 {
        self.inner.position
    }
    fn set_position(&mut self, position: Vec2) {
        self.inner.position = position;
    }
    fn color(&self) -> Color4B {
        self.inner.color()
    }
}

#[test]
fn test_rebinding_does_not_leak() {
    let live = Rc::new(Cell::new(0));
    {
        let mut renderer = SkeletonRenderer::with_data(hero()).unwrap();
        for _ in 0..10 {
            renderer
                .add_sprite_to_bone("arm", TrackedSprite::boxed(&live))
                .unwrap();
        }
        renderer
            .add_sprite_to_slot("body", TrackedSprite::boxed(&live), false)
            .unwrap();
        assert_eq!(live.get(), 2);
        assert_eq!(renderer.bone_sprites().len(), 2);
    }
    assert_eq!(live.get(), 0);
}

#[test]
fn test_debug_overlay_follows_flags() {
    let config = RendererConfig::from_toml_str(
        r#"
            premultiplied_alpha = true
            max_world_vertices = 1000
            batch_capacity = 2000
            time_scale = 1.0

            [blend_func]
            src = "One"
            dst = "OneMinusSrcAlpha"

            [debug]
            slots = false
            bones = true
        "#,
    )
    .unwrap();
    let renderer = SkeletonRenderer::new(hero(), config).unwrap();

    let mut recorder = DebugRecorder::new();
    renderer.draw_debug(&mut recorder, &Mat4::IDENTITY);
    let lines = recorder
        .commands
        .iter()
        .filter(|c| matches!(c, DebugCommand::Line { .. }))
        .count();
    let polys = recorder
        .commands
        .iter()
        .filter(|c| matches!(c, DebugCommand::Poly { .. }))
        .count();
    assert_eq!(lines, 2);
    assert_eq!(polys, 0);
}

#[test]
fn test_straight_alpha_keeps_rgb() {
    let config = RendererConfig {
        premultiplied_alpha: false,
        blend_func: BlendFunc::ALPHA_NON_PREMULTIPLIED,
        ..Default::default()
    };
    let mut renderer = SkeletonRenderer::new(hero(), config).unwrap();
    renderer.node_mut().opacity = 128;

    let mut batch = PolygonSpriteBatch::new(2000);
    renderer.draw(&mut batch, &Mat4::IDENTITY);

    let first = batch.vertices()[0];
    assert_eq!(first.color[0], 1.0);
    assert!((first.color[3] - 128.0 / 255.0).abs() < 1e-6);
    assert_eq!(
        batch.draw_calls()[0].blend_func,
        BlendFunc::ALPHA_NON_PREMULTIPLIED
    );
}
