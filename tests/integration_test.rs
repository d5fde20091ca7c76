use anyhow::Result;
use bevy_ecs::prelude::*;
use glam::{Mat4, Quat, Vec3};
use skyisle::animation::*;
use skyisle::config::ViewerConfig;
use skyisle::core::{Time, Viewer};
use skyisle::scene::*;

/// 三节点手臂：肩 → 肘 → 腕
fn arm() -> Result<(Skeleton, Skin)> {
    let skeleton = Skeleton::new(vec![
        SkeletonNode::new("shoulder").with_children([1]),
        SkeletonNode::new("elbow")
            .with_transform(NodeTransform::from_translation(Vec3::new(2.0, 0.0, 0.0)))
            .with_children([2]),
        SkeletonNode::new("wrist")
            .with_transform(NodeTransform::from_translation(Vec3::new(2.0, 0.0, 0.0))),
    ])?;

    // 逆绑定矩阵取静止姿态全局变换的逆
    let rest = skeleton.global_transforms(0, &skeleton.local_transforms())?;
    let inverse_binds = rest.iter().map(Mat4::inverse).collect();
    let skin = Skin::new(vec![0, 1, 2], inverse_binds)?;
    Ok((skeleton, skin))
}

fn swing() -> AnimationClip {
    let mut clip = AnimationClip::new("swing");
    clip.add_track(
        0,
        ChannelProperty::Rotation,
        AnimationSampler::quat(
            vec![0.0, 1.0, 2.0],
            vec![
                Quat::IDENTITY,
                Quat::from_rotation_z(std::f32::consts::FRAC_PI_2),
                Quat::IDENTITY,
            ],
            InterpolationMode::Linear,
        ),
    );
    clip
}

#[test]
fn test_rest_pose_palette_is_identity() -> Result<()> {
    let (skeleton, skin) = arm()?;
    let binding = SkinBinder::bind(&skeleton, &skin)?;
    for joint in binding.palette.as_slice() {
        assert!(joint.abs_diff_eq(Mat4::IDENTITY, 1e-5));
    }
    Ok(())
}

#[test]
fn test_animation_system_in_world() -> Result<()> {
    let (skeleton, skin) = arm()?;
    let player = SkeletonAnimationPlayer::new(skeleton, skin, vec![swing()])?;

    let mut world = World::new();
    let mut time = Time::default();
    time.advance(1.0);
    world.insert_resource(time);
    let entity = world.spawn(player).id();

    let mut schedule = Schedule::default();
    schedule.add_systems(skeleton_animation_system);
    schedule.run(&mut world);

    let player = world
        .get::<SkeletonAnimationPlayer>(entity)
        .ok_or_else(|| anyhow::anyhow!("player missing"))?;
    // 1 秒时肩部旋转 90°，根节点的调色板矩阵把 +X 转到 +Y
    let rotated = player.palette.as_slice()[0].transform_vector3(Vec3::X);
    assert!((rotated - Vec3::Y).length() < 1e-5);
    assert_eq!(player.state, PlaybackState::Playing);
    Ok(())
}

#[test]
fn test_looping_matches_first_cycle() -> Result<()> {
    let (skeleton, skin) = arm()?;
    let mut a = SkeletonAnimationPlayer::new(skeleton.clone(), skin.clone(), vec![swing()])?;
    let mut b = SkeletonAnimationPlayer::new(skeleton, skin, vec![swing()])?;

    PoseService::tick(&mut a, 0.5);
    PoseService::tick(&mut b, 2.5);
    for (x, y) in a.palette.as_slice().iter().zip(b.palette.as_slice()) {
        assert!(x.abs_diff_eq(*y, 1e-5));
    }
    Ok(())
}

#[test]
fn test_viewer_frame_loop() -> Result<()> {
    let mut config = ViewerConfig::default();
    config.camera.movement_speed = 100.0;
    let mut viewer = Viewer::new(config)?;

    let (skeleton, skin) = arm()?;
    viewer.spawn_character(skeleton, skin, vec![swing()])?;

    let mut shifts = 0;
    let mut last_centre = viewer.grid().controller.centre();
    for _ in 0..200 {
        viewer.camera_mut().move_camera(CameraMove::Right);
        viewer.step(1.0 / 60.0)?;

        let centre = viewer.grid().controller.centre();
        if centre != last_centre {
            shifts += 1;
            last_centre = centre;
        }
        assert_eq!(viewer.tiles().count(), TILE_COUNT);
        assert_eq!(viewer.palette().map(|p| p.len()), Some(3));
    }

    // 向右飞行 20000 个单位：越过 3000、9000、15000 三条边界
    assert_eq!(shifts, 3);
    assert_eq!(viewer.grid().controller.centre(), TileCoord::new(18000, 0));
    Ok(())
}

#[test]
fn test_grid_survives_a_failing_factory() -> Result<()> {
    struct Flaky {
        builds: usize,
    }

    impl TileFactory for Flaky {
        type Tile = TileCoord;
        type Error = &'static str;

        fn build(&mut self, centre: TileCoord) -> Result<TileCoord, &'static str> {
            self.builds += 1;
            if self.builds == 11 {
                return Err("out of memory");
            }
            Ok(centre)
        }

        fn destroy(&mut self, _tile: TileCoord) {}
    }

    let mut controller = TileStreamController::new(Flaky { builds: 0 }, 6000, TileCoord::new(0, 0))?;
    let err = controller.update_position(0.0, 3500.0).unwrap_err();
    assert!(err.to_string().contains("out of memory"));
    assert!(controller.is_intact());
    assert_eq!(controller.bounds().max_z, 3000);

    assert_eq!(
        controller.update_position(0.0, 3500.0)?,
        Some(ShiftDirection::PositiveZ)
    );
    assert_eq!(controller.centre(), TileCoord::new(0, 6000));
    Ok(())
}

#[cfg(feature = "gltf")]
#[test]
fn test_missing_model_fails_to_load() -> Result<()> {
    let mut viewer = Viewer::new(ViewerConfig::default())?;
    assert!(viewer.load_character("missing/bot.gltf").is_err());
    assert!(viewer.palette().is_none());
    Ok(())
}
