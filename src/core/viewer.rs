//! 查看器主入口
//!
//! 定义Viewer结构和逐帧运行循环。每帧的顺序固定：
//! 推进时钟 → 瓦片流系统 → 骨骼动画系统 → 读取调色板和瓦片。

use crate::animation::{
    skeleton_animation_system, AnimationClip, JointMatrixPalette, PoseService, Skeleton,
    SkeletonAnimationPlayer, Skin,
};
use crate::config::{LoggingConfig, ViewerConfig};
use crate::scene::{
    tile_stream_system, CameraState, TerrainScene, TerrainSceneFactory, TileGrid,
    TileStreamController, WorldTile,
};
use bevy_ecs::prelude::*;
use glam::Mat4;

use super::error::{ViewerError, ViewerResult};
use super::resources::{FpsCounter, Time};

/// 查看器
///
/// 持有ECS世界和每帧调度器。相机、时钟、帧率统计和瓦片网格都是世界中的资源，
/// 角色是带有 `SkeletonAnimationPlayer` 组件的实体。
pub struct Viewer {
    world: World,
    schedule: Schedule,
    config: ViewerConfig,
    character: Option<Entity>,
}

impl Viewer {
    /// 按配置创建查看器并构建初始瓦片网格
    pub fn new(config: ViewerConfig) -> ViewerResult<Self> {
        config.validate()?;

        let controller = TileStreamController::new(
            TerrainSceneFactory::new(config.world.seed),
            config.world.tile_size,
            config.world.grid_centre,
        )?;

        let mut world = World::new();
        world.insert_resource(Time::default());
        world.insert_resource(FpsCounter::default());
        world.insert_resource(CameraState::from_config(&config.camera));
        world.insert_resource(TileGrid::new(controller));

        let mut schedule = Schedule::default();
        schedule.add_systems(
            (
                tile_stream_system::<TerrainSceneFactory>,
                skeleton_animation_system,
            )
                .chain(),
        );

        tracing::info!(
            target: "viewer",
            tile_size = config.world.tile_size,
            seed = config.world.seed,
            "Viewer created"
        );

        Ok(Self {
            world,
            schedule,
            config,
            character: None,
        })
    }

    /// 初始化日志系统
    ///
    /// 配置tracing日志框架。设置了`RUST_LOG`环境变量时以它为准，
    /// 否则使用配置中的级别。重复调用是安全的。
    pub fn initialize_logging(config: &LoggingConfig) {
        if !config.log_to_console {
            return;
        }
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(config.level.as_directive()));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(config.show_targets)
            .try_init();
        tracing::info!(target: "viewer", "Viewer starting");
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    /// 生成角色实体，替换已有的角色
    ///
    /// 动画配置（速度、插值模式、初始片段、是否自动播放）在这里生效。
    pub fn spawn_character(
        &mut self,
        skeleton: Skeleton,
        skin: Skin,
        mut clips: Vec<AnimationClip>,
    ) -> ViewerResult<Entity> {
        let settings = &self.config.animation;
        if let Some(mode) = settings.interpolation {
            for clip in &mut clips {
                clip.set_interpolation(mode);
            }
        }

        let mut player = SkeletonAnimationPlayer::new(skeleton, skin, clips)?;
        PoseService::set_speed(&mut player, settings.playback_speed)?;
        if !player.clips.is_empty() {
            PoseService::select_clip(&mut player, settings.clip_index)?;
        }
        if !settings.play_on_start {
            PoseService::pause(&mut player);
        }

        tracing::info!(
            target: "viewer",
            joints = player.skin.joint_count(),
            clips = player.clips.len(),
            "Character spawned"
        );

        if let Some(previous) = self.character.take() {
            self.world.despawn(previous);
        }
        let entity = self.world.spawn(player).id();
        self.character = Some(entity);
        Ok(entity)
    }

    /// 从glTF文件加载角色（使用第一个蒙皮）
    #[cfg(feature = "gltf")]
    pub fn load_character<P: AsRef<std::path::Path>>(&mut self, path: P) -> ViewerResult<Entity> {
        let path = path.as_ref();
        let model = crate::animation::load_model(path)?;
        let skin = model.skins.into_iter().next().ok_or_else(|| {
            ViewerError::Asset(crate::core::error::AssetError::MissingSkin(
                path.display().to_string(),
            ))
        })?;
        self.spawn_character(model.skeleton, skin, model.clips)
    }

    /// 执行一帧
    ///
    /// 返回本帧结束时的帧率统计（如果统计窗口刚好结束）。
    /// 瓦片工厂失败时返回错误，网格保持平移前的状态，下一帧会重新尝试。
    pub fn step(&mut self, delta_seconds: f32) -> ViewerResult<Option<f32>> {
        self.world.resource_mut::<Time>().advance(delta_seconds);
        self.schedule.run(&mut self.world);

        let fps = self.world.resource_mut::<FpsCounter>().tick(delta_seconds);
        if let Some(fps) = fps {
            tracing::info!(target: "viewer", "Frames per second (FPS): {:.2}", fps);
        }

        if let Some(err) = self.world.resource::<TileGrid<TerrainSceneFactory>>().last_error.clone() {
            return Err(ViewerError::Tile(err));
        }
        Ok(fps)
    }

    /// 以固定步长运行若干帧，`script` 在每帧之前调整相机
    pub fn run_headless<F>(&mut self, frames: u32, delta_seconds: f32, mut script: F) -> ViewerResult<()>
    where
        F: FnMut(u32, &mut CameraState),
    {
        for frame in 0..frames {
            script(frame, &mut self.world.resource_mut::<CameraState>());
            self.step(delta_seconds)?;
        }

        let time = self.world.resource::<Time>();
        tracing::info!(
            target: "viewer",
            frames = time.frame,
            elapsed = time.elapsed_seconds,
            "Headless run finished"
        );
        Ok(())
    }

    pub fn camera(&self) -> &CameraState {
        self.world.resource::<CameraState>()
    }

    pub fn camera_mut(&mut self) -> Mut<'_, CameraState> {
        self.world.resource_mut::<CameraState>()
    }

    pub fn time(&self) -> &Time {
        self.world.resource::<Time>()
    }

    pub fn fps(&self) -> Option<f32> {
        self.world.resource::<FpsCounter>().last_fps()
    }

    pub fn character(&self) -> Option<&SkeletonAnimationPlayer> {
        self.character
            .and_then(|entity| self.world.get::<SkeletonAnimationPlayer>(entity))
    }

    pub fn character_mut(&mut self) -> Option<Mut<'_, SkeletonAnimationPlayer>> {
        self.character
            .and_then(|entity| self.world.get_mut::<SkeletonAnimationPlayer>(entity))
    }

    /// 当前的关节矩阵调色板
    pub fn palette(&self) -> Option<&JointMatrixPalette> {
        self.character().map(|player| &player.palette)
    }

    /// 取出自上次上传以来重建过的调色板
    pub fn take_palette_upload(&mut self) -> Option<Vec<Mat4>> {
        let mut player = self.character_mut()?;
        if !player.dirty {
            return None;
        }
        player.dirty = false;
        Some(player.palette.as_slice().to_vec())
    }

    pub fn grid(&self) -> &TileGrid<TerrainSceneFactory> {
        self.world.resource::<TileGrid<TerrainSceneFactory>>()
    }

    /// 当前的九个瓦片
    pub fn tiles(&self) -> impl Iterator<Item = &WorldTile<TerrainScene>> {
        self.grid().controller.tiles()
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::{
        AnimationSampler, ChannelProperty, InterpolationMode, NodeTransform, PlaybackState,
        SkeletonNode,
    };
    use crate::scene::{CameraMove, TILE_COUNT};
    use glam::Vec3;

    fn character() -> (Skeleton, Skin, Vec<AnimationClip>) {
        let skeleton = Skeleton::new(vec![
            SkeletonNode::new("root").with_children([1]),
            SkeletonNode::new("arm").with_transform(NodeTransform::from_translation(Vec3::X)),
        ])
        .unwrap();
        let skin = Skin::new(vec![0, 1], vec![Mat4::IDENTITY; 2]).unwrap();
        let mut clip = AnimationClip::new("wave");
        clip.add_track(
            0,
            ChannelProperty::Translation,
            AnimationSampler::vec3(
                vec![0.0, 1.0],
                vec![Vec3::ZERO, Vec3::new(0.0, 4.0, 0.0)],
                InterpolationMode::Linear,
            ),
        );
        (skeleton, skin, vec![clip])
    }

    #[test]
    fn test_viewer_starts_with_nine_tiles() {
        let viewer = Viewer::new(ViewerConfig::default()).unwrap();
        assert_eq!(viewer.tiles().count(), TILE_COUNT);
        assert!(viewer.palette().is_none());
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut config = ViewerConfig::default();
        config.world.tile_size = 3;
        assert!(matches!(Viewer::new(config), Err(ViewerError::Config(_))));
    }

    #[test]
    fn test_step_animates_character_with_playback_speed() {
        let mut viewer = Viewer::new(ViewerConfig::default()).unwrap();
        let (skeleton, skin, clips) = character();
        viewer.spawn_character(skeleton, skin, clips).unwrap();
        assert!(viewer.take_palette_upload().is_some());
        assert!(viewer.take_palette_upload().is_none());

        viewer.step(0.125).unwrap();
        let player = viewer.character().unwrap();
        // 默认播放速度 2.0
        assert!((player.clock - 0.25).abs() < 1e-6);
        let root = viewer.palette().unwrap().get(0).unwrap().w_axis.truncate();
        assert!((root - Vec3::new(0.0, 1.0, 0.0)).length() < 1e-5);
        assert!(viewer.take_palette_upload().is_some());
    }

    #[test]
    fn test_play_on_start_false_keeps_rest_pose() {
        let mut config = ViewerConfig::default();
        config.animation.play_on_start = false;
        let mut viewer = Viewer::new(config).unwrap();
        let (skeleton, skin, clips) = character();
        viewer.spawn_character(skeleton, skin, clips).unwrap();

        viewer.step(0.5).unwrap();
        let player = viewer.character().unwrap();
        assert_eq!(player.state, PlaybackState::Paused);
        assert_eq!(player.clock, 0.0);
    }

    #[test]
    fn test_clip_index_out_of_range_is_reported() {
        let mut config = ViewerConfig::default();
        config.animation.clip_index = 4;
        let mut viewer = Viewer::new(config).unwrap();
        let (skeleton, skin, clips) = character();
        let err = viewer.spawn_character(skeleton, skin, clips).unwrap_err();
        assert!(matches!(err, ViewerError::Animation(_)));
    }

    #[test]
    fn test_fly_through_streams_tiles() {
        let mut viewer = Viewer::new(ViewerConfig::default()).unwrap();
        // 沿 -Z 飞行 400 帧，每帧 20 个单位，跨过一条瓦片边界
        viewer
            .run_headless(400, 1.0 / 60.0, |_, camera| camera.move_camera(CameraMove::Forward))
            .unwrap();

        let grid = viewer.grid();
        assert_eq!(grid.controller.bounds().min_z, -9000);
        assert_eq!(grid.controller.factory().live(), TILE_COUNT);
        assert_eq!(viewer.tiles().count(), TILE_COUNT);
        assert_eq!(viewer.time().frame, 400);
        assert!(viewer.fps().is_some());
    }
}
