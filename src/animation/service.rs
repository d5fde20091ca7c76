//! 姿态更新服务层
//!
//! 遵循贫血模型，将每帧的动画业务逻辑封装在Service中：
//! 推进时钟 → 采样通道 → 重算全局变换 → 重建关节矩阵调色板。

use super::player::{PlaybackState, SkeletonAnimationPlayer};
use super::skin::SkinBinder;
use crate::core::error::{AnimationError, AnimationResult};
use glam::Mat4;

/// 姿态更新服务 - 封装骨骼动画业务逻辑
///
/// 遵循贫血模型设计原则：
/// - SkeletonAnimationPlayer (Component): 纯数据结构
/// - PoseService (Service): 封装业务逻辑
/// - skeleton_animation_system (System): 调度编排
pub struct PoseService;

impl PoseService {
    /// 开始播放（没有动画数据时保持 Idle）
    pub fn play(player: &mut SkeletonAnimationPlayer) {
        if player.current_clip().is_some() {
            player.state = PlaybackState::Playing;
        }
    }

    /// 暂停播放
    pub fn pause(player: &mut SkeletonAnimationPlayer) {
        if player.state == PlaybackState::Playing {
            player.state = PlaybackState::Paused;
        }
    }

    /// 在播放与暂停之间切换
    pub fn toggle(player: &mut SkeletonAnimationPlayer) {
        match player.state {
            PlaybackState::Playing => Self::pause(player),
            PlaybackState::Paused => Self::play(player),
            PlaybackState::Idle => {}
        }
    }

    /// 设置播放速度
    ///
    /// 速度必须是有限的非负数，否则保持原速度并返回错误。
    pub fn set_speed(player: &mut SkeletonAnimationPlayer, speed: f32) -> AnimationResult<()> {
        if !speed.is_finite() || speed < 0.0 {
            return Err(AnimationError::InvalidSpeed(speed));
        }
        player.speed = speed;
        Ok(())
    }

    /// 重置时钟（外部控制）
    pub fn reset_clock(player: &mut SkeletonAnimationPlayer) {
        player.clock = 0.0;
    }

    /// 切换当前动画片段
    pub fn select_clip(player: &mut SkeletonAnimationPlayer, index: usize) -> AnimationResult<()> {
        if index >= player.clips.len() {
            return Err(AnimationError::ClipOutOfRange {
                index,
                len: player.clips.len(),
            });
        }
        player.active_clip = Some(index);
        if player.state == PlaybackState::Idle {
            player.state = PlaybackState::Playing;
        }
        Ok(())
    }

    /// 更新动画状态（每帧调用）
    ///
    /// 仅在 `Playing` 状态下推进时钟并重建调色板，返回调色板是否被重建。
    pub fn tick(player: &mut SkeletonAnimationPlayer, delta_time: f32) -> bool {
        if player.state != PlaybackState::Playing {
            return false;
        }
        player.clock += delta_time * player.speed;
        Self::evaluate(player)
    }

    /// 在当前时钟下求值姿态
    ///
    /// 每个节点的工作变换从单位矩阵开始，按通道顺序右乘平移 / 旋转 / 缩放；
    /// 退化通道本帧视为空操作。
    pub fn evaluate(player: &mut SkeletonAnimationPlayer) -> bool {
        let SkeletonAnimationPlayer {
            skeleton,
            skin,
            clips,
            active_clip,
            clock,
            working_locals,
            global_transforms,
            palette,
            dirty,
            reported_channels,
            ..
        } = player;

        let Some(clip_index) = *active_clip else {
            return false;
        };
        let Some(clip) = clips.get(clip_index) else {
            return false;
        };

        working_locals.clear();
        working_locals.resize(skeleton.len(), Mat4::IDENTITY);

        for (channel_index, channel) in clip.channels().iter().enumerate() {
            let applied = clip
                .sample_channel(channel, *clock)
                .and_then(|value| {
                    working_locals
                        .get_mut(channel.target_node)
                        .map(|local| *local *= value.to_matrix())
                })
                .is_some();

            if !applied && reported_channels.insert((clip_index, channel_index)) {
                tracing::warn!(
                    target: "animation",
                    clip = %clip.name,
                    channel = channel_index,
                    node = channel.target_node,
                    "Skipping degenerate animation channel"
                );
            }
        }

        if let Err(e) =
            skeleton.compute_global_transforms(skin.root(), working_locals, global_transforms)
        {
            tracing::warn!(target: "animation", "Pose update failed: {}", e);
            return false;
        }
        if let Err(e) = SkinBinder::write_palette(skin, global_transforms, palette) {
            tracing::warn!(target: "animation", "Palette update failed: {}", e);
            return false;
        }

        *dirty = true;
        true
    }

    /// 当前片段内的播放进度 (0.0 - 1.0)
    pub fn progress(player: &SkeletonAnimationPlayer) -> f32 {
        match player.current_clip() {
            Some(clip) if clip.duration() > 0.0 => player.clock.rem_euclid(clip.duration()) / clip.duration(),
            _ => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::clip::{AnimationClip, ChannelProperty};
    use crate::animation::keyframe::{AnimationSampler, InterpolationMode};
    use crate::animation::skeleton::{NodeTransform, Skeleton, SkeletonNode};
    use crate::animation::skin::Skin;
    use glam::{Quat, Vec3};

    fn rig(clips: Vec<AnimationClip>) -> SkeletonAnimationPlayer {
        let skeleton = Skeleton::new(vec![
            SkeletonNode::new("hips").with_children([1]),
            SkeletonNode::new("spine")
                .with_transform(NodeTransform::from_translation(Vec3::new(0.0, 1.0, 0.0))),
        ])
        .unwrap();
        let skin = Skin::new(
            vec![0, 1],
            vec![
                Mat4::IDENTITY,
                Mat4::from_translation(Vec3::new(0.0, -1.0, 0.0)),
            ],
        )
        .unwrap();
        SkeletonAnimationPlayer::new(skeleton, skin, clips).unwrap()
    }

    fn slide() -> AnimationClip {
        let mut clip = AnimationClip::new("slide");
        clip.add_track(
            0,
            ChannelProperty::Translation,
            AnimationSampler::vec3(
                vec![0.0, 1.0, 2.0],
                vec![Vec3::ZERO, Vec3::new(4.0, 0.0, 0.0), Vec3::ZERO],
                InterpolationMode::Linear,
            ),
        );
        clip
    }

    #[test]
    fn test_idle_without_clips() {
        let mut player = rig(Vec::new());
        assert_eq!(player.state, PlaybackState::Idle);
        assert!(!PoseService::tick(&mut player, 1.0));
        assert_eq!(player.clock, 0.0);
        PoseService::play(&mut player);
        assert_eq!(player.state, PlaybackState::Idle);
    }

    #[test]
    fn test_rest_palette_has_zero_displacement() {
        let player = rig(Vec::new());
        for m in player.palette.as_slice() {
            assert!(m.abs_diff_eq(Mat4::IDENTITY, 1e-6));
        }
    }

    #[test]
    fn test_tick_advances_clock_with_speed() {
        let mut player = rig(vec![slide()]);
        PoseService::set_speed(&mut player, 2.0).unwrap();
        assert!(PoseService::tick(&mut player, 0.25));
        assert!((player.clock - 0.5).abs() < 1e-6);

        // 根节点平移通道：0.5 秒时在 (2,0,0)
        let root = player.global_transforms[0].w_axis.truncate();
        assert!((root - Vec3::new(2.0, 0.0, 0.0)).length() < 1e-5);
        // 未被通道触及的节点从单位矩阵开始，跟随根节点移动
        let spine = player.global_transforms[1].w_axis.truncate();
        assert!((spine - Vec3::new(2.0, 0.0, 0.0)).length() < 1e-5);
        assert!(player.dirty);
    }

    #[test]
    fn test_invalid_speed_is_rejected() {
        let mut player = rig(vec![slide()]);
        PoseService::set_speed(&mut player, 0.5).unwrap();
        for speed in [f32::NAN, f32::INFINITY, -1.0] {
            assert!(matches!(
                PoseService::set_speed(&mut player, speed),
                Err(AnimationError::InvalidSpeed(_))
            ));
        }
        assert_eq!(player.speed, 0.5);

        assert!(PoseService::tick(&mut player, 1.0));
        assert!((player.clock - 0.5).abs() < 1e-6);
        assert!(player.global_transforms[0].is_finite());
    }

    #[test]
    fn test_pause_freezes_clock() {
        let mut player = rig(vec![slide()]);
        PoseService::tick(&mut player, 0.5);
        PoseService::toggle(&mut player);
        assert_eq!(player.state, PlaybackState::Paused);
        assert!(!PoseService::tick(&mut player, 10.0));
        assert!((player.clock - 0.5).abs() < 1e-6);
        PoseService::toggle(&mut player);
        assert_eq!(player.state, PlaybackState::Playing);
    }

    #[test]
    fn test_channels_on_one_node_compose_in_order() {
        let mut clip = AnimationClip::new("trs");
        clip.add_track(
            0,
            ChannelProperty::Translation,
            AnimationSampler::vec3(
                vec![0.0, 1.0],
                vec![Vec3::new(5.0, 0.0, 0.0); 2],
                InterpolationMode::Step,
            ),
        );
        clip.add_track(
            0,
            ChannelProperty::Rotation,
            AnimationSampler::quat(
                vec![0.0, 1.0],
                vec![Quat::from_rotation_z(std::f32::consts::FRAC_PI_2); 2],
                InterpolationMode::Step,
            ),
        );
        clip.add_track(
            0,
            ChannelProperty::Scale,
            AnimationSampler::vec3(vec![0.0, 1.0], vec![Vec3::splat(2.0); 2], InterpolationMode::Step),
        );

        let mut player = rig(vec![clip]);
        PoseService::tick(&mut player, 0.1);
        let p = player.working_locals[0].transform_point3(Vec3::X);
        assert!((p - Vec3::new(5.0, 2.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn test_degenerate_channel_is_a_no_op() {
        let mut clip = slide();
        clip.add_track(
            1,
            ChannelProperty::Scale,
            AnimationSampler::vec3(vec![0.0], vec![Vec3::splat(9.0)], InterpolationMode::Linear),
        );
        clip.add_track(
            42,
            ChannelProperty::Scale,
            AnimationSampler::vec3(vec![0.0, 1.0], vec![Vec3::ONE; 2], InterpolationMode::Linear),
        );

        let mut player = rig(vec![clip]);
        assert!(PoseService::tick(&mut player, 0.5));
        assert_eq!(player.working_locals[1], Mat4::IDENTITY);
        assert_eq!(player.reported_channels.len(), 2);

        // 再次遇到时不重复报告
        PoseService::tick(&mut player, 0.5);
        assert_eq!(player.reported_channels.len(), 2);
    }

    #[test]
    fn test_select_clip_bounds() {
        let mut player = rig(vec![slide()]);
        assert!(PoseService::select_clip(&mut player, 0).is_ok());
        assert_eq!(
            PoseService::select_clip(&mut player, 3),
            Err(AnimationError::ClipOutOfRange { index: 3, len: 1 })
        );
    }

    #[test]
    fn test_progress_wraps() {
        let mut player = rig(vec![slide()]);
        PoseService::tick(&mut player, 2.5);
        assert!((PoseService::progress(&player) - 0.25).abs() < 1e-6);
        PoseService::reset_clock(&mut player);
        assert_eq!(PoseService::progress(&player), 0.0);
    }
}
