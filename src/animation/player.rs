use super::clip::AnimationClip;
use super::skeleton::Skeleton;
use super::skin::{JointMatrixPalette, Skin, SkinBinder};
use crate::core::error::SkeletonResult;
use crate::core::resources::Time;
use bevy_ecs::prelude::*;
use glam::Mat4;
use std::collections::HashSet;

/// 播放状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    /// 没有动画数据，保持静止姿态
    Idle,
    /// 持续播放（循环）
    Playing,
    /// 暂停，时钟不前进
    Paused,
}

/// 骨骼动画播放器组件 (贫血模型 - 纯数据结构)
///
/// 遵循贫血模型设计原则：
/// - SkeletonAnimationPlayer (Component): 纯数据结构 ← 本文件
/// - PoseService (Service): 业务逻辑封装 → service.rs
/// - skeleton_animation_system (System): 系统调度编排
///
/// ```rust
/// use skyisle::animation::{PoseService, SkeletonAnimationPlayer};
/// # use skyisle::animation::{Skeleton, SkeletonNode, Skin};
/// # let skeleton = Skeleton::new(vec![SkeletonNode::new("root")]).unwrap();
/// # let skin = Skin::new(vec![0], vec![glam::Mat4::IDENTITY]).unwrap();
///
/// let mut player = SkeletonAnimationPlayer::new(skeleton, skin, Vec::new()).unwrap();
/// PoseService::tick(&mut player, 0.016);
/// assert_eq!(player.palette.len(), 1);
/// ```
#[derive(Component, Debug)]
pub struct SkeletonAnimationPlayer {
    /// 骨骼层级
    pub skeleton: Skeleton,
    /// 蒙皮（逆绑定矩阵不随帧变化）
    pub skin: Skin,
    /// 已加载的动画片段
    pub clips: Vec<AnimationClip>,
    /// 当前播放的片段索引
    pub active_clip: Option<usize>,
    /// 动画时钟（秒），单调累加
    pub clock: f32,
    /// 播放速度 (1.0 = 正常速度)
    pub speed: f32,
    /// 播放状态
    pub state: PlaybackState,
    /// 每帧的工作局部变换（按节点索引）
    pub working_locals: Vec<Mat4>,
    /// 全局变换（按节点索引）
    pub global_transforms: Vec<Mat4>,
    /// 关节矩阵调色板
    pub palette: JointMatrixPalette,
    /// 调色板自上次上传后是否被重建
    pub dirty: bool,
    /// 已报告过的退化通道 (片段, 通道)
    pub(crate) reported_channels: HashSet<(usize, usize)>,
}

impl SkeletonAnimationPlayer {
    /// 创建播放器并计算静止姿态调色板
    ///
    /// 有动画片段时进入 `Playing`，否则停留在 `Idle`。
    pub fn new(skeleton: Skeleton, skin: Skin, clips: Vec<AnimationClip>) -> SkeletonResult<Self> {
        let binding = SkinBinder::bind(&skeleton, &skin)?;
        let (active_clip, state) = if clips.is_empty() {
            (None, PlaybackState::Idle)
        } else {
            (Some(0), PlaybackState::Playing)
        };

        Ok(Self {
            working_locals: vec![Mat4::IDENTITY; skeleton.len()],
            global_transforms: binding.global_joint_transforms,
            palette: binding.palette,
            skeleton,
            skin,
            clips,
            active_clip,
            clock: 0.0,
            speed: 1.0,
            state,
            dirty: true,
            reported_channels: HashSet::new(),
        })
    }

    /// 当前播放的片段
    pub fn current_clip(&self) -> Option<&AnimationClip> {
        self.active_clip.and_then(|index| self.clips.get(index))
    }
}

/// 骨骼动画系统 - 推进所有播放器并重建调色板
///
/// 使用 PoseService 执行业务逻辑
pub fn skeleton_animation_system(time: Res<Time>, mut query: Query<&mut SkeletonAnimationPlayer>) {
    for mut player in query.iter_mut() {
        super::service::PoseService::tick(&mut player, time.delta_seconds);
    }
}
