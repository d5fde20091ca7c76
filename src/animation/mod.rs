//! 动画系统模块
//!
//! 提供骨骼层级、蒙皮绑定、关键帧采样和每帧姿态更新。
//!
//! ## 功能特性
//!
//! - 扁平数组存储的节点层级，局部 / 全局变换计算
//! - 蒙皮绑定与关节矩阵调色板
//! - 关键帧采样（二分查找区间、循环播放、线性 / 阶梯插值）
//! - 骨骼动画播放器与姿态更新服务
//!
//! ## 使用示例
//!
//! ```rust
//! use skyisle::animation::{
//!     AnimationClip, AnimationSampler, ChannelProperty, InterpolationMode, NodeTransform,
//!     PoseService, Skeleton, SkeletonAnimationPlayer, SkeletonNode, Skin,
//! };
//! use glam::{Mat4, Vec3};
//!
//! // 创建骨骼
//! let skeleton = Skeleton::new(vec![
//!     SkeletonNode::new("root").with_children([1]),
//!     SkeletonNode::new("arm").with_transform(NodeTransform::from_translation(Vec3::X)),
//! ])
//! .unwrap();
//! let skin = Skin::new(vec![0, 1], vec![Mat4::IDENTITY; 2]).unwrap();
//!
//! // 创建动画片段
//! let mut clip = AnimationClip::new("bob");
//! clip.add_track(
//!     0,
//!     ChannelProperty::Translation,
//!     AnimationSampler::vec3(vec![0.0, 1.0], vec![Vec3::ZERO, Vec3::Y], InterpolationMode::Linear),
//! );
//!
//! // 播放
//! let mut player = SkeletonAnimationPlayer::new(skeleton, skin, vec![clip]).unwrap();
//! PoseService::tick(&mut player, 0.5);
//! assert_eq!(player.palette.len(), 2);
//! ```

pub mod clip;
#[cfg(feature = "gltf")]
pub mod gltf_import;
pub mod keyframe;
pub mod player;
pub mod service;
pub mod skeleton;
pub mod skin;

pub use clip::{AnimationChannel, AnimationClip, ChannelProperty, ChannelValue};
pub use keyframe::{
    find_interval, AnimationSampler, InterpolationMode, SamplePosition, SamplerDefect,
    SamplerOutput,
};
pub use player::{skeleton_animation_system, PlaybackState, SkeletonAnimationPlayer};
pub use service::PoseService;
pub use skeleton::{NodeTransform, Skeleton, SkeletonNode};
pub use skin::{JointMatrixPalette, Skin, SkinBinder, SkinBinding};

// GLTF 导入（需要启用 gltf feature）
#[cfg(feature = "gltf")]
pub use gltf_import::{load_model, ModelData};
