//! 统一错误处理模块
//!
//! 提供查看器范围内的统一错误类型定义
//!
//! ## 错误类型分层
//!
//! - **加载期错误** (`SkeletonError`, `AnimationError`, `AssetError`): 输入数据损坏，加载时一次性报告
//! - **运行期错误** (`TileError`): 瓦片工厂失败，返回给调用者，网格保持完整
//! - **配置错误** (`config::ConfigError`): 配置文件读取、解析与验证
//!
//! `ViewerError` 汇总以上所有错误。

use crate::animation::keyframe::SamplerDefect;
use crate::config::ConfigError;
use crate::scene::tiles::TileCoord;
use thiserror::Error;

/// 查看器顶层错误类型
#[derive(Error, Debug)]
pub enum ViewerError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Skeleton error: {0}")]
    Skeleton(#[from] SkeletonError),

    #[error("Animation error: {0}")]
    Animation(#[from] AnimationError),

    #[error("Tile error: {0}")]
    Tile(#[from] TileError),

    #[error("Asset error: {0}")]
    Asset(#[from] AssetError),

    #[error("General error: {0}")]
    General(String),
}

/// 骨骼层级与蒙皮错误（加载期致命）
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SkeletonError {
    #[error("Node index {node} out of range (skeleton has {len} nodes)")]
    NodeOutOfRange { node: usize, len: usize },

    #[error("Node {parent} lists child {child}, but the skeleton has only {len} nodes")]
    ChildOutOfRange { parent: usize, child: usize, len: usize },

    #[error("Node {node} has two parents ({first} and {second})")]
    MultipleParents {
        node: usize,
        first: usize,
        second: usize,
    },

    #[error("Node {node} is part of a parent cycle")]
    Cycle { node: usize },

    #[error("Skin has {joints} joints but {inverse_bind_matrices} inverse bind matrices")]
    JointCountMismatch {
        joints: usize,
        inverse_bind_matrices: usize,
    },

    #[error("Skin has no joints")]
    EmptySkin,

    #[error("Joint {joint} references node {node}, but the skeleton has only {len} nodes")]
    JointOutOfRange { joint: usize, node: usize, len: usize },

    #[error("Transform buffer holds {actual} matrices, expected {expected}")]
    BufferSize { expected: usize, actual: usize },
}

/// 动画片段结构错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnimationError {
    #[error("Channel {channel} uses sampler {sampler}, but the clip has only {len} samplers")]
    SamplerOutOfRange {
        channel: usize,
        sampler: usize,
        len: usize,
    },

    #[error("Channel {channel} targets node {node}, but the skeleton has only {len} nodes")]
    TargetOutOfRange {
        channel: usize,
        node: usize,
        len: usize,
    },

    #[error("Sampler {sampler} is degenerate: {defect}")]
    Degenerate { sampler: usize, defect: SamplerDefect },

    #[error("Channel {channel} output type does not match its target property")]
    PropertyMismatch { channel: usize },

    #[error("Clip index {index} out of range ({len} clips loaded)")]
    ClipOutOfRange { index: usize, len: usize },

    #[error("Invalid playback speed: {0}")]
    InvalidSpeed(f32),
}

/// 瓦片流式加载错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TileError {
    #[error("Tile size must be a positive even number, got {0}")]
    InvalidTileSize(i64),

    #[error("Failed to build tile at {centre}: {reason}")]
    Build { centre: TileCoord, reason: String },

    #[error("Failed to restore tile at {centre} after a failed shift: {reason}")]
    Rollback { centre: TileCoord, reason: String },
}

/// 资源加载错误
#[derive(Error, Debug)]
pub enum AssetError {
    #[error("Failed to import model: {path}, reason: {reason}")]
    Import { path: String, reason: String },

    #[error("Model has no skin: {0}")]
    MissingSkin(String),

    #[error("Invalid model data: {0}")]
    InvalidData(#[from] SkeletonError),
}

pub type ViewerResult<T> = Result<T, ViewerError>;
pub type SkeletonResult<T> = Result<T, SkeletonError>;
pub type AnimationResult<T> = Result<T, AnimationError>;
pub type TileResult<T> = Result<T, TileError>;
pub type AssetResult<T> = Result<T, AssetError>;
