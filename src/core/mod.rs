//! 核心模块
//!
//! 包含查看器的核心功能：
//! - `viewer` - 查看器入口和逐帧运行循环
//! - `resources` - ECS资源定义
//! - `error` - 错误类型定义
//! - `macros` - 配置结构体的样板宏

pub mod error;
pub mod resources;
pub mod viewer;
#[macro_use]
pub mod macros;

// 重新导出错误类型
pub use error::{
    AnimationError, AnimationResult, AssetError, AssetResult, SkeletonError, SkeletonResult,
    TileError, TileResult, ViewerError, ViewerResult,
};

// 重新导出主要类型
pub use resources::{FpsCounter, Time};
pub use viewer::Viewer;
