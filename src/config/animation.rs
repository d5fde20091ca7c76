use super::{ConfigError, ConfigResult};
use crate::animation::InterpolationMode;
use crate::impl_default;
use serde::{Deserialize, Serialize};

/// 动画配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationConfig {
    /// 播放速度倍率
    pub playback_speed: f32,

    /// 加载后立即播放
    pub play_on_start: bool,

    /// 覆盖片段的插值模式（None 表示保留导入时的模式）
    pub interpolation: Option<InterpolationMode>,

    /// 初始播放的片段
    pub clip_index: usize,
}

impl_default!(AnimationConfig {
    playback_speed: 2.0,
    play_on_start: true,
    interpolation: None,
    clip_index: 0,
});

impl AnimationConfig {
    /// 验证配置
    pub fn validate(&self) -> ConfigResult<()> {
        if !self.playback_speed.is_finite() || self.playback_speed < 0.0 {
            return Err(ConfigError::ValidationError(format!(
                "Invalid playback speed: {}",
                self.playback_speed
            )));
        }
        Ok(())
    }
}
