use super::{ConfigError, ConfigResult};
use crate::impl_default;
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// 相机配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// 初始位置
    pub eye: Vec3,

    /// 初始注视点
    pub look_at: Vec3,

    /// 每次平移的距离
    pub movement_speed: f32,

    /// 每次转动的角度（弧度）
    pub rotation_speed: f32,

    /// 转动后注视点到相机的距离
    pub view_distance: f32,

    /// 垂直视野（度）
    pub fov_degrees: f32,

    pub z_near: f32,
    pub z_far: f32,
}

impl_default!(CameraConfig {
    eye: Vec3::new(0.0, 0.0, 2500.0),
    look_at: Vec3::ZERO,
    movement_speed: 20.0,
    rotation_speed: 0.05,
    view_distance: 3000.0,
    fov_degrees: 45.0,
    z_near: 0.1,
    z_far: 6000.0,
});

impl CameraConfig {
    /// 验证配置
    pub fn validate(&self) -> ConfigResult<()> {
        if self.fov_degrees <= 0.0 || self.fov_degrees >= 180.0 {
            return Err(ConfigError::ValidationError(format!(
                "Invalid field of view: {}",
                self.fov_degrees
            )));
        }
        if self.z_near <= 0.0 || self.z_far <= self.z_near {
            return Err(ConfigError::ValidationError(
                "Clip planes must satisfy 0 < near < far".to_string(),
            ));
        }
        if self.movement_speed < 0.0 || self.rotation_speed < 0.0 {
            return Err(ConfigError::ValidationError(
                "Camera speeds must not be negative".to_string(),
            ));
        }
        Ok(())
    }
}
