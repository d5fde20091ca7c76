//! 飞行相机
//!
//! 相机状态作为显式的 ECS 资源传递给每帧更新和瓦片控制器，不使用全局可变状态。

use crate::config::CameraConfig;
use bevy_ecs::prelude::*;
use glam::{Mat4, Vec3};

/// 平移方向
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraMove {
    Forward,
    Backward,
    Left,
    Right,
    Up,
    Down,
}

/// 视角转动方向
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Turn {
    PitchUp,
    PitchDown,
    YawLeft,
    YawRight,
}

/// 俯仰角限制（弧度）
pub const MAX_POLAR: f32 = 1.5;

/// 相机状态
#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct CameraState {
    /// 相机位置
    pub eye: Vec3,
    /// 注视点
    pub look_at: Vec3,
    /// 上方向
    pub up: Vec3,
    /// 方位角（弧度）
    pub azimuth: f32,
    /// 俯仰角（弧度），限制在 ±`MAX_POLAR`
    pub polar: f32,
    /// 转动后注视点到相机的距离
    pub view_distance: f32,
    /// 每次平移的距离
    pub movement_speed: f32,
    /// 每次转动的角度（弧度）
    pub rotation_speed: f32,
    /// 垂直视野（度）
    pub fov_degrees: f32,
    pub z_near: f32,
    pub z_far: f32,
}

impl Default for CameraState {
    fn default() -> Self {
        Self::from_config(&CameraConfig::default())
    }
}

impl CameraState {
    /// 按配置创建相机，方位角和俯仰角由初始视线方向推出
    pub fn from_config(config: &CameraConfig) -> Self {
        let direction = (config.look_at - config.eye).normalize_or_zero();
        Self {
            eye: config.eye,
            look_at: config.look_at,
            up: Vec3::Y,
            azimuth: direction.z.atan2(direction.x),
            polar: direction.y.clamp(-1.0, 1.0).asin().clamp(-MAX_POLAR, MAX_POLAR),
            view_distance: config.view_distance,
            movement_speed: config.movement_speed,
            rotation_speed: config.rotation_speed,
            fov_degrees: config.fov_degrees,
            z_near: config.z_near,
            z_far: config.z_far,
        }
    }

    /// 朝向注视点的单位向量
    pub fn forward(&self) -> Vec3 {
        (self.look_at - self.eye).normalize_or_zero()
    }

    /// 右方向单位向量
    pub fn right(&self) -> Vec3 {
        self.forward().cross(self.up).normalize_or_zero()
    }

    /// 平移相机，位置与注视点一起移动
    pub fn move_camera(&mut self, movement: CameraMove) {
        let step = match movement {
            CameraMove::Forward => self.forward(),
            CameraMove::Backward => -self.forward(),
            CameraMove::Left => -self.right(),
            CameraMove::Right => self.right(),
            CameraMove::Up => self.up,
            CameraMove::Down => -self.up,
        } * self.movement_speed;

        self.eye += step;
        self.look_at += step;
    }

    /// 转动视角并重新计算注视点
    pub fn rotate(&mut self, turn: Turn) {
        match turn {
            Turn::PitchUp => self.polar = (self.polar + self.rotation_speed).min(MAX_POLAR),
            Turn::PitchDown => self.polar = (self.polar - self.rotation_speed).max(-MAX_POLAR),
            Turn::YawLeft => self.azimuth -= self.rotation_speed,
            Turn::YawRight => self.azimuth += self.rotation_speed,
        }

        let (sin_p, cos_p) = self.polar.sin_cos();
        let (sin_a, cos_a) = self.azimuth.sin_cos();
        self.look_at = self.eye + self.view_distance * Vec3::new(cos_p * cos_a, sin_p, cos_p * sin_a);
    }

    /// 观察矩阵
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.look_at, self.up)
    }

    /// 透视投影矩阵
    pub fn projection_matrix(&self, aspect_ratio: f32) -> Mat4 {
        Mat4::perspective_rh_gl(
            self.fov_degrees.to_radians(),
            aspect_ratio,
            self.z_near,
            self.z_far,
        )
    }

    pub fn view_projection(&self, aspect_ratio: f32) -> Mat4 {
        self.projection_matrix(aspect_ratio) * self.view_matrix()
    }

    /// 天空盒使用的观察投影矩阵（去掉平移）
    pub fn skybox_view_projection(&self, aspect_ratio: f32) -> Mat4 {
        let view = self.view_matrix();
        let rotation_only = Mat4::from_mat3(glam::Mat3::from_mat4(view));
        self.projection_matrix(aspect_ratio) * rotation_only
    }
}
