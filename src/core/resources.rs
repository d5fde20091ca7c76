//! 核心资源类型
//!
//! 定义查看器运行时使用的ECS资源

use bevy_ecs::prelude::*;

/// 帧时间
#[derive(Resource, Clone, Copy, Debug, Default)]
pub struct Time {
    /// 本帧经过的墙钟时间（秒）
    pub delta_seconds: f32,
    /// 自启动以来的累计时间（秒）
    pub elapsed_seconds: f64,
    /// 已执行的帧数
    pub frame: u64,
}

impl Time {
    /// 推进一帧
    pub fn advance(&mut self, delta_seconds: f32) {
        self.delta_seconds = delta_seconds;
        self.elapsed_seconds += f64::from(delta_seconds);
        self.frame += 1;
    }
}

/// 帧率统计
///
/// 每累计超过 `window` 秒输出一次平均帧率，然后清零重新统计。
#[derive(Resource, Clone, Copy, Debug)]
pub struct FpsCounter {
    frames: u32,
    accumulated: f32,
    window: f32,
    last_fps: Option<f32>,
}

impl Default for FpsCounter {
    fn default() -> Self {
        Self::with_window(2.0)
    }
}

impl FpsCounter {
    pub fn with_window(window: f32) -> Self {
        Self {
            frames: 0,
            accumulated: 0.0,
            window,
            last_fps: None,
        }
    }

    /// 记录一帧，窗口结束时返回平均帧率
    pub fn tick(&mut self, delta_seconds: f32) -> Option<f32> {
        self.frames += 1;
        self.accumulated += delta_seconds;
        if self.accumulated <= self.window {
            return None;
        }

        let fps = self.frames as f32 / self.accumulated;
        self.frames = 0;
        self.accumulated = 0.0;
        self.last_fps = Some(fps);
        Some(fps)
    }

    /// 最近一次统计的帧率
    pub fn last_fps(&self) -> Option<f32> {
        self.last_fps
    }
}
