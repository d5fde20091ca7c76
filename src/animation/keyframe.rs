//! 关键帧采样器
//!
//! 时间数组严格递增，输出值与时间一一对应。采样时先按动画时长取模（循环播放），
//! 再二分查找所在区间，最后按插值模式得到结果。

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 插值模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterpolationMode {
    /// 线性插值（旋转使用球面线性插值）
    #[default]
    Linear,
    /// 阶梯插值，保持区间左端关键帧的值
    Step,
}

/// 采样器缺陷
///
/// 带缺陷的采样器在运行时被视为空操作，而不是让帧循环崩溃。
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplerDefect {
    #[error("sampler has no keyframes")]
    Empty,
    #[error("sampler has a single keyframe")]
    SingleKeyframe,
    #[error("sampler has {input} times but {output} values")]
    LengthMismatch { input: usize, output: usize },
    #[error("sampler duration is not positive")]
    ZeroDuration,
    #[error("sampler times are not strictly increasing")]
    Unsorted,
}

/// 采样器输出值
#[derive(Debug, Clone, PartialEq)]
pub enum SamplerOutput {
    /// 平移或缩放
    Vec3(Vec<Vec3>),
    /// 旋转
    Quat(Vec<Quat>),
}

impl SamplerOutput {
    pub fn len(&self) -> usize {
        match self {
            Self::Vec3(values) => values.len(),
            Self::Quat(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// 采样位置：区间左端索引与区间内的比例
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplePosition {
    /// 区间左端关键帧索引
    pub index: usize,
    /// 取模后的局部时间
    pub local_time: f32,
    /// `(t - times[i]) / (times[i+1] - times[i])`，在两端可能略微越出 [0, 1]
    pub weight: f32,
}

/// 关键帧采样器
#[derive(Debug, Clone)]
pub struct AnimationSampler {
    input: Vec<f32>,
    output: SamplerOutput,
    interpolation: InterpolationMode,
    defect: Option<SamplerDefect>,
}

impl AnimationSampler {
    pub fn new(input: Vec<f32>, output: SamplerOutput, interpolation: InterpolationMode) -> Self {
        let defect = Self::inspect(&input, &output);
        Self {
            input,
            output,
            interpolation,
            defect,
        }
    }

    pub fn vec3(input: Vec<f32>, values: Vec<Vec3>, interpolation: InterpolationMode) -> Self {
        Self::new(input, SamplerOutput::Vec3(values), interpolation)
    }

    pub fn quat(input: Vec<f32>, values: Vec<Quat>, interpolation: InterpolationMode) -> Self {
        Self::new(input, SamplerOutput::Quat(values), interpolation)
    }

    fn inspect(input: &[f32], output: &SamplerOutput) -> Option<SamplerDefect> {
        match input.len() {
            0 => return Some(SamplerDefect::Empty),
            1 => return Some(SamplerDefect::SingleKeyframe),
            _ => {}
        }
        if input.len() != output.len() {
            return Some(SamplerDefect::LengthMismatch {
                input: input.len(),
                output: output.len(),
            });
        }
        if !input.windows(2).all(|w| w[0] < w[1]) {
            return Some(SamplerDefect::Unsorted);
        }
        // NaN 也落在这里
        if !(input[input.len() - 1] > 0.0) {
            return Some(SamplerDefect::ZeroDuration);
        }
        None
    }

    pub fn input(&self) -> &[f32] {
        &self.input
    }

    pub fn output(&self) -> &SamplerOutput {
        &self.output
    }

    pub fn interpolation(&self) -> InterpolationMode {
        self.interpolation
    }

    pub fn set_interpolation(&mut self, interpolation: InterpolationMode) {
        self.interpolation = interpolation;
    }

    /// 缺陷（None 表示可正常采样）
    pub fn defect(&self) -> Option<SamplerDefect> {
        self.defect
    }

    /// 动画时长，即最后一个关键帧的时间
    pub fn duration(&self) -> f32 {
        self.input.last().copied().unwrap_or(0.0)
    }

    /// 计算采样位置
    ///
    /// 时间按时长取模后查找区间；带缺陷的采样器返回 None。
    pub fn sample_position(&self, time: f32) -> Option<SamplePosition> {
        if self.defect.is_some() {
            return None;
        }

        let local_time = time.rem_euclid(self.duration());
        let index = find_interval(&self.input, local_time);
        let start = self.input[index];
        let end = self.input[index + 1];
        Some(SamplePosition {
            index,
            local_time,
            weight: (local_time - start) / (end - start),
        })
    }

    /// 采样平移或缩放值
    pub fn sample_vec3(&self, time: f32) -> Option<Vec3> {
        let SamplerOutput::Vec3(values) = &self.output else {
            return None;
        };
        let position = self.sample_position(time)?;
        let left = *values.get(position.index)?;
        match self.interpolation {
            InterpolationMode::Step => Some(left),
            InterpolationMode::Linear => {
                let right = *values.get(position.index + 1)?;
                Some(left.lerp(right, position.weight.clamp(0.0, 1.0)))
            }
        }
    }

    /// 采样旋转值
    pub fn sample_quat(&self, time: f32) -> Option<Quat> {
        let SamplerOutput::Quat(values) = &self.output else {
            return None;
        };
        let position = self.sample_position(time)?;
        let left = *values.get(position.index)?;
        match self.interpolation {
            InterpolationMode::Step => Some(left),
            InterpolationMode::Linear => {
                let right = *values.get(position.index + 1)?;
                Some(left.slerp(right, position.weight.clamp(0.0, 1.0)))
            }
        }
    }
}

/// 二分查找满足 `times[i] <= t < times[i+1]` 的区间
///
/// `t` 早于第一个关键帧时返回 0；`t >= times[last]` 时返回 `len - 2`，
/// 即钳制到最后一个有效区间，不做外推。少于两个关键帧时返回 0。
pub fn find_interval(times: &[f32], t: f32) -> usize {
    if times.len() < 2 {
        return 0;
    }
    let last_interval = times.len() - 2;
    if t >= times[times.len() - 1] {
        return last_interval;
    }
    // 第一个 > t 的位置减一即为左端
    times
        .partition_point(|&key| key <= t)
        .saturating_sub(1)
        .min(last_interval)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(interpolation: InterpolationMode) -> AnimationSampler {
        AnimationSampler::vec3(
            vec![0.0, 1.0, 2.0],
            vec![Vec3::ZERO, Vec3::new(10.0, 0.0, 0.0), Vec3::new(10.0, 10.0, 0.0)],
            interpolation,
        )
    }

    #[test]
    fn test_find_interval() {
        let times = [0.0, 1.0, 2.0, 3.0];
        assert_eq!(find_interval(&times, 1.5), 1);
        assert_eq!(find_interval(&times, 0.0), 0);
        assert_eq!(find_interval(&times, 1.0), 1);
        assert_eq!(find_interval(&times, 3.0), 2);
        assert_eq!(find_interval(&times, 42.0), 2);
        assert_eq!(find_interval(&times, -1.0), 0);
        assert_eq!(find_interval(&times, f32::NAN), 0);
        assert_eq!(find_interval(&[5.0], 5.0), 0);
    }

    #[test]
    fn test_looping_wraps_time() {
        let sampler = ramp(InterpolationMode::Linear);
        assert_eq!(sampler.duration(), 2.0);
        assert_eq!(sampler.sample_position(2.5), sampler.sample_position(0.5));
        assert_eq!(sampler.sample_vec3(2.5), sampler.sample_vec3(0.5));
    }

    #[test]
    fn test_sample_position_weight() {
        let sampler = ramp(InterpolationMode::Linear);
        let position = sampler.sample_position(1.25).unwrap();
        assert_eq!(position.index, 1);
        assert!((position.weight - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_linear_and_step_differ() {
        let linear = ramp(InterpolationMode::Linear).sample_vec3(0.5).unwrap();
        let step = ramp(InterpolationMode::Step).sample_vec3(0.5).unwrap();
        assert!((linear - Vec3::new(5.0, 0.0, 0.0)).length() < 1e-5);
        assert_eq!(step, Vec3::ZERO);
    }

    #[test]
    fn test_rotation_slerp_halfway() {
        let sampler = AnimationSampler::quat(
            vec![0.0, 1.0],
            vec![Quat::IDENTITY, Quat::from_rotation_y(std::f32::consts::FRAC_PI_2)],
            InterpolationMode::Linear,
        );
        let q = sampler.sample_quat(0.5).unwrap();
        assert!(q.abs_diff_eq(Quat::from_rotation_y(std::f32::consts::FRAC_PI_4), 1e-5));
        // 类型不匹配时不采样
        assert_eq!(sampler.sample_vec3(0.5), None);
    }

    #[test]
    fn test_degenerate_samplers_do_not_divide_by_zero() {
        let single = AnimationSampler::vec3(vec![0.0], vec![Vec3::ONE], InterpolationMode::Linear);
        assert_eq!(single.defect(), Some(SamplerDefect::SingleKeyframe));
        assert_eq!(single.sample_vec3(1.0), None);

        let empty = AnimationSampler::vec3(vec![], vec![], InterpolationMode::Linear);
        assert_eq!(empty.defect(), Some(SamplerDefect::Empty));
        assert_eq!(empty.duration(), 0.0);

        let zero = AnimationSampler::vec3(
            vec![-1.0, 0.0],
            vec![Vec3::ONE, Vec3::ONE],
            InterpolationMode::Linear,
        );
        assert_eq!(zero.defect(), Some(SamplerDefect::ZeroDuration));
        assert_eq!(zero.sample_position(3.0), None);

        let mismatch = AnimationSampler::vec3(vec![0.0, 1.0], vec![Vec3::ONE], InterpolationMode::Step);
        assert_eq!(
            mismatch.defect(),
            Some(SamplerDefect::LengthMismatch { input: 2, output: 1 })
        );

        let unsorted = AnimationSampler::vec3(
            vec![0.0, 2.0, 1.0],
            vec![Vec3::ONE; 3],
            InterpolationMode::Linear,
        );
        assert_eq!(unsorted.defect(), Some(SamplerDefect::Unsorted));
    }

    #[test]
    fn test_time_before_first_keyframe_holds_first_value() {
        let sampler = AnimationSampler::vec3(
            vec![0.5, 1.0],
            vec![Vec3::X, Vec3::Y],
            InterpolationMode::Linear,
        );
        let position = sampler.sample_position(0.25).unwrap();
        assert_eq!(position.index, 0);
        assert!(position.weight < 0.0);
        assert_eq!(sampler.sample_vec3(0.25), Some(Vec3::X));
    }
}
