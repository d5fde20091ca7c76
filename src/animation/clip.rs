use super::keyframe::{AnimationSampler, InterpolationMode, SamplerOutput};
use crate::core::error::{AnimationError, AnimationResult};
use glam::{Mat4, Quat, Vec3};

/// 通道目标属性
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelProperty {
    Translation,
    Rotation,
    Scale,
}

/// 动画通道：把一个采样器绑定到某个节点的某个属性
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnimationChannel {
    /// 目标节点索引
    pub target_node: usize,
    /// 目标属性
    pub property: ChannelProperty,
    /// 采样器索引
    pub sampler: usize,
}

/// 通道采样结果
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ChannelValue {
    Translation(Vec3),
    Rotation(Quat),
    Scale(Vec3),
}

impl ChannelValue {
    /// 转换为 4x4 矩阵
    pub fn to_matrix(self) -> Mat4 {
        match self {
            Self::Translation(t) => Mat4::from_translation(t),
            Self::Rotation(r) => Mat4::from_quat(r),
            Self::Scale(s) => Mat4::from_scale(s),
        }
    }
}

/// 动画片段
#[derive(Debug, Clone, Default)]
pub struct AnimationClip {
    /// 动画名称
    pub name: String,
    samplers: Vec<AnimationSampler>,
    channels: Vec<AnimationChannel>,
}

impl AnimationClip {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            samplers: Vec::new(),
            channels: Vec::new(),
        }
    }

    /// 添加采样器，返回其索引
    pub fn add_sampler(&mut self, sampler: AnimationSampler) -> usize {
        self.samplers.push(sampler);
        self.samplers.len() - 1
    }

    /// 添加通道（按添加顺序作用于目标节点）
    pub fn add_channel(&mut self, channel: AnimationChannel) {
        self.channels.push(channel);
    }

    /// 添加采样器并立即绑定到一个通道
    pub fn add_track(&mut self, target_node: usize, property: ChannelProperty, sampler: AnimationSampler) {
        let sampler = self.add_sampler(sampler);
        self.add_channel(AnimationChannel {
            target_node,
            property,
            sampler,
        });
    }

    pub fn channels(&self) -> &[AnimationChannel] {
        &self.channels
    }

    pub fn samplers(&self) -> &[AnimationSampler] {
        &self.samplers
    }

    /// 片段时长：所有采样器时长的最大值
    pub fn duration(&self) -> f32 {
        self.samplers
            .iter()
            .map(AnimationSampler::duration)
            .fold(0.0, f32::max)
    }

    /// 统一设置所有采样器的插值模式
    pub fn set_interpolation(&mut self, interpolation: InterpolationMode) {
        for sampler in &mut self.samplers {
            sampler.set_interpolation(interpolation);
        }
    }

    /// 采样一个通道
    ///
    /// 采样器缺失、带缺陷或输出类型与属性不符时返回 None。
    pub fn sample_channel(&self, channel: &AnimationChannel, time: f32) -> Option<ChannelValue> {
        let sampler = self.samplers.get(channel.sampler)?;
        match channel.property {
            ChannelProperty::Translation => sampler.sample_vec3(time).map(ChannelValue::Translation),
            ChannelProperty::Rotation => sampler.sample_quat(time).map(ChannelValue::Rotation),
            ChannelProperty::Scale => sampler.sample_vec3(time).map(ChannelValue::Scale),
        }
    }

    /// 检查片段结构，返回发现的第一个问题
    pub fn validate(&self, node_count: usize) -> AnimationResult<()> {
        for (index, sampler) in self.samplers.iter().enumerate() {
            if let Some(defect) = sampler.defect() {
                return Err(AnimationError::Degenerate {
                    sampler: index,
                    defect,
                });
            }
        }

        for (index, channel) in self.channels.iter().enumerate() {
            let sampler = self
                .samplers
                .get(channel.sampler)
                .ok_or(AnimationError::SamplerOutOfRange {
                    channel: index,
                    sampler: channel.sampler,
                    len: self.samplers.len(),
                })?;
            if channel.target_node >= node_count {
                return Err(AnimationError::TargetOutOfRange {
                    channel: index,
                    node: channel.target_node,
                    len: node_count,
                });
            }
            let matches = matches!(
                (channel.property, sampler.output()),
                (ChannelProperty::Rotation, SamplerOutput::Quat(_))
                    | (ChannelProperty::Translation, SamplerOutput::Vec3(_))
                    | (ChannelProperty::Scale, SamplerOutput::Vec3(_))
            );
            if !matches {
                return Err(AnimationError::PropertyMismatch { channel: index });
            }
        }
        Ok(())
    }
}
