//! GLTF 导入辅助
//!
//! 把 glTF 文档转换为骨骼、蒙皮和动画片段。文件格式本身由 `gltf` crate 解析，
//! 这里只做数据搬运。

use super::clip::{AnimationClip, ChannelProperty};
use super::keyframe::{AnimationSampler, InterpolationMode, SamplerOutput};
use super::skeleton::{NodeTransform, Skeleton, SkeletonNode};
use super::skin::Skin;
use crate::core::error::{AssetError, AssetResult};
use gltf::animation::util::ReadOutputs;
use gltf::animation::Interpolation;
use glam::{Mat4, Quat, Vec3};
use std::path::Path;

/// 导入后的模型数据
#[derive(Debug, Clone)]
pub struct ModelData {
    pub skeleton: Skeleton,
    pub skins: Vec<Skin>,
    pub clips: Vec<AnimationClip>,
}

/// 从文件导入模型
///
/// # 示例
/// ```ignore
/// let model = skyisle::animation::gltf_import::load_model("bot.gltf")?;
/// let skin = model.skins.into_iter().next().unwrap();
/// let player = SkeletonAnimationPlayer::new(model.skeleton, skin, model.clips)?;
/// ```
pub fn load_model<P: AsRef<Path>>(path: P) -> AssetResult<ModelData> {
    let path = path.as_ref();
    let (document, buffers, _images) = gltf::import(path).map_err(|e| AssetError::Import {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;

    let model = from_document(&document, &buffers)?;
    tracing::info!(
        target: "animation",
        path = %path.display(),
        nodes = model.skeleton.len(),
        skins = model.skins.len(),
        clips = model.clips.len(),
        "Loaded model"
    );
    Ok(model)
}

/// 从已解析的文档构建模型数据
pub fn from_document(
    document: &gltf::Document,
    buffers: &[gltf::buffer::Data],
) -> AssetResult<ModelData> {
    let read_buffer =
        |buffer: gltf::Buffer<'_>| buffers.get(buffer.index()).map(|data| data.0.as_slice());

    let nodes = document
        .nodes()
        .map(|node| {
            let transform = match node.transform() {
                gltf::scene::Transform::Matrix { matrix } => {
                    NodeTransform::Matrix(Mat4::from_cols_array_2d(&matrix))
                }
                gltf::scene::Transform::Decomposed {
                    translation,
                    rotation,
                    scale,
                } => NodeTransform::from_trs(
                    Vec3::from(translation),
                    Quat::from_array(rotation),
                    Vec3::from(scale),
                ),
            };
            SkeletonNode::new(node.name().unwrap_or_default())
                .with_transform(transform)
                .with_children(node.children().map(|child| child.index()))
        })
        .collect();
    let skeleton = Skeleton::new(nodes)?;

    let mut skins = Vec::new();
    for skin in document.skins() {
        let joints: Vec<usize> = skin.joints().map(|joint| joint.index()).collect();
        let inverse_bind_matrices: Vec<Mat4> =
            match skin.reader(read_buffer).read_inverse_bind_matrices() {
                Some(matrices) => matrices.map(|m| Mat4::from_cols_array_2d(&m)).collect(),
                None => vec![Mat4::IDENTITY; joints.len()],
            };
        let skin = Skin::new(joints, inverse_bind_matrices)?;
        skin.validate_against(&skeleton)?;
        skins.push(skin);
    }

    let mut clips = Vec::new();
    for (index, animation) in document.animations().enumerate() {
        let name = animation
            .name()
            .map(str::to_string)
            .unwrap_or_else(|| format!("animation_{}", index));
        let mut clip = AnimationClip::new(name);

        for channel in animation.channels() {
            let reader = channel.reader(read_buffer);
            let Some(inputs) = reader.read_inputs() else {
                log::warn!("animation {} channel has no input accessor", index);
                continue;
            };
            let input: Vec<f32> = inputs.collect();
            let interpolation = channel.sampler().interpolation();

            let (property, output) = match reader.read_outputs() {
                Some(ReadOutputs::Translations(values)) => (
                    ChannelProperty::Translation,
                    SamplerOutput::Vec3(keyframe_values(values.map(Vec3::from), interpolation)),
                ),
                Some(ReadOutputs::Rotations(values)) => (
                    ChannelProperty::Rotation,
                    SamplerOutput::Quat(keyframe_values(
                        values.into_f32().map(Quat::from_array),
                        interpolation,
                    )),
                ),
                Some(ReadOutputs::Scales(values)) => (
                    ChannelProperty::Scale,
                    SamplerOutput::Vec3(keyframe_values(values.map(Vec3::from), interpolation)),
                ),
                Some(ReadOutputs::MorphTargetWeights(_)) => {
                    log::debug!("animation {} skips a morph target channel", index);
                    continue;
                }
                None => {
                    log::warn!("animation {} channel has no output accessor", index);
                    continue;
                }
            };

            let mode = match interpolation {
                Interpolation::Step => InterpolationMode::Step,
                Interpolation::Linear | Interpolation::CubicSpline => InterpolationMode::Linear,
            };
            clip.add_track(
                channel.target().node().index(),
                property,
                AnimationSampler::new(input, output, mode),
            );
        }

        if let Err(e) = clip.validate(skeleton.len()) {
            tracing::warn!(target: "animation", clip = %clip.name, "Clip has degenerate data: {}", e);
        }
        clips.push(clip);
    }

    Ok(ModelData {
        skeleton,
        skins,
        clips,
    })
}

/// 三次样条输出每个关键帧存 (入切线, 值, 出切线)，这里只取值并退化为线性插值
fn keyframe_values<T>(values: impl Iterator<Item = T>, interpolation: Interpolation) -> Vec<T> {
    match interpolation {
        Interpolation::CubicSpline => values.skip(1).step_by(3).collect(),
        Interpolation::Linear | Interpolation::Step => values.collect(),
    }
}
