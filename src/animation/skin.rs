//! 蒙皮绑定数据
//!
//! 定义蒙皮与骨骼的绑定关系，以及每帧交给渲染器的关节矩阵调色板。

use super::skeleton::Skeleton;
use crate::core::error::{SkeletonError, SkeletonResult};
use glam::Mat4;

/// 蒙皮数据
///
/// `joints[0]` 作为变换传播的骨骼根节点。
#[derive(Debug, Clone)]
pub struct Skin {
    joints: Vec<usize>,
    inverse_bind_matrices: Vec<Mat4>,
}

impl Skin {
    pub fn new(joints: Vec<usize>, inverse_bind_matrices: Vec<Mat4>) -> SkeletonResult<Self> {
        if joints.is_empty() {
            return Err(SkeletonError::EmptySkin);
        }
        if joints.len() != inverse_bind_matrices.len() {
            return Err(SkeletonError::JointCountMismatch {
                joints: joints.len(),
                inverse_bind_matrices: inverse_bind_matrices.len(),
            });
        }
        Ok(Self {
            joints,
            inverse_bind_matrices,
        })
    }

    /// 关节节点索引
    pub fn joints(&self) -> &[usize] {
        &self.joints
    }

    /// 逆绑定矩阵（与关节一一对应）
    pub fn inverse_bind_matrices(&self) -> &[Mat4] {
        &self.inverse_bind_matrices
    }

    pub fn joint_count(&self) -> usize {
        self.joints.len()
    }

    /// 骨骼根节点
    pub fn root(&self) -> usize {
        self.joints[0]
    }

    /// 检查所有关节都指向有效节点
    pub fn validate_against(&self, skeleton: &Skeleton) -> SkeletonResult<()> {
        match self
            .joints
            .iter()
            .enumerate()
            .find(|&(_, &node)| node >= skeleton.len())
        {
            Some((joint, &node)) => Err(SkeletonError::JointOutOfRange {
                joint,
                node,
                len: skeleton.len(),
            }),
            None => Ok(()),
        }
    }
}

/// 关节矩阵调色板
///
/// 每个关节一个矩阵，每帧原地重建，是渲染器唯一消费的产物。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JointMatrixPalette {
    matrices: Vec<Mat4>,
}

impl JointMatrixPalette {
    pub fn with_len(len: usize) -> Self {
        Self {
            matrices: vec![Mat4::IDENTITY; len],
        }
    }

    pub fn len(&self) -> usize {
        self.matrices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matrices.is_empty()
    }

    pub fn get(&self, joint: usize) -> Option<&Mat4> {
        self.matrices.get(joint)
    }

    pub fn as_slice(&self) -> &[Mat4] {
        &self.matrices
    }

    /// 按列主序排列的原始字节，可直接写入 GPU 缓冲区
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.matrices)
    }
}

/// 绑定结果：节点全局变换 + 关节矩阵
#[derive(Debug, Clone)]
pub struct SkinBinding {
    /// 全局变换（按节点索引排列）
    pub global_joint_transforms: Vec<Mat4>,
    /// 关节矩阵调色板
    pub palette: JointMatrixPalette,
}

/// 蒙皮绑定服务
pub struct SkinBinder;

impl SkinBinder {
    /// 计算静止姿态下的全局变换与关节矩阵
    pub fn bind(skeleton: &Skeleton, skin: &Skin) -> SkeletonResult<SkinBinding> {
        skin.validate_against(skeleton)?;

        let locals = skeleton.local_transforms();
        let global_joint_transforms = skeleton.global_transforms(skin.root(), &locals)?;

        let mut palette = JointMatrixPalette::default();
        Self::write_palette(skin, &global_joint_transforms, &mut palette)?;

        tracing::debug!(
            target: "animation",
            joints = skin.joint_count(),
            nodes = skeleton.len(),
            "Bound skin rest pose"
        );

        Ok(SkinBinding {
            global_joint_transforms,
            palette,
        })
    }

    /// `palette[j] = globals[joints[j]] * inverse_bind[j]`
    pub fn write_palette(
        skin: &Skin,
        globals: &[Mat4],
        palette: &mut JointMatrixPalette,
    ) -> SkeletonResult<()> {
        palette
            .matrices
            .resize(skin.joint_count(), Mat4::IDENTITY);

        for (joint, (&node, inverse_bind)) in skin
            .joints
            .iter()
            .zip(&skin.inverse_bind_matrices)
            .enumerate()
        {
            let global = globals.get(node).ok_or(SkeletonError::JointOutOfRange {
                joint,
                node,
                len: globals.len(),
            })?;
            palette.matrices[joint] = *global * *inverse_bind;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::skeleton::{NodeTransform, SkeletonNode};
    use glam::Vec3;

    fn arm() -> (Skeleton, Skin) {
        let skeleton = Skeleton::new(vec![
            SkeletonNode::new("shoulder")
                .with_transform(NodeTransform::from_translation(Vec3::new(0.0, 2.0, 0.0)))
                .with_children([1]),
            SkeletonNode::new("elbow")
                .with_transform(NodeTransform::from_translation(Vec3::new(1.0, 0.0, 0.0))),
        ])
        .unwrap();
        // 逆绑定矩阵取静止姿态全局变换的逆
        let skin = Skin::new(
            vec![0, 1],
            vec![
                Mat4::from_translation(Vec3::new(0.0, -2.0, 0.0)),
                Mat4::from_translation(Vec3::new(-1.0, -2.0, 0.0)),
            ],
        )
        .unwrap();
        (skeleton, skin)
    }

    #[test]
    fn test_rest_pose_identity() {
        let skeleton = Skeleton::new(vec![
            SkeletonNode::new("root").with_children([1]),
            SkeletonNode::new("tip"),
        ])
        .unwrap();
        let ibms = vec![
            Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0)),
            Mat4::from_scale(Vec3::splat(0.5)),
        ];
        let skin = Skin::new(vec![0, 1], ibms.clone()).unwrap();

        let binding = SkinBinder::bind(&skeleton, &skin).unwrap();
        assert_eq!(binding.palette.as_slice(), ibms.as_slice());
    }

    #[test]
    fn test_bind_pose_has_zero_displacement() {
        let (skeleton, skin) = arm();
        let binding = SkinBinder::bind(&skeleton, &skin).unwrap();
        for m in binding.palette.as_slice() {
            assert!(m.abs_diff_eq(Mat4::IDENTITY, 1e-6));
        }
        assert_eq!(
            binding.global_joint_transforms[1].w_axis.truncate(),
            Vec3::new(1.0, 2.0, 0.0)
        );
    }

    #[test]
    fn test_joint_count_mismatch() {
        let err = Skin::new(vec![0, 1], vec![Mat4::IDENTITY]).unwrap_err();
        assert_eq!(
            err,
            SkeletonError::JointCountMismatch {
                joints: 2,
                inverse_bind_matrices: 1
            }
        );
        assert_eq!(Skin::new(vec![], vec![]).unwrap_err(), SkeletonError::EmptySkin);
    }

    #[test]
    fn test_joint_out_of_range() {
        let (skeleton, _) = arm();
        let skin = Skin::new(vec![0, 5], vec![Mat4::IDENTITY; 2]).unwrap();
        let err = SkinBinder::bind(&skeleton, &skin).unwrap_err();
        assert_eq!(
            err,
            SkeletonError::JointOutOfRange {
                joint: 1,
                node: 5,
                len: 2
            }
        );
    }

    #[test]
    fn test_palette_bytes_are_column_major() {
        let palette = JointMatrixPalette::with_len(2);
        assert_eq!(palette.as_bytes().len(), 2 * 64);
        let first: &[f32] = bytemuck::cast_slice(&palette.as_bytes()[..64]);
        assert_eq!(first, Mat4::IDENTITY.to_cols_array().as_slice());
    }
}
