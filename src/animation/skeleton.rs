//! 骨骼数据结构
//!
//! 以扁平数组 + 整数索引的方式存储节点层级（arena），子节点只通过索引引用，
//! 不存在所有权环。负责局部变换与全局变换的计算。

use crate::core::error::{SkeletonError, SkeletonResult};
use glam::{Mat4, Quat, Vec3};
use std::collections::HashMap;

// ============================================================================
// 节点变换
// ============================================================================

/// 节点局部变换的来源
///
/// 矩阵形式优先；否则按 `T * R * S` 组合，缺省分量视为单位变换。
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum NodeTransform {
    /// 显式 4x4 矩阵，原样使用
    Matrix(Mat4),
    /// 独立的平移 / 旋转 / 缩放
    Trs {
        translation: Option<Vec3>,
        rotation: Option<Quat>,
        scale: Option<Vec3>,
    },
}

impl Default for NodeTransform {
    fn default() -> Self {
        Self::identity()
    }
}

impl NodeTransform {
    pub fn identity() -> Self {
        Self::Trs {
            translation: None,
            rotation: None,
            scale: None,
        }
    }

    pub fn from_translation(translation: Vec3) -> Self {
        Self::Trs {
            translation: Some(translation),
            rotation: None,
            scale: None,
        }
    }

    pub fn from_trs(translation: Vec3, rotation: Quat, scale: Vec3) -> Self {
        Self::Trs {
            translation: Some(translation),
            rotation: Some(rotation),
            scale: Some(scale),
        }
    }

    /// 转换为 4x4 矩阵
    ///
    /// 缩放最先作用于几何体，其次旋转，最后平移。
    pub fn to_matrix(&self) -> Mat4 {
        match *self {
            Self::Matrix(matrix) => matrix,
            Self::Trs {
                translation,
                rotation,
                scale,
            } => {
                Mat4::from_translation(translation.unwrap_or(Vec3::ZERO))
                    * Mat4::from_quat(rotation.unwrap_or(Quat::IDENTITY))
                    * Mat4::from_scale(scale.unwrap_or(Vec3::ONE))
            }
        }
    }
}

// ============================================================================
// 骨骼节点
// ============================================================================

/// 骨骼节点
#[derive(Clone, Debug, Default)]
pub struct SkeletonNode {
    /// 节点名称
    pub name: String,
    /// 局部变换（相对于父节点）
    pub transform: NodeTransform,
    /// 子节点索引列表（按存储顺序遍历）
    pub children: Vec<usize>,
}

impl SkeletonNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            transform: NodeTransform::identity(),
            children: Vec::new(),
        }
    }

    pub fn with_transform(mut self, transform: NodeTransform) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_children(mut self, children: impl IntoIterator<Item = usize>) -> Self {
        self.children = children.into_iter().collect();
        self
    }
}

// ============================================================================
// 骨骼层级（Skeleton）
// ============================================================================

/// 骨骼层级
///
/// 构造时校验：子索引越界、多父节点、父链成环均视为致命的数据错误。
#[derive(Clone, Debug)]
pub struct Skeleton {
    nodes: Vec<SkeletonNode>,
    parents: Vec<Option<usize>>,
    name_to_index: HashMap<String, usize>,
}

impl Skeleton {
    /// 创建并校验骨骼层级
    pub fn new(nodes: Vec<SkeletonNode>) -> SkeletonResult<Self> {
        let len = nodes.len();
        let mut parents: Vec<Option<usize>> = vec![None; len];

        for (parent, node) in nodes.iter().enumerate() {
            for &child in &node.children {
                if child >= len {
                    return Err(SkeletonError::ChildOutOfRange { parent, child, len });
                }
                if let Some(first) = parents[child] {
                    return Err(SkeletonError::MultipleParents {
                        node: child,
                        first,
                        second: parent,
                    });
                }
                parents[child] = Some(parent);
            }
        }

        // 每个节点最多一个父节点：从所有根出发无法到达的节点必在环上
        let mut visited = vec![false; len];
        let mut stack: Vec<usize> = (0..len).filter(|&i| parents[i].is_none()).collect();
        while let Some(index) = stack.pop() {
            visited[index] = true;
            stack.extend(nodes[index].children.iter().copied());
        }
        if let Some(node) = visited.iter().position(|&v| !v) {
            return Err(SkeletonError::Cycle { node });
        }

        let name_to_index = nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| !n.name.is_empty())
            .map(|(i, n)| (n.name.clone(), i))
            .collect();

        Ok(Self {
            nodes,
            parents,
            name_to_index,
        })
    }

    /// 获取节点数量
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &[SkeletonNode] {
        &self.nodes
    }

    /// 获取节点
    pub fn node(&self, index: usize) -> SkeletonResult<&SkeletonNode> {
        self.nodes.get(index).ok_or(SkeletonError::NodeOutOfRange {
            node: index,
            len: self.nodes.len(),
        })
    }

    /// 获取父节点索引（根节点返回 None）
    pub fn parent(&self, index: usize) -> Option<usize> {
        self.parents.get(index).copied().flatten()
    }

    /// 通过名称查找节点索引
    pub fn find_node(&self, name: &str) -> Option<usize> {
        self.name_to_index.get(name).copied()
    }

    /// 所有根节点（没有父节点的节点）
    pub fn roots(&self) -> impl Iterator<Item = usize> + '_ {
        self.parents
            .iter()
            .enumerate()
            .filter(|(_, p)| p.is_none())
            .map(|(i, _)| i)
    }

    /// 计算单个节点的局部变换
    pub fn local_transform(&self, index: usize) -> SkeletonResult<Mat4> {
        Ok(self.node(index)?.transform.to_matrix())
    }

    /// 计算所有节点的局部变换（按节点索引排列）
    pub fn local_transforms(&self) -> Vec<Mat4> {
        self.nodes.iter().map(|n| n.transform.to_matrix()).collect()
    }

    /// 以深度优先顺序列出子树中的节点（包含根）
    pub fn subtree(&self, root: usize) -> SkeletonResult<Vec<usize>> {
        self.node(root)?;
        let mut order = Vec::new();
        let mut stack = vec![root];
        while let Some(index) = stack.pop() {
            order.push(index);
            stack.extend(self.nodes[index].children.iter().rev());
        }
        Ok(order)
    }

    /// 计算子树的全局变换
    ///
    /// 从 `root` 开始深度优先遍历，根节点以单位矩阵为父变换：
    /// `global = parent_global * local`。子树之外的条目保持不变。
    pub fn compute_global_transforms(
        &self,
        root: usize,
        locals: &[Mat4],
        globals: &mut [Mat4],
    ) -> SkeletonResult<()> {
        self.node(root)?;
        for buffer_len in [locals.len(), globals.len()] {
            if buffer_len != self.nodes.len() {
                return Err(SkeletonError::BufferSize {
                    expected: self.nodes.len(),
                    actual: buffer_len,
                });
            }
        }

        let mut stack = vec![(root, Mat4::IDENTITY)];
        while let Some((index, parent_global)) = stack.pop() {
            let global = parent_global * locals[index];
            globals[index] = global;
            // 逆序压栈，保证按存储顺序访问兄弟节点
            for &child in self.nodes[index].children.iter().rev() {
                stack.push((child, global));
            }
        }
        Ok(())
    }

    /// 计算子树的全局变换，返回按节点索引排列的新数组
    pub fn global_transforms(&self, root: usize, locals: &[Mat4]) -> SkeletonResult<Vec<Mat4>> {
        let mut globals = vec![Mat4::IDENTITY; self.nodes.len()];
        self.compute_global_transforms(root, locals, &mut globals)?;
        Ok(globals)
    }
}

// ============================================================================
// 测试
// ============================================================================
