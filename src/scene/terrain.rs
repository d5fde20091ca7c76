//! 地形场景工厂
//!
//! 每个瓦片放置一组建筑、岛屿、地表、云、尖塔、树和岩石。
//! 随机摆放由瓦片中心和世界种子决定，同一个瓦片重建后内容完全相同。

use super::tiles::{TileCoord, TileFactory};
use glam::{Mat4, Quat, Vec3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;

/// 建筑网格单元宽度
const CELL_SIZE: i32 = 320;
/// 单元内建筑的可放置范围
const FOOTPRINT: i32 = 150;
const BUILDING_X: (i32, i32) = (-500, 1000);
const BUILDING_Z: (i32, i32) = (180, 1000);
/// 建筑底部高度（加上建筑尺寸）
const BUILDING_BASE: f32 = -440.0;
/// 立面贴图数量
pub const FACADE_TEXTURES: u8 = 4;

/// 场景物件类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropKind {
    Building,
    Island,
    Surface,
    Cloud,
    Spire,
    Tree,
    Rock,
}

impl PropKind {
    /// 渲染器使用的模型名
    pub fn asset(&self) -> &'static str {
        match self {
            PropKind::Building => "cube",
            PropKind::Island => "test.obj",
            PropKind::Surface => "testsurface.obj",
            PropKind::Cloud => "cloud.obj",
            PropKind::Spire => "spire.obj",
            PropKind::Tree => "tree.obj",
            PropKind::Rock => "rock.obj",
        }
    }
}

/// 一个物件的摆放
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub kind: PropKind,
    /// 世界空间位置（已加上瓦片偏移）
    pub position: Vec3,
    pub scale: Vec3,
    /// 绕 Y 轴旋转（度）
    pub yaw_degrees: f32,
    /// 立面贴图编号 (1..=4)，只有建筑使用
    pub texture: Option<u8>,
}

impl Placement {
    fn fixed(kind: PropKind, offset: Vec3, local: Vec3, scale: Vec3) -> Self {
        Self {
            kind,
            position: offset + local,
            scale,
            yaw_degrees: 0.0,
            texture: None,
        }
    }

    /// 模型矩阵 = 平移 × 旋转 × 缩放
    pub fn model_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(
            self.scale,
            Quat::from_rotation_y(self.yaw_degrees.to_radians()),
            self.position,
        )
    }
}

/// 一个瓦片的场景内容
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerrainScene {
    pub centre: TileCoord,
    pub placements: Vec<Placement>,
}

impl TerrainScene {
    /// 生成瓦片内容
    pub fn generate(centre: TileCoord, seed: u64) -> Self {
        let offset = centre.offset();
        let mut rng = StdRng::seed_from_u64(tile_seed(centre, seed));
        let mut placements = Vec::new();

        let mut x = BUILDING_X.0;
        while x + CELL_SIZE <= BUILDING_X.1 {
            let mut z = BUILDING_Z.0;
            while z + CELL_SIZE <= BUILDING_Z.1 {
                let inner_x = x + (CELL_SIZE - FOOTPRINT) / 2;
                let inner_z = z + (CELL_SIZE - FOOTPRINT) / 2;

                let yaw = rng.gen_range(0..=110) as f32;
                let bx = rng.gen_range(inner_x..inner_x + FOOTPRINT) as f32;
                let bz = rng.gen_range(inner_z..inner_z + FOOTPRINT) as f32;
                let size = rng.gen_range(60..=100) as f32;
                let texture = rng.gen_range(1..=FACADE_TEXTURES);

                placements.push(Placement {
                    kind: PropKind::Building,
                    position: offset + Vec3::new(bx, BUILDING_BASE + size, bz),
                    scale: Vec3::splat(size),
                    yaw_degrees: yaw,
                    texture: Some(texture),
                });
                z += CELL_SIZE;
            }
            x += CELL_SIZE;
        }

        placements.extend([
            Placement::fixed(PropKind::Rock, offset, Vec3::new(0.0, -400.0, -200.0), Vec3::splat(10.0)),
            Placement::fixed(PropKind::Tree, offset, Vec3::new(400.0, -350.0, 1000.0), Vec3::splat(10.0)),
            Placement::fixed(PropKind::Tree, offset, Vec3::new(200.0, -350.0, -200.0), Vec3::splat(10.0)),
            Placement::fixed(PropKind::Island, offset, Vec3::ZERO, Vec3::splat(20.0)),
            Placement::fixed(PropKind::Cloud, offset, Vec3::splat(200.0), Vec3::splat(5.0)),
            Placement::fixed(PropKind::Surface, offset, Vec3::new(0.0, 3.0, 0.0), Vec3::splat(20.0)),
            Placement::fixed(
                PropKind::Spire,
                offset,
                Vec3::new(250.0, -400.0, 1200.0),
                Vec3::new(5.0, 10.0, 5.0),
            ),
        ]);

        Self { centre, placements }
    }

    pub fn buildings(&self) -> impl Iterator<Item = &Placement> {
        self.placements
            .iter()
            .filter(|placement| placement.kind == PropKind::Building)
    }

    pub fn count(&self, kind: PropKind) -> usize {
        self.placements.iter().filter(|p| p.kind == kind).count()
    }
}

/// 把瓦片中心混入世界种子
fn tile_seed(centre: TileCoord, seed: u64) -> u64 {
    seed ^ (centre.x as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)
        ^ (centre.z as u64).wrapping_mul(0xC2B2_AE3D_27D4_EB4F).rotate_left(31)
}

/// 地形场景工厂
#[derive(Debug, Clone, Default)]
pub struct TerrainSceneFactory {
    seed: u64,
    live: usize,
    built: u64,
}

impl TerrainSceneFactory {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// 当前存活的场景数
    pub fn live(&self) -> usize {
        self.live
    }

    /// 累计构建的场景数
    pub fn built(&self) -> u64 {
        self.built
    }
}

impl TileFactory for TerrainSceneFactory {
    type Tile = TerrainScene;
    type Error = Infallible;

    fn build(&mut self, centre: TileCoord) -> Result<TerrainScene, Infallible> {
        let scene = TerrainScene::generate(centre, self.seed);
        self.live += 1;
        self.built += 1;
        tracing::trace!(target: "world", centre = %centre, props = scene.placements.len(), "Terrain scene built");
        Ok(scene)
    }

    fn destroy(&mut self, tile: TerrainScene) {
        self.live = self.live.saturating_sub(1);
        tracing::trace!(target: "world", centre = %tile.centre, "Terrain scene destroyed");
    }
}
