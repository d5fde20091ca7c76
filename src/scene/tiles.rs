//! 无限世界瓦片流式加载
//!
//! 固定 3×3 的地形瓦片网格，相机离开中心瓦片时回收落在最后面的一列（或一行），
//! 在前进方向重新构建。任何时刻最多存在九个瓦片：先销毁，再构建。
//!
//! 一次平移是事务性的：工厂在重建过程中失败时，本次平移已经改动的槽位全部回滚，
//! 边界保持不变，错误返回给调用者。

use super::camera::CameraState;
use crate::core::error::{TileError, TileResult};
use bevy_ecs::prelude::*;
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 网格每个轴向上的瓦片数
pub const GRID_DIM: usize = 3;
/// 网格中的瓦片总数
pub const TILE_COUNT: usize = GRID_DIM * GRID_DIM;

/// 瓦片中心坐标（X/Z 平面上的整数坐标）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileCoord {
    pub x: i64,
    pub z: i64,
}

impl TileCoord {
    pub const fn new(x: i64, z: i64) -> Self {
        Self { x, z }
    }

    /// 世界空间中的偏移（Y = 0）
    pub fn offset(&self) -> Vec3 {
        Vec3::new(self.x as f32, 0.0, self.z as f32)
    }
}

impl fmt::Display for TileCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.z)
    }
}

/// 瓦片工厂
///
/// 构建与销毁成对出现，控制器保证每个构建出的瓦片恰好被销毁一次。
pub trait TileFactory {
    type Tile;
    type Error: fmt::Display;

    /// 在给定中心构建瓦片
    fn build(&mut self, centre: TileCoord) -> Result<Self::Tile, Self::Error>;

    /// 释放瓦片持有的资源
    fn destroy(&mut self, tile: Self::Tile);
}

/// 网格中的一个瓦片
#[derive(Debug, Clone, PartialEq)]
pub struct WorldTile<T> {
    pub centre: TileCoord,
    pub payload: T,
}

/// 中心瓦片在世界空间中的范围
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridBounds {
    pub min_x: i64,
    pub max_x: i64,
    pub min_z: i64,
    pub max_z: i64,
}

impl GridBounds {
    /// 以 `centre` 为中心、半宽为 `half` 的范围
    pub fn around(centre: TileCoord, half: i64) -> Self {
        Self {
            min_x: centre.x - half,
            max_x: centre.x + half,
            min_z: centre.z - half,
            max_z: centre.z + half,
        }
    }

    /// 相机是否仍在中心瓦片内（含边界）
    pub fn contains(&self, x: f32, z: f32) -> bool {
        let (x, z) = (f64::from(x), f64::from(z));
        x >= self.min_x as f64 && x <= self.max_x as f64 && z >= self.min_z as f64 && z <= self.max_z as f64
    }

    fn shifted(self, direction: ShiftDirection, tile_size: i64) -> Self {
        let (dx, dz) = direction.step();
        Self {
            min_x: self.min_x + dx * tile_size,
            max_x: self.max_x + dx * tile_size,
            min_z: self.min_z + dz * tile_size,
            max_z: self.max_z + dz * tile_size,
        }
    }
}

/// 网格平移方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShiftDirection {
    PositiveX,
    NegativeX,
    PositiveZ,
    NegativeZ,
}

impl ShiftDirection {
    fn step(self) -> (i64, i64) {
        match self {
            ShiftDirection::PositiveX => (1, 0),
            ShiftDirection::NegativeX => (-1, 0),
            ShiftDirection::PositiveZ => (0, 1),
            ShiftDirection::NegativeZ => (0, -1),
        }
    }

    fn along_x(self) -> bool {
        matches!(self, ShiftDirection::PositiveX | ShiftDirection::NegativeX)
    }
}

/// 瓦片流控制器
///
/// 每个槽位有一个固定的期望中心 (`layout`)，瓦片存在时其中心与之相同。
/// 只有回滚本身失败时槽位才会空缺，此时 `is_intact()` 返回 false，
/// 可以调用 `repair()` 重新填充。
pub struct TileStreamController<F: TileFactory> {
    factory: F,
    tile_size: i64,
    bounds: GridBounds,
    layout: [TileCoord; TILE_COUNT],
    slots: Vec<Option<WorldTile<F::Tile>>>,
}

impl<F: TileFactory> TileStreamController<F> {
    /// 以 `centre` 为中心瓦片构建完整的 3×3 网格
    ///
    /// 任何一个瓦片构建失败时，已构建的瓦片全部销毁后返回错误。
    pub fn new(mut factory: F, tile_size: i64, centre: TileCoord) -> TileResult<Self> {
        if tile_size <= 0 || tile_size % 2 != 0 {
            return Err(TileError::InvalidTileSize(tile_size));
        }

        let mut layout = [centre; TILE_COUNT];
        for (index, slot) in layout.iter_mut().enumerate() {
            let dx = (index % GRID_DIM) as i64 - 1;
            let dz = (index / GRID_DIM) as i64 - 1;
            *slot = TileCoord::new(centre.x + dx * tile_size, centre.z + dz * tile_size);
        }

        let mut slots = Vec::with_capacity(TILE_COUNT);
        for &tile_centre in &layout {
            match factory.build(tile_centre) {
                Ok(payload) => slots.push(Some(WorldTile {
                    centre: tile_centre,
                    payload,
                })),
                Err(e) => {
                    for tile in slots.into_iter().flatten() {
                        factory.destroy(tile.payload);
                    }
                    return Err(TileError::Build {
                        centre: tile_centre,
                        reason: e.to_string(),
                    });
                }
            }
        }

        tracing::info!(target: "world", centre = %centre, tile_size, "Tile grid built");

        Ok(Self {
            factory,
            tile_size,
            bounds: GridBounds::around(centre, tile_size / 2),
            layout,
            slots,
        })
    }

    /// 按相机位置更新网格
    pub fn update(&mut self, camera: &CameraState) -> TileResult<Option<ShiftDirection>> {
        self.update_position(camera.eye.x, camera.eye.z)
    }

    /// 按相机的 X/Z 坐标更新网格
    ///
    /// 依次检查 +X、-X、+Z、-Z，每次调用最多平移一次。
    pub fn update_position(&mut self, x: f32, z: f32) -> TileResult<Option<ShiftDirection>> {
        if self.bounds.contains(x, z) {
            return Ok(None);
        }

        let (px, pz) = (f64::from(x), f64::from(z));
        let direction = if px > self.bounds.max_x as f64 {
            ShiftDirection::PositiveX
        } else if px < self.bounds.min_x as f64 {
            ShiftDirection::NegativeX
        } else if pz > self.bounds.max_z as f64 {
            ShiftDirection::PositiveZ
        } else if pz < self.bounds.min_z as f64 {
            ShiftDirection::NegativeZ
        } else {
            return Ok(None);
        };

        self.shift(direction)?;
        Ok(Some(direction))
    }

    /// 把网格沿 `direction` 平移一个瓦片
    pub fn shift(&mut self, direction: ShiftDirection) -> TileResult<()> {
        let half = self.tile_size / 2;
        let span = GRID_DIM as i64 * self.tile_size;
        let (trailing, leading) = match direction {
            ShiftDirection::PositiveX => {
                let trailing = self.bounds.min_x - half;
                (trailing, trailing + span)
            }
            ShiftDirection::NegativeX => {
                let trailing = self.bounds.max_x + half;
                (trailing, trailing - span)
            }
            ShiftDirection::PositiveZ => {
                let trailing = self.bounds.min_z - half;
                (trailing, trailing + span)
            }
            ShiftDirection::NegativeZ => {
                let trailing = self.bounds.max_z + half;
                (trailing, trailing - span)
            }
        };
        let along_x = direction.along_x();

        let recycled: Vec<usize> = (0..TILE_COUNT)
            .filter(|&slot| {
                let centre = self.layout[slot];
                if along_x {
                    centre.x == trailing
                } else {
                    centre.z == trailing
                }
            })
            .collect();

        let mut moved: Vec<(usize, TileCoord)> = Vec::with_capacity(recycled.len());
        for slot in recycled {
            let old = self.layout[slot];
            let new = if along_x {
                TileCoord::new(leading, old.z)
            } else {
                TileCoord::new(old.x, leading)
            };

            self.release(slot);
            match self.factory.build(new) {
                Ok(payload) => {
                    self.layout[slot] = new;
                    self.slots[slot] = Some(WorldTile {
                        centre: new,
                        payload,
                    });
                    moved.push((slot, old));
                }
                Err(e) => {
                    let reason = e.to_string();
                    tracing::warn!(
                        target: "world",
                        centre = %new,
                        "Tile build failed, rolling back shift: {}",
                        reason
                    );
                    moved.push((slot, old));
                    self.rollback(&moved)?;
                    return Err(TileError::Build {
                        centre: new,
                        reason,
                    });
                }
            }
        }

        self.bounds = self.bounds.shifted(direction, self.tile_size);
        tracing::debug!(
            target: "world",
            ?direction,
            min_x = self.bounds.min_x,
            max_x = self.bounds.max_x,
            min_z = self.bounds.min_z,
            max_z = self.bounds.max_z,
            "Tile grid shifted"
        );
        Ok(())
    }

    /// 把槽位恢复到平移之前的中心
    fn rollback(&mut self, moved: &[(usize, TileCoord)]) -> TileResult<()> {
        let mut failure = None;
        for &(slot, old) in moved.iter().rev() {
            self.release(slot);
            self.layout[slot] = old;
            match self.factory.build(old) {
                Ok(payload) => {
                    self.slots[slot] = Some(WorldTile {
                        centre: old,
                        payload,
                    })
                }
                Err(e) => {
                    tracing::error!(target: "world", centre = %old, "Tile rollback failed: {}", e);
                    failure.get_or_insert(TileError::Rollback {
                        centre: old,
                        reason: e.to_string(),
                    });
                }
            }
        }
        failure.map_or(Ok(()), Err)
    }

    fn release(&mut self, slot: usize) {
        if let Some(tile) = self.slots[slot].take() {
            self.factory.destroy(tile.payload);
        }
    }

    /// 重新构建空缺的槽位，返回补上的瓦片数
    pub fn repair(&mut self) -> TileResult<usize> {
        let mut rebuilt = 0;
        for slot in 0..TILE_COUNT {
            if self.slots[slot].is_some() {
                continue;
            }
            let centre = self.layout[slot];
            let payload = self.factory.build(centre).map_err(|e| TileError::Build {
                centre,
                reason: e.to_string(),
            })?;
            self.slots[slot] = Some(WorldTile { centre, payload });
            rebuilt += 1;
        }
        Ok(rebuilt)
    }

    /// 销毁所有瓦片
    pub fn shutdown(&mut self) {
        for slot in 0..TILE_COUNT {
            self.release(slot);
        }
    }

    /// 存活的瓦片
    pub fn tiles(&self) -> impl Iterator<Item = &WorldTile<F::Tile>> {
        self.slots.iter().flatten()
    }

    pub fn live_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    /// 九个槽位是否都有瓦片
    pub fn is_intact(&self) -> bool {
        self.slots.iter().all(Option::is_some)
    }

    pub fn bounds(&self) -> GridBounds {
        self.bounds
    }

    pub fn tile_size(&self) -> i64 {
        self.tile_size
    }

    /// 中心瓦片的坐标
    pub fn centre(&self) -> TileCoord {
        let half = self.tile_size / 2;
        TileCoord::new(self.bounds.min_x + half, self.bounds.min_z + half)
    }

    pub fn factory(&self) -> &F {
        &self.factory
    }

    pub fn factory_mut(&mut self) -> &mut F {
        &mut self.factory
    }
}

impl<F: TileFactory> Drop for TileStreamController<F> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl<F: TileFactory> fmt::Debug for TileStreamController<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TileStreamController")
            .field("tile_size", &self.tile_size)
            .field("bounds", &self.bounds)
            .field("live", &self.live_count())
            .finish()
    }
}

/// 瓦片网格资源
#[derive(Resource)]
pub struct TileGrid<F>
where
    F: TileFactory + Send + Sync + 'static,
    F::Tile: Send + Sync + 'static,
{
    pub controller: TileStreamController<F>,
    /// 最近一次更新失败的原因
    pub last_error: Option<TileError>,
}

impl<F> TileGrid<F>
where
    F: TileFactory + Send + Sync + 'static,
    F::Tile: Send + Sync + 'static,
{
    pub fn new(controller: TileStreamController<F>) -> Self {
        Self {
            controller,
            last_error: None,
        }
    }
}

/// 瓦片流系统 - 按相机位置平移网格
///
/// 失败时记录日志并保存在 `last_error` 中，网格保持平移前的状态。
pub fn tile_stream_system<F>(camera: Res<CameraState>, mut grid: ResMut<TileGrid<F>>)
where
    F: TileFactory + Send + Sync + 'static,
    F::Tile: Send + Sync + 'static,
{
    match grid.controller.update(&camera) {
        Ok(_) => grid.last_error = None,
        Err(e) => {
            tracing::error!(target: "world", "Tile streaming failed: {}", e);
            grid.last_error = Some(e);
        }
    }
}
