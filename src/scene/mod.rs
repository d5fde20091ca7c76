//! 场景系统
//!
//! 提供飞行相机、无限世界的瓦片流式加载和每个瓦片的地形场景生成。

pub mod camera;
pub mod terrain;
pub mod tiles;

pub use camera::{CameraMove, CameraState, Turn};
pub use terrain::{Placement, PropKind, TerrainScene, TerrainSceneFactory};
pub use tiles::{
    tile_stream_system, GridBounds, ShiftDirection, TileCoord, TileFactory, TileGrid,
    TileStreamController, WorldTile, GRID_DIM, TILE_COUNT,
};
