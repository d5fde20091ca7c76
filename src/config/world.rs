use super::{ConfigError, ConfigResult};
use crate::impl_default;
use crate::scene::TileCoord;
use serde::{Deserialize, Serialize};

/// 世界配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// 瓦片边长（正偶数）
    pub tile_size: i64,

    /// 初始中心瓦片
    pub grid_centre: TileCoord,

    /// 地形随机种子
    pub seed: u64,
}

impl_default!(WorldConfig {
    tile_size: 6000,
    grid_centre: TileCoord::new(0, 0),
    seed: 0,
});

impl WorldConfig {
    /// 验证配置
    pub fn validate(&self) -> ConfigResult<()> {
        if self.tile_size <= 0 || self.tile_size % 2 != 0 {
            return Err(ConfigError::ValidationError(format!(
                "Tile size must be a positive even number, got {}",
                self.tile_size
            )));
        }
        Ok(())
    }
}
