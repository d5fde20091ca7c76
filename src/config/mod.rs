/// 统一配置系统
///
/// 提供TOML/JSON配置文件和环境变量覆盖
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub mod animation;
pub mod camera;
pub mod world;

pub use animation::AnimationConfig;
pub use camera::CameraConfig;
pub use world::WorldConfig;

/// 配置错误
#[derive(Error, Debug)]
pub enum ConfigError {
    /// 文件读取错误
    #[error("Config file error: {0}")]
    FileError(#[from] std::io::Error),
    /// 解析错误
    #[error("Config parse error: {0}")]
    ParseError(String),
    /// 验证错误
    #[error("Config validation error: {0}")]
    ValidationError(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// 查看器主配置
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewerConfig {
    /// 动画配置
    #[serde(default)]
    pub animation: AnimationConfig,

    /// 世界配置
    #[serde(default)]
    pub world: WorldConfig,

    /// 相机配置
    #[serde(default)]
    pub camera: CameraConfig,

    /// 日志配置
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ViewerConfig {
    /// 创建默认配置
    pub fn new() -> Self {
        Self::default()
    }

    /// 从TOML文件加载配置
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(ConfigError::FileError)?;
        Self::from_toml_str(&content)
    }

    /// 从TOML字符串解析配置
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// 从JSON文件加载配置
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(ConfigError::FileError)?;
        Self::from_json_str(&content)
    }

    /// 从JSON字符串解析配置
    pub fn from_json_str(content: &str) -> ConfigResult<Self> {
        serde_json::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// 按扩展名加载配置（`.json` 为JSON，其余为TOML）
    pub fn from_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let path = path.as_ref();
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json_file(path),
            _ => Self::from_toml_file(path),
        }
    }

    /// 保存为TOML文件
    pub fn save_toml<P: AsRef<Path>>(&self, path: P) -> ConfigResult<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        fs::write(path, content).map_err(ConfigError::FileError)
    }

    /// 保存为JSON文件
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> ConfigResult<()> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;
        fs::write(path, content).map_err(ConfigError::FileError)
    }

    /// 从环境变量覆盖配置
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| env::var(key).ok());
    }

    /// 用给定的查找函数覆盖配置，无法解析的值被忽略
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        fn parse<T: std::str::FromStr>(value: Option<String>) -> Option<T> {
            value.and_then(|v| v.trim().parse().ok())
        }

        // 动画配置
        if let Some(speed) = parse(lookup("SKYISLE_ANIMATION_SPEED")) {
            self.animation.playback_speed = speed;
        }
        if let Some(play) = parse(lookup("SKYISLE_ANIMATION_PLAY")) {
            self.animation.play_on_start = play;
        }
        if let Some(mode) = lookup("SKYISLE_ANIMATION_INTERPOLATION") {
            match mode.trim().to_ascii_lowercase().as_str() {
                "linear" => self.animation.interpolation = Some(crate::animation::InterpolationMode::Linear),
                "step" => self.animation.interpolation = Some(crate::animation::InterpolationMode::Step),
                _ => {}
            }
        }

        // 世界配置
        if let Some(size) = parse(lookup("SKYISLE_WORLD_TILE_SIZE")) {
            self.world.tile_size = size;
        }
        if let Some(seed) = parse(lookup("SKYISLE_WORLD_SEED")) {
            self.world.seed = seed;
        }

        // 相机配置
        if let Some(speed) = parse(lookup("SKYISLE_CAMERA_MOVEMENT_SPEED")) {
            self.camera.movement_speed = speed;
        }
        if let Some(speed) = parse(lookup("SKYISLE_CAMERA_ROTATION_SPEED")) {
            self.camera.rotation_speed = speed;
        }

        // 日志配置
        if let Some(level) = lookup("SKYISLE_LOG_LEVEL").and_then(|v| LogLevel::parse(&v)) {
            self.logging.level = level;
        }
    }

    /// 验证配置
    pub fn validate(&self) -> ConfigResult<()> {
        self.animation.validate()?;
        self.world.validate()?;
        self.camera.validate()?;
        Ok(())
    }

    /// 配置文件的查找顺序
    ///
    /// 1. ./skyisle.toml
    /// 2. ./skyisle.json
    /// 3. ~/.config/skyisle/config.toml
    pub fn search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("skyisle.toml"), PathBuf::from("skyisle.json")];
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("skyisle").join("config.toml"));
        }
        paths
    }

    /// 自动查找并加载配置文件，全部失败时使用默认配置
    pub fn load_or_default() -> LoadedConfig {
        Self::load_first(Self::search_paths())
    }

    /// 依次尝试给定路径，返回第一个能加载的配置
    ///
    /// 存在但无法加载的文件记录在 `skipped` 中，由调用方在日志初始化后报告。
    pub fn load_first<I>(paths: I) -> LoadedConfig
    where
        I: IntoIterator<Item = PathBuf>,
    {
        let mut skipped = Vec::new();
        for path in paths {
            if !path.exists() {
                continue;
            }
            match Self::from_file(&path) {
                Ok(config) => {
                    return LoadedConfig {
                        config,
                        source: Some(path),
                        skipped,
                    }
                }
                Err(e) => skipped.push((path, e)),
            }
        }
        LoadedConfig {
            config: Self::default(),
            source: None,
            skipped,
        }
    }
}

/// 自动加载的结果
#[derive(Debug)]
pub struct LoadedConfig {
    /// 生效的配置
    pub config: ViewerConfig,
    /// 加载来源（默认配置时为 None）
    pub source: Option<PathBuf>,
    /// 存在但加载失败的文件
    pub skipped: Vec<(PathBuf, ConfigError)>,
}

/// 日志配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 日志级别
    pub level: LogLevel,

    /// 是否输出到控制台
    pub log_to_console: bool,

    /// 是否输出 target 字段
    pub show_targets: bool,
}

use crate::impl_default;

impl_default!(LoggingConfig {
    level: LogLevel::Info,
    log_to_console: true,
    show_targets: true,
});

/// 日志级别
///
/// 配置文件中使用小写名称，与 `SKYISLE_LOG_LEVEL` 一致；首字母大写的写法也被接受。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// 跟踪
    #[serde(alias = "Trace")]
    Trace,
    /// 调试
    #[serde(alias = "Debug")]
    Debug,
    /// 信息
    #[serde(alias = "Info")]
    Info,
    /// 警告
    #[serde(alias = "Warn", alias = "warning")]
    Warn,
    /// 错误
    #[serde(alias = "Error")]
    Error,
}

impl LogLevel {
    /// 不区分大小写地解析级别名称
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "trace" => Some(LogLevel::Trace),
            "debug" => Some(LogLevel::Debug),
            "info" => Some(LogLevel::Info),
            "warn" | "warning" => Some(LogLevel::Warn),
            "error" => Some(LogLevel::Error),
            _ => None,
        }
    }

    /// `EnvFilter` 使用的指令
    pub fn as_directive(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}
