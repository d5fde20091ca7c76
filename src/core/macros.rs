//! 核心宏定义
//!
//! 提供统一的宏来减少配置结构体的样板代码

/// 为结构体实现Default trait的宏
///
/// 使用示例:
/// ```rust
/// use skyisle::impl_default;
///
/// struct TileSettings {
///     tile_size: i64,
///     seed: u64,
/// }
///
/// impl_default!(TileSettings {
///     tile_size: 6000,
///     seed: 0,
/// });
///
/// assert_eq!(TileSettings::default().tile_size, 6000);
/// ```
#[macro_export]
macro_rules! impl_default {
    ($struct_name:ident {
        $($field:ident: $value:expr),* $(,)?
    }) => {
        impl Default for $struct_name {
            fn default() -> Self {
                Self {
                    $($field: $value),*
                }
            }
        }
    };
}
