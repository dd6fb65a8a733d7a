//! 显卡适配器信息
//!
//! 初始化设备前需要先从主显卡的主输出枚举显示模式，
//! 选出与窗口分辨率一致的刷新率，并记录显卡名称和专用显存大小。

use std::fmt;

/// 刷新率（分子 / 分母）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshRate {
    pub numerator: u32,
    pub denominator: u32,
}

impl RefreshRate {
    /// 不限制刷新率（0/1），由驱动自行决定
    pub const UNCONSTRAINED: RefreshRate = RefreshRate { numerator: 0, denominator: 1 };

    pub const fn new(numerator: u32, denominator: u32) -> Self {
        Self { numerator, denominator }
    }
}

impl Default for RefreshRate {
    fn default() -> Self {
        Self::UNCONSTRAINED
    }
}

/// 输出设备支持的一个显示模式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayMode {
    pub width: u32,
    pub height: u32,
    pub refresh_rate: RefreshRate,
}

/// 适配器查询结果
///
/// 平台实现在返回前释放 factory、adapter 和 output。
#[derive(Debug, Clone, Default)]
pub struct AdapterInfo {
    /// 主输出在 32 位颜色格式下支持的显示模式
    pub display_modes: Vec<DisplayMode>,
    /// 显卡描述
    pub description: String,
    /// 专用显存（字节）
    pub dedicated_video_memory: usize,
}

impl AdapterInfo {
    /// 找出与请求分辨率一致的显示模式的刷新率
    ///
    /// 有多个匹配时取枚举顺序中的最后一个；没有匹配时返回 0/1。
    pub fn refresh_rate_for(&self, width: u32, height: u32) -> RefreshRate {
        self.display_modes
            .iter()
            .rev()
            .find(|mode| mode.width == width && mode.height == height)
            .map(|mode| mode.refresh_rate)
            .unwrap_or_default()
    }

    /// 专用显存（MB）
    pub fn dedicated_video_memory_mb(&self) -> usize {
        self.dedicated_video_memory / (1 << 20)
    }
}

/// 显卡名称
///
/// 最多保存 [`AdapterName::MAX_CHARS`] 个字符，超出部分被截断。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdapterName(String);

impl AdapterName {
    /// 名称长度上限（字符数）：128 字节缓冲区去掉结尾的 NUL
    pub const MAX_CHARS: usize = 127;

    pub fn new(name: &str) -> Self {
        Self(name.chars().take(Self::MAX_CHARS).collect())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AdapterName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mode(width: u32, height: u32, numerator: u32, denominator: u32) -> DisplayMode {
        DisplayMode {
            width,
            height,
            refresh_rate: RefreshRate::new(numerator, denominator),
        }
    }

    #[test]
    fn test_refresh_rate_last_match_wins() {
        let info = AdapterInfo {
            display_modes: vec![
                mode(640, 480, 60, 1),
                mode(800, 600, 59940, 1000),
                mode(800, 600, 60000, 1000),
                mode(1920, 1080, 144, 1),
            ],
            ..Default::default()
        };

        assert_eq!(info.refresh_rate_for(800, 600), RefreshRate::new(60000, 1000));
    }

    #[test]
    fn test_refresh_rate_without_match_is_unconstrained() {
        let info = AdapterInfo {
            display_modes: vec![mode(1920, 1080, 60, 1)],
            ..Default::default()
        };

        assert_eq!(info.refresh_rate_for(800, 600), RefreshRate::UNCONSTRAINED);
    }

    #[test]
    fn test_video_memory_in_megabytes() {
        let info = AdapterInfo {
            dedicated_video_memory: 4 * 1024 * 1024 * 1024 + 512 * 1024,
            ..Default::default()
        };
        assert_eq!(info.dedicated_video_memory_mb(), 4096);
    }

    #[test]
    fn test_adapter_name_truncated() {
        let long = "x".repeat(200);
        let name = AdapterName::new(&long);
        assert_eq!(name.as_str().chars().count(), AdapterName::MAX_CHARS);

        let exact = AdapterName::new(&"y".repeat(128));
        assert_eq!(exact.as_str().len(), 127);

        let short = AdapterName::new("NVIDIA GeForce RTX 3080");
        assert_eq!(short.to_string(), "NVIDIA GeForce RTX 3080");
    }
}
