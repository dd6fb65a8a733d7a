//! 配置管理模块
//!
//! 提供引擎配置的加载、解析和管理功能。
//! 默认值即编译期常量（全屏、垂直同步、近/远裁剪面），
//! `config.toml` 存在时可以覆盖其中的任意一项。
//!
//! # 配置文件格式 (config.toml)
//!
//! ```toml
//! [window]
//! title = "Engine"
//! width = 800
//! height = 600
//! fullscreen = false
//!
//! [graphics]
//! vsync = true
//! screen_depth = 1000.0
//! screen_near = 0.1
//! clear_color = [0.5, 0.5, 0.5, 1.0]
//!
//! [logging]
//! level = "info"      # trace, debug, info, warn, error
//! file_output = false
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use super::error::{ConfigError, Dx11RenderError, Result};

/// 是否以全屏模式启动
pub const FULL_SCREEN: bool = false;
/// 是否开启垂直同步
pub const VSYNC_ENABLED: bool = true;
/// 远裁剪面
pub const SCREEN_DEPTH: f32 = 1000.0;
/// 近裁剪面
pub const SCREEN_NEAR: f32 = 0.1;

/// 引擎配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// 窗口配置
    #[serde(default)]
    pub window: WindowConfig,

    /// 图形配置
    #[serde(default)]
    pub graphics: GraphicsConfig,

    /// 日志配置
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// 窗口配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowConfig {
    /// 窗口标题，同时作为窗口类名
    #[serde(default = "default_title")]
    pub title: String,

    /// 窗口模式下的宽度（全屏时使用桌面分辨率）
    #[serde(default = "default_width")]
    pub width: u32,

    /// 窗口模式下的高度
    #[serde(default = "default_height")]
    pub height: u32,

    /// 是否全屏
    #[serde(default = "default_fullscreen")]
    pub fullscreen: bool,
}

/// 图形配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphicsConfig {
    /// 垂直同步
    #[serde(default = "default_vsync")]
    pub vsync: bool,

    /// 远裁剪面
    #[serde(default = "default_screen_depth")]
    pub screen_depth: f32,

    /// 近裁剪面
    #[serde(default = "default_screen_near")]
    pub screen_near: f32,

    /// 每帧的清屏颜色（RGBA）
    #[serde(default = "default_clear_color")]
    pub clear_color: [f32; 4],
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: LogLevel,

    /// 是否输出到文件
    #[serde(default = "default_file_output")]
    pub file_output: bool,

    /// 日志文件路径
    #[serde(default = "default_log_file")]
    pub log_file: String,
}

/// 日志级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

// 默认值函数
fn default_title() -> String { "Engine".to_string() }
fn default_width() -> u32 { 800 }
fn default_height() -> u32 { 600 }
fn default_fullscreen() -> bool { FULL_SCREEN }
fn default_vsync() -> bool { VSYNC_ENABLED }
fn default_screen_depth() -> f32 { SCREEN_DEPTH }
fn default_screen_near() -> f32 { SCREEN_NEAR }
fn default_clear_color() -> [f32; 4] { [0.5, 0.5, 0.5, 1.0] }
fn default_log_level() -> LogLevel { LogLevel::Info }
fn default_file_output() -> bool { false }
fn default_log_file() -> String { "dx11render.log".to_string() }

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            width: default_width(),
            height: default_height(),
            fullscreen: default_fullscreen(),
        }
    }
}

impl Default for GraphicsConfig {
    fn default() -> Self {
        Self {
            vsync: default_vsync(),
            screen_depth: default_screen_depth(),
            screen_near: default_screen_near(),
            clear_color: default_clear_color(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file_output: default_file_output(),
            log_file: default_log_file(),
        }
    }
}

impl Config {
    /// 从配置文件加载
    ///
    /// # 参数
    ///
    /// * `path` - 配置文件路径
    ///
    /// # 返回值
    ///
    /// 成功返回 `Config` 实例，失败返回错误
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_str = path.as_ref().to_string_lossy().to_string();

        let contents = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ConfigError::FileNotFound(path_str.clone()).into(),
            _ => Dx11RenderError::from(e),
        })?;

        Self::from_toml_str(&contents)
    }

    /// 从 TOML 字符串解析配置，缺失的字段使用默认值
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        toml::from_str(contents)
            .map_err(|e| ConfigError::ParseError(e.to_string()).into())
    }

    /// 从配置文件加载，失败时使用默认配置
    ///
    /// 文件不存在是正常情况，不返回错误；文件存在但无法读取或解析时，
    /// 错误随默认配置一起返回，由调用方在日志系统就绪后报告。
    pub fn from_file_or_default<P: AsRef<Path>>(path: P) -> (Self, Option<Dx11RenderError>) {
        match Self::from_file(path) {
            Ok(config) => (config, None),
            Err(Dx11RenderError::Config(ConfigError::FileNotFound(_))) => (Self::default(), None),
            Err(e) => (Self::default(), Some(e)),
        }
    }

    /// 验证配置的有效性
    ///
    /// # 返回值
    ///
    /// 配置有效返回 `Ok(())`，否则返回错误
    pub fn validate(&self) -> Result<()> {
        if self.window.width == 0 || self.window.height == 0 {
            return Err(ConfigError::InvalidValue {
                field: "window.width/height".to_string(),
                reason: "Window dimensions must be greater than 0".to_string(),
            }.into());
        }

        if !(self.graphics.screen_near > 0.0) {
            return Err(ConfigError::InvalidValue {
                field: "graphics.screen_near".to_string(),
                reason: "Near plane must be greater than 0".to_string(),
            }.into());
        }

        if !(self.graphics.screen_depth > self.graphics.screen_near) {
            return Err(ConfigError::InvalidValue {
                field: "graphics.screen_depth".to_string(),
                reason: "Far plane must be beyond the near plane".to_string(),
            }.into());
        }

        Ok(())
    }
}
