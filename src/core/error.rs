//! 错误处理模块
//!
//! 定义了引擎中使用的统一错误类型。
//!
//! # 设计原则
//!
//! - 为每种错误类型提供清晰的上下文信息
//! - 支持错误链（error source）
//! - 易于模式匹配和错误处理

use std::fmt;

/// 引擎统一的 Result 类型
///
/// 所有可能返回错误的函数都应该使用这个类型。
pub type Result<T> = std::result::Result<T, Dx11RenderError>;

/// 引擎的错误类型
#[derive(Debug)]
pub enum Dx11RenderError {
    /// 配置错误
    Config(ConfigError),

    /// 图形 API 错误
    Graphics(GraphicsError),

    /// 窗口系统错误
    Window(String),

    /// IO 错误
    Io(std::io::Error),

    /// 初始化错误
    Initialization(String),
}

/// 配置相关的错误
#[derive(Debug)]
pub enum ConfigError {
    /// 配置文件未找到
    FileNotFound(String),

    /// 配置文件解析失败
    ParseError(String),

    /// 配置值无效
    InvalidValue { field: String, reason: String },
}

/// 图形 API 相关的错误
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphicsError {
    /// 适配器 / 输出 / 显示模式枚举失败
    AdapterEnumeration(String),

    /// 设备创建失败
    DeviceCreation(String),

    /// 交换链错误
    SwapchainError(String),

    /// 资源创建失败
    ResourceCreation(String),

    /// Present 失败
    Present(String),

    /// 设备尚未初始化或已经关闭
    NotInitialized,

    /// 设备已经初始化
    AlreadyInitialized,
}

impl fmt::Display for Dx11RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dx11RenderError::Config(e) => write!(f, "Configuration error: {}", e),
            Dx11RenderError::Graphics(e) => write!(f, "Graphics error: {}", e),
            Dx11RenderError::Window(msg) => write!(f, "Window error: {}", msg),
            Dx11RenderError::Io(e) => write!(f, "IO error: {}", e),
            Dx11RenderError::Initialization(msg) => write!(f, "Initialization error: {}", msg),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::FileNotFound(path) => write!(f, "Config file not found: {}", path),
            ConfigError::ParseError(msg) => write!(f, "Failed to parse config: {}", msg),
            ConfigError::InvalidValue { field, reason } => {
                write!(f, "Invalid value for '{}': {}", field, reason)
            }
        }
    }
}

impl fmt::Display for GraphicsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphicsError::AdapterEnumeration(msg) => write!(f, "Adapter enumeration failed: {}", msg),
            GraphicsError::DeviceCreation(msg) => write!(f, "Device creation failed: {}", msg),
            GraphicsError::SwapchainError(msg) => write!(f, "Swapchain error: {}", msg),
            GraphicsError::ResourceCreation(msg) => write!(f, "Resource creation failed: {}", msg),
            GraphicsError::Present(msg) => write!(f, "Present failed: {}", msg),
            GraphicsError::NotInitialized => write!(f, "Graphics device is not initialized"),
            GraphicsError::AlreadyInitialized => write!(f, "Graphics device is already initialized"),
        }
    }
}

impl std::error::Error for Dx11RenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Dx11RenderError::Io(e) => Some(e),
            Dx11RenderError::Config(e) => Some(e),
            Dx11RenderError::Graphics(e) => Some(e),
            _ => None,
        }
    }
}

impl std::error::Error for ConfigError {}
impl std::error::Error for GraphicsError {}

// 实现 From trait 以便于错误转换
impl From<std::io::Error> for Dx11RenderError {
    fn from(err: std::io::Error) -> Self {
        Dx11RenderError::Io(err)
    }
}

impl From<ConfigError> for Dx11RenderError {
    fn from(err: ConfigError) -> Self {
        Dx11RenderError::Config(err)
    }
}

impl From<GraphicsError> for Dx11RenderError {
    fn from(err: GraphicsError) -> Self {
        Dx11RenderError::Graphics(err)
    }
}
