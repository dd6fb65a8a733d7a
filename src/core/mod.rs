//! 核心功能模块
//!
//! 本模块提供了引擎的基础功能，包括日志系统、配置管理、错误处理和键盘输入。
//! 这些模块独立于具体的图形 API。
//!
//! # 模块组织
//!
//! - `log`：日志系统，提供结构化的日志记录功能
//! - `config`：配置管理，支持从配置文件加载引擎设置
//! - `error`：错误处理，定义统一的错误类型
//! - `input`：键盘状态表

pub mod log;
pub mod config;
pub mod error;
pub mod input;

// 重新导出常用类型，方便使用
pub use error::{Result, Dx11RenderError, GraphicsError};
pub use config::Config;
pub use input::InputSystem;
