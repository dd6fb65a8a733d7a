//! dx11_render - Direct3D 11 引导程序
//!
//! 创建窗口，初始化设备、交换链、深度模板和光栅化状态，
//! 然后每帧清屏并呈现。
//!
//! # 模块结构
//!
//! - `core`: 核心功能模块（日志、配置、错误处理、键盘状态）
//! - `math`: 投影矩阵与颜色
//! - `gfx`: 图形后端抽象层与 Direct3D 11 实现
//! - `renderer`: 每帧渲染驱动
//! - `app`: 应用程序宿主与 Win32 窗口
//!
//! # 使用示例
//!
//! ```no_run
//! use dx11_render::core::InputSystem;
//! use dx11_render::core::input::VK_ESCAPE;
//!
//! let mut input = InputSystem::new();
//! input.key_down(VK_ESCAPE);
//! assert!(input.is_key_down(VK_ESCAPE));
//! ```

pub mod core;
pub mod math;
pub mod gfx;
pub mod renderer;
pub mod app;
