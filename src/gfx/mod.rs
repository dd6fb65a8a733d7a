//! 图形后端模块
//!
//! 本模块封装了 Direct3D 11 的底层实现，包括：
//! - `adapter`：显卡与显示模式信息
//! - `backend`：统一的原生图形服务接口 `GraphicsApi`
//! - `context`：设备封装 `D3dContext`（初始化、清屏、Present、关闭）
//! - `d3d11`：基于 `windows` crate 的生产实现（仅 Windows）
//!
//! 设备封装只依赖 `GraphicsApi`，因此可以在任意平台上用测试替身验证。

pub mod adapter;
pub mod backend;
pub mod context;
#[cfg(target_os = "windows")]
pub mod d3d11;
#[cfg(test)]
pub(crate) mod mock;

pub use backend::GraphicsApi;
pub use context::{D3dContext, DeviceSettings};
#[cfg(target_os = "windows")]
pub use d3d11::Direct3D11;
