#![cfg_attr(target_os = "windows", windows_subsystem = "windows")]

//! dx11_render - Direct3D 11 引导程序
//!
//! 打开一个窗口，初始化 Direct3D 11，每帧用灰色清屏并呈现，
//! 按 Escape 或关闭窗口退出。
//!
//! # 使用方法
//!
//! ```bash
//! # 可选：在工作目录放置 config.toml 覆盖默认设置
//! cargo run
//! ```
//!
//! # 架构概览
//!
//! ```text
//! ┌─────────────┐
//! │   main.rs   │  应用程序入口
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │  Win32Host  │  窗口与消息泵
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │ Application │  键盘状态 + 主循环
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │  Graphics   │  清屏 / 呈现
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │ D3dContext  │  设备、交换链、深度模板、光栅化
//! └─────────────┘
//! ```

use dx11_render::core::{log, Config};
use dx11_render::{engine_error, engine_info, engine_warn};

/// 应用程序入口点
///
/// # 初始化流程
///
/// 1. 加载引擎配置文件（config.toml）
/// 2. 初始化日志系统，报告配置文件错误
/// 3. 验证配置
/// 4. 创建窗口并初始化图形
/// 5. 运行主循环，退出后按顺序关闭
fn main() {
    // 1. 加载配置（在初始化日志之前，错误留到日志就绪后报告）
    let (config, config_error) = Config::from_file_or_default("config.toml");

    // 2. 初始化日志系统
    let file_output = log::file_output_enabled(config.logging.file_output);
    let log_file = if file_output {
        Some(config.logging.log_file.as_str())
    } else {
        None
    };
    log::init_logger(config.logging.level, file_output, log_file);
    engine_info!(version = env!("CARGO_PKG_VERSION"), "dx11_render starting...");

    if let Some(e) = config_error {
        engine_warn!("Ignoring config.toml, using defaults: {}", e);
    }

    // 3. 验证配置
    if let Err(e) = config.validate() {
        engine_error!("Invalid configuration: {}", e);
        eprintln!("Invalid configuration: {}", e);
        std::process::exit(1);
    }

    if let Err(e) = run(&config) {
        engine_error!("{:#}", e);
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }

    engine_info!("Shutdown complete");
}

#[cfg(target_os = "windows")]
fn run(config: &Config) -> anyhow::Result<()> {
    use anyhow::Context;
    use dx11_render::app::win32::Win32Host;
    use tracing::info;

    info!(
        width = config.window.width,
        height = config.window.height,
        fullscreen = config.window.fullscreen,
        vsync = config.graphics.vsync,
        "Graphics configuration"
    );

    let mut host = Win32Host::initialize(config).context("Failed to initialize application")?;
    let result = host.run().context("Main loop stopped on error");
    host.shutdown();
    result
}

#[cfg(not(target_os = "windows"))]
fn run(_config: &Config) -> anyhow::Result<()> {
    anyhow::bail!("Direct3D 11 requires Windows")
}
