//! 渲染器模块
//!
//! `Graphics` 是每帧驱动：用配置的背景色清屏，再呈现。
//! 设备相关的工作全部交给 [`D3dContext`]。

use tracing::{debug, info};

use crate::core::error::Result;
use crate::gfx::{D3dContext, DeviceSettings, GraphicsApi};
use crate::math::Color;

pub struct Graphics<A: GraphicsApi> {
    d3d: D3dContext<A>,
    clear_color: Color,
}

impl<A: GraphicsApi> Graphics<A> {
    pub fn new(api: A, clear_color: Color) -> Self {
        Self {
            d3d: D3dContext::new(api),
            clear_color,
        }
    }

    pub fn initialize(&mut self, settings: &DeviceSettings, window: A::WindowHandle) -> Result<()> {
        self.d3d.initialize(settings, window)?;

        let (adapter, memory_mb) = self.d3d.video_card_info();
        info!(adapter, memory_mb, "Graphics initialized");
        Ok(())
    }

    /// 处理一帧
    pub fn frame(&mut self) -> Result<()> {
        self.render()
    }

    fn render(&mut self) -> Result<()> {
        let Color { r, g, b, a } = self.clear_color;
        self.d3d.begin_scene(r, g, b, a)?;
        self.d3d.end_scene()
    }

    pub fn shutdown(&mut self) {
        debug!("Shutting down graphics");
        self.d3d.shutdown();
    }

    pub fn d3d(&self) -> &D3dContext<A> {
        &self.d3d
    }
}
