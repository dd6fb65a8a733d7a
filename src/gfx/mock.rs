//! Recording `GraphicsApi` double for unit tests.
//!
//! Every native call is appended to a shared call log; handles log
//! `release:<name>` when dropped so release order can be asserted.

use std::cell::RefCell;
use std::rc::Rc;

use crate::core::error::{GraphicsError, Result};

use super::adapter::{AdapterInfo, DisplayMode};
use super::backend::{
    DepthBufferDesc, DepthStencilDesc, DepthStencilViewDesc, DeviceHandles, FeatureLevel,
    Format, GraphicsApi, RasterizerDesc, SwapChainDesc, Viewport,
};

/// Calls that can be made to fail with [`MockApi::failing_at`].
pub(crate) const FAILABLE_STEPS: [&str; 7] = [
    "query_adapter",
    "create_device_and_swap_chain",
    "create_render_target_view",
    "create_depth_buffer",
    "create_depth_stencil_state",
    "create_depth_stencil_view",
    "create_rasterizer_state",
];

#[derive(Default)]
struct MockState {
    calls: Vec<String>,
    live_handles: usize,
    swap_chain_desc: Option<SwapChainDesc<u32>>,
    viewport: Option<Viewport>,
}

#[derive(Clone)]
pub(crate) struct MockApi {
    state: Rc<RefCell<MockState>>,
    fail_at: Option<&'static str>,
    display_modes: Vec<DisplayMode>,
    description: String,
    dedicated_video_memory: usize,
}

pub(crate) struct MockHandle {
    name: &'static str,
    state: Rc<RefCell<MockState>>,
}

impl Drop for MockHandle {
    fn drop(&mut self) {
        let mut state = self.state.borrow_mut();
        state.calls.push(format!("release:{}", self.name));
        state.live_handles -= 1;
    }
}

impl MockApi {
    pub(crate) fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(MockState::default())),
            fail_at: None,
            display_modes: Vec::new(),
            description: "Mock Adapter".to_string(),
            dedicated_video_memory: 0,
        }
    }

    pub(crate) fn failing_at(mut self, call: &'static str) -> Self {
        self.fail_at = Some(call);
        self
    }

    pub(crate) fn with_display_modes(mut self, modes: Vec<DisplayMode>) -> Self {
        self.display_modes = modes;
        self
    }

    pub(crate) fn with_adapter(mut self, description: &str, dedicated_video_memory: usize) -> Self {
        self.description = description.to_string();
        self.dedicated_video_memory = dedicated_video_memory;
        self
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.state.borrow().calls.clone()
    }

    pub(crate) fn clear_calls(&self) {
        self.state.borrow_mut().calls.clear();
    }

    /// Number of logged calls starting with `prefix`.
    pub(crate) fn count(&self, prefix: &str) -> usize {
        self.state
            .borrow()
            .calls
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    pub(crate) fn live_handles(&self) -> usize {
        self.state.borrow().live_handles
    }

    pub(crate) fn swap_chain_desc(&self) -> Option<SwapChainDesc<u32>> {
        self.state.borrow().swap_chain_desc.clone()
    }

    pub(crate) fn viewport(&self) -> Option<Viewport> {
        self.state.borrow().viewport
    }

    fn record(&self, call: impl Into<String>) {
        self.state.borrow_mut().calls.push(call.into());
    }

    fn step(&self, call: &'static str) -> Result<()> {
        self.record(call);
        if self.fail_at == Some(call) {
            return Err(GraphicsError::ResourceCreation(format!("{call} failed")).into());
        }
        Ok(())
    }

    fn handle(&self, name: &'static str) -> MockHandle {
        self.state.borrow_mut().live_handles += 1;
        MockHandle {
            name,
            state: Rc::clone(&self.state),
        }
    }
}

impl GraphicsApi for MockApi {
    type WindowHandle = u32;
    type Device = MockHandle;
    type DeviceContext = MockHandle;
    type SwapChain = MockHandle;
    type RenderTargetView = MockHandle;
    type Texture = MockHandle;
    type DepthStencilState = MockHandle;
    type DepthStencilView = MockHandle;
    type RasterizerState = MockHandle;

    fn query_adapter(&self, format: Format) -> Result<AdapterInfo> {
        assert_eq!(format, Format::R8G8B8A8Unorm);
        self.step("query_adapter")?;
        Ok(AdapterInfo {
            display_modes: self.display_modes.clone(),
            description: self.description.clone(),
            dedicated_video_memory: self.dedicated_video_memory,
        })
    }

    fn create_device_and_swap_chain(
        &self,
        desc: &SwapChainDesc<u32>,
        feature_level: FeatureLevel,
    ) -> Result<DeviceHandles<Self>> {
        assert_eq!(feature_level, FeatureLevel::Level11_1);
        self.step("create_device_and_swap_chain")?;
        self.state.borrow_mut().swap_chain_desc = Some(desc.clone());
        Ok(DeviceHandles {
            device: self.handle("device"),
            device_context: self.handle("device_context"),
            swap_chain: self.handle("swap_chain"),
        })
    }

    fn create_render_target_view(&self, _: &MockHandle, _: &MockHandle) -> Result<MockHandle> {
        self.step("create_render_target_view")?;
        Ok(self.handle("render_target_view"))
    }

    fn create_depth_buffer(&self, _: &MockHandle, _: &DepthBufferDesc) -> Result<MockHandle> {
        self.step("create_depth_buffer")?;
        Ok(self.handle("depth_stencil_buffer"))
    }

    fn create_depth_stencil_state(&self, _: &MockHandle, _: &DepthStencilDesc) -> Result<MockHandle> {
        self.step("create_depth_stencil_state")?;
        Ok(self.handle("depth_stencil_state"))
    }

    fn create_depth_stencil_view(
        &self,
        _: &MockHandle,
        depth_buffer: &MockHandle,
        _: &DepthStencilViewDesc,
    ) -> Result<MockHandle> {
        assert_eq!(depth_buffer.name, "depth_stencil_buffer");
        self.step("create_depth_stencil_view")?;
        Ok(self.handle("depth_stencil_view"))
    }

    fn set_depth_stencil_state(&self, _: &MockHandle, _: &MockHandle, _: u32) {
        self.record("set_depth_stencil_state");
    }

    fn set_render_targets(&self, _: &MockHandle, _: &MockHandle, _: &MockHandle) {
        self.record("set_render_targets");
    }

    fn create_rasterizer_state(&self, _: &MockHandle, _: &RasterizerDesc) -> Result<MockHandle> {
        self.step("create_rasterizer_state")?;
        Ok(self.handle("rasterizer_state"))
    }

    fn set_rasterizer_state(&self, _: &MockHandle, _: &MockHandle) {
        self.record("set_rasterizer_state");
    }

    fn set_viewport(&self, _: &MockHandle, viewport: &Viewport) {
        self.record("set_viewport");
        self.state.borrow_mut().viewport = Some(*viewport);
    }

    fn clear_render_target(&self, _: &MockHandle, _: &MockHandle, color: [f32; 4]) {
        self.record(format!("clear_render_target:{color:?}"));
    }

    fn clear_depth_stencil(&self, _: &MockHandle, _: &MockHandle, depth: f32, stencil: u8) {
        self.record(format!("clear_depth_stencil:{depth}:{stencil}"));
    }

    fn present(&self, _: &MockHandle, sync_interval: u32) -> Result<()> {
        self.record(format!("present:{sync_interval}"));
        if self.fail_at == Some("present") {
            return Err(GraphicsError::Present("device removed".to_string()).into());
        }
        Ok(())
    }

    fn set_fullscreen_state(&self, _: &MockHandle, fullscreen: bool) -> Result<()> {
        self.record(format!("set_fullscreen_state:{fullscreen}"));
        Ok(())
    }
}
