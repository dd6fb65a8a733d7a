//! 图形平台服务的统一接口
//!
//! `GraphicsApi` 描述了设备封装（[`D3dContext`](super::context::D3dContext)）
//! 所需要的全部原生调用：适配器查询、设备与交换链创建、纹理/视图/状态对象创建、
//! 绑定、清屏、Present 和全屏切换。
//!
//! 句柄是关联类型，释放句柄就是 drop 它。生产实现见 `gfx::d3d11`，
//! 测试中使用记录调用顺序的替身。

use crate::core::error::Result;

use super::adapter::{AdapterInfo, RefreshRate};

/// 像素格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// 32 位 RGBA，后缓冲使用
    R8G8B8A8Unorm,
    /// 24 位深度 + 8 位模板
    D24UnormS8Uint,
}

/// 功能级别
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureLevel {
    Level11_1,
}

/// 交换链描述
#[derive(Debug, Clone, PartialEq)]
pub struct SwapChainDesc<W> {
    pub buffer_count: u32,
    pub width: u32,
    pub height: u32,
    pub format: Format,
    pub refresh_rate: RefreshRate,
    pub output_window: W,
    pub sample_count: u32,
    pub sample_quality: u32,
    pub windowed: bool,
    /// Present 之后丢弃后缓冲内容
    pub discard_on_present: bool,
}

/// 深度缓冲纹理描述
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepthBufferDesc {
    pub width: u32,
    pub height: u32,
    pub mip_levels: u32,
    pub array_size: u32,
    pub format: Format,
    pub sample_count: u32,
    pub sample_quality: u32,
}

/// 比较函数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonFunc {
    Less,
    Always,
}

/// 模板操作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StencilOp {
    Keep,
    Increment,
}

/// 单面的模板测试配置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StencilFaceDesc {
    pub fail_op: StencilOp,
    pub depth_fail_op: StencilOp,
    pub pass_op: StencilOp,
    pub func: ComparisonFunc,
}

/// 深度模板状态描述
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepthStencilDesc {
    pub depth_enable: bool,
    pub depth_write_all: bool,
    pub depth_func: ComparisonFunc,
    pub stencil_enable: bool,
    pub stencil_read_mask: u8,
    pub stencil_write_mask: u8,
    pub front_face: StencilFaceDesc,
    pub back_face: StencilFaceDesc,
}

/// 深度模板视图描述（二维纹理）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepthStencilViewDesc {
    pub format: Format,
    pub mip_slice: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillMode {
    Solid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CullMode {
    Back,
}

/// 光栅化状态描述
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RasterizerDesc {
    pub fill_mode: FillMode,
    pub cull_mode: CullMode,
    pub front_counter_clockwise: bool,
    pub depth_bias: i32,
    pub depth_bias_clamp: f32,
    pub slope_scaled_depth_bias: f32,
    pub depth_clip_enable: bool,
    pub scissor_enable: bool,
    pub multisample_enable: bool,
    pub antialiased_line_enable: bool,
}

/// 视口
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub top_left_x: f32,
    pub top_left_y: f32,
    pub width: f32,
    pub height: f32,
    pub min_depth: f32,
    pub max_depth: f32,
}

/// 一起创建的设备、立即上下文和交换链
pub struct DeviceHandles<A: GraphicsApi + ?Sized> {
    pub device: A::Device,
    pub device_context: A::DeviceContext,
    pub swap_chain: A::SwapChain,
}

/// 原生图形服务
///
/// 每个方法对应一次同步的原生调用（或一组不可分割的调用），
/// 失败时返回 [`GraphicsError`](crate::core::error::GraphicsError)。
pub trait GraphicsApi {
    /// 交换链输出的目标窗口
    type WindowHandle: Copy;
    type Device;
    type DeviceContext;
    type SwapChain;
    type RenderTargetView;
    type Texture;
    type DepthStencilState;
    type DepthStencilView;
    type RasterizerState;

    /// 枚举主适配器和主输出，读取显示模式列表与适配器描述
    fn query_adapter(&self, format: Format) -> Result<AdapterInfo>;

    /// 同时创建设备、立即上下文和交换链
    fn create_device_and_swap_chain(
        &self,
        desc: &SwapChainDesc<Self::WindowHandle>,
        feature_level: FeatureLevel,
    ) -> Result<DeviceHandles<Self>>;

    /// 取出交换链的 0 号后缓冲并为其创建渲染目标视图
    fn create_render_target_view(
        &self,
        device: &Self::Device,
        swap_chain: &Self::SwapChain,
    ) -> Result<Self::RenderTargetView>;

    fn create_depth_buffer(
        &self,
        device: &Self::Device,
        desc: &DepthBufferDesc,
    ) -> Result<Self::Texture>;

    fn create_depth_stencil_state(
        &self,
        device: &Self::Device,
        desc: &DepthStencilDesc,
    ) -> Result<Self::DepthStencilState>;

    fn create_depth_stencil_view(
        &self,
        device: &Self::Device,
        depth_buffer: &Self::Texture,
        desc: &DepthStencilViewDesc,
    ) -> Result<Self::DepthStencilView>;

    fn set_depth_stencil_state(
        &self,
        context: &Self::DeviceContext,
        state: &Self::DepthStencilState,
        stencil_ref: u32,
    );

    fn set_render_targets(
        &self,
        context: &Self::DeviceContext,
        render_target_view: &Self::RenderTargetView,
        depth_stencil_view: &Self::DepthStencilView,
    );

    fn create_rasterizer_state(
        &self,
        device: &Self::Device,
        desc: &RasterizerDesc,
    ) -> Result<Self::RasterizerState>;

    fn set_rasterizer_state(&self, context: &Self::DeviceContext, state: &Self::RasterizerState);

    fn set_viewport(&self, context: &Self::DeviceContext, viewport: &Viewport);

    fn clear_render_target(
        &self,
        context: &Self::DeviceContext,
        view: &Self::RenderTargetView,
        color: [f32; 4],
    );

    fn clear_depth_stencil(
        &self,
        context: &Self::DeviceContext,
        view: &Self::DepthStencilView,
        depth: f32,
        stencil: u8,
    );

    /// `sync_interval` 为 1 时等待垂直同步，为 0 时立即呈现
    fn present(&self, swap_chain: &Self::SwapChain, sync_interval: u32) -> Result<()>;

    fn set_fullscreen_state(&self, swap_chain: &Self::SwapChain, fullscreen: bool) -> Result<()>;
}
