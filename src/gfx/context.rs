//! Direct3D 设备封装
//!
//! `D3dContext` 拥有设备、立即上下文、交换链、渲染目标视图、
//! 深度缓冲 / 深度模板状态 / 深度模板视图以及光栅化状态。
//!
//! # 初始化流程
//!
//! 1. 枚举主显卡及其主输出，读取显示模式列表
//! 2. 选出与窗口分辨率一致的刷新率
//! 3. 记录显卡名称与专用显存
//! 4. 创建设备、立即上下文和交换链
//! 5. 创建渲染目标视图
//! 6. 创建深度缓冲、深度模板状态、深度模板视图并绑定
//! 7. 创建并绑定光栅化状态
//! 8. 设置视口
//! 9. 计算投影矩阵、世界矩阵和正交矩阵
//!
//! 任何一步失败都会按关闭顺序释放已创建的资源，再返回错误。
//! 资源要么全部存在，要么全部不存在。

use tracing::{debug, info, warn};

use crate::core::error::{GraphicsError, Result};
use crate::math::{constants, matrix, Matrix4};

use super::adapter::{AdapterName, RefreshRate};
use super::backend::{
    ComparisonFunc, CullMode, DepthBufferDesc, DepthStencilDesc, DepthStencilViewDesc,
    DeviceHandles, FeatureLevel, FillMode, Format, GraphicsApi, RasterizerDesc,
    StencilFaceDesc, StencilOp, SwapChainDesc, Viewport,
};

/// 后缓冲格式
pub const BACK_BUFFER_FORMAT: Format = Format::R8G8B8A8Unorm;
/// 深度缓冲格式
pub const DEPTH_BUFFER_FORMAT: Format = Format::D24UnormS8Uint;
/// 设备创建使用的功能级别
pub const FEATURE_LEVEL: FeatureLevel = FeatureLevel::Level11_1;
/// 透视投影的垂直视场角
pub const FIELD_OF_VIEW: f32 = constants::QUARTER_PI;

/// 设备初始化参数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeviceSettings {
    pub width: u32,
    pub height: u32,
    pub vsync: bool,
    pub fullscreen: bool,
    /// 远裁剪面
    pub screen_depth: f32,
    /// 近裁剪面
    pub screen_near: f32,
}

/// 初始化时计算一次的矩阵
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    pub projection: Matrix4,
    pub world: Matrix4,
    pub ortho: Matrix4,
}

impl Projection {
    /// 根据屏幕尺寸和近/远裁剪面计算
    pub fn new(width: u32, height: u32, screen_near: f32, screen_depth: f32) -> Self {
        let (width, height) = (width as f32, height as f32);
        let aspect = width / height;

        Self {
            projection: matrix::perspective_fov_lh(FIELD_OF_VIEW, aspect, screen_near, screen_depth),
            world: matrix::identity(),
            ortho: matrix::orthographic_lh(width, height, screen_near, screen_depth),
        }
    }
}

impl Default for Projection {
    fn default() -> Self {
        Self {
            projection: matrix::identity(),
            world: matrix::identity(),
            ortho: matrix::identity(),
        }
    }
}

/// 设备持有的原生资源
///
/// 字段要么全部为 `Some`，要么全部为 `None`（初始化过程中除外）。
struct DeviceResources<A: GraphicsApi> {
    swap_chain: Option<A::SwapChain>,
    device: Option<A::Device>,
    device_context: Option<A::DeviceContext>,
    render_target_view: Option<A::RenderTargetView>,
    depth_stencil_buffer: Option<A::Texture>,
    depth_stencil_state: Option<A::DepthStencilState>,
    depth_stencil_view: Option<A::DepthStencilView>,
    raster_state: Option<A::RasterizerState>,
}

impl<A: GraphicsApi> DeviceResources<A> {
    fn empty() -> Self {
        Self {
            swap_chain: None,
            device: None,
            device_context: None,
            render_target_view: None,
            depth_stencil_buffer: None,
            depth_stencil_state: None,
            depth_stencil_view: None,
            raster_state: None,
        }
    }

    fn is_complete(&self) -> bool {
        self.swap_chain.is_some()
            && self.device.is_some()
            && self.device_context.is_some()
            && self.render_target_view.is_some()
            && self.depth_stencil_buffer.is_some()
            && self.depth_stencil_state.is_some()
            && self.depth_stencil_view.is_some()
            && self.raster_state.is_some()
    }

    fn is_empty(&self) -> bool {
        self.swap_chain.is_none()
            && self.device.is_none()
            && self.device_context.is_none()
            && self.render_target_view.is_none()
            && self.depth_stencil_buffer.is_none()
            && self.depth_stencil_state.is_none()
            && self.depth_stencil_view.is_none()
            && self.raster_state.is_none()
    }

    /// 按获取顺序的逆序释放
    ///
    /// 交换链在全屏状态下释放会触发异常，所以先切回窗口模式。
    fn release(&mut self, api: &A) {
        if let Some(swap_chain) = &self.swap_chain {
            if let Err(e) = api.set_fullscreen_state(swap_chain, false) {
                warn!("Failed to leave fullscreen before release: {}", e);
            }
        }

        drop(self.raster_state.take());
        drop(self.depth_stencil_view.take());
        drop(self.depth_stencil_state.take());
        drop(self.depth_stencil_buffer.take());
        drop(self.render_target_view.take());
        drop(self.device_context.take());
        drop(self.device.take());
        drop(self.swap_chain.take());
    }
}

/// Direct3D 设备封装
pub struct D3dContext<A: GraphicsApi> {
    api: A,
    vsync_enabled: bool,
    video_card_memory: usize,
    video_card_description: AdapterName,
    resources: DeviceResources<A>,
    projection: Projection,
}

impl<A: GraphicsApi> D3dContext<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            vsync_enabled: false,
            video_card_memory: 0,
            video_card_description: AdapterName::default(),
            resources: DeviceResources::empty(),
            projection: Projection::default(),
        }
    }

    /// 初始化设备和所有管线状态
    ///
    /// # 参数
    ///
    /// * `settings` - 屏幕尺寸、垂直同步、全屏和裁剪面
    /// * `window` - 交换链输出的目标窗口
    ///
    /// # 返回值
    ///
    /// 失败时已创建的资源都已释放，封装回到未初始化状态
    pub fn initialize(&mut self, settings: &DeviceSettings, window: A::WindowHandle) -> Result<()> {
        if !self.resources.is_empty() {
            return Err(GraphicsError::AlreadyInitialized.into());
        }

        self.vsync_enabled = settings.vsync;

        if let Err(e) = self.create_resources(settings, window) {
            self.resources.release(&self.api);
            return Err(e);
        }

        self.projection = Projection::new(
            settings.width,
            settings.height,
            settings.screen_near,
            settings.screen_depth,
        );

        info!(
            width = settings.width,
            height = settings.height,
            vsync = settings.vsync,
            fullscreen = settings.fullscreen,
            "Direct3D initialization complete"
        );
        Ok(())
    }

    fn create_resources(&mut self, settings: &DeviceSettings, window: A::WindowHandle) -> Result<()> {
        // 1. 显示模式与适配器信息（枚举对象在查询结束时释放）
        let adapter = self.api.query_adapter(BACK_BUFFER_FORMAT)?;
        let refresh_rate = adapter.refresh_rate_for(settings.width, settings.height);

        self.video_card_memory = adapter.dedicated_video_memory_mb();
        self.video_card_description = AdapterName::new(&adapter.description);

        info!(
            adapter = %self.video_card_description,
            memory_mb = self.video_card_memory,
            refresh = ?refresh_rate,
            "Primary adapter"
        );

        // 2. 设备、立即上下文和交换链
        let swap_chain_desc = swap_chain_desc(settings, refresh_rate, window);
        let DeviceHandles { device, device_context, swap_chain } = self
            .api
            .create_device_and_swap_chain(&swap_chain_desc, FEATURE_LEVEL)?;
        self.resources.swap_chain = Some(swap_chain);
        self.resources.device = Some(device);
        self.resources.device_context = Some(device_context);
        debug!("Device and swap chain created");

        // 之后每个句柄创建后立刻存入 `resources`，失败时由 `release` 按关闭顺序回滚
        let api = &self.api;
        let res = &mut self.resources;

        // 3. 渲染目标视图（后缓冲在视图创建后释放）
        res.render_target_view = Some(
            api.create_render_target_view(required(&res.device)?, required(&res.swap_chain)?)?,
        );
        debug!("Render target view created");

        // 4. 深度缓冲、深度模板状态、深度模板视图
        res.depth_stencil_buffer = Some(api.create_depth_buffer(
            required(&res.device)?,
            &depth_buffer_desc(settings.width, settings.height),
        )?);
        res.depth_stencil_state =
            Some(api.create_depth_stencil_state(required(&res.device)?, &depth_stencil_desc())?);
        res.depth_stencil_view = Some(api.create_depth_stencil_view(
            required(&res.device)?,
            required(&res.depth_stencil_buffer)?,
            &DepthStencilViewDesc { format: DEPTH_BUFFER_FORMAT, mip_slice: 0 },
        )?);

        let context = required(&res.device_context)?;
        api.set_depth_stencil_state(context, required(&res.depth_stencil_state)?, 1);
        api.set_render_targets(
            context,
            required(&res.render_target_view)?,
            required(&res.depth_stencil_view)?,
        );
        debug!("Depth stencil resources created and bound");

        // 5. 光栅化状态
        res.raster_state =
            Some(api.create_rasterizer_state(required(&res.device)?, &rasterizer_desc())?);
        let context = required(&res.device_context)?;
        api.set_rasterizer_state(context, required(&res.raster_state)?);

        // 6. 视口
        api.set_viewport(context, &Viewport {
            top_left_x: 0.0,
            top_left_y: 0.0,
            width: settings.width as f32,
            height: settings.height as f32,
            min_depth: 0.0,
            max_depth: 1.0,
        });

        debug_assert!(res.is_complete());
        Ok(())
    }

    /// 释放所有资源，重复调用无副作用
    pub fn shutdown(&mut self) {
        if self.resources.is_empty() {
            return;
        }

        self.resources.release(&self.api);
        info!("Direct3D resources released");
    }

    /// 用指定颜色清空渲染目标，并把深度缓冲清为 1.0
    pub fn begin_scene(&self, red: f32, green: f32, blue: f32, alpha: f32) -> Result<()> {
        let res = &self.resources;
        let (Some(context), Some(rtv), Some(dsv)) =
            (&res.device_context, &res.render_target_view, &res.depth_stencil_view)
        else {
            return Err(GraphicsError::NotInitialized.into());
        };

        self.api.clear_render_target(context, rtv, [red, green, blue, alpha]);
        self.api.clear_depth_stencil(context, dsv, 1.0, 0);
        Ok(())
    }

    /// 呈现后缓冲
    ///
    /// 开启垂直同步时锁定到显示器刷新率，否则立即呈现（可能撕裂）。
    pub fn end_scene(&self) -> Result<()> {
        let swap_chain = self
            .resources
            .swap_chain
            .as_ref()
            .ok_or(GraphicsError::NotInitialized)?;

        let sync_interval = if self.vsync_enabled { 1 } else { 0 };
        self.api.present(swap_chain, sync_interval)
    }

    pub fn is_initialized(&self) -> bool {
        self.resources.is_complete()
    }

    pub fn device(&self) -> Option<&A::Device> {
        self.resources.device.as_ref()
    }

    pub fn device_context(&self) -> Option<&A::DeviceContext> {
        self.resources.device_context.as_ref()
    }

    pub fn projection_matrix(&self) -> &Matrix4 {
        &self.projection.projection
    }

    pub fn world_matrix(&self) -> &Matrix4 {
        &self.projection.world
    }

    pub fn ortho_matrix(&self) -> &Matrix4 {
        &self.projection.ortho
    }

    /// 显卡名称与专用显存（MB）
    pub fn video_card_info(&self) -> (&str, usize) {
        (self.video_card_description.as_str(), self.video_card_memory)
    }

    pub fn vsync_enabled(&self) -> bool {
        self.vsync_enabled
    }
}

impl<A: GraphicsApi> Drop for D3dContext<A> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn required<T>(slot: &Option<T>) -> Result<&T> {
    slot.as_ref().ok_or_else(|| GraphicsError::NotInitialized.into())
}

fn swap_chain_desc<W: Copy>(
    settings: &DeviceSettings,
    refresh_rate: RefreshRate,
    window: W,
) -> SwapChainDesc<W> {
    SwapChainDesc {
        buffer_count: 1,
        width: settings.width,
        height: settings.height,
        format: BACK_BUFFER_FORMAT,
        refresh_rate: if settings.vsync { refresh_rate } else { RefreshRate::UNCONSTRAINED },
        output_window: window,
        sample_count: 1,
        sample_quality: 0,
        windowed: !settings.fullscreen,
        discard_on_present: true,
    }
}

fn depth_buffer_desc(width: u32, height: u32) -> DepthBufferDesc {
    DepthBufferDesc {
        width,
        height,
        mip_levels: 1,
        array_size: 1,
        format: DEPTH_BUFFER_FORMAT,
        sample_count: 1,
        sample_quality: 0,
    }
}

fn depth_stencil_desc() -> DepthStencilDesc {
    let face = StencilFaceDesc {
        fail_op: StencilOp::Keep,
        depth_fail_op: StencilOp::Increment,
        pass_op: StencilOp::Keep,
        func: ComparisonFunc::Always,
    };

    DepthStencilDesc {
        depth_enable: true,
        depth_write_all: true,
        depth_func: ComparisonFunc::Less,
        stencil_enable: true,
        stencil_read_mask: 0xFF,
        stencil_write_mask: 0xFF,
        front_face: face,
        back_face: face,
    }
}

fn rasterizer_desc() -> RasterizerDesc {
    RasterizerDesc {
        fill_mode: FillMode::Solid,
        cull_mode: CullMode::Back,
        front_counter_clockwise: false,
        depth_bias: 0,
        depth_bias_clamp: 0.0,
        slope_scaled_depth_bias: 0.0,
        depth_clip_enable: true,
        scissor_enable: false,
        multisample_enable: false,
        antialiased_line_enable: false,
    }
}
