//! Direct3D 11 图形后端实现
//!
//! 通过 `windows` crate 调用 DXGI 和 Direct3D 11。
//! COM 接口在 drop 时自动 `Release`，所以释放资源就是丢弃句柄。

use tracing::{debug, info};
use windows::{
    core::Interface,
    Win32::Foundation::{HMODULE, HWND},
    Win32::Graphics::Direct3D::*,
    Win32::Graphics::Direct3D11::*,
    Win32::Graphics::Dxgi::Common::*,
    Win32::Graphics::Dxgi::*,
};

use crate::core::error::{GraphicsError, Result};
use crate::gfx::adapter::{AdapterInfo, DisplayMode, RefreshRate};
use crate::gfx::backend::{
    ComparisonFunc, CullMode, DepthBufferDesc, DepthStencilDesc, DepthStencilViewDesc,
    DeviceHandles, FeatureLevel, FillMode, Format, GraphicsApi, RasterizerDesc,
    StencilFaceDesc, StencilOp, SwapChainDesc, Viewport,
};

/// Direct3D 11 平台服务
#[derive(Debug, Clone, Copy, Default)]
pub struct Direct3D11;

fn dxgi_format(format: Format) -> DXGI_FORMAT {
    match format {
        Format::R8G8B8A8Unorm => DXGI_FORMAT_R8G8B8A8_UNORM,
        Format::D24UnormS8Uint => DXGI_FORMAT_D24_UNORM_S8_UINT,
    }
}

fn feature_level(level: FeatureLevel) -> D3D_FEATURE_LEVEL {
    match level {
        FeatureLevel::Level11_1 => D3D_FEATURE_LEVEL_11_1,
    }
}

fn comparison_func(func: ComparisonFunc) -> D3D11_COMPARISON_FUNC {
    match func {
        ComparisonFunc::Less => D3D11_COMPARISON_LESS,
        ComparisonFunc::Always => D3D11_COMPARISON_ALWAYS,
    }
}

fn stencil_op(op: StencilOp) -> D3D11_STENCIL_OP {
    match op {
        StencilOp::Keep => D3D11_STENCIL_OP_KEEP,
        StencilOp::Increment => D3D11_STENCIL_OP_INCR,
    }
}

fn stencil_face(face: &StencilFaceDesc) -> D3D11_DEPTH_STENCILOP_DESC {
    D3D11_DEPTH_STENCILOP_DESC {
        StencilFailOp: stencil_op(face.fail_op),
        StencilDepthFailOp: stencil_op(face.depth_fail_op),
        StencilPassOp: stencil_op(face.pass_op),
        StencilFunc: comparison_func(face.func),
    }
}

fn creation_error(what: &str, e: windows::core::Error) -> crate::core::Dx11RenderError {
    GraphicsError::ResourceCreation(format!("Failed to create {}: {:?}", what, e)).into()
}

/// COM 输出参数为空时视为创建失败
fn created<T>(resource: Option<T>, what: &str) -> Result<T> {
    resource.ok_or_else(|| {
        GraphicsError::ResourceCreation(format!("{} was not returned", what)).into()
    })
}

/// 深度和模板一起清除
const DEPTH_STENCIL_CLEAR_FLAGS: u32 = (D3D11_CLEAR_DEPTH.0 | D3D11_CLEAR_STENCIL.0) as u32;

/// 把以 0 结尾的 UTF-16 描述转换为 `String`
fn wide_to_string(wide: &[u16]) -> String {
    let len = wide.iter().position(|&c| c == 0).unwrap_or(wide.len());
    String::from_utf16_lossy(&wide[..len])
}

impl GraphicsApi for Direct3D11 {
    type WindowHandle = HWND;
    type Device = ID3D11Device;
    type DeviceContext = ID3D11DeviceContext;
    type SwapChain = IDXGISwapChain;
    type RenderTargetView = ID3D11RenderTargetView;
    type Texture = ID3D11Texture2D;
    type DepthStencilState = ID3D11DepthStencilState;
    type DepthStencilView = ID3D11DepthStencilView;
    type RasterizerState = ID3D11RasterizerState;

    fn query_adapter(&self, format: Format) -> Result<AdapterInfo> {
        let enumeration_error = |what: &str, e: windows::core::Error| {
            GraphicsError::AdapterEnumeration(format!("{}: {:?}", what, e))
        };

        unsafe {
            // 工厂、主显卡、主输出在函数返回时释放
            let factory: IDXGIFactory = CreateDXGIFactory()
                .map_err(|e| enumeration_error("CreateDXGIFactory", e))?;
            let adapter = factory
                .EnumAdapters(0)
                .map_err(|e| enumeration_error("EnumAdapters", e))?;
            let output = adapter
                .EnumOutputs(0)
                .map_err(|e| enumeration_error("EnumOutputs", e))?;

            // 先取数量，再取列表
            let mut mode_count = 0u32;
            output
                .GetDisplayModeList(dxgi_format(format), DXGI_ENUM_MODES_INTERLACED, &mut mode_count, None)
                .map_err(|e| enumeration_error("GetDisplayModeList", e))?;

            let mut modes = vec![DXGI_MODE_DESC::default(); mode_count as usize];
            output
                .GetDisplayModeList(
                    dxgi_format(format),
                    DXGI_ENUM_MODES_INTERLACED,
                    &mut mode_count,
                    Some(modes.as_mut_ptr()),
                )
                .map_err(|e| enumeration_error("GetDisplayModeList", e))?;
            modes.truncate(mode_count as usize);

            let desc = adapter
                .GetDesc()
                .map_err(|e| enumeration_error("IDXGIAdapter::GetDesc", e))?;

            debug!(modes = modes.len(), "Display modes enumerated");

            Ok(AdapterInfo {
                display_modes: modes
                    .iter()
                    .map(|mode| DisplayMode {
                        width: mode.Width,
                        height: mode.Height,
                        refresh_rate: RefreshRate::new(
                            mode.RefreshRate.Numerator,
                            mode.RefreshRate.Denominator,
                        ),
                    })
                    .collect(),
                description: wide_to_string(&desc.Description),
                dedicated_video_memory: desc.DedicatedVideoMemory,
            })
        }
    }

    fn create_device_and_swap_chain(
        &self,
        desc: &SwapChainDesc<HWND>,
        level: FeatureLevel,
    ) -> Result<DeviceHandles<Self>> {
        let swap_chain_desc = DXGI_SWAP_CHAIN_DESC {
            BufferDesc: DXGI_MODE_DESC {
                Width: desc.width,
                Height: desc.height,
                RefreshRate: DXGI_RATIONAL {
                    Numerator: desc.refresh_rate.numerator,
                    Denominator: desc.refresh_rate.denominator,
                },
                Format: dxgi_format(desc.format),
                ScanlineOrdering: DXGI_MODE_SCANLINE_ORDER_UNSPECIFIED,
                Scaling: DXGI_MODE_SCALING_UNSPECIFIED,
            },
            SampleDesc: DXGI_SAMPLE_DESC {
                Count: desc.sample_count,
                Quality: desc.sample_quality,
            },
            BufferUsage: DXGI_USAGE_RENDER_TARGET_OUTPUT,
            BufferCount: desc.buffer_count,
            OutputWindow: desc.output_window,
            Windowed: desc.windowed.into(),
            SwapEffect: if desc.discard_on_present {
                DXGI_SWAP_EFFECT_DISCARD
            } else {
                DXGI_SWAP_EFFECT_SEQUENTIAL
            },
            Flags: 0,
        };

        let feature_levels = [feature_level(level)];
        let mut swap_chain: Option<IDXGISwapChain> = None;
        let mut device: Option<ID3D11Device> = None;
        let mut device_context: Option<ID3D11DeviceContext> = None;

        unsafe {
            D3D11CreateDeviceAndSwapChain(
                None,
                D3D_DRIVER_TYPE_HARDWARE,
                HMODULE::default(),
                D3D11_CREATE_DEVICE_FLAG(0),
                Some(&feature_levels),
                D3D11_SDK_VERSION,
                Some(&swap_chain_desc),
                Some(&mut swap_chain),
                Some(&mut device),
                None,
                Some(&mut device_context),
            )
            .map_err(|e| {
                GraphicsError::DeviceCreation(format!(
                    "D3D11CreateDeviceAndSwapChain failed (no compatible GPU or driver?): {:?}",
                    e
                ))
            })?;
        }

        info!(
            width = desc.width,
            height = desc.height,
            windowed = desc.windowed,
            "D3D11 device and swap chain created"
        );

        Ok(DeviceHandles {
            device: created(device, "ID3D11Device")?,
            device_context: created(device_context, "ID3D11DeviceContext")?,
            swap_chain: created(swap_chain, "IDXGISwapChain")?,
        })
    }

    fn create_render_target_view(
        &self,
        device: &ID3D11Device,
        swap_chain: &IDXGISwapChain,
    ) -> Result<ID3D11RenderTargetView> {
        unsafe {
            // 后缓冲在本函数结束时释放，视图持有自己的引用
            let back_buffer: ID3D11Texture2D = swap_chain.GetBuffer(0).map_err(|e| {
                GraphicsError::SwapchainError(format!("Failed to get back buffer: {:?}", e))
            })?;

            let mut view = None;
            device
                .CreateRenderTargetView(&back_buffer, None, Some(&mut view))
                .map_err(|e| creation_error("render target view", e))?;
            created(view, "ID3D11RenderTargetView")
        }
    }

    fn create_depth_buffer(
        &self,
        device: &ID3D11Device,
        desc: &DepthBufferDesc,
    ) -> Result<ID3D11Texture2D> {
        let texture_desc = D3D11_TEXTURE2D_DESC {
            Width: desc.width,
            Height: desc.height,
            MipLevels: desc.mip_levels,
            ArraySize: desc.array_size,
            Format: dxgi_format(desc.format),
            SampleDesc: DXGI_SAMPLE_DESC {
                Count: desc.sample_count,
                Quality: desc.sample_quality,
            },
            Usage: D3D11_USAGE_DEFAULT,
            BindFlags: D3D11_BIND_DEPTH_STENCIL.0 as u32,
            CPUAccessFlags: 0,
            MiscFlags: 0,
        };

        let mut texture = None;
        unsafe {
            device
                .CreateTexture2D(&texture_desc, None, Some(&mut texture))
                .map_err(|e| creation_error("depth buffer", e))?;
        }
        created(texture, "ID3D11Texture2D")
    }

    fn create_depth_stencil_state(
        &self,
        device: &ID3D11Device,
        desc: &DepthStencilDesc,
    ) -> Result<ID3D11DepthStencilState> {
        let state_desc = D3D11_DEPTH_STENCIL_DESC {
            DepthEnable: desc.depth_enable.into(),
            DepthWriteMask: if desc.depth_write_all {
                D3D11_DEPTH_WRITE_MASK_ALL
            } else {
                D3D11_DEPTH_WRITE_MASK_ZERO
            },
            DepthFunc: comparison_func(desc.depth_func),
            StencilEnable: desc.stencil_enable.into(),
            StencilReadMask: desc.stencil_read_mask,
            StencilWriteMask: desc.stencil_write_mask,
            FrontFace: stencil_face(&desc.front_face),
            BackFace: stencil_face(&desc.back_face),
        };

        let mut state = None;
        unsafe {
            device
                .CreateDepthStencilState(&state_desc, Some(&mut state))
                .map_err(|e| creation_error("depth stencil state", e))?;
        }
        created(state, "ID3D11DepthStencilState")
    }

    fn create_depth_stencil_view(
        &self,
        device: &ID3D11Device,
        depth_buffer: &ID3D11Texture2D,
        desc: &DepthStencilViewDesc,
    ) -> Result<ID3D11DepthStencilView> {
        let view_desc = D3D11_DEPTH_STENCIL_VIEW_DESC {
            Format: dxgi_format(desc.format),
            ViewDimension: D3D11_DSV_DIMENSION_TEXTURE2D,
            Flags: 0,
            Anonymous: D3D11_DEPTH_STENCIL_VIEW_DESC_0 {
                Texture2D: D3D11_TEX2D_DSV { MipSlice: desc.mip_slice },
            },
        };

        let resource: ID3D11Resource = depth_buffer
            .cast()
            .map_err(|e| creation_error("depth stencil view", e))?;

        let mut view = None;
        unsafe {
            device
                .CreateDepthStencilView(&resource, Some(&view_desc), Some(&mut view))
                .map_err(|e| creation_error("depth stencil view", e))?;
        }
        created(view, "ID3D11DepthStencilView")
    }

    fn set_depth_stencil_state(
        &self,
        context: &ID3D11DeviceContext,
        state: &ID3D11DepthStencilState,
        stencil_ref: u32,
    ) {
        unsafe { context.OMSetDepthStencilState(state, stencil_ref) }
    }

    fn set_render_targets(
        &self,
        context: &ID3D11DeviceContext,
        render_target_view: &ID3D11RenderTargetView,
        depth_stencil_view: &ID3D11DepthStencilView,
    ) {
        unsafe {
            context.OMSetRenderTargets(Some(&[Some(render_target_view.clone())]), depth_stencil_view)
        }
    }

    fn create_rasterizer_state(
        &self,
        device: &ID3D11Device,
        desc: &RasterizerDesc,
    ) -> Result<ID3D11RasterizerState> {
        let raster_desc = D3D11_RASTERIZER_DESC {
            FillMode: match desc.fill_mode {
                FillMode::Solid => D3D11_FILL_SOLID,
            },
            CullMode: match desc.cull_mode {
                CullMode::Back => D3D11_CULL_BACK,
            },
            FrontCounterClockwise: desc.front_counter_clockwise.into(),
            DepthBias: desc.depth_bias,
            DepthBiasClamp: desc.depth_bias_clamp,
            SlopeScaledDepthBias: desc.slope_scaled_depth_bias,
            DepthClipEnable: desc.depth_clip_enable.into(),
            ScissorEnable: desc.scissor_enable.into(),
            MultisampleEnable: desc.multisample_enable.into(),
            AntialiasedLineEnable: desc.antialiased_line_enable.into(),
        };

        let mut state = None;
        unsafe {
            device
                .CreateRasterizerState(&raster_desc, Some(&mut state))
                .map_err(|e| creation_error("rasterizer state", e))?;
        }
        created(state, "ID3D11RasterizerState")
    }

    fn set_rasterizer_state(&self, context: &ID3D11DeviceContext, state: &ID3D11RasterizerState) {
        unsafe { context.RSSetState(state) }
    }

    fn set_viewport(&self, context: &ID3D11DeviceContext, viewport: &Viewport) {
        let viewport = D3D11_VIEWPORT {
            TopLeftX: viewport.top_left_x,
            TopLeftY: viewport.top_left_y,
            Width: viewport.width,
            Height: viewport.height,
            MinDepth: viewport.min_depth,
            MaxDepth: viewport.max_depth,
        };
        unsafe { context.RSSetViewports(Some(&[viewport])) }
    }

    fn clear_render_target(
        &self,
        context: &ID3D11DeviceContext,
        view: &ID3D11RenderTargetView,
        color: [f32; 4],
    ) {
        unsafe { context.ClearRenderTargetView(view, &color) }
    }

    fn clear_depth_stencil(
        &self,
        context: &ID3D11DeviceContext,
        view: &ID3D11DepthStencilView,
        depth: f32,
        stencil: u8,
    ) {
        unsafe { context.ClearDepthStencilView(view, DEPTH_STENCIL_CLEAR_FLAGS, depth, stencil) }
    }

    fn present(&self, swap_chain: &IDXGISwapChain, sync_interval: u32) -> Result<()> {
        unsafe {
            swap_chain
                .Present(sync_interval, DXGI_PRESENT(0))
                .ok()
                .map_err(|e| GraphicsError::Present(format!("{:?}", e)).into())
        }
    }

    fn set_fullscreen_state(&self, swap_chain: &IDXGISwapChain, fullscreen: bool) -> Result<()> {
        unsafe {
            swap_chain
                .SetFullscreenState(fullscreen.into(), None::<&IDXGIOutput>)
                .map_err(|e| GraphicsError::SwapchainError(format!("SetFullscreenState: {:?}", e)).into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wide_description_stops_at_nul() {
        let mut wide = [0u16; 128];
        for (slot, c) in wide.iter_mut().zip("Test GPU".encode_utf16()) {
            *slot = c;
        }
        assert_eq!(wide_to_string(&wide), "Test GPU");
    }

    #[test]
    fn test_clear_covers_depth_and_stencil() {
        assert_ne!(DEPTH_STENCIL_CLEAR_FLAGS & D3D11_CLEAR_DEPTH.0 as u32, 0);
        assert_ne!(DEPTH_STENCIL_CLEAR_FLAGS & D3D11_CLEAR_STENCIL.0 as u32, 0);
    }

    #[test]
    fn test_format_mapping() {
        assert_eq!(dxgi_format(Format::R8G8B8A8Unorm), DXGI_FORMAT_R8G8B8A8_UNORM);
        assert_eq!(dxgi_format(Format::D24UnormS8Uint), DXGI_FORMAT_D24_UNORM_S8_UINT);
    }
}
