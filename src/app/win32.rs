//! Win32 窗口宿主
//!
//! 创建窗口（窗口模式居中 / 全屏切换显示模式），运行非阻塞消息泵，
//! 关闭时按顺序还原显示模式、销毁窗口并注销窗口类。
//!
//! 窗口过程不持有应用程序本身：创建窗口时把每窗口状态的指针放进
//! `lpCreateParams`，在 `WM_NCCREATE` 中存入 `GWLP_USERDATA`。
//! 窗口过程只把键盘和关闭消息排进队列，由消息泵在宿主自己的栈上取出。

use std::cell::RefCell;
use std::collections::VecDeque;
use std::ffi::{c_void, CString};

use tracing::{debug, error, info, warn};
use windows::{
    core::{s, PCSTR},
    Win32::Foundation::{HINSTANCE, HWND, LPARAM, LRESULT, WPARAM},
    Win32::Graphics::Gdi::{
        ChangeDisplaySettingsA, GetStockObject, BLACK_BRUSH, CDS_FULLSCREEN, CDS_TYPE, DEVMODEA,
        DISP_CHANGE_SUCCESSFUL, DM_BITSPERPEL, DM_PELSHEIGHT, DM_PELSWIDTH, HBRUSH,
    },
    Win32::System::LibraryLoader::GetModuleHandleA,
    Win32::UI::Input::KeyboardAndMouse::SetFocus,
    Win32::UI::WindowsAndMessaging::*,
};

use crate::core::error::{Dx11RenderError, Result};
use crate::core::Config;
use crate::gfx::Direct3D11;

use super::{device_settings, Application, MessagePump, WindowMessage};

/// 全屏模式下的颜色深度
const FULLSCREEN_BITS_PER_PEL: u32 = 32;

/// 窗口过程与消息泵共享的每窗口状态
#[derive(Default)]
struct WindowState {
    messages: RefCell<VecDeque<WindowMessage>>,
}

impl WindowState {
    fn push(&self, message: WindowMessage) {
        self.messages.borrow_mut().push_back(message);
    }
}

/// 每次迭代最多处理一条原生消息
struct Win32Pump<'a> {
    state: &'a WindowState,
}

impl MessagePump for Win32Pump<'_> {
    fn pump(&mut self, messages: &mut Vec<WindowMessage>) {
        let mut msg = MSG::default();
        unsafe {
            if PeekMessageA(&mut msg, None, 0, 0, PM_REMOVE).as_bool() {
                let _ = TranslateMessage(&msg);
                DispatchMessageA(&msg);
            }
        }

        messages.extend(self.state.messages.borrow_mut().drain(..));
        if msg.message == WM_QUIT {
            messages.push(WindowMessage::Quit);
        }
    }
}

pub struct Win32Host {
    app: Application<Direct3D11>,
    hwnd: HWND,
    instance: HINSTANCE,
    class_name: CString,
    fullscreen: bool,
    window_state: Box<WindowState>,
    shut_down: bool,
}

fn window_error(what: &str, e: windows::core::Error) -> Dx11RenderError {
    Dx11RenderError::Window(format!("{}: {:?}", what, e))
}

impl Win32Host {
    /// 创建窗口并初始化图形
    ///
    /// 图形初始化失败时弹出 "Could not initialize Direct3D" 对话框，
    /// 清理窗口后返回错误。
    pub fn initialize(config: &Config) -> Result<Self> {
        let instance: HINSTANCE = unsafe { GetModuleHandleA(None) }
            .map_err(|e| window_error("GetModuleHandleA", e))?
            .into();

        let class_name = CString::new(config.window.title.as_str()).map_err(|e| {
            Dx11RenderError::Window(format!("Invalid window title {:?}: {}", config.window.title, e))
        })?;
        let class_pcstr = PCSTR(class_name.as_ptr() as *const u8);

        let wnd_class = WNDCLASSEXA {
            cbSize: std::mem::size_of::<WNDCLASSEXA>() as u32,
            style: CS_HREDRAW | CS_VREDRAW | CS_OWNDC,
            lpfnWndProc: Some(wnd_proc),
            hInstance: instance,
            hIcon: unsafe { LoadIconW(None, IDI_WINLOGO) }
                .map_err(|e| window_error("LoadIconW", e))?,
            hIconSm: unsafe { LoadIconW(None, IDI_WINLOGO) }
                .map_err(|e| window_error("LoadIconW", e))?,
            hCursor: unsafe { LoadCursorW(None, IDC_ARROW) }
                .map_err(|e| window_error("LoadCursorW", e))?,
            hbrBackground: HBRUSH(unsafe { GetStockObject(BLACK_BRUSH) }.0),
            lpszClassName: class_pcstr,
            ..Default::default()
        };
        if unsafe { RegisterClassExA(&wnd_class) } == 0 {
            return Err(Dx11RenderError::Window("RegisterClassExA failed".to_string()));
        }

        let screen_width = unsafe { GetSystemMetrics(SM_CXSCREEN) };
        let screen_height = unsafe { GetSystemMetrics(SM_CYSCREEN) };
        let fullscreen = config.window.fullscreen;

        let (x, y, width, height) = if fullscreen {
            // 全屏：桌面分辨率，32 位色
            let mode = DEVMODEA {
                dmSize: std::mem::size_of::<DEVMODEA>() as u16,
                dmPelsWidth: screen_width as u32,
                dmPelsHeight: screen_height as u32,
                dmBitsPerPel: FULLSCREEN_BITS_PER_PEL,
                dmFields: DM_BITSPERPEL | DM_PELSWIDTH | DM_PELSHEIGHT,
                ..Default::default()
            };
            let result = unsafe { ChangeDisplaySettingsA(Some(&mode as *const _), CDS_FULLSCREEN) };
            if result != DISP_CHANGE_SUCCESSFUL {
                warn!(code = result.0, "Display mode change failed");
            }
            (0, 0, screen_width, screen_height)
        } else {
            // 窗口模式：居中
            let width = config.window.width as i32;
            let height = config.window.height as i32;
            ((screen_width - width) / 2, (screen_height - height) / 2, width, height)
        };

        let window_state = Box::new(WindowState::default());
        let hwnd = unsafe {
            CreateWindowExA(
                WS_EX_APPWINDOW,
                class_pcstr,
                class_pcstr,
                WS_CLIPSIBLINGS | WS_CLIPCHILDREN | WS_POPUP,
                x,
                y,
                width,
                height,
                None,
                None,
                Some(instance),
                Some(&*window_state as *const WindowState as *const c_void),
            )
        };
        let hwnd = match hwnd {
            Ok(hwnd) => hwnd,
            Err(e) => {
                unsafe {
                    if fullscreen {
                        ChangeDisplaySettingsA(None, CDS_TYPE(0));
                    }
                    let _ = UnregisterClassA(class_pcstr, Some(instance));
                }
                return Err(window_error("CreateWindowExA", e));
            }
        };

        unsafe {
            let _ = ShowWindow(hwnd, SW_SHOW);
            let _ = SetForegroundWindow(hwnd);
            let _ = SetFocus(Some(hwnd));
            ShowCursor(false);
        }

        info!(width, height, fullscreen, "Window created");

        let mut host = Self {
            app: Application::new(Direct3D11, config),
            hwnd,
            instance,
            class_name,
            fullscreen,
            window_state,
            shut_down: false,
        };

        let settings = device_settings(config, width as u32, height as u32);
        if let Err(e) = host.app.initialize(&settings, hwnd) {
            error!("Could not initialize Direct3D: {}", e);
            unsafe {
                let _ = MessageBoxA(Some(hwnd), s!("Could not initialize Direct3D"), s!("Error"), MB_OK);
            }
            host.shutdown();
            return Err(e);
        }

        Ok(host)
    }

    pub fn run(&mut self) -> Result<()> {
        let mut pump = Win32Pump { state: &self.window_state };
        self.app.run(&mut pump)
    }

    /// 关闭图形、恢复光标和显示模式、销毁窗口、注销窗口类
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.shut_down = true;

        self.app.shutdown();

        unsafe {
            ShowCursor(true);

            if self.fullscreen {
                ChangeDisplaySettingsA(None, CDS_TYPE(0));
            }

            if let Err(e) = DestroyWindow(self.hwnd) {
                warn!("DestroyWindow failed: {:?}", e);
            }

            let class_pcstr = PCSTR(self.class_name.as_ptr() as *const u8);
            if let Err(e) = UnregisterClassA(class_pcstr, Some(self.instance)) {
                warn!("UnregisterClassA failed: {:?}", e);
            }
        }

        debug!("Window destroyed");
    }
}

impl Drop for Win32Host {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// 取回创建窗口时存入的每窗口状态
///
/// # Safety
///
/// `GWLP_USERDATA` 要么为 0，要么指向仍然存活的 `WindowState`
/// （宿主在 `DestroyWindow` 返回后才释放它）。
unsafe fn window_state<'a>(hwnd: HWND) -> Option<&'a WindowState> {
    let ptr = GetWindowLongPtrA(hwnd, GWLP_USERDATA) as *const WindowState;
    ptr.as_ref()
}

extern "system" fn wnd_proc(hwnd: HWND, msg: u32, wparam: WPARAM, lparam: LPARAM) -> LRESULT {
    unsafe {
        match msg {
            WM_NCCREATE => {
                let create = &*(lparam.0 as *const CREATESTRUCTA);
                SetWindowLongPtrA(hwnd, GWLP_USERDATA, create.lpCreateParams as isize);
                DefWindowProcA(hwnd, msg, wparam, lparam)
            }
            WM_KEYDOWN | WM_KEYUP => {
                match (window_state(hwnd), u8::try_from(wparam.0)) {
                    (Some(state), Ok(key)) if msg == WM_KEYDOWN => state.push(WindowMessage::KeyDown(key)),
                    (Some(state), Ok(key)) => state.push(WindowMessage::KeyUp(key)),
                    _ => {}
                }
                LRESULT(0)
            }
            WM_CLOSE | WM_DESTROY => {
                PostQuitMessage(0);
                LRESULT(0)
            }
            _ => DefWindowProcA(hwnd, msg, wparam, lparam),
        }
    }
}
