//! 应用程序宿主
//!
//! `Application` 把键盘状态表和渲染驱动连在一起，并驱动主循环：
//! 每次迭代从 [`MessagePump`] 取出窗口消息，路由到键盘状态表，
//! 没有退出请求时处理一帧。
//!
//! 平台窗口（Win32）只负责把原生消息翻译成 [`WindowMessage`]，
//! 见 `app::win32`。

#[cfg(target_os = "windows")]
pub mod win32;

use tracing::{error, info};

use crate::core::error::{Dx11RenderError, Result};
use crate::core::input::VK_ESCAPE;
use crate::core::{Config, InputSystem};
use crate::gfx::{DeviceSettings, GraphicsApi};
use crate::math::Color;
use crate::renderer::Graphics;

/// 宿主状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostState {
    Running,
    Stopped,
}

/// 应用层窗口消息
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowMessage {
    KeyDown(u8),
    KeyUp(u8),
    /// 窗口关闭或销毁
    Quit,
}

/// 一帧处理后的去向
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    Continue,
    Exit,
}

/// 非阻塞消息源
pub trait MessagePump {
    /// 取出当前待处理的消息，没有消息时立即返回
    fn pump(&mut self, messages: &mut Vec<WindowMessage>);
}

pub struct Application<A: GraphicsApi> {
    input: InputSystem,
    graphics: Graphics<A>,
    state: HostState,
}

impl<A: GraphicsApi> Application<A> {
    pub fn new(api: A, config: &Config) -> Self {
        Self {
            input: InputSystem::new(),
            graphics: Graphics::new(api, Color::from(config.graphics.clear_color)),
            state: HostState::Stopped,
        }
    }

    /// 初始化键盘状态表和图形
    ///
    /// 图形初始化失败时宿主保持 `Stopped`。
    pub fn initialize(&mut self, settings: &DeviceSettings, window: A::WindowHandle) -> Result<()> {
        self.input.initialize();
        self.graphics.initialize(settings, window)?;
        self.state = HostState::Running;
        info!("Application initialized");
        Ok(())
    }

    pub fn handle_message(&mut self, message: WindowMessage) {
        match message {
            WindowMessage::KeyDown(key) => self.input.key_down(key),
            WindowMessage::KeyUp(key) => self.input.key_up(key),
            WindowMessage::Quit => {
                info!("Quit requested");
                self.state = HostState::Stopped;
            }
        }
    }

    /// 处理一帧
    ///
    /// 按住 Escape 时直接返回 `Exit`，不渲染。
    pub fn frame(&mut self) -> Result<FrameOutcome> {
        if self.input.is_key_down(VK_ESCAPE) {
            return Ok(FrameOutcome::Exit);
        }

        self.graphics.frame()?;
        Ok(FrameOutcome::Continue)
    }

    /// 主循环，直到收到退出消息、按下 Escape 或某一帧失败
    pub fn run<P: MessagePump>(&mut self, pump: &mut P) -> Result<()> {
        if self.state != HostState::Running {
            return Err(Dx11RenderError::Initialization(
                "Application is not initialized".to_string(),
            ));
        }

        info!("Entering main loop...");
        let mut messages = Vec::new();

        while self.state == HostState::Running {
            pump.pump(&mut messages);
            for message in messages.drain(..) {
                self.handle_message(message);
            }
            if self.state != HostState::Running {
                break;
            }

            match self.frame() {
                Ok(FrameOutcome::Continue) => {}
                Ok(FrameOutcome::Exit) => {
                    info!("Escape pressed, leaving main loop");
                    self.state = HostState::Stopped;
                }
                Err(e) => {
                    error!("Frame failed: {}", e);
                    self.state = HostState::Stopped;
                    return Err(e);
                }
            }
        }

        Ok(())
    }

    /// 先关闭图形，再重置键盘状态表
    pub fn shutdown(&mut self) {
        self.graphics.shutdown();
        self.input.initialize();
        self.state = HostState::Stopped;
    }

    pub fn state(&self) -> HostState {
        self.state
    }

    pub fn graphics(&self) -> &Graphics<A> {
        &self.graphics
    }

    pub fn input(&self) -> &InputSystem {
        &self.input
    }
}

/// 由配置和屏幕尺寸得到设备初始化参数
pub fn device_settings(config: &Config, width: u32, height: u32) -> DeviceSettings {
    DeviceSettings {
        width,
        height,
        vsync: config.graphics.vsync,
        fullscreen: config.window.fullscreen,
        screen_depth: config.graphics.screen_depth,
        screen_near: config.graphics.screen_near,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use super::*;
    use crate::core::error::GraphicsError;
    use crate::gfx::mock::MockApi;

    /// 每次 `pump` 取出一批预设消息，用完后只返回空批次
    struct ScriptedPump {
        batches: VecDeque<Vec<WindowMessage>>,
        pumped: usize,
    }

    impl ScriptedPump {
        fn new(batches: Vec<Vec<WindowMessage>>) -> Self {
            Self { batches: batches.into(), pumped: 0 }
        }
    }

    impl MessagePump for ScriptedPump {
        fn pump(&mut self, messages: &mut Vec<WindowMessage>) {
            self.pumped += 1;
            if let Some(batch) = self.batches.pop_front() {
                messages.extend(batch);
            }
        }
    }

    fn running_app(api: &MockApi) -> Application<MockApi> {
        let config = Config::default();
        let mut app = Application::new(api.clone(), &config);
        app.initialize(&device_settings(&config, 800, 600), 1).unwrap();
        api.clear_calls();
        app
    }

    #[test]
    fn test_escape_exits_without_rendering() {
        let api = MockApi::new();
        let mut app = running_app(&api);

        app.handle_message(WindowMessage::KeyDown(VK_ESCAPE));

        assert_eq!(app.frame().unwrap(), FrameOutcome::Exit);
        assert_eq!(api.count("present"), 0);
        assert_eq!(api.count("clear_render_target"), 0);
    }

    #[test]
    fn test_frame_renders_when_escape_released() {
        let api = MockApi::new();
        let mut app = running_app(&api);

        app.handle_message(WindowMessage::KeyDown(VK_ESCAPE));
        app.handle_message(WindowMessage::KeyUp(VK_ESCAPE));

        assert_eq!(app.frame().unwrap(), FrameOutcome::Continue);
        assert_eq!(api.count("present:1"), 1);
    }

    #[test]
    fn test_key_messages_update_input() {
        let api = MockApi::new();
        let mut app = running_app(&api);

        app.handle_message(WindowMessage::KeyDown(b'W'));
        assert!(app.input().is_key_down(b'W'));
        assert!(!app.input().is_key_down(b'S'));

        app.handle_message(WindowMessage::KeyUp(b'W'));
        assert!(!app.input().is_key_down(b'W'));
    }

    #[test]
    fn test_run_until_quit() {
        let api = MockApi::new();
        let mut app = running_app(&api);
        let mut pump = ScriptedPump::new(vec![
            vec![],
            vec![WindowMessage::KeyDown(b'A')],
            vec![],
            vec![WindowMessage::Quit],
        ]);

        app.run(&mut pump).unwrap();

        assert_eq!(pump.pumped, 4);
        assert_eq!(api.count("present"), 3);
        assert_eq!(app.state(), HostState::Stopped);
    }

    #[test]
    fn test_run_stops_on_escape() {
        let api = MockApi::new();
        let mut app = running_app(&api);
        let mut pump = ScriptedPump::new(vec![vec![], vec![WindowMessage::KeyDown(VK_ESCAPE)]]);

        app.run(&mut pump).unwrap();

        assert_eq!(pump.pumped, 2);
        assert_eq!(api.count("present"), 1);
        assert_eq!(app.state(), HostState::Stopped);
    }

    #[test]
    fn test_run_stops_on_frame_failure() {
        let api = MockApi::new().failing_at("present");
        let mut app = running_app(&api);
        let mut pump = ScriptedPump::new(vec![]);

        let result = app.run(&mut pump);

        assert!(matches!(
            result,
            Err(Dx11RenderError::Graphics(GraphicsError::Present(_)))
        ));
        assert_eq!(pump.pumped, 1);
        assert_eq!(app.state(), HostState::Stopped);
    }

    #[test]
    fn test_run_requires_initialize() {
        let api = MockApi::new();
        let mut app = Application::new(api.clone(), &Config::default());
        let mut pump = ScriptedPump::new(vec![]);

        assert!(app.run(&mut pump).is_err());
        assert_eq!(pump.pumped, 0);
    }

    #[test]
    fn test_failed_initialize_stays_stopped() {
        let api = MockApi::new().failing_at("create_depth_buffer");
        let config = Config::default();
        let mut app = Application::new(api.clone(), &config);

        assert!(app.initialize(&device_settings(&config, 800, 600), 1).is_err());
        assert_eq!(app.state(), HostState::Stopped);
        assert_eq!(api.live_handles(), 0);
    }

    #[test]
    fn test_shutdown_releases_graphics_and_resets_input() {
        let api = MockApi::new();
        let mut app = running_app(&api);
        app.handle_message(WindowMessage::KeyDown(b'A'));

        app.shutdown();

        assert!(!app.graphics().d3d().is_initialized());
        assert!(!app.input().is_key_down(b'A'));
        assert_eq!(api.live_handles(), 0);
        assert_eq!(app.state(), HostState::Stopped);
    }

    #[test]
    fn test_device_settings_from_config() {
        let mut config = Config::default();
        config.window.fullscreen = true;
        config.graphics.vsync = false;

        let settings = device_settings(&config, 1920, 1080);

        assert_eq!(settings.width, 1920);
        assert_eq!(settings.height, 1080);
        assert!(settings.fullscreen);
        assert!(!settings.vsync);
        assert_eq!(settings.screen_depth, 1000.0);
        assert_eq!(settings.screen_near, 0.1);
    }
}
