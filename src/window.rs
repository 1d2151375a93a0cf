// Windowing collaborator
//
// The bootstrap only needs a window to exist, the platform's instance
// extensions, and a way to tell when the user wants out. `WinitWindowing`
// drives winit in pump mode so the lifecycle can own the loop.

use raw_window_handle::HasRawDisplayHandle;
use std::collections::HashSet;
use std::ffi::CStr;
use std::time::Duration;
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    error::OsError,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    platform::pump_events::{EventLoopExtPumpEvents, PumpStatus},
    window::{Window, WindowAttributes, WindowId},
};

use crate::error::{BootstrapError, Result};

/// External window system as seen by the lifecycle driver.
pub trait Windowing {
    type Window;

    fn create_window(&mut self, width: u32, height: u32, title: &str) -> Result<Self::Window>;

    /// Instance extensions the platform needs to present to `window`
    fn required_instance_extensions(&self, window: &Self::Window) -> Result<Vec<String>>;

    fn should_close(&self, window: &Self::Window) -> bool;

    fn poll_events(&mut self);

    fn destroy_window(&mut self, window: Self::Window);
}

/// How long one `poll_events` may wait for input
const POLL_TIMEOUT: Duration = Duration::from_millis(16);

/// `Poll` would make every pump return at once and ignore `POLL_TIMEOUT`
const IDLE_FLOW: ControlFlow = ControlFlow::Wait;

/// Pumps allowed before giving up on the platform delivering `resumed`
const MAX_CREATE_PUMPS: usize = 64;

pub struct WinitWindowing {
    event_loop: EventLoop<()>,
    state: EventState,
    resizable: bool,
}

#[derive(Default)]
struct EventState {
    resumed: bool,
    pending: Option<WindowAttributes>,
    created: Option<std::result::Result<Window, OsError>>,
    close_requested: HashSet<WindowId>,
    exited: bool,
}

impl EventState {
    // Windows may only be created once the loop has resumed
    fn create_pending(&mut self, event_loop: &ActiveEventLoop) {
        if !self.resumed {
            return;
        }
        if let Some(attributes) = self.pending.take() {
            self.created = Some(event_loop.create_window(attributes));
        }
    }
}

impl ApplicationHandler for EventState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        self.resumed = true;
        self.create_pending(event_loop);
    }

    fn window_event(&mut self, _event_loop: &ActiveEventLoop, id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested, shutting down...");
                self.close_requested.insert(id);
            }
            WindowEvent::KeyboardInput { event, .. }
                if event.state.is_pressed()
                    && event.physical_key == PhysicalKey::Code(KeyCode::Escape) =>
            {
                log::info!("ESC pressed, exiting...");
                self.close_requested.insert(id);
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        self.create_pending(event_loop);
    }
}

impl WinitWindowing {
    pub fn new(resizable: bool) -> anyhow::Result<Self> {
        let event_loop = EventLoop::new()?;
        event_loop.set_control_flow(IDLE_FLOW);
        Ok(Self {
            event_loop,
            state: EventState::default(),
            resizable,
        })
    }

    fn pump(&mut self, timeout: Option<Duration>) {
        if let PumpStatus::Exit(code) = self.event_loop.pump_app_events(timeout, &mut self.state) {
            log::debug!("Event loop exited with code {}", code);
            self.state.exited = true;
        }
    }
}

impl Windowing for WinitWindowing {
    type Window = Window;

    fn create_window(&mut self, width: u32, height: u32, title: &str) -> Result<Window> {
        log::info!("Creating window: {}x{} ({})", width, height, title);
        self.state.pending = Some(
            WindowAttributes::default()
                .with_title(title)
                .with_inner_size(PhysicalSize::new(width, height))
                .with_resizable(self.resizable),
        );

        for _ in 0..MAX_CREATE_PUMPS {
            self.pump(Some(Duration::ZERO));
            if let Some(created) = self.state.created.take() {
                return created.map_err(|e| BootstrapError::WindowCreation(e.to_string()));
            }
            if self.state.exited {
                break;
            }
        }

        self.state.pending = None;
        Err(BootstrapError::WindowCreation(
            "event loop never became ready".to_string(),
        ))
    }

    fn required_instance_extensions(&self, window: &Window) -> Result<Vec<String>> {
        let names = ash_window::enumerate_required_extensions(window.raw_display_handle())
            .map_err(BootstrapError::PlatformExtensions)?;

        // ash-window hands out static, nul-terminated names
        Ok(names
            .iter()
            .map(|&name| unsafe { CStr::from_ptr(name) }.to_string_lossy().into_owned())
            .collect())
    }

    fn should_close(&self, window: &Window) -> bool {
        self.state.exited || self.state.close_requested.contains(&window.id())
    }

    fn poll_events(&mut self) {
        self.pump(Some(POLL_TIMEOUT));
    }

    fn destroy_window(&mut self, window: Window) {
        let id = window.id();
        drop(window);
        self.state.close_requested.remove(&id);
        // Let the platform process the destruction
        self.pump(Some(Duration::ZERO));
        log::debug!("Window destroyed");
    }
}
