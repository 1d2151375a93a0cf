// =============================================================================
// LIFECYCLE - init -> run loop -> teardown
// =============================================================================
//
// STARTUP ORDER:
// 1. Window                     (WindowReady)
// 2. Instance                   (ContextReady)
// 3. Debug messenger, optional  (DiagnosticsReady)
// 4. Physical device            (DeviceSelected)
// 5. Poll until the window asks to close (Running)
//
// Teardown walks the same list backwards, skipping whatever was never
// acquired, and runs exactly once whether startup succeeded or not.

use std::fmt;

use crate::backend::context::{build_context, DiagnosticsRequest};
use crate::backend::device::{accept_first, select_device};
use crate::backend::diagnostics::{self, SinkBinding, ALL_CATEGORIES, ALL_SEVERITIES};
use crate::backend::{DeviceInfo, DiagnosticsHandle, DiagnosticsSink, Driver};
use crate::config::Config;
use crate::error::{BootstrapError, StartupError};
use crate::window::Windowing;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Uninitialized,
    WindowReady,
    ContextReady,
    DiagnosticsReady,
    DeviceSelected,
    Running,
    Stopped,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Uninitialized => "uninitialized",
            Stage::WindowReady => "window creation",
            Stage::ContextReady => "instance creation",
            Stage::DiagnosticsReady => "debug messenger setup",
            Stage::DeviceSelected => "physical device selection",
            Stage::Running => "run loop",
            Stage::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

pub type DevicePredicate = Box<dyn FnMut(&DeviceInfo) -> bool>;

/// Owns every object the bootstrap acquires.
///
/// Field order mirrors acquisition; `teardown` releases them in reverse.
pub struct Bootstrap<D: Driver, W: Windowing> {
    config: Config,
    driver: D,
    windowing: W,
    predicate: DevicePredicate,
    stage: Stage,

    window: Option<W::Window>,
    context: Option<D::Context>,
    diagnostics: Option<DiagnosticsHandle>,
    device: Option<DeviceInfo>,

    // Callback target for the messenger; must outlive the instance
    sink: Option<SinkBinding>,
}

impl<D: Driver, W: Windowing> Bootstrap<D, W> {
    /// `sink` receives driver messages when diagnostics are enabled in `config`.
    pub fn new(config: Config, driver: D, windowing: W, sink: Box<dyn DiagnosticsSink>) -> Self {
        let sink = config.diagnostics.enabled.then(|| SinkBinding::new(sink));
        Self {
            config,
            driver,
            windowing,
            predicate: Box::new(accept_first),
            stage: Stage::Uninitialized,
            window: None,
            context: None,
            diagnostics: None,
            device: None,
            sink,
        }
    }

    /// Replace the device suitability policy
    pub fn with_predicate(mut self, predicate: impl FnMut(&DeviceInfo) -> bool + 'static) -> Self {
        self.predicate = Box::new(predicate);
        self
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn device(&self) -> Option<&DeviceInfo> {
        self.device.as_ref()
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn windowing(&self) -> &W {
        &self.windowing
    }

    /// Full cycle: startup, run loop, teardown.
    ///
    /// Teardown happens even when startup fails; the startup error is
    /// returned afterwards. A bootstrap runs once: calling `run` again fails
    /// with `AlreadyStarted` and touches nothing.
    pub fn run(&mut self) -> Result<(), StartupError> {
        if self.stage != Stage::Uninitialized {
            return Err(StartupError {
                stage: Stage::WindowReady,
                source: BootstrapError::AlreadyStarted(self.stage),
            });
        }

        let result = self.start();
        match &result {
            Ok(()) => self.run_loop(),
            Err(e) => log::error!("{}: {}", e, e.source),
        }
        self.teardown();
        result
    }

    fn start(&mut self) -> Result<(), StartupError> {
        log::info!("Initializing Vulkan...");
        self.enter(Stage::WindowReady, Self::open_window)?;
        self.enter(Stage::ContextReady, Self::create_context)?;
        if self.sink.is_some() {
            self.enter(Stage::DiagnosticsReady, Self::enable_diagnostics)?;
        }
        self.enter(Stage::DeviceSelected, Self::pick_physical_device)?;
        log::info!("Vulkan initialized successfully!");
        Ok(())
    }

    fn enter(
        &mut self,
        stage: Stage,
        step: fn(&mut Self) -> Result<(), BootstrapError>,
    ) -> Result<(), StartupError> {
        step(self).map_err(|source| StartupError { stage, source })?;
        log::debug!("Stage reached: {}", stage);
        self.stage = stage;
        Ok(())
    }

    fn open_window(&mut self) -> Result<(), BootstrapError> {
        let window = &self.config.window;
        let handle = self
            .windowing
            .create_window(window.width, window.height, &window.title)?;
        self.window = Some(handle);
        Ok(())
    }

    fn create_context(&mut self) -> Result<(), BootstrapError> {
        let platform = match &self.window {
            Some(window) => self.windowing.required_instance_extensions(window)?,
            None => Vec::new(),
        };

        // Same descriptor for the pNext chain and the persistent messenger
        let messenger = self
            .sink
            .as_ref()
            .map(|sink| sink.create_info(ALL_SEVERITIES, ALL_CATEGORIES));
        let diagnostics = messenger.as_ref().map(|messenger| DiagnosticsRequest {
            layers: self.config.requested_layers(),
            messenger,
        });

        let context = build_context(
            &mut self.driver,
            &self.config.application,
            &platform,
            diagnostics,
            self.config.debug.verbose,
        )?;
        self.context = Some(context);
        Ok(())
    }

    fn enable_diagnostics(&mut self) -> Result<(), BootstrapError> {
        let Some(context) = &self.context else {
            return Err(BootstrapError::StageSkipped(Stage::ContextReady));
        };
        // Diagnostics disabled in the config
        let Some(sink) = &self.sink else {
            return Ok(());
        };
        let handle =
            diagnostics::enable(&self.driver, context, ALL_SEVERITIES, ALL_CATEGORIES, sink)?;
        self.diagnostics = Some(handle);
        Ok(())
    }

    fn pick_physical_device(&mut self) -> Result<(), BootstrapError> {
        let Some(context) = &self.context else {
            return Err(BootstrapError::StageSkipped(Stage::ContextReady));
        };
        let device = select_device(
            &self.driver,
            context,
            &mut self.predicate,
            self.config.debug.verbose,
        )?;
        self.device = Some(device);
        Ok(())
    }

    fn run_loop(&mut self) {
        self.stage = Stage::Running;
        let Some(window) = &self.window else {
            return;
        };
        while !self.windowing.should_close(window) {
            self.windowing.poll_events();
        }
    }

    /// Release everything acquired so far, newest first. Idempotent.
    pub fn teardown(&mut self) {
        if self.stage == Stage::Stopped {
            return;
        }
        log::info!("Cleaning up Vulkan resources...");

        // Borrowed from the instance's device table, nothing to release
        self.device = None;

        if let Some(handle) = self.diagnostics.take() {
            if let Some(context) = &self.context {
                diagnostics::disable(&self.driver, context, handle);
            }
        }

        if let Some(context) = self.context.take() {
            self.driver.destroy_context(context);
        }

        if let Some(window) = self.window.take() {
            self.windowing.destroy_window(window);
        }

        self.stage = Stage::Stopped;
        log::info!("Cleanup complete");
    }
}

impl<D: Driver, W: Windowing> Drop for Bootstrap<D, W> {
    fn drop(&mut self) {
        self.teardown();
    }
}
