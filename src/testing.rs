// Recording doubles for the driver and window boundaries
//
// Every boundary call lands in a per-thread log so tests can assert exact
// sequences. The mock messenger entry points are real `extern "system"`
// functions; they cannot capture state, hence the thread-locals.

use ash::prelude::VkResult;
use ash::vk::{self, Handle};
use std::borrow::Cow;
use std::cell::{Cell, RefCell};
use std::ffi::CStr;
use std::mem;
use std::os::raw::c_char;
use std::rc::Rc;

use crate::backend::diagnostics::{DiagnosticMessage, DiagnosticsSink};
use crate::backend::entry_points::{CREATE_DEBUG_UTILS_MESSENGER, DESTROY_DEBUG_UTILS_MESSENGER};
use crate::backend::{ContextRequest, Driver};
use crate::error::{BootstrapError, Result};
use crate::window::Windowing;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    CreateWindow { width: u32, height: u32, title: String },
    RequiredExtensions,
    EnumerateLayers,
    EnumerateExtensions,
    CreateContext,
    CreateMessenger,
    EnumerateDevices,
    DeviceProperties(usize),
    DeviceFeatures(usize),
    ShouldClose,
    PollEvents,
    DestroyMessenger,
    DestroyContext,
    DestroyWindow,
}

thread_local! {
    static CALLS: RefCell<Vec<Call>> = const { RefCell::new(Vec::new()) };
    static MESSENGER_STATUS: Cell<vk::Result> = const { Cell::new(vk::Result::SUCCESS) };
}

fn record(call: Call) {
    CALLS.with(|calls| calls.borrow_mut().push(call));
}

/// Drain this thread's call log
pub fn take_calls() -> Vec<Call> {
    CALLS.with(|calls| mem::take(&mut *calls.borrow_mut()))
}

const MESSENGER_HANDLE: u64 = 0xd1a6;
const INSTANCE_HANDLE: u64 = 0xc0de;
const DEVICE_HANDLE_BASE: u64 = 0x1000;

unsafe extern "system" fn mock_create_messenger(
    _instance: vk::Instance,
    _create_info: *const vk::DebugUtilsMessengerCreateInfoEXT,
    _allocator: *const vk::AllocationCallbacks,
    messenger: *mut vk::DebugUtilsMessengerEXT,
) -> vk::Result {
    record(Call::CreateMessenger);
    let status = MESSENGER_STATUS.with(Cell::get);
    if status == vk::Result::SUCCESS {
        *messenger = vk::DebugUtilsMessengerEXT::from_raw(MESSENGER_HANDLE);
    }
    status
}

unsafe extern "system" fn mock_destroy_messenger(
    _instance: vk::Instance,
    _messenger: vk::DebugUtilsMessengerEXT,
    _allocator: *const vk::AllocationCallbacks,
) {
    record(Call::DestroyMessenger);
}

/// Opaque mock instance; deliberately not `Clone`
#[derive(Debug)]
pub struct MockContext {
    instance: vk::Instance,
}

/// Snapshot of a `create_context` request
#[derive(Debug, Clone)]
pub struct CreatedContext {
    pub app_name: String,
    pub api_version: u32,
    pub extensions: Vec<String>,
    pub layers: Vec<String>,
    pub chained_diagnostics: bool,
}

pub struct MockDriver {
    layers: Vec<String>,
    extensions: Vec<String>,
    device_count: usize,
    device_status: Option<vk::Result>,
    context_status: Option<vk::Result>,
    entry_points: bool,
    requests: Vec<CreatedContext>,
    live_contexts: usize,
}

impl MockDriver {
    /// Fresh driver with one device, the validation layer, and a clean call log
    pub fn new() -> Self {
        take_calls();
        MESSENGER_STATUS.with(|status| status.set(vk::Result::SUCCESS));
        Self {
            layers: vec!["VK_LAYER_KHRONOS_validation".to_string()],
            extensions: vec![
                "VK_KHR_surface".to_string(),
                "VK_EXT_debug_utils".to_string(),
            ],
            device_count: 1,
            device_status: None,
            context_status: None,
            entry_points: true,
            requests: Vec::new(),
            live_contexts: 0,
        }
    }

    pub fn with_layers(mut self, layers: &[&str]) -> Self {
        self.layers = layers.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_devices(mut self, count: usize) -> Self {
        self.device_count = count;
        self
    }

    pub fn with_device_status(mut self, status: vk::Result) -> Self {
        self.device_status = Some(status);
        self
    }

    pub fn with_context_status(mut self, status: vk::Result) -> Self {
        self.context_status = Some(status);
        self
    }

    pub fn with_messenger_status(self, status: vk::Result) -> Self {
        MESSENGER_STATUS.with(|s| s.set(status));
        self
    }

    pub fn without_entry_points(mut self) -> Self {
        self.entry_points = false;
        self
    }

    pub fn device_handle(index: usize) -> vk::PhysicalDevice {
        vk::PhysicalDevice::from_raw(DEVICE_HANDLE_BASE + index as u64)
    }

    fn device_index(device: vk::PhysicalDevice) -> usize {
        (device.as_raw() - DEVICE_HANDLE_BASE) as usize
    }

    pub fn last_request(&self) -> Option<&CreatedContext> {
        self.requests.last()
    }

    pub fn live_contexts(&self) -> usize {
        self.live_contexts
    }

    pub fn create_test_context(&mut self) -> MockContext {
        let request = ContextRequest {
            app_name: "test",
            app_version: 0,
            engine_name: "test",
            engine_version: 0,
            api_version: vk::API_VERSION_1_0,
            extensions: &[],
            layers: &[],
            diagnostics: None,
        };
        self.create_context(&request).expect("mock context")
    }
}

impl Driver for MockDriver {
    type Context = MockContext;

    fn enumerate_layers(&self) -> VkResult<Vec<String>> {
        record(Call::EnumerateLayers);
        Ok(self.layers.clone())
    }

    fn enumerate_extensions(&self) -> VkResult<Vec<String>> {
        record(Call::EnumerateExtensions);
        Ok(self.extensions.clone())
    }

    fn create_context(&mut self, request: &ContextRequest<'_>) -> VkResult<MockContext> {
        record(Call::CreateContext);
        if let Some(status) = self.context_status {
            return Err(status);
        }

        self.requests.push(CreatedContext {
            app_name: request.app_name.to_string(),
            api_version: request.api_version,
            extensions: request.extensions.to_vec(),
            layers: request.layers.to_vec(),
            chained_diagnostics: request.diagnostics.is_some(),
        });

        // A real loader reports through the chained messenger while the instance is built
        if let Some(info) = request.diagnostics {
            if let Some(callback) = info.pfn_user_callback {
                let data = vk::DebugUtilsMessengerCallbackDataEXT::builder()
                    .message(c"instance created")
                    .build();
                unsafe {
                    callback(
                        vk::DebugUtilsMessageSeverityFlagsEXT::INFO,
                        vk::DebugUtilsMessageTypeFlagsEXT::GENERAL,
                        &data,
                        info.p_user_data,
                    );
                }
            }
        }

        self.live_contexts += 1;
        Ok(MockContext {
            instance: vk::Instance::from_raw(INSTANCE_HANDLE),
        })
    }

    fn instance_handle(&self, context: &MockContext) -> vk::Instance {
        context.instance
    }

    fn get_instance_proc_addr(
        &self,
        _context: &MockContext,
        name: &CStr,
    ) -> vk::PFN_vkVoidFunction {
        if !self.entry_points {
            return None;
        }
        unsafe {
            if name == CREATE_DEBUG_UTILS_MESSENGER {
                Some(mem::transmute::<
                    vk::PFN_vkCreateDebugUtilsMessengerEXT,
                    unsafe extern "system" fn(),
                >(mock_create_messenger))
            } else if name == DESTROY_DEBUG_UTILS_MESSENGER {
                Some(mem::transmute::<
                    vk::PFN_vkDestroyDebugUtilsMessengerEXT,
                    unsafe extern "system" fn(),
                >(mock_destroy_messenger))
            } else {
                None
            }
        }
    }

    fn enumerate_devices(&self, _context: &MockContext) -> VkResult<Vec<vk::PhysicalDevice>> {
        record(Call::EnumerateDevices);
        if let Some(status) = self.device_status {
            return Err(status);
        }
        Ok((0..self.device_count).map(Self::device_handle).collect())
    }

    fn device_properties(
        &self,
        _context: &MockContext,
        device: vk::PhysicalDevice,
    ) -> vk::PhysicalDeviceProperties {
        let index = Self::device_index(device);
        record(Call::DeviceProperties(index));

        let mut properties = vk::PhysicalDeviceProperties {
            api_version: vk::API_VERSION_1_3,
            driver_version: 1,
            vendor_id: if index % 2 == 1 { 0x10de } else { 0x1002 },
            device_id: index as u32,
            device_type: if index == 0 {
                vk::PhysicalDeviceType::DISCRETE_GPU
            } else {
                vk::PhysicalDeviceType::INTEGRATED_GPU
            },
            ..Default::default()
        };
        let name = format!("Mock GPU {index}");
        for (dst, src) in properties.device_name.iter_mut().zip(name.bytes()) {
            *dst = src as c_char;
        }
        properties
    }

    fn device_features(
        &self,
        _context: &MockContext,
        device: vk::PhysicalDevice,
    ) -> vk::PhysicalDeviceFeatures {
        record(Call::DeviceFeatures(Self::device_index(device)));
        vk::PhysicalDeviceFeatures {
            geometry_shader: vk::TRUE,
            ..Default::default()
        }
    }

    fn destroy_context(&mut self, _context: MockContext) {
        record(Call::DestroyContext);
        self.live_contexts -= 1;
    }
}

/// Window double that asks to close after a fixed number of polls
pub struct MockWindowing {
    platform_extensions: Vec<String>,
    frames: usize,
    polls: usize,
    fail_window: bool,
    live_windows: usize,
}

#[derive(Debug)]
pub struct MockWindow;

impl MockWindowing {
    pub fn new(frames: usize) -> Self {
        Self {
            platform_extensions: vec![
                "VK_KHR_surface".to_string(),
                "VK_KHR_xlib_surface".to_string(),
            ],
            frames,
            polls: 0,
            fail_window: false,
            live_windows: 0,
        }
    }

    pub fn failing() -> Self {
        Self {
            fail_window: true,
            ..Self::new(0)
        }
    }

    pub fn live_windows(&self) -> usize {
        self.live_windows
    }
}

impl Windowing for MockWindowing {
    type Window = MockWindow;

    fn create_window(&mut self, width: u32, height: u32, title: &str) -> Result<MockWindow> {
        record(Call::CreateWindow {
            width,
            height,
            title: title.to_string(),
        });
        if self.fail_window {
            return Err(BootstrapError::WindowCreation("no display".to_string()));
        }
        self.live_windows += 1;
        Ok(MockWindow)
    }

    fn required_instance_extensions(&self, _window: &MockWindow) -> Result<Vec<String>> {
        record(Call::RequiredExtensions);
        Ok(self.platform_extensions.clone())
    }

    fn should_close(&self, _window: &MockWindow) -> bool {
        record(Call::ShouldClose);
        self.polls >= self.frames
    }

    fn poll_events(&mut self) {
        record(Call::PollEvents);
        self.polls += 1;
    }

    fn destroy_window(&mut self, _window: MockWindow) {
        record(Call::DestroyWindow);
        self.live_windows -= 1;
    }
}

/// Sink that keeps owned copies of everything it receives
#[derive(Clone, Default)]
pub struct RecordingSink {
    messages: Rc<RefCell<Vec<DiagnosticMessage<'static>>>>,
}

impl RecordingSink {
    pub fn messages(&self) -> Vec<DiagnosticMessage<'static>> {
        self.messages.borrow().clone()
    }
}

impl DiagnosticsSink for RecordingSink {
    fn receive(&self, message: &DiagnosticMessage<'_>) {
        self.messages.borrow_mut().push(DiagnosticMessage {
            severity: message.severity,
            category: message.category,
            id_name: message.id_name.as_ref().map(|s| Cow::Owned(s.to_string())),
            text: Cow::Owned(message.text.to_string()),
        });
    }
}
