// Backend module - Vulkan bootstrap layer
//
// Design: every driver call goes through the `Driver` trait so the
// sequencing and error checking above it can run against a test double.
// `AshDriver` is the real implementation.

pub mod ash_driver;
pub mod capabilities;
pub mod context;
pub mod device;
pub mod diagnostics;
pub mod entry_points;

use ash::prelude::VkResult;
use ash::vk;
use std::ffi::CStr;

pub use ash_driver::AshDriver;
pub use device::DeviceInfo;
pub use diagnostics::{DiagnosticMessage, DiagnosticsHandle, DiagnosticsSink, LogSink};

/// Everything the driver needs to build an instance.
///
/// Extension and layer lists are final; the instance cannot be amended
/// once created.
#[derive(Debug, Clone, Copy)]
pub struct ContextRequest<'a> {
    pub app_name: &'a str,
    pub app_version: u32,
    pub engine_name: &'a str,
    pub engine_version: u32,
    pub api_version: u32,
    pub extensions: &'a [String],
    pub layers: &'a [String],
    /// Chained into `VkInstanceCreateInfo::pNext` so creation-time messages are delivered
    pub diagnostics: Option<&'a vk::DebugUtilsMessengerCreateInfoEXT>,
}

/// The fixed driver surface the bootstrap sequence drives.
pub trait Driver {
    /// Live instance. Destroyed only through `destroy_context`.
    type Context;

    fn enumerate_layers(&self) -> VkResult<Vec<String>>;

    fn enumerate_extensions(&self) -> VkResult<Vec<String>>;

    fn create_context(&mut self, request: &ContextRequest<'_>) -> VkResult<Self::Context>;

    fn instance_handle(&self, context: &Self::Context) -> vk::Instance;

    /// Raw `vkGetInstanceProcAddr`; `None` means the name is unknown to the driver.
    fn get_instance_proc_addr(
        &self,
        context: &Self::Context,
        name: &CStr,
    ) -> vk::PFN_vkVoidFunction;

    fn enumerate_devices(&self, context: &Self::Context) -> VkResult<Vec<vk::PhysicalDevice>>;

    fn device_properties(
        &self,
        context: &Self::Context,
        device: vk::PhysicalDevice,
    ) -> vk::PhysicalDeviceProperties;

    fn device_features(
        &self,
        context: &Self::Context,
        device: vk::PhysicalDevice,
    ) -> vk::PhysicalDeviceFeatures;

    fn destroy_context(&mut self, context: Self::Context);
}

/// Read a fixed-size, nul-terminated name field from a Vulkan struct.
pub(crate) fn name_from_raw(raw: &[std::os::raw::c_char]) -> String {
    // Vulkan guarantees termination inside the array
    unsafe { CStr::from_ptr(raw.as_ptr()) }
        .to_string_lossy()
        .into_owned()
}
