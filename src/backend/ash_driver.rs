// Ash driver - the real Vulkan loader behind the `Driver` trait
//
// Owns the loaded library (`ash::Entry`). Instances it creates are plain
// `ash::Instance` values; destroying them is the caller's job.

use anyhow::{Context, Result};
use ash::prelude::VkResult;
use ash::{vk, Entry};
use std::ffi::{CStr, CString};

use super::{name_from_raw, ContextRequest, Driver};

pub struct AshDriver {
    entry: Entry,
}

impl AshDriver {
    /// Load the Vulkan library
    pub fn load() -> Result<Self> {
        let entry = unsafe { Entry::load() }
            .context("Failed to load Vulkan library. Is Vulkan installed?")?;
        Ok(Self { entry })
    }
}

fn to_cstrings(names: &[String]) -> VkResult<Vec<CString>> {
    names
        .iter()
        .map(|name| {
            CString::new(name.as_str()).map_err(|_| vk::Result::ERROR_INITIALIZATION_FAILED)
        })
        .collect()
}

impl Driver for AshDriver {
    type Context = ash::Instance;

    fn enumerate_layers(&self) -> VkResult<Vec<String>> {
        let layers = unsafe { self.entry.enumerate_instance_layer_properties() }?;
        Ok(layers.iter().map(|l| name_from_raw(&l.layer_name)).collect())
    }

    fn enumerate_extensions(&self) -> VkResult<Vec<String>> {
        let extensions = unsafe { self.entry.enumerate_instance_extension_properties(None) }?;
        Ok(extensions
            .iter()
            .map(|e| name_from_raw(&e.extension_name))
            .collect())
    }

    fn create_context(&mut self, request: &ContextRequest<'_>) -> VkResult<ash::Instance> {
        // Names containing interior nul bytes can never match a driver name
        let app_name = CString::new(request.app_name)
            .map_err(|_| vk::Result::ERROR_INITIALIZATION_FAILED)?;
        let engine_name = CString::new(request.engine_name)
            .map_err(|_| vk::Result::ERROR_INITIALIZATION_FAILED)?;

        let app_info = vk::ApplicationInfo::builder()
            .application_name(&app_name)
            .application_version(request.app_version)
            .engine_name(&engine_name)
            .engine_version(request.engine_version)
            .api_version(request.api_version);

        let extensions = to_cstrings(request.extensions)?;
        let extension_ptrs: Vec<_> = extensions.iter().map(|e| e.as_ptr()).collect();
        let layers = to_cstrings(request.layers)?;
        let layer_ptrs: Vec<_> = layers.iter().map(|l| l.as_ptr()).collect();

        let mut create_info = vk::InstanceCreateInfo::builder()
            .application_info(&app_info)
            .enabled_extension_names(&extension_ptrs)
            .enabled_layer_names(&layer_ptrs);

        // Chained copy; must live until create_instance returns
        let mut debug_info = request.diagnostics.copied();
        if let Some(debug_info) = debug_info.as_mut() {
            create_info = create_info.push_next(debug_info);
        }

        unsafe { self.entry.create_instance(&create_info, None) }
    }

    fn instance_handle(&self, context: &ash::Instance) -> vk::Instance {
        context.handle()
    }

    fn get_instance_proc_addr(
        &self,
        context: &ash::Instance,
        name: &CStr,
    ) -> vk::PFN_vkVoidFunction {
        unsafe { self.entry.get_instance_proc_addr(context.handle(), name.as_ptr()) }
    }

    fn enumerate_devices(&self, context: &ash::Instance) -> VkResult<Vec<vk::PhysicalDevice>> {
        unsafe { context.enumerate_physical_devices() }
    }

    fn device_properties(
        &self,
        context: &ash::Instance,
        device: vk::PhysicalDevice,
    ) -> vk::PhysicalDeviceProperties {
        unsafe { context.get_physical_device_properties(device) }
    }

    fn device_features(
        &self,
        context: &ash::Instance,
        device: vk::PhysicalDevice,
    ) -> vk::PhysicalDeviceFeatures {
        unsafe { context.get_physical_device_features(device) }
    }

    fn destroy_context(&mut self, context: ash::Instance) {
        unsafe { context.destroy_instance(None) };
    }
}
