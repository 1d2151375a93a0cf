// Physical device selection
//
// Responsibilities:
// - Enumerate the GPUs the instance exposes
// - Describe each one (properties + feature bits) to a caller-supplied predicate
// - Take the first candidate the predicate accepts, in driver order
//
// The handle is borrowed from the instance's device table: it is never
// released and becomes meaningless once the instance is destroyed.

use ash::vk;

use super::{name_from_raw, Driver};
use crate::error::{BootstrapError, Result};

/// What a suitability predicate gets to look at
#[derive(Debug, Clone)]
pub struct DeviceInfo {
    pub handle: vk::PhysicalDevice,
    pub name: String,
    pub device_type: vk::PhysicalDeviceType,
    pub api_version: u32,
    pub driver_version: u32,
    pub vendor_id: u32,
    pub device_id: u32,
    pub features: vk::PhysicalDeviceFeatures,
}

impl DeviceInfo {
    pub fn query<D: Driver>(driver: &D, context: &D::Context, handle: vk::PhysicalDevice) -> Self {
        let properties = driver.device_properties(context, handle);
        let features = driver.device_features(context, handle);

        Self {
            handle,
            name: name_from_raw(&properties.device_name),
            device_type: properties.device_type,
            api_version: properties.api_version,
            driver_version: properties.driver_version,
            vendor_id: properties.vendor_id,
            device_id: properties.device_id,
            features,
        }
    }

    fn log_details(&self) {
        log::info!("Device name: {}", self.name);
        log::info!("\tDevice type: {:?}", self.device_type);
        log::info!(
            "\tAPI version: {}.{}.{}",
            vk::api_version_major(self.api_version),
            vk::api_version_minor(self.api_version),
            vk::api_version_patch(self.api_version)
        );
        log::info!("\tDriver version: {}", self.driver_version);
        log::info!("\tVendor ID: {:#06x}", self.vendor_id);
        log::info!("\tDevice ID: {:#06x}", self.device_id);

        let f = &self.features;
        let flags = [
            ("Geometry shader", f.geometry_shader),
            ("Tessellation shader", f.tessellation_shader),
            ("Sampler anisotropy", f.sampler_anisotropy),
            ("Texture compression BC", f.texture_compression_bc),
            ("Texture compression ASTC_LDR", f.texture_compression_astc_ldr),
            ("Texture compression ETC2", f.texture_compression_etc2),
            ("Shader storage image extended formats", f.shader_storage_image_extended_formats),
            (
                "Shader storage image read without format",
                f.shader_storage_image_read_without_format,
            ),
            (
                "Shader storage image write without format",
                f.shader_storage_image_write_without_format,
            ),
            (
                "Shader uniform buffer array dynamic indexing",
                f.shader_uniform_buffer_array_dynamic_indexing,
            ),
            (
                "Shader sampled image array dynamic indexing",
                f.shader_sampled_image_array_dynamic_indexing,
            ),
            (
                "Shader storage buffer array dynamic indexing",
                f.shader_storage_buffer_array_dynamic_indexing,
            ),
            (
                "Shader storage image array dynamic indexing",
                f.shader_storage_image_array_dynamic_indexing,
            ),
            ("Shader clip distance", f.shader_clip_distance),
            ("Shader cull distance", f.shader_cull_distance),
            ("Shader float64", f.shader_float64),
            ("Shader int64", f.shader_int64),
            ("Shader int16", f.shader_int16),
            ("Shader resource residency", f.shader_resource_residency),
        ];
        log::info!("\t\tDevice features:");
        for (label, supported) in flags {
            log::info!("\t\t\t{} support: {}", label, supported == vk::TRUE);
        }
    }
}

/// Accepts any device. Placeholder policy until real requirements exist.
pub fn accept_first(_device: &DeviceInfo) -> bool {
    true
}

/// Pick the first enumerated device accepted by `predicate`.
///
/// Devices after the match are never queried.
pub fn select_device<D, P>(
    driver: &D,
    context: &D::Context,
    mut predicate: P,
    verbose: bool,
) -> Result<DeviceInfo>
where
    D: Driver,
    P: FnMut(&DeviceInfo) -> bool,
{
    let devices = driver
        .enumerate_devices(context)
        .map_err(BootstrapError::DeviceEnumeration)?;

    if devices.is_empty() {
        return Err(BootstrapError::NoDevicesFound);
    }
    log::info!("Devices found: {}", devices.len());

    for handle in devices {
        let info = DeviceInfo::query(driver, context, handle);

        log::debug!("Checking device suitability: {}", info.name);
        if verbose {
            info.log_details();
        }

        if predicate(&info) {
            log::info!("Selected GPU: {}", info.name);
            return Ok(info);
        }
    }

    Err(BootstrapError::NoSuitableDevice)
}
