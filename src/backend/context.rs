// Instance creation
//
// Layer support is checked and the extension list is finalised before the
// driver is called. With diagnostics on, the messenger descriptor rides along
// in the pNext chain so messages raised while the instance is being built
// still reach the sink.

use ash::vk;

use super::capabilities::{list_available_layers, missing_layers, required_extensions};
use super::{ContextRequest, Driver};
use crate::config::ApplicationConfig;
use crate::error::{BootstrapError, Result};

/// Diagnostic additions to an instance
#[derive(Debug, Clone, Copy)]
pub struct DiagnosticsRequest<'a> {
    pub layers: &'a [String],
    pub messenger: &'a vk::DebugUtilsMessengerCreateInfoEXT,
}

pub fn build_context<D: Driver>(
    driver: &mut D,
    application: &ApplicationConfig,
    platform_extensions: &[String],
    diagnostics: Option<DiagnosticsRequest<'_>>,
    verbose: bool,
) -> Result<D::Context> {
    // Check if validation layers are available
    if let Some(request) = diagnostics {
        let available = list_available_layers(driver)?;
        let missing = missing_layers(&available, request.layers);
        if !missing.is_empty() {
            log::error!("Validation layers requested, but not available: {:?}", missing);
            return Err(BootstrapError::LayerUnavailable { missing });
        }
        log::debug!("Validation layers supported: {:?}", request.layers);
    }

    if verbose {
        match driver.enumerate_extensions() {
            Ok(available) => {
                log::info!("Available extensions:");
                for name in &available {
                    log::info!("\t{}", name);
                }
            }
            Err(e) => log::warn!("Could not list instance extensions: {:?}", e),
        }
    }

    let extensions = required_extensions(platform_extensions, diagnostics.is_some());
    if verbose {
        log::info!("Required extensions:");
        for name in &extensions {
            log::info!("\t{}", name);
        }
    }

    let request = ContextRequest {
        app_name: &application.name,
        app_version: application.version.to_vk(),
        engine_name: &application.engine_name,
        engine_version: application.engine_version.to_vk(),
        api_version: application.api_version.to_vk(),
        extensions: &extensions,
        layers: diagnostics.map(|d| d.layers).unwrap_or(&[]),
        diagnostics: diagnostics.map(|d| d.messenger),
    };

    let context = driver.create_context(&request).map_err(|status| {
        log::error!("Failed to create instance: {:?}", status);
        BootstrapError::ContextCreationFailed(status)
    })?;

    log::info!("Vulkan instance ready ({})", application.name);
    Ok(context)
}
