// Capability probing - what the driver offers before an instance exists
//
// Pure queries: nothing here creates or mutates driver state.

use super::Driver;
use crate::error::{BootstrapError, Result};

/// Instance extension that carries the debug messenger
pub const DEBUG_UTILS_EXTENSION: &str = "VK_EXT_debug_utils";

pub fn list_available_layers<D: Driver>(driver: &D) -> Result<Vec<String>> {
    driver
        .enumerate_layers()
        .map_err(BootstrapError::CapabilityQuery)
}

/// Requested layers the driver does not report, in request order.
///
/// Exact name comparison; an empty result means the request is satisfiable.
pub fn missing_layers(available: &[String], requested: &[String]) -> Vec<String> {
    requested
        .iter()
        .filter(|name| !available.contains(name))
        .cloned()
        .collect()
}

pub fn layers_supported<D: Driver>(driver: &D, requested: &[String]) -> Result<bool> {
    let available = list_available_layers(driver)?;
    Ok(missing_layers(&available, requested).is_empty())
}

/// Platform extensions followed by the debug-utils extension when diagnostics are on.
///
/// Platform order is kept and the result never holds duplicates.
pub fn required_extensions(platform: &[String], diagnostics_enabled: bool) -> Vec<String> {
    let mut extensions: Vec<String> = Vec::with_capacity(platform.len() + 1);
    for name in platform {
        if !extensions.contains(name) {
            extensions.push(name.clone());
        }
    }

    if diagnostics_enabled && !extensions.iter().any(|e| e == DEBUG_UTILS_EXTENSION) {
        extensions.push(DEBUG_UTILS_EXTENSION.to_string());
    }

    extensions
}
