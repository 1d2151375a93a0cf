// Extension entry points looked up at runtime
//
// `VK_EXT_debug_utils` functions are not exported by the loader, so they are
// fetched by name from the live instance. A miss is an ordinary outcome.

use ash::vk;
use std::ffi::CStr;
use std::mem;

use super::Driver;

pub const CREATE_DEBUG_UTILS_MESSENGER: &CStr = c"vkCreateDebugUtilsMessengerEXT";
pub const DESTROY_DEBUG_UTILS_MESSENGER: &CStr = c"vkDestroyDebugUtilsMessengerEXT";

/// Untyped lookup; `None` when the driver does not know `name`.
pub fn resolve<D: Driver>(
    driver: &D,
    context: &D::Context,
    name: &CStr,
) -> Option<unsafe extern "system" fn()> {
    let function = driver.get_instance_proc_addr(context, name);
    if function.is_none() {
        log::debug!("Entry point {:?} not found", name);
    }
    function
}

pub fn resolve_create_messenger<D: Driver>(
    driver: &D,
    context: &D::Context,
) -> Option<vk::PFN_vkCreateDebugUtilsMessengerEXT> {
    resolve(driver, context, CREATE_DEBUG_UTILS_MESSENGER)
        // SAFETY: the loader returned this pointer for exactly this name
        .map(|f| unsafe { mem::transmute::<_, vk::PFN_vkCreateDebugUtilsMessengerEXT>(f) })
}

pub fn resolve_destroy_messenger<D: Driver>(
    driver: &D,
    context: &D::Context,
) -> Option<vk::PFN_vkDestroyDebugUtilsMessengerEXT> {
    resolve(driver, context, DESTROY_DEBUG_UTILS_MESSENGER)
        // SAFETY: the loader returned this pointer for exactly this name
        .map(|f| unsafe { mem::transmute::<_, vk::PFN_vkDestroyDebugUtilsMessengerEXT>(f) })
}
