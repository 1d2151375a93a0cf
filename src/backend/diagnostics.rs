// Diagnostics channel - debug messenger plumbing
//
// The driver reports validation, performance, and general messages through a
// C callback. `debug_callback` unpacks them and hands them to a
// `DiagnosticsSink`; the sink decides what to keep.

use ash::vk;
use std::borrow::Cow;
use std::ffi::{c_void, CStr};
use std::panic::{self, AssertUnwindSafe};
use std::ptr;

use super::entry_points::{resolve_create_messenger, resolve_destroy_messenger};
use super::Driver;
use crate::config::Severity;
use crate::error::{BootstrapError, Result};

/// Request every severity, filter in the sink
pub const ALL_SEVERITIES: vk::DebugUtilsMessageSeverityFlagsEXT =
    vk::DebugUtilsMessageSeverityFlagsEXT::from_raw(
        vk::DebugUtilsMessageSeverityFlagsEXT::VERBOSE.as_raw()
            | vk::DebugUtilsMessageSeverityFlagsEXT::INFO.as_raw()
            | vk::DebugUtilsMessageSeverityFlagsEXT::WARNING.as_raw()
            | vk::DebugUtilsMessageSeverityFlagsEXT::ERROR.as_raw(),
    );

pub const ALL_CATEGORIES: vk::DebugUtilsMessageTypeFlagsEXT =
    vk::DebugUtilsMessageTypeFlagsEXT::from_raw(
        vk::DebugUtilsMessageTypeFlagsEXT::GENERAL.as_raw()
            | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION.as_raw()
            | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE.as_raw(),
    );

/// One driver message as delivered to a sink
#[derive(Debug, Clone)]
pub struct DiagnosticMessage<'a> {
    pub severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    pub category: vk::DebugUtilsMessageTypeFlagsEXT,
    pub id_name: Option<Cow<'a, str>>,
    pub text: Cow<'a, str>,
}

/// Receiver for driver messages.
///
/// Called synchronously from inside whatever driver call emitted the message,
/// on the thread that made it. Delivery cannot be vetoed: the driver is always
/// told the message was not handled.
pub trait DiagnosticsSink {
    fn receive(&self, message: &DiagnosticMessage<'_>);
}

/// Default sink: forwards to `log` at a level matching the severity
#[derive(Debug, Clone, Copy)]
pub struct LogSink {
    pub min_severity: Severity,
}

impl LogSink {
    pub fn new(min_severity: Severity) -> Self {
        Self { min_severity }
    }

    /// Whether a message of `severity` reaches the log
    pub fn forwards(&self, severity: vk::DebugUtilsMessageSeverityFlagsEXT) -> bool {
        Severity::from_vk(severity) >= self.min_severity
    }
}

impl DiagnosticsSink for LogSink {
    fn receive(&self, message: &DiagnosticMessage<'_>) {
        if !self.forwards(message.severity) {
            return;
        }

        match Severity::from_vk(message.severity) {
            Severity::Error => log::error!("[Vulkan] {:?} {}", message.category, message.text),
            Severity::Warning => log::warn!("[Vulkan] {:?} {}", message.category, message.text),
            Severity::Info => log::info!("[Vulkan] {:?} {}", message.category, message.text),
            Severity::Verbose => log::debug!("[Vulkan] {:?} {}", message.category, message.text),
        }
    }
}

/// Heap slot whose address is handed to the driver as callback user data.
///
/// Must outlive every messenger and instance created with a descriptor that
/// points at it.
pub struct SinkBinding {
    sink: Box<Box<dyn DiagnosticsSink>>,
}

impl SinkBinding {
    pub fn new(sink: Box<dyn DiagnosticsSink>) -> Self {
        Self { sink: Box::new(sink) }
    }

    fn user_data(&self) -> *mut c_void {
        &*self.sink as *const Box<dyn DiagnosticsSink> as *mut c_void
    }

    /// Messenger descriptor routed to this binding's sink
    pub fn create_info(
        &self,
        severity: vk::DebugUtilsMessageSeverityFlagsEXT,
        categories: vk::DebugUtilsMessageTypeFlagsEXT,
    ) -> vk::DebugUtilsMessengerCreateInfoEXT {
        vk::DebugUtilsMessengerCreateInfoEXT::builder()
            .message_severity(severity)
            .message_type(categories)
            .pfn_user_callback(Some(debug_callback))
            .user_data(self.user_data())
            .build()
    }
}

/// Registered messenger. Consumed by `disable`.
#[derive(Debug, PartialEq, Eq)]
pub struct DiagnosticsHandle {
    messenger: vk::DebugUtilsMessengerEXT,
}

impl DiagnosticsHandle {
    pub fn raw(&self) -> vk::DebugUtilsMessengerEXT {
        self.messenger
    }
}

/// Register a messenger that lives until `disable`.
pub fn enable<D: Driver>(
    driver: &D,
    context: &D::Context,
    severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    categories: vk::DebugUtilsMessageTypeFlagsEXT,
    sink: &SinkBinding,
) -> Result<DiagnosticsHandle> {
    let create = resolve_create_messenger(driver, context)
        .ok_or(BootstrapError::UnsupportedExtension("vkCreateDebugUtilsMessengerEXT"))?;

    let create_info = sink.create_info(severity, categories);
    let mut messenger = vk::DebugUtilsMessengerEXT::null();
    let status = unsafe {
        create(
            driver.instance_handle(context),
            &create_info,
            ptr::null(),
            &mut messenger,
        )
    };

    if status != vk::Result::SUCCESS {
        log::error!("Failed to set up debug messenger: {:?}", status);
        return Err(BootstrapError::RegistrationFailed(status));
    }

    log::debug!("Debug messenger registered");
    Ok(DiagnosticsHandle { messenger })
}

/// Unregister the messenger. Never fails: a missing destroy entry point
/// means there is nothing left to tear down.
pub fn disable<D: Driver>(driver: &D, context: &D::Context, handle: DiagnosticsHandle) {
    match resolve_destroy_messenger(driver, context) {
        Some(destroy) => unsafe {
            destroy(driver.instance_handle(context), handle.messenger, ptr::null());
        },
        None => {
            log::warn!("vkDestroyDebugUtilsMessengerEXT unavailable, skipping messenger teardown")
        }
    }
}

// Debug callback for validation layers
pub(crate) unsafe extern "system" fn debug_callback(
    message_severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    message_type: vk::DebugUtilsMessageTypeFlagsEXT,
    p_callback_data: *const vk::DebugUtilsMessengerCallbackDataEXT,
    p_user_data: *mut c_void,
) -> vk::Bool32 {
    if p_callback_data.is_null() || p_user_data.is_null() {
        return vk::FALSE;
    }

    let data = &*p_callback_data;
    let text = if data.p_message.is_null() {
        Cow::Borrowed("")
    } else {
        CStr::from_ptr(data.p_message).to_string_lossy()
    };
    let id_name = (!data.p_message_id_name.is_null())
        .then(|| CStr::from_ptr(data.p_message_id_name).to_string_lossy());

    let message = DiagnosticMessage {
        severity: message_severity,
        category: message_type,
        id_name,
        text,
    };

    let sink = &*(p_user_data as *const Box<dyn DiagnosticsSink>);

    // Unwinding into the driver is undefined behaviour
    if panic::catch_unwind(AssertUnwindSafe(|| sink.receive(&message))).is_err() {
        log::error!("Diagnostics sink panicked; message dropped");
    }

    vk::FALSE
}
