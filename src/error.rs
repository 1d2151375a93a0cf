// Error kinds raised during bootstrap
//
// Every component reports its own typed failure. Only the lifecycle driver
// catches them, unwinds, and wraps the cause with the stage that failed.

use ash::vk;
use thiserror::Error;

use crate::lifecycle::Stage;

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("requested diagnostic layers are not available: {}", missing.join(", "))]
    LayerUnavailable { missing: Vec<String> },

    #[error("failed to create Vulkan instance: {0}")]
    ContextCreationFailed(vk::Result),

    #[error("extension entry point `{0}` could not be resolved")]
    UnsupportedExtension(&'static str),

    #[error("failed to register debug messenger: {0}")]
    RegistrationFailed(vk::Result),

    #[error("failed to find GPUs with Vulkan support")]
    NoDevicesFound,

    #[error("failed to find a suitable GPU")]
    NoSuitableDevice,

    #[error("failed to create window: {0}")]
    WindowCreation(String),

    #[error("failed to query platform instance extensions: {0}")]
    PlatformExtensions(vk::Result),

    #[error("failed to query driver capabilities: {0}")]
    CapabilityQuery(vk::Result),

    #[error("failed to enumerate physical devices: {0}")]
    DeviceEnumeration(vk::Result),

    #[error("{0} has not completed")]
    StageSkipped(Stage),

    #[error("bootstrap already started (stage: {0}); create a new one for another cycle")]
    AlreadyStarted(Stage),
}

pub type Result<T> = std::result::Result<T, BootstrapError>;

/// Startup failure tagged with the stage the lifecycle was trying to enter.
#[derive(Debug, Error)]
#[error("startup failed while entering {stage}")]
pub struct StartupError {
    pub stage: Stage,
    #[source]
    pub source: BootstrapError,
}
