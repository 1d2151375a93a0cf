// Vulkan bootstrap: window, instance, optional validation, physical device,
// and an ordered teardown.

pub mod backend;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod window;

#[cfg(test)]
mod testing;

pub use config::Config;
pub use error::{BootstrapError, StartupError};
pub use lifecycle::{Bootstrap, Stage};
