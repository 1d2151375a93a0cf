// =============================================================================
// CONFIGURATION - Load settings from config.toml
// =============================================================================
//
// Window size, application identity, and diagnostics policy. The whole
// struct is handed to the lifecycle driver; nothing here is global.

use anyhow::{Context, Result};
use ash::vk;
use serde::Deserialize;
use std::path::{Path, PathBuf};

const CONFIG_PATH: &str = "config.toml";

/// Root configuration structure
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    pub window: WindowConfig,
    pub application: ApplicationConfig,
    pub diagnostics: DiagnosticsConfig,
    pub debug: DebugConfig,
}

/// Window settings
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub resizable: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Vulkan".to_string(),
            width: 800,
            height: 600,
            resizable: false,
        }
    }
}

/// `major.minor.patch` triple as written in the config file
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl Default for Version {
    fn default() -> Self {
        Self { major: 1, minor: 0, patch: 0 }
    }
}

impl Version {
    pub fn to_vk(self) -> u32 {
        vk::make_api_version(0, self.major, self.minor, self.patch)
    }
}

/// Identity reported to the driver in `VkApplicationInfo`
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ApplicationConfig {
    pub name: String,
    pub engine_name: String,
    pub version: Version,
    pub engine_version: Version,
    /// Lowest API version the application is written against
    pub api_version: Version,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            name: "Hello Triangle".to_string(),
            engine_name: "No Engine".to_string(),
            version: Version::default(),
            engine_version: Version::default(),
            api_version: Version::default(),
        }
    }
}

/// Minimum severity the default sink forwards to the log
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Verbose,
    Info,
    Warning,
    Error,
}

impl Severity {
    pub fn from_vk(flags: vk::DebugUtilsMessageSeverityFlagsEXT) -> Self {
        if flags.contains(vk::DebugUtilsMessageSeverityFlagsEXT::ERROR) {
            Severity::Error
        } else if flags.contains(vk::DebugUtilsMessageSeverityFlagsEXT::WARNING) {
            Severity::Warning
        } else if flags.contains(vk::DebugUtilsMessageSeverityFlagsEXT::INFO) {
            Severity::Info
        } else {
            Severity::Verbose
        }
    }
}

/// Validation layers and debug messenger
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct DiagnosticsConfig {
    pub enabled: bool,
    pub layers: Vec<String>,
    pub min_severity: Severity,
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            // Validation stays on for debug builds unless the file says otherwise
            enabled: cfg!(debug_assertions),
            layers: vec!["VK_LAYER_KHRONOS_validation".to_string()],
            min_severity: Severity::Verbose,
        }
    }
}

/// Debug settings
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Dump extensions and device properties while bootstrapping
    pub verbose: bool,
}

/// Where the active configuration came from.
///
/// Loading happens before the logger exists, so the outcome is reported
/// afterwards through `report`.
#[derive(Debug)]
pub enum ConfigOrigin {
    File(PathBuf),
    Missing(PathBuf),
    /// File exists but could not be read or parsed; defaults are in use
    Invalid(anyhow::Error),
}

impl ConfigOrigin {
    pub fn report(&self) {
        match self {
            ConfigOrigin::File(path) => log::info!("Loaded configuration from {:?}", path),
            ConfigOrigin::Missing(path) => {
                log::info!("Config file not found at {:?}, using defaults", path)
            }
            ConfigOrigin::Invalid(e) => log::warn!("{:#}. Using defaults.", e),
        }
    }
}

impl Config {
    /// Load `config.toml` from the working directory, falling back to defaults
    pub fn load() -> (Self, ConfigOrigin) {
        Self::load_or_default(CONFIG_PATH)
    }

    pub fn load_or_default<P: AsRef<Path>>(path: P) -> (Self, ConfigOrigin) {
        let path = path.as_ref();
        if !path.exists() {
            return (Config::default(), ConfigOrigin::Missing(path.to_path_buf()));
        }
        match Self::load_from_path(path) {
            Ok(config) => (config, ConfigOrigin::File(path.to_path_buf())),
            Err(e) => (Config::default(), ConfigOrigin::Invalid(e)),
        }
    }

    /// Load configuration from a specific path; a missing file yields defaults
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Ok(Config::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        Self::parse(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Layers to request at instance creation; empty when diagnostics are off
    pub fn requested_layers(&self) -> &[String] {
        if self.diagnostics.enabled {
            &self.diagnostics.layers
        } else {
            &[]
        }
    }
}
