// =============================================================================
// VULKAN BOOTSTRAP
// =============================================================================
//
// Opens a window, creates a Vulkan instance (with validation when enabled),
// picks a physical device, idles until the window closes, then tears
// everything down in reverse order.
//
// Exit code is 0 on a clean run; any startup failure is printed to stderr
// and the process exits non-zero.
//
// =============================================================================

use anyhow::{Context, Result};
use vk_bootstrap::backend::{AshDriver, LogSink};
use vk_bootstrap::window::WinitWindowing;
use vk_bootstrap::{Bootstrap, Config};

fn main() -> Result<()> {
    // Load configuration from config.toml; report how once logging is up
    let (config, origin) = Config::load();

    init_logging(&config);
    origin.report();
    log::debug!("Config: {:?}", config);
    log::info!("Starting Vulkan bootstrap");
    log::info!(
        "Window: {}x{} ({})",
        config.window.width,
        config.window.height,
        config.window.title
    );
    log::info!(
        "Validation: {}",
        if config.diagnostics.enabled { "enabled" } else { "disabled" }
    );

    let driver = AshDriver::load()?;
    let windowing = WinitWindowing::new(config.window.resizable)
        .context("Failed to create event loop")?;
    let sink = Box::new(LogSink::new(config.diagnostics.min_severity));

    let mut bootstrap = Bootstrap::new(config, driver, windowing, sink);
    bootstrap.run()?;

    log::info!("Exited cleanly");
    Ok(())
}

/// Initialize logging; `RUST_LOG` overrides the default level
fn init_logging(config: &Config) {
    use env_logger::{Builder, Env};
    use log::LevelFilter;

    let mut builder = Builder::new();
    builder.filter_level(if config.debug.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    });
    builder.parse_env(Env::default());
    builder.init();
}
