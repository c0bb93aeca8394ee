//! Clickwheel boot-time settings loader
//!
//! Runs once per boot, before the UI starts:
//! 1. Read configuration
//! 2. Detect hardware (or a mock device on development hosts)
//! 3. Restore saved settings, or fall back to defaults
//!
//! Environment:
//! - `CLICKWHEEL_CONFIG`: configuration file instead of the default locations
//! - `CLICKWHEEL_MOCK_DEVICE`: use the named mock profile instead of real hardware
//! - `CLICKWHEEL_RESET=1`: discard saved settings and start from defaults

use anyhow::{Context, Result};
use clickwheel_hal::mock::MockDevice;
use clickwheel_hal::{Device, DeviceControl};
use clickwheel_settings::{ClickwheelConfig, LoadOutcome, LogFrontend, SettingsService};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

fn main() -> Result<()> {
    let start = Instant::now();

    setup_logging();

    info!("Clickwheel boot starting...");

    let config = load_config()?;
    let device = detect_device(&config);

    let mut settings =
        SettingsService::from_config(&config.settings, device, Arc::new(LogFrontend));

    if reset_requested() {
        info!("Reset requested, restoring default settings");
        // Failure has already been reported through the frontend
        let _ = settings.reset();
    } else if let LoadOutcome::Defaults(reason) = settings.load() {
        info!("Using default settings ({:?})", reason);
    }

    // Later saves from the UI need the file to exist
    if let Err(e) = settings.touch() {
        warn!("Settings file unavailable: {}", e);
    }

    info!("Settings applied in {:?}", start.elapsed());
    Ok(())
}

/// Setup logging to console
fn setup_logging() {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_ansi(false))
        .init();
}

fn load_config() -> Result<ClickwheelConfig> {
    match std::env::var_os("CLICKWHEEL_CONFIG") {
        Some(path) => {
            let path = PathBuf::from(path);
            ClickwheelConfig::load(&path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))
        }
        None => ClickwheelConfig::load_default().context("Failed to load configuration"),
    }
}

fn detect_device(config: &ClickwheelConfig) -> Arc<dyn DeviceControl> {
    if std::env::var_os("CLICKWHEEL_MOCK_DEVICE").is_some() {
        let mock = MockDevice::from_env();
        info!("Using mock device {:?}", mock.profile());
        return Arc::new(mock);
    }

    Arc::new(Device::detect(config.device.clone()))
}

fn reset_requested() -> bool {
    std::env::var("CLICKWHEEL_RESET").is_ok_and(|v| v == "1")
}
