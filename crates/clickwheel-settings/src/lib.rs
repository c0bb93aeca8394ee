//! Display and audio settings for clickwheel handhelds
//!
//! A fixed table of integer settings, persisted as a flat binary blob. Writing
//! a setting through [`SettingsService`] both records it and pushes it to the
//! hardware (contrast, backlight, backlight timer) or to the UI (colour scheme,
//! decorations). At boot, [`SettingsService::load`] restores the saved table or
//! builds defaults from the current hardware state.
//!
//! # Example
//!
//! ```no_run
//! use clickwheel_hal::mock::{MockDevice, MockProfile};
//! use clickwheel_settings::{LogFrontend, Setting, SettingsService};
//! use std::sync::Arc;
//!
//! let device = Arc::new(MockDevice::new(MockProfile::FourthGen));
//! let mut settings = SettingsService::new("/tmp/settings.bin", device, Arc::new(LogFrontend));
//!
//! settings.load();
//! settings.set(Setting::BacklightTimer, 4);
//! settings.save().ok();
//! ```

mod config;
mod dispatch;
mod frontend;
pub mod mock;
mod service;
mod setting;
mod table;

pub use config::{CONFIG_DIR, ClickwheelConfig, SettingsConfig, USER_CONFIG_DIR};
pub use dispatch::{BACKLIGHT_TIMEOUTS, Dispatch, Dispatcher, backlight_timeout};
pub use frontend::{Frontend, LogFrontend};
pub use service::{
    DEFAULTS, DefaultReason, LOAD_FAILED, LoadOutcome, SAVE_FAILED, SettingsService,
    SharedSettings,
};
pub use setting::{SLOT_COUNT, Setting, Slot};
pub use table::{ENCODED_LEN, MAX_VALUE, SettingsTable};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Setting index out of range: {0}")]
    OutOfRange(usize),

    #[error("Settings file too short: expected {expected} bytes, got {actual}")]
    Format { expected: usize, actual: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}
