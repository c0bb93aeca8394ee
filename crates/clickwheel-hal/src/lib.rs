//! Hardware Abstraction Layer (HAL)
//!
//! Display and audio controls for clickwheel handhelds: LCD contrast, backlight,
//! screen blanking and the audible beep. Everything the settings layer needs from
//! hardware goes through the [`DeviceControl`] trait so it can be swapped for the
//! [`mock`] backend on desktop builds and in tests.
//!
//! # Example
//!
//! ```no_run
//! use clickwheel_hal::{Device, DeviceConfig, DeviceControl};
//!
//! fn main() -> Result<(), clickwheel_hal::DeviceError> {
//!     let device = Device::detect(DeviceConfig::default());
//!     println!("Hardware revision: {}", device.hw_revision());
//!
//!     device.set_contrast(96)?;
//!     device.beep();
//!     Ok(())
//! }
//! ```

pub mod audio;
pub mod device;
pub mod display;
pub mod mock;

pub use audio::{BeepBackend, BeepConfig, Beeper};
pub use device::{
    BlankMode, Device, DeviceConfig, DeviceControl, DeviceError, PIEZO_REVISION, constrain,
    parse_revision, read_revision,
};
pub use display::{DisplayConfig, Framebuffer, MAX_CONTRAST};

/// HAL Result type
pub type Result<T> = std::result::Result<T, DeviceError>;
