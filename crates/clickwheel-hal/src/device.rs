//! Device detection and the hardware control surface
//!
//! Identifies the hardware revision from `/proc/cpuinfo` and bundles the
//! framebuffer and beeper behind the [`DeviceControl`] trait.

use crate::audio::{BeepConfig, Beeper};
use crate::display::{DisplayConfig, Framebuffer};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("Device unavailable: {0}")]
    Unavailable(String),

    #[error("ioctl {request} failed: {source}")]
    Ioctl {
        request: &'static str,
        #[source]
        source: nix::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// First hardware revision that drives a memory-mapped piezo instead of the
/// serial-port beeper
pub const PIEZO_REVISION: u32 = 40000;

/// Clamp `value` into `[min, max]`, favouring `min` if the bounds are inverted
pub fn constrain(min: i32, max: i32, value: i32) -> i32 {
    value.min(max).max(min)
}

/// Screen blanking level passed to the framebuffer driver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlankMode {
    /// Screen on
    On,
    /// Screen off
    Off,
    /// Screen off, controller suspended
    OffSuspend,
    /// LCD powered down
    PowerDown,
}

impl BlankMode {
    /// Raw value understood by the driver
    pub fn raw(self) -> i32 {
        match self {
            BlankMode::On => 0,
            BlankMode::Off => 1,
            BlankMode::OffSuspend => 2,
            BlankMode::PowerDown => 3,
        }
    }

    pub fn from_raw(raw: i32) -> Option<Self> {
        match raw {
            0 => Some(BlankMode::On),
            1 => Some(BlankMode::Off),
            2 => Some(BlankMode::OffSuspend),
            3 => Some(BlankMode::PowerDown),
            _ => None,
        }
    }

    pub fn is_screen_on(self) -> bool {
        self == BlankMode::On
    }
}

/// Display and audio controls consumed by the settings layer.
///
/// Every call blocks until the hardware has acknowledged it. Implementations
/// must be shareable across threads; the settings service serialises access.
pub trait DeviceControl: Send + Sync {
    /// Current LCD contrast
    fn contrast(&self) -> Result<i32, DeviceError>;

    /// Set LCD contrast, clamped to `[0, 128]`
    fn set_contrast(&self, contrast: i32) -> Result<(), DeviceError>;

    /// Current backlight level
    fn backlight(&self) -> Result<i32, DeviceError>;

    fn set_backlight(&self, level: i32) -> Result<(), DeviceError>;

    fn set_blank_mode(&self, mode: BlankMode) -> Result<(), DeviceError>;

    /// Emit a short click. Never fails; on piezo hardware this busy-waits for
    /// the duration of the tone.
    fn beep(&self);

    /// Hardware revision, or 0 when it cannot be determined
    fn hw_revision(&self) -> u32;
}

/// Hardware configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Where the hardware revision is read from
    #[serde(default = "default_cpuinfo_path")]
    pub cpuinfo_path: PathBuf,

    #[serde(default)]
    pub display: DisplayConfig,

    #[serde(default)]
    pub beep: BeepConfig,
}

fn default_cpuinfo_path() -> PathBuf {
    PathBuf::from("/proc/cpuinfo")
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            cpuinfo_path: default_cpuinfo_path(),
            display: DisplayConfig::default(),
            beep: BeepConfig::default(),
        }
    }
}

/// Real hardware: framebuffer ioctls plus the revision-specific beeper
pub struct Device {
    framebuffer: Framebuffer,
    beeper: Beeper,
    revision: u32,
}

impl Device {
    /// Detect the hardware revision and set up device access.
    ///
    /// Detection itself cannot fail: a missing revision leaves the device in
    /// desktop mode (terminal bell, framebuffer calls report `Unavailable`).
    pub fn detect(config: DeviceConfig) -> Self {
        tracing::info!("Attempting to detect device...");

        let revision = read_revision(&config.cpuinfo_path);
        if revision == 0 {
            tracing::warn!(
                "No hardware revision in {}, assuming non-device host",
                config.cpuinfo_path.display()
            );
        } else {
            tracing::info!("Detected hardware revision {}", revision);
        }

        Self {
            framebuffer: Framebuffer::new(config.display),
            beeper: Beeper::new(config.beep, revision),
            revision,
        }
    }

    pub fn framebuffer(&self) -> &Framebuffer {
        &self.framebuffer
    }

    pub fn beeper(&self) -> &Beeper {
        &self.beeper
    }
}

impl DeviceControl for Device {
    fn contrast(&self) -> Result<i32, DeviceError> {
        self.framebuffer.contrast()
    }

    fn set_contrast(&self, contrast: i32) -> Result<(), DeviceError> {
        self.framebuffer.set_contrast(contrast)
    }

    fn backlight(&self) -> Result<i32, DeviceError> {
        self.framebuffer.backlight()
    }

    fn set_backlight(&self, level: i32) -> Result<(), DeviceError> {
        self.framebuffer.set_backlight(level)
    }

    fn set_blank_mode(&self, mode: BlankMode) -> Result<(), DeviceError> {
        self.framebuffer.set_blank_mode(mode)
    }

    fn beep(&self) {
        self.beeper.beep();
    }

    fn hw_revision(&self) -> u32 {
        self.revision
    }
}

/// Read the hardware revision from a cpuinfo-formatted file, 0 if unavailable
pub fn read_revision(path: &Path) -> u32 {
    match fs::read_to_string(path) {
        Ok(contents) => parse_revision(&contents),
        Err(e) => {
            tracing::debug!("Cannot read {}: {}", path.display(), e);
            0
        }
    }
}

/// Extract the decimal `Revision` field from cpuinfo text.
///
/// Only the leading digits of the value are used, so `Revision : 50013 (4G)`
/// yields 50013. Returns 0 when the line is missing or has no digits.
pub fn parse_revision(cpuinfo: &str) -> u32 {
    let Some(line) = cpuinfo.lines().find(|l| l.starts_with("Revision")) else {
        return 0;
    };

    let value = line.split_once(':').map(|(_, v)| v.trim()).unwrap_or("");
    let digits: String = value.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_constrain() {
        assert_eq!(constrain(0, 128, 200), 128);
        assert_eq!(constrain(0, 128, -5), 0);
        assert_eq!(constrain(0, 128, 64), 64);
        // Inverted bounds resolve to the minimum
        assert_eq!(constrain(10, 5, 7), 10);
    }

    #[test]
    fn test_blank_mode_raw_values() {
        assert_eq!(BlankMode::On.raw(), 0);
        assert_eq!(BlankMode::Off.raw(), 1);
        assert_eq!(BlankMode::OffSuspend.raw(), 2);
        assert_eq!(BlankMode::PowerDown.raw(), 3);

        for raw in 0..4 {
            assert_eq!(BlankMode::from_raw(raw).unwrap().raw(), raw);
        }
        assert_eq!(BlankMode::from_raw(4), None);
        assert!(BlankMode::On.is_screen_on());
        assert!(!BlankMode::PowerDown.is_screen_on());
    }

    #[test]
    fn test_parse_revision() {
        let cpuinfo = "Processor\t: ARM7TDMI rev 0 (v4l)\n\
                       BogoMIPS\t: 79.25\n\
                       Hardware\t: Apple iPod\n\
                       Revision\t: 50013\n\
                       Serial\t\t: 0000000000000000\n";
        assert_eq!(parse_revision(cpuinfo), 50013);
    }

    #[test]
    fn test_parse_revision_trailing_text() {
        assert_eq!(parse_revision("Revision : 40004 (mini)\n"), 40004);
    }

    #[test]
    fn test_parse_revision_missing() {
        assert_eq!(parse_revision("Hardware : Generic\n"), 0);
        assert_eq!(parse_revision("Revision : unknown\n"), 0);
        assert_eq!(parse_revision(""), 0);
    }

    #[test]
    fn test_read_revision_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "Hardware\t: Apple iPod").unwrap();
        writeln!(file, "Revision\t: 30000").unwrap();

        assert_eq!(read_revision(file.path()), 30000);
        assert_eq!(read_revision(Path::new("/nonexistent/cpuinfo")), 0);
    }

    #[test]
    fn test_device_config_serialization() {
        let config = DeviceConfig::default();
        let json = serde_json::to_string(&config).expect("Failed to serialize");
        assert!(json.contains("cpuinfo_path"));

        let parsed: DeviceConfig = serde_json::from_str(&json).expect("Failed to deserialize");
        assert_eq!(parsed.cpuinfo_path, config.cpuinfo_path);
        assert_eq!(parsed.display.device_paths, config.display.device_paths);
    }

    #[test]
    fn test_device_config_missing_fields_use_defaults() {
        let parsed: DeviceConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(parsed.cpuinfo_path, PathBuf::from("/proc/cpuinfo"));
        assert_eq!(parsed.beep.serial_paths.len(), 2);
    }

    #[test]
    fn test_detect_without_revision() {
        let config = DeviceConfig {
            cpuinfo_path: PathBuf::from("/nonexistent/cpuinfo"),
            ..DeviceConfig::default()
        };
        let device = Device::detect(config);
        assert_eq!(device.hw_revision(), 0);
    }

    #[test]
    fn test_device_error_display() {
        let err = DeviceError::Unavailable("no framebuffer".into());
        assert_eq!(format!("{err}"), "Device unavailable: no framebuffer");

        let err = DeviceError::Ioctl {
            request: "FBIOGET_CONTRAST",
            source: nix::Error::ENOTTY,
        };
        assert!(format!("{err}").starts_with("ioctl FBIOGET_CONTRAST failed"));
    }
}
