//! Display management
//!
//! LCD contrast, backlight and blanking through framebuffer ioctls.

use crate::device::{BlankMode, DeviceError, constrain};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::os::fd::AsRawFd;
use std::os::unix::fs::OpenOptionsExt;
use std::path::PathBuf;

/// Highest contrast value the LCD controller accepts
pub const MAX_CONTRAST: i32 = 128;

mod ioctl {
    const FBIOBLANK: u32 = 0x4611;

    nix::ioctl_read!(fbioget_contrast, b'F', 0x22, libc::c_int);
    nix::ioctl_write_int!(fbioset_contrast, b'F', 0x23);
    nix::ioctl_read!(fbioget_backlight, b'F', 0x24, libc::c_int);
    nix::ioctl_write_int!(fbioset_backlight, b'F', 0x25);
    nix::ioctl_write_int_bad!(fbioblank, FBIOBLANK);
}

/// Display configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Framebuffer device nodes, tried in order
    #[serde(default = "default_device_paths")]
    pub device_paths: Vec<PathBuf>,
}

fn default_device_paths() -> Vec<PathBuf> {
    // Plain /dev first, devfs layout as fallback
    vec![PathBuf::from("/dev/fb0"), PathBuf::from("/dev/fb/0")]
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            device_paths: default_device_paths(),
        }
    }
}

/// Framebuffer control handle.
///
/// The device node is opened for each request and closed right after, so a
/// missing or late-appearing framebuffer never leaves a stale descriptor.
pub struct Framebuffer {
    config: DisplayConfig,
}

impl Framebuffer {
    pub fn new(config: DisplayConfig) -> Self {
        Self { config }
    }

    fn open(&self) -> Result<File, DeviceError> {
        for path in &self.config.device_paths {
            match OpenOptions::new()
                .read(true)
                .custom_flags(libc::O_NONBLOCK)
                .open(path)
            {
                Ok(file) => return Ok(file),
                Err(e) => tracing::trace!("Cannot open {}: {}", path.display(), e),
            }
        }

        Err(DeviceError::Unavailable("no framebuffer device".into()))
    }

    /// Read LCD contrast
    pub fn contrast(&self) -> Result<i32, DeviceError> {
        let fb = self.open()?;
        let mut contrast: libc::c_int = 0;

        // SAFETY: the descriptor is open for the duration of the call and the
        // driver writes a single int into `contrast`.
        unsafe { ioctl::fbioget_contrast(fb.as_raw_fd(), &mut contrast) }.map_err(|source| {
            DeviceError::Ioctl {
                request: "FBIOGET_CONTRAST",
                source,
            }
        })?;

        Ok(contrast)
    }

    /// Set LCD contrast (0-128)
    pub fn set_contrast(&self, contrast: i32) -> Result<(), DeviceError> {
        let contrast = constrain(0, MAX_CONTRAST, contrast);
        let fb = self.open()?;

        // SAFETY: integer-argument ioctl, nothing is dereferenced.
        unsafe {
            ioctl::fbioset_contrast(
                fb.as_raw_fd(),
                contrast as nix::sys::ioctl::ioctl_param_type,
            )
        }
        .map_err(|source| DeviceError::Ioctl {
            request: "FBIOSET_CONTRAST",
            source,
        })?;

        tracing::debug!("Contrast set to {}", contrast);
        Ok(())
    }

    /// Read backlight level
    pub fn backlight(&self) -> Result<i32, DeviceError> {
        let fb = self.open()?;
        let mut level: libc::c_int = 0;

        // SAFETY: as for `contrast`.
        unsafe { ioctl::fbioget_backlight(fb.as_raw_fd(), &mut level) }.map_err(|source| {
            DeviceError::Ioctl {
                request: "FBIOGET_BACKLIGHT",
                source,
            }
        })?;

        Ok(level)
    }

    pub fn set_backlight(&self, level: i32) -> Result<(), DeviceError> {
        let fb = self.open()?;

        // SAFETY: integer-argument ioctl.
        unsafe {
            ioctl::fbioset_backlight(fb.as_raw_fd(), level as nix::sys::ioctl::ioctl_param_type)
        }
        .map_err(|source| DeviceError::Ioctl {
            request: "FBIOSET_BACKLIGHT",
            source,
        })?;

        tracing::debug!("Backlight set to {}", level);
        Ok(())
    }

    pub fn set_blank_mode(&self, mode: BlankMode) -> Result<(), DeviceError> {
        let fb = self.open()?;

        // SAFETY: integer-argument ioctl.
        unsafe { ioctl::fbioblank(fb.as_raw_fd(), mode.raw()) }
        .map_err(|source| DeviceError::Ioctl {
            request: "FBIOBLANK",
            source,
        })?;

        tracing::info!("Blank mode set to {:?}", mode);
        Ok(())
    }

    /// Get display configuration
    pub fn config(&self) -> &DisplayConfig {
        &self.config
    }
}
