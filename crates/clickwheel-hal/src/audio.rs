//! Audible feedback
//!
//! The click that accompanies wheel movement. Newer hardware drives a piezo
//! through memory-mapped registers, older units pulse the serial line to the
//! remote-control chip, and desktop hosts ring the terminal bell.

use crate::device::{DeviceError, PIEZO_REVISION};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{self, IsTerminal, Write};
use std::os::fd::AsRawFd;
use std::os::unix::fs::OpenOptionsExt;
use std::path::PathBuf;
use std::ptr;
use std::sync::Mutex;

const PIEZO_GPIO: usize = 0x7000_0010;
const DEVICE_ENABLE: usize = 0x6000_600c;
const PIEZO_PITCH: usize = 0x7000_a000;

const PIEZO_ENABLE_BIT: u32 = 0x2_0000;
const PIEZO_GPIO_MASK: u32 = 0xc;
const PITCH_ON: u32 = 0x8000_0000 | 0x80_0000;
const PITCH_STEPS: u32 = 0x888;
const PITCH_SWEEPS: u32 = 10;

/// Beep configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BeepConfig {
    /// Serial ports wired to the buzzer on pre-piezo hardware, tried in order
    #[serde(default = "default_serial_paths")]
    pub serial_paths: Vec<PathBuf>,

    /// Physical memory device used to reach the piezo registers
    #[serde(default = "default_mem_device")]
    pub mem_device: PathBuf,
}

fn default_serial_paths() -> Vec<PathBuf> {
    vec![PathBuf::from("/dev/ttyS1"), PathBuf::from("/dev/tts/1")]
}

fn default_mem_device() -> PathBuf {
    PathBuf::from("/dev/mem")
}

impl Default for BeepConfig {
    fn default() -> Self {
        Self {
            serial_paths: default_serial_paths(),
            mem_device: default_mem_device(),
        }
    }
}

/// How the click is produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BeepBackend {
    /// Memory-mapped piezo (revision 40000 and later)
    Piezo,
    /// One byte on the serial port
    Serial,
    /// BEL to stdout when it is a terminal
    Terminal,
}

impl BeepBackend {
    /// Pick the backend for a hardware revision; 0 means no device hardware
    pub fn for_revision(revision: u32) -> Self {
        match revision {
            0 => BeepBackend::Terminal,
            r if r >= PIEZO_REVISION => BeepBackend::Piezo,
            _ => BeepBackend::Serial,
        }
    }
}

/// Beeper
pub struct Beeper {
    config: BeepConfig,
    backend: BeepBackend,
    serial: Mutex<Option<File>>,
}

impl Beeper {
    pub fn new(config: BeepConfig, revision: u32) -> Self {
        let backend = BeepBackend::for_revision(revision);
        tracing::debug!("Using {:?} beeper for revision {}", backend, revision);

        Self {
            config,
            backend,
            serial: Mutex::new(None),
        }
    }

    pub fn backend(&self) -> BeepBackend {
        self.backend
    }

    /// Click once. Failures are logged and otherwise ignored.
    ///
    /// The piezo tone is a busy loop of roughly 22k register writes; do not
    /// call this from a thread that services I/O.
    pub fn beep(&self) {
        let result = match self.backend {
            BeepBackend::Piezo => self.piezo(),
            BeepBackend::Serial => self.serial(),
            BeepBackend::Terminal => Self::terminal(),
        };

        if let Err(e) = result {
            tracing::debug!("Beep failed ({:?}): {}", self.backend, e);
        }
    }

    fn piezo(&self) -> Result<(), DeviceError> {
        let mem = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(libc::O_SYNC)
            .open(&self.config.mem_device)?;

        let gpio = Register::map(&mem, PIEZO_GPIO)?;
        let enable = Register::map(&mem, DEVICE_ENABLE)?;
        let pitch = Register::map(&mem, PIEZO_PITCH)?;

        gpio.write(gpio.read() & !PIEZO_GPIO_MASK);
        enable.write(enable.read() | PIEZO_ENABLE_BIT);

        for _ in 0..PITCH_SWEEPS {
            for step in 0..PITCH_STEPS {
                pitch.write(PITCH_ON | step);
            }
        }

        pitch.write(0);
        Ok(())
    }

    fn serial(&self) -> Result<(), DeviceError> {
        let mut guard = self.serial.lock().unwrap_or_else(|e| e.into_inner());

        if guard.is_none() {
            *guard = Some(self.open_serial()?);
        }

        if let Some(port) = guard.as_mut() {
            port.write_all(&[0])?;
        }
        Ok(())
    }

    fn open_serial(&self) -> Result<File, DeviceError> {
        for path in &self.config.serial_paths {
            if let Ok(port) = OpenOptions::new().write(true).open(path) {
                tracing::debug!("Beeper using {}", path.display());
                return Ok(port);
            }
        }

        Err(DeviceError::Unavailable("no beeper serial port".into()))
    }

    fn terminal() -> Result<(), DeviceError> {
        let mut stdout = io::stdout();
        if stdout.is_terminal() {
            stdout.write_all(b"\x07")?;
            stdout.flush()?;
        }
        Ok(())
    }
}

/// A single 32-bit hardware register mapped from physical memory
struct Register {
    page: *mut libc::c_void,
    page_len: usize,
    reg: *mut u32,
}

impl Register {
    fn map(mem: &File, addr: usize) -> Result<Self, DeviceError> {
        // SAFETY: sysconf has no preconditions.
        let page_len = unsafe { libc::sysconf(libc::_SC_PAGESIZE) } as usize;
        let base = addr & !(page_len - 1);

        // SAFETY: mapping a fresh shared region; the result is checked below.
        let page = unsafe {
            libc::mmap(
                ptr::null_mut(),
                page_len,
                libc::PROT_READ | libc::PROT_WRITE,
                libc::MAP_SHARED,
                mem.as_raw_fd(),
                base as libc::off_t,
            )
        };
        if page == libc::MAP_FAILED {
            return Err(io::Error::last_os_error().into());
        }

        // SAFETY: `addr - base` is below `page_len`, so the pointer stays in the mapping.
        let reg = unsafe { page.cast::<u8>().add(addr - base).cast::<u32>() };

        Ok(Self {
            page,
            page_len,
            reg,
        })
    }

    fn read(&self) -> u32 {
        // SAFETY: `reg` points into a live, aligned mapping owned by `self`.
        unsafe { ptr::read_volatile(self.reg) }
    }

    fn write(&self, value: u32) {
        // SAFETY: as for `read`.
        unsafe { ptr::write_volatile(self.reg, value) }
    }
}

impl Drop for Register {
    fn drop(&mut self) {
        // SAFETY: `page` came from a successful mmap of `page_len` bytes.
        unsafe {
            libc::munmap(self.page, self.page_len);
        }
    }
}
