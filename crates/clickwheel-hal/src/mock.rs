//! Mock implementations for testing without real hardware
//!
//! [`MockDevice`] implements [`DeviceControl`] against in-memory state, so the
//! settings layer can be exercised on desktop systems and in unit tests.
//!
//! # Usage
//!
//! ```no_run
//! use clickwheel_hal::mock::{MockDevice, MockProfile};
//! use clickwheel_hal::DeviceControl;
//!
//! let device = MockDevice::new(MockProfile::FourthGen);
//! device.set_contrast(90).unwrap();
//!
//! let state = device.state();
//! assert_eq!(state.read().unwrap().contrast, 90);
//! ```

use crate::device::{BlankMode, DeviceControl, DeviceError, constrain};
use crate::display::MAX_CONTRAST;
use std::sync::{Arc, RwLock};

/// Pre-defined mock hardware generations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockProfile {
    /// First generation, serial-port beeper
    FirstGen,
    /// Third generation, serial-port beeper
    ThirdGen,
    /// Mini, first model with the piezo
    Mini,
    /// Fourth generation (grayscale)
    FourthGen,
    /// Photo (colour LCD)
    Photo,
    /// Desktop development (no revision)
    Desktop,
}

impl MockProfile {
    /// Hardware revision reported by this profile
    pub fn revision(self) -> u32 {
        match self {
            MockProfile::FirstGen => 10000,
            MockProfile::ThirdGen => 30000,
            MockProfile::Mini => 40000,
            MockProfile::FourthGen => 50000,
            MockProfile::Photo => 60000,
            MockProfile::Desktop => 0,
        }
    }

    /// Contrast the LCD holds at power-on
    pub fn initial_contrast(self) -> i32 {
        match self {
            MockProfile::Photo | MockProfile::Desktop => 0,
            MockProfile::Mini => 80,
            _ => 96,
        }
    }

    /// Get profile from string name
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "1g" | "first_gen" => Some(MockProfile::FirstGen),
            "3g" | "third_gen" => Some(MockProfile::ThirdGen),
            "mini" => Some(MockProfile::Mini),
            "4g" | "fourth_gen" => Some(MockProfile::FourthGen),
            "photo" => Some(MockProfile::Photo),
            "desktop" => Some(MockProfile::Desktop),
            _ => None,
        }
    }

    /// List all available mock profiles
    pub fn all() -> &'static [MockProfile] {
        &[
            MockProfile::FirstGen,
            MockProfile::ThirdGen,
            MockProfile::Mini,
            MockProfile::FourthGen,
            MockProfile::Photo,
            MockProfile::Desktop,
        ]
    }
}

/// A hardware write recorded by the mock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceCall {
    SetContrast(i32),
    SetBacklight(i32),
    SetBlankMode(BlankMode),
    Beep,
}

/// Shared mock state for synchronized access
#[derive(Debug)]
pub struct MockState {
    /// Current contrast (0-128)
    pub contrast: i32,
    /// Current backlight level
    pub backlight: i32,
    /// Current blanking level
    pub blank_mode: BlankMode,
    /// Number of clicks emitted
    pub beeps: u32,
    /// Hardware writes in the order they were made
    pub calls: Vec<DeviceCall>,
    /// When set, every fallible call returns `DeviceError::Unavailable`
    pub fail: bool,
}

impl MockState {
    pub fn new(profile: MockProfile) -> Self {
        Self {
            contrast: profile.initial_contrast(),
            backlight: 0,
            blank_mode: BlankMode::On,
            beeps: 0,
            calls: Vec::new(),
            fail: false,
        }
    }
}

impl Default for MockState {
    fn default() -> Self {
        Self::new(MockProfile::Desktop)
    }
}

/// Mock device for testing
pub struct MockDevice {
    profile: MockProfile,
    state: Arc<RwLock<MockState>>,
}

impl MockDevice {
    /// Create a new mock device with the given profile
    pub fn new(profile: MockProfile) -> Self {
        Self {
            profile,
            state: Arc::new(RwLock::new(MockState::new(profile))),
        }
    }

    /// Create from environment variable or default to Desktop
    pub fn from_env() -> Self {
        let profile = std::env::var("CLICKWHEEL_MOCK_DEVICE")
            .ok()
            .and_then(|s| MockProfile::from_name(&s))
            .unwrap_or(MockProfile::Desktop);

        Self::new(profile)
    }

    pub fn profile(&self) -> MockProfile {
        self.profile
    }

    /// Get shared state for manipulation in tests
    pub fn state(&self) -> Arc<RwLock<MockState>> {
        Arc::clone(&self.state)
    }

    /// Make every subsequent fallible call fail (or succeed again)
    pub fn set_failing(&self, fail: bool) {
        if let Ok(mut state) = self.state.write() {
            state.fail = fail;
        }
    }

    /// Hardware writes made so far
    pub fn calls(&self) -> Vec<DeviceCall> {
        self.state
            .read()
            .map(|s| s.calls.clone())
            .unwrap_or_default()
    }

    /// Forget recorded hardware writes
    pub fn clear_calls(&self) {
        if let Ok(mut state) = self.state.write() {
            state.calls.clear();
        }
    }

    fn check(state: &MockState) -> Result<(), DeviceError> {
        if state.fail {
            Err(DeviceError::Unavailable("mock failure".into()))
        } else {
            Ok(())
        }
    }

    fn write<F>(&self, call: DeviceCall, apply: F) -> Result<(), DeviceError>
    where
        F: FnOnce(&mut MockState),
    {
        let mut state = self
            .state
            .write()
            .map_err(|_| DeviceError::Unavailable("mock state poisoned".into()))?;

        state.calls.push(call);
        Self::check(&state)?;
        apply(&mut state);
        Ok(())
    }
}

impl DeviceControl for MockDevice {
    fn contrast(&self) -> Result<i32, DeviceError> {
        let state = self
            .state
            .read()
            .map_err(|_| DeviceError::Unavailable("mock state poisoned".into()))?;
        Self::check(&state)?;
        Ok(state.contrast)
    }

    fn set_contrast(&self, contrast: i32) -> Result<(), DeviceError> {
        let contrast = constrain(0, MAX_CONTRAST, contrast);
        self.write(DeviceCall::SetContrast(contrast), |s| s.contrast = contrast)?;
        tracing::debug!("[MOCK] Contrast set to {}", contrast);
        Ok(())
    }

    fn backlight(&self) -> Result<i32, DeviceError> {
        let state = self
            .state
            .read()
            .map_err(|_| DeviceError::Unavailable("mock state poisoned".into()))?;
        Self::check(&state)?;
        Ok(state.backlight)
    }

    fn set_backlight(&self, level: i32) -> Result<(), DeviceError> {
        self.write(DeviceCall::SetBacklight(level), |s| s.backlight = level)?;
        tracing::debug!("[MOCK] Backlight set to {}", level);
        Ok(())
    }

    fn set_blank_mode(&self, mode: BlankMode) -> Result<(), DeviceError> {
        self.write(DeviceCall::SetBlankMode(mode), |s| s.blank_mode = mode)?;
        tracing::debug!("[MOCK] Blank mode set to {:?}", mode);
        Ok(())
    }

    fn beep(&self) {
        if let Ok(mut state) = self.state.write() {
            state.calls.push(DeviceCall::Beep);
            state.beeps += 1;
        }
    }

    fn hw_revision(&self) -> u32 {
        self.profile.revision()
    }
}
