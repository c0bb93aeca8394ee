//! Setting identifiers
//!
//! The persisted table has a fixed number of slots. Named settings occupy a
//! sparse subset; the remaining slots still round-trip through storage.

use crate::SettingsError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of slots in the settings table
pub const SLOT_COUNT: usize = 100;

/// Named settings and the slot each one occupies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Setting {
    Contrast = 1,
    Backlight = 2,
    BacklightTimer = 3,
    Clicker = 4,
    Language = 5,
    Shuffle = 6,
    Repeat = 7,
    Equalizer = 8,
    TimeZone = 9,
    TimeDst = 10,
    DspFrequency = 11,
    WheelDebounce = 12,
    ActionDebounce = 13,
    ColorScheme = 14,
    Decorations = 15,
    BatteryDigits = 16,
    TimeInTitle = 17,
    TimeTicker = 18,
    Time1224 = 19,
    Volume = 20,
}

impl Setting {
    pub fn slot(self) -> Slot {
        Slot(self as u8)
    }

    /// Look up the named setting stored at `slot`, if any
    pub fn from_slot(slot: Slot) -> Option<Self> {
        Self::all().iter().copied().find(|s| s.slot() == slot)
    }

    pub fn name(self) -> &'static str {
        match self {
            Setting::Contrast => "contrast",
            Setting::Backlight => "backlight",
            Setting::BacklightTimer => "backlight_timer",
            Setting::Clicker => "clicker",
            Setting::Language => "language",
            Setting::Shuffle => "shuffle",
            Setting::Repeat => "repeat",
            Setting::Equalizer => "equalizer",
            Setting::TimeZone => "time_zone",
            Setting::TimeDst => "time_dst",
            Setting::DspFrequency => "dsp_frequency",
            Setting::WheelDebounce => "wheel_debounce",
            Setting::ActionDebounce => "action_debounce",
            Setting::ColorScheme => "color_scheme",
            Setting::Decorations => "decorations",
            Setting::BatteryDigits => "battery_digits",
            Setting::TimeInTitle => "time_in_title",
            Setting::TimeTicker => "time_ticker",
            Setting::Time1224 => "time_12_24",
            Setting::Volume => "volume",
        }
    }

    pub fn all() -> &'static [Setting] {
        &[
            Setting::Contrast,
            Setting::Backlight,
            Setting::BacklightTimer,
            Setting::Clicker,
            Setting::Language,
            Setting::Shuffle,
            Setting::Repeat,
            Setting::Equalizer,
            Setting::TimeZone,
            Setting::TimeDst,
            Setting::DspFrequency,
            Setting::WheelDebounce,
            Setting::ActionDebounce,
            Setting::ColorScheme,
            Setting::Decorations,
            Setting::BatteryDigits,
            Setting::TimeInTitle,
            Setting::TimeTicker,
            Setting::Time1224,
            Setting::Volume,
        ]
    }
}

impl fmt::Display for Setting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A checked index into the settings table
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Slot(u8);

impl Slot {
    pub fn new(index: usize) -> Result<Self, SettingsError> {
        if index < SLOT_COUNT {
            Ok(Slot(index as u8))
        } else {
            Err(SettingsError::OutOfRange(index))
        }
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// Every slot in table order
    pub fn all() -> impl Iterator<Item = Slot> {
        (0..SLOT_COUNT as u8).map(Slot)
    }

    pub fn setting(self) -> Option<Setting> {
        Setting::from_slot(self)
    }
}

impl From<Setting> for Slot {
    fn from(setting: Setting) -> Self {
        setting.slot()
    }
}

impl TryFrom<usize> for Slot {
    type Error = SettingsError;

    fn try_from(index: usize) -> Result<Self, Self::Error> {
        Slot::new(index)
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.setting() {
            Some(setting) => write!(f, "{} ({})", self.0, setting),
            None => write!(f, "{}", self.0),
        }
    }
}
