//! Routing a settings write to the device or UI call that realizes it

use crate::frontend::Frontend;
use crate::setting::{Setting, Slot};
use clickwheel_hal::{DeviceControl, DeviceError};
use std::sync::Arc;

/// Screensaver timeouts in seconds, indexed by the backlight-timer setting
pub const BACKLIGHT_TIMEOUTS: [u32; 8] = [0, 1, 2, 5, 10, 30, 60, 0];

/// Seconds of idle time for a backlight-timer value; out-of-table values mean "never"
pub fn backlight_timeout(value: i32) -> u32 {
    usize::try_from(value)
        .ok()
        .and_then(|i| BACKLIGHT_TIMEOUTS.get(i).copied())
        .unwrap_or(0)
}

/// Result of dispatching one setting
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// The slot has no side effect; the value was only stored
    Stored,
    /// The device or UI call ran
    Applied,
    /// The hardware call failed; the value is still recorded
    DeviceFailed(String),
}

impl Dispatch {
    pub fn is_device_failure(&self) -> bool {
        matches!(self, Dispatch::DeviceFailed(_))
    }
}

/// Holds the device and UI capabilities settings are applied through
pub struct Dispatcher {
    device: Arc<dyn DeviceControl>,
    frontend: Arc<dyn Frontend>,
}

impl Dispatcher {
    pub fn new(device: Arc<dyn DeviceControl>, frontend: Arc<dyn Frontend>) -> Self {
        Self { device, frontend }
    }

    pub fn device(&self) -> &Arc<dyn DeviceControl> {
        &self.device
    }

    pub fn frontend(&self) -> &Arc<dyn Frontend> {
        &self.frontend
    }

    /// Run the side effect for `slot`. Device errors are logged and reported in
    /// the returned status, never propagated.
    pub fn dispatch(&self, slot: Slot, value: i32) -> Dispatch {
        let Some(setting) = slot.setting() else {
            return Dispatch::Stored;
        };

        let result = match setting {
            Setting::Contrast => self.device.set_contrast(value),
            Setting::Backlight => self.device.set_backlight(value),
            Setting::BacklightTimer => self.backlight_timer(value),
            Setting::ColorScheme => {
                self.frontend.set_color_scheme(value);
                Ok(())
            }
            Setting::Decorations => {
                self.frontend.set_decorations(value);
                Ok(())
            }
            _ => return Dispatch::Stored,
        };

        match result {
            Ok(()) => Dispatch::Applied,
            Err(e) => {
                tracing::warn!("Applying {} = {} failed: {}", setting, value, e);
                Dispatch::DeviceFailed(e.to_string())
            }
        }
    }

    fn backlight_timer(&self, value: i32) -> Result<(), DeviceError> {
        let seconds = backlight_timeout(value);
        self.frontend.set_screensaver_timeout(seconds);
        self.device.set_backlight(if value != 0 { 1 } else { 0 })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::RecordingFrontend;
    use clickwheel_hal::mock::{DeviceCall, MockDevice, MockProfile};

    fn dispatcher() -> (Arc<MockDevice>, Arc<RecordingFrontend>, Dispatcher) {
        let device = Arc::new(MockDevice::new(MockProfile::FourthGen));
        let frontend = Arc::new(RecordingFrontend::default());
        let dispatcher = Dispatcher::new(device.clone(), frontend.clone());
        (device, frontend, dispatcher)
    }

    #[test]
    fn test_backlight_timeout_table() {
        let expected = [0, 1, 2, 5, 10, 30, 60];
        for (value, seconds) in expected.iter().enumerate() {
            assert_eq!(backlight_timeout(value as i32), *seconds);
        }
        assert_eq!(backlight_timeout(7), 0);
        assert_eq!(backlight_timeout(100), 0);
        assert_eq!(backlight_timeout(-1), 0);
    }

    #[test]
    fn test_contrast_goes_to_device() {
        let (device, _, dispatcher) = dispatcher();
        assert_eq!(dispatcher.dispatch(Setting::Contrast.slot(), 70), Dispatch::Applied);
        assert_eq!(device.calls(), vec![DeviceCall::SetContrast(70)]);
    }

    #[test]
    fn test_backlight_goes_to_device() {
        let (device, _, dispatcher) = dispatcher();
        dispatcher.dispatch(Setting::Backlight.slot(), 1);
        assert_eq!(device.calls(), vec![DeviceCall::SetBacklight(1)]);
    }

    #[test]
    fn test_backlight_timer_sets_timeout_then_backlight() {
        let expected = [0, 1, 2, 5, 10, 30, 60];

        for (value, seconds) in expected.iter().enumerate() {
            let (device, frontend, dispatcher) = dispatcher();
            dispatcher.dispatch(Setting::BacklightTimer.slot(), value as i32);

            assert_eq!(frontend.timeouts(), vec![*seconds]);
            let level = if value == 0 { 0 } else { 1 };
            assert_eq!(device.calls(), vec![DeviceCall::SetBacklight(level)]);
        }
    }

    #[test]
    fn test_appearance_goes_to_frontend() {
        let (device, frontend, dispatcher) = dispatcher();
        dispatcher.dispatch(Setting::ColorScheme.slot(), 2);
        dispatcher.dispatch(Setting::Decorations.slot(), 1);

        assert_eq!(frontend.color_schemes(), vec![2]);
        assert_eq!(frontend.decorations(), vec![1]);
        assert!(device.calls().is_empty());
    }

    #[test]
    fn test_other_slots_have_no_side_effect() {
        let (device, frontend, dispatcher) = dispatcher();

        assert_eq!(dispatcher.dispatch(Setting::Clicker.slot(), 1), Dispatch::Stored);
        assert_eq!(dispatcher.dispatch(Slot::new(0).unwrap(), 5), Dispatch::Stored);
        assert_eq!(dispatcher.dispatch(Slot::new(99).unwrap(), 5), Dispatch::Stored);

        assert!(device.calls().is_empty());
        assert!(frontend.is_empty());
    }

    #[test]
    fn test_device_failure_is_reported_not_raised() {
        let (device, _, dispatcher) = dispatcher();
        device.set_failing(true);

        let status = dispatcher.dispatch(Setting::Contrast.slot(), 50);
        assert!(status.is_device_failure());
    }
}
