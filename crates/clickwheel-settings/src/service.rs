//! Settings service
//!
//! Owns the settings table and the dispatcher. Every write goes through
//! [`SettingsService::apply`], so the stored value and the hardware state never
//! drift apart. Startup goes through [`SettingsService::load`], which either
//! restores the persisted table or synthesizes defaults, replaying each slot
//! through dispatch.

use crate::SettingsError;
use crate::config::SettingsConfig;
use crate::dispatch::{Dispatch, Dispatcher};
use crate::frontend::Frontend;
use crate::setting::{Setting, Slot};
use crate::table::SettingsTable;
use clickwheel_hal::DeviceControl;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Values written on top of an all-zero table when no saved settings exist.
/// Contrast is not listed: it is taken from the hardware.
pub const DEFAULTS: [(Setting, i32); 6] = [
    (Setting::Clicker, 1),
    (Setting::WheelDebounce, 3),
    (Setting::ActionDebounce, 400),
    (Setting::BacklightTimer, 0),
    (Setting::DspFrequency, 0),
    (Setting::ColorScheme, 0),
];

pub const SAVE_FAILED: &str = "Save failed.";
pub const LOAD_FAILED: &str = "Load failed.";

/// Why the defaults were used instead of the saved table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultReason {
    /// No settings file
    Missing,
    /// File shorter than a full table
    Truncated,
    /// File exists but could not be read
    Unreadable,
}

/// Which path [`SettingsService::load`] took
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Persisted,
    Defaults(DefaultReason),
}

/// Settings table plus the capabilities used to realize it
pub struct SettingsService {
    table: SettingsTable,
    dispatcher: Dispatcher,
    path: PathBuf,
}

impl SettingsService {
    /// Create a service with an empty table. Nothing touches hardware until
    /// [`load`](Self::load) or [`apply`](Self::apply) runs.
    pub fn new(
        path: impl Into<PathBuf>,
        device: Arc<dyn DeviceControl>,
        frontend: Arc<dyn Frontend>,
    ) -> Self {
        Self {
            table: SettingsTable::new(),
            dispatcher: Dispatcher::new(device, frontend),
            path: path.into(),
        }
    }

    pub fn from_config(
        config: &SettingsConfig,
        device: Arc<dyn DeviceControl>,
        frontend: Arc<dyn Frontend>,
    ) -> Self {
        Self::new(config.path.clone(), device, frontend)
    }

    /// Settings file location
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn table(&self) -> &SettingsTable {
        &self.table
    }

    pub fn device(&self) -> &Arc<dyn DeviceControl> {
        self.dispatcher.device()
    }

    /// Store `value` at `index` and run the matching device or UI action.
    ///
    /// Only an out-of-range index is an error; device failures are reported in
    /// the returned [`Dispatch`] while the value stays recorded.
    pub fn apply(&mut self, index: usize, value: i32) -> Result<Dispatch, SettingsError> {
        let slot = Slot::new(index)?;
        Ok(self.apply_slot(slot, value))
    }

    pub fn set(&mut self, setting: Setting, value: i32) -> Dispatch {
        self.apply_slot(setting.slot(), value)
    }

    pub fn get(&self, setting: Setting) -> i32 {
        self.table.get(setting)
    }

    pub fn get_raw(&self, index: usize) -> Result<i32, SettingsError> {
        self.table.get_raw(index)
    }

    fn apply_slot(&mut self, slot: Slot, value: i32) -> Dispatch {
        self.table.store(slot, value);
        // Dispatch sees the clamped value, same as a later replay would
        let stored = self.table.load(slot);
        self.dispatcher.dispatch(slot, stored)
    }

    /// Restore saved settings, or fall back to defaults, and push every slot
    /// through dispatch.
    pub fn load(&mut self) -> LoadOutcome {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::info!(
                    "No settings at {}, using defaults",
                    self.path.display()
                );
                self.apply_defaults();
                return LoadOutcome::Defaults(DefaultReason::Missing);
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to open {} to read settings: {}",
                    self.path.display(),
                    e
                );
                self.dispatcher.frontend().notify_user(LOAD_FAILED);
                self.apply_defaults();
                return LoadOutcome::Defaults(DefaultReason::Unreadable);
            }
        };

        match SettingsTable::deserialize(&bytes) {
            Ok(table) => {
                self.table = table;
                self.replay();
                tracing::info!("Settings loaded from {}", self.path.display());
                LoadOutcome::Persisted
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to read settings from {}: {}, using defaults",
                    self.path.display(),
                    e
                );
                self.apply_defaults();
                LoadOutcome::Defaults(DefaultReason::Truncated)
            }
        }
    }

    /// Re-apply every slot, including the ones with no dispatch action, so a
    /// newly dispatched setting takes effect from an older saved table.
    fn replay(&mut self) {
        let mut failures = 0;
        for slot in Slot::all() {
            let value = self.table.load(slot);
            if self.apply_slot(slot, value).is_device_failure() {
                failures += 1;
            }
        }

        if failures > 0 {
            tracing::warn!("{} settings could not be applied to hardware", failures);
        }
    }

    fn apply_defaults(&mut self) {
        // Read before writing anything so the LCD keeps the contrast it powered up with
        let contrast = match self.device().contrast() {
            Ok(contrast) => contrast,
            Err(e) => {
                tracing::warn!("Cannot read hardware contrast: {}", e);
                0
            }
        };

        for slot in Slot::all() {
            self.apply_slot(slot, 0);
        }

        self.set(Setting::Contrast, contrast);
        for (setting, value) in DEFAULTS {
            self.set(setting, value);
        }
    }

    /// Write the table to the settings file.
    ///
    /// The file is replaced atomically. On failure the user is notified once and
    /// the error is returned; the in-memory table is untouched either way.
    pub fn save(&self) -> Result<(), SettingsError> {
        match self.write_table() {
            Ok(()) => {
                tracing::info!("Settings saved to {}", self.path.display());
                Ok(())
            }
            Err(e) => {
                tracing::error!(
                    "Failed to write settings to {}: {}",
                    self.path.display(),
                    e
                );
                self.dispatcher.frontend().notify_user(SAVE_FAILED);
                Err(e.into())
            }
        }
    }

    fn write_table(&self) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let tmp = temp_path(&self.path);
        let result = (|| -> io::Result<()> {
            let mut file = File::create(&tmp)?;
            file.write_all(&self.table.serialize())?;
            file.sync_all()?;
            fs::rename(&tmp, &self.path)
        })();

        if result.is_err() {
            let _ = fs::remove_file(&tmp);
        }
        result
    }

    /// Delete the settings file, rebuild defaults and persist them
    pub fn reset(&mut self) -> Result<(), SettingsError> {
        match fs::remove_file(&self.path) {
            Ok(()) => tracing::info!("Removed {}", self.path.display()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!("Cannot remove {}: {}", self.path.display(), e),
        }

        self.load();
        self.save()
    }

    /// Make sure the settings file exists without changing its contents or the
    /// in-memory table
    pub fn touch(&self) -> Result<(), SettingsError> {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| {
                tracing::warn!("Cannot touch {}: {}", self.path.display(), e);
                e
            })?;
        Ok(())
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Thread-safe handle for hosts that touch settings from several threads.
///
/// One lock covers each whole operation, so a table write and its device call
/// are always observed together.
#[derive(Clone)]
pub struct SharedSettings {
    inner: Arc<Mutex<SettingsService>>,
}

impl SharedSettings {
    pub fn new(service: SettingsService) -> Self {
        Self {
            inner: Arc::new(Mutex::new(service)),
        }
    }

    /// Exclusive access for multi-step sequences
    pub fn lock(&self) -> MutexGuard<'_, SettingsService> {
        // A single apply touches one slot, so a panicked holder cannot leave
        // the table half-written
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn apply(&self, index: usize, value: i32) -> Result<Dispatch, SettingsError> {
        self.lock().apply(index, value)
    }

    pub fn set(&self, setting: Setting, value: i32) -> Dispatch {
        self.lock().set(setting, value)
    }

    pub fn get(&self, setting: Setting) -> i32 {
        self.lock().get(setting)
    }

    pub fn load(&self) -> LoadOutcome {
        self.lock().load()
    }

    pub fn save(&self) -> Result<(), SettingsError> {
        self.lock().save()
    }

    pub fn reset(&self) -> Result<(), SettingsError> {
        self.lock().reset()
    }

    pub fn touch(&self) -> Result<(), SettingsError> {
        self.lock().touch()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::RecordingFrontend;
    use clickwheel_hal::mock::{DeviceCall, MockDevice, MockProfile};
    use tempfile::TempDir;

    struct Fixture {
        _dir: TempDir,
        device: Arc<MockDevice>,
        frontend: Arc<RecordingFrontend>,
        service: SettingsService,
    }

    fn fixture() -> Fixture {
        let dir = TempDir::new().unwrap();
        let device = Arc::new(MockDevice::new(MockProfile::FourthGen));
        let frontend = Arc::new(RecordingFrontend::default());
        let service = SettingsService::new(
            dir.path().join("settings.bin"),
            device.clone(),
            frontend.clone(),
        );

        Fixture {
            _dir: dir,
            device,
            frontend,
            service,
        }
    }

    #[test]
    fn test_apply_records_and_dispatches() {
        let mut f = fixture();

        let status = f.service.apply(Setting::Contrast.slot().index(), 80).unwrap();
        assert_eq!(status, Dispatch::Applied);
        assert_eq!(f.service.get(Setting::Contrast), 80);
        assert_eq!(f.device.calls(), vec![DeviceCall::SetContrast(80)]);
    }

    #[test]
    fn test_apply_out_of_range() {
        let mut f = fixture();
        assert!(matches!(f.service.apply(100, 1), Err(SettingsError::OutOfRange(100))));
        assert_eq!(f.service.table(), &SettingsTable::new());
    }

    #[test]
    fn test_apply_dispatches_clamped_value() {
        let mut f = fixture();
        f.service.set(Setting::Backlight, -4);
        assert_eq!(f.device.calls(), vec![DeviceCall::SetBacklight(0)]);
    }

    #[test]
    fn test_device_failure_still_records_value() {
        let mut f = fixture();
        f.device.set_failing(true);

        let status = f.service.set(Setting::Contrast, 100);
        assert!(status.is_device_failure());
        assert_eq!(f.service.get(Setting::Contrast), 100);
    }

    #[test]
    fn test_load_defaults_when_missing() {
        let mut f = fixture();

        assert_eq!(f.service.load(), LoadOutcome::Defaults(DefaultReason::Missing));
        assert_eq!(f.service.get(Setting::Clicker), 1);
        assert_eq!(f.service.get(Setting::WheelDebounce), 3);
        assert_eq!(f.service.get(Setting::ActionDebounce), 400);
        assert_eq!(f.service.get(Setting::Contrast), 96);
        assert!(f.frontend.messages().is_empty());
    }

    #[test]
    fn test_defaults_read_contrast_before_writing() {
        let mut f = fixture();
        f.service.load();

        let calls = f.device.calls();
        // The all-zero pass writes contrast 0 first; the queried value follows
        let contrast_writes: Vec<_> = calls
            .iter()
            .filter(|c| matches!(c, DeviceCall::SetContrast(_)))
            .collect();
        assert_eq!(
            contrast_writes,
            vec![&DeviceCall::SetContrast(0), &DeviceCall::SetContrast(96)]
        );
        assert_eq!(f.device.state().read().unwrap().contrast, 96);
    }

    #[test]
    fn test_defaults_when_contrast_unreadable() {
        let mut f = fixture();
        f.device.set_failing(true);

        f.service.load();
        assert_eq!(f.service.get(Setting::Contrast), 0);
        assert_eq!(f.service.get(Setting::Clicker), 1);
    }

    #[test]
    fn test_every_slot_written_by_defaults() {
        let mut f = fixture();
        f.service.load();

        for slot in Slot::all() {
            assert!(f.service.table().is_set(slot), "slot {} unset", slot);
        }
    }

    #[test]
    fn test_save_then_load_replays() {
        let mut f = fixture();
        f.service.set(Setting::Contrast, 70);
        f.service.set(Setting::BacklightTimer, 4);
        f.service.set(Setting::ColorScheme, 2);
        f.service.save().unwrap();

        let device = Arc::new(MockDevice::new(MockProfile::FourthGen));
        let frontend = Arc::new(RecordingFrontend::default());
        let mut restored =
            SettingsService::new(f.service.path(), device.clone(), frontend.clone());

        assert_eq!(restored.load(), LoadOutcome::Persisted);
        assert_eq!(restored.table(), &replayed(f.service.table()));
        assert_eq!(device.state().read().unwrap().contrast, 70);
        assert_eq!(device.state().read().unwrap().backlight, 1);
        assert_eq!(frontend.timeouts(), vec![10]);
        assert_eq!(frontend.color_schemes(), vec![2]);
    }

    #[test]
    fn test_truncated_file_uses_defaults() {
        let mut f = fixture();
        fs::write(f.service.path(), [1u8; 40]).unwrap();

        assert_eq!(f.service.load(), LoadOutcome::Defaults(DefaultReason::Truncated));
        assert_eq!(f.service.get(Setting::ActionDebounce), 400);
    }

    #[test]
    fn test_unreadable_file_notifies() {
        let mut f = fixture();
        // A directory where the file should be cannot be read as a file
        fs::create_dir(f.service.path()).unwrap();

        assert_eq!(f.service.load(), LoadOutcome::Defaults(DefaultReason::Unreadable));
        assert_eq!(f.frontend.messages(), vec![LOAD_FAILED.to_string()]);
        assert_eq!(f.service.get(Setting::Clicker), 1);
    }

    #[test]
    fn test_save_failure_notifies_once() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("not_a_dir");
        fs::write(&blocker, b"").unwrap();

        let device = Arc::new(MockDevice::new(MockProfile::FourthGen));
        let frontend = Arc::new(RecordingFrontend::default());
        let mut service =
            SettingsService::new(blocker.join("settings.bin"), device, frontend.clone());
        service.set(Setting::Clicker, 1);
        let before = service.table().clone();

        assert!(service.save().is_err());
        assert_eq!(frontend.messages(), vec![SAVE_FAILED.to_string()]);
        assert_eq!(service.table(), &before);
    }

    #[test]
    fn test_save_leaves_no_temp_file() {
        let mut f = fixture();
        f.service.set(Setting::Volume, 20);
        f.service.save().unwrap();

        assert!(f.service.path().exists());
        assert!(!temp_path(f.service.path()).exists());
    }

    #[test]
    fn test_temp_path() {
        assert_eq!(
            temp_path(Path::new("/etc/clickwheel/settings.bin")),
            PathBuf::from("/etc/clickwheel/settings.bin.tmp")
        );
    }

    #[test]
    fn test_touch_keeps_contents_and_state() {
        let mut f = fixture();
        f.service.set(Setting::Clicker, 1);
        f.service.save().unwrap();
        let saved = fs::read(f.service.path()).unwrap();
        let before = f.service.table().clone();

        f.service.touch().unwrap();

        assert_eq!(fs::read(f.service.path()).unwrap(), saved);
        assert_eq!(f.service.table(), &before);
    }

    #[test]
    fn test_touch_creates_empty_file() {
        let f = fixture();
        f.service.touch().unwrap();
        assert_eq!(fs::metadata(f.service.path()).unwrap().len(), 0);
    }

    #[test]
    fn test_shared_settings() {
        let f = fixture();
        let shared = SharedSettings::new(f.service);
        let other = shared.clone();

        other.set(Setting::Decorations, 1);
        assert_eq!(shared.get(Setting::Decorations), 1);
        assert_eq!(f.frontend.decorations(), vec![1]);
        assert!(shared.apply(500, 1).is_err());
    }

    /// Replay turns every unset slot into an explicit 0
    fn replayed(table: &SettingsTable) -> SettingsTable {
        let mut table = table.clone();
        for slot in Slot::all() {
            let value = table.load(slot);
            table.store(slot, value);
        }
        table
    }
}
