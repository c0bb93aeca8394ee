//! The fixed-slot settings table and its on-disk encoding
//!
//! On disk every slot is one native-endian `i32`: 0 for "never set", `v + 1`
//! for a stored value `v`. In memory a slot is simply `Option<i32>`.

use crate::SettingsError;
use crate::setting::{SLOT_COUNT, Setting, Slot};

/// Width of one encoded slot
const SLOT_BYTES: usize = std::mem::size_of::<i32>();

/// Size of a complete serialized table
pub const ENCODED_LEN: usize = SLOT_COUNT * SLOT_BYTES;

/// Largest storable value; leaves room for the `+1` encoding
pub const MAX_VALUE: i32 = i32::MAX - 1;

/// In-memory settings table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsTable {
    slots: [Option<i32>; SLOT_COUNT],
}

impl Default for SettingsTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SettingsTable {
    /// A table with every slot unset
    pub fn new() -> Self {
        Self {
            slots: [None; SLOT_COUNT],
        }
    }

    /// Store `value` (negative values become 0) at a raw index
    pub fn set_raw(&mut self, index: usize, value: i32) -> Result<(), SettingsError> {
        self.store(Slot::new(index)?, value);
        Ok(())
    }

    /// Value at a raw index; unset slots read as 0
    pub fn get_raw(&self, index: usize) -> Result<i32, SettingsError> {
        Ok(self.load(Slot::new(index)?))
    }

    pub fn set(&mut self, setting: Setting, value: i32) {
        self.store(setting.slot(), value);
    }

    pub fn get(&self, setting: Setting) -> i32 {
        self.load(setting.slot())
    }

    pub(crate) fn store(&mut self, slot: Slot, value: i32) {
        self.slots[slot.index()] = Some(value.clamp(0, MAX_VALUE));
    }

    pub(crate) fn load(&self, slot: Slot) -> i32 {
        self.slots[slot.index()].unwrap_or(0)
    }

    /// Whether the slot has ever been written
    pub fn is_set(&self, slot: Slot) -> bool {
        self.slots[slot.index()].is_some()
    }

    /// Encode the whole table for storage
    pub fn serialize(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(ENCODED_LEN);
        for slot in &self.slots {
            let encoded = slot.map_or(0, |v| v + 1);
            bytes.extend_from_slice(&encoded.to_ne_bytes());
        }
        bytes
    }

    /// Decode a stored table.
    ///
    /// Fails without producing a table if fewer than [`SLOT_COUNT`] integers are
    /// present. Bytes beyond the last slot are ignored.
    pub fn deserialize(bytes: &[u8]) -> Result<Self, SettingsError> {
        if bytes.len() < ENCODED_LEN {
            return Err(SettingsError::Format {
                expected: ENCODED_LEN,
                actual: bytes.len(),
            });
        }

        if bytes.len() > ENCODED_LEN {
            tracing::debug!(
                "Ignoring {} trailing bytes after settings table",
                bytes.len() - ENCODED_LEN
            );
        }

        let mut table = Self::new();
        for (slot, chunk) in table
            .slots
            .iter_mut()
            .zip(bytes.chunks_exact(SLOT_BYTES))
        {
            let mut raw = [0u8; SLOT_BYTES];
            raw.copy_from_slice(chunk);
            let encoded = i32::from_ne_bytes(raw);
            // Anything below 1 was never a stored value
            *slot = (encoded > 0).then(|| encoded - 1);
        }

        Ok(table)
    }
}
