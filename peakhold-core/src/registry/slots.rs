//! Storage layout and per-instance slot addressing
//!
//! ```text
//! 0x0000 ┌──────────────────────────┐
//!        │ unused                   │
//! 0x00A0 ├──────────────────────────┤
//!        │ VersionRecord (8 B)      │
//! 0x0100 ├──────────────────────────┤
//!        │ slot 1: ChannelConfig    │  28 B
//!        │         ChecksumRecord   │  12 B
//! 0x0128 ├──────────────────────────┤
//!        │ slot 2 ...               │
//!        └──────────────────────────┘
//! ```
//!
//! Instance `k` (1-based) starts at `slot_base + (k - 1) * SLOT_SIZE`.
//! Index 0 is reserved.

use heapless::Vec;

use super::RegistryError;
use crate::config::{ChannelConfig, ChecksumRecord, Record, VersionRecord};

/// Fixed address of the version record, shared by all instances
pub const VERSION_ADDRESS: u16 = 0x00A0;

/// Start address of instance 1
pub const SLOT_BASE: u16 = 0x0100;

/// Maximum number of channel instances
pub const MAX_INSTANCES: usize = 10;

/// Bytes per instance: configuration followed by its checksum record
pub const SLOT_SIZE: usize = ChannelConfig::SIZE + ChecksumRecord::SIZE;

/// Emulated EEPROM size used by the firmware (one flash sector)
pub const DEFAULT_STORE_SIZE: usize = 4096;

/// Handle of a registered channel instance (1-based)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InstanceId(u16);

impl InstanceId {
    /// 1-based instance index
    pub const fn index(self) -> u16 {
        self.0
    }
}

/// Fixed addresses of the persisted records
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Layout {
    /// Address of the shared version record
    pub version_address: u16,
    /// Address of instance 1's slot
    pub slot_base: u16,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            version_address: VERSION_ADDRESS,
            slot_base: SLOT_BASE,
        }
    }
}

impl Layout {
    /// Check that the version record and the slot area do not overlap
    pub fn validate(&self) -> Result<(), RegistryError> {
        let version_end = self.version_address as usize + VersionRecord::SIZE;
        let slots_start = self.slot_base as usize;
        let slots_end = slots_start + MAX_INSTANCES * SLOT_SIZE;
        let overlaps =
            (self.version_address as usize) < slots_end && slots_start < version_end;
        if overlaps || slots_end > u16::MAX as usize {
            return Err(RegistryError::InvalidLayout);
        }
        Ok(())
    }

    /// Address of instance `index` (1-based), if within capacity
    pub const fn slot_address(&self, index: u16) -> Option<u16> {
        if index == 0 || index as usize > MAX_INSTANCES {
            return None;
        }
        Some(self.slot_base + (index - 1) * SLOT_SIZE as u16)
    }

    /// End of the version record
    pub const fn version_end(&self) -> usize {
        self.version_address as usize + VersionRecord::SIZE
    }
}

/// Instance index to slot start address
///
/// Entry 0 is reserved. Each new slot starts where the previous one ends.
#[derive(Debug, Clone)]
pub struct SlotTable {
    starts: Vec<u16, { MAX_INSTANCES + 1 }>,
    base: u16,
}

impl SlotTable {
    /// Empty table whose first slot starts at `base`
    pub fn new(base: u16) -> Self {
        let mut starts = Vec::new();
        // Reserved index 0; capacity is at least 1
        let _ = starts.push(0);
        Self { starts, base }
    }

    /// Number of registered instances
    pub fn len(&self) -> usize {
        self.starts.len() - 1
    }

    /// True if no instance is registered
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Allocate the next slot
    pub fn push(&mut self) -> Result<InstanceId, RegistryError> {
        let start = match self.starts.len() {
            1 => self.base,
            n => self.starts[n - 1] + SLOT_SIZE as u16,
        };
        let index = self.starts.len() as u16;
        self.starts.push(start).map_err(|_| RegistryError::Full)?;
        Ok(InstanceId(index))
    }

    /// Start address of `id`
    pub fn address(&self, id: InstanceId) -> Option<u16> {
        match id.0 {
            0 => None,
            i => self.starts.get(i as usize).copied(),
        }
    }

    /// First address past the last registered slot
    pub fn end(&self) -> usize {
        match self.starts.len() {
            1 => self.base as usize,
            n => self.starts[n - 1] as usize + SLOT_SIZE,
        }
    }
}
