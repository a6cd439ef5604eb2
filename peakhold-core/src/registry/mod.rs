//! Configuration registry
//!
//! Owns the non-volatile store and decides, once per instance per startup,
//! whether stored configuration is authoritative or must be rewritten.
//! Writes only happen when a CRC32 comparison shows the content changed.
//!
//! The registry replaces process-wide statics: the instance counter, the
//! slot table and the version guard are fields here, and the composition
//! root owns the registry.

pub mod slots;

pub use slots::{
    InstanceId, Layout, SlotTable, DEFAULT_STORE_SIZE, MAX_INSTANCES, SLOT_BASE, SLOT_SIZE,
    VERSION_ADDRESS,
};

use peakhold_hal::{NonVolatileStore, StoreError};

use crate::config::{
    ChannelConfig, ChecksumRecord, ConfigError, Record, RecordError, VersionRecord,
    CODE_VERSION, MAX_RECORD_SIZE,
};

/// Errors from the configuration registry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RegistryError {
    /// All instance slots are taken
    Full,
    /// The next slot would extend past the end of the store
    OutOfSpace,
    /// Version record and slot area overlap
    InvalidLayout,
    /// Instance was not registered with this registry
    UnknownInstance,
    /// Configuration values are out of range and were not written
    Config(ConfigError),
    /// Record could not be encoded
    Encode(RecordError),
    /// Storage operation failed
    Store(StoreError),
}

impl From<StoreError> for RegistryError {
    fn from(e: StoreError) -> Self {
        RegistryError::Store(e)
    }
}

impl From<ConfigError> for RegistryError {
    fn from(e: ConfigError) -> Self {
        RegistryError::Config(e)
    }
}

impl From<RecordError> for RegistryError {
    fn from(e: RecordError) -> Self {
        RegistryError::Encode(e)
    }
}

/// Where the effective configuration came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigSource {
    /// Stored data was valid and wins over code defaults
    Stored,
    /// Code defaults were written because stored data was stale
    Defaults,
}

/// Outcome of reconciling one instance's configuration
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Reconciled {
    /// Configuration the channel must use
    pub config: ChannelConfig,
    /// Stored data or code defaults
    pub source: ConfigSource,
    /// True if anything was written to the store
    pub written: bool,
}

/// Registry of channel instances and their persisted configuration
pub struct ConfigRegistry<S> {
    store: S,
    layout: Layout,
    slots: SlotTable,
    code_version: VersionRecord,
    version_reconciled: bool,
    session_writes: u32,
}

impl<S: NonVolatileStore> ConfigRegistry<S> {
    /// Create a registry with the default layout and code version
    pub fn new(store: S) -> Self {
        let layout = Layout::default();
        Self {
            store,
            layout,
            slots: SlotTable::new(layout.slot_base),
            code_version: CODE_VERSION,
            version_reconciled: false,
            session_writes: 0,
        }
    }

    /// Create a registry with a custom layout and code version
    pub fn with_layout(
        store: S,
        layout: Layout,
        code_version: VersionRecord,
    ) -> Result<Self, RegistryError> {
        layout.validate()?;
        if layout.version_end() > store.capacity() {
            return Err(RegistryError::OutOfSpace);
        }
        Ok(Self {
            store,
            layout,
            slots: SlotTable::new(layout.slot_base),
            code_version,
            version_reconciled: false,
            session_writes: 0,
        })
    }

    /// Assign the next free slot to a new channel instance
    pub fn register_instance(&mut self) -> Result<InstanceId, RegistryError> {
        if self.slots.end() + SLOT_SIZE > self.store.capacity() {
            return Err(RegistryError::OutOfSpace);
        }
        let id = self.slots.push()?;
        log_debug!(
            "Registered instance {} at {=u16:#x}",
            id.index(),
            self.slots.address(id).unwrap_or(0)
        );
        Ok(id)
    }

    /// Total instances registered
    pub fn instance_count(&self) -> u16 {
        self.slots.len() as u16
    }

    /// Start address of an instance's slot
    pub fn slot_address(&self, id: InstanceId) -> Result<u16, RegistryError> {
        self.slots.address(id).ok_or(RegistryError::UnknownInstance)
    }

    /// Storage layout in use
    pub fn layout(&self) -> Layout {
        self.layout
    }

    /// Schema version the code expects
    pub fn code_version(&self) -> VersionRecord {
        self.code_version
    }

    /// Writes issued through this registry since it was created
    pub fn writes_this_session(&self) -> u32 {
        self.session_writes
    }

    /// Shared access to the store
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Exclusive access to the store
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Give the store back
    pub fn into_store(self) -> S {
        self.store
    }

    /// Read the stored version record
    ///
    /// Returns `None` if the record was never written.
    pub fn read_version(&mut self) -> Result<Option<VersionRecord>, RegistryError> {
        let address = self.layout.version_address;
        let stored = self.session(self.layout.version_end(), |store| {
            read_record::<_, VersionRecord>(store, address)
        })?;
        Ok(stored.ok().filter(|v| !v.is_erased()))
    }

    /// Make the stored version record match the code version
    ///
    /// Writes if the record is missing or any field differs. Only the first
    /// call per registry touches the store; later calls return `false`.
    pub fn reconcile_version(&mut self) -> Result<bool, RegistryError> {
        if self.version_reconciled {
            return Ok(false);
        }

        let stored = self.read_version()?;
        let written = if stored == Some(self.code_version) {
            false
        } else {
            log_info!("Version record stale, writing {}", self.code_version);
            let address = self.layout.version_address;
            let version = self.code_version;
            self.session(self.layout.version_end(), |store| {
                write_record(store, address, &version)?;
                store.commit()?;
                Ok(())
            })?;
            self.session_writes += 1;
            true
        };

        self.version_reconciled = true;
        Ok(written)
    }

    /// Decide between stored configuration and code defaults
    ///
    /// Stored data is authoritative when it decodes, its checksum record
    /// vouches for it under the current code version, and it belongs to the
    /// same ADC channel. It is then returned without any write. Otherwise
    /// `defaults` and a fresh checksum record are written in one commit.
    ///
    /// Defaults that fail validation are rejected before the store is
    /// touched, since they could never decode on the next startup.
    pub fn reconcile_user_data(
        &mut self,
        id: InstanceId,
        defaults: &ChannelConfig,
    ) -> Result<Reconciled, RegistryError> {
        defaults.validate()?;
        let address = self.slot_address(id)?;
        let version_crc = self.code_version.checksum();

        let reconciled = self.session(address as usize + SLOT_SIZE, |store| {
            let (stored, sums) = read_slot(store, address)?;

            let stored_crc = match stored {
                Ok(config) => {
                    let crc = config.checksum();
                    let same_channel =
                        config.calibration.channel_id == defaults.calibration.channel_id;
                    if sums.vouches_for(version_crc, crc) && same_channel {
                        return Ok(Reconciled {
                            config,
                            source: ConfigSource::Stored,
                            written: false,
                        });
                    }
                    Some(crc)
                }
                Err(_) => None,
            };

            let (_, data_crc) = put_if_changed(store, address, defaults, stored_crc)?;
            let sums = ChecksumRecord {
                version_crc,
                data_crc,
                write_count: next_write_count(&sums),
            };
            write_record(store, checksum_address(address), &sums)?;
            store.commit()?;

            Ok(Reconciled {
                config: *defaults,
                source: ConfigSource::Defaults,
                written: true,
            })
        })?;

        match reconciled.source {
            ConfigSource::Stored => {
                log_debug!("Instance {}: stored configuration is current", id.index())
            }
            ConfigSource::Defaults => {
                self.session_writes += 1;
                log_info!("Instance {}: wrote default configuration", id.index());
            }
        }
        Ok(reconciled)
    }

    /// Write `record` at `address` unless its checksum equals `previous_checksum`
    ///
    /// Returns whether a write happened and the record's checksum.
    pub fn write_if_changed<R: Record>(
        &mut self,
        address: u16,
        record: &R,
        previous_checksum: u32,
    ) -> Result<(bool, u32), RegistryError> {
        let (written, crc) = self.session(address as usize + R::SIZE, |store| {
            let result = put_if_changed(store, address, record, Some(previous_checksum))?;
            if result.0 {
                store.commit()?;
            }
            Ok(result)
        })?;
        if written {
            self.session_writes += 1;
        }
        Ok((written, crc))
    }

    /// Persist a runtime reconfiguration of an instance
    ///
    /// Nothing is written when the stored checksums already vouch for
    /// `config`. Returns whether the store was written.
    pub fn store_user_data(
        &mut self,
        id: InstanceId,
        config: &ChannelConfig,
    ) -> Result<bool, RegistryError> {
        config.validate()?;
        let address = self.slot_address(id)?;
        let version_crc = self.code_version.checksum();

        let written = self.session(address as usize + SLOT_SIZE, |store| {
            let (stored, sums) = read_slot(store, address)?;
            let crc = config.checksum();
            if sums.vouches_for(version_crc, crc) {
                return Ok(false);
            }

            let stored_crc = stored.ok().map(|c| c.checksum());
            put_if_changed(store, address, config, stored_crc)?;
            let sums = ChecksumRecord {
                version_crc,
                data_crc: crc,
                write_count: next_write_count(&sums),
            };
            write_record(store, checksum_address(address), &sums)?;
            store.commit()?;
            Ok(true)
        })?;

        if written {
            self.session_writes += 1;
            log_info!("Instance {}: stored new configuration", id.index());
        }
        Ok(written)
    }

    /// Read an instance's stored configuration
    ///
    /// Returns `None` if the slot does not hold a decodable configuration.
    pub fn load_user_data(&mut self, id: InstanceId) -> Result<Option<ChannelConfig>, RegistryError> {
        let address = self.slot_address(id)?;
        let stored = self.session(address as usize + ChannelConfig::SIZE, |store| {
            read_record::<_, ChannelConfig>(store, address)
        })?;
        Ok(stored.ok())
    }

    /// Read an instance's checksum record
    pub fn load_checksums(&mut self, id: InstanceId) -> Result<ChecksumRecord, RegistryError> {
        let address = self.slot_address(id)?;
        let sums = self.session(address as usize + SLOT_SIZE, |store| {
            read_record::<_, ChecksumRecord>(store, checksum_address(address))
        })?;
        Ok(sums.unwrap_or(ChecksumRecord::INVALID))
    }

    /// Mark an instance's stored configuration stale
    ///
    /// The next [`reconcile_user_data`](Self::reconcile_user_data) writes the
    /// code defaults again.
    pub fn invalidate(&mut self, id: InstanceId) -> Result<(), RegistryError> {
        let address = self.slot_address(id)?;
        self.session(address as usize + SLOT_SIZE, |store| {
            let sums = read_record::<_, ChecksumRecord>(store, checksum_address(address))?
                .unwrap_or(ChecksumRecord::INVALID);
            let cleared = ChecksumRecord {
                write_count: next_write_count(&sums),
                ..ChecksumRecord::INVALID
            };
            write_record(store, checksum_address(address), &cleared)?;
            store.commit()?;
            Ok(())
        })?;
        self.session_writes += 1;
        log_warn!("Instance {}: stored configuration invalidated", id.index());
        Ok(())
    }

    /// Run `f` inside a `begin(size)`/`end()` store session
    ///
    /// `end()` runs even when `f` fails.
    fn session<T>(
        &mut self,
        size: usize,
        f: impl FnOnce(&mut S) -> Result<T, RegistryError>,
    ) -> Result<T, RegistryError> {
        self.store.begin(size)?;
        let result = f(&mut self.store);
        self.store.end();
        result
    }
}

/// Address of the checksum record inside a slot
fn checksum_address(slot_address: u16) -> u16 {
    slot_address + ChannelConfig::SIZE as u16
}

/// Write count to store with the next checksum record
fn next_write_count(previous: &ChecksumRecord) -> u32 {
    // Erased storage reads as all ones
    let base = if previous.write_count == u32::MAX {
        0
    } else {
        previous.write_count
    };
    base.saturating_add(1)
}

/// Read a record; the outer error is storage, the inner one decoding
fn read_record<S: NonVolatileStore, R: Record>(
    store: &mut S,
    address: u16,
) -> Result<Result<R, RecordError>, RegistryError> {
    let mut buf = [0u8; MAX_RECORD_SIZE];
    let bytes = buf.get_mut(..R::SIZE).ok_or(RecordError::BufferTooSmall)?;
    store.read(address, bytes)?;
    Ok(R::decode(bytes))
}

/// Read a slot's configuration and checksum record
fn read_slot<S: NonVolatileStore>(
    store: &mut S,
    address: u16,
) -> Result<(Result<ChannelConfig, RecordError>, ChecksumRecord), RegistryError> {
    let stored = read_record::<_, ChannelConfig>(store, address)?;
    let sums = read_record::<_, ChecksumRecord>(store, checksum_address(address))?
        .unwrap_or(ChecksumRecord::INVALID);
    Ok((stored, sums))
}

fn write_record<S: NonVolatileStore, R: Record>(
    store: &mut S,
    address: u16,
    record: &R,
) -> Result<(), RegistryError> {
    let mut buf = [0u8; MAX_RECORD_SIZE];
    let len = record.encode(&mut buf)?;
    store.write(address, &buf[..len])?;
    Ok(())
}

/// Write `record` unless `previous` equals its checksum. Does not commit.
fn put_if_changed<S: NonVolatileStore, R: Record>(
    store: &mut S,
    address: u16,
    record: &R,
    previous: Option<u32>,
) -> Result<(bool, u32), RegistryError> {
    let crc = record.checksum();
    if previous == Some(crc) {
        return Ok((false, crc));
    }
    write_record(store, address, record)?;
    Ok((true, crc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CalibrationData, ConfigError, DecayModel, DynamicParams};
    use peakhold_hal::mock::MemoryStore;

    type Store = MemoryStore<DEFAULT_STORE_SIZE>;

    fn defaults(pin: u16) -> ChannelConfig {
        ChannelConfig::new(CalibrationData::new(pin), DynamicParams::default())
    }

    #[test]
    fn test_register_instances() {
        let mut registry = ConfigRegistry::new(Store::new());
        assert_eq!(registry.instance_count(), 0);

        let a = registry.register_instance().unwrap();
        let b = registry.register_instance().unwrap();
        assert_eq!(a.index(), 1);
        assert_eq!(b.index(), 2);
        assert_eq!(registry.instance_count(), 2);
        assert_eq!(registry.slot_address(a), Ok(SLOT_BASE));
        assert_eq!(registry.slot_address(b), Ok(SLOT_BASE + SLOT_SIZE as u16));
    }

    #[test]
    fn test_register_until_full() {
        let mut registry = ConfigRegistry::new(Store::new());
        for _ in 0..MAX_INSTANCES {
            registry.register_instance().unwrap();
        }
        assert_eq!(registry.register_instance(), Err(RegistryError::Full));
        assert_eq!(registry.instance_count(), MAX_INSTANCES as u16);
    }

    #[test]
    fn test_register_out_of_space() {
        // Room for the version record and one slot only
        let store = MemoryStore::<{ 0x0100 + SLOT_SIZE }>::new();
        let mut registry = ConfigRegistry::new(store);
        assert!(registry.register_instance().is_ok());
        assert_eq!(registry.register_instance(), Err(RegistryError::OutOfSpace));
    }

    #[test]
    fn test_with_layout_rejects_small_store() {
        let result = ConfigRegistry::with_layout(
            MemoryStore::<64>::new(),
            Layout::default(),
            CODE_VERSION,
        );
        assert!(matches!(result, Err(RegistryError::OutOfSpace)));
    }

    #[test]
    fn test_unknown_instance() {
        let mut other = ConfigRegistry::new(Store::new());
        let id = other.register_instance().unwrap();

        let mut registry = ConfigRegistry::new(Store::new());
        assert_eq!(registry.slot_address(id), Err(RegistryError::UnknownInstance));
        assert_eq!(
            registry.reconcile_user_data(id, &defaults(26)),
            Err(RegistryError::UnknownInstance)
        );
    }

    #[test]
    fn test_version_written_on_fresh_store() {
        let mut registry = ConfigRegistry::new(Store::new());
        assert_eq!(registry.read_version(), Ok(None));

        assert_eq!(registry.reconcile_version(), Ok(true));
        assert_eq!(registry.read_version(), Ok(Some(CODE_VERSION)));
        assert_eq!(registry.store().commits(), 1);
        assert_eq!(
            registry.store().contents(VERSION_ADDRESS, 8),
            &[0xA5, 0, 0, 0, 1, 0, 0, 0]
        );
    }

    #[test]
    fn test_version_guard_prevents_rewrite() {
        let mut registry = ConfigRegistry::new(Store::new());
        assert_eq!(registry.reconcile_version(), Ok(true));

        // Even a corrupted record is not rewritten within the same run
        registry.store_mut().inject_corruption(VERSION_ADDRESS, 2);
        assert_eq!(registry.reconcile_version(), Ok(false));
        assert_eq!(registry.store().commits(), 1);
    }

    #[test]
    fn test_version_not_rewritten_when_current() {
        let mut registry = ConfigRegistry::new(Store::new());
        registry.reconcile_version().unwrap();
        let store = registry.into_store();

        let mut registry = ConfigRegistry::new(store);
        registry.store_mut().reset_counters();
        assert_eq!(registry.reconcile_version(), Ok(false));
        assert_eq!(registry.store().writes(), 0);
    }

    #[test]
    fn test_version_rewritten_on_mismatch() {
        let mut registry = ConfigRegistry::new(Store::new());
        registry.reconcile_version().unwrap();
        let store = registry.into_store();

        let newer = VersionRecord::new(0, 2, 0);
        let mut registry = ConfigRegistry::with_layout(store, Layout::default(), newer).unwrap();
        assert_eq!(registry.reconcile_version(), Ok(true));
        assert_eq!(registry.read_version(), Ok(Some(newer)));
    }

    #[test]
    fn test_fresh_store_writes_defaults() {
        let mut registry = ConfigRegistry::new(Store::new());
        let id = registry.register_instance().unwrap();
        let defaults = defaults(26);

        let result = registry.reconcile_user_data(id, &defaults).unwrap();
        assert_eq!(result.source, ConfigSource::Defaults);
        assert!(result.written);
        assert_eq!(result.config, defaults);
        assert_eq!(registry.store().commits(), 1);
        assert_eq!(registry.store().writes(), 2);

        assert_eq!(registry.load_user_data(id), Ok(Some(defaults)));
        let sums = registry.load_checksums(id).unwrap();
        assert_eq!(sums.data_crc, defaults.checksum());
        assert_eq!(sums.version_crc, CODE_VERSION.checksum());
        assert_eq!(sums.write_count, 1);
    }

    #[test]
    fn test_reconcile_twice_writes_once() {
        let mut registry = ConfigRegistry::new(Store::new());
        let id = registry.register_instance().unwrap();
        let defaults = defaults(26);

        registry.reconcile_user_data(id, &defaults).unwrap();
        let second = registry.reconcile_user_data(id, &defaults).unwrap();

        assert_eq!(second.source, ConfigSource::Stored);
        assert!(!second.written);
        assert_eq!(registry.store().commits(), 1);
        assert_eq!(registry.writes_this_session(), 1);
    }

    #[test]
    fn test_invalid_defaults_rejected_without_writing() {
        let mut registry = ConfigRegistry::new(Store::new());
        let id = registry.register_instance().unwrap();
        let mut bad = defaults(26);
        bad.calibration.slope = 0.0;
        bad.dynamics.decay_rate = 1.5;

        // Repeated startups must not rewrite the slot each time
        for _ in 0..3 {
            assert_eq!(
                registry.reconcile_user_data(id, &bad),
                Err(RegistryError::Config(ConfigError::InvalidSlope))
            );
        }
        bad.calibration.slope = 1.0;
        assert_eq!(
            registry.store_user_data(id, &bad),
            Err(RegistryError::Config(ConfigError::DecayRateNotDecaying))
        );

        assert_eq!(registry.store().writes(), 0);
        assert_eq!(registry.store().commits(), 0);
        assert_eq!(registry.writes_this_session(), 0);
    }

    #[test]
    fn test_stored_data_wins_over_new_defaults() {
        let mut registry = ConfigRegistry::new(Store::new());
        let id = registry.register_instance().unwrap();
        let first = defaults(26);
        registry.reconcile_user_data(id, &first).unwrap();

        let changed = ChannelConfig {
            dynamics: DynamicParams {
                decay_model: DecayModel::Exponential,
                decay_rate: 0.2,
                ..first.dynamics
            },
            ..first
        };
        let result = registry.reconcile_user_data(id, &changed).unwrap();
        assert_eq!(result.source, ConfigSource::Stored);
        assert_eq!(result.config, first);
    }

    #[test]
    fn test_channel_mismatch_rewrites() {
        let mut registry = ConfigRegistry::new(Store::new());
        let id = registry.register_instance().unwrap();
        registry.reconcile_user_data(id, &defaults(26)).unwrap();

        let result = registry.reconcile_user_data(id, &defaults(27)).unwrap();
        assert_eq!(result.source, ConfigSource::Defaults);
        assert_eq!(result.config.calibration.channel_id, 27);
        assert_eq!(registry.load_checksums(id).unwrap().write_count, 2);
    }

    #[test]
    fn test_corrupted_data_rewritten() {
        let mut registry = ConfigRegistry::new(Store::new());
        let id = registry.register_instance().unwrap();
        let defaults = defaults(26);
        registry.reconcile_user_data(id, &defaults).unwrap();

        registry.store_mut().inject_corruption(SLOT_BASE + 6, 4);
        let result = registry.reconcile_user_data(id, &defaults).unwrap();
        assert_eq!(result.source, ConfigSource::Defaults);
        assert_eq!(registry.load_user_data(id), Ok(Some(defaults)));
    }

    #[test]
    fn test_invalidate_forces_defaults() {
        let mut registry = ConfigRegistry::new(Store::new());
        let id = registry.register_instance().unwrap();
        let defaults = defaults(26);
        registry.reconcile_user_data(id, &defaults).unwrap();

        registry.invalidate(id).unwrap();
        assert_eq!(registry.load_checksums(id).unwrap().data_crc, 0);

        registry.store_mut().reset_counters();
        let result = registry.reconcile_user_data(id, &defaults).unwrap();
        assert_eq!(result.source, ConfigSource::Defaults);
        // Data bytes are unchanged, so only the checksum record is rewritten
        assert_eq!(registry.store().writes(), 1);
        assert_eq!(registry.store().commits(), 1);
    }

    #[test]
    fn test_version_change_invalidates_user_data() {
        let mut registry = ConfigRegistry::new(Store::new());
        let id = registry.register_instance().unwrap();
        registry.reconcile_user_data(id, &defaults(26)).unwrap();
        let store = registry.into_store();

        let newer = VersionRecord::new(1, 0, 0);
        let mut registry = ConfigRegistry::with_layout(store, Layout::default(), newer).unwrap();
        let id = registry.register_instance().unwrap();
        let result = registry.reconcile_user_data(id, &defaults(26)).unwrap();
        assert_eq!(result.source, ConfigSource::Defaults);
        assert_eq!(
            registry.load_checksums(id).unwrap().version_crc,
            newer.checksum()
        );
    }

    #[test]
    fn test_write_if_changed() {
        let mut registry = ConfigRegistry::new(Store::new());
        let record = ChecksumRecord {
            version_crc: 1,
            data_crc: 2,
            write_count: 3,
        };

        let (written, crc) = registry.write_if_changed(0x0200, &record, 0).unwrap();
        assert!(written);
        assert_eq!(crc, record.checksum());

        let (written, _) = registry.write_if_changed(0x0200, &record, crc).unwrap();
        assert!(!written);
        assert_eq!(registry.store().commits(), 1);
    }

    #[test]
    fn test_store_user_data() {
        let mut registry = ConfigRegistry::new(Store::new());
        let id = registry.register_instance().unwrap();
        let first = defaults(26);
        registry.reconcile_user_data(id, &first).unwrap();

        assert_eq!(registry.store_user_data(id, &first), Ok(false));

        let updated = ChannelConfig {
            dynamics: DynamicParams {
                hold_interval_ms: 250,
                ..first.dynamics
            },
            ..first
        };
        assert_eq!(registry.store_user_data(id, &updated), Ok(true));
        assert_eq!(registry.store().commits(), 2);

        // Survives a restart and wins over the original defaults
        let store = registry.into_store();
        let mut registry = ConfigRegistry::new(store);
        let id = registry.register_instance().unwrap();
        let result = registry.reconcile_user_data(id, &first).unwrap();
        assert_eq!(result.source, ConfigSource::Stored);
        assert_eq!(result.config, updated);
    }

    #[test]
    fn test_store_errors_propagate_and_close_session() {
        let mut registry = ConfigRegistry::new(Store::new());
        let id = registry.register_instance().unwrap();
        registry.store_mut().fail_writes(true);

        assert_eq!(
            registry.reconcile_user_data(id, &defaults(26)),
            Err(RegistryError::Store(StoreError::Flash))
        );
        assert!(!registry.store().in_session());
        assert_eq!(registry.writes_this_session(), 0);
    }
}
