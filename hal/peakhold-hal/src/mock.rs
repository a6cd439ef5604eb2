//! In-memory implementations for host testing
//!
//! These fakes implement the HAL traits without hardware so the sampling
//! and persistence logic can be exercised on the host:
//!
//! - [`MemoryStore`] - EEPROM image with session checks and write counters
//! - [`ScriptedAdc`] - Queue of raw readings
//! - [`ManualClock`] - Clock advanced by the test
//! - [`RecordingPins`] - Records every pin mode change

use core::cell::Cell;

use heapless::{Deque, Vec};

use crate::adc::{AdcError, AnalogInput};
use crate::gpio::{PinControl, PinMode};
use crate::store::{check_bounds, NonVolatileStore, StoreError};
use crate::time::Clock;

/// Value of an erased EEPROM/flash byte
pub const ERASED: u8 = 0xFF;

/// EEPROM image held in RAM
///
/// Writes go to a staging copy and only reach the image on `commit()`,
/// matching flash-emulated EEPROM. Ending a session without committing
/// drops the staged bytes.
///
/// # Example
///
/// ```
/// use peakhold_hal::mock::MemoryStore;
/// use peakhold_hal::NonVolatileStore;
///
/// let mut store = MemoryStore::<256>::new();
/// store.begin(16).unwrap();
/// store.write(4, &[1, 2, 3]).unwrap();
/// store.commit().unwrap();
/// store.end();
///
/// assert_eq!(store.contents(4, 3), &[1, 2, 3]);
/// assert_eq!(store.commits(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct MemoryStore<const N: usize> {
    image: [u8; N],
    staged: [u8; N],
    session: Option<usize>,
    dirty: bool,
    writes: u32,
    commits: u32,
    fail_writes: bool,
}

impl<const N: usize> Default for MemoryStore<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> MemoryStore<N> {
    /// Create an erased store
    pub const fn new() -> Self {
        Self {
            image: [ERASED; N],
            staged: [ERASED; N],
            session: None,
            dirty: false,
            writes: 0,
            commits: 0,
            fail_writes: false,
        }
    }

    /// Committed bytes (for test verification)
    pub fn contents(&self, address: u16, len: usize) -> &[u8] {
        let start = address as usize;
        &self.image[start..start + len]
    }

    /// Number of `write()` calls accepted
    pub fn writes(&self) -> u32 {
        self.writes
    }

    /// Number of commits that flushed staged data
    pub fn commits(&self) -> u32 {
        self.commits
    }

    /// Reset the write and commit counters
    pub fn reset_counters(&mut self) {
        self.writes = 0;
        self.commits = 0;
    }

    /// Overwrite committed bytes with a corrupt pattern
    pub fn inject_corruption(&mut self, address: u16, len: usize) {
        let start = address as usize;
        for byte in &mut self.image[start..start + len] {
            *byte = 0xAA;
        }
    }

    /// Make every following `write()` fail with [`StoreError::Flash`]
    pub fn fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }

    /// Check if a session is open
    pub fn in_session(&self) -> bool {
        self.session.is_some()
    }

    fn session_size(&self) -> Result<usize, StoreError> {
        self.session.ok_or(StoreError::NoSession)
    }
}

impl<const N: usize> NonVolatileStore for MemoryStore<N> {
    fn capacity(&self) -> usize {
        N
    }

    fn begin(&mut self, size: usize) -> Result<(), StoreError> {
        if size > N {
            return Err(StoreError::SessionTooSmall);
        }
        self.staged = self.image;
        self.session = Some(size);
        self.dirty = false;
        Ok(())
    }

    fn read(&mut self, address: u16, buffer: &mut [u8]) -> Result<(), StoreError> {
        let size = self.session_size()?;
        check_bounds(address, buffer.len(), size)?;
        let start = address as usize;
        buffer.copy_from_slice(&self.staged[start..start + buffer.len()]);
        Ok(())
    }

    fn write(&mut self, address: u16, data: &[u8]) -> Result<(), StoreError> {
        let size = self.session_size()?;
        check_bounds(address, data.len(), size)?;
        if self.fail_writes {
            return Err(StoreError::Flash);
        }
        let start = address as usize;
        self.staged[start..start + data.len()].copy_from_slice(data);
        self.dirty = true;
        self.writes += 1;
        Ok(())
    }

    fn commit(&mut self) -> Result<(), StoreError> {
        self.session_size()?;
        if self.dirty {
            self.image = self.staged;
            self.dirty = false;
            self.commits += 1;
        }
        Ok(())
    }

    fn end(&mut self) {
        self.session = None;
        self.dirty = false;
    }
}

/// ADC fake returning queued readings
///
/// Once the queue is empty every read returns the current level.
#[derive(Debug)]
pub struct ScriptedAdc<const N: usize> {
    queue: Deque<u16, N>,
    level: u16,
    reads: u32,
    last_channel: Option<u16>,
    fail: bool,
}

impl<const N: usize> Default for ScriptedAdc<N> {
    fn default() -> Self {
        Self::new(0)
    }
}

impl<const N: usize> ScriptedAdc<N> {
    /// Create an ADC that reads `level` until readings are queued
    pub fn new(level: u16) -> Self {
        Self {
            queue: Deque::new(),
            level,
            reads: 0,
            last_channel: None,
            fail: false,
        }
    }

    /// Queue a reading. Returns false if the queue is full.
    pub fn push(&mut self, raw: u16) -> bool {
        self.queue.push_back(raw).is_ok()
    }

    /// Queue several readings
    pub fn extend(&mut self, readings: &[u16]) {
        for &raw in readings {
            let _ = self.push(raw);
        }
    }

    /// Set the level returned once the queue is drained
    pub fn set_level(&mut self, raw: u16) {
        self.level = raw;
    }

    /// Make every following read fail
    pub fn set_failing(&mut self, fail: bool) {
        self.fail = fail;
    }

    /// Number of conversions performed
    pub fn reads(&self) -> u32 {
        self.reads
    }

    /// Channel of the most recent read
    pub fn last_channel(&self) -> Option<u16> {
        self.last_channel
    }
}

impl<const N: usize> AnalogInput for ScriptedAdc<N> {
    fn read_raw(&mut self, channel: u16) -> Result<u16, AdcError> {
        if self.fail {
            return Err(AdcError::Conversion);
        }
        self.reads += 1;
        self.last_channel = Some(channel);
        Ok(self.queue.pop_front().unwrap_or(self.level))
    }
}

/// Clock controlled by the test
///
/// Delays are recorded but do not advance the millisecond counter.
#[derive(Debug, Default)]
pub struct ManualClock {
    now_ms: Cell<u32>,
    delayed_us: Cell<u64>,
    delay_calls: Cell<u32>,
}

impl ManualClock {
    /// Create a clock at `now_ms`
    pub const fn new(now_ms: u32) -> Self {
        Self {
            now_ms: Cell::new(now_ms),
            delayed_us: Cell::new(0),
            delay_calls: Cell::new(0),
        }
    }

    /// Set the current time
    pub fn set(&self, now_ms: u32) {
        self.now_ms.set(now_ms);
    }

    /// Advance the current time, wrapping like a hardware counter
    pub fn advance(&self, ms: u32) {
        self.now_ms.set(self.now_ms.get().wrapping_add(ms));
    }

    /// Total requested busy-wait time
    pub fn delayed_us(&self) -> u64 {
        self.delayed_us.get()
    }

    /// Number of `delay_us()` calls
    pub fn delay_calls(&self) -> u32 {
        self.delay_calls.get()
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u32 {
        self.now_ms.get()
    }

    fn delay_us(&self, us: u32) {
        self.delayed_us.set(self.delayed_us.get() + us as u64);
        self.delay_calls.set(self.delay_calls.get() + 1);
    }
}

/// Maximum number of recorded pin mode changes
pub const PIN_HISTORY: usize = 16;

/// Pin control fake recording every mode change
#[derive(Debug, Default)]
pub struct RecordingPins {
    history: Vec<(u16, PinMode), PIN_HISTORY>,
}

impl RecordingPins {
    /// Create an empty recorder
    pub fn new() -> Self {
        Self { history: Vec::new() }
    }

    /// All recorded changes, oldest first
    pub fn history(&self) -> &[(u16, PinMode)] {
        &self.history
    }

    /// Most recent mode set on `pin`
    pub fn mode_of(&self, pin: u16) -> Option<PinMode> {
        self.history
            .iter()
            .rev()
            .find(|(p, _)| *p == pin)
            .map(|(_, mode)| *mode)
    }
}

impl PinControl for RecordingPins {
    fn set_mode(&mut self, pin: u16, mode: PinMode) {
        // Oldest entries are dropped once full
        if self.history.is_full() {
            self.history.remove(0);
        }
        let _ = self.history.push((pin, mode));
    }
}
