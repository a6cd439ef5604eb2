//! Flash-emulated EEPROM for RP2040
//!
//! Reserves the last flash sector and mirrors it in RAM. Reads and writes
//! go to the RAM copy; `commit()` erases the sector and programs it back
//! only if something changed.
//!
//! Implements the `NonVolatileStore` trait from `peakhold-hal`.

use embassy_rp::flash::{Blocking, Flash, ERASE_SIZE};
use embassy_rp::peripherals::FLASH;
use embassy_rp::Peri;
use peakhold_hal::store::check_bounds;
use peakhold_hal::{NonVolatileStore, StoreError};

/// Flash storage configuration
pub const FLASH_SIZE: usize = 2 * 1024 * 1024; // 2MB flash on the Pico
pub const EEPROM_SIZE: usize = ERASE_SIZE; // one sector
pub const EEPROM_OFFSET: u32 = (FLASH_SIZE - EEPROM_SIZE) as u32;

/// EEPROM emulated in the last flash sector
pub struct FlashEeprom<'d> {
    flash: Flash<'d, FLASH, Blocking, FLASH_SIZE>,
    shadow: [u8; EEPROM_SIZE],
    loaded: bool,
    dirty: bool,
    session: Option<usize>,
}

impl<'d> FlashEeprom<'d> {
    /// Create the store; flash is read on the first `begin()`
    pub fn new(flash: Peri<'d, FLASH>) -> Self {
        Self {
            flash: Flash::new_blocking(flash),
            shadow: [0xFF; EEPROM_SIZE],
            loaded: false,
            dirty: false,
            session: None,
        }
    }

    fn load(&mut self) -> Result<(), StoreError> {
        self.flash
            .blocking_read(EEPROM_OFFSET, &mut self.shadow)
            .map_err(|_| StoreError::Flash)?;
        self.loaded = true;
        Ok(())
    }

    fn session_size(&self) -> Result<usize, StoreError> {
        self.session.ok_or(StoreError::NoSession)
    }
}

impl NonVolatileStore for FlashEeprom<'_> {
    fn capacity(&self) -> usize {
        EEPROM_SIZE
    }

    fn begin(&mut self, size: usize) -> Result<(), StoreError> {
        if size > EEPROM_SIZE {
            return Err(StoreError::SessionTooSmall);
        }
        if !self.loaded {
            self.load()?;
        }
        self.session = Some(size);
        Ok(())
    }

    fn read(&mut self, address: u16, buffer: &mut [u8]) -> Result<(), StoreError> {
        let size = self.session_size()?;
        check_bounds(address, buffer.len(), size)?;
        let start = address as usize;
        buffer.copy_from_slice(&self.shadow[start..start + buffer.len()]);
        Ok(())
    }

    fn write(&mut self, address: u16, data: &[u8]) -> Result<(), StoreError> {
        let size = self.session_size()?;
        check_bounds(address, data.len(), size)?;
        let start = address as usize;
        let target = &mut self.shadow[start..start + data.len()];
        if target != data {
            target.copy_from_slice(data);
            self.dirty = true;
        }
        Ok(())
    }

    fn commit(&mut self) -> Result<(), StoreError> {
        self.session_size()?;
        if !self.dirty {
            return Ok(());
        }

        let end = EEPROM_OFFSET + EEPROM_SIZE as u32;
        self.flash
            .blocking_erase(EEPROM_OFFSET, end)
            .map_err(|_| StoreError::Flash)?;
        self.flash
            .blocking_write(EEPROM_OFFSET, &self.shadow)
            .map_err(|_| StoreError::Flash)?;
        self.dirty = false;

        #[cfg(feature = "defmt")]
        defmt::debug!("EEPROM sector committed at {=u32:#x}", EEPROM_OFFSET);
        Ok(())
    }

    fn end(&mut self) {
        // Uncommitted changes are dropped by reloading from flash
        if self.dirty {
            self.loaded = false;
            self.dirty = false;
        }
        self.session = None;
    }
}
