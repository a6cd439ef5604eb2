//! Non-volatile storage abstraction
//!
//! Models an EEPROM (or flash-emulated EEPROM) with fixed byte addresses.
//! Every access happens inside a session:
//!
//! ```text
//! begin(size) -> read/write ... -> commit() -> end()
//! ```
//!
//! `size` bounds the addresses touched during the session. Writes may be
//! buffered until `commit()`.

/// Errors from non-volatile storage operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StoreError {
    /// Read or write outside of a `begin()`/`end()` session
    NoSession,
    /// Session size exceeds the device capacity
    SessionTooSmall,
    /// Access beyond the declared session size
    OutOfBounds,
    /// Underlying flash/EEPROM operation failed
    Flash,
}

/// Byte-addressable non-volatile store
pub trait NonVolatileStore {
    /// Total number of addressable bytes
    fn capacity(&self) -> usize;

    /// Open a session covering addresses `0..size`
    fn begin(&mut self, size: usize) -> Result<(), StoreError>;

    /// Copy `buffer.len()` bytes starting at `address` into `buffer`
    fn read(&mut self, address: u16, buffer: &mut [u8]) -> Result<(), StoreError>;

    /// Write `data` starting at `address`
    fn write(&mut self, address: u16, data: &[u8]) -> Result<(), StoreError>;

    /// Make buffered writes durable
    fn commit(&mut self) -> Result<(), StoreError>;

    /// Close the session
    fn end(&mut self);
}

impl<T: NonVolatileStore + ?Sized> NonVolatileStore for &mut T {
    fn capacity(&self) -> usize {
        (**self).capacity()
    }

    fn begin(&mut self, size: usize) -> Result<(), StoreError> {
        (**self).begin(size)
    }

    fn read(&mut self, address: u16, buffer: &mut [u8]) -> Result<(), StoreError> {
        (**self).read(address, buffer)
    }

    fn write(&mut self, address: u16, data: &[u8]) -> Result<(), StoreError> {
        (**self).write(address, data)
    }

    fn commit(&mut self) -> Result<(), StoreError> {
        (**self).commit()
    }

    fn end(&mut self) {
        (**self).end()
    }
}

/// Check that `len` bytes at `address` fit in a session of `session_size`
///
/// Shared by implementations so they agree on bounds handling.
pub fn check_bounds(address: u16, len: usize, session_size: usize) -> Result<(), StoreError> {
    let end = address as usize + len;
    if end > session_size {
        return Err(StoreError::OutOfBounds);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_bounds() {
        assert_eq!(check_bounds(0, 8, 8), Ok(()));
        assert_eq!(check_bounds(0xA0, 8, 0x100), Ok(()));
        assert_eq!(check_bounds(1, 8, 8), Err(StoreError::OutOfBounds));
        assert_eq!(check_bounds(0, 0, 0), Ok(()));
    }
}
