//! ADC pin allocation
//!
//! Tracks which ADC-capable pins are currently handed to the converter so
//! two channels cannot sample the same pin.

use heapless::FnvIndexSet;

use crate::adc::AdcChannel;

/// Tracks pins switched to analog mode
pub struct AdcPinAllocator {
    allocated: FnvIndexSet<u16, 8>,
}

impl Default for AdcPinAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl AdcPinAllocator {
    pub fn new() -> Self {
        Self {
            allocated: FnvIndexSet::new(),
        }
    }

    /// Allocate an ADC pin
    ///
    /// Returns `Err(())` for pins without an ADC input or already in use.
    pub fn allocate(&mut self, pin: u16) -> Result<(), ()> {
        if AdcChannel::from_gpio(pin).is_none() || self.allocated.contains(&pin) {
            return Err(());
        }
        self.allocated.insert(pin).map_err(|_| ())?;
        Ok(())
    }

    /// Release a pin
    pub fn release(&mut self, pin: u16) {
        self.allocated.remove(&pin);
    }

    /// Check if a pin is in analog mode
    pub fn is_allocated(&self, pin: u16) -> bool {
        self.allocated.contains(&pin)
    }

    /// Number of pins in analog mode
    pub fn allocated_count(&self) -> usize {
        self.allocated.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocator() {
        let mut alloc = AdcPinAllocator::new();

        assert!(alloc.allocate(26).is_ok());
        assert!(alloc.is_allocated(26));

        // Can't allocate same pin twice
        assert!(alloc.allocate(26).is_err());

        // Only ADC pins
        assert!(alloc.allocate(11).is_err());

        alloc.release(26);
        assert!(!alloc.is_allocated(26));
        assert!(alloc.allocate(26).is_ok());
        assert_eq!(alloc.allocated_count(), 1);
    }
}
