//! Shared SPI bus arbitration
//!
//! The radio and the SD card sit on one SPI bus with separate active-low
//! select lines. At most one of them may be selected at any time, and a
//! peripheral must be selected before anything is sent to it.

use fieldbase_hal::OutputPin;

/// Peripherals sharing the bus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Peripheral {
    Storage,
    Radio,
}

/// Select-one, deselect-the-rest discipline over two select lines
pub struct BusArbiter<P> {
    radio_cs: P,
    storage_cs: P,
    current: Option<Peripheral>,
}

impl<P: OutputPin> BusArbiter<P> {
    /// Take both select lines, deselecting both
    pub fn new(mut radio_cs: P, mut storage_cs: P) -> Self {
        radio_cs.set_high();
        storage_cs.set_high();
        Self {
            radio_cs,
            storage_cs,
            current: None,
        }
    }

    /// Give the bus to `peripheral`
    ///
    /// Deselects the other peripheral before selecting the requested one.
    /// Does nothing if `peripheral` already holds the bus.
    pub fn acquire_for(&mut self, peripheral: Peripheral) {
        if self.current == Some(peripheral) {
            return;
        }

        match peripheral {
            Peripheral::Storage => {
                self.radio_cs.set_high();
                self.storage_cs.set_low();
            }
            Peripheral::Radio => {
                self.storage_cs.set_high();
                self.radio_cs.set_low();
            }
        }
        self.current = Some(peripheral);
    }

    /// Deselect both peripherals
    pub fn release(&mut self) {
        self.radio_cs.set_high();
        self.storage_cs.set_high();
        self.current = None;
    }

    /// Peripheral currently holding the bus
    pub fn current(&self) -> Option<Peripheral> {
        self.current
    }

    /// True if `peripheral`'s select line is asserted
    pub fn is_selected(&self, peripheral: Peripheral) -> bool {
        match peripheral {
            Peripheral::Storage => self.storage_cs.is_set_low(),
            Peripheral::Radio => self.radio_cs.is_set_low(),
        }
    }
}
