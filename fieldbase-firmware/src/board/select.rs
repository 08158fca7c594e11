//! Arbitrated chip selects
//!
//! The radio and the SD card each sit behind a [`Select`]. The bus arbiter
//! holds the [`SelectLine`] half: driving it low grants the device a lease
//! on the bus, driving it high revokes the lease and deselects the chip.
//! The device driver holds the [`GatedCs`] half and toggles chip select
//! per transaction, but can only assert it while its lease is held. A
//! driver touching the bus out of turn gets an error instead of a
//! collision on MISO.

use core::cell::RefCell;

use embassy_rp::gpio::Output;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embedded_hal::digital::{self, ErrorKind};
use portable_atomic::{AtomicBool, Ordering};

/// Chip select shared between the arbiter and a device driver
pub struct Select {
    pin: Mutex<CriticalSectionRawMutex, RefCell<Output<'static>>>,
    granted: AtomicBool,
}

impl Select {
    /// Take `pin` and drive it high (deselected)
    pub fn new(mut pin: Output<'static>) -> Self {
        pin.set_high();
        Self {
            pin: Mutex::new(RefCell::new(pin)),
            granted: AtomicBool::new(false),
        }
    }

    /// Split into the arbiter half and the driver half
    pub fn split(&'static self) -> (SelectLine, GatedCs) {
        (SelectLine(self), GatedCs(self))
    }

    fn drive_high(&self) {
        self.pin.lock(|pin| pin.borrow_mut().set_high());
    }

    fn drive_low(&self) {
        self.pin.lock(|pin| pin.borrow_mut().set_low());
    }
}

/// Arbiter half of a [`Select`], active low
pub struct SelectLine(&'static Select);

impl fieldbase_hal::OutputPin for SelectLine {
    fn set_high(&mut self) {
        self.0.granted.store(false, Ordering::SeqCst);
        self.0.drive_high();
    }

    fn set_low(&mut self) {
        self.0.granted.store(true, Ordering::SeqCst);
    }

    fn is_set_high(&self) -> bool {
        !self.0.granted.load(Ordering::SeqCst)
    }
}

/// Chip select asserted without a lease
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct NotGranted;

impl digital::Error for NotGranted {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

/// Driver half of a [`Select`]
pub struct GatedCs(&'static Select);

impl digital::ErrorType for GatedCs {
    type Error = NotGranted;
}

impl digital::OutputPin for GatedCs {
    fn set_low(&mut self) -> Result<(), NotGranted> {
        if !self.0.granted.load(Ordering::SeqCst) {
            return Err(NotGranted);
        }
        self.0.drive_low();
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), NotGranted> {
        self.0.drive_high();
        Ok(())
    }
}
