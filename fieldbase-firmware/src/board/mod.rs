//! Board wiring
//!
//! Adafruit Feather RP2040 with RFM95 LoRa radio, an SD card and a 1.8"
//! ST7735 TFT sharing SPI1, and a DS3231 on the STEMMA I2C port.
//!
//! | Signal       | GPIO |
//! |--------------|------|
//! | SPI1 SCK     | 14   |
//! | SPI1 MOSI    | 15   |
//! | SPI1 MISO    | 8    |
//! | RFM95 CS     | 16   |
//! | RFM95 RESET  | 17   |
//! | SD CS        | 10   |
//! | TFT CS       | 9    |
//! | TFT DC       | 7    |
//! | I2C1 SDA     | 2    |
//! | I2C1 SCL     | 3    |
//! | Status LED   | 13   |

pub mod led;
pub mod select;

use core::cell::RefCell;

use embassy_embedded_hal::shared_bus::blocking::spi::SpiDeviceWithConfig;
use embassy_rp::gpio::Output;
use embassy_rp::i2c::{self, I2c};
use embassy_rp::peripherals::{I2C1, SPI1};
use embassy_rp::spi::{Blocking, Spi};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_time::Delay;
use embedded_sdmmc::SdCard;

use fieldbase_core::Dispatcher;
use fieldbase_drivers::display::{St7735, TextPanel};
use fieldbase_drivers::radio::{ReliableDatagram, Sx1276};
use fieldbase_drivers::rtc::Ds3231;

use crate::storage::{FixedTime, SdLog};

pub use led::StatusLed;
pub use select::{GatedCs, Select, SelectLine};

/// SPI1 in blocking mode, shared by every SPI part on the board
pub type SpiBus = Spi<'static, SPI1, Blocking>;

/// SPI1 behind a lock; each device reapplies its own clock rate per transaction
pub type SharedSpi = Mutex<CriticalSectionRawMutex, RefCell<SpiBus>>;

/// Radio or SD card: chip select gated by the bus arbiter
pub type ArbitratedSpi = SpiDeviceWithConfig<'static, CriticalSectionRawMutex, SpiBus, GatedCs>;

/// TFT: plain chip select, outside arbitration
pub type TftSpi = SpiDeviceWithConfig<'static, CriticalSectionRawMutex, SpiBus, Output<'static>>;

pub type Radio = ReliableDatagram<Sx1276<ArbitratedSpi>, Delay>;
pub type Storage = SdLog<SdCard<ArbitratedSpi, Delay>, FixedTime>;
pub type Rtc = Ds3231<I2c<'static, I2C1, i2c::Blocking>>;
pub type Panel = TextPanel<St7735<TftSpi, Output<'static>>>;

/// The dispatcher as wired on this board
pub type StationDispatcher = Dispatcher<Radio, Storage, Rtc, Panel, SelectLine, StatusLed>;
