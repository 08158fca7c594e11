//! Fieldbase - LoRa Sensor Network Base Station
//!
//! Receives datagrams from leaf sensor nodes, appends them to a log on the
//! SD card, shows them on a scrolling TFT panel and answers time requests.
//! The radio and the SD card share one SPI bus; the dispatcher's bus
//! arbiter decides which of them may use it.

#![no_std]
#![no_main]

use core::cell::RefCell;

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::gpio::{Level, Output};
use embassy_rp::i2c::{self, I2c};
use embassy_rp::spi::{self, Spi};
use embassy_embedded_hal::shared_bus::blocking::spi::SpiDeviceWithConfig;
use embassy_sync::blocking_mutex::Mutex;
use embassy_time::{Delay, Timer};
use embedded_sdmmc::SdCard;
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use fieldbase_core::{BusArbiter, DataLog, Dispatcher, Peripheral};
use fieldbase_display::DisplayRing;
use fieldbase_drivers::display::{St7735, TextPanel};
use fieldbase_drivers::radio::{ReliableDatagram, Sx1276};
use fieldbase_drivers::rtc::Ds3231;
use fieldbase_hal::{Clock, DateTime};

use crate::board::{Select, SharedSpi, StatusLed};
use crate::storage::{FixedTime, SdLog};

mod board;
mod config;
mod storage;
mod tasks;

/// Build time as Unix seconds, set by build.rs
const BUILD_EPOCH: &str = env!("FIELDBASE_BUILD_EPOCH");

/// SD cards must be brought up at 400 kHz or less
const SD_INIT_FREQUENCY_HZ: u32 = 400_000;
/// SD card once it answers in SPI mode
const SD_FREQUENCY_HZ: u32 = 12_000_000;
/// RFM95 register access, 10 MHz max
const RADIO_FREQUENCY_HZ: u32 = 8_000_000;
/// ST7735 write cycle, 15 MHz max
const TFT_FREQUENCY_HZ: u32 = 15_000_000;

static SPI_BUS: StaticCell<SharedSpi> = StaticCell::new();
static RADIO_SELECT: StaticCell<Select> = StaticCell::new();
static SD_SELECT: StaticCell<Select> = StaticCell::new();

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Fieldbase base station booting...");

    let p = embassy_rp::init(Default::default());
    info!("Peripherals initialized");

    let station = config::load();
    let build_time = DateTime::from_unixtime(BUILD_EPOCH.parse().unwrap_or(0));

    let led = StatusLed::new(Output::new(p.PIN_13, Level::Low));

    // Every chip select deasserted before the first clock edge
    let radio_select: &'static Select =
        RADIO_SELECT.init(Select::new(Output::new(p.PIN_16, Level::High)));
    let sd_select: &'static Select =
        SD_SELECT.init(Select::new(Output::new(p.PIN_10, Level::High)));
    let tft_cs = Output::new(p.PIN_9, Level::High);
    let tft_dc = Output::new(p.PIN_7, Level::Low);

    // Radio hardware reset
    let mut radio_reset = Output::new(p.PIN_17, Level::High);
    radio_reset.set_low();
    Timer::after_millis(10).await;
    radio_reset.set_high();
    Timer::after_millis(10).await;

    let mut spi = Spi::new_blocking(
        p.SPI1,
        p.PIN_14,
        p.PIN_15,
        p.PIN_8,
        spi_config(SD_INIT_FREQUENCY_HZ),
    );
    // SD cards want at least 74 clocks with CS high before their first command
    if spi.blocking_write(&[0xFF; 10]).is_err() {
        warn!("SPI wake-up clocks failed");
    }
    let spi_bus: &'static SharedSpi = SPI_BUS.init(Mutex::new(RefCell::new(spi)));
    info!("SPI bus initialized");

    let (radio_line, radio_cs) = radio_select.split();
    let (sd_line, sd_cs) = sd_select.split();
    let mut bus = BusArbiter::new(radio_line, sd_line);

    // Display
    let tft_spi = SpiDeviceWithConfig::new(spi_bus, tft_cs, spi_config(TFT_FREQUENCY_HZ));
    let mut tft = St7735::new(tft_spi, tft_dc);
    match tft.init(&mut Delay) {
        Ok(()) => info!("TFT initialized"),
        Err(e) => warn!("TFT init failed: {}", e),
    }
    let ring = DisplayRing::new(TextPanel::new(tft));

    // Radio
    let radio_spi = SpiDeviceWithConfig::new(spi_bus, radio_cs, spi_config(RADIO_FREQUENCY_HZ));
    let mut modem = Sx1276::new(radio_spi);
    bus.acquire_for(Peripheral::Radio);
    match modem.init(&config::modem_config(&station.radio)) {
        Ok(()) => info!("Radio initialized"),
        Err(e) => warn!("Radio init failed: {}", e),
    }
    let radio = ReliableDatagram::new(modem, Delay, station.address);

    // Log storage
    let sd_spi = SpiDeviceWithConfig::new(spi_bus, sd_cs, spi_config(SD_INIT_FREQUENCY_HZ));
    let card = SdCard::new(sd_spi, Delay);
    bus.acquire_for(Peripheral::Storage);
    match card.num_bytes() {
        Ok(bytes) => {
            card.spi(|dev| dev.set_config(spi_config(SD_FREQUENCY_HZ)));
            info!("SD card ready, {} bytes", bytes);
        }
        // Stays at the init rate; the log retries at start-up
        Err(e) => warn!("SD card not ready: {}", Debug2Format(&e)),
    }
    let log = DataLog::new(
        SdLog::new(card, FixedTime::new(build_time)),
        station.log_file.clone(),
    );

    // Clock
    let i2c = I2c::new_blocking(p.I2C1, p.PIN_3, p.PIN_2, i2c::Config::default());
    let mut rtc = Ds3231::new(i2c);
    match rtc.probe() {
        Ok(()) => {
            if let Ok(true) = rtc.lost_power() {
                warn!("RTC lost power, it will be set to the build time");
            }
        }
        Err(e) => warn!("RTC not found: {}", e),
    }

    let dispatcher = Dispatcher::new(radio, log, rtc, ring, bus, led, station);
    spawner
        .spawn(tasks::dispatch_task(dispatcher, build_time))
        .unwrap();
}

fn spi_config(frequency: u32) -> spi::Config {
    let mut config = spi::Config::default();
    config.frequency = frequency;
    config
}
