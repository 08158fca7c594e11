//! SX1276 LoRa modem (SPI)
//!
//! Register-level driver for the Semtech SX1276 as fitted to HopeRF RFM95
//! modules: high-frequency port, PA_BOOST output, explicit header mode with
//! CRC. Bus access goes through an `SpiDevice`; the station's bus arbiter
//! owns the select line.

use embedded_hal::spi::{Operation, SpiDevice};
use fieldbase_hal::{LinkStats, RadioError};

use super::{Modem, MAX_FRAME_LEN};

/// SX1276 register addresses
pub mod reg {
    pub const FIFO: u8 = 0x00;
    pub const OP_MODE: u8 = 0x01;
    pub const FRF_MSB: u8 = 0x06;
    pub const FRF_MID: u8 = 0x07;
    pub const FRF_LSB: u8 = 0x08;
    pub const PA_CONFIG: u8 = 0x09;
    pub const FIFO_ADDR_PTR: u8 = 0x0D;
    pub const FIFO_TX_BASE_ADDR: u8 = 0x0E;
    pub const FIFO_RX_BASE_ADDR: u8 = 0x0F;
    pub const FIFO_RX_CURRENT_ADDR: u8 = 0x10;
    pub const IRQ_FLAGS: u8 = 0x12;
    pub const RX_NB_BYTES: u8 = 0x13;
    pub const PKT_SNR_VALUE: u8 = 0x19;
    pub const PKT_RSSI_VALUE: u8 = 0x1A;
    pub const MODEM_CONFIG1: u8 = 0x1D;
    pub const MODEM_CONFIG2: u8 = 0x1E;
    pub const PREAMBLE_MSB: u8 = 0x20;
    pub const PREAMBLE_LSB: u8 = 0x21;
    pub const PAYLOAD_LENGTH: u8 = 0x22;
    pub const MODEM_CONFIG3: u8 = 0x26;
    pub const DIO_MAPPING1: u8 = 0x40;
    pub const VERSION: u8 = 0x42;
    pub const PA_DAC: u8 = 0x4D;
}

/// Silicon revision reported by the SX1276
const VERSION_SX1276: u8 = 0x12;

const WRITE: u8 = 0x80;

// OP_MODE values
const MODE_LONG_RANGE: u8 = 0x80;
const MODE_SLEEP: u8 = 0x00;
const MODE_STDBY: u8 = 0x01;
const MODE_TX: u8 = 0x03;
const MODE_RXCONTINUOUS: u8 = 0x05;

// IRQ_FLAGS bits
const IRQ_RX_DONE: u8 = 0x40;
const IRQ_PAYLOAD_CRC_ERROR: u8 = 0x20;
const IRQ_TX_DONE: u8 = 0x08;

const PA_SELECT: u8 = 0x80;
const PA_DAC_ENABLE: u8 = 0x87;
const PA_DAC_DISABLE: u8 = 0x84;

/// Crystal frequency
const FXOSC_HZ: u64 = 32_000_000;

/// RSSI offset on the high-frequency port
const RSSI_OFFSET_HF: i16 = -157;

/// Modulation settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ModemConfig {
    pub frequency_khz: u32,
    pub tx_power_dbm: i8,
    pub bandwidth_hz: u32,
    pub spreading_factor: u8,
    /// Denominator of the 4/x coding rate
    pub coding_rate: u8,
    pub preamble_len: u16,
}

impl Default for ModemConfig {
    fn default() -> Self {
        Self {
            frequency_khz: 902_300,
            tx_power_dbm: 13,
            bandwidth_hz: 125_000,
            spreading_factor: 10,
            coding_rate: 5,
            preamble_len: 8,
        }
    }
}

impl ModemConfig {
    /// FRF register value for the carrier
    pub fn frf(&self) -> u32 {
        (((u64::from(self.frequency_khz) * 1000) << 19) / FXOSC_HZ) as u32
    }

    fn bandwidth_bits(&self) -> u8 {
        match self.bandwidth_hz {
            0..=7_800 => 0,
            7_801..=10_400 => 1,
            10_401..=15_600 => 2,
            15_601..=20_800 => 3,
            20_801..=31_250 => 4,
            31_251..=41_700 => 5,
            41_701..=62_500 => 6,
            62_501..=125_000 => 7,
            125_001..=250_000 => 8,
            _ => 9,
        }
    }

    /// Register values for MODEM_CONFIG1..3
    pub fn modem_registers(&self) -> [u8; 3] {
        let sf = self.spreading_factor.clamp(6, 12);
        let cr = self.coding_rate.clamp(5, 8) - 4;
        let config1 = (self.bandwidth_bits() << 4) | (cr << 1);
        // RX payload CRC on
        let config2 = (sf << 4) | 0x04;
        // Symbols longer than 16 ms need low data rate optimization
        let symbol_us = (1u32 << sf) * 1_000_000 / self.bandwidth_hz.max(1);
        let ldro = if symbol_us > 16_000 { 0x08 } else { 0x00 };
        // AGC auto on
        let config3 = ldro | 0x04;
        [config1, config2, config3]
    }

    /// PA_CONFIG and PA_DAC values for the output power on PA_BOOST
    pub fn pa_registers(&self) -> [u8; 2] {
        let power = self.tx_power_dbm.clamp(2, 20);
        if power > 17 {
            [PA_SELECT | (power - 5) as u8, PA_DAC_ENABLE]
        } else {
            [PA_SELECT | (power - 2) as u8, PA_DAC_DISABLE]
        }
    }
}

/// SX1276 driver
pub struct Sx1276<SPI> {
    spi: SPI,
    stats: LinkStats,
}

impl<SPI: SpiDevice> Sx1276<SPI> {
    pub fn new(spi: SPI) -> Self {
        Self {
            spi,
            stats: LinkStats::default(),
        }
    }

    fn read_reg(&mut self, addr: u8) -> Result<u8, RadioError> {
        let mut buf = [addr & !WRITE, 0];
        self.spi
            .transfer_in_place(&mut buf)
            .map_err(|_| RadioError::Bus)?;
        Ok(buf[1])
    }

    fn write_reg(&mut self, addr: u8, value: u8) -> Result<(), RadioError> {
        self.spi
            .write(&[addr | WRITE, value])
            .map_err(|_| RadioError::Bus)
    }

    fn set_mode(&mut self, mode: u8) -> Result<(), RadioError> {
        self.write_reg(reg::OP_MODE, MODE_LONG_RANGE | mode)
    }

    /// Verify the chip and configure it, ending in continuous receive
    pub fn init(&mut self, config: &ModemConfig) -> Result<(), RadioError> {
        if self.read_reg(reg::VERSION)? != VERSION_SX1276 {
            return Err(RadioError::NotFound);
        }

        // LoRa mode can only be selected in sleep
        self.set_mode(MODE_SLEEP)?;
        self.write_reg(reg::FIFO_TX_BASE_ADDR, 0)?;
        self.write_reg(reg::FIFO_RX_BASE_ADDR, 0)?;
        self.set_mode(MODE_STDBY)?;

        let frf = config.frf();
        self.write_reg(reg::FRF_MSB, (frf >> 16) as u8)?;
        self.write_reg(reg::FRF_MID, (frf >> 8) as u8)?;
        self.write_reg(reg::FRF_LSB, frf as u8)?;

        let [config1, config2, config3] = config.modem_registers();
        self.write_reg(reg::MODEM_CONFIG1, config1)?;
        self.write_reg(reg::MODEM_CONFIG2, config2)?;
        self.write_reg(reg::MODEM_CONFIG3, config3)?;

        self.write_reg(reg::PREAMBLE_MSB, (config.preamble_len >> 8) as u8)?;
        self.write_reg(reg::PREAMBLE_LSB, config.preamble_len as u8)?;

        let [pa_config, pa_dac] = config.pa_registers();
        self.write_reg(reg::PA_DAC, pa_dac)?;
        self.write_reg(reg::PA_CONFIG, pa_config)?;

        self.start_receive()
    }
}

impl<SPI: SpiDevice> Modem for Sx1276<SPI> {
    fn transmit(&mut self, frame: &[u8]) -> Result<(), RadioError> {
        if frame.len() > MAX_FRAME_LEN {
            return Err(RadioError::PayloadTooLarge);
        }
        self.set_mode(MODE_STDBY)?;
        self.write_reg(reg::FIFO_ADDR_PTR, 0)?;
        self.spi
            .transaction(&mut [
                Operation::Write(&[reg::FIFO | WRITE]),
                Operation::Write(frame),
            ])
            .map_err(|_| RadioError::Bus)?;
        self.write_reg(reg::PAYLOAD_LENGTH, frame.len() as u8)?;
        // DIO0 = TX done
        self.write_reg(reg::DIO_MAPPING1, 0x40)?;
        self.set_mode(MODE_TX)
    }

    fn tx_done(&mut self) -> Result<bool, RadioError> {
        let flags = self.read_reg(reg::IRQ_FLAGS)?;
        if flags & IRQ_TX_DONE == 0 {
            return Ok(false);
        }
        self.write_reg(reg::IRQ_FLAGS, 0xFF)?;
        self.set_mode(MODE_STDBY)?;
        Ok(true)
    }

    fn start_receive(&mut self) -> Result<(), RadioError> {
        // DIO0 = RX done
        self.write_reg(reg::DIO_MAPPING1, 0x00)?;
        self.set_mode(MODE_RXCONTINUOUS)
    }

    fn poll_receive(&mut self, buf: &mut [u8; MAX_FRAME_LEN]) -> Result<Option<usize>, RadioError> {
        let flags = self.read_reg(reg::IRQ_FLAGS)?;
        if flags & IRQ_RX_DONE == 0 {
            return Ok(None);
        }
        self.write_reg(reg::IRQ_FLAGS, 0xFF)?;

        if flags & IRQ_PAYLOAD_CRC_ERROR != 0 {
            self.stats.rx_bad = self.stats.rx_bad.wrapping_add(1);
            return Ok(None);
        }

        let len = usize::from(self.read_reg(reg::RX_NB_BYTES)?);
        let start = self.read_reg(reg::FIFO_RX_CURRENT_ADDR)?;
        self.write_reg(reg::FIFO_ADDR_PTR, start)?;
        self.spi
            .transaction(&mut [
                Operation::Write(&[reg::FIFO & !WRITE]),
                Operation::Read(&mut buf[..len]),
            ])
            .map_err(|_| RadioError::Bus)?;

        let snr = self.read_reg(reg::PKT_SNR_VALUE)? as i8;
        let rssi = self.read_reg(reg::PKT_RSSI_VALUE)?;
        self.stats.snr_db = snr / 4;
        self.stats.rssi_dbm = RSSI_OFFSET_HF + i16::from(rssi);
        self.stats.rx_good = self.stats.rx_good.wrapping_add(1);
        Ok(Some(len))
    }

    fn link_stats(&self) -> LinkStats {
        self.stats
    }
}
