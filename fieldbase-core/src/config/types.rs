//! Configuration type definitions

use fieldbase_hal::{AckPolicy, BROADCAST_ADDRESS};
use heapless::String;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::datalog::MAX_FILE_NAME_LEN;

/// LoRa bandwidths supported by the SX127x modem (Hz)
pub const BANDWIDTHS_HZ: [u32; 10] = [
    7_800, 10_400, 15_600, 20_800, 31_250, 41_700, 62_500, 125_000, 250_000, 500_000,
];

/// Configuration validation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Station address is the broadcast address
    InvalidAddress,
    /// Log file name is not a valid 8.3 name
    InvalidFileName,
    /// Carrier outside the modem's range
    InvalidFrequency,
    /// Transmit power outside 2..=20 dBm
    InvalidTxPower,
    /// Bandwidth not one of [`BANDWIDTHS_HZ`]
    InvalidBandwidth,
    /// Spreading factor outside 6..=12
    InvalidSpreadingFactor,
    /// Coding rate denominator outside 5..=8
    InvalidCodingRate,
    /// Acknowledgement timeout of zero or over ten seconds
    InvalidAckTimeout,
}

/// Radio modem and reliable-delivery settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RadioConfig {
    /// Carrier frequency (kHz)
    pub frequency_khz: u32,
    /// Transmit power (dBm)
    pub tx_power_dbm: i8,
    /// Signal bandwidth (Hz)
    pub bandwidth_hz: u32,
    /// Spreading factor (chips per symbol, log2)
    pub spreading_factor: u8,
    /// Coding rate denominator (4/x)
    pub coding_rate: u8,
    /// Acknowledgement wait per attempt (ms)
    pub ack_timeout_ms: u32,
    /// Retransmissions after the first attempt
    pub retries: u8,
}

impl Default for RadioConfig {
    fn default() -> Self {
        Self {
            frequency_khz: 902_300,
            tx_power_dbm: 13,
            bandwidth_hz: 125_000,
            spreading_factor: 10,
            coding_rate: 5,
            ack_timeout_ms: 400,
            retries: 3,
        }
    }
}

impl RadioConfig {
    /// Acknowledgement budget for reliable sends
    pub fn ack_policy(&self) -> AckPolicy {
        AckPolicy {
            timeout_ms: self.ack_timeout_ms,
            retries: self.retries,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(137_000..=1_020_000).contains(&self.frequency_khz) {
            return Err(ConfigError::InvalidFrequency);
        }
        if !(2..=20).contains(&self.tx_power_dbm) {
            return Err(ConfigError::InvalidTxPower);
        }
        if !BANDWIDTHS_HZ.contains(&self.bandwidth_hz) {
            return Err(ConfigError::InvalidBandwidth);
        }
        if !(6..=12).contains(&self.spreading_factor) {
            return Err(ConfigError::InvalidSpreadingFactor);
        }
        if !(5..=8).contains(&self.coding_rate) {
            return Err(ConfigError::InvalidCodingRate);
        }
        if !(1..=10_000).contains(&self.ack_timeout_ms) {
            return Err(ConfigError::InvalidAckTimeout);
        }
        Ok(())
    }
}

/// Real-time clock settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ClockConfig {
    /// Set the clock to the firmware build time at every boot
    pub adjust_on_boot: bool,
}

/// Complete base station configuration
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StationConfig {
    /// This station's radio address
    pub address: u8,
    /// Data log file name
    pub log_file: String<MAX_FILE_NAME_LEN>,
    /// Answer every reading with the current epoch time
    pub reply_to_data: bool,
    pub radio: RadioConfig,
    pub clock: ClockConfig,
}

impl Default for StationConfig {
    fn default() -> Self {
        let mut log_file = String::new();
        let _ = log_file.push_str("SENSORS.CSV");
        Self {
            address: 0,
            log_file,
            reply_to_data: false,
            radio: RadioConfig::default(),
            clock: ClockConfig::default(),
        }
    }
}

impl StationConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.address == BROADCAST_ADDRESS {
            return Err(ConfigError::InvalidAddress);
        }
        if !is_short_file_name(&self.log_file) {
            return Err(ConfigError::InvalidFileName);
        }
        self.radio.validate()
    }
}

/// Check for an 8.3 name: 1-8 name characters, optional 1-3 character
/// extension, letters, digits and `_-` only
fn is_short_file_name(name: &str) -> bool {
    let (stem, ext) = match name.split_once('.') {
        Some((stem, ext)) => (stem, Some(ext)),
        None => (name, None),
    };
    let valid = |part: &str, max: usize| {
        !part.is_empty()
            && part.len() <= max
            && part
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
    };
    valid(stem, 8) && ext.map_or(true, |ext| valid(ext, 3))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = StationConfig::default();
        assert_eq!(config.log_file.as_str(), "SENSORS.CSV");
        assert_eq!(config.radio.frequency_khz, 902_300);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_ack_policy() {
        let policy = RadioConfig::default().ack_policy();
        assert_eq!(policy, AckPolicy::default());
    }

    #[test]
    fn test_file_names() {
        assert!(is_short_file_name("SENSORS.CSV"));
        assert!(is_short_file_name("LOG"));
        assert!(!is_short_file_name("SENSORS.CSVX"));
        assert!(!is_short_file_name(".CSV"));
        assert!(!is_short_file_name("A.B.C"));
        assert!(!is_short_file_name("BAD NAME.TXT"));
    }

    #[test]
    fn test_radio_ranges() {
        let mut radio = RadioConfig::default();
        radio.spreading_factor = 13;
        assert_eq!(radio.validate(), Err(ConfigError::InvalidSpreadingFactor));

        let mut radio = RadioConfig::default();
        radio.bandwidth_hz = 100_000;
        assert_eq!(radio.validate(), Err(ConfigError::InvalidBandwidth));

        let mut config = StationConfig::default();
        config.address = BROADCAST_ADDRESS;
        assert_eq!(config.validate(), Err(ConfigError::InvalidAddress));
    }
}
