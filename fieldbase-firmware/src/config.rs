//! Station configuration
//!
//! The configuration is `station.toml`, embedded at build time and parsed
//! at boot. A file that fails to parse falls back to the defaults.

use defmt::*;
use fieldbase_core::config::{parse_config, RadioConfig, StationConfig};
use fieldbase_drivers::radio::ModemConfig;

/// Embedded configuration (compiled into firmware)
/// Edit station.toml and rebuild to customize
const EMBEDDED_CONFIG: &str = include_str!("../station.toml");

/// Parse the embedded configuration
pub fn load() -> StationConfig {
    match parse_config(EMBEDDED_CONFIG) {
        Ok(config) => {
            info!(
                "Config: address {}, log {}, reply to data {}",
                config.address,
                config.log_file.as_str(),
                config.reply_to_data
            );
            config
        }
        Err(e) => {
            warn!("station.toml rejected ({}), using defaults", e);
            StationConfig::default()
        }
    }
}

/// Modem settings for a radio configuration
pub fn modem_config(radio: &RadioConfig) -> ModemConfig {
    ModemConfig {
        frequency_khz: radio.frequency_khz,
        tx_power_dbm: radio.tx_power_dbm,
        bandwidth_hz: radio.bandwidth_hz,
        spreading_factor: radio.spreading_factor,
        coding_rate: radio.coding_rate,
        ..ModemConfig::default()
    }
}
