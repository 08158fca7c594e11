//! Parser for `station.toml`
//!
//! A minimal TOML reader covering only what the station file uses. It does
//! NOT support the full TOML grammar.
//!
//! Supported features:
//! - `[section]` headers (`station`, `radio`, `clock`)
//! - Key = value pairs (string, integer, boolean)
//! - Comments (# ...), whole-line or trailing
//!
//! Keys that are not recognized are errors, so a typo never silently falls
//! back to a default. The parsed configuration is validated before it is
//! returned.

use heapless::String;

use super::types::{ConfigError, StationConfig};

/// Parse error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseError {
    /// Section header names no known section
    InvalidSection,
    /// Key is not valid in its section
    UnknownKey,
    /// Line is neither a header nor `key = value`
    InvalidLine,
    /// Value has the wrong type or does not fit
    InvalidValue,
    /// Values parsed but failed validation
    Invalid(ConfigError),
}

impl From<ConfigError> for ParseError {
    fn from(e: ConfigError) -> Self {
        ParseError::Invalid(e)
    }
}

/// Current parsing context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Root,
    Station,
    Radio,
    Clock,
}

/// Parse TOML text into a validated [`StationConfig`]
///
/// Keys that are absent keep their default values.
pub fn parse_config(input: &str) -> Result<StationConfig, ParseError> {
    let mut config = StationConfig::default();
    let mut section = Section::Root;

    for line in input.lines() {
        let line = line.trim();

        // Skip empty lines and comments
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if line.starts_with('[') && line.ends_with(']') {
            section = parse_section_header(&line[1..line.len() - 1])?;
            continue;
        }

        let (key, value) = parse_key_value(line).ok_or(ParseError::InvalidLine)?;
        apply_value(section, key, value, &mut config)?;
    }

    config.validate()?;
    Ok(config)
}

fn parse_section_header(header: &str) -> Result<Section, ParseError> {
    match header.trim() {
        "station" => Ok(Section::Station),
        "radio" => Ok(Section::Radio),
        "clock" => Ok(Section::Clock),
        _ => Err(ParseError::InvalidSection),
    }
}

fn parse_key_value(line: &str) -> Option<(&str, &str)> {
    let eq_pos = line.find('=')?;
    let key = line[..eq_pos].trim();
    let value = line[eq_pos + 1..].trim();

    // Remove inline comments
    let value = if let Some(hash_pos) = value.find('#') {
        // Make sure # is not inside a string
        let quote_count = value[..hash_pos].matches('"').count();
        if quote_count % 2 == 0 {
            value[..hash_pos].trim()
        } else {
            value
        }
    } else {
        value
    };

    if key.is_empty() || value.is_empty() {
        return None;
    }

    Some((key, value))
}

fn parse_string<const N: usize>(value: &str) -> Result<String<N>, ParseError> {
    let inner = if value.starts_with('"') && value.ends_with('"') && value.len() >= 2 {
        &value[1..value.len() - 1]
    } else {
        return Err(ParseError::InvalidValue);
    };
    let mut s = String::new();
    s.push_str(inner).map_err(|_| ParseError::InvalidValue)?;
    Ok(s)
}

fn parse_int<T: core::str::FromStr>(value: &str) -> Result<T, ParseError> {
    if !value.contains('_') {
        return value.parse().map_err(|_| ParseError::InvalidValue);
    }
    let mut digits: String<32> = String::new();
    for c in value.chars().filter(|&c| c != '_') {
        digits.push(c).map_err(|_| ParseError::InvalidValue)?;
    }
    digits.parse().map_err(|_| ParseError::InvalidValue)
}

fn parse_bool(value: &str) -> Result<bool, ParseError> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(ParseError::InvalidValue),
    }
}

fn apply_value(
    section: Section,
    key: &str,
    value: &str,
    config: &mut StationConfig,
) -> Result<(), ParseError> {
    match (section, key) {
        (Section::Station, "address") => config.address = parse_int(value)?,
        (Section::Station, "log_file") => config.log_file = parse_string(value)?,
        (Section::Station, "reply_to_data") => config.reply_to_data = parse_bool(value)?,

        (Section::Radio, "frequency_khz") => config.radio.frequency_khz = parse_int(value)?,
        (Section::Radio, "tx_power_dbm") => config.radio.tx_power_dbm = parse_int(value)?,
        (Section::Radio, "bandwidth_hz") => config.radio.bandwidth_hz = parse_int(value)?,
        (Section::Radio, "spreading_factor") => {
            config.radio.spreading_factor = parse_int(value)?
        }
        (Section::Radio, "coding_rate") => config.radio.coding_rate = parse_int(value)?,
        (Section::Radio, "ack_timeout_ms") => config.radio.ack_timeout_ms = parse_int(value)?,
        (Section::Radio, "retries") => config.radio.retries = parse_int(value)?,

        (Section::Clock, "adjust_on_boot") => config.clock.adjust_on_boot = parse_bool(value)?,

        _ => return Err(ParseError::UnknownKey),
    }
    Ok(())
}
