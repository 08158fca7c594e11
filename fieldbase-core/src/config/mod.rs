//! Station configuration
//!
//! Typed settings with deployed defaults, plus a parser for the
//! `station.toml` file embedded in the firmware.

pub mod parse;
pub mod types;

pub use parse::{parse_config, ParseError};
pub use types::*;
