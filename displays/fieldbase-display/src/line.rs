//! Status panel rows

use core::fmt::Write;

use fieldbase_protocol::Reading;
use heapless::String;

/// Maximum characters per line
pub const LINE_LEN: usize = 40;

/// One formatted row of the status panel
///
/// Immutable once built. Text longer than [`LINE_LEN`] is truncated.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DisplayLine {
    text: String<LINE_LEN>,
}

impl DisplayLine {
    /// Build a line from arbitrary text
    pub fn new(text: &str) -> Self {
        let mut s = String::new();
        for ch in text.chars() {
            if s.push(ch).is_err() {
                break;
            }
        }
        Self { text: s }
    }

    /// Build the row for a sensor reading
    ///
    /// Columns follow the panel header: node, receipt `mm:ss`, temperature
    /// (°C, one decimal), humidity (whole percent), battery (V) and status.
    pub fn reading(reading: &Reading, minute: u8, second: u8) -> Self {
        let mut s = String::new();
        let _ = write!(
            s,
            "{} {:02}:{:02} {:3.1} {} {:3.2} 0x{:02x}",
            reading.node,
            minute,
            second,
            reading.temp_c(),
            reading.humidity / 100,
            reading.battery_volts(),
            reading.status
        );
        Self { text: s }
    }

    /// Build a raw hex dump of an unrecognized datagram
    ///
    /// Bytes that do not fit are dropped.
    pub fn hex_dump(bytes: &[u8]) -> Self {
        let mut s: String<LINE_LEN> = String::new();
        let _ = s.push_str("raw");
        for b in bytes {
            if s.len() + 3 > LINE_LEN {
                break;
            }
            let _ = write!(s, " {:02x}", b);
        }
        Self { text: s }
    }

    pub fn as_str(&self) -> &str {
        self.text.as_str()
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for DisplayLine {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{=str}", self.text.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ones() -> Reading {
        Reading {
            node: 1,
            message: 1,
            time: 1,
            battery: 1,
            last_tx_duration: 1,
            temp: 1,
            humidity: 1,
            status: 1,
        }
    }

    #[test]
    fn test_reading_line() {
        let line = DisplayLine::reading(&ones(), 10, 17);
        assert_eq!(line.as_str(), "1 10:17 0.0 0 0.01 0x01");
    }

    #[test]
    fn test_reading_line_typical_values() {
        let reading = Reading {
            node: 12,
            temp: 2150,
            humidity: 4012,
            battery: 371,
            status: 0xa0,
            ..ones()
        };
        let line = DisplayLine::reading(&reading, 5, 3);
        assert_eq!(line.as_str(), "12 05:03 21.5 40 3.71 0xa0");
    }

    #[test]
    fn test_new_truncates() {
        let long = [b'a'; LINE_LEN + 5];
        let line = DisplayLine::new(core::str::from_utf8(&long).unwrap());
        assert_eq!(line.as_str().len(), LINE_LEN);
    }

    #[test]
    fn test_hex_dump() {
        let line = DisplayLine::hex_dump(&[0xde, 0xad, 0x01]);
        assert_eq!(line.as_str(), "raw de ad 01");

        let long = DisplayLine::hex_dump(&[0xff; 64]);
        assert!(long.as_str().len() <= LINE_LEN);
        assert!(long.as_str().ends_with(" ff"));
    }
}
