//! Record definitions
//!
//! Sizes are part of the wire contract. The base station tells the legacy
//! [`DataPacket`] apart from everything else purely by length, so no tagged
//! record may ever be [`DATA_PACKET_SIZE`] bytes long. The assertions below
//! hold that line at compile time.

use core::fmt::Write;

use heapless::String;

use crate::kind::{MSG_DATA, MSG_JOIN_REQUEST, MSG_TEXT, MSG_TIME_REQUEST, MSG_TIME_RESPONSE};
use crate::wire::{Reader, Writer};

/// Legacy untagged sensor reading
pub const DATA_PACKET_SIZE: usize = 18;

/// Tagged sensor reading
pub const DATA_MESSAGE_SIZE: usize = 1 + DATA_PACKET_SIZE;

/// Capacity of the text field in a [`TextMessage`]
pub const TEXT_LEN: usize = 64;

/// Tagged operator text
pub const TEXT_MESSAGE_SIZE: usize = 2 + TEXT_LEN;

/// Tagged join request
pub const JOIN_REQUEST_SIZE: usize = 1 + 8;

/// Tagged time request
pub const TIME_REQUEST_SIZE: usize = 2;

/// Tagged time response
pub const TIME_RESPONSE_SIZE: usize = 2 + 4;

const _: () = assert!(DATA_MESSAGE_SIZE != DATA_PACKET_SIZE);
const _: () = assert!(TEXT_MESSAGE_SIZE != DATA_PACKET_SIZE);
const _: () = assert!(JOIN_REQUEST_SIZE != DATA_PACKET_SIZE);
const _: () = assert!(TIME_REQUEST_SIZE != DATA_PACKET_SIZE);
const _: () = assert!(TIME_RESPONSE_SIZE != DATA_PACKET_SIZE);

/// Capacity of a record rendered as text
pub const RECORD_TEXT_LEN: usize = 160;

/// Text form of a record
pub type RecordText = String<RECORD_TEXT_LEN>;

/// Column names for the non-pretty text of data records
pub const LOG_HEADER: &str = "Node, Message, Time, Battery V, Last TX Dur ms, Temp C, Hum %, Status";

/// Errors that can occur while encoding or parsing records
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CodecError {
    /// Buffer is shorter than the record
    TooShort { expected: usize, actual: usize },
    /// Tag byte names a different record
    WrongType { expected: u8, actual: u8 },
    /// Output buffer too small for encoding
    BufferTooSmall,
}

fn check_len(buf: &[u8], size: usize) -> Result<(), CodecError> {
    if buf.len() < size {
        return Err(CodecError::TooShort {
            expected: size,
            actual: buf.len(),
        });
    }
    Ok(())
}

fn check_tag(buf: &[u8], size: usize, tag: u8) -> Result<(), CodecError> {
    check_len(buf, size)?;
    if buf[0] != tag {
        return Err(CodecError::WrongType {
            expected: tag,
            actual: buf[0],
        });
    }
    Ok(())
}

fn writer(buf: &mut [u8], size: usize) -> Result<Writer<'_>, CodecError> {
    if buf.len() < size {
        return Err(CodecError::BufferTooSmall);
    }
    Ok(Writer::new(buf))
}

/// Sensor values shared by [`DataPacket`] and [`DataMessage`]
///
/// Scaled integers as transmitted by the leaf node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Reading {
    /// Leaf node address
    pub node: u8,
    /// Leaf node's message counter
    pub message: u32,
    /// Leaf node's clock (epoch seconds)
    pub time: u32,
    /// Battery voltage (centivolts)
    pub battery: u16,
    /// Duration of the previous transmission (ms)
    pub last_tx_duration: u16,
    /// Temperature (centidegrees Celsius)
    pub temp: i16,
    /// Relative humidity (hundredths of a percent)
    pub humidity: u16,
    /// Leaf node status bits
    pub status: u8,
}

impl Reading {
    fn read(r: &mut Reader<'_>) -> Self {
        Self {
            node: r.u8(),
            message: r.u32(),
            time: r.u32(),
            battery: r.u16(),
            last_tx_duration: r.u16(),
            temp: r.i16(),
            humidity: r.u16(),
            status: r.u8(),
        }
    }

    fn write(&self, w: &mut Writer<'_>) {
        w.u8(self.node);
        w.u32(self.message);
        w.u32(self.time);
        w.u16(self.battery);
        w.u16(self.last_tx_duration);
        w.i16(self.temp);
        w.u16(self.humidity);
        w.u8(self.status);
    }

    /// Battery voltage in volts
    pub fn battery_volts(&self) -> f32 {
        f32::from(self.battery) / 100.0
    }

    /// Temperature in degrees Celsius
    pub fn temp_c(&self) -> f32 {
        f32::from(self.temp) / 100.0
    }

    /// Relative humidity in percent
    pub fn humidity_pct(&self) -> f32 {
        f32::from(self.humidity) / 100.0
    }

    /// Render the reading as text
    ///
    /// The non-pretty form follows the column order of [`LOG_HEADER`].
    pub fn to_text(&self, pretty: bool) -> RecordText {
        let mut s = RecordText::new();
        let _ = if pretty {
            write!(
                s,
                "node: {}, message: {}, time: {}, battery: {:.2} V, last tx: {} ms, temp: {:.2} C, humidity: {:.2} %, status: 0x{:02x}",
                self.node,
                self.message,
                self.time,
                self.battery_volts(),
                self.last_tx_duration,
                self.temp_c(),
                self.humidity_pct(),
                self.status
            )
        } else {
            write!(
                s,
                "{}, {}, {}, {:.2}, {}, {:.2}, {:.2}, 0x{:02x}",
                self.node,
                self.message,
                self.time,
                self.battery_volts(),
                self.last_tx_duration,
                self.temp_c(),
                self.humidity_pct(),
                self.status
            )
        };
        s
    }
}

/// Legacy sensor reading without a type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DataPacket {
    pub reading: Reading,
}

impl DataPacket {
    /// Build a legacy packet around a reading
    pub fn new(reading: Reading) -> Self {
        Self { reading }
    }

    /// Parse a legacy packet
    ///
    /// Only the length is checked; every 18-byte buffer is a packet.
    pub fn parse(buf: &[u8]) -> Result<Self, CodecError> {
        check_len(buf, DATA_PACKET_SIZE)?;
        Ok(Self {
            reading: Reading::read(&mut Reader::new(buf)),
        })
    }

    /// Encode into `buf`, returning the number of bytes written
    pub fn encode(&self, buf: &mut [u8]) -> Result<usize, CodecError> {
        let mut w = writer(buf, DATA_PACKET_SIZE)?;
        self.reading.write(&mut w);
        Ok(w.written())
    }

    /// Encode into a fresh array
    pub fn to_bytes(&self) -> [u8; DATA_PACKET_SIZE] {
        let mut buf = [0u8; DATA_PACKET_SIZE];
        let mut w = Writer::new(&mut buf);
        self.reading.write(&mut w);
        buf
    }

    pub fn to_text(&self, pretty: bool) -> RecordText {
        self.reading.to_text(pretty)
    }
}

/// Tagged sensor reading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DataMessage {
    pub reading: Reading,
}

impl DataMessage {
    /// Build a data message around a reading
    pub fn new(reading: Reading) -> Self {
        Self { reading }
    }

    pub fn parse(buf: &[u8]) -> Result<Self, CodecError> {
        check_tag(buf, DATA_MESSAGE_SIZE, MSG_DATA)?;
        let mut r = Reader::new(buf);
        r.skip(1);
        Ok(Self {
            reading: Reading::read(&mut r),
        })
    }

    pub fn encode(&self, buf: &mut [u8]) -> Result<usize, CodecError> {
        let mut w = writer(buf, DATA_MESSAGE_SIZE)?;
        w.u8(MSG_DATA);
        self.reading.write(&mut w);
        Ok(w.written())
    }

    pub fn to_bytes(&self) -> [u8; DATA_MESSAGE_SIZE] {
        let mut buf = [0u8; DATA_MESSAGE_SIZE];
        let mut w = Writer::new(&mut buf);
        w.u8(MSG_DATA);
        self.reading.write(&mut w);
        buf
    }

    pub fn to_text(&self, pretty: bool) -> RecordText {
        self.reading.to_text(pretty)
    }
}

/// Free-form text from a leaf node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextMessage {
    /// Sender address
    pub node: u8,
    /// Text, at most [`TEXT_LEN`] bytes
    pub text: String<TEXT_LEN>,
}

impl TextMessage {
    /// Build a text message, truncating `text` at a character boundary
    pub fn new(node: u8, text: &str) -> Self {
        let mut s = String::new();
        for ch in text.chars() {
            if s.push(ch).is_err() {
                break;
            }
        }
        Self { node, text: s }
    }

    /// Parse a text message
    ///
    /// The text ends at the first NUL. Bytes that are not valid UTF-8 end it
    /// early rather than rejecting the record.
    pub fn parse(buf: &[u8]) -> Result<Self, CodecError> {
        check_tag(buf, TEXT_MESSAGE_SIZE, MSG_TEXT)?;
        let mut r = Reader::new(buf);
        r.skip(1);
        let node = r.u8();
        let raw: [u8; TEXT_LEN] = r.bytes();

        let end = raw.iter().position(|&b| b == 0).unwrap_or(TEXT_LEN);
        let valid = match core::str::from_utf8(&raw[..end]) {
            Ok(s) => s,
            Err(e) => core::str::from_utf8(&raw[..e.valid_up_to()]).unwrap_or(""),
        };

        let mut text = String::new();
        let _ = text.push_str(valid);
        Ok(Self { node, text })
    }

    pub fn encode(&self, buf: &mut [u8]) -> Result<usize, CodecError> {
        let mut w = writer(buf, TEXT_MESSAGE_SIZE)?;
        w.u8(MSG_TEXT);
        w.u8(self.node);
        let mut raw = [0u8; TEXT_LEN];
        raw[..self.text.len()].copy_from_slice(self.text.as_bytes());
        w.put(&raw);
        Ok(w.written())
    }

    pub fn to_text(&self, pretty: bool) -> RecordText {
        let mut s = RecordText::new();
        let _ = if pretty {
            write!(s, "node: {}, text: {}", self.node, self.text.as_str())
        } else {
            write!(s, "{}, {}", self.node, self.text.as_str())
        };
        s
    }
}

/// Registration request carrying a device EUI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct JoinRequest {
    /// 64-bit device identifier
    pub dev_eui: u64,
}

impl JoinRequest {
    pub fn new(dev_eui: u64) -> Self {
        Self { dev_eui }
    }

    pub fn parse(buf: &[u8]) -> Result<Self, CodecError> {
        check_tag(buf, JOIN_REQUEST_SIZE, MSG_JOIN_REQUEST)?;
        let mut r = Reader::new(buf);
        r.skip(1);
        Ok(Self { dev_eui: r.u64() })
    }

    pub fn encode(&self, buf: &mut [u8]) -> Result<usize, CodecError> {
        let mut w = writer(buf, JOIN_REQUEST_SIZE)?;
        w.u8(MSG_JOIN_REQUEST);
        w.u64(self.dev_eui);
        Ok(w.written())
    }

    pub fn to_text(&self, pretty: bool) -> RecordText {
        let mut s = RecordText::new();
        let _ = if pretty {
            write!(s, "join request, dev eui: 0x{:016x}", self.dev_eui)
        } else {
            write!(s, "0x{:016x}", self.dev_eui)
        };
        s
    }
}

/// Leaf node asking for the current time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TimeRequest {
    /// Requesting node address
    pub node: u8,
}

impl TimeRequest {
    pub fn new(node: u8) -> Self {
        Self { node }
    }

    pub fn parse(buf: &[u8]) -> Result<Self, CodecError> {
        check_tag(buf, TIME_REQUEST_SIZE, MSG_TIME_REQUEST)?;
        Ok(Self { node: buf[1] })
    }

    pub fn encode(&self, buf: &mut [u8]) -> Result<usize, CodecError> {
        let mut w = writer(buf, TIME_REQUEST_SIZE)?;
        w.u8(MSG_TIME_REQUEST);
        w.u8(self.node);
        Ok(w.written())
    }

    pub fn to_text(&self, pretty: bool) -> RecordText {
        let mut s = RecordText::new();
        let _ = if pretty {
            write!(s, "node: {}, time request", self.node)
        } else {
            write!(s, "{}, time request", self.node)
        };
        s
    }
}

/// Base station's answer to a [`TimeRequest`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TimeResponse {
    /// Address of the answering base station
    pub node: u8,
    /// Current time (epoch seconds)
    pub time: u32,
}

impl TimeResponse {
    pub fn new(node: u8, time: u32) -> Self {
        Self { node, time }
    }

    pub fn parse(buf: &[u8]) -> Result<Self, CodecError> {
        check_tag(buf, TIME_RESPONSE_SIZE, MSG_TIME_RESPONSE)?;
        let mut r = Reader::new(buf);
        r.skip(1);
        Ok(Self {
            node: r.u8(),
            time: r.u32(),
        })
    }

    pub fn encode(&self, buf: &mut [u8]) -> Result<usize, CodecError> {
        let mut w = writer(buf, TIME_RESPONSE_SIZE)?;
        w.u8(MSG_TIME_RESPONSE);
        w.u8(self.node);
        w.u32(self.time);
        Ok(w.written())
    }

    pub fn to_bytes(&self) -> [u8; TIME_RESPONSE_SIZE] {
        let mut buf = [0u8; TIME_RESPONSE_SIZE];
        let mut w = Writer::new(&mut buf);
        w.u8(MSG_TIME_RESPONSE);
        w.u8(self.node);
        w.u32(self.time);
        buf
    }

    pub fn to_text(&self, pretty: bool) -> RecordText {
        let mut s = RecordText::new();
        let _ = if pretty {
            write!(s, "node: {}, time: {}", self.node, self.time)
        } else {
            write!(s, "{}, {}", self.node, self.time)
        };
        s
    }
}
