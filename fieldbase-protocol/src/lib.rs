//! Leaf Node Record Codec
//!
//! This crate defines the fixed-size binary records exchanged between leaf
//! sensor nodes and the base station over the LoRa link. Every record is
//! packed little-endian and, except for the legacy data packet, starts with
//! a one-byte type tag:
//!
//! ```text
//! ┌─────┬──────────────────────────────┐
//! │ TAG │ FIELDS (fixed per record)    │
//! │ 1B  │ 1–65B                        │
//! └─────┴──────────────────────────────┘
//! ```
//!
//! The legacy [`DataPacket`] predates the tag byte and is recognized only by
//! its exact length, [`DATA_PACKET_SIZE`].
//!
//! Each record offers a constructor (build), `parse` from bytes, `encode`
//! to bytes and `to_text(pretty)`. Non-pretty text is the comma-separated
//! form written to the station log; pretty text is the labelled form shown
//! to the operator.

#![no_std]
#![deny(unsafe_code)]

pub mod kind;
pub mod records;
mod wire;

pub use kind::{
    MessageType, MSG_DATA, MSG_JOIN_REQUEST, MSG_TEXT, MSG_TIME_REQUEST, MSG_TIME_RESPONSE,
    TAG_OFFSET,
};
pub use records::{
    CodecError, DataMessage, DataPacket, JoinRequest, Reading, RecordText, TextMessage,
    TimeRequest, TimeResponse, DATA_MESSAGE_SIZE, DATA_PACKET_SIZE, JOIN_REQUEST_SIZE,
    LOG_HEADER, RECORD_TEXT_LEN, TEXT_LEN, TEXT_MESSAGE_SIZE, TIME_REQUEST_SIZE,
    TIME_RESPONSE_SIZE,
};
