//! Fieldbase Hardware Abstraction Layer
//!
//! This crate defines the traits the base station core uses to talk to its
//! collaborators. Board crates and drivers implement them; the core never
//! touches a register directly.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  fieldbase-firmware (board bring-up)    │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  fieldbase-core (dispatch, arbiter)     │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  fieldbase-hal (this crate - traits)    │
//! └─────────────────────────────────────────┘
//!                     ▲
//!         ┌───────────┴───────────┐
//! ┌───────────────┐       ┌───────────────┐
//! │ fieldbase-    │       │ SD card log   │
//! │   drivers     │       │ (firmware)    │
//! └───────────────┘       └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`gpio::OutputPin`] - Chip-select and indicator lines
//! - [`radio::RadioTransport`] - Reliable datagram radio
//! - [`storage::LogStorage`] - Append-only text log
//! - [`clock::Clock`] - Real-time clock

#![no_std]
#![deny(unsafe_code)]

pub mod clock;
pub mod gpio;
pub mod radio;
pub mod storage;

// Re-export key traits at crate root for convenience
pub use clock::{Clock, ClockError, DateTime, LAST_UNIXTIME};
pub use gpio::OutputPin;
pub use radio::{
    AckPolicy, DeliveryReport, LinkStats, RadioError, RadioTransport, Received, BROADCAST_ADDRESS,
    MAX_MESSAGE_LEN,
};
pub use storage::{LogStorage, StorageError};
