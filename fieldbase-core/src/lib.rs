//! Board-agnostic core logic for the base station
//!
//! This crate contains all receive-and-relay logic that does not depend on
//! specific hardware implementations:
//!
//! - Bus arbiter for the SPI bus shared by radio and SD card
//! - Message classifier for inbound datagrams
//! - Append-only data log with storage health tracking
//! - Report and timestamp formatting
//! - Dispatch state machine and the dispatcher that drives it
//! - Station configuration and its TOML parser

#![no_std]
#![deny(unsafe_code)]

pub mod bus;
pub mod classify;
pub mod config;
pub mod datalog;
pub mod dispatch;
pub mod report;
pub mod time;

#[cfg(test)]
pub(crate) mod mocks;

pub use bus::{BusArbiter, Peripheral};
pub use classify::{classify, MessageKind};
pub use datalog::{DataLog, LogWrite};
pub use dispatch::{DispatchEvent, DispatchState, Dispatcher, StartupReport, StepOutcome};
