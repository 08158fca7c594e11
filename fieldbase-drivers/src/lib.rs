//! Hardware driver implementations
//!
//! This crate provides concrete implementations of the traits defined
//! in fieldbase-hal and fieldbase-display for the base station's parts:
//!
//! - Real-time clock (DS3231)
//! - LoRa modem (SX1276 / RFM95) and a reliable datagram manager on top
//! - TFT panel (ST7735) and a text surface over any embedded-graphics target

#![no_std]
#![deny(unsafe_code)]

pub mod display;
pub mod radio;
pub mod rtc;
