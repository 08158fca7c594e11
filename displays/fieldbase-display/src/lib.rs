//! Status panel for the Fieldbase base station
//!
//! This crate provides:
//! - `DisplaySurface` trait over the panel's text and line primitives
//! - `DisplayLine`, one formatted row of the status panel
//! - `DisplayRing`, a fixed-capacity auto-scrolling history of lines
//!
//! # Architecture
//!
//! The ring owns its surface and is the only code that draws on it. Every
//! append redraws the whole panel, so the screen never shows a partial
//! update:
//!
//! ```text
//! ┌──────────────────────────────┐
//! │ Node time  C  %rh bat stat   │  header (red)
//! ├──────────────────────────────┤
//! │ 1 10:17 21.5 40 3.71 0x00    │  oldest (green)
//! │ ...                          │
//! │ 4 10:19 19.0 55 3.90 0x02    │  newest
//! └──────────────────────────────┘
//! ```

#![no_std]
#![deny(unsafe_code)]

pub mod backend;
pub mod line;
pub mod ring;

// Re-export key types
pub use backend::{Color, DisplayError, DisplaySurface};
pub use line::{DisplayLine, LINE_LEN};
pub use ring::{DisplayRing, HEADER, RING_CAPACITY};
