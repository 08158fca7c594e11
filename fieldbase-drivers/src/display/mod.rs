//! Status panel
//!
//! [`St7735`] is a pixel driver for the 1.8" 160x128 TFT. [`TextPanel`]
//! turns any embedded-graphics RGB565 target into the cursor-based text
//! surface the display ring draws on.

pub mod st7735;
pub mod text;

pub use st7735::St7735;
pub use text::TextPanel;
