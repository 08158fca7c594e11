//! Display surface trait
//!
//! Defines the drawing primitives the ring needs from a panel driver.

/// Display surface errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DisplayError {
    /// Communication error with display
    Communication,
    /// Invalid coordinates or dimensions
    InvalidCoordinates,
    /// Display not initialized
    NotInitialized,
}

/// Colors used on the status panel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Color {
    Black,
    White,
    Red,
    Green,
}

/// Text-oriented display surface
///
/// Mirrors a cursor-based TFT text API: position the cursor, pick a color
/// and size, then print. Pixel coordinates are measured from the top left.
pub trait DisplaySurface {
    /// Fill the whole panel with `color`
    fn clear_screen(&mut self, color: Color) -> Result<(), DisplayError>;

    /// Move the text cursor to pixel position (`x`, `y`)
    fn set_cursor(&mut self, x: u16, y: u16);

    /// Set the color for subsequent text
    fn set_text_color(&mut self, color: Color);

    /// Set the text scale factor (1 = native font size)
    fn set_text_size(&mut self, size: u8);

    /// Draw a horizontal line `width` pixels long
    fn draw_hline(&mut self, x: u16, y: u16, width: u16, color: Color) -> Result<(), DisplayError>;

    /// Print `text` at the cursor and move the cursor to the next line
    fn println(&mut self, text: &str) -> Result<(), DisplayError>;

    /// Panel width in pixels
    fn width(&self) -> u16;
}

impl<T: DisplaySurface + ?Sized> DisplaySurface for &mut T {
    fn clear_screen(&mut self, color: Color) -> Result<(), DisplayError> {
        (**self).clear_screen(color)
    }

    fn set_cursor(&mut self, x: u16, y: u16) {
        (**self).set_cursor(x, y)
    }

    fn set_text_color(&mut self, color: Color) {
        (**self).set_text_color(color)
    }

    fn set_text_size(&mut self, size: u8) {
        (**self).set_text_size(size)
    }

    fn draw_hline(&mut self, x: u16, y: u16, width: u16, color: Color) -> Result<(), DisplayError> {
        (**self).draw_hline(x, y, width, color)
    }

    fn println(&mut self, text: &str) -> Result<(), DisplayError> {
        (**self).println(text)
    }

    fn width(&self) -> u16 {
        (**self).width()
    }
}
