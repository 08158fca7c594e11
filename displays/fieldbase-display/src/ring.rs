//! Auto-scrolling line history
//!
//! Holds at most `N` lines. Once full, each append evicts the oldest line so
//! the panel always shows the most recent `N`, oldest at the top.

use heapless::HistoryBuffer;

use crate::backend::{Color, DisplayError, DisplaySurface};
use crate::line::DisplayLine;

/// Default number of lines shown below the header
pub const RING_CAPACITY: usize = 11;

/// Column header drawn at the top of the panel
pub const HEADER: &str = "Node time  C  %rh bat stat";

/// Left margin for all text (pixels)
const MARGIN_X: u16 = 2;
/// Header baseline row (pixels)
const HEADER_Y: u16 = 3;
/// Separator row under the header (pixels)
const RULE_Y: u16 = 13;
/// First history row (pixels)
const FIRST_LINE_Y: u16 = 15;
/// Vertical pitch between history rows (pixels)
const LINE_PITCH: u16 = 10;

/// Fixed-capacity scrolling status panel
pub struct DisplayRing<S, const N: usize = RING_CAPACITY> {
    surface: S,
    lines: HistoryBuffer<DisplayLine, N>,
}

impl<S: DisplaySurface, const N: usize> DisplayRing<S, N> {
    /// Create an empty ring drawing onto `surface`
    pub fn new(surface: S) -> Self {
        Self {
            surface,
            lines: HistoryBuffer::new(),
        }
    }

    /// Append a line and redraw the panel
    ///
    /// The line is kept even if the redraw fails.
    pub fn append(&mut self, line: DisplayLine) -> Result<(), DisplayError> {
        self.lines.write(line);
        self.redraw()
    }

    /// Clear the panel and draw the header and every held line, oldest first
    pub fn redraw(&mut self) -> Result<(), DisplayError> {
        self.surface.clear_screen(Color::Black)?;

        self.surface.set_cursor(MARGIN_X, HEADER_Y);
        self.surface.set_text_color(Color::Red);
        self.surface.set_text_size(1);
        self.surface.println(HEADER)?;
        let width = self.surface.width();
        self.surface
            .draw_hline(MARGIN_X, RULE_Y, width.saturating_sub(2 * MARGIN_X), Color::Red)?;

        self.surface.set_text_color(Color::Green);
        let mut y = FIRST_LINE_Y;
        for line in self.lines.oldest_ordered() {
            self.surface.set_cursor(MARGIN_X, y);
            self.surface.println(line.as_str())?;
            y += LINE_PITCH;
        }
        Ok(())
    }

    /// Number of lines held
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.len() == 0
    }

    pub fn is_full(&self) -> bool {
        self.lines.len() == N
    }

    /// Held lines, oldest first
    pub fn lines(&self) -> impl Iterator<Item = &DisplayLine> {
        self.lines.oldest_ordered()
    }

    /// Most recently appended line
    pub fn newest(&self) -> Option<&DisplayLine> {
        self.lines.recent()
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }
}
