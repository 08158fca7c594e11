//! Cursor-based text surface over embedded-graphics

use embedded_graphics::mono_font::ascii::{FONT_10X20, FONT_6X10};
use embedded_graphics::mono_font::{MonoFont, MonoTextStyleBuilder};
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use embedded_graphics::text::{Baseline, Text};
use fieldbase_display::{Color, DisplayError, DisplaySurface};

fn rgb(color: Color) -> Rgb565 {
    match color {
        Color::Black => Rgb565::BLACK,
        Color::White => Rgb565::WHITE,
        Color::Red => Rgb565::RED,
        Color::Green => Rgb565::GREEN,
    }
}

fn font(size: u8) -> &'static MonoFont<'static> {
    if size >= 2 {
        &FONT_10X20
    } else {
        &FONT_6X10
    }
}

/// Text surface drawing onto any RGB565 target
///
/// Text does not wrap; anything past the right edge is clipped. Glyphs are
/// drawn as whole cells on a black background, so each character reaches
/// the target as a single [`DrawTarget::fill_contiguous`] call.
pub struct TextPanel<D> {
    target: D,
    cursor: Point,
    color: Rgb565,
    size: u8,
}

impl<D> TextPanel<D>
where
    D: DrawTarget<Color = Rgb565>,
{
    pub fn new(target: D) -> Self {
        Self {
            target,
            cursor: Point::zero(),
            color: Rgb565::WHITE,
            size: 1,
        }
    }

    pub fn target(&self) -> &D {
        &self.target
    }

    pub fn cursor(&self) -> Point {
        self.cursor
    }
}

impl<D> DisplaySurface for TextPanel<D>
where
    D: DrawTarget<Color = Rgb565>,
{
    fn clear_screen(&mut self, color: Color) -> Result<(), DisplayError> {
        self.target
            .clear(rgb(color))
            .map_err(|_| DisplayError::Communication)
    }

    fn set_cursor(&mut self, x: u16, y: u16) {
        self.cursor = Point::new(i32::from(x), i32::from(y));
    }

    fn set_text_color(&mut self, color: Color) {
        self.color = rgb(color);
    }

    fn set_text_size(&mut self, size: u8) {
        self.size = size.max(1);
    }

    fn draw_hline(&mut self, x: u16, y: u16, width: u16, color: Color) -> Result<(), DisplayError> {
        if width == 0 {
            return Ok(());
        }
        let rule = Rectangle::new(
            Point::new(i32::from(x), i32::from(y)),
            Size::new(u32::from(width), 1),
        );
        self.target
            .fill_solid(&rule, rgb(color))
            .map_err(|_| DisplayError::Communication)
    }

    fn println(&mut self, text: &str) -> Result<(), DisplayError> {
        let font = font(self.size);
        let style = MonoTextStyleBuilder::new()
            .font(font)
            .text_color(self.color)
            .background_color(Rgb565::BLACK)
            .build();
        Text::with_baseline(text, self.cursor, style, Baseline::Top)
            .draw(&mut self.target)
            .map_err(|_| DisplayError::Communication)?;
        self.cursor = Point::new(0, self.cursor.y + font.character_size.height as i32);
        Ok(())
    }

    fn width(&self) -> u16 {
        self.target.bounding_box().size.width as u16
    }
}
