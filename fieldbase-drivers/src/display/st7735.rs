//! ST7735 TFT driver
//!
//! 4-wire SPI with a separate data/command line. The panel is set up in
//! landscape, 160x128, 16 bits per pixel.

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiDevice;
use fieldbase_display::DisplayError;

/// Landscape width (pixels)
pub const WIDTH: u16 = 160;
/// Landscape height (pixels)
pub const HEIGHT: u16 = 128;

#[allow(dead_code)]
mod cmd {
    pub const SWRESET: u8 = 0x01;
    pub const SLPOUT: u8 = 0x11;
    pub const NORON: u8 = 0x13;
    pub const INVOFF: u8 = 0x20;
    pub const DISPON: u8 = 0x29;
    pub const CASET: u8 = 0x2A;
    pub const RASET: u8 = 0x2B;
    pub const RAMWR: u8 = 0x2C;
    pub const MADCTL: u8 = 0x36;
    pub const COLMOD: u8 = 0x3A;
    pub const FRMCTR1: u8 = 0xB1;
}

/// Row/column exchange with row order flipped: landscape, connector on the left
const MADCTL_LANDSCAPE: u8 = 0xA0;
/// 16 bits per pixel
const COLMOD_RGB565: u8 = 0x05;

/// Pixels pushed per SPI write when filling
const FILL_CHUNK: usize = 32;

/// ST7735 ("black tab") TFT
pub struct St7735<SPI, DC> {
    spi: SPI,
    dc: DC,
}

impl<SPI, DC> St7735<SPI, DC>
where
    SPI: SpiDevice,
    DC: OutputPin,
{
    pub fn new(spi: SPI, dc: DC) -> Self {
        Self { spi, dc }
    }

    /// Reset the controller and switch the panel on
    pub fn init(&mut self, delay: &mut impl DelayNs) -> Result<(), DisplayError> {
        self.command(cmd::SWRESET, &[])?;
        delay.delay_ms(150);
        self.command(cmd::SLPOUT, &[])?;
        delay.delay_ms(500);
        self.command(cmd::FRMCTR1, &[0x01, 0x2C, 0x2D])?;
        self.command(cmd::INVOFF, &[])?;
        self.command(cmd::MADCTL, &[MADCTL_LANDSCAPE])?;
        self.command(cmd::COLMOD, &[COLMOD_RGB565])?;
        self.command(cmd::NORON, &[])?;
        delay.delay_ms(10);
        self.command(cmd::DISPON, &[])?;
        delay.delay_ms(100);
        Ok(())
    }

    fn command(&mut self, command: u8, params: &[u8]) -> Result<(), DisplayError> {
        self.dc.set_low().map_err(|_| DisplayError::Communication)?;
        self.spi
            .write(&[command])
            .map_err(|_| DisplayError::Communication)?;
        if !params.is_empty() {
            self.data(params)?;
        }
        Ok(())
    }

    fn data(&mut self, bytes: &[u8]) -> Result<(), DisplayError> {
        self.dc.set_high().map_err(|_| DisplayError::Communication)?;
        self.spi
            .write(bytes)
            .map_err(|_| DisplayError::Communication)
    }

    /// Select the inclusive pixel window that RAMWR fills
    fn set_window(&mut self, x0: u16, y0: u16, x1: u16, y1: u16) -> Result<(), DisplayError> {
        let [xs0, xs1] = x0.to_be_bytes();
        let [xe0, xe1] = x1.to_be_bytes();
        self.command(cmd::CASET, &[xs0, xs1, xe0, xe1])?;
        let [ys0, ys1] = y0.to_be_bytes();
        let [ye0, ye1] = y1.to_be_bytes();
        self.command(cmd::RASET, &[ys0, ys1, ye0, ye1])?;
        self.command(cmd::RAMWR, &[])
    }

    pub fn release(self) -> (SPI, DC) {
        (self.spi, self.dc)
    }
}

fn pixel_bytes(color: Rgb565) -> [u8; 2] {
    color.into_storage().to_be_bytes()
}

impl<SPI, DC> OriginDimensions for St7735<SPI, DC> {
    fn size(&self) -> Size {
        Size::new(u32::from(WIDTH), u32::from(HEIGHT))
    }
}

impl<SPI, DC> DrawTarget for St7735<SPI, DC>
where
    SPI: SpiDevice,
    DC: OutputPin,
{
    type Color = Rgb565;
    type Error = DisplayError;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        let bounds = self.bounding_box();
        for Pixel(point, color) in pixels {
            if !bounds.contains(point) {
                continue;
            }
            let (x, y) = (point.x as u16, point.y as u16);
            self.set_window(x, y, x, y)?;
            self.data(&pixel_bytes(color))?;
        }
        Ok(())
    }

    /// Stream `colors` into one window
    ///
    /// Areas reaching past the panel edge go through [`draw_iter`](Self::draw_iter)
    /// so they are clipped pixel by pixel.
    fn fill_contiguous<I>(&mut self, area: &Rectangle, colors: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Self::Color>,
    {
        if area.intersection(&self.bounding_box()) != *area {
            return self.draw_iter(
                area.points()
                    .zip(colors)
                    .map(|(point, color)| Pixel(point, color)),
            );
        }
        let Some(bottom_right) = area.bottom_right() else {
            return Ok(());
        };
        self.set_window(
            area.top_left.x as u16,
            area.top_left.y as u16,
            bottom_right.x as u16,
            bottom_right.y as u16,
        )?;

        let count = (area.size.width * area.size.height) as usize;
        let mut chunk = [0u8; FILL_CHUNK * 2];
        let mut filled = 0;
        for color in colors.into_iter().take(count) {
            chunk[filled * 2..filled * 2 + 2].copy_from_slice(&pixel_bytes(color));
            filled += 1;
            if filled == FILL_CHUNK {
                self.data(&chunk)?;
                filled = 0;
            }
        }
        if filled > 0 {
            self.data(&chunk[..filled * 2])?;
        }
        Ok(())
    }

    fn fill_solid(&mut self, area: &Rectangle, color: Self::Color) -> Result<(), Self::Error> {
        let area = area.intersection(&self.bounding_box());
        let Some(bottom_right) = area.bottom_right() else {
            return Ok(());
        };
        self.set_window(
            area.top_left.x as u16,
            area.top_left.y as u16,
            bottom_right.x as u16,
            bottom_right.y as u16,
        )?;

        let [hi, lo] = pixel_bytes(color);
        let mut chunk = [0u8; FILL_CHUNK * 2];
        for pair in chunk.chunks_exact_mut(2) {
            pair.copy_from_slice(&[hi, lo]);
        }

        let mut remaining = (area.size.width * area.size.height) as usize;
        while remaining > 0 {
            let n = remaining.min(FILL_CHUNK);
            self.data(&chunk[..n * 2])?;
            remaining -= n;
        }
        Ok(())
    }
}
