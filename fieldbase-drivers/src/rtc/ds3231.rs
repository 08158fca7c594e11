//! DS3231 real-time clock (I2C)
//!
//! Time is kept in BCD registers 0x00-0x06 in 24-hour mode. The oscillator
//! stop flag (OSF) in the status register is set whenever the clock lost
//! both supplies, and stays set until cleared by software.

use embedded_hal::i2c::I2c;
use fieldbase_hal::{Clock, ClockError, DateTime};

/// Fixed I2C address
pub const DS3231_ADDR: u8 = 0x68;

/// DS3231 register addresses
pub mod reg {
    /// Seconds, start of the time block
    pub const SECONDS: u8 = 0x00;
    /// Control register
    pub const CONTROL: u8 = 0x0E;
    /// Status register
    pub const STATUS: u8 = 0x0F;
}

/// Oscillator stop flag
const STATUS_OSF: u8 = 0x80;
/// 12-hour mode select in the hours register
const HOURS_12H: u8 = 0x40;
/// PM flag in 12-hour mode
const HOURS_PM: u8 = 0x20;
/// Century bit in the month register
const MONTH_CENTURY: u8 = 0x80;

fn bcd_to_bin(v: u8) -> u8 {
    (v >> 4) * 10 + (v & 0x0F)
}

fn bin_to_bcd(v: u8) -> u8 {
    ((v / 10) << 4) | (v % 10)
}

/// DS3231 driver
pub struct Ds3231<I2C> {
    i2c: I2C,
}

impl<I2C: I2c> Ds3231<I2C> {
    pub fn new(i2c: I2C) -> Self {
        Self { i2c }
    }

    /// Check the chip answers
    pub fn probe(&mut self) -> Result<(), ClockError> {
        let mut status = [0u8; 1];
        self.i2c
            .write_read(DS3231_ADDR, &[reg::STATUS], &mut status)
            .map_err(|_| ClockError::NotFound)
    }

    fn read_reg(&mut self, addr: u8) -> Result<u8, ClockError> {
        let mut buf = [0u8; 1];
        self.i2c
            .write_read(DS3231_ADDR, &[addr], &mut buf)
            .map_err(|_| ClockError::Bus)?;
        Ok(buf[0])
    }

    fn write_reg(&mut self, addr: u8, value: u8) -> Result<(), ClockError> {
        self.i2c
            .write(DS3231_ADDR, &[addr, value])
            .map_err(|_| ClockError::Bus)
    }

    /// Release the chip
    pub fn release(self) -> I2C {
        self.i2c
    }
}

impl<I2C: I2c> Clock for Ds3231<I2C> {
    fn now(&mut self) -> Result<DateTime, ClockError> {
        let mut regs = [0u8; 7];
        self.i2c
            .write_read(DS3231_ADDR, &[reg::SECONDS], &mut regs)
            .map_err(|_| ClockError::Bus)?;

        let second = bcd_to_bin(regs[0] & 0x7F);
        let minute = bcd_to_bin(regs[1] & 0x7F);
        let hour = if regs[2] & HOURS_12H != 0 {
            let h = bcd_to_bin(regs[2] & 0x1F) % 12;
            if regs[2] & HOURS_PM != 0 {
                h + 12
            } else {
                h
            }
        } else {
            bcd_to_bin(regs[2] & 0x3F)
        };
        let day = bcd_to_bin(regs[4] & 0x3F);
        let month = bcd_to_bin(regs[5] & 0x1F);
        let century = if regs[5] & MONTH_CENTURY != 0 { 100 } else { 0 };
        let year = 2000 + century + u16::from(bcd_to_bin(regs[6]));

        DateTime::new(year, month, day, hour, minute, second)
    }

    fn lost_power(&mut self) -> Result<bool, ClockError> {
        Ok(self.read_reg(reg::STATUS)? & STATUS_OSF != 0)
    }

    fn adjust(&mut self, time: DateTime) -> Result<(), ClockError> {
        if time.year() < 2000 {
            return Err(ClockError::InvalidTime);
        }
        let years = time.year() - 2000;
        let (century, yy) = if years >= 100 {
            (MONTH_CENTURY, (years - 100) as u8)
        } else {
            (0, years as u8)
        };
        // 1 = Sunday; 1970-01-01 was a Thursday
        let weekday = ((time.unixtime() / 86_400 + 4) % 7) as u8 + 1;

        let frame = [
            reg::SECONDS,
            bin_to_bcd(time.second()),
            bin_to_bcd(time.minute()),
            bin_to_bcd(time.hour()),
            weekday,
            bin_to_bcd(time.day()),
            bin_to_bcd(time.month()) | century,
            bin_to_bcd(yy),
        ];
        self.i2c
            .write(DS3231_ADDR, &frame)
            .map_err(|_| ClockError::Bus)?;

        let status = self.read_reg(reg::STATUS)?;
        self.write_reg(reg::STATUS, status & !STATUS_OSF)
    }
}
