//! Real-time clock abstraction
//!
//! Provides a calendar date-time type with Unix epoch conversion and the
//! trait the core uses to read and set the station clock.

/// Errors from clock operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClockError {
    /// Device did not respond on the bus
    NotFound,
    /// Bus transfer failed
    Bus,
    /// Register contents are not a valid date-time
    InvalidTime,
}

/// Seconds per day
const SECS_PER_DAY: u32 = 86_400;

/// Last second representable as a [`DateTime`] (2105-12-31T23:59:59)
pub const LAST_UNIXTIME: u32 = 4_291_747_199;

/// Calendar date and time (UTC, second resolution)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DateTime {
    year: u16,
    month: u8,
    day: u8,
    hour: u8,
    minute: u8,
    second: u8,
}

impl Default for DateTime {
    /// 2000-01-01T00:00:00, the reset value of most RTC chips
    fn default() -> Self {
        Self {
            year: 2000,
            month: 1,
            day: 1,
            hour: 0,
            minute: 0,
            second: 0,
        }
    }
}

impl DateTime {
    /// Create a date-time, validating every field
    ///
    /// Years before 1970 or after 2105 are rejected so that the value
    /// always fits a 32-bit Unix timestamp.
    pub fn new(
        year: u16,
        month: u8,
        day: u8,
        hour: u8,
        minute: u8,
        second: u8,
    ) -> Result<Self, ClockError> {
        if !(1970..=2105).contains(&year)
            || !(1..=12).contains(&month)
            || day == 0
            || day > days_in_month(year, month)
            || hour > 23
            || minute > 59
            || second > 59
        {
            return Err(ClockError::InvalidTime);
        }

        Ok(Self {
            year,
            month,
            day,
            hour,
            minute,
            second,
        })
    }

    /// Build a date-time from seconds since 1970-01-01T00:00:00
    ///
    /// Inputs past 2105-12-31T23:59:59 saturate to that instant.
    pub fn from_unixtime(secs: u32) -> Self {
        let secs = secs.min(LAST_UNIXTIME);
        let days = secs / SECS_PER_DAY;
        let rem = secs % SECS_PER_DAY;

        // Civil-from-days, shifted so the era starts on 0000-03-01
        let z = days as i64 + 719_468;
        let era = z.div_euclid(146_097);
        let doe = z - era * 146_097;
        let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
        let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
        let mp = (5 * doy + 2) / 153;
        let day = (doy - (153 * mp + 2) / 5 + 1) as u8;
        let month = (if mp < 10 { mp + 3 } else { mp - 9 }) as u8;
        let year = (yoe + era * 400 + i64::from(month <= 2)) as u16;

        Self {
            year,
            month,
            day,
            hour: (rem / 3600) as u8,
            minute: ((rem % 3600) / 60) as u8,
            second: (rem % 60) as u8,
        }
    }

    /// Seconds since 1970-01-01T00:00:00
    pub fn unixtime(&self) -> u32 {
        let y = i64::from(self.year) - i64::from(self.month <= 2);
        let era = y.div_euclid(400);
        let yoe = y - era * 400;
        let m = i64::from(self.month);
        let mp = if m > 2 { m - 3 } else { m + 9 };
        let doy = (153 * mp + 2) / 5 + i64::from(self.day) - 1;
        let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
        let days = era * 146_097 + doe - 719_468;

        let secs = days * i64::from(SECS_PER_DAY)
            + i64::from(self.hour) * 3600
            + i64::from(self.minute) * 60
            + i64::from(self.second);
        secs as u32
    }

    pub fn year(&self) -> u16 {
        self.year
    }

    pub fn month(&self) -> u8 {
        self.month
    }

    pub fn day(&self) -> u8 {
        self.day
    }

    pub fn hour(&self) -> u8 {
        self.hour
    }

    pub fn minute(&self) -> u8 {
        self.minute
    }

    pub fn second(&self) -> u8 {
        self.second
    }
}

fn is_leap_year(year: u16) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

fn days_in_month(year: u16, month: u8) -> u8 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if is_leap_year(year) => 29,
        2 => 28,
        _ => 0,
    }
}

/// Battery-backed real-time clock
pub trait Clock {
    /// Read the current date-time
    fn now(&mut self) -> Result<DateTime, ClockError>;

    /// True if the clock stopped since it was last set (battery ran out)
    fn lost_power(&mut self) -> Result<bool, ClockError>;

    /// Set the clock and clear the lost-power condition
    fn adjust(&mut self, time: DateTime) -> Result<(), ClockError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_epoch_of_2000() {
        let t = DateTime::default();
        assert_eq!(t.unixtime(), 946_684_800);
        assert_eq!(DateTime::from_unixtime(946_684_800), t);
    }

    #[test]
    fn test_unixtime_known_dates() {
        let t = DateTime::new(2023, 6, 25, 12, 34, 56).unwrap();
        assert_eq!(t.unixtime(), 1_687_696_496);

        let leap = DateTime::new(2024, 2, 29, 23, 59, 59).unwrap();
        assert_eq!(leap.unixtime(), 1_709_251_199);
    }

    #[test]
    fn test_from_unixtime_fields() {
        let t = DateTime::from_unixtime(1_709_251_199);
        assert_eq!(t.year(), 2024);
        assert_eq!(t.month(), 2);
        assert_eq!(t.day(), 29);
        assert_eq!(t.hour(), 23);
        assert_eq!(t.minute(), 59);
        assert_eq!(t.second(), 59);

        // One second later rolls into March
        let next = DateTime::from_unixtime(1_709_251_200);
        assert_eq!((next.month(), next.day(), next.hour()), (3, 1, 0));
    }

    #[test]
    fn test_unix_epoch_start() {
        let t = DateTime::from_unixtime(0);
        assert_eq!((t.year(), t.month(), t.day()), (1970, 1, 1));
        assert_eq!(t.unixtime(), 0);
    }

    #[test]
    fn test_invalid_fields_rejected() {
        assert_eq!(
            DateTime::new(2023, 2, 29, 0, 0, 0),
            Err(ClockError::InvalidTime)
        );
        assert_eq!(
            DateTime::new(2023, 13, 1, 0, 0, 0),
            Err(ClockError::InvalidTime)
        );
        assert_eq!(
            DateTime::new(2023, 1, 1, 24, 0, 0),
            Err(ClockError::InvalidTime)
        );
        assert_eq!(
            DateTime::new(1969, 12, 31, 0, 0, 0),
            Err(ClockError::InvalidTime)
        );
        assert!(DateTime::new(2000, 2, 29, 0, 0, 0).is_ok());
    }

    #[test]
    fn test_unixtime_past_2105_saturates() {
        let last = DateTime::new(2105, 12, 31, 23, 59, 59).unwrap();
        assert_eq!(last.unixtime(), LAST_UNIXTIME);
        assert_eq!(DateTime::from_unixtime(LAST_UNIXTIME), last);
        assert_eq!(DateTime::from_unixtime(4_291_747_200), last);
        assert_eq!(
            DateTime::from_unixtime(4_107_542_400),
            DateTime::new(2100, 3, 1, 0, 0, 0).unwrap()
        );

        let max = DateTime::from_unixtime(u32::MAX);
        assert_eq!(max, last);
        assert!(DateTime::new(
            max.year(),
            max.month(),
            max.day(),
            max.hour(),
            max.minute(),
            max.second()
        )
        .is_ok());
    }
}
