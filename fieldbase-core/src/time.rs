//! Timestamp text

use core::fmt::Write;

use fieldbase_hal::DateTime;
use heapless::String;

/// `YYYY-MM-DDThh:mm:ss`
pub type IsoTime = String<19>;

/// Format `t` as a zero-padded ISO-8601 date-time without zone
pub fn iso8601(t: &DateTime) -> IsoTime {
    let mut s = IsoTime::new();
    let _ = write!(
        s,
        "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}",
        t.year(),
        t.month(),
        t.day(),
        t.hour(),
        t.minute(),
        t.second()
    );
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_padded() {
        let t = DateTime::new(2024, 3, 7, 4, 5, 6).unwrap();
        assert_eq!(iso8601(&t).as_str(), "2024-03-07T04:05:06");
    }

    #[test]
    fn test_from_epoch() {
        let t = DateTime::from_unixtime(1_687_696_496);
        assert_eq!(iso8601(&t).as_str(), "2023-06-25T12:34:56");
    }
}
