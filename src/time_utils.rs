use chrono::{DateTime, Local, TimeZone, Timelike};

/// Wall-clock snapshot captured once per tick. The renderer reads this
/// cached value, so a stalled tick repeats the last frame instead of
/// failing mid-draw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WallTime {
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
    pub date_string: String,
}

impl WallTime {
    pub fn from_datetime<Tz: TimeZone>(dt: &DateTime<Tz>, date_format: &str) -> Self
    where
        Tz::Offset: std::fmt::Display,
    {
        Self {
            hour: dt.hour(),
            minute: dt.minute(),
            second: dt.second(),
            date_string: dt.format(date_format).to_string(),
        }
    }
}

pub fn current_time(date_format: &str) -> WallTime {
    WallTime::from_datetime(&Local::now(), date_format)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn date_string_is_day_and_month_abbreviation() {
        let dt = Utc.with_ymd_and_hms(2016, 6, 24, 10, 20, 30).unwrap();
        let t = WallTime::from_datetime(&dt, "%d %b");
        assert_eq!(t.date_string, "24 Jun");
        assert_eq!((t.hour, t.minute, t.second), (10, 20, 30));
    }

    #[test]
    fn single_digit_day_is_zero_padded() {
        let dt = Utc.with_ymd_and_hms(2016, 1, 3, 0, 0, 0).unwrap();
        let t = WallTime::from_datetime(&dt, "%d %b");
        assert_eq!(t.date_string, "03 Jan");
    }
}
