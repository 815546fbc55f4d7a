//! Text <-> value conversions for stored cells. Decoding never fails.

use chrono::{NaiveDate, NaiveTime};

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const TIME_FORMAT: &str = "%H:%M:%S";

/// Date cell: empty or unreadable text is `None`.
pub fn decode_date(raw: &str) -> Option<NaiveDate> {
    let value = raw.trim();
    if value.is_empty() {
        return None;
    }
    parse_date(value)
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    if let Ok(date) = NaiveDate::parse_from_str(value, DATE_FORMAT) {
        return Some(date);
    }
    // Timestamps such as "2025-03-01 09:15:00" or "2025-03-01T09:15:00".
    value
        .get(..10)
        .and_then(|prefix| NaiveDate::parse_from_str(prefix, DATE_FORMAT).ok())
        .or_else(|| NaiveDate::parse_from_str(value, "%d/%m/%Y").ok())
}

/// Time cell: unparseable text is midnight.
pub fn decode_time(raw: &str) -> NaiveTime {
    let value = raw.trim();
    NaiveTime::parse_from_str(value, TIME_FORMAT)
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M"))
        .unwrap_or(NaiveTime::MIN)
}

pub fn encode_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format(DATE_FORMAT).to_string())
        .unwrap_or_default()
}

pub fn encode_time(time: NaiveTime) -> String {
    time.format(TIME_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn unreadable_dates_are_unknown() {
        assert_eq!(decode_date(""), None);
        assert_eq!(decode_date("2025-03-01"), Some(day(2025, 3, 1)));
        assert_eq!(decode_date("2025-03-01 09:15:00"), Some(day(2025, 3, 1)));
        assert_eq!(decode_date("01/03/2025"), Some(day(2025, 3, 1)));
        assert_eq!(decode_date("ayer"), None);
        assert_eq!(decode_date("03/15/2024"), None);
    }

    #[test]
    fn times_degrade_to_midnight() {
        assert_eq!(decode_time("09:15:30"), NaiveTime::from_hms_opt(9, 15, 30).expect("time"));
        assert_eq!(decode_time("09:15"), NaiveTime::from_hms_opt(9, 15, 0).expect("time"));
        assert_eq!(decode_time("tarde"), NaiveTime::MIN);
    }

    #[test]
    fn encoding_uses_iso_dates() {
        assert_eq!(encode_date(Some(day(2025, 3, 1))), "2025-03-01");
        assert_eq!(encode_date(None), "");
    }
}
