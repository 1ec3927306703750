//! Timestamp parsing for spreadsheet cells.

use crate::clock::jakarta;
use crate::model::Cell;
use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// Formats tried in order. Month-first comes before day-first, so an ambiguous `2/3/2026` is
/// read as February 3rd.
const FORMATS: &[&str] = &[
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Parses the timestamp in a cell. Only text cells are considered. RFC 3339 values are converted
/// to Jakarta wall-clock time. Returns `None` when nothing matches.
pub fn parse_date(cell: &Cell) -> Option<NaiveDateTime> {
    let text = cell.as_text()?.trim();
    if text.is_empty() {
        return None;
    }
    FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .or_else(|| {
            DateTime::parse_from_rfc3339(text)
                .ok()
                .map(|dt| dt.with_timezone(&jakarta()).naive_local())
        })
}

/// Parses a `YYYY-MM-DD` calendar date.
pub fn parse_calendar_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd_hms(y: i32, m: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, mi, s)
            .unwrap()
    }

    #[test]
    fn test_month_first() {
        let parsed = parse_date(&Cell::from("2/15/2026 08:30:00")).unwrap();
        assert_eq!(parsed, ymd_hms(2026, 2, 15, 8, 30, 0));
    }

    #[test]
    fn test_ambiguous_is_month_first() {
        let parsed = parse_date(&Cell::from("2/3/2026 10:00")).unwrap();
        assert_eq!(parsed, ymd_hms(2026, 2, 3, 10, 0, 0));
    }

    #[test]
    fn test_day_first_when_month_first_is_impossible() {
        let parsed = parse_date(&Cell::from("25/12/2026 19:05:00")).unwrap();
        assert_eq!(parsed, ymd_hms(2026, 12, 25, 19, 5, 0));
    }

    #[test]
    fn test_iso() {
        assert_eq!(
            parse_date(&Cell::from("2026-10-05 09:00:00")),
            Some(ymd_hms(2026, 10, 5, 9, 0, 0))
        );
        assert_eq!(
            parse_date(&Cell::from("2026-10-05 09:00")),
            Some(ymd_hms(2026, 10, 5, 9, 0, 0))
        );
    }

    #[test]
    fn test_rfc3339_converted_to_jakarta() {
        let parsed = parse_date(&Cell::from("2026-10-17T20:30:00Z")).unwrap();
        assert_eq!(parsed, ymd_hms(2026, 10, 18, 3, 30, 0));
    }

    #[test]
    fn test_unparseable() {
        assert_eq!(parse_date(&Cell::from("not a date")), None);
        assert_eq!(parse_date(&Cell::from("2026-10-05")), None);
        assert_eq!(parse_date(&Cell::Empty), None);
        assert_eq!(parse_date(&Cell::Number(46000.0)), None);
    }

    #[test]
    fn test_parse_calendar_date() {
        assert_eq!(
            parse_calendar_date("2026-10-18"),
            NaiveDate::from_ymd_opt(2026, 10, 18)
        );
        assert_eq!(parse_calendar_date("18/10/2026"), None);
    }
}
