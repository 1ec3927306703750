//! Reporting periods and the month sheets they cover.

use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};

/// Month sheets are named with Indonesian month names.
pub const MONTH_NAMES: [&str; 12] = [
    "Januari",
    "Februari",
    "Maret",
    "April",
    "Mei",
    "Juni",
    "Juli",
    "Agustus",
    "September",
    "Oktober",
    "November",
    "Desember",
];

/// The sheet name for a 1-based month number.
pub fn month_name(month: u32) -> &'static str {
    let index = (month.clamp(1, 12) - 1) as usize;
    MONTH_NAMES[index]
}

/// The span of time an analysis covers.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Period {
    #[serde(rename = "Day", alias = "day")]
    Day,
    #[default]
    #[serde(rename = "Month", alias = "month")]
    Month,
    #[serde(rename = "3 Months", alias = "3 months", alias = "3_months")]
    ThreeMonths,
    #[serde(rename = "6 Months", alias = "6 months", alias = "6_months")]
    SixMonths,
    #[serde(rename = "Year", alias = "year")]
    Year,
}

serde_plain::derive_display_from_serialize!(Period);
serde_plain::derive_fromstr_from_deserialize!(Period);

impl Period {
    /// Number of month sheets in a rolling window, for the multi-month periods.
    fn window(&self) -> Option<u32> {
        match self {
            Period::ThreeMonths => Some(3),
            Period::SixMonths => Some(6),
            _ => None,
        }
    }

    /// Returns true when the period reads more than one sheet.
    pub fn is_multi_sheet(&self) -> bool {
        matches!(
            self,
            Period::ThreeMonths | Period::SixMonths | Period::Year
        )
    }

    /// The sheets to read, oldest first. Day and Month read `current_sheet`. The rolling windows
    /// end at the month of `today` and wrap into the previous year's month names.
    pub fn resolve_sheets(&self, current_sheet: &str, today: NaiveDate) -> Vec<String> {
        match self {
            Period::Day | Period::Month => vec![current_sheet.to_string()],
            Period::Year => MONTH_NAMES.iter().map(|s| s.to_string()).collect(),
            Period::ThreeMonths | Period::SixMonths => {
                let n = self.window().unwrap_or(1);
                (0..n)
                    .rev()
                    .map(|back| {
                        let month0 = (today.month0() + 12 - (back % 12)) % 12;
                        month_name(month0 + 1).to_string()
                    })
                    .collect()
            }
        }
    }

    /// The number of days to divide a total by to get a daily average. Never less than 1.
    pub fn day_divisor(&self, today: NaiveDate) -> u32 {
        let days = match self {
            Period::Day => 1,
            Period::Month => today.day(),
            Period::Year => today.ordinal(),
            Period::ThreeMonths | Period::SixMonths => {
                let n = self.window().unwrap_or(1);
                let days = match first_of_window(today, n) {
                    Some(first) => (today - first).num_days() + 1,
                    None => 1,
                };
                u32::try_from(days).unwrap_or(1)
            }
        };
        days.max(1)
    }

    /// A human-readable label, e.g. `Oktober 2026` or `Agustus - Oktober 2026`.
    pub fn label(&self, current_sheet: &str, today: NaiveDate) -> String {
        let year = today.year();
        match self {
            Period::Day => today.format("%d %b %Y").to_string(),
            Period::Month => format!("{current_sheet} {year}"),
            Period::Year => year.to_string(),
            Period::ThreeMonths | Period::SixMonths => {
                let n = self.window().unwrap_or(1);
                let current = month_name(today.month());
                match first_of_window(today, n) {
                    Some(first) if first.year() == year => {
                        format!("{} - {current} {year}", month_name(first.month()))
                    }
                    Some(first) => format!(
                        "{} {} - {current} {year}",
                        month_name(first.month()),
                        first.year()
                    ),
                    None => format!("{current} {year}"),
                }
            }
        }
    }
}

/// The first day of the oldest month in an `n`-month window ending at `today`.
fn first_of_window(today: NaiveDate, n: u32) -> Option<NaiveDate> {
    today
        .with_day(1)?
        .checked_sub_months(Months::new(n.saturating_sub(1)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_period() {
        assert_eq!(Period::from_str("Day").unwrap(), Period::Day);
        assert_eq!(Period::from_str("month").unwrap(), Period::Month);
        assert_eq!(Period::from_str("3 Months").unwrap(), Period::ThreeMonths);
        assert_eq!(Period::from_str("6_months").unwrap(), Period::SixMonths);
        assert_eq!(Period::from_str("Year").unwrap(), Period::Year);
        assert!(Period::from_str("Week").is_err());
        assert_eq!(Period::default(), Period::Month);
        assert_eq!(Period::ThreeMonths.to_string(), "3 Months");
    }

    #[test]
    fn test_resolve_day_and_month_use_current_sheet() {
        let today = date(2026, 10, 18);
        assert_eq!(
            Period::Day.resolve_sheets("September", today),
            vec!["September"]
        );
        assert_eq!(
            Period::Month.resolve_sheets("Oktober", today),
            vec!["Oktober"]
        );
    }

    #[test]
    fn test_resolve_three_months_oldest_first() {
        let sheets = Period::ThreeMonths.resolve_sheets("Oktober", date(2026, 10, 18));
        assert_eq!(sheets, vec!["Agustus", "September", "Oktober"]);
    }

    #[test]
    fn test_resolve_window_wraps_year() {
        let sheets = Period::SixMonths.resolve_sheets("Februari", date(2026, 2, 10));
        assert_eq!(
            sheets,
            vec!["September", "Oktober", "November", "Desember", "Januari", "Februari"]
        );
    }

    #[test]
    fn test_resolve_year_is_every_month() {
        for month in [1, 6, 12] {
            let sheets = Period::Year.resolve_sheets("x", date(2026, month, 1));
            assert_eq!(sheets, MONTH_NAMES.to_vec());
        }
    }

    #[test]
    fn test_day_divisor() {
        let today = date(2026, 10, 18);
        assert_eq!(Period::Day.day_divisor(today), 1);
        assert_eq!(Period::Month.day_divisor(today), 18);
        // Aug 1 through Oct 18: 31 + 30 + 18
        assert_eq!(Period::ThreeMonths.day_divisor(today), 79);
        assert_eq!(Period::Year.day_divisor(today), 291);
        assert_eq!(Period::Month.day_divisor(date(2026, 10, 1)), 1);
    }

    #[test]
    fn test_day_divisor_across_year() {
        // Nov 1 2025 through Jan 5 2026: 30 + 31 + 5
        assert_eq!(Period::ThreeMonths.day_divisor(date(2026, 1, 5)), 66);
    }

    #[test]
    fn test_labels() {
        let today = date(2026, 10, 18);
        assert_eq!(Period::Day.label("Oktober", today), "18 Oct 2026");
        assert_eq!(Period::Month.label("Oktober", today), "Oktober 2026");
        assert_eq!(
            Period::ThreeMonths.label("Oktober", today),
            "Agustus - Oktober 2026"
        );
        assert_eq!(Period::Year.label("Oktober", today), "2026");
        assert_eq!(
            Period::ThreeMonths.label("Januari", date(2026, 1, 5)),
            "November 2025 - Januari 2026"
        );
    }
}
