//! Filtering transactions and grouping them by calendar day.

use crate::error::Res;
use crate::model::{parse_calendar_date, Amount, TransactionKind, TransactionRecord};
use anyhow::{bail, Context};
use chrono::{Days, NaiveDate};
use serde::Serialize;
use std::collections::HashMap;
use std::str::FromStr;

const TODAY: &str = "Hari Ini";
const YESTERDAY: &str = "Kemarin";

/// Optional filters for a transaction listing. Unset filters match everything.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TransactionFilter {
    date: Option<NaiveDate>,
    category: Option<String>,
    kind: Option<TransactionKind>,
}

impl TransactionFilter {
    /// Builds a filter from raw user input. Empty strings count as unset.
    ///
    /// - `date`: `YYYY-MM-DD`
    /// - `category`: matched case-insensitively against the whole category name
    /// - `kind`: `expense` or `income`
    pub fn new(date: Option<&str>, category: Option<&str>, kind: Option<&str>) -> Res<Self> {
        let date = match non_empty(date) {
            None => None,
            Some(s) => Some(
                parse_calendar_date(s)
                    .with_context(|| format!("The date filter '{s}' is not in YYYY-MM-DD form"))?,
            ),
        };
        let kind = match non_empty(kind) {
            None => None,
            Some(s) => match TransactionKind::from_str(&s.to_lowercase()) {
                Ok(kind) => Some(kind),
                Err(_) => bail!("The type filter must be 'expense' or 'income', got '{s}'"),
            },
        };
        Ok(Self {
            date,
            category: non_empty(category).map(str::to_string),
            kind,
        })
    }

    /// Returns false when the type filter excludes `kind`, in which case that block is not read.
    pub fn includes(&self, kind: TransactionKind) -> bool {
        self.kind.map_or(true, |k| k == kind)
    }

    pub fn matches(&self, record: &TransactionRecord) -> bool {
        if !self.includes(record.kind()) {
            return false;
        }
        if let Some(date) = self.date {
            if record.occurred_at().date() != date {
                return false;
            }
        }
        if let Some(category) = &self.category {
            if record.category().to_lowercase() != category.to_lowercase() {
                return false;
            }
        }
        true
    }
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

/// The transactions of a single calendar day.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct TransactionGroup {
    /// `YYYY-MM-DD`
    pub date: NaiveDate,
    /// `Hari Ini`, `Kemarin` or e.g. `12 Oct 2026`
    pub label: String,
    /// Sum of the absolute values of the day's expenses.
    pub total_expense: Amount,
    pub total_income: Amount,
    pub items: Vec<TransactionRecord>,
}

/// Sorts by time of day, latest first, and groups by calendar date. Groups appear in the order
/// their first item appears after sorting. The sort is stable and ignores the date, so two items
/// at the same time keep their input order.
pub(crate) fn group_transactions(
    mut records: Vec<TransactionRecord>,
    today: NaiveDate,
) -> Vec<TransactionGroup> {
    records.sort_by(|a, b| b.occurred_at().time().cmp(&a.occurred_at().time()));

    let mut groups: Vec<TransactionGroup> = Vec::new();
    let mut positions: HashMap<NaiveDate, usize> = HashMap::new();
    for record in records {
        let date = record.occurred_at().date();
        let ix = *positions.entry(date).or_insert_with(|| {
            groups.push(TransactionGroup {
                date,
                label: group_label(date, today),
                total_expense: Amount::ZERO,
                total_income: Amount::ZERO,
                items: Vec::new(),
            });
            groups.len() - 1
        });
        let group = &mut groups[ix];
        match record.kind() {
            TransactionKind::Expense => group.total_expense += record.amount().abs(),
            TransactionKind::Income => group.total_income += record.amount(),
        }
        group.items.push(record);
    }
    groups
}

fn group_label(date: NaiveDate, today: NaiveDate) -> String {
    if date == today {
        TODAY.to_string()
    } else if today.checked_sub_days(Days::new(1)) == Some(date) {
        YESTERDAY.to_string()
    } else {
        date.format("%d %b %Y").to_string()
    }
}
