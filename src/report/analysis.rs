//! Aggregation of category, priority and income data into an analysis report.
//!
//! The ledger reads rows from one or more month sheets and feeds them into a `CategoryTally` and a
//! `PriorityTally`. Keys are merged, so feeding several months in sequence is the same as feeding
//! one month that contains all of their rows. The tallies are then turned into an
//! `AnalysisReport` by `expense_report` and `income_report`.

use crate::model::{cell_at, Amount, Cell, Period, TransactionRecord};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;

const DAILY_AVERAGE_LABEL: &str = "Rata-rata harian";
const NO_TOP_CATEGORY: &str = "-";

/// Expense and income analysis for the same period.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Analysis {
    pub expense: AnalysisReport,
    pub income: AnalysisReport,
}

/// A summary of expense or income over a period.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct AnalysisReport {
    pub period: Period,
    pub period_label: String,
    pub total_amount: Amount,
    pub total_display: String,
    pub categories: Vec<CategoryAggregate>,
    pub top_category: TopCategory,
    pub daily_average: DailyAverage,
    /// Only present for expenses.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority_distribution: Option<Vec<PriorityBucket>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct CategoryAggregate {
    pub category_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_category_name: Option<String>,
    pub amount: Amount,
    /// Share of the total, truncated to a whole number in 0..=100.
    pub percent: u8,
}

impl CategoryAggregate {
    /// `Tagihan - Listrik`, or just the category when there is no sub-category.
    pub fn display_name(&self) -> String {
        match &self.sub_category_name {
            Some(sub) => format!("{} - {sub}", self.category_name),
            None => self.category_name.clone(),
        }
    }
}

/// The category with the largest positive amount. When nothing is positive the name is `-` and
/// the total is zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct TopCategory {
    pub name: String,
    pub total: Amount,
    pub total_display: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct DailyAverage {
    pub label: String,
    pub amount: Amount,
    pub amount_display: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct PriorityBucket {
    /// `high`, `medium`, `low` or `other`
    pub level: String,
    /// `Tinggi`, `Sedang`, `Rendah` or `Lainnya`
    pub label: String,
    pub amount: Amount,
    pub amount_display: String,
}

/// The period being reported on, resolved against the clock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PeriodContext {
    pub(crate) period: Period,
    pub(crate) label: String,
    pub(crate) divisor: u32,
}

type CategoryKey = (String, Option<String>);

/// Accumulates amounts per (category, sub-category), remembering first-seen order.
#[derive(Debug, Default, Clone)]
pub(crate) struct CategoryTally {
    order: Vec<CategoryKey>,
    amounts: HashMap<CategoryKey, Amount>,
}

impl CategoryTally {
    pub(crate) fn add(&mut self, category: &str, sub_category: Option<&str>, amount: Amount) {
        let key = (
            category.trim().to_string(),
            sub_category
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
        );
        match self.amounts.get_mut(&key) {
            Some(existing) => *existing += amount,
            None => {
                self.order.push(key.clone());
                self.amounts.insert(key, amount);
            }
        }
    }

    /// Adds (category, sub-category, amount) breakdown rows. Rows without a category are skipped.
    pub(crate) fn add_breakdown_rows(&mut self, rows: &[Vec<Cell>]) {
        for row in rows {
            let category = cell_at(row, 0).to_trimmed();
            if category.is_empty() {
                continue;
            }
            let sub_category = cell_at(row, 1).to_trimmed();
            self.add(
                &category,
                Some(sub_category.as_str()),
                Amount::from_cell(cell_at(row, 2)),
            );
        }
    }

    /// Adds records by category, using the absolute amount.
    pub(crate) fn add_records<'a>(
        &mut self,
        records: impl IntoIterator<Item = &'a TransactionRecord>,
    ) {
        for record in records {
            if record.category().trim().is_empty() {
                continue;
            }
            self.add(record.category(), None, record.amount().abs());
        }
    }

    /// Ensures every name in `names` is present, adding missing ones with a zero amount. Matching
    /// is exact after trimming.
    pub(crate) fn include_all(&mut self, names: &[String]) {
        for name in names {
            self.add(name, None, Amount::ZERO);
        }
    }

    pub(crate) fn total(&self) -> Amount {
        self.amounts.values().sum()
    }

    fn into_aggregates(self, total: Amount) -> Vec<CategoryAggregate> {
        let Self { order, mut amounts } = self;
        order
            .into_iter()
            .map(|key| {
                let amount = amounts.remove(&key).unwrap_or_default();
                let (category_name, sub_category_name) = key;
                CategoryAggregate {
                    category_name,
                    sub_category_name,
                    amount,
                    percent: percent(amount, total),
                }
            })
            .collect()
    }
}

/// Truncated `amount / total * 100`, zero when the total is not positive, clamped to 0..=100.
fn percent(amount: Amount, total: Amount) -> u8 {
    if !total.is_positive() {
        return 0;
    }
    let ratio = amount
        .value()
        .checked_div(total.value())
        .and_then(|r| r.checked_mul(Decimal::ONE_HUNDRED))
        .unwrap_or_default();
    ratio.trunc().to_i64().unwrap_or_default().clamp(0, 100) as u8
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PriorityLevel {
    High,
    Medium,
    Low,
    Other,
}

impl PriorityLevel {
    const ALL: [PriorityLevel; 4] = [
        PriorityLevel::High,
        PriorityLevel::Medium,
        PriorityLevel::Low,
        PriorityLevel::Other,
    ];

    fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "tinggi" | "high" => PriorityLevel::High,
            "sedang" | "medium" => PriorityLevel::Medium,
            "rendah" | "low" => PriorityLevel::Low,
            _ => PriorityLevel::Other,
        }
    }

    fn level(&self) -> &'static str {
        match self {
            PriorityLevel::High => "high",
            PriorityLevel::Medium => "medium",
            PriorityLevel::Low => "low",
            PriorityLevel::Other => "other",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            PriorityLevel::High => "Tinggi",
            PriorityLevel::Medium => "Sedang",
            PriorityLevel::Low => "Rendah",
            PriorityLevel::Other => "Lainnya",
        }
    }

    fn index(&self) -> usize {
        match self {
            PriorityLevel::High => 0,
            PriorityLevel::Medium => 1,
            PriorityLevel::Low => 2,
            PriorityLevel::Other => 3,
        }
    }
}

/// Accumulates expense amounts per priority level.
#[derive(Debug, Default, Clone)]
pub(crate) struct PriorityTally {
    amounts: [Amount; 4],
}

impl PriorityTally {
    pub(crate) fn add(&mut self, label: &str, amount: Amount) {
        self.amounts[PriorityLevel::from_label(label).index()] += amount;
    }

    /// Adds (priority label, amount) breakdown rows.
    pub(crate) fn add_breakdown_rows(&mut self, rows: &[Vec<Cell>]) {
        for row in rows {
            let label = cell_at(row, 0).to_trimmed();
            let amount = Amount::from_cell(cell_at(row, 1));
            if label.is_empty() && amount.is_zero() {
                continue;
            }
            self.add(&label, amount);
        }
    }

    /// Adds expense records by their priority. A record without a priority counts as other.
    pub(crate) fn add_records<'a>(
        &mut self,
        records: impl IntoIterator<Item = &'a TransactionRecord>,
    ) {
        for record in records {
            self.add(record.priority().unwrap_or_default(), record.amount().abs());
        }
    }

    /// High, medium and low are always present. Other only appears when it is non-zero.
    fn into_buckets(self) -> Vec<PriorityBucket> {
        PriorityLevel::ALL
            .iter()
            .filter_map(|level| {
                let amount = self.amounts[level.index()];
                if *level == PriorityLevel::Other && amount.is_zero() {
                    return None;
                }
                Some(PriorityBucket {
                    level: level.level().to_string(),
                    label: level.label().to_string(),
                    amount,
                    amount_display: amount.to_string(),
                })
            })
            .collect()
    }
}

/// The expense inputs for one report.
#[derive(Debug, Default, Clone)]
pub(crate) struct ExpenseData {
    /// The sheet's own total cell. Only set for single-sheet periods.
    pub(crate) total_cell: Option<Amount>,
    pub(crate) categories: CategoryTally,
    pub(crate) priorities: PriorityTally,
}

/// The income inputs for one report.
#[derive(Debug, Default, Clone)]
pub(crate) struct IncomeData {
    /// The sheet's own total cell. Only set for single-sheet periods.
    pub(crate) total_cell: Option<Amount>,
    pub(crate) categories: CategoryTally,
}

pub(crate) fn expense_report(data: ExpenseData, context: &PeriodContext) -> AnalysisReport {
    let ExpenseData {
        total_cell,
        categories,
        priorities,
    } = data;
    let mut report = build_report(total_cell, categories, context);
    report.priority_distribution = Some(priorities.into_buckets());
    report
}

/// Builds the income report. Every name in `master_categories` appears in the categories, with
/// zero when there was no income for it, and categories are sorted by name.
pub(crate) fn income_report(
    data: IncomeData,
    master_categories: &[String],
    context: &PeriodContext,
) -> AnalysisReport {
    let IncomeData {
        total_cell,
        mut categories,
    } = data;
    categories.include_all(master_categories);
    let mut report = build_report(total_cell, categories, context);
    report
        .categories
        .sort_by(|a, b| a.category_name.cmp(&b.category_name));
    report.top_category = top_category(&report.categories);
    report
}

fn build_report(
    total_cell: Option<Amount>,
    categories: CategoryTally,
    context: &PeriodContext,
) -> AnalysisReport {
    let total = match total_cell {
        Some(total) if !total.is_zero() => total,
        _ => categories.total(),
    };
    let categories = categories.into_aggregates(total);
    let top_category = top_category(&categories);
    AnalysisReport {
        period: context.period,
        period_label: context.label.clone(),
        total_amount: total,
        total_display: total.to_string(),
        categories,
        top_category,
        daily_average: daily_average(total, context.divisor),
        priority_distribution: None,
    }
}

/// The first category with the largest positive amount.
fn top_category(categories: &[CategoryAggregate]) -> TopCategory {
    let top = categories
        .iter()
        .filter(|c| c.amount.is_positive())
        .fold(None, |best: Option<&CategoryAggregate>, c| match best {
            Some(b) if b.amount >= c.amount => Some(b),
            _ => Some(c),
        });
    match top {
        Some(c) => TopCategory {
            name: c.display_name(),
            total: c.amount,
            total_display: c.amount.to_string(),
        },
        None => TopCategory {
            name: NO_TOP_CATEGORY.to_string(),
            total: Amount::ZERO,
            total_display: Amount::ZERO.to_string(),
        },
    }
}

fn daily_average(total: Amount, divisor: u32) -> DailyAverage {
    let divisor = Decimal::from(divisor.max(1));
    let amount = Amount::new((total.value() / divisor).round_dp(2));
    DailyAverage {
        label: DAILY_AVERAGE_LABEL.to_string(),
        amount,
        amount_display: amount.to_string(),
    }
}
