//! Turns rows read from month sheets into listings and analysis reports. Nothing in here talks to
//! a sheet.
mod analysis;
mod grouping;

pub use analysis::{
    Analysis, AnalysisReport, CategoryAggregate, DailyAverage, PriorityBucket, TopCategory,
};
pub(crate) use analysis::{expense_report, income_report, ExpenseData, IncomeData, PeriodContext};
pub(crate) use grouping::group_transactions;
pub use grouping::{TransactionFilter, TransactionGroup};
