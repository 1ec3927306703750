//! The `Ledger` reads and writes the month sheets and the master sheet of one spreadsheet. It turns
//! raw ranges into transaction listings and analysis reports, and writes new transactions and
//! budgets back.

use crate::api::{self, qualified, A1Range, Mode, Rows, Sheet, SheetRange};
use crate::clock::Clock;
use crate::error::{ErrorType, IntoResult, Res};
use crate::model::{
    map_rows, month_name, names_from_rows, Amount, CategoryBudget, CategoryBudgets,
    NewTransaction, Period, SaveCategories, TransactionKind, TransactionReceipt,
    TransactionRecord,
};
use crate::report::{
    expense_report, group_transactions, income_report, Analysis, ExpenseData, IncomeData,
    PeriodContext, TransactionFilter, TransactionGroup,
};
use crate::{Config, Layout, Result};
use chrono::{Datelike, NaiveDate};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info};

/// How new transactions are timestamped in the sheet.
const TIMESTAMP_FORMAT: &str = "%m/%d/%Y %H:%M:%S";

/// Access to one spreadsheet through a `Sheet`, using the configured layout.
pub struct Ledger {
    sheet: Box<dyn Sheet + Send>,
    spreadsheet_id: String,
    layout: Layout,
    master_sheet: String,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for Ledger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ledger")
            .field("spreadsheet_id", &self.spreadsheet_id)
            .field("master_sheet", &self.master_sheet)
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}

impl Ledger {
    pub(crate) fn new(
        sheet: Box<dyn Sheet + Send>,
        spreadsheet_id: impl Into<String>,
        layout: Layout,
        master_sheet: impl Into<String>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            sheet,
            spreadsheet_id: spreadsheet_id.into(),
            layout,
            master_sheet: master_sheet.into(),
            clock,
        }
    }

    /// Opens the spreadsheet named in `config`, or `spreadsheet_id` when given.
    pub async fn from_config(
        config: &Config,
        mode: Mode,
        spreadsheet_id: Option<&str>,
    ) -> Result<Self> {
        let sheet = api::sheet(config, mode).await.pub_result(ErrorType::Auth)?;
        let spreadsheet_id = spreadsheet_id
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(config.spreadsheet_id());
        Ok(Self::new(
            sheet,
            spreadsheet_id,
            config.layout().clone(),
            config.master_sheet(),
            mode.clock(),
        ))
    }

    pub fn spreadsheet_id(&self) -> &str {
        &self.spreadsheet_id
    }

    /// The month sheet for today, e.g. `Oktober`.
    pub fn current_sheet_name(&self) -> String {
        month_name(self.clock.today().month()).to_string()
    }

    /// Lists the transactions of `sheet_name` that pass `filter`, grouped by day.
    pub async fn list_transactions(
        &mut self,
        sheet_name: &str,
        filter: &TransactionFilter,
    ) -> Result<Vec<TransactionGroup>> {
        let kinds: Vec<TransactionKind> = [TransactionKind::Expense, TransactionKind::Income]
            .into_iter()
            .filter(|kind| filter.includes(*kind))
            .collect();
        let ranges: Vec<String> = kinds
            .iter()
            .map(|kind| qualified(sheet_name, self.block(*kind)))
            .collect();
        let blocks = self
            .read_ranges(&ranges)
            .await
            .pub_result(ErrorType::SourceUnavailable)?;

        let mut records: Vec<TransactionRecord> = Vec::new();
        for (kind, rows) in kinds.into_iter().zip(blocks) {
            records.extend(
                map_rows(kind, &rows)
                    .into_iter()
                    .filter(|record| filter.matches(record)),
            );
        }
        debug!("{} transactions in {sheet_name} matched", records.len());
        Ok(group_transactions(records, self.clock.today()))
    }

    /// Builds the expense and income reports for `period`, counted from `sheet_name`.
    ///
    /// Any failed read fails the whole analysis, including the read of the master income
    /// categories.
    pub async fn analysis(&mut self, sheet_name: &str, period: Period) -> Result<Analysis> {
        let today = self.clock.today();
        let context = PeriodContext {
            period,
            label: period.label(sheet_name, today),
            divisor: period.day_divisor(today),
        };
        let master_income = self
            .master_income_categories()
            .await
            .pub_result(ErrorType::SourceUnavailable)?;

        let (expense, income) = match period {
            Period::Day => self.day_data(sheet_name, today).await,
            Period::Month => self.month_data(sheet_name).await,
            Period::ThreeMonths | Period::SixMonths | Period::Year => {
                let sheets = period.resolve_sheets(sheet_name, today);
                self.multi_sheet_data(&sheets).await
            }
        }
        .pub_result(ErrorType::SourceUnavailable)?;

        Ok(Analysis {
            expense: expense_report(expense, &context),
            income: income_report(income, &master_income, &context),
        })
    }

    /// Writes `transaction` into the first free row of its block in `sheet_name`.
    pub async fn record_transaction(
        &mut self,
        sheet_name: &str,
        kind: TransactionKind,
        transaction: &NewTransaction,
        author: Option<&str>,
    ) -> Result<TransactionReceipt> {
        let occurred_at = transaction
            .validate()
            .pub_result(ErrorType::InvalidInput)?
            .unwrap_or_else(|| self.clock.now().naive_local());
        let transaction_at = occurred_at.format(TIMESTAMP_FORMAT).to_string();
        let author = author.map(str::trim).filter(|s| !s.is_empty());

        let block = *self.block(kind);
        let existing = self
            .sheet
            .get_range(&self.spreadsheet_id, &qualified(sheet_name, &block))
            .await
            .pub_result(ErrorType::SourceUnavailable)?;
        let index = existing.len();
        let range = qualified(sheet_name, &block.row(index));
        let values = vec![transaction.row_values(kind, &transaction_at, author)];
        self.sheet
            .write_ranges(
                &self.spreadsheet_id,
                &[SheetRange {
                    range: range.clone(),
                    values,
                }],
            )
            .await
            .pub_result(ErrorType::SourceUnavailable)?;
        info!("Recorded {kind} '{}' in {range}", transaction.description.trim());

        Ok(TransactionReceipt {
            id: kind.id(index),
            kind,
            range,
            transaction_at,
        })
    }

    /// Reads the budgets and the expense and income categories from the master sheet.
    pub async fn categories(&mut self) -> Result<CategoryBudgets> {
        let ranges = [
            self.master(&self.layout.master_categories),
            self.master(&self.layout.master_monthly_budget),
            self.master(&self.layout.master_daily_budget),
            self.master(&self.layout.master_income_categories),
        ];
        let mut results = self
            .read_ranges(&ranges)
            .await
            .pub_result(ErrorType::SourceUnavailable)?
            .into_iter();
        let categories = results.next().unwrap_or_default();
        let monthly = results.next().unwrap_or_default();
        let daily = results.next().unwrap_or_default();
        let income = results.next().unwrap_or_default();
        Ok(CategoryBudgets {
            monthly_budget: first_amount(&monthly).unwrap_or(Amount::ZERO),
            daily_budget: first_amount(&daily).unwrap_or(Amount::ZERO),
            categories: categories
                .iter()
                .filter_map(|row| CategoryBudget::from_row(row))
                .collect(),
            income_categories: names_from_rows(&income),
        })
    }

    /// Replaces the budgets and expense categories on the master sheet, and the income categories
    /// when they are given. Returns what the master sheet holds afterwards.
    pub async fn save_categories(&mut self, save: &SaveCategories) -> Result<CategoryBudgets> {
        save.validate().pub_result(ErrorType::InvalidInput)?;
        let layout = &self.layout;

        // Rows are overwritten in place. Only the leftover rows below them are cleared, after the
        // write.
        let mut writes = vec![
            SheetRange {
                range: self.master(&layout.master_monthly_budget),
                values: vec![vec![save.monthly_budget.to_cell_string()]],
            },
            SheetRange {
                range: self.master(&layout.master_daily_budget),
                values: vec![vec![save.daily_budget.to_cell_string()]],
            },
        ];
        let mut clears = Vec::new();
        if !save.categories.is_empty() {
            writes.push(SheetRange {
                range: self.master(&layout.master_categories.rows(0, save.categories.len())),
                values: save.categories.iter().map(CategoryBudget::to_row).collect(),
            });
        }
        clears.extend(layout.master_categories.below(save.categories.len()));
        if let Some(income) = &save.income_categories {
            if !income.is_empty() {
                writes.push(SheetRange {
                    range: self.master(&layout.master_income_categories.rows(0, income.len())),
                    values: income.iter().map(|name| vec![name.trim().to_string()]).collect(),
                });
            }
            clears.extend(layout.master_income_categories.below(income.len()));
        }
        let clears: Vec<String> = clears.iter().map(|range| self.master(range)).collect();

        self.sheet
            .write_ranges(&self.spreadsheet_id, &writes)
            .await
            .pub_result(ErrorType::SourceUnavailable)?;
        if !clears.is_empty() {
            self.sheet
                .clear_ranges(&self.spreadsheet_id, &clears)
                .await
                .pub_result(ErrorType::SourceUnavailable)?;
        }
        info!(
            "Saved {} categories to {}",
            save.categories.len(),
            self.master_sheet
        );
        self.categories().await
    }

    fn block(&self, kind: TransactionKind) -> &A1Range {
        match kind {
            TransactionKind::Expense => &self.layout.expense_block,
            TransactionKind::Income => &self.layout.income_block,
        }
    }

    fn master(&self, range: &A1Range) -> String {
        qualified(&self.master_sheet, range)
    }

    /// Reads `ranges` in one batch and returns their rows in the same order.
    async fn read_ranges(&mut self, ranges: &[String]) -> Res<Vec<Rows>> {
        let results = self
            .sheet
            .batch_get_ranges(&self.spreadsheet_id, ranges)
            .await?;
        Ok(results.into_iter().map(|(_, rows)| rows).collect())
    }

    async fn master_income_categories(&mut self) -> Res<Vec<String>> {
        let range = self.master(&self.layout.master_income_categories);
        let rows = self.sheet.get_range(&self.spreadsheet_id, &range).await?;
        Ok(names_from_rows(&rows))
    }

    /// A single day is summarized from the transaction blocks, since the breakdown ranges cover
    /// the whole month.
    async fn day_data(&mut self, sheet: &str, today: NaiveDate) -> Res<(ExpenseData, IncomeData)> {
        let ranges = [
            qualified(sheet, &self.layout.expense_block),
            qualified(sheet, &self.layout.income_block),
        ];
        let mut results = self.read_ranges(&ranges).await?.into_iter();
        let expenses = map_rows(TransactionKind::Expense, &results.next().unwrap_or_default());
        let incomes = map_rows(TransactionKind::Income, &results.next().unwrap_or_default());
        let is_today = move |record: &&TransactionRecord| record.occurred_at().date() == today;

        let mut expense = ExpenseData::default();
        expense.categories.add_records(expenses.iter().filter(is_today));
        expense.priorities.add_records(expenses.iter().filter(is_today));
        let mut income = IncomeData::default();
        income.categories.add_records(incomes.iter().filter(is_today));
        Ok((expense, income))
    }

    async fn month_data(&mut self, sheet: &str) -> Res<(ExpenseData, IncomeData)> {
        let layout = &self.layout;
        let ranges = [
            qualified(sheet, &layout.expense_total),
            qualified(sheet, &layout.income_total),
            qualified(sheet, &layout.expense_categories),
            qualified(sheet, &layout.expense_priorities),
            qualified(sheet, &layout.income_block),
        ];
        let mut results = self.read_ranges(&ranges).await?.into_iter();
        let expense_total = results.next().unwrap_or_default();
        let income_total = results.next().unwrap_or_default();
        let categories = results.next().unwrap_or_default();
        let priorities = results.next().unwrap_or_default();
        let incomes = results.next().unwrap_or_default();

        let mut expense = ExpenseData {
            total_cell: first_amount(&expense_total),
            ..Default::default()
        };
        expense.categories.add_breakdown_rows(&categories);
        expense.priorities.add_breakdown_rows(&priorities);
        let mut income = IncomeData {
            total_cell: first_amount(&income_total),
            ..Default::default()
        };
        income
            .categories
            .add_records(&map_rows(TransactionKind::Income, &incomes));
        Ok((expense, income))
    }

    /// Merges the breakdowns of every sheet in `sheets` that exists, one batch per sheet. Total
    /// cells are not read; the totals are the sums of the categories.
    async fn multi_sheet_data(&mut self, sheets: &[String]) -> Res<(ExpenseData, IncomeData)> {
        let known: HashSet<String> = self
            .sheet
            .sheet_names(&self.spreadsheet_id)
            .await?
            .into_iter()
            .collect();
        let mut expense = ExpenseData::default();
        let mut income = IncomeData::default();
        for sheet in sheets {
            if !known.contains(sheet) {
                debug!("Skipping '{sheet}', the spreadsheet has no such sheet");
                continue;
            }
            let layout = &self.layout;
            let ranges = [
                qualified(sheet, &layout.expense_categories),
                qualified(sheet, &layout.expense_priorities),
                qualified(sheet, &layout.income_block),
            ];
            let mut results = self.read_ranges(&ranges).await?.into_iter();
            expense
                .categories
                .add_breakdown_rows(&results.next().unwrap_or_default());
            expense
                .priorities
                .add_breakdown_rows(&results.next().unwrap_or_default());
            income.categories.add_records(&map_rows(
                TransactionKind::Income,
                &results.next().unwrap_or_default(),
            ));
        }
        Ok((expense, income))
    }
}

/// The amount in the first cell of a single-cell range, or `None` when the cell is empty.
fn first_amount(rows: &Rows) -> Option<Amount> {
    rows.first()
        .and_then(|row| row.first())
        .map(Amount::from_cell)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::TestSheet;

    fn ledger() -> Ledger {
        Ledger::new(
            Box::new(TestSheet::new()),
            uuid::Uuid::new_v4().to_string(),
            Layout::default(),
            "Kategori",
            Mode::Testing.clock(),
        )
    }

    fn rp(value: i64) -> Amount {
        Amount::from(value)
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn ids(group: &TransactionGroup) -> Vec<&str> {
        group.items.iter().map(|item| item.id()).collect()
    }

    #[tokio::test]
    async fn test_current_sheet_name() {
        assert_eq!(ledger().current_sheet_name(), "Oktober");
    }

    #[tokio::test]
    async fn test_list_transactions_grouped_by_day() {
        let mut ledger = ledger();
        let groups = ledger
            .list_transactions("Oktober", &TransactionFilter::default())
            .await
            .unwrap();
        let dates: Vec<NaiveDate> = groups.iter().map(|g| g.date).collect();
        assert_eq!(
            dates,
            vec![
                date(2026, 10, 17),
                date(2026, 10, 12),
                date(2026, 10, 18),
                date(2026, 10, 5),
                date(2026, 10, 1),
            ]
        );

        let yesterday = &groups[0];
        assert_eq!(yesterday.label, "Kemarin");
        assert_eq!(ids(yesterday), vec!["txn_inc_2", "txn_exp_3"]);
        assert_eq!(yesterday.total_expense, rp(100_000));
        assert_eq!(yesterday.total_income, rp(1_500_000));

        let today = &groups[2];
        assert_eq!(today.label, "Hari Ini");
        assert_eq!(ids(today), vec!["txn_exp_2", "txn_exp_1"]);
        assert_eq!(today.total_expense, rp(70_000));
        assert_eq!(today.total_income, Amount::ZERO);

        assert_eq!(groups[1].label, "12 Oct 2026");

        // The row with an unreadable timestamp is left out, but it still holds its position.
        let count: usize = groups.iter().map(|g| g.items.len()).sum();
        assert_eq!(count, 7);
        assert!(groups
            .iter()
            .flat_map(|g| g.items.iter())
            .all(|item| item.id() != "txn_exp_6"));
    }

    #[tokio::test]
    async fn test_list_transactions_with_filters() {
        let mut ledger = ledger();
        let filter = TransactionFilter::new(None, Some("makanan"), Some("expense")).unwrap();
        let groups = ledger.list_transactions("Oktober", &filter).await.unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(ids(&groups[0]), vec!["txn_exp_2", "txn_exp_1"]);

        let filter = TransactionFilter::new(Some("2026-10-17"), None, None).unwrap();
        let groups = ledger.list_transactions("Oktober", &filter).await.unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].items.len(), 2);

        let filter = TransactionFilter::new(None, None, Some("income")).unwrap();
        let groups = ledger.list_transactions("September", &filter).await.unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(ids(&groups[0]), vec!["txn_inc_1"]);
    }

    #[tokio::test]
    async fn test_missing_sheet_reads_as_empty() {
        let mut ledger = ledger();
        let groups = ledger
            .list_transactions("Desember", &TransactionFilter::default())
            .await
            .unwrap();
        assert!(groups.is_empty());

        let analysis = ledger.analysis("Maret", Period::Month).await.unwrap();
        let expense = &analysis.expense;
        assert_eq!(expense.total_amount, Amount::default());
        assert!(expense.categories.is_empty());
        assert_eq!(expense.top_category.name, "-");
        let income = &analysis.income;
        assert_eq!(income.total_amount, Amount::default());
        assert_eq!(income.categories.len(), 3);
        assert!(income.categories.iter().all(|c| c.percent == 0));
    }

    #[tokio::test]
    async fn test_record_into_missing_sheet_fails() {
        let mut ledger = ledger();
        let err = ledger
            .record_transaction("Desember", TransactionKind::Expense, &coffee(), None)
            .await
            .unwrap_err();
        assert_eq!(err.error_type(), ErrorType::SourceUnavailable);
    }

    #[tokio::test]
    async fn test_month_analysis_uses_total_cells() {
        let mut ledger = ledger();
        let analysis = ledger.analysis("Oktober", Period::Month).await.unwrap();

        let expense = &analysis.expense;
        assert_eq!(expense.period, Period::Month);
        assert_eq!(expense.total_amount, rp(580_000));
        assert_eq!(expense.total_display, "Rp 580.000");
        assert_eq!(expense.categories.len(), 4);
        assert_eq!(expense.top_category.name, "Tagihan - Listrik");
        let priorities = expense.priority_distribution.as_ref().unwrap();
        let levels: Vec<&str> = priorities.iter().map(|b| b.level.as_str()).collect();
        assert_eq!(levels, vec!["high", "medium", "low"]);
        assert_eq!(priorities[0].amount, rp(495_000));

        let income = &analysis.income;
        assert_eq!(income.total_amount, rp(9_500_000));
        let names: Vec<&str> = income
            .categories
            .iter()
            .map(|c| c.category_name.as_str())
            .collect();
        assert_eq!(names, vec!["Bonus", "Gaji", "Investasi", "Proyek"]);
        assert_eq!(income.categories[0].amount, Amount::ZERO);
        assert_eq!(income.categories[0].percent, 0);
        assert_eq!(income.top_category.name, "Gaji");
        assert!(income.priority_distribution.is_none());
    }

    #[tokio::test]
    async fn test_three_month_analysis_sums_categories() {
        let mut ledger = ledger();
        let analysis = ledger
            .analysis("Oktober", Period::ThreeMonths)
            .await
            .unwrap();

        let expense = &analysis.expense;
        assert_eq!(expense.total_amount, rp(1_280_000));
        let categories: Vec<(String, Amount)> = expense
            .categories
            .iter()
            .map(|c| (c.display_name(), c.amount))
            .collect();
        assert_eq!(
            categories,
            vec![
                ("Makanan".to_string(), rp(420_000)),
                ("Hiburan".to_string(), rp(110_000)),
                ("Tagihan - Listrik".to_string(), rp(650_000)),
                ("Transportasi - Bensin".to_string(), rp(100_000)),
            ]
        );
        let sum: Amount = expense.categories.iter().map(|c| c.amount).sum();
        assert_eq!(sum, expense.total_amount);
        assert!(expense.categories.iter().map(|c| c.percent as u32).sum::<u32>() <= 100);
        assert_eq!(expense.top_category.name, "Tagihan - Listrik");
        // August 1st through October 18th is 79 days.
        assert_eq!(expense.daily_average.amount.value().to_string(), "16202.53");

        let priorities: Vec<(String, Amount)> = expense
            .priority_distribution
            .as_ref()
            .unwrap()
            .iter()
            .map(|b| (b.level.clone(), b.amount))
            .collect();
        assert_eq!(
            priorities,
            vec![
                ("high".to_string(), rp(795_000)),
                ("medium".to_string(), rp(375_000)),
                ("low".to_string(), rp(60_000)),
                ("other".to_string(), rp(50_000)),
            ]
        );

        let income = &analysis.income;
        assert_eq!(income.total_amount, rp(19_500_000));
        let percents: Vec<(&str, u8)> = income
            .categories
            .iter()
            .map(|c| (c.category_name.as_str(), c.percent))
            .collect();
        assert_eq!(
            percents,
            vec![("Bonus", 10), ("Gaji", 82), ("Investasi", 0), ("Proyek", 7)]
        );
        assert_eq!(income.top_category.total, rp(16_000_000));
    }

    #[tokio::test]
    async fn test_year_analysis_skips_missing_sheets() {
        let mut ledger = ledger();
        let analysis = ledger.analysis("Oktober", Period::Year).await.unwrap();
        assert_eq!(analysis.expense.total_amount, rp(1_280_000));
        assert_eq!(analysis.income.total_amount, rp(19_500_000));
        assert_eq!(analysis.expense.period, Period::Year);
        assert_eq!(analysis.expense.top_category.name, "Tagihan - Listrik");
    }

    #[tokio::test]
    async fn test_day_analysis_reads_todays_transactions() {
        let mut ledger = ledger();
        let analysis = ledger.analysis("Oktober", Period::Day).await.unwrap();

        let expense = &analysis.expense;
        assert_eq!(expense.total_amount, rp(70_000));
        assert_eq!(expense.categories.len(), 1);
        assert_eq!(expense.categories[0].category_name, "Makanan");
        assert_eq!(expense.categories[0].percent, 100);
        assert_eq!(expense.daily_average.amount, rp(70_000));
        let priorities: Vec<Amount> = expense
            .priority_distribution
            .as_ref()
            .unwrap()
            .iter()
            .map(|b| b.amount)
            .collect();
        assert_eq!(priorities, vec![rp(45_000), rp(25_000), Amount::ZERO]);

        let income = &analysis.income;
        assert_eq!(income.total_amount, Amount::ZERO);
        assert_eq!(income.top_category.name, "-");
        assert_eq!(income.categories.len(), 3);
    }

    #[tokio::test]
    async fn test_analysis_fails_without_master_sheet() {
        let mut ledger = ledger();
        let mut state = TestSheet::get_state(ledger.spreadsheet_id());
        state.remove("Kategori");
        TestSheet::set_state(ledger.spreadsheet_id(), state);
        let err = ledger
            .analysis("Oktober", Period::Month)
            .await
            .unwrap_err();
        assert_eq!(err.error_type(), ErrorType::SourceUnavailable);
    }

    fn coffee() -> NewTransaction {
        NewTransaction {
            description: "Kopi Sore".into(),
            category: "Makanan".into(),
            amount: rp(18_000),
            priority: Some("Rendah".into()),
            notes: None,
            transaction_at: None,
        }
    }

    #[tokio::test]
    async fn test_record_expense_appends_after_last_row() {
        let mut ledger = ledger();
        let receipt = ledger
            .record_transaction("Oktober", TransactionKind::Expense, &coffee(), Some("carol"))
            .await
            .unwrap();
        assert_eq!(receipt.id, "txn_exp_7");
        assert_eq!(receipt.range, "Oktober!A8:G8");
        assert_eq!(receipt.transaction_at, "10/18/2026 21:00:00");

        let state = TestSheet::get_state(ledger.spreadsheet_id());
        let row = &state["Oktober"][7];
        let expected = [
            "Kopi Sore",
            "Makanan",
            "Rendah",
            "18000",
            "",
            "10/18/2026 21:00:00",
            "carol",
        ];
        assert_eq!(&row[..7], &expected);

        let filter = TransactionFilter::new(Some("2026-10-18"), None, Some("expense")).unwrap();
        let groups = ledger.list_transactions("Oktober", &filter).await.unwrap();
        assert_eq!(ids(&groups[0]), vec!["txn_exp_7", "txn_exp_2", "txn_exp_1"]);
        assert_eq!(groups[0].total_expense, rp(88_000));
    }

    #[tokio::test]
    async fn test_record_income_with_timestamp() {
        let mut ledger = ledger();
        let transaction = NewTransaction {
            description: "Dividen".into(),
            category: "Investasi".into(),
            amount: rp(250_000),
            transaction_at: Some("2026-10-16 10:30".into()),
            ..Default::default()
        };
        let receipt = ledger
            .record_transaction("Oktober", TransactionKind::Income, &transaction, None)
            .await
            .unwrap();
        assert_eq!(receipt.id, "txn_inc_3");
        assert_eq!(receipt.range, "Oktober!I4:N4");
        assert_eq!(receipt.transaction_at, "10/16/2026 10:30:00");

        let analysis = ledger.analysis("Oktober", Period::Month).await.unwrap();
        let investasi = analysis
            .income
            .categories
            .iter()
            .find(|c| c.category_name == "Investasi")
            .unwrap();
        assert_eq!(investasi.amount, rp(250_000));
    }

    #[tokio::test]
    async fn test_record_rejects_bad_input_before_writing() {
        let mut ledger = ledger();
        let before = TestSheet::get_state(ledger.spreadsheet_id());
        let mut transaction = coffee();
        transaction.amount = Amount::ZERO;
        let err = ledger
            .record_transaction("Oktober", TransactionKind::Expense, &transaction, None)
            .await
            .unwrap_err();
        assert_eq!(err.error_type(), ErrorType::InvalidInput);

        let mut transaction = coffee();
        transaction.transaction_at = Some("kemarin sore".into());
        let err = ledger
            .record_transaction("Oktober", TransactionKind::Expense, &transaction, None)
            .await
            .unwrap_err();
        assert_eq!(err.error_type(), ErrorType::InvalidInput);
        assert_eq!(TestSheet::get_state(ledger.spreadsheet_id()), before);
    }

    #[tokio::test]
    async fn test_categories() {
        let mut ledger = ledger();
        let budgets = ledger.categories().await.unwrap();
        assert_eq!(budgets.monthly_budget, rp(5_000_000));
        assert_eq!(budgets.daily_budget, rp(150_000));
        assert_eq!(budgets.categories.len(), 4);
        assert_eq!(budgets.categories[3].category_name, "Tagihan");
        assert_eq!(
            budgets.categories[3].sub_category_name.as_deref(),
            Some("Listrik")
        );
        assert_eq!(budgets.categories[3].budget, rp(400_000));
        assert_eq!(budgets.income_categories, vec!["Gaji", "Bonus", "Investasi"]);
    }

    #[tokio::test]
    async fn test_save_categories_replaces_the_list() {
        let mut ledger = ledger();
        let save = SaveCategories {
            monthly_budget: rp(6_000_000),
            daily_budget: rp(200_000),
            categories: vec![
                CategoryBudget {
                    category_name: "Makanan".into(),
                    sub_category_name: None,
                    budget: rp(2_000_000),
                },
                CategoryBudget {
                    category_name: "Tagihan".into(),
                    sub_category_name: Some("Internet".into()),
                    budget: rp(350_000),
                },
            ],
            income_categories: None,
        };
        let budgets = ledger.save_categories(&save).await.unwrap();
        assert_eq!(budgets.monthly_budget, rp(6_000_000));
        assert_eq!(budgets.daily_budget, rp(200_000));
        assert_eq!(budgets.categories, save.categories);
        assert_eq!(budgets.income_categories, vec!["Gaji", "Bonus", "Investasi"]);

        let save = SaveCategories {
            income_categories: Some(vec!["Gaji".into(), "Dividen".into()]),
            ..save
        };
        let budgets = ledger.save_categories(&save).await.unwrap();
        assert_eq!(budgets.income_categories, vec!["Gaji", "Dividen"]);
    }

    /// Reads through to a `TestSheet` but fails every write.
    struct ReadOnlySheet(TestSheet);

    #[async_trait::async_trait]
    impl Sheet for ReadOnlySheet {
        async fn sheet_names(&mut self, spreadsheet_id: &str) -> Res<Vec<String>> {
            self.0.sheet_names(spreadsheet_id).await
        }

        async fn get_range(&mut self, spreadsheet_id: &str, range: &str) -> Res<Rows> {
            self.0.get_range(spreadsheet_id, range).await
        }

        async fn batch_get_ranges(
            &mut self,
            spreadsheet_id: &str,
            ranges: &[String],
        ) -> Res<Vec<(String, Rows)>> {
            self.0.batch_get_ranges(spreadsheet_id, ranges).await
        }

        async fn write_ranges(&mut self, _: &str, _: &[SheetRange]) -> Res<()> {
            anyhow::bail!("The spreadsheet is read-only")
        }

        async fn clear_ranges(&mut self, spreadsheet_id: &str, ranges: &[String]) -> Res<()> {
            self.0.clear_ranges(spreadsheet_id, ranges).await
        }
    }

    #[tokio::test]
    async fn test_failed_save_keeps_the_categories() {
        let mut ledger = ledger();
        let mut read_only = Ledger::new(
            Box::new(ReadOnlySheet(TestSheet::new())),
            ledger.spreadsheet_id().to_string(),
            Layout::default(),
            "Kategori",
            Mode::Testing.clock(),
        );
        let save = SaveCategories {
            monthly_budget: rp(1_000_000),
            daily_budget: rp(50_000),
            categories: vec![CategoryBudget {
                category_name: "Makanan".into(),
                sub_category_name: None,
                budget: rp(900_000),
            }],
            income_categories: Some(vec!["Gaji".into()]),
        };
        let err = read_only.save_categories(&save).await.unwrap_err();
        assert_eq!(err.error_type(), ErrorType::SourceUnavailable);

        let budgets = ledger.categories().await.unwrap();
        assert_eq!(budgets.categories.len(), 4);
        assert_eq!(budgets.monthly_budget, rp(5_000_000));
        assert_eq!(budgets.income_categories, vec!["Gaji", "Bonus", "Investasi"]);
    }

    #[tokio::test]
    async fn test_save_categories_rejects_bad_input() {
        let mut ledger = ledger();
        let save = SaveCategories {
            monthly_budget: rp(-1),
            ..Default::default()
        };
        let err = ledger.save_categories(&save).await.unwrap_err();
        assert_eq!(err.error_type(), ErrorType::InvalidInput);
        assert_eq!(ledger.categories().await.unwrap().categories.len(), 4);
    }
}
