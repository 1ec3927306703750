use crate::error::Res;
use crate::model::{cell_at, parse_date, Amount, Cell};
use anyhow::{bail, ensure};
use chrono::NaiveDateTime;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Shown next to income items in transaction listings.
const INCOME_LABEL: &str = "PEMASUKAN";

/// Whether a transaction came from the expense block or the income block of a month sheet.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    JsonSchema,
    clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Expense,
    Income,
}

serde_plain::derive_display_from_serialize!(TransactionKind);
serde_plain::derive_fromstr_from_deserialize!(TransactionKind);

/// Positions of the fields within one row of a transaction block.
struct Columns {
    description: usize,
    category: usize,
    priority: Option<usize>,
    amount: usize,
    notes: usize,
    timestamp: usize,
    author: usize,
    /// Rows shorter than this are skipped.
    min_len: usize,
}

/// Expense block: description, category, priority, amount, notes, timestamp, author.
const EXPENSE_COLUMNS: Columns = Columns {
    description: 0,
    category: 1,
    priority: Some(2),
    amount: 3,
    notes: 4,
    timestamp: 5,
    author: 6,
    min_len: 6,
};

/// Income block: description, category, amount, notes, timestamp, author.
const INCOME_COLUMNS: Columns = Columns {
    description: 0,
    category: 1,
    priority: None,
    amount: 2,
    notes: 3,
    timestamp: 4,
    author: 5,
    min_len: 5,
};

impl TransactionKind {
    pub fn is_income(&self) -> bool {
        matches!(self, TransactionKind::Income)
    }

    fn columns(&self) -> &'static Columns {
        match self {
            TransactionKind::Expense => &EXPENSE_COLUMNS,
            TransactionKind::Income => &INCOME_COLUMNS,
        }
    }

    /// The synthetic id of the row at `index` (0-based) within this kind's block.
    pub(crate) fn id(&self, index: usize) -> String {
        let prefix = match self {
            TransactionKind::Expense => "txn_exp",
            TransactionKind::Income => "txn_inc",
        };
        format!("{prefix}_{}", index + 1)
    }

    /// Applies the sign convention: expenses are negative, income is positive.
    fn signed(&self, amount: Amount) -> Amount {
        match self {
            TransactionKind::Expense => -amount.abs(),
            TransactionKind::Income => amount.abs(),
        }
    }
}

/// A single transaction read from a month sheet.
///
/// The `id` is positional: it is the 1-based row number within the block, so it changes when rows
/// above it are inserted or removed in the sheet.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct TransactionRecord {
    id: String,
    description: String,
    category: String,
    occurred_at: NaiveDateTime,
    /// `HH:MM`
    time: String,
    amount: Amount,
    amount_display: String,
    kind: TransactionKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    priority: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    author: Option<String>,
}

impl TransactionRecord {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        kind: TransactionKind,
        index: usize,
        description: impl Into<String>,
        category: impl Into<String>,
        occurred_at: NaiveDateTime,
        amount: Amount,
        priority: Option<String>,
        notes: Option<String>,
        author: Option<String>,
    ) -> Self {
        let amount = kind.signed(amount);
        Self {
            id: kind.id(index),
            description: description.into(),
            category: category.into(),
            occurred_at,
            time: occurred_at.format("%H:%M").to_string(),
            amount,
            amount_display: amount.signed_display(kind.is_income()),
            kind,
            label: kind.is_income().then(|| INCOME_LABEL.to_string()),
            priority,
            notes,
            author,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn occurred_at(&self) -> NaiveDateTime {
        self.occurred_at
    }

    pub fn time(&self) -> &str {
        &self.time
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }

    pub fn amount_display(&self) -> &str {
        &self.amount_display
    }

    pub fn kind(&self) -> TransactionKind {
        self.kind
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn priority(&self) -> Option<&str> {
        self.priority.as_deref()
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    pub fn author(&self) -> Option<&str> {
        self.author.as_deref()
    }
}

/// Maps the rows of one block into records. Short rows and rows without a readable timestamp are
/// skipped. Ids count every row of the block, skipped or not.
pub(crate) fn map_rows(kind: TransactionKind, rows: &[Vec<Cell>]) -> Vec<TransactionRecord> {
    rows.iter()
        .enumerate()
        .filter_map(|(index, row)| map_row(kind, index, row))
        .collect()
}

fn map_row(kind: TransactionKind, index: usize, row: &[Cell]) -> Option<TransactionRecord> {
    let columns = kind.columns();
    if row.len() < columns.min_len {
        debug!(
            "Skipping {kind} row {}: expected at least {} cells, found {}",
            index + 1,
            columns.min_len,
            row.len()
        );
        return None;
    }
    let timestamp = cell_at(row, columns.timestamp);
    let Some(occurred_at) = parse_date(timestamp) else {
        debug!(
            "Skipping {kind} row {}: unreadable timestamp '{timestamp}'",
            index + 1
        );
        return None;
    };
    Some(TransactionRecord::new(
        kind,
        index,
        cell_at(row, columns.description).to_trimmed(),
        cell_at(row, columns.category).to_trimmed(),
        occurred_at,
        Amount::from_cell(cell_at(row, columns.amount)),
        columns
            .priority
            .and_then(|ix| optional_text(cell_at(row, ix))),
        optional_text(cell_at(row, columns.notes)),
        optional_text(cell_at(row, columns.author)),
    ))
}

fn optional_text(cell: &Cell) -> Option<String> {
    let s = cell.to_trimmed();
    (!s.is_empty()).then_some(s)
}

/// The fields needed to record a new transaction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema, clap::Args)]
#[serde(rename_all = "snake_case")]
pub struct NewTransaction {
    /// What the money was spent on or received for.
    #[arg(long)]
    pub description: String,

    /// The category, e.g. `Makanan` or `Gaji`.
    #[arg(long)]
    pub category: String,

    /// The amount as a positive number. The sign is applied from the transaction kind. On the
    /// command line `.` separates thousands and `,` starts a fraction, so write `12,5` or
    /// `12.500`. `12.5` is refused.
    #[arg(long, value_parser = Amount::from_input)]
    #[schemars(with = "f64")]
    pub amount: Amount,

    /// Expense priority: `Tinggi`, `Sedang` or `Rendah`. Ignored for income.
    #[arg(long)]
    #[serde(default)]
    pub priority: Option<String>,

    /// Free-form notes.
    #[arg(long)]
    #[serde(default)]
    pub notes: Option<String>,

    /// When the transaction happened, e.g. `10/18/2026 08:15:00` or `2026-10-18 08:15`. Defaults
    /// to now (Asia/Jakarta).
    #[arg(long)]
    #[serde(default)]
    pub transaction_at: Option<String>,
}

impl NewTransaction {
    /// Checks required fields and that the timestamp is readable, returning the parsed timestamp.
    pub(crate) fn validate(&self) -> Res<Option<NaiveDateTime>> {
        ensure!(
            !self.description.trim().is_empty(),
            "A description is required"
        );
        ensure!(!self.category.trim().is_empty(), "A category is required");
        ensure!(
            self.amount.is_positive(),
            "The amount must be greater than zero, got {}",
            self.amount.value()
        );
        match self.transaction_at.as_deref().map(str::trim) {
            None => Ok(None),
            Some("") => bail!("transaction_at is empty"),
            Some(s) => match parse_date(&Cell::from(s)) {
                Some(t) => Ok(Some(t)),
                None => bail!("Unable to read transaction_at '{s}' as a date and time"),
            },
        }
    }

    /// The cells to write for this transaction, in block column order.
    pub(crate) fn row_values(
        &self,
        kind: TransactionKind,
        transaction_at: &str,
        author: Option<&str>,
    ) -> Vec<String> {
        let notes = self.notes.clone().unwrap_or_default();
        let author = author.unwrap_or_default().to_string();
        let mut row = vec![
            self.description.trim().to_string(),
            self.category.trim().to_string(),
        ];
        if !kind.is_income() {
            row.push(self.priority.clone().unwrap_or_default());
        }
        row.extend([
            self.amount.to_cell_string(),
            notes,
            transaction_at.to_string(),
            author,
        ]);
        row
    }
}

/// Confirms where a new transaction was written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TransactionReceipt {
    /// The id the transaction will have in listings, until rows above it change.
    pub id: String,
    pub kind: TransactionKind,
    /// The A1 range that was written, e.g. `Oktober!A8:G8`.
    pub range: String,
    pub transaction_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::str::FromStr;

    fn row(cells: &[&str]) -> Vec<Cell> {
        cells.iter().map(|s| Cell::from(*s)).collect()
    }

    #[test]
    fn test_expense_row() {
        let rows = vec![row(&[
            "Coffee",
            "Food",
            "Medium",
            "50000",
            "",
            "2/15/2026 08:30:00",
            "alice",
        ])];
        let records = map_rows(TransactionKind::Expense, &rows);
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.id(), "txn_exp_1");
        assert_eq!(record.amount(), Amount::from(-50_000));
        assert_eq!(record.amount_display(), "-Rp 50.000");
        assert_eq!(record.time(), "08:30");
        assert_eq!(
            record.occurred_at().date(),
            NaiveDate::from_ymd_opt(2026, 2, 15).unwrap()
        );
        assert_eq!(record.priority(), Some("Medium"));
        assert_eq!(record.notes(), None);
        assert_eq!(record.author(), Some("alice"));
        assert_eq!(record.label(), None);
    }

    #[test]
    fn test_income_row() {
        let rows = vec![row(&[
            "Gaji Oktober",
            "Gaji",
            "Rp 8.000.000",
            "",
            "10/1/2026 09:00:00",
        ])];
        let records = map_rows(TransactionKind::Income, &rows);
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.id(), "txn_inc_1");
        assert_eq!(record.amount(), Amount::from(8_000_000));
        assert_eq!(record.amount_display(), "+Rp 8.000.000");
        assert_eq!(record.label(), Some("PEMASUKAN"));
        assert_eq!(record.author(), None);
    }

    #[test]
    fn test_negative_income_is_made_positive() {
        let rows = vec![row(&["Refund", "Lain", "-Rp 5.000", "", "10/1/2026 09:00"])];
        let records = map_rows(TransactionKind::Income, &rows);
        assert_eq!(records[0].amount(), Amount::from(5_000));
    }

    #[test]
    fn test_skips_short_and_undated_rows_but_keeps_positions() {
        let rows = vec![
            row(&["Short", "Food", "Tinggi", "1000", ""]),
            row(&["Bad", "Food", "Tinggi", "1000", "", "not a date"]),
            row(&["Good", "Food", "Tinggi", "1000", "", "10/18/2026 08:00:00"]),
        ];
        let records = map_rows(TransactionKind::Expense, &rows);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id(), "txn_exp_3");
    }

    #[test]
    fn test_kind_plain_serde() {
        assert_eq!(TransactionKind::Expense.to_string(), "expense");
        assert_eq!(
            TransactionKind::from_str("income").unwrap(),
            TransactionKind::Income
        );
    }

    fn new_transaction() -> NewTransaction {
        NewTransaction {
            description: "Kopi".to_string(),
            category: "Makanan".to_string(),
            amount: Amount::from(25_000),
            priority: Some("Sedang".to_string()),
            notes: None,
            transaction_at: Some("10/18/2026 08:15:00".to_string()),
        }
    }

    #[test]
    fn test_validate() {
        let tx = new_transaction();
        assert!(tx.validate().unwrap().is_some());

        let mut missing_description = new_transaction();
        missing_description.description = "  ".to_string();
        assert!(missing_description.validate().is_err());

        let mut zero = new_transaction();
        zero.amount = Amount::ZERO;
        assert!(zero.validate().is_err());

        let mut bad_date = new_transaction();
        bad_date.transaction_at = Some("kemarin".to_string());
        assert!(bad_date.validate().is_err());

        let mut no_date = new_transaction();
        no_date.transaction_at = None;
        assert_eq!(no_date.validate().unwrap(), None);
    }

    #[test]
    fn test_row_values() {
        let tx = new_transaction();
        let expense = tx.row_values(TransactionKind::Expense, "10/18/2026 08:15:00", Some("bob"));
        assert_eq!(
            expense,
            vec![
                "Kopi",
                "Makanan",
                "Sedang",
                "25000",
                "",
                "10/18/2026 08:15:00",
                "bob"
            ]
        );
        let income = tx.row_values(TransactionKind::Income, "10/18/2026 08:15:00", None);
        assert_eq!(
            income,
            vec!["Kopi", "Makanan", "25000", "", "10/18/2026 08:15:00", ""]
        );
    }
}
