//! Implements the `Sheet` trait using in-memory data for testing purposes.
//!
//! Note: this is compiled even in the "production" version of this app so that we can run the whole
//! app, top-to-bottom, without using Google Sheets (see `BYEBOROS_IN_TEST_MODE`).
//!
//! Spreadsheets live in a process-wide registry keyed by spreadsheet id. The first time an id is
//! used it is seeded with three month sheets (Agustus, September, Oktober 2026) and a master
//! sheet, laid out with the default layout.

use crate::api::{split_qualified, A1Range, Rows, Sheet, SheetRange};
use crate::error::Res;
use crate::model::Cell;
use anyhow::Context;
use std::collections::{BTreeMap, HashMap};
use std::io::Cursor;
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard, OnceLock};
use tracing::trace;

/// The cells of one sheet, row-major. Rows may be ragged.
pub(crate) type Grid = Vec<Vec<String>>;

/// Every sheet of one spreadsheet, by name.
pub(crate) type TestSheetState = BTreeMap<String, Grid>;

static SPREADSHEETS: OnceLock<Mutex<HashMap<String, TestSheetState>>> = OnceLock::new();

fn registry() -> MutexGuard<'static, HashMap<String, TestSheetState>> {
    SPREADSHEETS
        .get_or_init(|| Mutex::new(HashMap::new()))
        .lock()
        .unwrap_or_else(|e| e.into_inner())
}

/// An implementation of the `Sheet` trait that does not use Google sheets.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct TestSheet;

impl TestSheet {
    pub(crate) fn new() -> Self {
        Self
    }

    /// A copy of the current state of `spreadsheet_id`, seeding it first if needed.
    #[cfg(test)]
    pub(crate) fn get_state(spreadsheet_id: &str) -> TestSheetState {
        with_state(spreadsheet_id, |state| Ok(state.clone())).unwrap_or_default()
    }

    /// Replaces the state of `spreadsheet_id`.
    #[cfg(test)]
    pub(crate) fn set_state(spreadsheet_id: &str, state: TestSheetState) {
        registry().insert(spreadsheet_id.to_string(), state);
    }
}

fn with_state<T>(
    spreadsheet_id: &str,
    f: impl FnOnce(&mut TestSheetState) -> Res<T>,
) -> Res<T> {
    let mut registry = registry();
    let state = registry
        .entry(spreadsheet_id.to_string())
        .or_insert_with(seed_state);
    f(state)
}

fn grid_mut<'a>(state: &'a mut TestSheetState, sheet: &str) -> Res<&'a mut Grid> {
    state
        .get_mut(sheet)
        .with_context(|| format!("Unable to parse range: sheet '{sheet}' does not exist"))
}

#[async_trait::async_trait]
impl Sheet for TestSheet {
    async fn sheet_names(&mut self, spreadsheet_id: &str) -> Res<Vec<String>> {
        with_state(spreadsheet_id, |state| Ok(state.keys().cloned().collect()))
    }

    async fn get_range(&mut self, spreadsheet_id: &str, range: &str) -> Res<Rows> {
        trace!("get_range {range}");
        let (sheet, a1) = split_qualified(range)?;
        with_state(spreadsheet_id, |state| Ok(read(grid_mut(state, &sheet)?, &a1)))
    }

    async fn batch_get_ranges(
        &mut self,
        spreadsheet_id: &str,
        ranges: &[String],
    ) -> Res<Vec<(String, Rows)>> {
        trace!("batch_get_ranges {ranges:?}");
        let parsed = ranges
            .iter()
            .map(|r| split_qualified(r))
            .collect::<Res<Vec<_>>>()?;
        with_state(spreadsheet_id, |state| {
            let mut out = Vec::with_capacity(parsed.len());
            for (range, (sheet, a1)) in ranges.iter().zip(parsed.iter()) {
                let rows = match state.get(sheet) {
                    Some(grid) => read(grid, a1),
                    None => {
                        trace!("'{range}' names a missing sheet and reads as empty");
                        Rows::default()
                    }
                };
                out.push((range.clone(), rows));
            }
            Ok(out)
        })
    }

    async fn write_ranges(&mut self, spreadsheet_id: &str, data: &[SheetRange]) -> Res<()> {
        let parsed = data
            .iter()
            .map(|d| split_qualified(&d.range).map(|p| (p, &d.values)))
            .collect::<Res<Vec<_>>>()?;
        with_state(spreadsheet_id, |state| {
            for ((sheet, a1), values) in parsed {
                let grid = grid_mut(state, &sheet)?;
                for (i, row) in values.iter().enumerate() {
                    for (j, value) in row.iter().enumerate() {
                        let r = a1.start_row() as usize - 1 + i;
                        let c = a1.start_col() as usize + j;
                        set(grid, r, c, value.clone());
                    }
                }
            }
            Ok(())
        })
    }

    async fn clear_ranges(&mut self, spreadsheet_id: &str, ranges: &[String]) -> Res<()> {
        let parsed = ranges
            .iter()
            .map(|r| split_qualified(r))
            .collect::<Res<Vec<_>>>()?;
        with_state(spreadsheet_id, |state| {
            for (sheet, a1) in parsed {
                let grid = grid_mut(state, &sheet)?;
                let end_row = a1
                    .end_row()
                    .map(|r| r as usize)
                    .unwrap_or(grid.len())
                    .min(grid.len());
                for row in grid.iter_mut().take(end_row).skip(a1.start_row() as usize - 1) {
                    for c in a1.start_col() as usize..=a1.end_col() as usize {
                        if let Some(cell) = row.get_mut(c) {
                            cell.clear();
                        }
                    }
                }
            }
            Ok(())
        })
    }
}

/// Reads `range` from `grid` the way the Sheets API does: trailing empty cells of each row and
/// trailing empty rows are left out.
fn read(grid: &Grid, range: &A1Range) -> Rows {
    let start = range.start_row() as usize - 1;
    let end = range
        .end_row()
        .map(|r| r as usize)
        .unwrap_or(grid.len())
        .min(grid.len());
    let mut rows: Rows = Vec::new();
    for row in grid.iter().take(end).skip(start) {
        let mut cells: Vec<Cell> = (range.start_col()..=range.end_col())
            .map(|c| row.get(c as usize).cloned().map(Cell::from).unwrap_or_default())
            .collect();
        while cells.last().is_some_and(|c| *c == Cell::Empty) {
            cells.pop();
        }
        rows.push(cells);
    }
    while rows.last().is_some_and(|r| r.is_empty()) {
        rows.pop();
    }
    rows
}

fn set(grid: &mut Grid, row: usize, col: usize, value: String) {
    if grid.len() <= row {
        grid.resize_with(row + 1, Vec::new);
    }
    let cells = &mut grid[row];
    if cells.len() <= col {
        cells.resize_with(col + 1, String::new);
    }
    cells[col] = value;
}

/// Writes CSV rows into `grid` with the top-left cell at `at` (e.g. `I2`).
fn place(grid: &mut Grid, at: &str, csv_data: &str) -> Res<()> {
    let origin = A1Range::from_str(at)?;
    for (i, row) in load_csv(csv_data)?.into_iter().enumerate() {
        for (j, value) in row.into_iter().enumerate() {
            if value.is_empty() {
                continue;
            }
            let r = origin.start_row() as usize - 1 + i;
            let c = origin.start_col() as usize + j;
            set(grid, r, c, value);
        }
    }
    Ok(())
}

/// Loads data from a CSV-formatted string.
fn load_csv(csv_data: &str) -> Res<Vec<Vec<String>>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(Cursor::new(csv_data.as_bytes()));
    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result.context("Bad seed CSV")?;
        rows.push(record.iter().map(|field| field.to_string()).collect());
    }
    Ok(rows)
}

/// A month sheet laid out with the default layout.
struct MonthSeed {
    name: &'static str,
    expenses: &'static str,
    income: &'static str,
    totals: &'static str,
    categories: &'static str,
    priorities: &'static str,
}

fn month_grid(seed: &MonthSeed) -> Res<Grid> {
    let mut grid = Grid::new();
    place(&mut grid, "A1", EXPENSE_HEADER)?;
    place(&mut grid, "I1", INCOME_HEADER)?;
    place(&mut grid, "A2", seed.expenses)?;
    place(&mut grid, "I2", seed.income)?;
    place(&mut grid, "O2", seed.totals)?;
    place(&mut grid, "R1", BREAKDOWN_HEADER)?;
    place(&mut grid, "R2", seed.categories)?;
    place(&mut grid, "V2", seed.priorities)?;
    Ok(grid)
}

fn master_grid() -> Res<Grid> {
    let mut grid = Grid::new();
    place(&mut grid, "A1", MASTER_HEADER)?;
    place(&mut grid, "A2", MASTER_CATEGORIES)?;
    place(&mut grid, "D2", MASTER_BUDGETS)?;
    place(&mut grid, "G2", MASTER_INCOME_CATEGORIES)?;
    Ok(grid)
}

fn try_seed_state() -> Res<TestSheetState> {
    let mut state = TestSheetState::new();
    for seed in [&AGUSTUS, &SEPTEMBER, &OKTOBER] {
        state.insert(seed.name.to_string(), month_grid(seed)?);
    }
    state.insert(MASTER_SHEET.to_string(), master_grid()?);
    Ok(state)
}

fn seed_state() -> TestSheetState {
    match try_seed_state() {
        Ok(state) => state,
        Err(e) => {
            tracing::error!("Unable to load the test sheet seed data: {e:#}");
            TestSheetState::new()
        }
    }
}

const MASTER_SHEET: &str = "Kategori";

const EXPENSE_HEADER: &str = "Deskripsi,Kategori,Prioritas,Jumlah,Catatan,Waktu,Oleh";
const INCOME_HEADER: &str = "Deskripsi,Kategori,Jumlah,Catatan,Waktu,Oleh,,Ringkasan";
const BREAKDOWN_HEADER: &str = "Kategori,Sub Kategori,Jumlah,,Prioritas,Jumlah";
const MASTER_HEADER: &str = "Kategori,Sub Kategori,Budget,,Budget,,Kategori Pemasukan";

const OKTOBER: MonthSeed = MonthSeed {
    name: "Oktober",
    expenses: r##"Kopi Pagi,Makanan,Sedang,Rp 25.000,,10/18/2026 08:15:00,alice
Makan Siang,Makanan,Tinggi,Rp 45.000,,10/18/2026 12:30:00,alice
Bensin,Transportasi,Tinggi,Rp 100.000,isi penuh,10/17/2026 17:45:00,bob
Nonton,Hiburan,Rendah,Rp 60.000,,10/12/2026 19:00:00,alice
Listrik,Tagihan,Tinggi,Rp 350.000,,10/5/2026 09:00:00,bob
Rusak,Makanan,Sedang,Rp 10.000,,not a date,alice
"##,
    income: r##"Gaji Oktober,Gaji,Rp 8.000.000,,10/1/2026 09:00:00,alice
Freelance,Proyek,Rp 1.500.000,desain logo,10/17/2026 20:00:00,alice
"##,
    totals: r##"Total Pengeluaran,Rp 580.000
Total Pemasukan,Rp 9.500.000
"##,
    categories: r##"Makanan,,Rp 70.000
Transportasi,Bensin,Rp 100.000
Hiburan,,Rp 60.000
Tagihan,Listrik,Rp 350.000
"##,
    priorities: r##"Tinggi,Rp 495.000
Sedang,Rp 25.000
Rendah,Rp 60.000
"##,
};

const SEPTEMBER: MonthSeed = MonthSeed {
    name: "September",
    expenses: r##"Belanja Bulanan,Makanan,Sedang,Rp 200.000,,9/3/2026 10:00:00,alice
Listrik,Tagihan,Tinggi,Rp 300.000,,9/5/2026 09:00:00,bob
"##,
    income: r##"Gaji September,Gaji,Rp 8.000.000,,9/1/2026 09:00:00,alice
"##,
    totals: r##"Total Pengeluaran,Rp 500.000
Total Pemasukan,Rp 8.000.000
"##,
    categories: r##"Makanan,,Rp 200.000
Tagihan,Listrik,Rp 300.000
"##,
    priorities: r##"Tinggi,Rp 300.000
Sedang,Rp 200.000
"##,
};

const AGUSTUS: MonthSeed = MonthSeed {
    name: "Agustus",
    expenses: r##"Belanja,Makanan,Sedang,Rp 150.000,,8/2/2026 10:00:00,alice
Konser,Hiburan,Penting,Rp 50.000,,8/15/2026 20:00:00,bob
"##,
    income: r##"Bonus,Bonus,Rp 2.000.000,,8/20/2026 10:00:00,alice
"##,
    totals: r##"Total Pengeluaran,Rp 200.000
Total Pemasukan,Rp 2.000.000
"##,
    categories: r##"Makanan,,Rp 150.000
Hiburan,,Rp 50.000
"##,
    priorities: r##"Sedang,Rp 150.000
Penting,Rp 50.000
"##,
};

const MASTER_CATEGORIES: &str = r##"Makanan,,Rp 1.500.000
Transportasi,Bensin,Rp 500.000
Hiburan,,Rp 300.000
Tagihan,Listrik,Rp 400.000
"##;

const MASTER_BUDGETS: &str = r##"Budget Bulanan,Rp 5.000.000
Budget Harian,Rp 150.000
"##;

const MASTER_INCOME_CATEGORIES: &str = r##"Gaji
Bonus
Investasi
"##;

#[cfg(test)]
mod tests {
    use super::*;

    fn id() -> String {
        uuid::Uuid::new_v4().to_string()
    }

    #[tokio::test]
    async fn test_seeded_sheet_names() {
        let mut sheet = TestSheet::new();
        let names = sheet.sheet_names(&id()).await.unwrap();
        assert_eq!(names, vec!["Agustus", "Kategori", "Oktober", "September"]);
    }

    #[tokio::test]
    async fn test_read_trims_like_google() {
        let mut sheet = TestSheet::new();
        let id = id();
        let rows = sheet.get_range(&id, "Oktober!A2:G").await.unwrap();
        assert_eq!(rows.len(), 6);
        // Notes are empty but the timestamp after them is not, so the row keeps all 7 cells.
        assert_eq!(rows[0].len(), 7);
        assert_eq!(rows[0][4], Cell::Empty);
        assert_eq!(rows[0][3], Cell::from("Rp 25.000"));

        let categories = sheet.get_range(&id, "Oktober!R2:T").await.unwrap();
        assert_eq!(categories.len(), 4);
        assert_eq!(
            categories[0],
            vec![Cell::from("Makanan"), Cell::Empty, Cell::from("Rp 70.000")]
        );

        let nothing = sheet.get_range(&id, "Oktober!A50:G").await.unwrap();
        assert!(nothing.is_empty());
    }

    #[tokio::test]
    async fn test_batch_get_keeps_order() {
        let mut sheet = TestSheet::new();
        let ranges = vec![
            "Oktober!P3".to_string(),
            "Oktober!P2".to_string(),
            "Oktober!Z2:Z".to_string(),
        ];
        let result = sheet.batch_get_ranges(&id(), &ranges).await.unwrap();
        assert_eq!(result.len(), 3);
        assert_eq!(result[0].0, "Oktober!P3");
        assert_eq!(result[0].1, vec![vec![Cell::from("Rp 9.500.000")]]);
        assert_eq!(result[1].1, vec![vec![Cell::from("Rp 580.000")]]);
        assert!(result[2].1.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_sheet() {
        let mut sheet = TestSheet::new();
        let id = id();
        assert!(sheet.get_range(&id, "Maret!A2:G").await.is_err());

        let ranges = vec!["Oktober!P2".to_string(), "Maret!P2".to_string()];
        let result = sheet.batch_get_ranges(&id, &ranges).await.unwrap();
        assert_eq!(result.len(), 2);
        assert_eq!(result[0].1, vec![vec![Cell::from("Rp 580.000")]]);
        assert_eq!(result[1].0, "Maret!P2");
        assert!(result[1].1.is_empty());
    }

    #[tokio::test]
    async fn test_write_and_clear() {
        let mut sheet = TestSheet::new();
        let id = id();
        sheet
            .write_ranges(
                &id,
                &[SheetRange {
                    range: "Kategori!A6:C6".to_string(),
                    values: vec![vec!["Pendidikan".into(), "".into(), "250000".into()]],
                }],
            )
            .await
            .unwrap();
        let rows = sheet.get_range(&id, "Kategori!A2:C").await.unwrap();
        assert_eq!(rows.len(), 5);
        assert_eq!(rows[4][0], Cell::from("Pendidikan"));

        sheet
            .clear_ranges(&id, &["Kategori!A2:C".to_string()])
            .await
            .unwrap();
        assert!(sheet.get_range(&id, "Kategori!A2:C").await.unwrap().is_empty());
        // The header row and other columns are untouched.
        let header = sheet.get_range(&id, "Kategori!A1").await.unwrap();
        assert_eq!(header, vec![vec![Cell::from("Kategori")]]);
        let budgets = sheet.get_range(&id, "Kategori!E2:E3").await.unwrap();
        assert_eq!(budgets.len(), 2);
    }

    #[tokio::test]
    async fn test_spreadsheets_are_isolated() {
        let mut sheet = TestSheet::new();
        let (a, b) = (id(), id());
        sheet.clear_ranges(&a, &["Oktober!A2:G".to_string()]).await.unwrap();
        assert!(sheet.get_range(&a, "Oktober!A2:G").await.unwrap().is_empty());
        assert_eq!(sheet.get_range(&b, "Oktober!A2:G").await.unwrap().len(), 6);
    }
}
