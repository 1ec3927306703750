//! Access to the spreadsheet. The `Sheet` trait is the seam between the ledger and the outside
//! world: `GoogleSheet` talks to the Google Sheets API and `TestSheet` keeps seeded data in memory.

mod files;
mod oauth;
mod range;
mod sheet;
mod sheet_test_client;

use crate::clock::{Clock, FixedClock, SystemClock};
use crate::error::Res;
use crate::model::Cell;
use crate::Config;
use anyhow::Context;
use chrono::NaiveDate;
use std::sync::Arc;

pub use range::A1Range;
pub(crate) use range::{qualified, split_qualified};

pub(crate) use oauth::TokenProvider;
pub(crate) use sheet::GoogleSheet;
#[cfg(test)]
pub(crate) use sheet_test_client::TestSheetState;
pub(crate) use sheet_test_client::TestSheet;

/// Read and write access to spreadsheet values.
const OAUTH_SCOPES: &[&str] = &["https://www.googleapis.com/auth/spreadsheets"];

/// Environment variable that switches the app to the in-memory test sheet when non-empty.
const TEST_MODE_ENV: &str = "BYEBOROS_IN_TEST_MODE";

/// The rows of a range, as returned by the spreadsheet. Trailing empty cells and rows are omitted.
pub(crate) type Rows = Vec<Vec<Cell>>;

/// Values to write into a range. `range` includes the sheet name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SheetRange {
    pub(crate) range: String,
    pub(crate) values: Vec<Vec<String>>,
}

/// Whether the app talks to Google or to an in-memory sheet.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    #[default]
    Google,
    Testing,
}

impl Mode {
    /// `Testing` when `BYEBOROS_IN_TEST_MODE` is set and not empty, otherwise `Google`.
    pub fn from_env() -> Self {
        match std::env::var(TEST_MODE_ENV) {
            Ok(value) if !value.is_empty() => Mode::Testing,
            _ => Mode::Google,
        }
    }

    /// The clock to use. Testing mode is pinned to 2026-10-18 21:00 in Jakarta so that the seed
    /// data always reads the same way.
    pub fn clock(&self) -> Arc<dyn Clock> {
        match self {
            Mode::Google => Arc::new(SystemClock),
            Mode::Testing => {
                let local =
                    NaiveDate::from_ymd_opt(2026, 10, 18).and_then(|d| d.and_hms_opt(21, 0, 0));
                match local {
                    Some(local) => Arc::new(FixedClock::new(local)),
                    None => Arc::new(SystemClock),
                }
            }
        }
    }
}

/// Reads and writes ranges of a spreadsheet. Ranges are A1 notation including the sheet name.
#[async_trait::async_trait]
pub(crate) trait Sheet {
    /// The titles of every sheet (tab) in the spreadsheet.
    async fn sheet_names(&mut self, spreadsheet_id: &str) -> Res<Vec<String>>;

    /// Reads a single range.
    async fn get_range(&mut self, spreadsheet_id: &str, range: &str) -> Res<Rows>;

    /// Reads several ranges in one request. The result has one entry per requested range, in the
    /// same order. A range with no data, or on a sheet that does not exist, yields no rows.
    async fn batch_get_ranges(
        &mut self,
        spreadsheet_id: &str,
        ranges: &[String],
    ) -> Res<Vec<(String, Rows)>>;

    /// Writes values into ranges, interpreting them as if typed by a user.
    async fn write_ranges(&mut self, spreadsheet_id: &str, data: &[SheetRange]) -> Res<()>;

    /// Clears the values in ranges.
    async fn clear_ranges(&mut self, spreadsheet_id: &str, ranges: &[String]) -> Res<()>;
}

/// Creates the `Sheet` for `mode`. In `Google` mode this loads (and if needed refreshes) the OAuth
/// token, so it fails when `auth` has not been run.
pub(crate) async fn sheet(config: &Config, mode: Mode) -> Res<Box<dyn Sheet + Send>> {
    match mode {
        Mode::Google => {
            let token_provider =
                TokenProvider::load(config.client_secret_path(), config.token_path())
                    .await
                    .context("Unable to load the OAuth token. Run 'byeboros auth' first.")?;
            Ok(Box::new(GoogleSheet::new(token_provider)))
        }
        Mode::Testing => Ok(Box::new(TestSheet::new())),
    }
}
