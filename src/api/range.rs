//! A1 notation for the fixed ranges that make up a month sheet and the master sheet.

use crate::error::Res;
use anyhow::{bail, Context};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// A rectangular range without a sheet name, e.g. `A2:G` (open-ended rows), `E2:E3` or `P2`.
///
/// Columns are 0-based (`A` is 0) and rows are 1-based, matching how they are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct A1Range {
    start_col: u32,
    start_row: u32,
    end_col: u32,
    end_row: Option<u32>,
}

impl A1Range {
    /// A range from (`start_col`, `start_row`) to (`end_col`, `end_row`). Columns are 0-based.
    pub(crate) const fn new(
        start_col: u32,
        start_row: u32,
        end_col: u32,
        end_row: Option<u32>,
    ) -> Self {
        Self {
            start_col,
            start_row,
            end_col,
            end_row,
        }
    }

    /// A single cell.
    pub(crate) const fn cell(col: u32, row: u32) -> Self {
        Self::new(col, row, col, Some(row))
    }

    /// The first row of the range.
    pub fn start_row(&self) -> u32 {
        self.start_row
    }

    /// The last row, or `None` when the range runs to the bottom of the sheet.
    pub fn end_row(&self) -> Option<u32> {
        self.end_row
    }

    pub fn start_col(&self) -> u32 {
        self.start_col
    }

    pub fn end_col(&self) -> u32 {
        self.end_col
    }

    /// The `count` rows starting `offset` rows below the first row, spanning the same columns.
    pub fn rows(&self, offset: usize, count: usize) -> A1Range {
        let offset = u32::try_from(offset).unwrap_or(u32::MAX);
        let count = u32::try_from(count.max(1)).unwrap_or(u32::MAX);
        let start_row = self.start_row.saturating_add(offset);
        A1Range {
            start_col: self.start_col,
            start_row,
            end_col: self.end_col,
            end_row: Some(start_row.saturating_add(count - 1)),
        }
    }

    /// The single row `offset` rows below the first row.
    pub fn row(&self, offset: usize) -> A1Range {
        self.rows(offset, 1)
    }

    /// What is left of the range once the first `offset` rows are dropped, or `None` when
    /// nothing is left.
    pub fn below(&self, offset: usize) -> Option<A1Range> {
        let offset = u32::try_from(offset).ok()?;
        let start_row = self.start_row.checked_add(offset)?;
        if self.end_row.is_some_and(|end| start_row > end) {
            return None;
        }
        Some(A1Range { start_row, ..*self })
    }
}

impl Display for A1Range {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let start = column_name(self.start_col);
        let end = column_name(self.end_col);
        match self.end_row {
            Some(end_row) if end_row == self.start_row && self.end_col == self.start_col => {
                write!(f, "{start}{}", self.start_row)
            }
            Some(end_row) => write!(f, "{start}{}:{end}{end_row}", self.start_row),
            None => write!(f, "{start}{}:{end}", self.start_row),
        }
    }
}

impl FromStr for A1Range {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Res<Self> {
        let s = s.trim();
        match s.split_once(':') {
            None => {
                let (col, row) = parse_cell(s)?;
                let row = row.with_context(|| format!("The cell '{s}' has no row number"))?;
                Ok(A1Range {
                    start_col: col,
                    start_row: row,
                    end_col: col,
                    end_row: Some(row),
                })
            }
            Some((start, end)) => {
                let (start_col, start_row) = parse_cell(start)?;
                let start_row =
                    start_row.with_context(|| format!("The range '{s}' has no starting row"))?;
                let (end_col, end_row) = parse_cell(end)?;
                if end_col < start_col {
                    bail!("The range '{s}' ends before it starts");
                }
                if let Some(end_row) = end_row {
                    if end_row < start_row {
                        bail!("The range '{s}' ends before it starts");
                    }
                }
                Ok(A1Range {
                    start_col,
                    start_row,
                    end_col,
                    end_row,
                })
            }
        }
    }
}

impl Serialize for A1Range {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for A1Range {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        A1Range::from_str(&s).map_err(|e| serde::de::Error::custom(format!("{e:#}")))
    }
}

/// Parses `G`, `G2` or `AA10` into a 0-based column and an optional row.
fn parse_cell(s: &str) -> Res<(u32, Option<u32>)> {
    let s = s.trim();
    let split = s.find(|c: char| c.is_ascii_digit()).unwrap_or(s.len());
    let (letters, digits) = s.split_at(split);
    if letters.is_empty() || !letters.chars().all(|c| c.is_ascii_alphabetic()) {
        bail!("'{s}' does not start with a column letter");
    }
    let col = column_index(letters)?;
    let row = if digits.is_empty() {
        None
    } else {
        let row: u32 = digits
            .parse()
            .with_context(|| format!("'{s}' has a bad row number"))?;
        if row == 0 {
            bail!("Row numbers start at 1, found '{s}'");
        }
        Some(row)
    };
    Ok((col, row))
}

/// `A` is 0, `Z` is 25, `AA` is 26.
fn column_index(letters: &str) -> Res<u32> {
    let mut value: u32 = 0;
    for c in letters.chars() {
        let digit = u32::from(c.to_ascii_uppercase()) - u32::from('A') + 1;
        value = value
            .checked_mul(26)
            .and_then(|v| v.checked_add(digit))
            .with_context(|| format!("The column '{letters}' is too large"))?;
    }
    Ok(value - 1)
}

fn column_name(index: u32) -> String {
    let mut n = index + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(char::from(b'A' + rem as u8));
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect()
}

/// Prefixes `range` with `sheet`, quoting the sheet name when needed, e.g. `Oktober!A2:G` or
/// `'Budget 2026'!A2:C`.
pub(crate) fn qualified(sheet: &str, range: &A1Range) -> String {
    if !sheet.is_empty() && sheet.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        format!("{sheet}!{range}")
    } else {
        format!("'{}'!{range}", sheet.replace('\'', "''"))
    }
}

/// The reverse of `qualified`.
pub(crate) fn split_qualified(s: &str) -> Res<(String, A1Range)> {
    let (sheet, range) = s
        .rsplit_once('!')
        .with_context(|| format!("The range '{s}' has no sheet name"))?;
    let sheet = match sheet.strip_prefix('\'').and_then(|s| s.strip_suffix('\'')) {
        Some(quoted) => quoted.replace("''", "'"),
        None => sheet.to_string(),
    };
    Ok((sheet, A1Range::from_str(range)?))
}
