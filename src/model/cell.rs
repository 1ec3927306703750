use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// A single loosely-typed spreadsheet value.
///
/// The Sheets API hands back formatted strings, but a cell may also carry a raw number (for
/// example when values are rendered unformatted). Interpretation of the value as an amount or a
/// timestamp lives in `Amount::from_cell` and `date::parse_date`.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Number(f64),
    Text(String),
    #[default]
    Empty,
}

impl Cell {
    /// The text of a `Text` cell. Numbers and empty cells return `None`.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Returns true for `Empty` and for text that is only whitespace.
    pub fn is_blank(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            Cell::Number(_) => false,
        }
    }

    /// Renders the cell the way it would print in the sheet, trimmed.
    pub fn to_trimmed(&self) -> String {
        self.to_string().trim().to_string()
    }
}

impl Display for Cell {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Cell::Number(n) => write!(f, "{n}"),
            Cell::Text(s) => f.write_str(s),
            Cell::Empty => Ok(()),
        }
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        if value.is_empty() {
            Cell::Empty
        } else {
            Cell::Text(value)
        }
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::from(value.to_string())
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Number(value)
    }
}

/// Gets the cell at `index` in `row`, treating a missing cell as `Empty`.
pub(crate) fn cell_at(row: &[Cell], index: usize) -> &Cell {
    const EMPTY: &Cell = &Cell::Empty;
    row.get(index).unwrap_or(EMPTY)
}
