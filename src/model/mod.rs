//! Types that represent the core data model: cells, amounts, transactions, periods and budget
//! categories.
mod amount;
mod category;
mod cell;
mod date;
mod period;
mod transaction;

pub use amount::{Amount, AmountError};
pub use category::{CategoryBudget, CategoryBudgets, SaveCategories};
pub(crate) use category::names_from_rows;
pub use cell::Cell;
pub(crate) use cell::cell_at;
pub use date::{parse_calendar_date, parse_date};
pub use period::{month_name, Period, MONTH_NAMES};
pub(crate) use transaction::map_rows;
pub use transaction::{NewTransaction, TransactionKind, TransactionReceipt, TransactionRecord};
