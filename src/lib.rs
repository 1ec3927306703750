//! byeboros reads a personal-finance Google sheet, with one tab per month and a master tab of
//! budget categories, and turns it into transaction listings grouped by day and expense and
//! income analyses over a period. It also records new transactions and saves budgets.
//!
//! The library is used by the `byeboros` binary, both as a CLI and as an MCP server.

mod api;
pub mod args;
mod clock;
pub mod commands;
mod config;
mod error;
mod ledger;
mod mcp;
pub mod model;
pub mod report;
mod utils;


pub use api::{A1Range, Mode};
pub use clock::{jakarta, Clock, FixedClock, SystemClock};
pub use config::{Config, Layout};
pub use error::{Error, ErrorType, Result};
pub use ledger::Ledger;
