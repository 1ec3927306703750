//! These structs provide the CLI interface for the byeboros CLI. Several of them double as the
//! parameters of the MCP tools, so they also derive `Serialize`, `Deserialize` and `JsonSchema`.

use crate::model::{NewTransaction, SaveCategories};
use clap::{Parser, Subcommand};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::error;
use tracing::level_filters::LevelFilter;

/// byeboros: Personal finance reports from a Google sheet.
///
/// Your spending and income live in a Google sheet with one tab per month (Januari ... Desember)
/// and a master tab of budget categories. byeboros lists the transactions of a month grouped by
/// day, summarizes spending and income over a day, a month, three or six months or a year, and
/// records new transactions and budgets.
///
/// You will need to set up Google Sheets API access with OAuth for this. Run `byeboros init`
/// followed by `byeboros auth` to get started.
///
/// There is also a mode in which an AI agent can use this program through the mcp subcommand.
#[derive(Debug, Parser, Clone)]
pub struct Args {
    #[clap(flatten)]
    common: Common,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    pub fn new(common: Common, command: Command) -> Self {
        Self { common, command }
    }

    pub fn common(&self) -> &Common {
        &self.common
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create the data directory and initialize the configuration files.
    ///
    /// This is the first command you should run. You need two things ready beforehand:
    ///
    /// - The URL of your Google sheet, passed as --sheet-url.
    ///
    /// - OAuth client credentials for a Desktop application, downloaded from Google Cloud
    ///   Console, passed as --client-secret. The redirect URIs must include http://localhost.
    ///
    /// Data is kept in --byeboros-home, which defaults to $HOME/byeboros.
    Init(InitArgs),
    /// Authenticate with Google Sheets via OAuth.
    Auth(AuthArgs),
    /// List the transactions of a month sheet, grouped by day.
    Transactions(TransactionsArgs),
    /// Summarize expenses and income by category and priority over a period.
    Analysis(AnalysisArgs),
    /// Record a new expense or income transaction.
    Record(RecordArgs),
    /// List or replace the budget categories on the master sheet.
    Categories(CategoriesArgs),
    /// Run as an MCP server over stdio, for use by an AI agent.
    Mcp(McpArgs),
}

/// Arguments common to all subcommands.
#[derive(Debug, Parser, Clone)]
pub struct Common {
    /// The logging verbosity. One of, from least to most verbose:
    /// off, error, warn, info, debug, trace
    ///
    /// This can be overridden by RUST_LOG.
    #[arg(long, default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,

    /// The directory where byeboros configuration and credentials are held. Defaults to
    /// ~/byeboros
    #[arg(long, env = "BYEBOROS_HOME", default_value_t = default_byeboros_home())]
    byeboros_home: DisplayPath,
}

impl Common {
    pub fn new(log_level: LevelFilter, byeboros_home: PathBuf) -> Self {
        Self {
            log_level,
            byeboros_home: byeboros_home.into(),
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn byeboros_home(&self) -> &DisplayPath {
        &self.byeboros_home
    }
}

/// (Not shown): Args for the `byeboros init` command.
#[derive(Debug, Parser, Clone)]
pub struct InitArgs {
    /// The URL to your Google sheet. It looks like this:
    /// https://docs.google.com/spreadsheets/d/1a7Km9FxQwRbPt82JvN4LzYpH5OcGnWsT6iDuE3VhMjX
    #[arg(long)]
    sheet_url: String,

    /// The path to your downloaded OAuth client credentials. This file will be copied to the
    /// secrets directory inside the data directory.
    #[arg(long)]
    client_secret: PathBuf,
}

impl InitArgs {
    pub fn new(sheet_url: impl Into<String>, client_secret: impl Into<PathBuf>) -> Self {
        Self {
            sheet_url: sheet_url.into(),
            client_secret: client_secret.into(),
        }
    }

    pub fn sheet_url(&self) -> &str {
        &self.sheet_url
    }

    pub fn client_secret(&self) -> &Path {
        &self.client_secret
    }
}

/// (Not shown): Args for the `byeboros auth` command.
#[derive(Debug, Parser, Clone)]
pub struct AuthArgs {
    /// Verify and refresh authentication.
    #[arg(long)]
    verify: bool,
}

impl AuthArgs {
    pub fn new(verify: bool) -> Self {
        Self { verify }
    }

    pub fn verify(&self) -> bool {
        self.verify
    }
}

/// Args for listing transactions. Every filter is optional.
#[derive(Debug, Default, Clone, Parser, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub struct TransactionsArgs {
    /// The month sheet to read, e.g. `Oktober`. Defaults to the sheet of the current month.
    #[arg(long)]
    #[serde(default)]
    sheet: Option<String>,

    /// Only list transactions on this date, written as `YYYY-MM-DD`.
    #[arg(long)]
    #[serde(default)]
    date: Option<String>,

    /// Only list transactions in this category. Case does not matter, but the whole name must
    /// match.
    #[arg(long)]
    #[serde(default)]
    category: Option<String>,

    /// Only list `expense` or `income` transactions.
    #[arg(long = "type")]
    #[serde(default, rename = "type")]
    kind: Option<String>,

    /// Read this spreadsheet instead of the one in the configuration.
    #[arg(long)]
    #[serde(default)]
    spreadsheet_id: Option<String>,
}

impl TransactionsArgs {
    pub fn new(
        sheet: Option<String>,
        date: Option<String>,
        category: Option<String>,
        kind: Option<String>,
    ) -> Self {
        Self {
            sheet,
            date,
            category,
            kind,
            spreadsheet_id: None,
        }
    }

    pub fn sheet(&self) -> Option<&str> {
        self.sheet.as_deref()
    }

    pub fn date(&self) -> Option<&str> {
        self.date.as_deref()
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    pub fn kind(&self) -> Option<&str> {
        self.kind.as_deref()
    }

    pub fn spreadsheet_id(&self) -> Option<&str> {
        self.spreadsheet_id.as_deref()
    }
}

fn default_period() -> String {
    "Month".to_string()
}

/// Args for the expense and income analysis.
#[derive(Debug, Clone, Parser, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub struct AnalysisArgs {
    /// The month sheet the period is counted from, e.g. `Oktober`. Defaults to the sheet of the
    /// current month.
    #[arg(long)]
    #[serde(default)]
    sheet: Option<String>,

    /// One of `Day`, `Month`, `3 Months`, `6 Months` or `Year`.
    #[arg(long, default_value = "Month")]
    #[serde(default = "default_period")]
    period: String,

    /// Read this spreadsheet instead of the one in the configuration.
    #[arg(long)]
    #[serde(default)]
    spreadsheet_id: Option<String>,
}

impl Default for AnalysisArgs {
    fn default() -> Self {
        Self {
            sheet: None,
            period: default_period(),
            spreadsheet_id: None,
        }
    }
}

impl AnalysisArgs {
    pub fn new(sheet: Option<String>, period: impl Into<String>) -> Self {
        Self {
            sheet,
            period: period.into(),
            spreadsheet_id: None,
        }
    }

    pub fn sheet(&self) -> Option<&str> {
        self.sheet.as_deref()
    }

    pub fn period(&self) -> &str {
        &self.period
    }

    pub fn spreadsheet_id(&self) -> Option<&str> {
        self.spreadsheet_id.as_deref()
    }
}

/// (Not shown): Args for the `byeboros record` command.
#[derive(Debug, Parser, Clone)]
pub struct RecordArgs {
    #[command(subcommand)]
    kind: RecordSubcommand,
}

impl RecordArgs {
    pub fn new(kind: RecordSubcommand) -> Self {
        Self { kind }
    }

    pub fn kind(&self) -> &RecordSubcommand {
        &self.kind
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum RecordSubcommand {
    /// Record money spent. It is written into the first free row of the expense block.
    Expense(RecordTransactionArgs),
    /// Record money received. It is written into the first free row of the income block.
    Income(RecordTransactionArgs),
}

/// Args for recording one transaction.
#[derive(Debug, Default, Clone, Parser, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub struct RecordTransactionArgs {
    #[command(flatten)]
    #[serde(flatten)]
    transaction: NewTransaction,

    /// The month sheet to write to, e.g. `Oktober`. Defaults to the sheet of the current month.
    #[arg(long)]
    #[serde(default)]
    sheet: Option<String>,

    /// Who recorded the transaction.
    #[arg(long, env = "BYEBOROS_AUTHOR")]
    #[serde(default)]
    author: Option<String>,

    /// Write to this spreadsheet instead of the one in the configuration.
    #[arg(long)]
    #[serde(default)]
    spreadsheet_id: Option<String>,
}

impl RecordTransactionArgs {
    pub fn new(transaction: NewTransaction, sheet: Option<String>, author: Option<String>) -> Self {
        Self {
            transaction,
            sheet,
            author,
            spreadsheet_id: None,
        }
    }

    pub fn transaction(&self) -> &NewTransaction {
        &self.transaction
    }

    pub fn sheet(&self) -> Option<&str> {
        self.sheet.as_deref()
    }

    pub fn author(&self) -> Option<&str> {
        self.author.as_deref()
    }

    pub fn spreadsheet_id(&self) -> Option<&str> {
        self.spreadsheet_id.as_deref()
    }
}

/// (Not shown): Args for the `byeboros categories` command.
#[derive(Debug, Parser, Clone)]
pub struct CategoriesArgs {
    #[command(subcommand)]
    action: CategoriesSubcommand,
}

impl CategoriesArgs {
    pub fn new(action: CategoriesSubcommand) -> Self {
        Self { action }
    }

    pub fn action(&self) -> &CategoriesSubcommand {
        &self.action
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum CategoriesSubcommand {
    /// Show the monthly and daily budgets, the expense categories and the income categories.
    List(ListCategoriesArgs),
    /// Replace the budgets and expense categories with the contents of a JSON file.
    ///
    /// The file looks like this:
    ///
    /// {
    ///   "monthly_budget": 5000000,
    ///   "daily_budget": 150000,
    ///   "categories": [
    ///     { "category_name": "Makanan", "budget": 1500000 },
    ///     { "category_name": "Tagihan", "sub_category_name": "Listrik", "budget": 400000 }
    ///   ],
    ///   "income_categories": ["Gaji", "Bonus"]
    /// }
    ///
    /// `income_categories` is optional. When it is left out the income categories are kept.
    Save(SaveCategoriesArgs),
}

/// Args for listing the budget categories.
#[derive(Debug, Default, Clone, Parser, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub struct ListCategoriesArgs {
    /// Read this spreadsheet instead of the one in the configuration.
    #[arg(long)]
    #[serde(default)]
    spreadsheet_id: Option<String>,
}

impl ListCategoriesArgs {
    pub fn spreadsheet_id(&self) -> Option<&str> {
        self.spreadsheet_id.as_deref()
    }
}

/// (Not shown): Args for the `byeboros categories save` command.
#[derive(Debug, Parser, Clone)]
pub struct SaveCategoriesArgs {
    /// A JSON file holding the budgets and categories to save.
    #[arg(long)]
    file: PathBuf,

    /// Write to this spreadsheet instead of the one in the configuration.
    #[arg(long)]
    spreadsheet_id: Option<String>,
}

impl SaveCategoriesArgs {
    pub fn new(file: impl Into<PathBuf>) -> Self {
        Self {
            file: file.into(),
            spreadsheet_id: None,
        }
    }

    pub fn file(&self) -> &Path {
        &self.file
    }

    pub fn spreadsheet_id(&self) -> Option<&str> {
        self.spreadsheet_id.as_deref()
    }
}

/// The parameters of the `save_categories` MCP tool: the categories themselves rather than a file.
#[derive(Debug, Default, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub struct SaveCategoriesParams {
    #[serde(flatten)]
    pub categories: SaveCategories,

    /// Write to this spreadsheet instead of the one in the configuration.
    #[serde(default)]
    pub spreadsheet_id: Option<String>,
}

/// (Not shown): Args for the `byeboros mcp` command.
#[derive(Debug, Parser, Clone)]
pub struct McpArgs {}

fn default_byeboros_home() -> DisplayPath {
    DisplayPath(match dirs::home_dir() {
        Some(home) => home.join("byeboros"),
        None => {
            error!(
                "There was an error when trying to get your home directory. You can get around \
                this by providing --byeboros-home or BYEBOROS_HOME instead of relying on the \
                default home directory. If you continue using the program right now, you may have \
                problems!",
            );
            PathBuf::from("byeboros")
        }
    })
}

#[derive(Debug, Default, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct DisplayPath(PathBuf);

impl From<PathBuf> for DisplayPath {
    fn from(value: PathBuf) -> Self {
        DisplayPath(value)
    }
}

impl Deref for DisplayPath {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<Path> for DisplayPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl Display for DisplayPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_string_lossy())
    }
}

impl FromStr for DisplayPath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(PathBuf::from(s)))
    }
}

impl DisplayPath {
    pub fn path(&self) -> &Path {
        &self.0
    }
}
