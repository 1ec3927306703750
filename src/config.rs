//! Configuration file handling for byeboros.
//!
//! The configuration file is stored at `$BYEBOROS_HOME/config.json` and contains the Google Sheet
//! URL, the name of the master sheet, authentication file paths and, optionally, the cell layout
//! of the month sheets.

use crate::api::A1Range;
use crate::error::{ErrorType, IntoResult, Res};
use crate::utils;
use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const APP_NAME: &str = "byeboros";
const CONFIG_VERSION: u8 = 1;
const SECRETS: &str = ".secrets";
const CLIENT_SECRET_JSON: &str = "client_secret.json";
const TOKEN_JSON: &str = "token.json";
const CONFIG_JSON: &str = "config.json";
const MASTER_SHEET: &str = "Kategori";

/// The `Config` object represents the configuration of the app. You instantiate it by providing
/// the path to `$BYEBOROS_HOME` and from there it loads `$BYEBOROS_HOME/config.json`. It provides
/// paths to other items that are either configurable or are expected in a certain location within
/// the home directory.
#[derive(Debug, Clone)]
pub struct Config {
    root: PathBuf,
    secrets: PathBuf,
    config_path: PathBuf,
    config_file: ConfigFile,
    spreadsheet_id: String,
}

impl Config {
    /// Creates the data directory, its secrets subdirectory and:
    /// - Creates an initial `config.json` file using `sheet_url` along with default settings
    /// - Moves `secret_file` into its default location in the data dir.
    ///
    /// # Arguments
    /// - `dir` - The directory that will be the root of data directory, e.g. `$HOME/byeboros`
    /// - `secret_file` - The downloaded OAuth 2.0 client credentials JSON.
    /// - `sheet_url` - The URL of the Google Sheet that holds the month sheets, e.g.
    ///   https://docs.google.com/spreadsheets/d/1a7Km9FxQwRbPt82JvN4LzYpH5OcGnWsT6iDuE3VhMjX
    pub async fn create(
        dir: impl Into<PathBuf>,
        secret_file: &Path,
        sheet_url: &str,
    ) -> crate::Result<Self> {
        Self::create_inner(dir.into(), secret_file, sheet_url)
            .await
            .pub_result(ErrorType::Config)
    }

    async fn create_inner(dir: PathBuf, secret_file: &Path, sheet_url: &str) -> Res<Self> {
        // Fail before touching the filesystem if the URL is unusable.
        let spreadsheet_id = extract_spreadsheet_id(sheet_url)
            .context("Failed to extract spreadsheet ID from sheet URL")?
            .to_string();

        utils::make_dir(&dir)
            .await
            .context("Unable to create the byeboros home directory")?;
        let root = utils::canonicalize(&dir).await?;

        let secrets = root.join(SECRETS);
        utils::make_dir(&secrets).await?;
        utils::rename(secret_file, secrets.join(CLIENT_SECRET_JSON)).await?;

        let config_path = root.join(CONFIG_JSON);
        let config_file = ConfigFile {
            sheet_url: sheet_url.to_string(),
            ..ConfigFile::default()
        };
        config_file.save(&config_path).await?;

        Ok(Self {
            root,
            secrets,
            config_path,
            config_file,
            spreadsheet_id,
        })
    }

    /// This will
    /// - validate that the home directory exists and that the config file exists
    /// - load the config file
    /// - validate that the secrets directory exists
    pub async fn load(byeboros_home: impl Into<PathBuf>) -> crate::Result<Self> {
        Self::load_inner(byeboros_home.into())
            .await
            .pub_result(ErrorType::Config)
    }

    async fn load_inner(home: PathBuf) -> Res<Self> {
        let root = utils::canonicalize(&home)
            .await
            .context("The byeboros home directory is missing. Run 'byeboros init' first.")?;

        let config_path = root.join(CONFIG_JSON);
        if !config_path.is_file() {
            bail!("The config file is missing '{}'", config_path.display())
        }
        let config_file = ConfigFile::load(&config_path).await?;
        let spreadsheet_id = extract_spreadsheet_id(&config_file.sheet_url)
            .context("Failed to extract spreadsheet ID from sheet URL")?
            .to_string();

        let secrets = root.join(SECRETS);
        if !secrets.is_dir() {
            bail!("The secrets directory is missing '{}'", secrets.display())
        }
        Ok(Self {
            root,
            secrets,
            config_path,
            config_file,
            spreadsheet_id,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn secrets(&self) -> &Path {
        &self.secrets
    }

    pub fn sheet_url(&self) -> &str {
        &self.config_file.sheet_url
    }

    pub fn spreadsheet_id(&self) -> &str {
        &self.spreadsheet_id
    }

    /// The name of the sheet holding budgets and the category lists.
    pub fn master_sheet(&self) -> &str {
        self.config_file
            .master_sheet
            .as_deref()
            .unwrap_or(MASTER_SHEET)
    }

    pub fn layout(&self) -> &Layout {
        &self.config_file.layout
    }

    /// Returns the stored `client_secret_path` if it is absolute, otherwise resolves it against the
    /// home directory.
    pub fn client_secret_path(&self) -> PathBuf {
        self.resolve(self.config_file.client_secret_path())
    }

    /// Returns the stored `token_path` if it is absolute, otherwise resolves it against the home
    /// directory.
    pub fn token_path(&self) -> PathBuf {
        self.resolve(self.config_file.token_path())
    }

    fn resolve(&self, p: PathBuf) -> PathBuf {
        if p.is_absolute() {
            return p;
        }
        self.root.join(p)
    }
}

/// Where things are on a month sheet and on the master sheet. Every field can be overridden in
/// `config.json`; missing fields keep their defaults.
///
/// ```json
/// "layout": { "expense_block": "A3:G", "income_total": "Q3" }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
#[serde(default, rename_all = "snake_case")]
pub struct Layout {
    /// Description, category, priority, amount, notes, timestamp, author.
    pub expense_block: A1Range,
    /// Description, category, amount, notes, timestamp, author.
    pub income_block: A1Range,
    pub expense_total: A1Range,
    pub income_total: A1Range,
    /// Category, sub-category, amount.
    pub expense_categories: A1Range,
    /// Priority label, amount.
    pub expense_priorities: A1Range,
    /// Category, sub-category, budget. On the master sheet.
    pub master_categories: A1Range,
    pub master_monthly_budget: A1Range,
    pub master_daily_budget: A1Range,
    /// One income category name per row. On the master sheet.
    pub master_income_categories: A1Range,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            expense_block: A1Range::new(0, 2, 6, None),
            income_block: A1Range::new(8, 2, 13, None),
            expense_total: A1Range::cell(15, 2),
            income_total: A1Range::cell(15, 3),
            expense_categories: A1Range::new(17, 2, 19, None),
            expense_priorities: A1Range::new(21, 2, 22, None),
            master_categories: A1Range::new(0, 2, 2, None),
            master_monthly_budget: A1Range::cell(4, 2),
            master_daily_budget: A1Range::cell(4, 3),
            master_income_categories: A1Range::new(6, 2, 6, None),
        }
    }
}

/// Represents the serialization and deserialization format of the configuration file.
///
/// Example configuration:
/// ```json
/// {
///   "app_name": "byeboros",
///   "config_version": 1,
///   "sheet_url": "https://docs.google.com/spreadsheets/d/7KpXm2RfZwNJgs84QhVYno5DU6iM9Wlr3bCzAv1txRpL",
///   "client_secret_path": ".secrets/client_secret.json",
///   "token_path": ".secrets/token.json",
///   "master_sheet": "Kategori"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
struct ConfigFile {
    /// Should always be "byeboros"
    app_name: String,

    config_version: u8,

    /// URL to the Google Sheet
    sheet_url: String,

    /// Path to the OAuth 2.0 client credentials file, relative to the home directory or absolute.
    /// Defaults to $BYEBOROS_HOME/.secrets/client_secret.json
    #[serde(default, skip_serializing_if = "Option::is_none")]
    client_secret_path: Option<PathBuf>,

    /// Path to the OAuth token file, relative to the home directory or absolute.
    /// Defaults to $BYEBOROS_HOME/.secrets/token.json
    #[serde(default, skip_serializing_if = "Option::is_none")]
    token_path: Option<PathBuf>,

    /// Defaults to `Kategori`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    master_sheet: Option<String>,

    #[serde(default)]
    layout: Layout,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            app_name: APP_NAME.to_string(),
            config_version: CONFIG_VERSION,
            sheet_url: String::new(),
            client_secret_path: None,
            token_path: None,
            master_sheet: None,
            layout: Layout::default(),
        }
    }
}

impl ConfigFile {
    async fn load(path: impl AsRef<Path>) -> Res<Self> {
        let path = path.as_ref();
        let content = utils::read(path)
            .await
            .with_context(|| format!("Failed to read config file at {}", path.display()))?;

        let config: ConfigFile = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file at {}", path.display()))?;

        anyhow::ensure!(
            config.app_name == APP_NAME,
            "Invalid app_name in config file: expected '{}', got '{}'",
            APP_NAME,
            config.app_name
        );
        Ok(config)
    }

    async fn save(&self, path: impl AsRef<Path>) -> Res<()> {
        let data = serde_json::to_string_pretty(self).context("Unable to serialize config")?;
        utils::write(path.as_ref(), data)
            .await
            .context("Unable to write config file")
    }

    fn client_secret_path(&self) -> PathBuf {
        self.client_secret_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(SECRETS).join(CLIENT_SECRET_JSON))
    }

    fn token_path(&self) -> PathBuf {
        self.token_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(SECRETS).join(TOKEN_JSON))
    }
}

/// Extracts the spreadsheet ID from a Google Sheets URL such as
/// `https://docs.google.com/spreadsheets/d/SPREADSHEET_ID/edit?foo=bar`.
fn extract_spreadsheet_id(url: &str) -> Res<&str> {
    let parts: Vec<&str> = url.split('/').collect();
    for (i, part) in parts.iter().enumerate() {
        if *part == "d" && i + 1 < parts.len() {
            let id = parts[i + 1]
                .split(['?', '#'])
                .next()
                .unwrap_or_default();
            if id.is_empty() {
                break;
            }
            return Ok(id);
        }
    }
    bail!(
        "Invalid Google Sheets URL '{url}'. Expected: \
        https://docs.google.com/spreadsheets/d/SPREADSHEET_ID"
    )
}
