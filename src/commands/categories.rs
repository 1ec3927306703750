//! Listing and saving the budgets and categories kept on the master sheet.

use crate::args::{ListCategoriesArgs, SaveCategoriesArgs};
use crate::commands::Out;
use crate::error::{ErrorType, IntoResult};
use crate::model::{CategoryBudgets, SaveCategories};
use crate::{utils, Config, Ledger, Mode, Result};
use anyhow::Context;

/// Reads the monthly and daily budgets, the expense categories and the income categories.
pub async fn categories_list(
    config: &Config,
    mode: Mode,
    args: ListCategoriesArgs,
) -> Result<Out<CategoryBudgets>> {
    let mut ledger = Ledger::from_config(config, mode, args.spreadsheet_id()).await?;
    let budgets = ledger.categories().await?;
    Ok(Out::new(
        format!(
            "Found {} expense categories and {} income categories",
            budgets.categories.len(),
            budgets.income_categories.len()
        ),
        budgets,
    ))
}

/// Reads a `SaveCategories` JSON file and saves it.
pub async fn categories_save(
    config: &Config,
    mode: Mode,
    args: SaveCategoriesArgs,
) -> Result<Out<CategoryBudgets>> {
    let save: SaveCategories = utils::deserialize(args.file())
        .await
        .with_context(|| format!("Unable to read categories from {}", args.file().display()))
        .pub_result(ErrorType::InvalidInput)?;
    save_categories(config, mode, &save, args.spreadsheet_id()).await
}

/// Replaces the budgets and the expense categories, and the income categories when given.
pub async fn save_categories(
    config: &Config,
    mode: Mode,
    save: &SaveCategories,
    spreadsheet_id: Option<&str>,
) -> Result<Out<CategoryBudgets>> {
    let mut ledger = Ledger::from_config(config, mode, spreadsheet_id).await?;
    let budgets = ledger.save_categories(save).await?;
    Ok(Out::new(
        format!("Saved {} expense categories", budgets.categories.len()),
        budgets,
    ))
}
