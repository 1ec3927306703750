use crate::args::AnalysisArgs;
use crate::commands::Out;
use crate::error::{ErrorType, IntoResult};
use crate::model::Period;
use crate::report::Analysis;
use crate::{Config, Ledger, Mode, Result};
use anyhow::anyhow;
use std::str::FromStr;

/// Summarizes expenses and income over a period by category, and expenses by priority.
pub async fn analysis(config: &Config, mode: Mode, args: AnalysisArgs) -> Result<Out<Analysis>> {
    let period = Period::from_str(args.period().trim())
        .map_err(|_| {
            anyhow!(
                "Unknown period '{}'. Use one of: Day, Month, 3 Months, 6 Months, Year",
                args.period()
            )
        })
        .pub_result(ErrorType::InvalidPeriod)?;
    let mut ledger = Ledger::from_config(config, mode, args.spreadsheet_id()).await?;
    let sheet = args
        .sheet()
        .map(str::to_string)
        .unwrap_or_else(|| ledger.current_sheet_name());
    let analysis = ledger.analysis(&sheet, period).await?;
    let message = format!(
        "{}: spent {} (top: {}), received {}",
        analysis.expense.period_label,
        analysis.expense.total_display,
        analysis.expense.top_category.name,
        analysis.income.total_display,
    );
    Ok(Out::new(message, analysis))
}
