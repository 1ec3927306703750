use crate::args::TransactionsArgs;
use crate::commands::Out;
use crate::error::{ErrorType, IntoResult};
use crate::report::{TransactionFilter, TransactionGroup};
use crate::{Config, Ledger, Mode, Result};

/// Lists the transactions of a month sheet grouped by day, latest time of day first.
///
/// The filters are checked before anything is read, so a bad date or type is an `InvalidFilter`
/// error. With a type filter only that block of the sheet is read.
pub async fn transactions(
    config: &Config,
    mode: Mode,
    args: TransactionsArgs,
) -> Result<Out<Vec<TransactionGroup>>> {
    let filter = TransactionFilter::new(args.date(), args.category(), args.kind())
        .pub_result(ErrorType::InvalidFilter)?;
    let mut ledger = Ledger::from_config(config, mode, args.spreadsheet_id()).await?;
    let sheet = args
        .sheet()
        .map(str::to_string)
        .unwrap_or_else(|| ledger.current_sheet_name());
    let groups = ledger.list_transactions(&sheet, &filter).await?;
    let count: usize = groups.iter().map(|g| g.items.len()).sum();
    Ok(Out::new(
        format!(
            "Found {count} transactions on {} days in {sheet}",
            groups.len()
        ),
        groups,
    ))
}
