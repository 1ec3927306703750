use crate::args::RecordTransactionArgs;
use crate::commands::Out;
use crate::model::{TransactionKind, TransactionReceipt};
use crate::{Config, Ledger, Mode, Result};

/// Records a new expense or income into the first free row of its block.
pub async fn record(
    config: &Config,
    mode: Mode,
    kind: TransactionKind,
    args: RecordTransactionArgs,
) -> Result<Out<TransactionReceipt>> {
    let mut ledger = Ledger::from_config(config, mode, args.spreadsheet_id()).await?;
    let sheet = args
        .sheet()
        .map(str::to_string)
        .unwrap_or_else(|| ledger.current_sheet_name());
    let receipt = ledger
        .record_transaction(&sheet, kind, args.transaction(), args.author())
        .await?;
    Ok(Out::new(
        format!("Recorded {kind} {} in {}", receipt.id, receipt.range),
        receipt,
    ))
}
