//! The MCP tools. Each one checks that the service was initialized and then calls the command
//! handler of the same name.

use crate::args::{
    AnalysisArgs, ListCategoriesArgs, RecordTransactionArgs, SaveCategoriesParams,
    TransactionsArgs,
};
use crate::commands;
use crate::mcp::mcp_utils::tool_result;
use crate::mcp::ByeborosServer;
use crate::model::TransactionKind;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::CallToolResult;
use rmcp::ErrorData as McpError;
use rmcp::{tool, tool_router};
use tracing::info;

#[tool_router(vis = "pub(super)")]
impl ByeborosServer {
    #[tool]
    /// Initialize the byeboros MCP service for this session and return usage instructions. You
    /// **MUST** call this **ONCE** before using other tools so that you have the full usage
    /// instructions. You **MAY** call it more than once if you have forgotten the usage
    /// instructions.
    async fn initialize_service(&self) -> Result<CallToolResult, McpError> {
        let mut initialized = self.initialized.lock().await;
        *initialized = true;
        Ok(CallToolResult::success(vec![rmcp::model::Content::text(
            include_str!("docs/INSTRUCTIONS.md"),
        )]))
    }

    /// List the transactions of one month sheet, grouped by calendar day.
    ///
    /// Groups are ordered by the latest time of day of their items, and items within a group are
    /// ordered by time of day, latest first. Each group has a `label` (`Hari Ini` for today,
    /// `Kemarin` for yesterday, otherwise e.g. `12 Oct 2026`), a `total_expense` (a positive sum)
    /// and a `total_income`.
    ///
    /// Each item has an `id` such as `txn_exp_3` or `txn_inc_1`. The number is the position of
    /// the row within its block, so ids change when rows are inserted or removed in the sheet.
    /// Expense amounts are negative and income amounts are positive.
    ///
    /// # Parameters
    ///
    /// - `sheet`: The month sheet, e.g. `Oktober`. Defaults to the current month.
    /// - `date`: Only this date, `YYYY-MM-DD`.
    /// - `category`: Only this category, matched case-insensitively on the whole name.
    /// - `type`: `expense` or `income`.
    #[tool]
    async fn list_transactions(
        &self,
        Parameters(args): Parameters<TransactionsArgs>,
    ) -> Result<CallToolResult, McpError> {
        require_init!(self);
        info!("MCP: list_transactions called with {args:?}");
        tool_result(commands::transactions(&self.config, self.mode, args).await)
    }

    /// Summarize expenses and income over a period.
    ///
    /// Returns an `expense` report and an `income` report. Each has the total, the amount and
    /// whole-number percentage of every category, the top category (`-` when nothing is
    /// positive) and the daily average. The expense report also has the amounts per priority:
    /// `high`, `medium`, `low` and, when non-zero, `other`.
    ///
    /// # Parameters
    ///
    /// - `sheet`: The month sheet the period is counted from. Defaults to the current month.
    /// - `period`: `Day`, `Month` (default), `3 Months`, `6 Months` or `Year`. The multi-month
    ///   periods add up the month sheets that exist in the window; months without a sheet are
    ///   skipped.
    #[tool]
    async fn get_analysis(
        &self,
        Parameters(args): Parameters<AnalysisArgs>,
    ) -> Result<CallToolResult, McpError> {
        require_init!(self);
        info!("MCP: get_analysis called with {args:?}");
        tool_result(commands::analysis(&self.config, self.mode, args).await)
    }

    /// Record money spent. The row is written below the last row of the expense block of the
    /// month sheet, and the returned receipt has its id and range.
    ///
    /// `description`, `category` and a positive `amount` are required. `priority` is one of
    /// `Tinggi`, `Sedang` or `Rendah`. `transaction_at` defaults to now (Asia/Jakarta).
    #[tool]
    async fn record_expense(
        &self,
        Parameters(args): Parameters<RecordTransactionArgs>,
    ) -> Result<CallToolResult, McpError> {
        require_init!(self);
        info!("MCP: record_expense called with {args:?}");
        let out =
            commands::record(&self.config, self.mode, TransactionKind::Expense, args).await;
        tool_result(out)
    }

    /// Record money received. The row is written below the last row of the income block of the
    /// month sheet, and the returned receipt has its id and range. `priority` is ignored.
    #[tool]
    async fn record_income(
        &self,
        Parameters(args): Parameters<RecordTransactionArgs>,
    ) -> Result<CallToolResult, McpError> {
        require_init!(self);
        info!("MCP: record_income called with {args:?}");
        let out = commands::record(&self.config, self.mode, TransactionKind::Income, args).await;
        tool_result(out)
    }

    /// List the monthly and daily budgets, the expense categories with their budgets, and the
    /// income categories from the master sheet.
    #[tool]
    async fn list_categories(
        &self,
        Parameters(args): Parameters<ListCategoriesArgs>,
    ) -> Result<CallToolResult, McpError> {
        require_init!(self);
        info!("MCP: list_categories called");
        tool_result(commands::categories_list(&self.config, self.mode, args).await)
    }

    /// Replace the budgets and the expense categories on the master sheet.
    ///
    /// `categories` is the complete new list: categories that are left out are removed. When
    /// `income_categories` is given it replaces the income category list, otherwise that list is
    /// kept. Call `list_categories` first and send back the edited result.
    #[tool]
    async fn save_categories(
        &self,
        Parameters(params): Parameters<SaveCategoriesParams>,
    ) -> Result<CallToolResult, McpError> {
        require_init!(self);
        info!(
            "MCP: save_categories called with {} categories",
            params.categories.categories.len()
        );
        let out = commands::save_categories(
            &self.config,
            self.mode,
            &params.categories,
            params.spreadsheet_id.as_deref(),
        )
        .await;
        tool_result(out)
    }
}
