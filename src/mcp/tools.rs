//! The tools served by `LedgerServer`. Each one delegates to the command handler of the same
//! purpose.

use crate::args::{AddArgs, CategoriesArgs, RecentArgs, ReportArgs, ReportFormat};
use crate::commands;
use crate::error::{ErrorType, IntoResult};
use crate::mcp::mcp_utils::tool_result;
use crate::mcp::LedgerServer;
use crate::model::{Amount, Kind, ValidationError};
use chrono::NaiveDate;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{CallToolResult, Content};
use rmcp::ErrorData as McpError;
use rmcp::{tool, tool_router};
use schemars::JsonSchema;
use serde::Deserialize;
use std::str::FromStr;
use tracing::info;

const DEFAULT_RECENT_COUNT: usize = 5;

/// Parameters for the record_transaction tool.
#[derive(Debug, Deserialize, JsonSchema)]
#[schemars(title = "RecordTransactionParams")]
pub struct RecordTransactionParams {
    /// 'Income' or 'Expense'. Defaults to 'Expense'.
    #[serde(default)]
    pub kind: Kind,

    /// The household member the transaction belongs to. Must be one of the configured members.
    pub member: String,

    /// The main category, e.g. 'Household'. When omitted, expenses of a child default to
    /// 'Children' and everything else to the first main category of the kind.
    #[serde(default)]
    pub main_category: Option<String>,

    /// The sub-category, e.g. 'Electricity'. It must belong to the main category.
    pub sub_category: String,

    /// The amount as a decimal string, e.g. '320.50'. Zero or more.
    pub amount: String,

    /// The date as 'YYYY-MM-DD'. Defaults to today.
    #[serde(default)]
    pub date: Option<String>,

    /// An optional free-text note.
    #[serde(default)]
    pub note: Option<String>,
}

impl RecordTransactionParams {
    fn into_args(self) -> crate::Result<AddArgs> {
        let amount = parse_amount(&self.amount).pub_result(ErrorType::Validation)?;
        let date = self
            .date
            .as_deref()
            .map(parse_date)
            .transpose()
            .pub_result(ErrorType::Validation)?;
        Ok(AddArgs::new(
            self.kind,
            self.member,
            self.main_category,
            self.sub_category,
            amount,
            date,
            self.note,
        ))
    }
}

/// Parameters for the monthly_report tool.
#[derive(Debug, Default, Deserialize, JsonSchema)]
#[schemars(title = "MonthlyReportParams")]
pub struct MonthlyReportParams {
    /// The month to report on, 1 through 12. Defaults to the current month.
    #[serde(default)]
    pub month: Option<u32>,

    /// Restricts the report to one year. When omitted, the month is matched in every year.
    #[serde(default)]
    pub year: Option<i32>,
}

/// Parameters for the recent_transactions tool.
#[derive(Debug, Default, Deserialize, JsonSchema)]
#[schemars(title = "RecentTransactionsParams")]
pub struct RecentTransactionsParams {
    /// How many transactions to return. Defaults to 5.
    #[serde(default)]
    pub count: Option<usize>,
}

/// Parameters for the list_categories tool.
#[derive(Debug, Default, Deserialize, JsonSchema)]
#[schemars(title = "ListCategoriesParams")]
pub struct ListCategoriesParams {
    /// Only list the categories of this kind, 'Income' or 'Expense'.
    #[serde(default)]
    pub kind: Option<Kind>,

    /// When given, the main category that is suggested for this member is marked as the default.
    #[serde(default)]
    pub member: Option<String>,
}

#[tool_router(vis = "pub(super)")]
impl LedgerServer {
    /// Prepare the ledger service for this session and return the usage instructions. You
    /// **MUST** call this **ONCE** before any other tool. You **MAY** call it again if you have
    /// forgotten the instructions.
    #[tool]
    async fn initialize_service(&self) -> Result<CallToolResult, McpError> {
        let mut initialized = self.initialized.lock().await;
        *initialized = true;
        Ok(CallToolResult::success(vec![Content::text(include_str!(
            "docs/INSTRUCTIONS.md"
        ))]))
    }

    /// Record one income or expense by appending a row to the household's Google Sheet.
    ///
    /// The member and the (kind, main category, sub-category) triple are checked before anything
    /// is written. A rejected transaction returns a validation error and the sheet is unchanged.
    /// Call `list_categories` to see the valid categories.
    ///
    /// # Example
    ///
    /// ```json
    /// {
    ///   "member": "Kam",
    ///   "main_category": "Household",
    ///   "sub_category": "Electricity",
    ///   "amount": "500",
    ///   "date": "2024-03-05"
    /// }
    /// ```
    #[tool]
    async fn record_transaction(
        &self,
        Parameters(params): Parameters<RecordTransactionParams>,
    ) -> Result<CallToolResult, McpError> {
        require_init!(self);
        info!("MCP: record_transaction called for {}", params.member);
        let out = match params.into_args() {
            Ok(args) => commands::add(self.config(), self.mode, args).await,
            Err(e) => Err(e),
        };
        tool_result(out)
    }

    /// Summarize one month: total income, total expense, balance, and the expenses broken down
    /// by main category, sub-category and member. Rows in the sheet that could not be read are
    /// counted and listed separately.
    ///
    /// The first content item is a printable table, the second is the same report as JSON.
    #[tool]
    async fn monthly_report(
        &self,
        Parameters(params): Parameters<MonthlyReportParams>,
    ) -> Result<CallToolResult, McpError> {
        require_init!(self);
        info!(
            "MCP: monthly_report called with month={:?}, year={:?}",
            params.month, params.year
        );
        if let Some(month) = params.month.filter(|m| !(1..=12).contains(m)) {
            return Ok(CallToolResult::error(vec![Content::text(format!(
                "The month must be between 1 and 12, got {month}"
            ))]));
        }
        let args = ReportArgs::new(params.month, params.year, ReportFormat::Table);
        tool_result(commands::report(self.config(), self.mode, args).await)
    }

    /// List the most recently recorded transactions, oldest first.
    #[tool]
    async fn recent_transactions(
        &self,
        Parameters(params): Parameters<RecentTransactionsParams>,
    ) -> Result<CallToolResult, McpError> {
        require_init!(self);
        let args = RecentArgs::new(params.count.unwrap_or(DEFAULT_RECENT_COUNT));
        tool_result(commands::recent(self.config(), self.mode, args).await)
    }

    /// List the valid main categories and sub-categories for each kind. Pass a member to learn
    /// which main category is suggested for them.
    #[tool]
    async fn list_categories(
        &self,
        Parameters(params): Parameters<ListCategoriesParams>,
    ) -> Result<CallToolResult, McpError> {
        require_init!(self);
        let args = CategoriesArgs::new(params.kind, params.member);
        tool_result(commands::categories(self.config(), args))
    }
}

fn parse_amount(s: &str) -> Result<Amount, ValidationError> {
    Amount::from_str(s).map_err(|_| ValidationError::InvalidAmount(s.to_string()))
}

fn parse_date(s: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|_| ValidationError::InvalidDate(s.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_params_into_args() {
        let params: RecordTransactionParams = serde_json::from_value(serde_json::json!({
            "member": "Kam",
            "sub_category": "Water",
            "amount": "$1,088.50",
            "date": "2024-04-02"
        }))
        .unwrap();
        let args = params.into_args().unwrap();
        assert_eq!(args.kind(), Kind::Expense);
        assert!(args.main().is_none());
        assert_eq!(args.amount().value(), rust_decimal::Decimal::new(108850, 2));
        assert_eq!(args.date(), NaiveDate::from_ymd_opt(2024, 4, 2));
    }

    #[test]
    fn test_record_params_rejects_bad_input() {
        assert_eq!(
            parse_amount("  "),
            Err(ValidationError::InvalidAmount("  ".to_string()))
        );
        assert!(parse_amount("ten").is_err());
        assert_eq!(
            parse_date("03/05/2024"),
            Err(ValidationError::InvalidDate("03/05/2024".to_string()))
        );
    }

    #[test]
    fn test_tool_descriptions_from_doc_comments() {
        let tool = LedgerServer::record_transaction_tool_attr();
        let description = tool.description.expect("record_transaction has a description");
        assert!(description.contains("appending a row"), "{description}");
    }

    #[test]
    fn test_record_params_schema_description() {
        let schema = serde_json::to_string_pretty(&schemars::schema_for!(RecordTransactionParams))
            .unwrap();
        assert!(schema.contains("Must be one of the configured members"), "{schema}");
    }
}
