//! Access to the Google sheet that stores the household's transactions.
//!
//! The `Sheet` trait is the thin layer over the Sheets API (or the in-memory `TestSheet`), and
//! `TransactionStore` is the read/append contract the rest of the app uses.

mod files;
mod oauth;
mod sheet;
mod store;
mod test_sheet;

use crate::error::Res;
use crate::model::Row;
use crate::Config;
use sheet::GoogleSheet;
use store::SheetStore;
use tracing::debug;

pub(crate) use oauth::TokenProvider;
pub(crate) use test_sheet::TestSheet;
#[cfg(test)]
pub(crate) use test_sheet::TestSheetState;

/// OAuth scopes required for Sheets API access.
const OAUTH_SCOPES: &[&str] = &["https://www.googleapis.com/auth/spreadsheets"];

/// The environment variable that switches the app to `Mode::Testing`.
const TEST_MODE_ENV: &str = "LEDGER_IN_TEST_MODE";

/// Whether to talk to Google or to an in-memory sheet.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq)]
pub enum Mode {
    #[default]
    Google,
    Testing,
}

impl Mode {
    /// `Mode::Testing` when `LEDGER_IN_TEST_MODE` is set to anything non-empty, otherwise
    /// `Mode::Google`.
    pub fn from_env() -> Self {
        match std::env::var(TEST_MODE_ENV) {
            Ok(value) if !value.is_empty() => Mode::Testing,
            _ => Mode::Google,
        }
    }
}

/// The lowest level of sheet access: read the values in a range, or append rows after the last
/// row of a range.
#[async_trait::async_trait]
pub(crate) trait Sheet {
    async fn get(&mut self, range: &str) -> Res<Vec<Vec<String>>>;

    async fn append(&mut self, range: &str, values: &[Vec<String>]) -> Res<()>;
}

/// Where transactions are persisted. Rows are only ever appended, never changed or removed.
#[async_trait::async_trait]
pub(crate) trait TransactionStore {
    /// Every data row of the sheet, keyed by the header row.
    async fn read_all_rows(&mut self) -> Res<Vec<Row>>;

    /// Appends `row` after the last row, writing the header first if the sheet is empty.
    async fn append_row(&mut self, row: &Row) -> Res<()>;
}

/// Creates the `Sheet` for `config` in the given `mode`.
pub(crate) async fn sheet(config: &Config, mode: Mode) -> Res<Box<dyn Sheet + Send>> {
    match mode {
        Mode::Google => {
            let token_provider =
                TokenProvider::load(config.client_secret_path(), config.token_path()).await?;
            Ok(Box::new(
                GoogleSheet::new(config.spreadsheet_id(), token_provider).await?,
            ))
        }
        Mode::Testing => Ok(Box::new(TestSheet::new(config.spreadsheet_id()))),
    }
}

/// Creates the `TransactionStore` for `config` in the given `mode`.
pub(crate) async fn store(config: &Config, mode: Mode) -> Res<Box<dyn TransactionStore + Send>> {
    debug!("Opening the transaction store in {mode:?} mode");
    let sheet = sheet(config, mode).await?;
    Ok(Box::new(SheetStore::new(sheet, config.range())))
}
