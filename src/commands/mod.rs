//! Command handlers for the ledger CLI.
//!
//! The MCP tools call these same handlers, so each returns an `Out` carrying both a message for
//! people and structured data for agents.

mod add;
mod auth;
mod categories;
mod init;
mod mcp;
mod recent;
mod report;

use crate::api::{self, Mode};
use crate::error::Res;
use crate::model::TransactionLog;
use crate::Config;
use serde::Serialize;
use std::fmt::Debug;
use tracing::{debug, info};

pub use add::add;
pub use auth::{auth, auth_verify};
pub use categories::{categories, CategoryListing, KindCategories};
pub use init::init;
pub use mcp::mcp;
pub use recent::recent;
pub use report::{report, ReportOut};

/// The output type for a command. This allows the command to return a consistent message and,
/// optionally, structured data to both the command line and MCP server interfaces.
#[derive(Debug, Clone, Serialize)]
pub struct Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// A message that can be printed to the user regarding the outcome of the command execution.
    message: String,

    /// Any structured data that needs to be output from the call.
    structure: Option<T>,
}

impl<T, S> From<S> for Out<T>
where
    T: Debug + Clone + Serialize,
    S: Into<String>,
{
    fn from(value: S) -> Self {
        Out::new_message(value)
    }
}

impl<T> Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// Create a new `Out` object that has `Some(structure)`.
    pub fn new<S>(message: S, structure: T) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
            structure: Some(structure),
        }
    }

    /// Create a new `Out` object that has `None` for `structure`.
    pub fn new_message<S>(message: S) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
            structure: None,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn structure(&self) -> Option<&T> {
        self.structure.as_ref()
    }

    /// Print the message to `info!` and the structured data (if it exists) as JSON to `debug!`.
    pub fn print(&self) {
        info!("{}", self.message);
        if let Some(structure) = self.structure() {
            if let Ok(json) = serde_json::to_string_pretty(structure) {
                debug!("Command output:\n\n{json}\n\n");
            }
        }
    }
}

/// Reads every row from the store and validates it into a fresh `TransactionLog`. Nothing is
/// cached between calls.
async fn load_log(config: &Config, mode: Mode) -> Res<TransactionLog> {
    let mut store = api::store(config, mode).await?;
    let rows = store.read_all_rows().await?;
    let log = TransactionLog::load(&rows, config.taxonomy(), config.household());
    debug!(
        "Loaded {} transaction(s), skipped {} row(s)",
        log.len(),
        log.skipped().len()
    );
    Ok(log)
}
