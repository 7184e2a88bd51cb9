//! A household income and expense ledger kept in a Google Sheet.
//!
//! Transactions are validated against a fixed two-level category taxonomy and the household's
//! members before being appended to the sheet. Monthly reports are computed from whatever is in
//! the sheet at the time they are asked for. The same operations are available from the `ledger`
//! command line and from an MCP server.

mod api;
pub mod args;
pub mod commands;
mod config;
mod error;
mod mcp;
pub mod model;
mod utils;


pub use api::Mode;
pub use config::Config;
pub use error::{Error, ErrorType, Result};
