//! These structs provide the CLI interface for the ledger CLI.

use crate::model::{Amount, Kind};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::error;
use tracing_subscriber::filter::LevelFilter;

/// ledger: record household income and expenses in a Google sheet and see where the money went.
///
/// Every member of the household records transactions against the same two-level set of
/// categories, e.g. Expense / Household / Electricity. The transactions live in a Google sheet,
/// one row each, and the monthly report is computed from them whenever you ask for it.
///
/// You will need to set up a Google Cloud OAuth client for this and download its credentials.
/// Then run `ledger init` followed by `ledger auth`.
///
/// There is also a mode in which an AI agent can use this program through the mcp subcommand.
#[derive(Debug, Parser, Clone)]
pub struct Args {
    #[clap(flatten)]
    common: Common,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    pub fn new(common: Common, command: Command) -> Self {
        Self { common, command }
    }

    pub fn common(&self) -> &Common {
        &self.common
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create the data directory and initialize the configuration files.
    ///
    /// This is the first command you should run. You need two things ready beforehand:
    ///
    /// - The URL of the Google sheet that holds (or will hold) your transactions, passed as
    ///   --sheet-url.
    ///
    /// - The OAuth client credentials JSON downloaded from Google Cloud Console, passed as
    ///   --client-secret. Its redirect URIs must include http://localhost.
    ///
    /// The data directory is $HOME/ledger unless you pass --ledger-home.
    Init(InitArgs),
    /// Authenticate with Google Sheets via OAuth.
    Auth(AuthArgs),
    /// Record an income or expense transaction.
    Add(AddArgs),
    /// Show the totals and the expense breakdown for a month.
    Report(ReportArgs),
    /// Show the most recently recorded transactions.
    Recent(RecentArgs),
    /// List the main categories and sub-categories that transactions can be recorded against.
    Categories(CategoriesArgs),
    /// Run an MCP server on stdin/stdout so that an AI agent can use the ledger.
    Mcp(McpArgs),
}

/// Arguments common to all subcommands.
#[derive(Debug, Parser, Clone)]
pub struct Common {
    /// The logging verbosity. One of, from least to most verbose:
    /// off, error, warn, info, debug, trace
    ///
    /// This can be overridden by RUST_LOG.
    #[arg(long, default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,

    /// The directory where ledger configuration and credentials are held. Defaults to ~/ledger
    #[arg(long, env = "LEDGER_HOME", default_value_t = default_ledger_home())]
    ledger_home: DisplayPath,
}

impl Common {
    pub fn new(log_level: LevelFilter, ledger_home: PathBuf) -> Self {
        Self {
            log_level,
            ledger_home: ledger_home.into(),
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn ledger_home(&self) -> &DisplayPath {
        &self.ledger_home
    }
}

/// Args for the `ledger init` command.
#[derive(Debug, Parser, Clone)]
pub struct InitArgs {
    /// The URL to your Google sheet. It looks like this:
    /// https://docs.google.com/spreadsheets/d/1a7Km9FxQwRbPt82JvN4LzYpH5OcGnWsT6iDuE3VhMjX/edit
    #[arg(long)]
    sheet_url: String,

    /// The path to your downloaded OAuth client credentials. This file will be copied to the
    /// secrets directory inside the ledger home.
    #[arg(long)]
    client_secret: PathBuf,
}

impl InitArgs {
    pub fn new(sheet_url: impl Into<String>, client_secret: impl Into<PathBuf>) -> Self {
        Self {
            sheet_url: sheet_url.into(),
            client_secret: client_secret.into(),
        }
    }

    pub fn sheet_url(&self) -> &str {
        &self.sheet_url
    }

    pub fn client_secret(&self) -> &Path {
        &self.client_secret
    }
}

/// Args for the `ledger auth` command.
#[derive(Debug, Parser, Clone)]
pub struct AuthArgs {
    /// Verify and refresh the existing authentication without opening a browser.
    #[arg(long)]
    verify: bool,
}

impl AuthArgs {
    pub fn new(verify: bool) -> Self {
        Self { verify }
    }

    pub fn verify(&self) -> bool {
        self.verify
    }
}

/// Args for the `ledger add` command.
#[derive(Debug, Parser, Clone)]
pub struct AddArgs {
    /// Income or Expense.
    #[arg(long, value_enum, default_value_t = Kind::Expense)]
    kind: Kind,

    /// The household member the transaction belongs to.
    #[arg(long)]
    member: String,

    /// The main category, e.g. Household. When omitted, children's expenses go to Children and
    /// everything else to the first main category of the kind.
    #[arg(long)]
    main: Option<String>,

    /// The sub-category, e.g. Electricity. Must belong to the main category.
    #[arg(long)]
    sub: String,

    /// The amount, zero or more. A dollar sign and thousands separators are allowed.
    #[arg(long, allow_negative_numbers = true)]
    amount: Amount,

    /// The date of the transaction as YYYY-MM-DD. Defaults to today.
    #[arg(long)]
    date: Option<NaiveDate>,

    /// An optional note.
    #[arg(long)]
    note: Option<String>,
}

impl AddArgs {
    pub fn new(
        kind: Kind,
        member: impl Into<String>,
        main: Option<String>,
        sub: impl Into<String>,
        amount: Amount,
        date: Option<NaiveDate>,
        note: Option<String>,
    ) -> Self {
        Self {
            kind,
            member: member.into(),
            main,
            sub: sub.into(),
            amount,
            date,
            note,
        }
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    pub fn member(&self) -> &str {
        &self.member
    }

    pub fn main(&self) -> Option<&str> {
        self.main.as_deref()
    }

    pub fn sub(&self) -> &str {
        &self.sub
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }

    pub fn date(&self) -> Option<NaiveDate> {
        self.date
    }

    pub fn note(&self) -> Option<&str> {
        self.note.as_deref()
    }
}

/// How the report is printed.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    schemars::JsonSchema,
    clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// Human-readable tables.
    #[default]
    Table,
    /// The report as JSON.
    Json,
}

serde_plain::derive_display_from_serialize!(ReportFormat);
serde_plain::derive_fromstr_from_deserialize!(ReportFormat);

/// Args for the `ledger report` command.
#[derive(Debug, Parser, Clone, Default)]
pub struct ReportArgs {
    /// The month, 1-12. Defaults to the current month.
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=12))]
    month: Option<u32>,

    /// Only include transactions from this year. Without it, the month of every year is included.
    #[arg(long)]
    year: Option<i32>,

    #[arg(long, value_enum, default_value_t = ReportFormat::Table)]
    format: ReportFormat,
}

impl ReportArgs {
    pub fn new(month: Option<u32>, year: Option<i32>, format: ReportFormat) -> Self {
        Self {
            month,
            year,
            format,
        }
    }

    pub fn month(&self) -> Option<u32> {
        self.month
    }

    pub fn year(&self) -> Option<i32> {
        self.year
    }

    pub fn format(&self) -> ReportFormat {
        self.format
    }
}

/// Args for the `ledger recent` command.
#[derive(Debug, Parser, Clone)]
pub struct RecentArgs {
    /// How many transactions to show.
    #[arg(long, default_value_t = 5)]
    count: usize,
}

impl RecentArgs {
    pub fn new(count: usize) -> Self {
        Self { count }
    }

    pub fn count(&self) -> usize {
        self.count
    }
}

/// Args for the `ledger categories` command.
#[derive(Debug, Parser, Clone, Default)]
pub struct CategoriesArgs {
    /// Only list the categories of this kind.
    #[arg(long, value_enum)]
    kind: Option<Kind>,

    /// Show which main category is pre-selected for this member.
    #[arg(long)]
    member: Option<String>,
}

impl CategoriesArgs {
    pub fn new(kind: Option<Kind>, member: Option<String>) -> Self {
        Self { kind, member }
    }

    pub fn kind(&self) -> Option<Kind> {
        self.kind
    }

    pub fn member(&self) -> Option<&str> {
        self.member.as_deref()
    }
}

/// Args for the `ledger mcp` command.
#[derive(Debug, Parser, Clone)]
pub struct McpArgs {}

fn default_ledger_home() -> DisplayPath {
    DisplayPath(match dirs::home_dir() {
        Some(home) => home.join("ledger"),
        None => {
            error!(
                "There was an error when trying to get your home directory. You can get around \
                this by providing --ledger-home or LEDGER_HOME instead of relying on the default \
                ledger home directory. If you continue using the program right now, you may have \
                problems!",
            );
            PathBuf::from("ledger")
        }
    })
}

#[derive(Debug, Default, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct DisplayPath(PathBuf);

impl From<PathBuf> for DisplayPath {
    fn from(value: PathBuf) -> Self {
        DisplayPath(value)
    }
}

impl Deref for DisplayPath {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<Path> for DisplayPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl Display for DisplayPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

impl FromStr for DisplayPath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(PathBuf::from(s)))
    }
}

impl DisplayPath {
    pub fn path(&self) -> &Path {
        &self.0
    }
}
