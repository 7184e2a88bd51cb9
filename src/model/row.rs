//! The 7-column row shape in which transactions are persisted to the sheet.

use crate::error::Res;
use crate::model::{Amount, AmountFormat, Entry, Transaction, ValidationError};
use anyhow::bail;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::str::FromStr;
use tracing::warn;

/// Date formats that Google Sheets may hand back for a date cell, tried in order.
const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

/// The format used when writing dates to the sheet.
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Represents the known columns of the transactions sheet, in the order they are written.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Column {
    Date,
    Member,
    Kind,
    MainCategory,
    SubCategory,
    Amount,
    Note,
}

serde_plain::derive_display_from_serialize!(Column);
serde_plain::derive_fromstr_from_deserialize!(Column);

impl Column {
    pub const ALL: [Column; 7] = [
        Column::Date,
        Column::Member,
        Column::Kind,
        Column::MainCategory,
        Column::SubCategory,
        Column::Amount,
        Column::Note,
    ];

    pub fn as_header_str(&self) -> &'static str {
        match self {
            Column::Date => DATE_STR,
            Column::Member => MEMBER_STR,
            Column::Kind => KIND_STR,
            Column::MainCategory => MAIN_CATEGORY_STR,
            Column::SubCategory => SUB_CATEGORY_STR,
            Column::Amount => AMOUNT_STR,
            Column::Note => NOTE_STR,
        }
    }

    /// The header row that the sheet is expected to start with.
    pub fn header_row() -> Vec<String> {
        Column::ALL
            .iter()
            .map(|c| c.as_header_str().to_string())
            .collect()
    }
}

pub(super) const DATE_STR: &str = "Date";
pub(super) const MEMBER_STR: &str = "Member";
pub(super) const KIND_STR: &str = "Kind";
pub(super) const MAIN_CATEGORY_STR: &str = "MainCategory";
pub(super) const SUB_CATEGORY_STR: &str = "SubCategory";
pub(super) const AMOUNT_STR: &str = "Amount";
pub(super) const NOTE_STR: &str = "Note";

/// One raw record from the sheet: header name -> cell text.
///
/// Headers that are not one of the known `Column`s are kept so that nothing in the sheet is
/// silently lost, but they are not used.
#[derive(Default, Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Row {
    cells: BTreeMap<String, String>,
    /// The 1-based sheet row this was read from, with the header as row 1.
    #[serde(skip)]
    sheet_row: Option<usize>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, column: Column, value: impl Into<String>) -> Self {
        self.set(column.as_header_str(), value);
        self
    }

    pub fn set(&mut self, header: impl Into<String>, value: impl Into<String>) {
        let _ = self.cells.insert(header.into(), value.into());
    }

    /// The text of `column`, or an empty string when the row does not have it.
    pub fn get(&self, column: Column) -> &str {
        self.cell(column.as_header_str())
    }

    /// The text under `header`, or an empty string when the row does not have it.
    pub fn cell(&self, header: &str) -> &str {
        self.cells
            .get(header)
            .map(String::as_str)
            .unwrap_or_default()
    }

    /// Where the row sits in the sheet. `None` for rows that were not read from a sheet.
    pub fn sheet_row(&self) -> Option<usize> {
        self.sheet_row
    }

    /// The values of the known columns in sheet order.
    pub fn values(&self) -> Vec<String> {
        Column::ALL.iter().map(|c| self.get(*c).to_string()).collect()
    }

    /// Coerces the raw cell text into an `Entry`. Only the date is checked here. An amount that
    /// does not parse is carried along as text and rejected by `Transaction::new` after the
    /// member, kind and category checks.
    pub fn to_entry(&self) -> Result<Entry, ValidationError> {
        let date = parse_date(self.get(Column::Date))?;
        let amount_str = self.get(Column::Amount);
        let amount = Amount::from_str(amount_str)
            .map(|a| a.value())
            .map_err(|_| amount_str.to_string());
        let note = self.get(Column::Note);
        Ok(Entry {
            date,
            member: self.get(Column::Member).to_string(),
            kind: self.get(Column::Kind).to_string(),
            main_category: self.get(Column::MainCategory).to_string(),
            sub_category: self.get(Column::SubCategory).to_string(),
            amount,
            note: (!note.is_empty()).then(|| note.to_string()),
        })
    }

    /// Parses the values fetched from a sheet. The first row is the header and every following row
    /// becomes a `Row` keyed by those headers. Short rows are padded with empty strings and rows
    /// that are entirely blank are dropped. An empty sheet yields no rows.
    ///
    /// # Errors
    /// - Returns an error if a header is duplicated, since the rows could not be mapped.
    pub fn parse_sheet<S, R>(sheet_data: impl IntoIterator<Item = R>) -> Res<Vec<Row>>
    where
        S: Into<String>,
        R: IntoIterator<Item = S>,
    {
        let mut rows = sheet_data.into_iter();
        let headers: Vec<String> = match rows.next() {
            Some(header_row) => header_row
                .into_iter()
                .map(|s| s.into().trim().to_string())
                .collect(),
            None => return Ok(Vec::new()),
        };

        let mut seen = HashSet::new();
        for header in headers.iter().filter(|h| !h.is_empty()) {
            if !seen.insert(header.as_str()) {
                bail!("Encountered a duplicate header '{header}'");
            }
        }

        let mut parsed = Vec::new();
        // Data starts on sheet row 2.
        for (sheet_row, values) in rows.enumerate().map(|(ix, v)| (ix + 2, v)) {
            let values: Vec<String> = values.into_iter().map(Into::into).collect();
            if values.iter().all(|v| v.trim().is_empty()) {
                continue;
            }
            if values.len() > headers.len() {
                warn!(
                    "Row {sheet_row} is longer than the header row, ignoring {} extra cell(s)",
                    values.len() - headers.len()
                );
            }
            let mut row = Row {
                sheet_row: Some(sheet_row),
                ..Row::default()
            };
            for (ix, header) in headers.iter().enumerate() {
                if header.is_empty() {
                    continue;
                }
                let value = values.get(ix).cloned().unwrap_or_default();
                row.set(header.clone(), value);
            }
            parsed.push(row);
        }
        Ok(parsed)
    }
}

impl From<&Transaction> for Row {
    fn from(t: &Transaction) -> Self {
        Row::new()
            .with(Column::Date, t.date().format(DATE_FORMAT).to_string())
            .with(Column::Member, t.member().as_ref())
            .with(Column::Kind, t.kind().to_string())
            .with(Column::MainCategory, t.main_category())
            .with(Column::SubCategory, t.sub_category())
            .with(
                Column::Amount,
                t.amount().with_format(AmountFormat::Plain).to_string(),
            )
            .with(Column::Note, t.note().unwrap_or_default())
    }
}

/// Parses a date cell. Anything after the date (e.g. a time of day) is ignored.
fn parse_date(s: &str) -> Result<NaiveDate, ValidationError> {
    let date_part = s
        .trim()
        .split(|c: char| c.is_whitespace() || c == 'T')
        .next()
        .unwrap_or_default();
    DATE_FORMATS
        .iter()
        .find_map(|f| NaiveDate::parse_from_str(date_part, f).ok())
        .ok_or_else(|| ValidationError::InvalidDate(s.to_string()))
}
