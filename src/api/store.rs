//! Implements `TransactionStore` on top of any `Sheet`.

use crate::api::{Sheet, TransactionStore};
use crate::error::Res;
use crate::model::{Column, Row};
use anyhow::bail;
use tracing::debug;

/// Reads and appends transaction rows in one range of a sheet, e.g. `A:G` or `Ledger!A:G`.
pub(crate) struct SheetStore {
    sheet: Box<dyn Sheet + Send>,
    range: String,
}

impl SheetStore {
    pub(crate) fn new(sheet: Box<dyn Sheet + Send>, range: impl Into<String>) -> Self {
        Self {
            sheet,
            range: range.into(),
        }
    }
}

#[async_trait::async_trait]
impl TransactionStore for SheetStore {
    async fn read_all_rows(&mut self) -> Res<Vec<Row>> {
        let values = self.sheet.get(&self.range).await?;
        let rows = Row::parse_sheet(values)?;
        debug!("Read {} row(s) from {}", rows.len(), self.range);
        Ok(rows)
    }

    async fn append_row(&mut self, row: &Row) -> Res<()> {
        let existing = self.sheet.get(&self.range).await?;
        let header = existing
            .iter()
            .find(|r| r.iter().any(|cell| !cell.trim().is_empty()));

        let values = match header {
            None => {
                debug!("The sheet is empty, writing the header row first");
                vec![Column::header_row(), row.values()]
            }
            Some(header) => vec![values_for_header(header, row)?],
        };
        self.sheet.append(&self.range, &values).await
    }
}

/// Lays out `row` to match the sheet's existing header, so that a sheet whose columns have been
/// reordered is still written correctly.
fn values_for_header(header: &[String], row: &Row) -> Res<Vec<String>> {
    let header: Vec<&str> = header.iter().map(|h| h.trim()).collect();
    for column in Column::ALL {
        if !header.contains(&column.as_header_str()) {
            bail!(
                "The sheet's header row is missing the '{}' column",
                column.as_header_str()
            );
        }
    }
    Ok(header.iter().map(|h| row.cell(h).to_string()).collect())
}
