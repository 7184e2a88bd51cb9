use crate::model::{Household, Row, Taxonomy, Transaction, ValidationError};
use serde::Serialize;
use tracing::warn;

/// A sheet row that could not be turned into a `Transaction`.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct SkippedRow {
    /// The 1-based row number in the sheet, counting the header as row 1.
    pub row_number: usize,
    pub reason: ValidationError,
}

/// The validated transactions read from the store, in store order, along with the rows that
/// were rejected on the way in.
#[derive(Default, Debug, Clone, Eq, PartialEq, Serialize)]
pub struct TransactionLog {
    transactions: Vec<Transaction>,
    skipped: Vec<SkippedRow>,
}

impl TransactionLog {
    /// Builds the log from raw rows. A row that fails to parse or validate does not stop the
    /// load, it is logged and recorded in `skipped()`. Rows that were not read from a sheet are
    /// numbered as if they were contiguous after the header.
    pub fn load(rows: &[Row], taxonomy: &Taxonomy, household: &Household) -> Self {
        let mut log = Self::default();
        for (ix, row) in rows.iter().enumerate() {
            let row_number = row.sheet_row().unwrap_or(ix + 2);
            let result = row
                .to_entry()
                .and_then(|entry| Transaction::new(entry, taxonomy, household));
            match result {
                Ok(t) => log.transactions.push(t),
                Err(reason) => {
                    warn!("Skipping row {row_number}: {reason}");
                    log.skipped.push(SkippedRow { row_number, reason });
                }
            }
        }
        log
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn skipped(&self) -> &[SkippedRow] {
        &self.skipped
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    /// The last `count` transactions, in store order.
    pub fn recent(&self, count: usize) -> &[Transaction] {
        let start = self.transactions.len().saturating_sub(count);
        &self.transactions[start..]
    }
}
