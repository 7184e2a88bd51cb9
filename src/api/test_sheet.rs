//! Implements the `Sheet` trait using in-memory data for testing purposes.
//!
//! Note: this is compiled even in the "production" version of this app so that we can run the whole
//! app, top-to-bottom, without using Google Sheets (see `Mode::Testing`).

use crate::api::Sheet;
use crate::error::Res;
use anyhow::Context;
use std::collections::HashMap;
use std::io::Cursor;
use std::sync::{LazyLock, Mutex, MutexGuard, PoisonError};
use tracing::trace;

/// Sheet contents keyed by spreadsheet id. The state outlives any one `TestSheet` so that an
/// append in one command is visible to the next, the same way it would be with a real sheet.
static STATE: LazyLock<Mutex<HashMap<String, TestSheetState>>> =
    LazyLock::new(|| Mutex::new(HashMap::new()));

/// The rows of an in-memory sheet, header row included.
#[derive(Debug, Default, Clone, Eq, PartialEq)]
pub(crate) struct TestSheetState {
    pub(crate) rows: Vec<Vec<String>>,
}

impl TestSheetState {
    /// Seeded with a small household's sample data.
    pub(crate) fn seeded() -> Res<Self> {
        Ok(Self {
            rows: load_csv(SEED_DATA)?,
        })
    }
}

/// An implementation of the `Sheet` trait that does not use Google sheets. Each spreadsheet id
/// gets its own in-memory sheet, seeded with sample data on first use.
pub(crate) struct TestSheet {
    spreadsheet_id: String,
}

impl TestSheet {
    pub(crate) fn new(spreadsheet_id: impl Into<String>) -> Self {
        Self {
            spreadsheet_id: spreadsheet_id.into(),
        }
    }

    #[cfg(test)]
    pub(crate) fn get_state(&self) -> Res<TestSheetState> {
        let mut state = lock();
        Ok(self.state_mut(&mut state)?.clone())
    }

    #[cfg(test)]
    pub(crate) fn set_state(&self, new_state: TestSheetState) {
        let _ = lock().insert(self.spreadsheet_id.clone(), new_state);
    }

    fn state_mut<'a>(
        &self,
        state: &'a mut HashMap<String, TestSheetState>,
    ) -> Res<&'a mut TestSheetState> {
        if !state.contains_key(&self.spreadsheet_id) {
            let _ = state.insert(self.spreadsheet_id.clone(), TestSheetState::seeded()?);
        }
        state
            .get_mut(&self.spreadsheet_id)
            .context("The test sheet state is missing")
    }
}

#[async_trait::async_trait]
impl Sheet for TestSheet {
    async fn get(&mut self, range: &str) -> Res<Vec<Vec<String>>> {
        trace!("test sheet get {range}");
        let mut state = lock();
        Ok(self.state_mut(&mut state)?.rows.clone())
    }

    async fn append(&mut self, range: &str, values: &[Vec<String>]) -> Res<()> {
        trace!("test sheet append {} row(s) to {range}", values.len());
        let mut state = lock();
        self.state_mut(&mut state)?
            .rows
            .extend(values.iter().cloned());
        Ok(())
    }
}

/// The data is plain `Vec`s, so a panic while the lock was held cannot have left it half-written.
fn lock() -> MutexGuard<'static, HashMap<String, TestSheetState>> {
    STATE.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Loads data from a CSV-formatted string.
fn load_csv(csv_data: &str) -> Res<Vec<Vec<String>>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(Cursor::new(csv_data.as_bytes()));

    let mut rows: Vec<Vec<String>> = Vec::new();
    for result in rdr.records() {
        let record = result.context("Invalid CSV in test sheet data")?;
        rows.push(record.iter().map(|field| field.to_string()).collect());
    }
    Ok(rows)
}

/// Seed data: one month of a household's activity plus a row from the month before and a row
/// with a member that is not in the household.
const SEED_DATA: &str = r##"Date,Member,Kind,MainCategory,SubCategory,Amount,Note
2024-02-28,Kam,Expense,Household,Mortgage,18000,
2024-03-01,Connie,Income,Salary,MonthlySalary,30000,March pay
2024-03-05,Kam,Expense,Household,Electricity,500,
2024-03-08,曦晴,Expense,Children,Tuition,4200,Term 2
2024-03-12,Connie,Expense,Personal,Meals,320.50,
2024-03-15,Kam,Expense,Transport,EVCharging,180,
2024-03-20,Unknown,Expense,Household,Water,99,
2024-03-22,曦朗,Expense,Children,ActivityClasses,850,Swimming
"##;

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn unique_id() -> String {
        Uuid::new_v4().to_string()
    }

    #[tokio::test]
    async fn test_seeded_on_first_use() {
        let mut sheet = TestSheet::new(unique_id());
        let rows = sheet.get("A:G").await.unwrap();
        assert_eq!(rows.len(), 9);
        assert_eq!(rows[0][0], "Date");
        assert_eq!(rows[4][1], "曦晴");
    }

    #[tokio::test]
    async fn test_append_is_shared_by_id() {
        let id = unique_id();
        let mut a = TestSheet::new(&id);
        a.set_state(TestSheetState::default());
        a.append("A:G", &[vec!["x".to_string()]]).await.unwrap();

        let mut b = TestSheet::new(&id);
        assert_eq!(b.get("A:G").await.unwrap(), vec![vec!["x".to_string()]]);

        let other = TestSheet::new(unique_id());
        assert_eq!(other.get_state().unwrap().rows.len(), 9);
    }
}
