//! Types that represent the core data model: the category taxonomy, the household, transactions,
//! the rows they are stored as, and the monthly report computed from them.
mod amount;
mod household;
mod kind;
mod log;
mod report;
mod row;
mod taxonomy;
mod transaction;

pub use amount::{Amount, AmountError, AmountFormat};
pub use household::{Household, Member};
pub use kind::Kind;
pub use log::{SkippedRow, TransactionLog};
pub use report::{GroupedEntry, HierarchyEntry, MonthlyReport};
pub use row::{Column, Row};
pub use taxonomy::{MainCategory, Taxonomy, CHILDREN};
pub use transaction::{Entry, Transaction, ValidationError};
