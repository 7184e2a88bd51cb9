//! Monthly totals and expense breakdowns computed from a `TransactionLog`.

use crate::model::{Amount, Kind, Member, Transaction, TransactionLog};
use chrono::Datelike;
use serde::Serialize;
use std::collections::BTreeMap;

/// Expense total for one (main category, sub-category, member) group.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct GroupedEntry {
    pub main_category: String,
    pub sub_category: String,
    pub member: Member,
    pub amount: Amount,
}

/// Expense total for one (main category, sub-category) group, ignoring member.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct HierarchyEntry {
    pub main_category: String,
    pub sub_category: String,
    pub amount: Amount,
}

/// The aggregated view of a single month. This is derived every time it is needed and never
/// stored.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct MonthlyReport {
    month: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    year: Option<i32>,
    total_income: Amount,
    total_expense: Amount,
    balance: Amount,
    transaction_count: usize,
    grouped_breakdown: Vec<GroupedEntry>,
    hierarchical_breakdown: Vec<HierarchyEntry>,
}

impl MonthlyReport {
    /// Aggregates the transactions of `log` that fall in `month` (1-12).
    ///
    /// When `year` is `None` only the calendar month is compared, so the same month of every year
    /// in the log is included. Pass a year to restrict the report to a single year.
    ///
    /// The breakdowns cover expenses only and are sorted by their grouping key.
    pub fn aggregate(log: &TransactionLog, year: Option<i32>, month: u32) -> Self {
        let in_month = |t: &&Transaction| {
            t.date().month() == month && year.is_none_or(|y| t.date().year() == y)
        };
        let selected: Vec<&Transaction> = log.transactions().iter().filter(in_month).collect();

        let total_of = |kind: Kind| -> Amount {
            selected
                .iter()
                .filter(|t| t.kind() == kind)
                .map(|t| t.amount())
                .sum()
        };
        let total_income = total_of(Kind::Income);
        let total_expense = total_of(Kind::Expense);

        let mut grouped: BTreeMap<(&str, &str, &Member), Amount> = BTreeMap::new();
        let mut hierarchy: BTreeMap<(&str, &str), Amount> = BTreeMap::new();
        for t in selected.iter().filter(|t| t.kind() == Kind::Expense) {
            let key = (t.main_category(), t.sub_category());
            let g = grouped.entry((key.0, key.1, t.member())).or_default();
            *g = *g + t.amount();
            let h = hierarchy.entry(key).or_default();
            *h = *h + t.amount();
        }

        Self {
            month,
            year,
            total_income,
            total_expense,
            balance: total_income - total_expense,
            transaction_count: selected.len(),
            grouped_breakdown: grouped
                .into_iter()
                .map(|((main, sub, member), amount)| GroupedEntry {
                    main_category: main.to_string(),
                    sub_category: sub.to_string(),
                    member: member.clone(),
                    amount,
                })
                .collect(),
            hierarchical_breakdown: hierarchy
                .into_iter()
                .map(|((main, sub), amount)| HierarchyEntry {
                    main_category: main.to_string(),
                    sub_category: sub.to_string(),
                    amount,
                })
                .collect(),
        }
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn year(&self) -> Option<i32> {
        self.year
    }

    pub fn total_income(&self) -> Amount {
        self.total_income
    }

    pub fn total_expense(&self) -> Amount {
        self.total_expense
    }

    pub fn balance(&self) -> Amount {
        self.balance
    }

    /// The number of transactions, of either kind, that fell in the month.
    pub fn transaction_count(&self) -> usize {
        self.transaction_count
    }

    pub fn is_empty(&self) -> bool {
        self.transaction_count == 0
    }

    pub fn grouped_breakdown(&self) -> &[GroupedEntry] {
        &self.grouped_breakdown
    }

    pub fn hierarchical_breakdown(&self) -> &[HierarchyEntry] {
        &self.hierarchical_breakdown
    }

    /// Expense totals per main category, the inner ring of the hierarchy.
    pub fn main_category_totals(&self) -> Vec<(&str, Amount)> {
        let mut totals: BTreeMap<&str, Amount> = BTreeMap::new();
        for entry in &self.hierarchical_breakdown {
            let total = totals.entry(entry.main_category.as_str()).or_default();
            *total = *total + entry.amount;
        }
        totals.into_iter().collect()
    }
}
