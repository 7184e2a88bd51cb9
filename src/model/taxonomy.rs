//! The two-level category taxonomy shared by every member of the household.

use crate::model::{Household, Kind};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// The main category that child members default to when recording an expense.
pub const CHILDREN: &str = "Children";

/// A main category and its ordered sub-categories.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub struct MainCategory {
    name: String,
    sub_categories: Vec<String>,
}

impl MainCategory {
    pub fn new<S, I>(name: impl Into<String>, sub_categories: I) -> Self
    where
        S: Into<String>,
        I: IntoIterator<Item = S>,
    {
        Self {
            name: name.into(),
            sub_categories: sub_categories.into_iter().map(Into::into).collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sub_categories(&self) -> &[String] {
        &self.sub_categories
    }
}

/// Maps each `Kind` to its ordered main categories, each with an ordered set of sub-categories.
///
/// Built once at startup and only ever read afterwards.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub struct Taxonomy {
    income: Vec<MainCategory>,
    expense: Vec<MainCategory>,
}

impl Taxonomy {
    pub fn new(income: Vec<MainCategory>, expense: Vec<MainCategory>) -> Self {
        Self { income, expense }
    }

    /// The taxonomy the household has always used.
    pub fn household() -> Self {
        Self::new(
            vec![
                MainCategory::new("Salary", ["MonthlySalary"]),
                MainCategory::new("Other", ["Bonus", "InvestmentReturn", "OtherIncome"]),
            ],
            vec![
                MainCategory::new(
                    "Household",
                    [
                        "Mortgage",
                        "ManagementFee",
                        "Water",
                        "Electricity",
                        "Gas",
                        "Phone",
                        "Internet",
                        "Streaming",
                        "Rates",
                        "DomesticHelperSalary",
                        "HouseholdSupplies",
                    ],
                ),
                MainCategory::new(
                    "Personal",
                    ["Meals", "Shopping", "Entertainment", "PersonalOther"],
                ),
                MainCategory::new(
                    CHILDREN,
                    ["Tuition", "ActivityClasses", "Medical", "OtherFees"],
                ),
                MainCategory::new(
                    "Transport",
                    ["Fare", "EVCharging", "Parking", "TransportOther"],
                ),
                MainCategory::new("SavingsInsurance", ["Deposit", "Insurance", "TravelFund"]),
            ],
        )
    }

    /// The main categories available for `kind`, with their sub-categories.
    pub fn mains(&self, kind: Kind) -> &[MainCategory] {
        match kind {
            Kind::Income => &self.income,
            Kind::Expense => &self.expense,
        }
    }

    /// The names of the main categories for `kind`, in order.
    pub fn main_categories(&self, kind: Kind) -> Vec<&str> {
        self.mains(kind).iter().map(MainCategory::name).collect()
    }

    /// The sub-categories of `main` under `kind`. An unknown main category has none.
    pub fn sub_categories(&self, kind: Kind, main: &str) -> &[String] {
        self.mains(kind)
            .iter()
            .find(|m| m.name == main)
            .map(MainCategory::sub_categories)
            .unwrap_or_default()
    }

    /// Whether the (`kind`, `main`, `sub`) triple exists.
    pub fn is_valid(&self, kind: Kind, main: &str, sub: &str) -> bool {
        self.sub_categories(kind, main).iter().any(|s| s == sub)
    }

    /// The index into `main_categories(kind)` that should be pre-selected when `member` starts
    /// recording an entry of `kind`. Children default to the `Children` expense category, everyone
    /// else to the first main category. This is a suggestion only and is never enforced.
    pub fn default_main_category(&self, kind: Kind, member: &str, household: &Household) -> usize {
        if kind != Kind::Expense || !household.is_child(member) {
            return 0;
        }
        self.mains(kind)
            .iter()
            .position(|m| m.name == CHILDREN)
            .unwrap_or(0)
    }
}

impl Default for Taxonomy {
    fn default() -> Self {
        Self::household()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_main_categories_keep_order() {
        let t = Taxonomy::household();
        assert_eq!(t.main_categories(Kind::Income), vec!["Salary", "Other"]);
        assert_eq!(
            t.main_categories(Kind::Expense),
            vec![
                "Household",
                "Personal",
                "Children",
                "Transport",
                "SavingsInsurance"
            ]
        );
    }

    #[test]
    fn test_sub_categories() {
        let t = Taxonomy::household();
        assert_eq!(
            t.sub_categories(Kind::Income, "Other"),
            &["Bonus", "InvestmentReturn", "OtherIncome"]
        );
        assert_eq!(t.sub_categories(Kind::Expense, "Household").len(), 11);
        assert!(t.sub_categories(Kind::Expense, "Salary").is_empty());
        assert!(t.sub_categories(Kind::Income, "Nope").is_empty());
    }

    #[test]
    fn test_is_valid() {
        let t = Taxonomy::household();
        assert!(t.is_valid(Kind::Expense, "Transport", "EVCharging"));
        assert!(t.is_valid(Kind::Income, "Salary", "MonthlySalary"));
        // Right names, wrong kind.
        assert!(!t.is_valid(Kind::Income, "Transport", "EVCharging"));
        // Sub-category from a different main category.
        assert!(!t.is_valid(Kind::Expense, "Household", "Tuition"));
        assert!(!t.is_valid(Kind::Expense, "household", "Water"));
    }

    #[test]
    fn test_default_main_category_for_children() {
        let t = Taxonomy::household();
        let h = Household::default();
        assert_eq!(t.default_main_category(Kind::Expense, "曦晴", &h), 2);
        assert_eq!(t.default_main_category(Kind::Expense, "曦朗", &h), 2);
        assert_eq!(t.main_categories(Kind::Expense)[2], CHILDREN);
    }

    #[test]
    fn test_default_main_category_otherwise_first() {
        let t = Taxonomy::household();
        let h = Household::default();
        assert_eq!(t.default_main_category(Kind::Expense, "Kam", &h), 0);
        assert_eq!(t.default_main_category(Kind::Expense, "Nobody", &h), 0);
        for member in h.members() {
            assert_eq!(t.default_main_category(Kind::Income, member.as_ref(), &h), 0);
        }
    }

    #[test]
    fn test_default_main_category_without_children_category() {
        let t = Taxonomy::new(
            vec![MainCategory::new("Salary", ["MonthlySalary"])],
            vec![MainCategory::new("Household", ["Water"])],
        );
        let h = Household::default();
        assert_eq!(t.default_main_category(Kind::Expense, "曦晴", &h), 0);
    }
}
