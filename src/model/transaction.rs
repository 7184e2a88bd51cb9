use crate::model::{Amount, Household, Kind, Member, Taxonomy};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use thiserror::Error;

/// The reasons a candidate entry, or a row read back from the sheet, is rejected.
#[derive(Debug, Clone, Eq, PartialEq, Error, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationError {
    #[error("'{0}' is not a member of the household")]
    InvalidMember(String),
    #[error("'{0}' is not a transaction kind, expected Income or Expense")]
    InvalidKind(String),
    #[error("'{main} / {sub}' is not a valid {kind} category")]
    InvalidCategory {
        kind: Kind,
        main: String,
        sub: String,
    },
    #[error("'{0}' is not a valid amount, it must be a number that is zero or more")]
    InvalidAmount(String),
    #[error("'{0}' is not a valid date")]
    InvalidDate(String),
}

/// A candidate transaction as it arrives from a user or from a sheet row, before validation.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Entry {
    pub date: NaiveDate,
    pub member: String,
    pub kind: String,
    pub main_category: String,
    pub sub_category: String,
    /// The amount, or the text that could not be read as one.
    pub amount: Result<Decimal, String>,
    pub note: Option<String>,
}

/// A single validated income or expense event. There is no way to change one once it exists.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct Transaction {
    date: NaiveDate,
    member: Member,
    kind: Kind,
    main_category: String,
    sub_category: String,
    amount: Amount,
    #[serde(skip_serializing_if = "Option::is_none")]
    note: Option<String>,
}

impl Transaction {
    /// Validates `entry` against the `taxonomy` and `household`. The checks run in this order and
    /// the first failure is returned: member, kind, category, amount.
    pub fn new(
        entry: Entry,
        taxonomy: &Taxonomy,
        household: &Household,
    ) -> Result<Self, ValidationError> {
        let member = household
            .member(&entry.member)
            .cloned()
            .ok_or_else(|| ValidationError::InvalidMember(entry.member.clone()))?;

        let kind = Kind::from_str(entry.kind.trim())
            .map_err(|_| ValidationError::InvalidKind(entry.kind.clone()))?;

        let main_category = entry.main_category.trim().to_string();
        let sub_category = entry.sub_category.trim().to_string();
        if !taxonomy.is_valid(kind, &main_category, &sub_category) {
            return Err(ValidationError::InvalidCategory {
                kind,
                main: main_category,
                sub: sub_category,
            });
        }

        let amount = entry.amount.map_err(ValidationError::InvalidAmount)?;
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(ValidationError::InvalidAmount(amount.to_string()));
        }

        let note = entry
            .note
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());

        Ok(Self {
            date: entry.date,
            member,
            kind,
            main_category,
            sub_category,
            amount: Amount::new(amount),
            note,
        })
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn member(&self) -> &Member {
        &self.member
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    pub fn main_category(&self) -> &str {
        &self.main_category
    }

    pub fn sub_category(&self) -> &str {
        &self.sub_category
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }

    pub fn note(&self) -> Option<&str> {
        self.note.as_deref()
    }
}

impl Display for Transaction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} {} {}/{} {}",
            self.date.format("%Y-%m-%d"),
            self.member,
            self.kind,
            self.main_category,
            self.sub_category,
            self.amount
        )?;
        if let Some(note) = &self.note {
            write!(f, " ({note})")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(member: &str, kind: &str, main: &str, sub: &str, amount: &str) -> Entry {
        Entry {
            date: NaiveDate::from_ymd_opt(2024, 3, 5).unwrap(),
            member: member.to_string(),
            kind: kind.to_string(),
            main_category: main.to_string(),
            sub_category: sub.to_string(),
            amount: Decimal::from_str(amount).map_err(|_| amount.to_string()),
            note: None,
        }
    }

    fn make(e: Entry) -> Result<Transaction, ValidationError> {
        Transaction::new(e, &Taxonomy::household(), &Household::default())
    }

    #[test]
    fn test_every_taxonomy_triple_is_accepted() {
        let taxonomy = Taxonomy::household();
        for kind in Kind::ALL {
            for main in taxonomy.mains(kind) {
                for sub in main.sub_categories() {
                    let e = entry("Kam", &kind.to_string(), main.name(), sub, "1");
                    let t = make(e).unwrap();
                    assert_eq!(t.kind(), kind);
                    assert_eq!(t.sub_category(), sub);
                }
            }
        }
    }

    #[test]
    fn test_triples_outside_the_taxonomy_are_rejected() {
        let cases = [
            ("Income", "Household", "Water"),
            ("Expense", "Salary", "MonthlySalary"),
            ("Expense", "Household", "Tuition"),
            ("Expense", "Household", ""),
            ("Expense", "", "Water"),
        ];
        for (kind, main, sub) in cases {
            let err = make(entry("Kam", kind, main, sub, "1")).unwrap_err();
            assert!(
                matches!(err, ValidationError::InvalidCategory { .. }),
                "{kind} {main} {sub} gave {err:?}"
            );
        }
    }

    #[test]
    fn test_negative_amount_is_rejected() {
        let err = make(entry("Kam", "Expense", "Household", "Water", "-0.01")).unwrap_err();
        assert_eq!(err, ValidationError::InvalidAmount("-0.01".to_string()));
    }

    #[test]
    fn test_zero_amount_is_accepted() {
        let t = make(entry("Kam", "Expense", "Household", "Water", "0")).unwrap();
        assert!(t.amount().is_zero());
    }

    #[test]
    fn test_fractional_cents_are_kept() {
        let t = make(entry("Kam", "Expense", "Household", "Water", "12.345")).unwrap();
        assert_eq!(t.amount().value(), Decimal::from_str("12.345").unwrap());
    }

    #[test]
    fn test_unknown_member_is_checked_first() {
        let err = make(entry("Unknown", "Refund", "Nope", "Nope", "-1")).unwrap_err();
        assert_eq!(err, ValidationError::InvalidMember("Unknown".to_string()));
    }

    #[test]
    fn test_kind_is_checked_before_category() {
        let err = make(entry("Kam", "Refund", "Nope", "Nope", "-1")).unwrap_err();
        assert_eq!(err, ValidationError::InvalidKind("Refund".to_string()));
    }

    #[test]
    fn test_category_is_checked_before_amount() {
        let err = make(entry("Kam", "Income", "Nope", "Nope", "-1")).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidCategory { .. }));
    }

    #[test]
    fn test_unreadable_amount_is_checked_last() {
        let err = make(entry("Unknown", "Expense", "Household", "Water", "")).unwrap_err();
        assert_eq!(err, ValidationError::InvalidMember("Unknown".to_string()));
        let err = make(entry("Kam", "Expense", "Household", "Nope", "lots")).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidCategory { .. }));
        let err = make(entry("Kam", "Expense", "Household", "Water", "lots")).unwrap_err();
        assert_eq!(err, ValidationError::InvalidAmount("lots".to_string()));
    }

    #[test]
    fn test_blank_note_becomes_none() {
        let mut e = entry("Connie", "Income", "Salary", "MonthlySalary", "30000");
        e.note = Some("   ".to_string());
        assert_eq!(make(e).unwrap().note(), None);

        let mut e = entry("Connie", "Income", "Salary", "MonthlySalary", "30000");
        e.note = Some("March pay".to_string());
        let t = make(e).unwrap();
        assert_eq!(t.note(), Some("March pay"));
        assert_eq!(
            t.to_string(),
            "2024-03-05 Connie Income Salary/MonthlySalary $30,000.00 (March pay)"
        );
    }
}
