use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Whether a transaction brings money into the household or takes it out.
#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
    Hash,
    Serialize,
    Deserialize,
    JsonSchema,
    clap::ValueEnum,
)]
pub enum Kind {
    Income,
    #[default]
    Expense,
}

serde_plain::derive_display_from_serialize!(Kind);
serde_plain::derive_fromstr_from_deserialize!(Kind);

impl Kind {
    pub const ALL: [Kind; 2] = [Kind::Income, Kind::Expense];
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_kind_text_form() {
        assert_eq!(Kind::Income.to_string(), "Income");
        assert_eq!(Kind::from_str("Expense").unwrap(), Kind::Expense);
        assert!(Kind::from_str("expense").is_err());
        assert!(Kind::from_str("Transfer").is_err());
    }
}
