//! Money amounts.
//!
//! Amounts arrive as text from three places: the command line, MCP tool calls and sheet cells.
//! Google Sheets may render a number with a dollar sign and thousands separators, so the parser
//! accepts `500`, `$500.00`, `1,500.5` and `-$1,500.50` alike.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{self, Display, Formatter};
use std::iter::Sum;
use std::ops::{Add, Sub};
use std::str::FromStr;

/// How an `Amount` is rendered by `Display`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AmountFormat {
    /// Dollar sign, thousands separators and two decimals: `$1,500.50`. Used for everything a
    /// person reads.
    #[default]
    Currency,
    /// The bare decimal, e.g. `1500.5`. This is what is written to the sheet.
    Plain,
}

/// A dollar amount. Equality and ordering look at the value first, then the format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount {
    value: Decimal,
    format: AmountFormat,
}

impl Amount {
    pub const fn new(value: Decimal) -> Self {
        Self {
            value,
            format: AmountFormat::Currency,
        }
    }

    pub fn value(&self) -> Decimal {
        self.value
    }

    /// A copy that renders with `format`.
    pub fn with_format(&self, format: AmountFormat) -> Self {
        Self {
            value: self.value,
            format,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.value.is_zero()
    }

    /// Negative zero is not negative.
    pub fn is_negative(&self) -> bool {
        !self.is_zero() && self.value.is_sign_negative()
    }

    /// The amount rounded to whole dollars, e.g. `$29,500` or `-$1,200`, for report headlines.
    pub fn whole_dollars(&self) -> String {
        let sign = if self.is_negative() { "-" } else { "" };
        let rounded = self.rounded_abs(0);
        format!("{sign}${}", group_thousands(&format!("{rounded:.0}")))
    }

    /// Halves round away from zero, so `$0.125` shows as `$0.13`.
    fn rounded_abs(&self, dp: u32) -> Decimal {
        self.value
            .abs()
            .round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
    }
}

/// Inserts a comma between each group of three digits, e.g. `1234567` becomes `1,234,567`.
fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (ix, c) in digits.chars().enumerate() {
        if ix > 0 && (digits.len() - ix) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// The text could not be read as an amount.
#[derive(Debug, Clone, Eq, PartialEq, thiserror::Error)]
#[error("'{input}' is not an amount")]
pub struct AmountError {
    input: String,
}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || AmountError {
            input: s.to_string(),
        };
        let trimmed = s.trim();
        let (negative, unsigned) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };
        let digits: String = unsigned
            .strip_prefix('$')
            .unwrap_or(unsigned)
            .chars()
            .filter(|c| *c != ',')
            .collect();
        // Decimal::from_str would accept a second sign after the dollar sign.
        if digits.is_empty() || digits.starts_with(['-', '+']) {
            return Err(err());
        }
        let value = Decimal::from_str(&digits).map_err(|_| err())?;
        Ok(Amount::new(if negative { -value } else { value }))
    }
}

impl Display for Amount {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.format {
            AmountFormat::Plain => write!(f, "{}", self.value),
            AmountFormat::Currency => {
                let sign = if self.is_negative() { "-" } else { "" };
                let text = format!("{:.2}", self.rounded_abs(2));
                let (dollars, cents) = text.split_once('.').unwrap_or((&text, "00"));
                write!(f, "{sign}${}.{cents}", group_thousands(dollars))
            }
        }
    }
}

/// Arithmetic results are always `Currency` formatted.
impl Add for Amount {
    type Output = Amount;

    fn add(self, rhs: Self) -> Self::Output {
        Amount::new(self.value + rhs.value)
    }
}

impl Sub for Amount {
    type Output = Amount;

    fn sub(self, rhs: Self) -> Self::Output {
        Amount::new(self.value - rhs.value)
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Amount::default(), |acc, a| acc + a)
    }
}

impl<'a> Sum<&'a Amount> for Amount {
    fn sum<I: Iterator<Item = &'a Amount>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

/// In JSON an amount is its exact decimal text, e.g. `"1500.505"`, whatever its format.
impl Serialize for Amount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(&self.value)
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Amount::from_str(&s).map_err(serde::de::Error::custom)
    }
}
