use anyhow::ensure;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

use crate::error::Res;

const DEFAULT_MEMBERS: [&str; 4] = ["Connie", "Kam", "曦晴", "曦朗"];
const DEFAULT_CHILDREN: [&str; 2] = ["曦晴", "曦朗"];

/// The name of a household member to whom a transaction is attributed.
#[derive(
    Default, Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(transparent)]
pub struct Member(String);

impl Member {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

impl AsRef<str> for Member {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for Member {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

/// The fixed set of members in the household along with which of them are children.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct Household {
    members: Vec<Member>,
    children: Vec<Member>,
}

impl Household {
    /// Creates a household. Every child must also be a member and there must be at least one
    /// member.
    pub fn new<S, I1, I2>(members: I1, children: I2) -> Res<Self>
    where
        S: Into<String>,
        I1: IntoIterator<Item = S>,
        I2: IntoIterator<Item = S>,
    {
        let members: Vec<Member> = members.into_iter().map(Member::new).collect();
        let children: Vec<Member> = children.into_iter().map(Member::new).collect();
        ensure!(!members.is_empty(), "A household needs at least one member");
        for child in &children {
            ensure!(
                members.contains(child),
                "Child '{child}' is not listed as a member of the household"
            );
        }
        Ok(Self { members, children })
    }

    pub fn members(&self) -> &[Member] {
        &self.members
    }

    pub fn children(&self) -> &[Member] {
        &self.children
    }

    /// Returns the `Member` named `name`, if there is one. Surrounding whitespace is ignored.
    pub fn member(&self, name: &str) -> Option<&Member> {
        let name = name.trim();
        self.members.iter().find(|m| m.as_ref() == name)
    }

    pub fn is_child(&self, name: &str) -> bool {
        let name = name.trim();
        self.children.iter().any(|m| m.as_ref() == name)
    }
}

impl Default for Household {
    fn default() -> Self {
        Self {
            members: DEFAULT_MEMBERS.into_iter().map(Member::new).collect(),
            children: DEFAULT_CHILDREN.into_iter().map(Member::new).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_household() {
        let h = Household::default();
        assert_eq!(h.members().len(), 4);
        assert!(h.member("Kam").is_some());
        assert!(h.member(" Connie ").is_some());
        assert!(h.member("Unknown").is_none());
        assert!(h.is_child("曦朗"));
        assert!(!h.is_child("Connie"));
    }

    #[test]
    fn test_child_must_be_member() {
        assert!(Household::new(["A", "B"], ["B"]).is_ok());
        assert!(Household::new(["A", "B"], ["C"]).is_err());
        assert!(Household::new(Vec::<String>::new(), Vec::<String>::new()).is_err());
    }
}
