use crate::args::CategoriesArgs;
use crate::commands::Out;
use crate::error::{ErrorType, IntoResult};
use crate::model::{Kind, MainCategory, ValidationError};
use crate::{Config, Result};
use serde::Serialize;
use std::fmt::Write;

/// The categories for one `Kind`.
#[derive(Debug, Clone, Serialize)]
pub struct KindCategories {
    pub kind: Kind,
    pub main_categories: Vec<MainCategory>,
    /// Index into `main_categories` that is pre-selected for the member, when one was given.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_main_category: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryListing {
    pub kinds: Vec<KindCategories>,
}

/// Lists the taxonomy, optionally narrowed to one kind. When a member is given, the main
/// category that would be pre-selected for them is marked.
pub fn categories(config: Config, args: CategoriesArgs) -> Result<Out<CategoryListing>> {
    if let Some(member) = args.member() {
        if config.household().member(member).is_none() {
            return Err(ValidationError::InvalidMember(member.to_string()))
                .pub_result(ErrorType::Validation);
        }
    }

    let taxonomy = config.taxonomy();
    let kinds: Vec<Kind> = match args.kind() {
        Some(kind) => vec![kind],
        None => Kind::ALL.to_vec(),
    };
    let listing = CategoryListing {
        kinds: kinds
            .into_iter()
            .map(|kind| KindCategories {
                kind,
                main_categories: taxonomy.mains(kind).to_vec(),
                default_main_category: args
                    .member()
                    .map(|m| taxonomy.default_main_category(kind, m, config.household())),
            })
            .collect(),
    };

    let mut message = String::new();
    for kc in &listing.kinds {
        let _ = writeln!(message, "{}", kc.kind);
        for (ix, main) in kc.main_categories.iter().enumerate() {
            let marker = if kc.default_main_category == Some(ix) {
                " (default)"
            } else {
                ""
            };
            let _ = writeln!(
                message,
                "  {}{marker}: {}",
                main.name(),
                main.sub_categories().join(", ")
            );
        }
    }
    Ok(Out::new(message.trim_end(), listing))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::TestEnv;

    #[tokio::test]
    async fn test_categories_all() {
        let env = TestEnv::new().await;
        let out = categories(env.config(), CategoriesArgs::new(None, None)).unwrap();
        let listing = out.structure().unwrap();
        assert_eq!(listing.kinds.len(), 2);
        assert_eq!(listing.kinds[0].kind, Kind::Income);
        assert_eq!(listing.kinds[1].main_categories.len(), 5);
        assert!(listing.kinds[1].default_main_category.is_none());
        assert!(out.message().contains("  Salary: MonthlySalary"));
        assert!(!out.message().contains("(default)"));
    }

    #[tokio::test]
    async fn test_categories_child_default() {
        let env = TestEnv::new().await;
        let out = categories(
            env.config(),
            CategoriesArgs::new(Some(Kind::Expense), Some("曦晴".to_string())),
        )
        .unwrap();
        let listing = out.structure().unwrap();
        assert_eq!(listing.kinds.len(), 1);
        let expense = &listing.kinds[0];
        let ix = expense.default_main_category.unwrap();
        assert_eq!(expense.main_categories[ix].name(), "Children");
        assert!(out
            .message()
            .contains("Children (default): Tuition, ActivityClasses, Medical, OtherFees"));
    }

    #[tokio::test]
    async fn test_categories_unknown_member() {
        let env = TestEnv::new().await;
        let err = categories(
            env.config(),
            CategoriesArgs::new(None, Some("Nobody".to_string())),
        )
        .unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Validation);
    }
}
