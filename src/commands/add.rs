use crate::api::{self, Mode};
use crate::args::AddArgs;
use crate::commands::Out;
use crate::error::{ErrorType, IntoResult};
use crate::model::{AmountFormat, Entry, Row, Transaction};
use crate::{Config, Result};
use chrono::Local;
use tracing::debug;

/// Validates a new transaction and appends it to the sheet.
///
/// When `args` has no main category, the one that the household's default rule suggests for the
/// member is used. Nothing is written if the transaction is invalid.
pub async fn add(config: Config, mode: Mode, args: AddArgs) -> Result<Out<Transaction>> {
    let taxonomy = config.taxonomy();
    let main = match args.main() {
        Some(main) => main.to_string(),
        None => {
            let ix = taxonomy.default_main_category(args.kind(), args.member(), config.household());
            let main = taxonomy
                .main_categories(args.kind())
                .get(ix)
                .map(|m| m.to_string())
                .unwrap_or_default();
            debug!("No main category given, using {main}");
            main
        }
    };

    let entry = Entry {
        date: args.date().unwrap_or_else(|| Local::now().date_naive()),
        member: args.member().to_string(),
        kind: args.kind().to_string(),
        main_category: main,
        sub_category: args.sub().to_string(),
        amount: Ok(args.amount().value()),
        note: args.note().map(str::to_string),
    };
    let transaction =
        Transaction::new(entry, taxonomy, config.household()).pub_result(ErrorType::Validation)?;

    let mut store = api::store(&config, mode)
        .await
        .pub_result(ErrorType::Store)?;
    store
        .append_row(&Row::from(&transaction))
        .await
        .pub_result(ErrorType::Store)?;

    Ok(Out::new(
        format!(
            "Saved! {} {} ${}",
            transaction.member(),
            transaction.sub_category(),
            transaction.amount().with_format(AmountFormat::Plain)
        ),
        transaction,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::TestSheetState;
    use crate::model::{Amount, Column, Kind, ValidationError};
    use crate::test::TestEnv;
    use chrono::NaiveDate;
    use std::str::FromStr;

    fn args(kind: Kind, member: &str, main: Option<&str>, sub: &str, amount: &str) -> AddArgs {
        AddArgs::new(
            kind,
            member,
            main.map(str::to_string),
            sub,
            Amount::from_str(amount).unwrap(),
            NaiveDate::from_ymd_opt(2024, 4, 2),
            None,
        )
    }

    #[tokio::test]
    async fn test_add_appends_row() {
        let env = TestEnv::new().await;
        let before = env.get_state().rows.len();
        let out = add(
            env.config(),
            Mode::Testing,
            args(Kind::Expense, "Kam", Some("Household"), "Water", "88.5"),
        )
        .await
        .unwrap();
        assert_eq!(out.message(), "Saved! Kam Water $88.5");

        let rows = env.get_state().rows;
        assert_eq!(rows.len(), before + 1);
        assert_eq!(
            rows.last().unwrap(),
            &vec![
                "2024-04-02",
                "Kam",
                "Expense",
                "Household",
                "Water",
                "88.5",
                ""
            ]
        );
    }

    #[tokio::test]
    async fn test_add_to_empty_sheet_writes_header() {
        let env = TestEnv::new().await;
        env.set_state(TestSheetState::default());
        add(
            env.config(),
            Mode::Testing,
            args(Kind::Income, "Connie", Some("Salary"), "MonthlySalary", "30000"),
        )
        .await
        .unwrap();
        let rows = env.get_state().rows;
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], Column::header_row());
    }

    #[tokio::test]
    async fn test_add_defaults_child_to_children() {
        let env = TestEnv::new().await;
        let out = add(
            env.config(),
            Mode::Testing,
            args(Kind::Expense, "曦晴", None, "Tuition", "4200"),
        )
        .await
        .unwrap();
        assert_eq!(out.structure().unwrap().main_category(), "Children");
    }

    #[tokio::test]
    async fn test_add_invalid_is_not_saved() {
        let env = TestEnv::new().await;
        let before = env.get_state();
        // Kam defaults to Household, which has no Tuition.
        let err = add(
            env.config(),
            Mode::Testing,
            args(Kind::Expense, "Kam", None, "Tuition", "10"),
        )
        .await
        .unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Validation);

        let err = add(
            env.config(),
            Mode::Testing,
            args(Kind::Expense, "Kam", Some("Household"), "Water", "-0.01"),
        )
        .await
        .unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Validation);
        let source = std::error::Error::source(&err).unwrap();
        assert_eq!(
            source.downcast_ref::<ValidationError>(),
            Some(&ValidationError::InvalidAmount("-0.01".to_string()))
        );

        assert_eq!(env.get_state(), before);
    }
}
