use crate::api::Mode;
use crate::args::RecentArgs;
use crate::commands::{load_log, Out};
use crate::error::{ErrorType, IntoResult};
use crate::model::Transaction;
use crate::{Config, Result};

/// Lists the last `count` transactions in the order they were recorded.
pub async fn recent(config: Config, mode: Mode, args: RecentArgs) -> Result<Out<Vec<Transaction>>> {
    let log = load_log(&config, mode).await.pub_result(ErrorType::Store)?;
    let transactions = log.recent(args.count()).to_vec();
    if transactions.is_empty() {
        return Ok(Out::new("No transactions recorded yet.", transactions));
    }
    let message = transactions
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n");
    Ok(Out::new(message, transactions))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::TestSheetState;
    use crate::test::TestEnv;

    #[tokio::test]
    async fn test_recent_last_rows() {
        let env = TestEnv::new().await;
        let out = recent(env.config(), Mode::Testing, RecentArgs::new(2))
            .await
            .unwrap();
        let lines: Vec<&str> = out.message().lines().collect();
        assert_eq!(
            lines,
            vec![
                "2024-03-15 Kam Expense Transport/EVCharging $180.00",
                "2024-03-22 曦朗 Expense Children/ActivityClasses $850.00 (Swimming)",
            ]
        );
        assert_eq!(out.structure().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_recent_more_than_available() {
        let env = TestEnv::new().await;
        let out = recent(env.config(), Mode::Testing, RecentArgs::new(100))
            .await
            .unwrap();
        // The row with an unknown member is not a transaction.
        assert_eq!(out.structure().unwrap().len(), 7);
    }

    #[tokio::test]
    async fn test_recent_empty() {
        let env = TestEnv::new().await;
        env.set_state(TestSheetState::default());
        let out = recent(env.config(), Mode::Testing, RecentArgs::new(5))
            .await
            .unwrap();
        assert_eq!(out.message(), "No transactions recorded yet.");
        assert!(out.structure().unwrap().is_empty());
    }
}
