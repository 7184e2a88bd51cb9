use crate::commands::Out;
use crate::error::{ErrorType, IntoResult};
use crate::{Config, Result};
use anyhow::Context;
use std::path::Path;

/// Creates the data directory and its `.secrets` subdirectory, copies `secret_file` into
/// `.secrets/client_secret.json` and writes an initial `config.json` pointing at `url`.
///
/// # Arguments
/// - `ledger_home` - The directory that will be the root of data directory, e.g. `$HOME/ledger`
/// - `secret_file` - The downloaded OAuth 2.0 client credentials JSON needed to start the Google
///   OAuth workflow.
/// - `url` - The URL of the Google Sheet where the transactions are stored.
///
/// # Errors
/// - Returns an error if the URL is not a Google Sheets URL or if any file operations fail.
pub async fn init(ledger_home: &Path, secret_file: &Path, url: &str) -> Result<Out<()>> {
    let config = Config::create(ledger_home, secret_file, url)
        .await
        .context("Unable to create the data directory and configs")
        .pub_result(ErrorType::Config)?;
    Ok(format!(
        "Successfully created the ledger directory at {}. Run 'ledger auth' next.",
        config.root().display()
    )
    .into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_init() {
        let dir = TempDir::new().unwrap();
        let secret = dir.path().join("client_secret.json");
        utils::write(&secret, "{}").await.unwrap();
        let home = dir.path().join("ledger");

        let out = init(
            &home,
            &secret,
            "https://docs.google.com/spreadsheets/d/abc/edit",
        )
        .await
        .unwrap();
        assert!(out.message().contains("ledger auth"));
        assert!(Config::load(&home).await.is_ok());
    }

    #[tokio::test]
    async fn test_init_missing_secret() {
        let dir = TempDir::new().unwrap();
        let err = init(
            &dir.path().join("ledger"),
            &dir.path().join("nope.json"),
            "https://docs.google.com/spreadsheets/d/abc/edit",
        )
        .await
        .unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Config);
    }
}
