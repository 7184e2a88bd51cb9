//! Authentication command handlers for the OAuth flow.
//!
//! - `ledger auth` - Initial OAuth consent flow
//! - `ledger auth --verify` - Verify and refresh authentication

use crate::api::TokenProvider;
use crate::commands::{load_log, Out};
use crate::error::{ErrorType, IntoResult};
use crate::{Config, Mode, Result};
use anyhow::Context;

/// Handles the `ledger auth` command by running the OAuth consent flow.
///
/// This is the ONLY command that asks the user to visit Google in a browser. Tokens are saved to
/// the configured `token.json`.
pub async fn auth(config: &Config) -> Result<Out<()>> {
    let _ = TokenProvider::initialize(config.client_secret_path(), config.token_path())
        .await
        .pub_result(ErrorType::Auth)?;
    Ok(format!(
        "Authorization complete, tokens saved to {}",
        config.token_path().display()
    )
    .into())
}

/// Handles the `ledger auth --verify` command.
///
/// This command NEVER opens a browser. It refreshes the existing token and then reads the sheet to
/// prove that the token grants access to it. If the token is missing or invalid, it fails with a
/// message telling the user to run `ledger auth`.
pub async fn auth_verify(config: &Config) -> Result<Out<()>> {
    let mut token_provider = TokenProvider::load(config.client_secret_path(), config.token_path())
        .await
        .context(
            "Unable to use the existing tokens found in the token JSON file. \n\n\
            You should run 'ledger auth' (without the --verify flag).",
        )
        .pub_result(ErrorType::Auth)?;
    token_provider
        .refresh()
        .await
        .context("Unable to refresh the token")
        .pub_result(ErrorType::Auth)?;

    let log = load_log(config, Mode::Google)
        .await
        .context("The token is valid but the sheet could not be read")
        .pub_result(ErrorType::Store)?;
    Ok(format!(
        "Your OAuth token is valid! The sheet has {} transaction(s).",
        log.len()
    )
    .into())
}
