//! Authentication command handlers for OAuth flow.
//!
//! This module implements the CLI commands for:
//! - `byeboros auth` - Initial OAuth consent flow
//! - `byeboros auth --verify` - Verify and refresh authentication

use crate::api::TokenProvider;
use crate::commands::Out;
use crate::error::{ErrorType, IntoResult};
use crate::{Config, Result};
use anyhow::Context;

/// Handles the `byeboros auth` command - runs the OAuth consent flow
///
/// This is the ONLY command that asks the user to authorize in a browser.
///
/// This guides the user through setting up Google Sheets authentication:
/// 1. Loads client_secret.json from the secrets directory
/// 2. Prints the consent URL and waits for Google to redirect back to localhost
/// 3. Saves tokens to token.json with the spreadsheets scope
///
/// # Errors
/// Returns an `Auth` error if the OAuth flow fails or if client_secret.json is missing
pub async fn auth(config: &Config) -> Result<Out<()>> {
    let _ = TokenProvider::initialize(config.client_secret_path(), config.token_path())
        .await
        .pub_result(ErrorType::Auth)?;
    Ok("Authorization complete".into())
}

/// Handles the `byeboros auth --verify` command - verifies authentication
///
/// This command NEVER opens a browser or triggers an interactive OAuth flow.
/// It loads the cached tokens, checks their scopes and refreshes the access token.
///
/// If the token is missing, invalid, or has the wrong scopes, this command will
/// fail with an error message telling the user to run `byeboros auth`.
pub async fn auth_verify(config: &Config) -> Result<Out<()>> {
    let mut token_provider = TokenProvider::load(config.client_secret_path(), config.token_path())
        .await
        .context(
            "Unable to use the existing tokens found in the token JSON file. \n\n\
            You should run 'byeboros auth' (without the --verify flag).",
        )
        .pub_result(ErrorType::Auth)?;
    token_provider
        .refresh()
        .await
        .context("Unable to refresh the token")
        .pub_result(ErrorType::Auth)?;
    Ok("Your OAuth token is valid!".into())
}
