use crate::commands::Out;
use crate::{Config, Result};
use std::path::Path;

/// Creates the data directory, its subdirectories and:
/// - Creates an initial `config.json` file using `sheet_url` along with default settings
/// - Moves `secret_file` into its default location in the data dir.
///
/// # Arguments
/// - `byeboros_home` - The directory that will be the root of data directory, e.g.
///   `$HOME/byeboros`
/// - `secret_file` - The downloaded OAuth 2.0 client credentials JSON needed to start the Google
///   OAuth workflow.
/// - `sheet_url` - The URL of the Google Sheet that holds the month sheets.
///
/// # Errors
/// - Returns a `Config` error if the URL has no spreadsheet id or any file operation fails.
pub async fn init(byeboros_home: &Path, secret_file: &Path, sheet_url: &str) -> Result<Out<()>> {
    let config = Config::create(byeboros_home, secret_file, sheet_url).await?;
    Ok(format!(
        "Created {} for spreadsheet {}. Run 'byeboros auth' next.",
        config.root().display(),
        config.spreadsheet_id()
    )
    .into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorType;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_init_rejects_url_without_id() {
        let dir = TempDir::new().unwrap();
        let secret = dir.path().join("client_secret.json");
        std::fs::write(&secret, "{}").unwrap();
        let err = init(&dir.path().join("home"), &secret, "https://example.com/")
            .await
            .unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Config);
        assert!(!dir.path().join("home").exists());
    }
}
