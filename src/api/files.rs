//! Serialization and deserialization structures for Google OAuth credential files.
//! - `client_secret.json`: OAuth 2.0 client credentials from Google Cloud Console
//! - `token.json`: the access and refresh tokens we receive from Google

use crate::api::OAUTH_SCOPES;
use crate::error::Res;
use crate::utils;
use anyhow::{bail, Context};
use chrono::{DateTime, Utc};
use serde::de::{DeserializeOwned, Error};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashSet;
use std::fmt::Debug;
use std::path::{Path, PathBuf};

/// This redirect needs to be present in the OAuth credential file, or else OAuth will not work.
const REDIRECT: &str = "http://localhost";

/// Tokens are treated as expired this long before they actually expire.
const EXPIRY_BUFFER_MINUTES: i64 = 5;

/// A JSON file held in memory between loading and saving.
#[derive(Default, Debug, Clone)]
pub(super) struct File<F>
where
    F: Serialize + DeserializeOwned + Clone + Debug,
{
    path: PathBuf,
    data: F,
}

impl<F> File<F>
where
    F: Serialize + DeserializeOwned + Clone + Debug,
{
    pub(super) async fn load(path: impl Into<PathBuf>) -> Res<Self> {
        let path = path.into();
        let data: F = utils::deserialize(&path).await?;
        Ok(Self { path, data })
    }

    pub(super) fn new(path: impl Into<PathBuf>, data: F) -> Self {
        Self {
            path: path.into(),
            data,
        }
    }

    /// Writes the data as pretty JSON, readable only by the owner.
    pub(super) async fn save(&self) -> Res<()> {
        let json =
            serde_json::to_string_pretty(&self.data).context("Failed to serialize data to JSON")?;
        utils::write(&self.path, json).await?;
        utils::restrict_permissions(&self.path)
    }

    pub(super) fn data(&self) -> &F {
        &self.data
    }

    pub(super) fn data_mut(&mut self) -> &mut F {
        &mut self.data
    }

    pub(super) fn path(&self) -> &Path {
        &self.path
    }
}

/// Represents the structure of the `client_secret.json` file downloaded from Google Cloud Console.
///
/// This file contains OAuth 2.0 Desktop Application credentials. The standard format from Google
/// has an "installed" wrapper around the actual credentials.
///
/// Example:
/// ```json
/// {
///   "installed": {
///     "client_id": "YOUR_CLIENT_ID.apps.googleusercontent.com",
///     "client_secret": "YOUR_CLIENT_SECRET",
///     "redirect_uris": ["http://localhost"],
///     "auth_uri": "https://accounts.google.com/o/oauth2/auth",
///     "token_uri": "https://oauth2.googleapis.com/token"
///   }
/// }
/// ```
#[derive(Default, Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) struct ClientSecretFile {
    installed: InstalledCredentials,
}

impl ClientSecretFile {
    pub(crate) async fn load(path: &Path) -> Res<ClientSecretFile> {
        utils::deserialize(path)
            .await
            .context("Unable to read the OAuth client secret file")
    }

    pub(super) fn client_id(&self) -> &str {
        &self.installed.client_id
    }

    pub(super) fn client_secret(&self) -> &str {
        &self.installed.client_secret
    }

    pub(super) fn auth_uri(&self) -> &str {
        &self.installed.auth_uri
    }

    pub(super) fn token_uri(&self) -> &str {
        &self.installed.token_uri
    }
}

/// The OAuth credentials nested within the `client_secret.json` file.
#[derive(Default, Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
struct InstalledCredentials {
    client_id: String,
    client_secret: String,
    /// Must contain `http://localhost` (without a port number).
    redirect_uris: RedirectUris,
    auth_uri: String,
    token_uri: String,
}

#[derive(Default, Debug, Clone)]
struct RedirectUris(Vec<String>);

impl Serialize for RedirectUris {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for RedirectUris {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let vec = Vec::<String>::deserialize(deserializer)?;
        if !vec.iter().any(|s| is_valid_redirect(s)) {
            return Err(D::Error::custom(format!(
                "At least one of the redirects needs to be {REDIRECT}, but this was not found. \
                When creating the OAuth client in Google Cloud Console, you must include \
                '{REDIRECT}'"
            )));
        }
        Ok(RedirectUris(vec))
    }
}

fn is_valid_redirect(s: &str) -> bool {
    s == REDIRECT || s == "http://127.0.0.1"
}

/// This is how we save the token information that we receive from Google OAuth.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(super) struct TokenFile {
    scopes: Vec<String>,
    access_token: String,
    refresh_token: String,
    expires_at: DateTime<Utc>,
}

impl TokenFile {
    /// Loads the token file and checks that it was granted every scope we need.
    pub(super) async fn load(p: impl AsRef<Path>) -> Res<File<Self>> {
        let file: File<Self> = File::load(p.as_ref())
            .await
            .context("Unable to deserialize the token JSON file")?;
        file.data().validate_scopes()?;
        Ok(file)
    }

    fn validate_scopes(&self) -> Res<()> {
        let found_scopes: HashSet<&str> = self.scopes.iter().map(|s| s.as_str()).collect();
        for &required_scope in OAUTH_SCOPES {
            if !found_scopes.contains(required_scope) {
                bail!("OAuth scope '{required_scope}' is missing. Run 'byeboros auth' again.");
            }
        }
        Ok(())
    }

    pub(super) fn new(
        scopes: Vec<String>,
        access_token: String,
        refresh_token: String,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            scopes,
            access_token,
            refresh_token,
            expires_at,
        }
    }

    pub(super) fn access_token(&self) -> &str {
        &self.access_token
    }

    pub(super) fn refresh_token(&self) -> &str {
        &self.refresh_token
    }

    /// True when the token is expired or will expire within 5 minutes of `now`.
    pub(super) fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now + chrono::Duration::minutes(EXPIRY_BUFFER_MINUTES)
    }

    /// Google only sometimes sends a new refresh token, so the old one is kept when there is none.
    pub(super) fn update(
        &mut self,
        access_token: String,
        expires_at: DateTime<Utc>,
        refresh_token: Option<String>,
    ) {
        self.access_token = access_token;
        self.expires_at = expires_at;
        if let Some(rt) = refresh_token {
            self.refresh_token = rt;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn secret_json(redirects: &str) -> String {
        format!(
            r#"{{
    "installed": {{
        "client_id": "YOUR_CLIENT_ID.apps.googleusercontent.com",
        "client_secret": "YOUR_CLIENT_SECRET",
        "redirect_uris": {redirects},
        "auth_uri": "https://accounts.google.com/o/oauth2/auth",
        "token_uri": "https://oauth2.googleapis.com/token"
    }}
}}"#
        )
    }

    #[tokio::test]
    async fn test_client_secret_good_redirects() {
        let temp_dir = TempDir::new().unwrap();
        for redirects in [
            r#"["http://localhost", "https://example.com:4040/whatever"]"#,
            r#"["https://example.com:4040/whatever", "http://127.0.0.1"]"#,
        ] {
            let p = temp_dir.path().join("client_secret.json");
            utils::write(&p, secret_json(redirects)).await.unwrap();
            let secret = ClientSecretFile::load(&p).await.unwrap();
            assert_eq!(secret.client_id(), "YOUR_CLIENT_ID.apps.googleusercontent.com");
            assert_eq!(secret.token_uri(), "https://oauth2.googleapis.com/token");
        }
    }

    #[tokio::test]
    async fn test_client_secret_bad_redirect() {
        let temp_dir = TempDir::new().unwrap();
        let p = temp_dir.path().join("client_secret.json");
        utils::write(&p, secret_json(r#"["http://localhost:9900"]"#))
            .await
            .unwrap();
        let message = format!("{:?}", ClientSecretFile::load(&p).await.unwrap_err());
        assert!(message.contains("At least one of the redirects needs to be http://localhost"));
    }

    #[tokio::test]
    async fn test_token_file_missing_scope() {
        let json = r##"{
            "scopes": ["https://www.googleapis.com/auth/drive.readonly"],
            "access_token": "abc12",
            "refresh_token": "xyz89",
            "expires_at": "2026-01-01T00:00:00Z"
        }"##;
        let tmp = TempDir::new().unwrap();
        let json_path = tmp.path().join("token.json");
        utils::write(&json_path, json).await.unwrap();

        let error_message = TokenFile::load(&json_path).await.unwrap_err().to_string();
        assert!(error_message.contains("https://www.googleapis.com/auth/spreadsheets"));
    }

    #[tokio::test]
    async fn test_token_file_save_load_update() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("token.json");
        let expires_at = Utc.with_ymd_and_hms(2026, 10, 18, 12, 0, 0).unwrap();
        let token = TokenFile::new(
            OAUTH_SCOPES.iter().map(|s| s.to_string()).collect(),
            "access".into(),
            "refresh".into(),
            expires_at,
        );
        File::new(&path, token).save().await.unwrap();

        let mut file = TokenFile::load(&path).await.unwrap();
        assert_eq!(file.path(), path.as_path());
        assert_eq!(file.data().access_token(), "access");

        file.data_mut()
            .update("access2".into(), expires_at + chrono::Duration::hours(1), None);
        file.save().await.unwrap();
        let reloaded = TokenFile::load(&path).await.unwrap();
        assert_eq!(reloaded.data().access_token(), "access2");
        assert_eq!(reloaded.data().refresh_token(), "refresh");

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }
    }

    #[test]
    fn test_is_expired() {
        let expires_at = Utc.with_ymd_and_hms(2026, 10, 18, 12, 0, 0).unwrap();
        let token = TokenFile::new(vec![], "a".into(), "r".into(), expires_at);
        let now = Utc.with_ymd_and_hms(2026, 10, 18, 11, 50, 0).unwrap();
        assert!(!token.is_expired(now));
        let soon = Utc.with_ymd_and_hms(2026, 10, 18, 11, 56, 0).unwrap();
        assert!(token.is_expired(soon));
    }
}
