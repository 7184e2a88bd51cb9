//! The JSON files that hold Google OAuth credentials:
//! - `client_secret.json`: the OAuth 2.0 desktop client downloaded from Google Cloud Console
//! - `token.json`: the access and refresh tokens that we receive from Google

use crate::api::OAUTH_SCOPES;
use crate::error::Res;
use crate::utils;
use anyhow::{bail, Context};
use chrono::{DateTime, Duration, Utc};
use serde::de::{DeserializeOwned, Error};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashSet;
use std::fmt::Debug;
use std::path::{Path, PathBuf};

/// This redirect needs to be present in the OAuth credential file, or else OAuth will not work.
const REDIRECT: &str = "http://localhost";

/// A token this close to its expiry is treated as expired.
const EXPIRY_BUFFER_SECONDS: i64 = 60;

/// Holds the `path` of a JSON file along with its deserialized `data` so that it can be modified
/// and saved back to the same place.
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

    /// Writes the data as pretty JSON. The file is only readable by its owner since it holds
    /// secrets.
    pub(super) async fn save(&self) -> Res<()> {
        let json =
            serde_json::to_string_pretty(&self.data).context("Failed to serialize data to JSON")?;
        utils::write(&self.path, json).await?;

        #[cfg(unix)]
        {
            use std::fs::Permissions;
            use std::os::unix::fs::PermissionsExt;
            tokio::fs::set_permissions(&self.path, Permissions::from_mode(0o600))
                .await
                .with_context(|| {
                    format!("Failed to set file permissions on {}", self.path.display())
                })?;
        }

        Ok(())
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

/// The `client_secret.json` file downloaded from Google Cloud Console. Google wraps the desktop
/// application credentials in an "installed" object.
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
pub(super) struct SecretFile {
    installed: InstalledCredentials,
}

impl SecretFile {
    pub(super) async fn load(path: &Path) -> Res<SecretFile> {
        utils::deserialize(path).await.with_context(|| {
            format!(
                "Unable to read the OAuth client secret file {}",
                path.display()
            )
        })
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

#[derive(Default, Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
struct InstalledCredentials {
    client_id: String,
    client_secret: String,
    /// Must include "http://localhost" (without a port number) for the callback listener to work.
    #[serde(deserialize_with = "deserialize_redirect_uris")]
    redirect_uris: Vec<String>,
    auth_uri: String,
    token_uri: String,
}

fn deserialize_redirect_uris<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let uris = Vec::<String>::deserialize(deserializer)?;
    if !uris.iter().any(|s| s == REDIRECT || s == "http://127.0.0.1") {
        return Err(D::Error::custom(format!(
            "At least one of the redirects needs to be {REDIRECT}, but this was not found. \
            When creating the OAuth client for your Google Cloud project, you must include \
            '{REDIRECT}'"
        )));
    }
    Ok(uris)
}

/// The tokens that we receive from Google OAuth, saved in our own shape.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(super) struct TokenFile {
    scopes: Vec<String>,
    access_token: String,
    refresh_token: String,
    expires_at: DateTime<Utc>,
}

impl TokenFile {
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

    /// Loads the token file and makes sure that it was granted every scope we need.
    pub(super) async fn load(path: impl AsRef<Path>) -> Res<File<Self>> {
        let file: File<Self> = File::load(path.as_ref())
            .await
            .context("Unable to deserialize the token JSON file")?;
        file.data().validate_scopes()?;
        Ok(file)
    }

    fn validate_scopes(&self) -> Res<()> {
        let found: HashSet<&str> = self.scopes.iter().map(String::as_str).collect();
        for &required in OAUTH_SCOPES {
            if !found.contains(required) {
                bail!("OAuth scope '{required}' is missing.");
            }
        }
        Ok(())
    }

    pub(super) fn access_token(&self) -> &str {
        &self.access_token
    }

    pub(super) fn refresh_token(&self) -> &str {
        &self.refresh_token
    }

    pub(super) fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Whether the token has expired or will within the next minute.
    pub(super) fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now() + Duration::seconds(EXPIRY_BUFFER_SECONDS)
    }

    /// Google does not always send a new refresh token, in which case the old one is kept.
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
    use tempfile::TempDir;

    fn secret_json(redirect: &str) -> String {
        format!(
            r#"{{
    "installed": {{
        "client_id": "YOUR_CLIENT_ID.apps.googleusercontent.com",
        "client_secret": "YOUR_CLIENT_SECRET",
        "redirect_uris": ["{redirect}", "https://example.com:4040/whatever"],
        "auth_uri": "https://accounts.google.com/o/oauth2/auth",
        "token_uri": "https://oauth2.googleapis.com/token"
    }}
}}"#
        )
    }

    #[tokio::test]
    async fn test_client_secret_good_redirects() {
        let dir = TempDir::new().unwrap();
        for redirect in ["http://localhost", "http://127.0.0.1"] {
            let p = dir.path().join("secret.json");
            utils::write(&p, secret_json(redirect)).await.unwrap();
            let secret = SecretFile::load(&p).await.unwrap();
            assert_eq!(secret.client_id(), "YOUR_CLIENT_ID.apps.googleusercontent.com");
            assert_eq!(secret.token_uri(), "https://oauth2.googleapis.com/token");
        }
    }

    #[tokio::test]
    async fn test_client_secret_bad_redirect() {
        let dir = TempDir::new().unwrap();
        let p = dir.path().join("secret.json");
        utils::write(&p, secret_json("http://localhost:9900"))
            .await
            .unwrap();
        let err = SecretFile::load(&p).await.unwrap_err();
        assert!(format!("{err:?}").contains("At least one of the redirects needs to be"));
    }

    #[tokio::test]
    async fn test_token_file_missing_scope() {
        let dir = TempDir::new().unwrap();
        let p = dir.path().join("token.json");
        let json = r#"{
            "scopes": ["https://www.googleapis.com/auth/drive.readonly"],
            "access_token": "abc12",
            "refresh_token": "xyz89",
            "expires_at": "2025-01-01T00:00:00Z"
        }"#;
        utils::write(&p, json).await.unwrap();
        let err = TokenFile::load(&p).await.unwrap_err();
        assert!(err
            .to_string()
            .contains("https://www.googleapis.com/auth/spreadsheets"));
    }

    #[tokio::test]
    async fn test_token_file_save_and_load() {
        let dir = TempDir::new().unwrap();
        let p = dir.path().join("token.json");
        let token = TokenFile::new(
            OAUTH_SCOPES.iter().map(|s| s.to_string()).collect(),
            "abc12".to_string(),
            "xyz89".to_string(),
            Utc::now() + Duration::hours(1),
        );
        File::new(&p, token).save().await.unwrap();

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&p).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }

        let mut loaded = TokenFile::load(&p).await.unwrap();
        assert_eq!(loaded.data().access_token(), "abc12");
        assert!(!loaded.data().is_expired());

        loaded
            .data_mut()
            .update("new".to_string(), Utc::now() + Duration::seconds(30), None);
        assert!(loaded.data().is_expired());
        assert_eq!(loaded.data().refresh_token(), "xyz89");
        assert_eq!(loaded.path(), p.as_path());
    }
}
