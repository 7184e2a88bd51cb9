//! Configuration file handling.
//!
//! The configuration file is stored at `$LEDGER_HOME/config.json` and holds the Google Sheet URL,
//! the household's members and the paths of the OAuth files.

use crate::error::{ErrorType, IntoResult, Res};
use crate::model::{Household, Member, Taxonomy};
use crate::utils;
use crate::Result;
use anyhow::{bail, ensure, Context};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

const APP_NAME: &str = "ledger";
const CONFIG_VERSION: u8 = 1;
const SECRETS: &str = ".secrets";
const CLIENT_SECRET_JSON: &str = "client_secret.json";
const TOKEN_JSON: &str = "token.json";
const CONFIG_JSON: &str = "config.json";

/// The columns that transactions occupy.
const COLUMNS: &str = "A:G";

/// The configuration of the app. You instantiate it by providing the path to `$LEDGER_HOME` and
/// from there it loads `$LEDGER_HOME/config.json`.
///
/// The taxonomy and household are built once here and shared by everything that needs them.
#[derive(Debug, Clone)]
pub struct Config {
    root: PathBuf,
    secrets: PathBuf,
    config_path: PathBuf,
    config_file: ConfigFile,
    spreadsheet_id: String,
    taxonomy: Arc<Taxonomy>,
    household: Arc<Household>,
}

impl Config {
    /// Creates the home directory and its `.secrets` subdirectory, copies `secret_file` into
    /// `.secrets/client_secret.json` and writes an initial `config.json`.
    ///
    /// # Arguments
    /// - `dir` - The home directory, e.g. `$HOME/ledger`
    /// - `secret_file` - The OAuth 2.0 client credentials JSON downloaded from Google Cloud Console
    /// - `sheet_url` - The URL of the Google Sheet, e.g.
    ///   https://docs.google.com/spreadsheets/d/1a7Km9FxQwRbPt82JvN4LzYpH5OcGnWsT6iDuE3VhMjX/edit
    ///
    /// # Errors
    /// - Returns an error if the URL is not a Google Sheets URL or if any file operations fail.
    pub(crate) async fn create(
        dir: impl Into<PathBuf>,
        secret_file: &Path,
        sheet_url: &str,
    ) -> Res<Self> {
        let spreadsheet_id = extract_spreadsheet_id(sheet_url)
            .context("Failed to extract spreadsheet ID from sheet URL")?
            .to_string();
        ensure!(!spreadsheet_id.is_empty(), "The sheet URL is empty");

        let maybe_relative = dir.into();
        utils::make_dir(&maybe_relative)
            .await
            .context("Unable to create the ledger home directory")?;
        let root = utils::canonicalize(&maybe_relative).await?;

        let secrets = root.join(SECRETS);
        utils::make_dir(&secrets).await?;
        utils::copy(secret_file, secrets.join(CLIENT_SECRET_JSON)).await?;

        let config_path = root.join(CONFIG_JSON);
        let config_file = ConfigFile {
            sheet_url: sheet_url.to_string(),
            ..ConfigFile::default()
        };
        config_file.save(&config_path).await?;

        Self::from_parts(root, config_path, config_file, spreadsheet_id)
    }

    /// Validates that `ledger_home` and its config file exist, loads the config file and checks
    /// that the `.secrets` directory exists.
    pub async fn load(ledger_home: impl Into<PathBuf>) -> Result<Self> {
        Self::load_inner(ledger_home.into())
            .await
            .pub_result(ErrorType::Config)
    }

    async fn load_inner(ledger_home: PathBuf) -> Res<Self> {
        let maybe_relative = ledger_home;
        let root = utils::canonicalize(&maybe_relative)
            .await
            .context("The ledger home directory is missing, run 'ledger init' first")?;

        let config_path = root.join(CONFIG_JSON);
        if !config_path.is_file() {
            bail!("The config file is missing '{}'", config_path.display())
        }
        let config_file = ConfigFile::load(&config_path).await?;

        let spreadsheet_id = extract_spreadsheet_id(&config_file.sheet_url)
            .context("Failed to extract spreadsheet ID from sheet URL")?
            .to_string();

        let config = Self::from_parts(root, config_path, config_file, spreadsheet_id)?;
        if !config.secrets.is_dir() {
            bail!(
                "The secrets directory is missing '{}'",
                config.secrets.display()
            )
        }
        Ok(config)
    }

    fn from_parts(
        root: PathBuf,
        config_path: PathBuf,
        config_file: ConfigFile,
        spreadsheet_id: String,
    ) -> Res<Self> {
        let household = config_file
            .household()
            .with_context(|| format!("Invalid household in {}", config_path.display()))?;
        Ok(Self {
            secrets: root.join(SECRETS),
            root,
            config_path,
            config_file,
            spreadsheet_id,
            taxonomy: Arc::new(Taxonomy::household()),
            household: Arc::new(household),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn secrets(&self) -> &Path {
        &self.secrets
    }

    pub fn sheet_url(&self) -> &str {
        &self.config_file.sheet_url
    }

    pub fn spreadsheet_id(&self) -> &str {
        &self.spreadsheet_id
    }

    /// The A1 range that holds the transactions, on the configured worksheet or the first one.
    pub fn range(&self) -> String {
        match self.config_file.worksheet.as_deref() {
            Some(ws) if !ws.trim().is_empty() => format!("'{}'!{COLUMNS}", ws.replace('\'', "''")),
            _ => COLUMNS.to_string(),
        }
    }

    pub fn taxonomy(&self) -> &Taxonomy {
        &self.taxonomy
    }

    pub fn household(&self) -> &Household {
        &self.household
    }

    /// Returns the stored `client_secret_path` if it is absolute, otherwise resolves it relative
    /// to the home directory.
    pub fn client_secret_path(&self) -> PathBuf {
        self.resolve_path(self.config_file.client_secret_path())
    }

    /// Returns the stored `token_path` if it is absolute, otherwise resolves it relative to the
    /// home directory.
    pub fn token_path(&self) -> PathBuf {
        self.resolve_path(self.config_file.token_path())
    }

    fn resolve_path(&self, p: PathBuf) -> PathBuf {
        if p.is_absolute() {
            return p;
        }
        self.root.join(p)
    }
}

/// The serialization format of the configuration file.
///
/// Example configuration:
/// ```json
/// {
///   "app_name": "ledger",
///   "config_version": 1,
///   "sheet_url": "https://docs.google.com/spreadsheets/d/7KpXm2RfZwNJgs84QhVYno5DU6iM9Wlr3bCzAv1txRpL",
///   "worksheet": "Ledger",
///   "members": ["Connie", "Kam", "曦晴", "曦朗"],
///   "children": ["曦晴", "曦朗"],
///   "client_secret_path": ".secrets/client_secret.json",
///   "token_path": ".secrets/token.json"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
struct ConfigFile {
    /// Application name, should always be "ledger"
    app_name: String,

    config_version: u8,

    sheet_url: String,

    /// The worksheet (tab) holding the transactions. The first worksheet when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    worksheet: Option<String>,

    /// Everyone who can record a transaction. The default household when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    members: Option<Vec<String>>,

    /// The members whose expenses default to the Children category.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    children: Option<Vec<String>>,

    /// Relative to the home directory, or absolute. Defaults to `.secrets/client_secret.json`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    client_secret_path: Option<PathBuf>,

    /// Relative to the home directory, or absolute. Defaults to `.secrets/token.json`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    token_path: Option<PathBuf>,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            app_name: APP_NAME.to_string(),
            config_version: CONFIG_VERSION,
            sheet_url: String::new(),
            worksheet: None,
            members: None,
            children: None,
            client_secret_path: None,
            token_path: None,
        }
    }
}

impl ConfigFile {
    async fn load(path: impl AsRef<Path>) -> Res<Self> {
        let path = path.as_ref();
        let config: ConfigFile = utils::deserialize(path)
            .await
            .context("Unable to load the config file")?;

        ensure!(
            config.app_name == APP_NAME,
            "Invalid app_name in config file: expected '{}', got '{}'",
            APP_NAME,
            config.app_name
        );
        ensure!(
            config.config_version == CONFIG_VERSION,
            "Unsupported config_version {}, expected {}",
            config.config_version,
            CONFIG_VERSION
        );

        Ok(config)
    }

    async fn save(&self, path: impl AsRef<Path>) -> Res<()> {
        let data = serde_json::to_string_pretty(self).context("Unable to serialize config")?;
        utils::write(path.as_ref(), data)
            .await
            .context("Unable to write config file")
    }

    /// The configured household. Members and children fall back to the defaults separately, but
    /// every child must still be a member.
    fn household(&self) -> Res<Household> {
        let default = Household::default();
        let names = |configured: &Option<Vec<String>>, fallback: &[Member]| {
            configured.clone().unwrap_or_else(|| {
                fallback.iter().map(|m| m.as_ref().to_string()).collect()
            })
        };
        Household::new(
            names(&self.members, default.members()),
            names(&self.children, default.children()),
        )
    }

    fn client_secret_path(&self) -> PathBuf {
        self.client_secret_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(SECRETS).join(CLIENT_SECRET_JSON))
    }

    fn token_path(&self) -> PathBuf {
        self.token_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(SECRETS).join(TOKEN_JSON))
    }
}

/// Extracts the spreadsheet ID from a Google Sheets URL such as
/// `https://docs.google.com/spreadsheets/d/SPREADSHEET_ID/edit`. Returns an empty string if the
/// URL is empty.
fn extract_spreadsheet_id(url: &str) -> Res<&str> {
    if url.is_empty() {
        return Ok(url);
    }

    let parts: Vec<&str> = url.split('/').collect();
    for (i, part) in parts.iter().enumerate() {
        if *part == "d" && i + 1 < parts.len() {
            let id_part = parts[i + 1];
            let id = id_part
                .split(['?', '#'])
                .next()
                .unwrap_or(id_part);
            return Ok(id);
        }
    }
    bail!(
        "Invalid Google Sheets URL format. Expected: https://docs.google.com/spreadsheets/d/SPREADSHEET_ID"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const URL: &str =
        "https://docs.google.com/spreadsheets/d/7KpXm2RfZwNJgs84QhVYno5DU6iM9Wlr3bCzAv1txRpL/edit";

    #[tokio::test]
    async fn test_config_create_and_load() {
        let dir = TempDir::new().unwrap();
        let home_dir = dir.path().join("ledger_home");
        let secret_source_file = dir.path().join("x.json");
        utils::write(&secret_source_file, "12345").await.unwrap();

        let config = Config::create(&home_dir, &secret_source_file, URL)
            .await
            .unwrap();

        assert_eq!(URL, config.sheet_url());
        assert_eq!(
            "7KpXm2RfZwNJgs84QhVYno5DU6iM9Wlr3bCzAv1txRpL",
            config.spreadsheet_id()
        );
        assert_eq!(config.range(), "A:G");
        assert_eq!(config.household(), &Household::default());
        assert!(config.secrets().is_dir());
        assert!(secret_source_file.is_file());
        assert_eq!(
            utils::read(&config.client_secret_path()).await.unwrap(),
            "12345"
        );
        assert_eq!(
            config.token_path(),
            config.root().join(SECRETS).join(TOKEN_JSON)
        );

        let loaded = Config::load(&home_dir).await.unwrap();
        assert_eq!(loaded.spreadsheet_id(), config.spreadsheet_id());
        assert_eq!(loaded.config_path(), config.config_path());
    }

    #[tokio::test]
    async fn test_config_create_bad_url() {
        let dir = TempDir::new().unwrap();
        let secret = dir.path().join("x.json");
        utils::write(&secret, "{}").await.unwrap();
        let result = Config::create(dir.path().join("h"), &secret, "https://example.com/x").await;
        assert!(result.is_err());
        assert!(!dir.path().join("h").exists());
    }

    #[tokio::test]
    async fn test_config_load_missing_home() {
        let dir = TempDir::new().unwrap();
        let err = Config::load(dir.path().join("nope")).await.unwrap_err();
        assert!(err.to_string().contains("ledger init"));
    }

    async fn write_config(dir: &TempDir, json: &str) -> PathBuf {
        let home = dir.path().to_path_buf();
        utils::make_dir(home.join(SECRETS)).await.unwrap();
        utils::write(home.join(CONFIG_JSON), json).await.unwrap();
        home
    }

    #[tokio::test]
    async fn test_config_load_custom_household_and_worksheet() {
        let dir = TempDir::new().unwrap();
        let home = write_config(
            &dir,
            r#"{
                "app_name": "ledger",
                "config_version": 1,
                "sheet_url": "https://docs.google.com/spreadsheets/d/abc",
                "worksheet": "Bob's Ledger",
                "members": ["Ann", "Bob", "Kid"],
                "children": ["Kid"],
                "token_path": "/tmp/token.json"
            }"#,
        )
        .await;
        let config = Config::load(&home).await.unwrap();
        assert_eq!(config.range(), "'Bob''s Ledger'!A:G");
        assert_eq!(config.household().members().len(), 3);
        assert!(config.household().is_child("Kid"));
        assert_eq!(config.token_path(), PathBuf::from("/tmp/token.json"));
    }

    #[tokio::test]
    async fn test_config_load_child_not_member() {
        let dir = TempDir::new().unwrap();
        let home = write_config(
            &dir,
            r#"{
                "app_name": "ledger",
                "config_version": 1,
                "sheet_url": "https://docs.google.com/spreadsheets/d/abc",
                "members": ["Ann", "Bob"]
            }"#,
        )
        .await;
        // The default children are not among the configured members.
        let err = Config::load(&home).await.unwrap_err();
        assert!(format!("{err:#}").contains("not listed as a member"));
    }

    #[tokio::test]
    async fn test_config_file_load_invalid_app_name() {
        let dir = TempDir::new().unwrap();
        let home = write_config(
            &dir,
            r#"{
                "app_name": "wrong_app",
                "config_version": 1,
                "sheet_url": "https://docs.google.com/spreadsheets/d/test"
            }"#,
        )
        .await;
        let err = Config::load(&home).await.unwrap_err();
        assert!(err.to_string().contains("Invalid app_name"));
    }

    #[tokio::test]
    async fn test_config_file_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        let original = ConfigFile {
            sheet_url: URL.to_string(),
            worksheet: Some("Ledger".to_string()),
            client_secret_path: Some(PathBuf::from(".secrets/my_key.json")),
            ..ConfigFile::default()
        };
        original.save(&path).await.unwrap();
        assert_eq!(original, ConfigFile::load(&path).await.unwrap());
    }

    #[test]
    fn test_config_file_serialization_omits_none_fields() {
        let json = serde_json::to_string(&ConfigFile::default()).unwrap();
        assert!(!json.contains("client_secret_path"));
        assert!(!json.contains("token_path"));
        assert!(!json.contains("members"));
        assert!(!json.contains("worksheet"));
    }

    #[test]
    fn test_extract_spreadsheet_id() {
        assert_eq!(
            extract_spreadsheet_id(URL).unwrap(),
            "7KpXm2RfZwNJgs84QhVYno5DU6iM9Wlr3bCzAv1txRpL"
        );
        assert_eq!(
            extract_spreadsheet_id("https://docs.google.com/spreadsheets/d/ABC123?foo=bar")
                .unwrap(),
            "ABC123"
        );
        assert_eq!(
            extract_spreadsheet_id("https://docs.google.com/spreadsheets/d/ABC123#gid=0").unwrap(),
            "ABC123"
        );
        assert!(extract_spreadsheet_id("https://example.com/invalid").is_err());
        assert_eq!(extract_spreadsheet_id("").unwrap(), "");
    }
}
