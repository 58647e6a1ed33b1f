//! Client configuration.
//!
//! All settings live in a single `config.toml` file at
//! `~/.config/oncall/config.toml` by default:
//!
//! ```toml
//! [oncall]
//! calendar_url = "team-oncall@group.calendar.google.com"
//! phone_types = ["mobile", "work"]
//!
//! [google]
//! client_id = "env::ONCALL_CLIENT_ID"
//! client_secret = "pass::google/oncall"
//! ```
//!
//! Credential values support secret references, see [`crate::secret`].
//! Paths may start with `~/`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use oncall_calendar::{CalendarConfig, DEFAULT_CACHE_FRESHNESS, DEFAULT_PHONE_TYPES};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ClientError, ClientResult};

/// Configuration for the oncall client.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Resolver settings.
    pub oncall: OnCallSettings,

    /// Google Calendar and Contacts settings.
    pub google: Option<GoogleSettings>,
}

/// The `[oncall]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OnCallSettings {
    /// Calendar ID or events URL of the shift calendar.
    pub calendar_url: String,

    /// Shift cache file. Defaults to `calendar.tsv` in the data directory.
    pub calendar_file: Option<PathBuf>,

    /// People cache file. Defaults to `contacts.tsv` in the data directory.
    pub contacts_file: Option<PathBuf>,

    /// Log file. Logs go to stderr when unset.
    pub log_file: Option<PathBuf>,

    /// Phone labels in order of preference.
    pub phone_types: Vec<String>,

    /// Seconds a cache is trusted without a remote sync. `0` always syncs.
    pub cache_freshness_secs: u64,
}

impl Default for OnCallSettings {
    fn default() -> Self {
        Self {
            calendar_url: String::new(),
            calendar_file: None,
            contacts_file: None,
            log_file: None,
            phone_types: DEFAULT_PHONE_TYPES.iter().map(|s| s.to_string()).collect(),
            cache_freshness_secs: DEFAULT_CACHE_FRESHNESS.as_secs(),
        }
    }
}

impl OnCallSettings {
    /// Returns the shift cache path.
    pub fn calendar_file(&self) -> PathBuf {
        match self.calendar_file {
            Some(ref path) => expand_home(path),
            None => ClientConfig::default_data_dir().join("calendar.tsv"),
        }
    }

    /// Returns the people cache path.
    pub fn contacts_file(&self) -> PathBuf {
        match self.contacts_file {
            Some(ref path) => expand_home(path),
            None => ClientConfig::default_data_dir().join("contacts.tsv"),
        }
    }

    /// Returns the log file path, if one is configured.
    pub fn log_file(&self) -> Option<PathBuf> {
        self.log_file.as_deref().map(expand_home)
    }

    /// Returns true when no calendar has been picked yet.
    pub fn calendar_url_missing(&self) -> bool {
        self.calendar_url.trim().is_empty()
    }

    /// Converts to resolver configuration.
    pub fn to_calendar_config(&self) -> CalendarConfig {
        CalendarConfig::new(
            self.calendar_url.trim(),
            self.calendar_file(),
            self.contacts_file(),
        )
        .with_phone_types(self.phone_types.iter().cloned())
        .with_cache_freshness(Duration::from_secs(self.cache_freshness_secs))
    }

    /// Checks the settings that do not need the network.
    pub fn validate(&self) -> ClientResult<()> {
        if self.phone_types.is_empty() {
            return Err(ClientError::Config(
                "[oncall] phone_types must not be empty".to_string(),
            ));
        }
        if self.calendar_url_missing() {
            return Err(ClientError::Config(
                "[oncall] calendar_url is not set, run `oncall calendars` to list candidates"
                    .to_string(),
            ));
        }
        Ok(())
    }
}

/// The `[google]` section.
///
/// Credentials (`client_id`, `client_secret`) support secret references
/// (`pass::…`, `env::…`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GoogleSettings {
    /// OAuth client ID.
    pub client_id: Option<String>,

    /// OAuth client secret.
    pub client_secret: Option<String>,

    /// Path to token storage.
    pub token_path: Option<PathBuf>,

    /// User agent sent with API requests.
    pub user_agent: Option<String>,

    /// Name shown on the browser page after consent.
    pub display_name: Option<String>,

    /// Request timeout in seconds.
    pub timeout_secs: Option<u64>,
}

#[cfg(feature = "google")]
impl GoogleSettings {
    /// Converts to provider configuration.
    ///
    /// Resolves credentials (expanding `pass::` / `env::` references) and
    /// builds a `GoogleConfig` suitable for the provider.
    pub fn to_provider_config(&self) -> ClientResult<oncall_providers::google::GoogleConfig> {
        use oncall_providers::google::GoogleConfig;

        let credentials = self.resolve_credentials()?;
        let mut config = GoogleConfig::new(credentials);

        if let Some(ref path) = self.token_path {
            config = config.with_token_path(expand_home(path));
        }
        if let Some(ref user_agent) = self.user_agent {
            config = config.with_user_agent(user_agent);
        }
        if let Some(ref name) = self.display_name {
            config = config.with_display_name(name);
        }
        if let Some(secs) = self.timeout_secs {
            config = config.with_timeout(Duration::from_secs(secs));
        }

        config.validate().map_err(ClientError::Config)?;
        Ok(config)
    }

    /// Resolves the OAuth credentials.
    ///
    /// Both `client_id` and `client_secret` must be set.
    pub(crate) fn resolve_credentials(
        &self,
    ) -> ClientResult<oncall_providers::google::OAuthCredentials> {
        use oncall_providers::google::OAuthCredentials;

        let raw_id = self.client_id.as_deref().ok_or_else(|| {
            ClientError::Config(format!(
                "Google credentials not found. Add to {}:\n  \
                 [google]\n  \
                 client_id = \"YOUR_ID.apps.googleusercontent.com\"\n  \
                 client_secret = \"YOUR_SECRET\"",
                ClientConfig::default_path().display()
            ))
        })?;
        let raw_secret = self.client_secret.as_deref().ok_or_else(|| {
            ClientError::Config("client_secret is missing from the [google] section".to_string())
        })?;

        let client_id = crate::secret::resolve(raw_id)
            .map_err(|e| ClientError::Config(format!("failed to resolve client_id: {e}")))?;
        let client_secret = crate::secret::resolve(raw_secret)
            .map_err(|e| ClientError::Config(format!("failed to resolve client_secret: {e}")))?;

        let credentials = OAuthCredentials::new(client_id, client_secret);
        credentials
            .validate()
            .map_err(|e| ClientError::Config(format!("invalid Google credentials: {e}")))?;
        Ok(credentials)
    }
}

impl ClientConfig {
    /// Loads configuration.
    ///
    /// An explicit `path` must exist. Without one, the default path is used
    /// and a missing file yields the defaults.
    pub fn load(path: Option<&Path>) -> ClientResult<Self> {
        match path {
            Some(path) => Self::load_from(path),
            None => {
                let path = Self::default_path();
                if path.exists() {
                    Self::load_from(&path)
                } else {
                    debug!(path = %path.display(), "no config file, using defaults");
                    Ok(Self::default())
                }
            }
        }
    }

    /// Loads configuration from a specific path.
    pub fn load_from(path: &Path) -> ClientResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ClientError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::parse(&content)
            .map_err(|e| ClientError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Parses configuration from TOML text.
    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Returns the default configuration file path.
    pub fn default_path() -> PathBuf {
        Self::default_config_dir().join("config.toml")
    }

    /// Returns the default configuration directory.
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("oncall")
    }

    /// Returns the default data directory path.
    pub fn default_data_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("oncall")
    }
}

/// Replaces a leading `~` with the home directory.
pub fn expand_home(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => match dirs::home_dir() {
            Some(home) => home.join(rest),
            None => path.to_path_buf(),
        },
        Err(_) => path.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config = ClientConfig::parse("").unwrap();
        assert!(config.google.is_none());
        assert!(config.oncall.calendar_url_missing());
        assert_eq!(config.oncall.phone_types, vec!["mobile", "work"]);
        assert_eq!(config.oncall.cache_freshness_secs, 60);
        assert!(config.oncall.log_file().is_none());
        assert!(config.oncall.calendar_file().ends_with("oncall/calendar.tsv"));
        assert!(config.oncall.contacts_file().ends_with("oncall/contacts.tsv"));
    }

    #[test]
    fn full_config() {
        let config = ClientConfig::parse(
            r#"
[oncall]
calendar_url = "team-oncall@group.calendar.google.com"
calendar_file = "/var/lib/oncall/calendar.tsv"
contacts_file = "/var/lib/oncall/contacts.tsv"
log_file = "/var/log/oncall.log"
phone_types = ["work"]
cache_freshness_secs = 0

[google]
client_id = "id.apps.googleusercontent.com"
client_secret = "secret"
timeout_secs = 10
"#,
        )
        .unwrap();

        let calendar = config.oncall.to_calendar_config();
        assert_eq!(calendar.calendar_url, "team-oncall@group.calendar.google.com");
        assert_eq!(calendar.calendar_file, PathBuf::from("/var/lib/oncall/calendar.tsv"));
        assert_eq!(calendar.contacts_file, PathBuf::from("/var/lib/oncall/contacts.tsv"));
        assert_eq!(calendar.phone_types, vec!["work"]);
        assert!(calendar.cache_freshness.is_zero());
        assert_eq!(
            config.oncall.log_file(),
            Some(PathBuf::from("/var/log/oncall.log"))
        );
        assert!(config.oncall.validate().is_ok());

        let google = config.google.unwrap();
        assert_eq!(google.timeout_secs, Some(10));
    }

    #[test]
    fn unknown_types_are_rejected() {
        assert!(ClientConfig::parse("[oncall]\ncache_freshness_secs = \"soon\"\n").is_err());
    }

    #[test]
    fn validate_requires_calendar_url() {
        let config = ClientConfig::parse("[oncall]\ncalendar_url = \"  \"\n").unwrap();
        let err = config.oncall.validate().unwrap_err();
        assert!(err.to_string().contains("calendar_url"));
    }

    #[test]
    fn validate_requires_phone_types() {
        let config =
            ClientConfig::parse("[oncall]\ncalendar_url = \"primary\"\nphone_types = []\n")
                .unwrap();
        assert!(config.oncall.validate().is_err());
    }

    #[test]
    fn home_is_expanded() {
        let Some(home) = dirs::home_dir() else {
            return;
        };
        assert_eq!(
            expand_home(Path::new("~/.local/share/oncall/calendar.tsv")),
            home.join(".local/share/oncall/calendar.tsv")
        );
        assert_eq!(
            expand_home(Path::new("/tmp/calendar.tsv")),
            PathBuf::from("/tmp/calendar.tsv")
        );
    }

    #[test]
    fn load_explicit_path() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "[oncall]\ncalendar_url = \"primary\"\n").unwrap();

        let config = ClientConfig::load(Some(&path)).unwrap();
        assert_eq!(config.oncall.calendar_url, "primary");

        let missing = ClientConfig::load(Some(&tmp.path().join("nope.toml"))).unwrap_err();
        assert_eq!(missing.exit_code(), crate::error::EX_CONFIG);
    }

    #[test]
    fn dump_round_trips() {
        let config = ClientConfig::parse("[oncall]\ncalendar_url = \"primary\"\n").unwrap();
        let dumped = toml::to_string_pretty(&config).unwrap();
        let again = ClientConfig::parse(&dumped).unwrap();
        assert_eq!(again.oncall.calendar_url, "primary");
        assert_eq!(again.oncall.phone_types, config.oncall.phone_types);
    }

    #[cfg(feature = "google")]
    mod google {
        use super::*;

        #[test]
        fn resolve_credentials_plain_text() {
            let settings = GoogleSettings {
                client_id: Some("test-id.apps.googleusercontent.com".to_string()),
                client_secret: Some("test-secret".to_string()),
                ..Default::default()
            };
            let creds = settings.resolve_credentials().unwrap();
            assert_eq!(creds.client_id, "test-id.apps.googleusercontent.com");
            assert_eq!(creds.client_secret, "test-secret");
        }

        #[test]
        fn resolve_credentials_env_prefix() {
            unsafe {
                std::env::set_var("_ONCALL_TEST_CLIENT_ID", "env-id.apps.googleusercontent.com");
                std::env::set_var("_ONCALL_TEST_CLIENT_SECRET", "env-secret");
            }

            let config = ClientConfig::parse(
                r#"
[google]
client_id = "env::_ONCALL_TEST_CLIENT_ID"
client_secret = "env::_ONCALL_TEST_CLIENT_SECRET"
"#,
            )
            .unwrap();
            let creds = config.google.unwrap().resolve_credentials().unwrap();
            assert_eq!(creds.client_id, "env-id.apps.googleusercontent.com");
            assert_eq!(creds.client_secret, "env-secret");

            unsafe {
                std::env::remove_var("_ONCALL_TEST_CLIENT_ID");
                std::env::remove_var("_ONCALL_TEST_CLIENT_SECRET");
            }
        }

        #[test]
        fn resolve_credentials_missing_fields() {
            let missing_id = GoogleSettings {
                client_secret: Some("secret".to_string()),
                ..Default::default()
            };
            let err = missing_id.resolve_credentials().unwrap_err();
            assert!(err.to_string().contains("credentials not found"));

            let missing_secret = GoogleSettings {
                client_id: Some("id.apps.googleusercontent.com".to_string()),
                ..Default::default()
            };
            let err = missing_secret.resolve_credentials().unwrap_err();
            assert!(err.to_string().contains("client_secret"));
        }

        #[test]
        fn resolve_credentials_rejects_bad_client_id() {
            let settings = GoogleSettings {
                client_id: Some("not-a-client-id".to_string()),
                client_secret: Some("secret".to_string()),
                ..Default::default()
            };
            assert_eq!(
                settings.resolve_credentials().unwrap_err().exit_code(),
                crate::error::EX_CONFIG
            );
        }

        #[test]
        fn provider_config_applies_overrides() {
            let settings = GoogleSettings {
                client_id: Some("test.apps.googleusercontent.com".to_string()),
                client_secret: Some("test-secret".to_string()),
                token_path: Some(PathBuf::from("/tmp/oncall-tokens.json")),
                user_agent: Some("oncall-test/1.0".to_string()),
                display_name: Some("Test resolver".to_string()),
                timeout_secs: Some(5),
            };
            let config = settings.to_provider_config().unwrap();
            assert_eq!(config.token_path, PathBuf::from("/tmp/oncall-tokens.json"));
            assert_eq!(config.user_agent, "oncall-test/1.0");
            assert_eq!(config.display_name, "Test resolver");
            assert_eq!(config.timeout, Duration::from_secs(5));
        }
    }
}
