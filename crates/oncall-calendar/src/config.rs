//! Resolver configuration.

use std::path::PathBuf;
use std::time::Duration;

/// Phone labels tried in order when none are configured.
pub const DEFAULT_PHONE_TYPES: [&str; 2] = ["mobile", "work"];

/// How long a fresh cache is trusted without asking the remote calendar.
pub const DEFAULT_CACHE_FRESHNESS: Duration = Duration::from_secs(60);

/// Resolver configuration.
#[derive(Debug, Clone)]
pub struct CalendarConfig {
    /// Calendar ID or events URL of the shift calendar.
    pub calendar_url: String,

    /// Path of the cached shift list.
    pub calendar_file: PathBuf,

    /// Path of the cached people list.
    pub contacts_file: PathBuf,

    /// Phone labels in order of preference.
    pub phone_types: Vec<String>,

    /// Cache files younger than this are used without a remote sync.
    /// Zero disables the check.
    pub cache_freshness: Duration,
}

impl CalendarConfig {
    /// Creates a new configuration for the given calendar and cache files.
    pub fn new(
        calendar_url: impl Into<String>,
        calendar_file: impl Into<PathBuf>,
        contacts_file: impl Into<PathBuf>,
    ) -> Self {
        Self {
            calendar_url: calendar_url.into(),
            calendar_file: calendar_file.into(),
            contacts_file: contacts_file.into(),
            phone_types: DEFAULT_PHONE_TYPES.iter().map(|s| s.to_string()).collect(),
            cache_freshness: DEFAULT_CACHE_FRESHNESS,
        }
    }

    /// Builder: set the phone label preference.
    pub fn with_phone_types<I, S>(mut self, phone_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.phone_types = phone_types.into_iter().map(Into::into).collect();
        self
    }

    /// Builder: set the cache freshness window.
    pub fn with_cache_freshness(mut self, freshness: Duration) -> Self {
        self.cache_freshness = freshness;
        self
    }
}
