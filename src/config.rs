use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use moodmeal_core::{RetryPolicy, WeekStart};

/// Source of a configuration value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigSource {
    Default,
    File,
    Environment,
    Flag,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::Default => write!(f, "default"),
            ConfigSource::File => write!(f, "file"),
            ConfigSource::Environment => write!(f, "environment"),
            ConfigSource::Flag => write!(f, "flag"),
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }
}

/// Where daily logs are read from and written to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    #[default]
    Local,
    Remote,
}

impl std::fmt::Display for StoreKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreKind::Local => write!(f, "local"),
            StoreKind::Remote => write!(f, "remote"),
        }
    }
}

impl FromStr for StoreKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "local" => Ok(StoreKind::Local),
            "remote" => Ok(StoreKind::Remote),
            _ => Err(format!(
                "Invalid store '{}'. Valid options: local, remote",
                s
            )),
        }
    }
}

/// Hosted database settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Project URL (e.g., "https://xyz.supabase.co")
    pub url: Option<String>,
    /// Project API key, sent as the `apikey` header
    pub api_key: Option<String>,
    /// Signed-in user's access token; the api key is used when absent
    #[serde(skip_serializing)]
    pub access_token: Option<String>,
    /// Per-request timeout
    pub timeout_secs: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            url: None,
            api_key: None,
            access_token: None,
            timeout_secs: 10,
        }
    }
}

impl RemoteConfig {
    /// Returns true if both url and api_key are set
    pub fn is_configured(&self) -> bool {
        self.url.is_some() && self.api_key.is_some()
    }
}

/// Retry settings for store calls
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        let policy = RetryPolicy::default();
        Self {
            max_attempts: policy.max_attempts,
            initial_backoff_ms: policy.initial_backoff.as_millis() as u64,
            max_backoff_ms: policy.max_backoff.as_millis() as u64,
        }
    }
}

impl RetryConfig {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts.max(1),
            initial_backoff: Duration::from_millis(self.initial_backoff_ms),
            max_backoff: Duration::from_millis(self.max_backoff_ms),
        }
    }
}

/// Application configuration with source tracking
#[derive(Debug, Clone, Serialize)]
pub struct Config {
    /// Path to the SQLite database used by the local store
    pub database_path: ConfigValue<PathBuf>,
    /// Signed-in user; required for the remote store
    pub user_id: ConfigValue<Option<String>>,
    /// Which store to use
    pub store: ConfigValue<StoreKind>,
    /// First column of the calendar
    pub week_start: WeekStart,
    /// Daily water goal in cups
    pub water_goal: u32,
    /// Config file path used (if any)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_file: Option<PathBuf>,
    pub remote: RemoteConfig,
    pub retry: RetryConfig,
}

/// Internal struct for deserializing config file
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ConfigFile {
    database_path: Option<PathBuf>,
    user_id: Option<String>,
    store: Option<StoreKind>,
    week_start: Option<WeekStart>,
    water_goal: Option<u32>,
    remote: Option<RemoteConfig>,
    retry: Option<RetryConfig>,
}

/// User id the local store falls back to when none is configured
pub const LOCAL_USER_ID: &str = "local";

const DEFAULT_WATER_GOAL: u32 = 8;

impl Config {
    /// Load configuration with priority: env vars > config file > defaults
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let default_db_path = Self::default_data_dir().join("moodmeal.db");

        // Start with defaults
        let mut database_path = ConfigValue::new(default_db_path, ConfigSource::Default);
        let mut user_id = ConfigValue::new(None, ConfigSource::Default);
        let mut store = ConfigValue::new(StoreKind::default(), ConfigSource::Default);
        let mut week_start = WeekStart::default();
        let mut water_goal = DEFAULT_WATER_GOAL;
        let mut config_file = None;
        let mut remote = RemoteConfig::default();
        let mut retry = RetryConfig::default();

        // Try to load from config file
        let path = config_path.unwrap_or_else(Self::default_config_path);
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .map_err(|e| ConfigError::ReadError(path.clone(), e))?;
            let file_config: ConfigFile = serde_yaml::from_str(&contents)
                .map_err(|e| ConfigError::ParseError(path.clone(), e))?;

            config_file = Some(path.clone());

            if let Some(db_path) = file_config.database_path {
                // Resolve relative paths against config file's directory
                let resolved_path = if db_path.is_relative() {
                    path.parent().map(|p| p.join(&db_path)).unwrap_or(db_path)
                } else {
                    db_path
                };
                database_path = ConfigValue::new(resolved_path, ConfigSource::File);
            }
            if let Some(user) = file_config.user_id {
                user_id = ConfigValue::new(Some(user), ConfigSource::File);
            }
            if let Some(kind) = file_config.store {
                store = ConfigValue::new(kind, ConfigSource::File);
            }
            if let Some(start) = file_config.week_start {
                week_start = start;
            }
            if let Some(goal) = file_config.water_goal {
                water_goal = goal;
            }
            if let Some(remote_config) = file_config.remote {
                remote = remote_config;
            }
            if let Some(retry_config) = file_config.retry {
                retry = retry_config;
            }
        }

        // Apply environment variable overrides
        if let Ok(db_path) = std::env::var("MOODMEAL_DATABASE_PATH") {
            database_path = ConfigValue::new(PathBuf::from(db_path), ConfigSource::Environment);
        }
        if let Ok(user) = std::env::var("MOODMEAL_USER_ID") {
            user_id = ConfigValue::new(Some(user), ConfigSource::Environment);
        }
        if let Ok(kind) = std::env::var("MOODMEAL_STORE") {
            let kind = kind.parse().map_err(ConfigError::InvalidValue)?;
            store = ConfigValue::new(kind, ConfigSource::Environment);
        }
        if let Ok(url) = std::env::var("MOODMEAL_REMOTE_URL") {
            remote.url = Some(url);
        }
        if let Ok(key) = std::env::var("MOODMEAL_REMOTE_API_KEY") {
            remote.api_key = Some(key);
        }
        if let Ok(token) = std::env::var("MOODMEAL_REMOTE_ACCESS_TOKEN") {
            remote.access_token = Some(token);
        }

        Ok(Self {
            database_path,
            user_id,
            store,
            week_start,
            water_goal,
            config_file,
            remote,
            retry,
        })
    }

    /// Applies a `--user` flag on top of everything else
    pub fn with_user_override(mut self, user: Option<String>) -> Self {
        if let Some(user) = user {
            self.user_id = ConfigValue::new(Some(user), ConfigSource::Flag);
        }
        self
    }

    /// User id to scope store calls with.
    ///
    /// The local store is single-user and falls back to [`LOCAL_USER_ID`];
    /// the remote store has no session without an explicit user.
    pub fn effective_user_id(&self) -> Option<String> {
        match (&self.user_id.value, self.store.value) {
            (Some(user), _) => Some(user.clone()),
            (None, StoreKind::Local) => Some(LOCAL_USER_ID.to_string()),
            (None, StoreKind::Remote) => None,
        }
    }

    /// Default config directory (platform-specific):
    /// - Linux: ~/.config/moodmeal/
    /// - macOS: ~/Library/Application Support/moodmeal/
    /// - Windows: %APPDATA%/moodmeal/
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("moodmeal")
    }

    /// Default data directory (platform-specific):
    /// - Linux: ~/.local/share/moodmeal/
    /// - macOS: ~/Library/Application Support/moodmeal/
    /// - Windows: %APPDATA%/moodmeal/
    pub fn default_data_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("moodmeal")
    }

    /// Default config file path (platform-specific config dir + config.yaml)
    pub fn default_config_path() -> PathBuf {
        Self::default_config_dir().join("config.yaml")
    }
}

#[derive(Debug)]
pub enum ConfigError {
    ReadError(PathBuf, std::io::Error),
    ParseError(PathBuf, serde_yaml::Error),
    InvalidValue(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ReadError(path, e) => {
                write!(f, "Failed to read config file '{}': {}", path.display(), e)
            }
            ConfigError::ParseError(path, e) => {
                write!(f, "Failed to parse config file '{}': {}", path.display(), e)
            }
            ConfigError::InvalidValue(msg) => write!(f, "Invalid configuration: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}
