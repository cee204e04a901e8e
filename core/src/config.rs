//! Configuration
//!
//! Layered configuration for the chat client, loaded from (highest first):
//! 1. CLI arguments (applied by the caller through [`ConfigOverrides`])
//! 2. Environment variables
//! 3. TOML file at `$XDG_CONFIG_HOME/delphi-chat/config.toml`
//! 4. Defaults
//!
//! # Example Configuration
//!
//! ```toml
//! [backend]
//! base_url = "https://delphiback.onrender.com"
//! slug = "wwwpanalitixcom"
//! clone_name = "Deepak Kumar"
//! clone_title = "Cofounder of Delphi"
//! request_timeout_secs = 120
//! retry_attempts = 1
//! retry_backoff_ms = 500
//!
//! [quota]
//! free_message_limit = 2
//!
//! [store]
//! path = "/home/me/.local/share/delphi-chat/conversations.json"
//!
//! [[users]]
//! name = "Avtar"
//! email = "avtar@iotasol.com"
//! program_type = "Free"
//! ```

use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::client::{ClientConfig, RetryPolicy};
use crate::users::{demo_users, User};

/// Hosted Delphi backend
pub const DEFAULT_BASE_URL: &str = "https://delphiback.onrender.com";

/// Application slug the conversations are created under
pub const DEFAULT_SLUG: &str = "wwwpanalitixcom";

/// Name of the clone shown in the header
pub const DEFAULT_CLONE_NAME: &str = "Deepak Kumar";

/// Title under the clone's name
pub const DEFAULT_CLONE_TITLE: &str = "Cofounder of Delphi";

/// User messages a Free-tier user may send per conversation
pub const DEFAULT_FREE_MESSAGE_LIMIT: usize = 2;

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur when loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file at {path}: {source}")]
    Read {
        /// The path that was attempted
        path: PathBuf,
        /// The underlying IO error
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("Failed to parse TOML config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Tracks where the effective configuration came from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Command-line argument
    Cli,
    /// Environment variable
    Env,
    /// TOML configuration file
    File,
    /// Default value
    Default,
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cli => write!(f, "CLI"),
            Self::Env => write!(f, "environment"),
            Self::File => write!(f, "config file"),
            Self::Default => write!(f, "default"),
        }
    }
}

// =============================================================================
// TOML Configuration Structures
// =============================================================================

/// `[backend]` section
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendToml {
    /// Backend base URL
    pub base_url: Option<String>,
    /// Application slug
    pub slug: Option<String>,
    /// Display name of the clone
    pub clone_name: Option<String>,
    /// Display title of the clone
    pub clone_title: Option<String>,
    /// Per-request timeout in seconds
    pub request_timeout_secs: Option<u64>,
    /// Total attempts per remote call
    pub retry_attempts: Option<u32>,
    /// Pause between attempts in milliseconds
    pub retry_backoff_ms: Option<u64>,
}

/// `[quota]` section
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct QuotaToml {
    /// Free-tier message cap
    pub free_message_limit: Option<usize>,
}

/// `[store]` section
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreToml {
    /// Conversation store file
    pub path: Option<PathBuf>,
}

/// Top-level TOML file
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatToml {
    /// Backend section
    pub backend: BackendToml,
    /// Quota section
    pub quota: QuotaToml,
    /// Store section
    pub store: StoreToml,
    /// Replacement roster
    pub users: Option<Vec<User>>,
}

// =============================================================================
// Effective Configuration
// =============================================================================

/// Effective configuration for a chat session
#[derive(Clone, Debug)]
pub struct ChatConfig {
    /// Backend base URL, no trailing slash
    pub base_url: String,
    /// Application slug
    pub slug: String,
    /// Display name of the clone
    pub clone_name: String,
    /// Display title of the clone (may be empty)
    pub clone_title: String,
    /// Per-request timeout
    pub request_timeout: Duration,
    /// Retry policy for all remote calls
    pub retry: RetryPolicy,
    /// Free-tier message cap
    pub free_message_limit: usize,
    /// Conversation store file (None = in-memory only)
    pub store_path: Option<PathBuf>,
    /// Selectable users
    pub users: Vec<User>,
    /// Config file that was loaded, if any
    pub config_file_path: Option<PathBuf>,
    source: ConfigSource,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            slug: DEFAULT_SLUG.to_string(),
            clone_name: DEFAULT_CLONE_NAME.to_string(),
            clone_title: DEFAULT_CLONE_TITLE.to_string(),
            request_timeout: Duration::from_secs(120),
            retry: RetryPolicy::default(),
            free_message_limit: DEFAULT_FREE_MESSAGE_LIMIT,
            store_path: crate::store::FileStore::default_path(),
            users: demo_users(),
            config_file_path: None,
            source: ConfigSource::Default,
        }
    }
}

impl ChatConfig {
    /// Where the effective values came from
    #[must_use]
    pub fn source(&self) -> ConfigSource {
        self.source
    }

    /// Settings for [`crate::client::DelphiClient`]
    #[must_use]
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            base_url: self.base_url.clone(),
            timeout: self.request_timeout,
            retry: self.retry,
        }
    }

    /// Check values that would break the session at runtime
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(ConfigError::Invalid(format!(
                "base_url must be an http(s) URL, got {:?}",
                self.base_url
            )));
        }
        if self.slug.trim().is_empty() {
            return Err(ConfigError::Invalid("slug must not be empty".into()));
        }
        if self.request_timeout.is_zero() {
            return Err(ConfigError::Invalid("request timeout must be > 0".into()));
        }
        if self.retry.attempts == 0 {
            return Err(ConfigError::Invalid("retry_attempts must be >= 1".into()));
        }
        if self.users.is_empty() {
            return Err(ConfigError::Invalid("user roster is empty".into()));
        }

        let mut seen = HashSet::new();
        for user in &self.users {
            if user.email.trim().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "user {:?} has no email",
                    user.name
                )));
            }
            if !seen.insert(user.email.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate user email {:?}",
                    user.email
                )));
            }
        }
        Ok(())
    }
}

// =============================================================================
// Configuration Loading
// =============================================================================

/// Default config file: `$XDG_CONFIG_HOME/delphi-chat/config.toml`
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("delphi-chat").join("config.toml"))
}

/// Load configuration from the default path and the process environment
///
/// A missing config file is not an error.
pub fn load_config() -> Result<ChatConfig, ConfigError> {
    load_config_from_path(default_config_path())
}

/// Load configuration from a specific file and the process environment
pub fn load_config_from_path(path: Option<PathBuf>) -> Result<ChatConfig, ConfigError> {
    load_config_with_env(path, |key| std::env::var(key).ok())
}

/// Load configuration with an explicit environment lookup
pub fn load_config_with_env<F>(path: Option<PathBuf>, env: F) -> Result<ChatConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = ChatConfig::default();

    if let Some(ref config_path) = path {
        if config_path.exists() {
            let content =
                std::fs::read_to_string(config_path).map_err(|source| ConfigError::Read {
                    path: config_path.clone(),
                    source,
                })?;

            let parsed: ChatToml = toml::from_str(&content)?;
            apply_toml_config(&mut config, parsed);
            config.config_file_path = Some(config_path.clone());
            config.source = ConfigSource::File;

            tracing::info!(path = %config_path.display(), "Loaded configuration from file");
        } else {
            tracing::debug!(
                path = %config_path.display(),
                "Config file not found, using defaults"
            );
        }
    }

    apply_env_config(&mut config, env);
    config.base_url = config.base_url.trim_end_matches('/').to_string();
    Ok(config)
}

fn apply_toml_config(config: &mut ChatConfig, toml: ChatToml) {
    if let Some(url) = toml.backend.base_url {
        config.base_url = url;
    }
    if let Some(slug) = toml.backend.slug {
        config.slug = slug;
    }
    if let Some(name) = toml.backend.clone_name {
        config.clone_name = name;
    }
    if let Some(title) = toml.backend.clone_title {
        config.clone_title = title;
    }
    if let Some(secs) = toml.backend.request_timeout_secs {
        config.request_timeout = Duration::from_secs(secs);
    }
    if let Some(attempts) = toml.backend.retry_attempts {
        config.retry.attempts = attempts;
    }
    if let Some(ms) = toml.backend.retry_backoff_ms {
        config.retry.backoff = Duration::from_millis(ms);
    }
    if let Some(limit) = toml.quota.free_message_limit {
        config.free_message_limit = limit;
    }
    if let Some(path) = toml.store.path {
        config.store_path = Some(path);
    }
    if let Some(users) = toml.users {
        config.users = users;
    }
}

fn apply_env_config<F>(config: &mut ChatConfig, env: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(url) = env("DELPHI_BASE_URL") {
        config.base_url = url;
        config.source = ConfigSource::Env;
    }
    if let Some(slug) = env("DELPHI_SLUG") {
        config.slug = slug;
        config.source = ConfigSource::Env;
    }
    if let Some(secs) = env("DELPHI_TIMEOUT_SECS").and_then(|v| v.parse::<u64>().ok()) {
        config.request_timeout = Duration::from_secs(secs);
        config.source = ConfigSource::Env;
    }
    if let Some(attempts) = env("DELPHI_RETRY_ATTEMPTS").and_then(|v| v.parse::<u32>().ok()) {
        config.retry.attempts = attempts;
        config.source = ConfigSource::Env;
    }
    if let Some(path) = env("DELPHI_STORE_PATH") {
        config.store_path = Some(PathBuf::from(path));
        config.source = ConfigSource::Env;
    }
    if let Some(limit) = env("DELPHI_FREE_LIMIT").and_then(|v| v.parse::<usize>().ok()) {
        config.free_message_limit = limit;
        config.source = ConfigSource::Env;
    }
}

// =============================================================================
// CLI Override Support
// =============================================================================

/// Command-line overrides, applied after [`load_config`]
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    /// Base URL override
    pub base_url: Option<String>,
    /// Slug override
    pub slug: Option<String>,
    /// Store path override
    pub store_path: Option<PathBuf>,
    /// Keep conversations in memory only
    pub no_persist: bool,
}

impl ConfigOverrides {
    /// Create an empty set of overrides
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set base URL override
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set slug override
    #[must_use]
    pub fn with_slug(mut self, slug: impl Into<String>) -> Self {
        self.slug = Some(slug.into());
        self
    }

    /// Set store path override
    #[must_use]
    pub fn with_store_path(mut self, path: PathBuf) -> Self {
        self.store_path = Some(path);
        self
    }

    /// Disable the conversation file
    #[must_use]
    pub fn with_no_persist(mut self) -> Self {
        self.no_persist = true;
        self
    }

    /// Apply overrides to a configuration
    pub fn apply(&self, config: &mut ChatConfig) {
        if self.base_url.is_some()
            || self.slug.is_some()
            || self.store_path.is_some()
            || self.no_persist
        {
            config.source = ConfigSource::Cli;
        }
        if let Some(ref url) = self.base_url {
            config.base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(ref slug) = self.slug {
            config.slug = slug.clone();
        }
        if let Some(ref path) = self.store_path {
            config.store_path = Some(path.clone());
        }
        if self.no_persist {
            config.store_path = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    use pretty_assertions::assert_eq;
    use tempfile::NamedTempFile;

    use crate::users::ProgramType;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn write_toml(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_default_config() {
        let config = ChatConfig::default();
        assert_eq!(config.base_url, "https://delphiback.onrender.com");
        assert_eq!(config.slug, "wwwpanalitixcom");
        assert_eq!(config.free_message_limit, 2);
        assert_eq!(config.retry.attempts, 1);
        assert_eq!(config.users.len(), 3);
        assert_eq!(config.source(), ConfigSource::Default);
        config.validate().unwrap();
    }

    #[test]
    fn test_parse_valid_toml() {
        let file = write_toml(
            r#"
[backend]
base_url = "http://localhost:8080/"
slug = "acme"
clone_name = "Ada"
clone_title = ""
request_timeout_secs = 5
retry_attempts = 3
retry_backoff_ms = 10

[quota]
free_message_limit = 4

[store]
path = "/tmp/convs.json"

[[users]]
name = "Solo"
email = "solo@example.com"
program_type = "Accelerate"
"#,
        );

        let config = load_config_with_env(Some(file.path().to_path_buf()), no_env).unwrap();

        assert_eq!(config.base_url, "http://localhost:8080");
        assert_eq!(config.slug, "acme");
        assert_eq!(config.clone_name, "Ada");
        assert_eq!(config.clone_title, "");
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert_eq!(config.retry.attempts, 3);
        assert_eq!(config.retry.backoff, Duration::from_millis(10));
        assert_eq!(config.free_message_limit, 4);
        assert_eq!(config.store_path, Some(PathBuf::from("/tmp/convs.json")));
        assert_eq!(config.users.len(), 1);
        assert_eq!(config.users[0].program_type, ProgramType::Accelerate);
        assert_eq!(config.source(), ConfigSource::File);
        assert_eq!(config.config_file_path, Some(file.path().to_path_buf()));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let file = write_toml("[backend]\nslug = \"other\"\n");
        let config = load_config_with_env(Some(file.path().to_path_buf()), no_env).unwrap();

        assert_eq!(config.slug, "other");
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.clone_name, DEFAULT_CLONE_NAME);
        assert_eq!(config.clone_title, DEFAULT_CLONE_TITLE);
        assert_eq!(config.users, demo_users());
    }

    #[test]
    fn test_missing_file_graceful() {
        let config =
            load_config_with_env(Some(PathBuf::from("/nonexistent/delphi.toml")), no_env).unwrap();
        assert_eq!(config.source(), ConfigSource::Default);
        assert!(config.config_file_path.is_none());
    }

    #[test]
    fn test_malformed_toml_error() {
        let file = write_toml("[backend\nslug = ");
        let err = load_config_with_env(Some(file.path().to_path_buf()), no_env).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_env_overrides_file() {
        let file = write_toml("[backend]\nslug = \"from-file\"\n");
        let env = env_from(&[
            ("DELPHI_SLUG", "from-env"),
            ("DELPHI_FREE_LIMIT", "5"),
            ("DELPHI_TIMEOUT_SECS", "not-a-number"),
        ]);

        let config = load_config_with_env(Some(file.path().to_path_buf()), env).unwrap();

        assert_eq!(config.slug, "from-env");
        assert_eq!(config.free_message_limit, 5);
        assert_eq!(config.request_timeout, Duration::from_secs(120));
        assert_eq!(config.source(), ConfigSource::Env);
    }

    #[test]
    fn test_cli_overrides_env() {
        let env = env_from(&[("DELPHI_BASE_URL", "http://env.example")]);
        let mut config = load_config_with_env(None, env).unwrap();

        ConfigOverrides::new()
            .with_base_url("http://cli.example/")
            .apply(&mut config);

        assert_eq!(config.base_url, "http://cli.example");
        assert_eq!(config.source(), ConfigSource::Cli);
    }

    #[test]
    fn test_empty_overrides_no_change() {
        let mut config = ChatConfig::default();
        ConfigOverrides::new().apply(&mut config);
        assert_eq!(config.source(), ConfigSource::Default);
    }

    #[test]
    fn test_no_persist_wins_over_store_path() {
        let mut config = ChatConfig::default();
        ConfigOverrides::new()
            .with_store_path(PathBuf::from("/tmp/x.json"))
            .with_no_persist()
            .apply(&mut config);
        assert_eq!(config.store_path, None);
    }

    #[test]
    fn test_validation() {
        let mut config = ChatConfig::default();
        config.base_url = "ftp://nope".into();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = ChatConfig::default();
        config.retry.attempts = 0;
        assert!(config.validate().is_err());

        let mut config = ChatConfig::default();
        config.users.push(config.users[0].clone());
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("duplicate user email"));

        let mut config = ChatConfig::default();
        config.users.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_client_config() {
        let config = ChatConfig::default();
        let client = config.client_config();
        assert_eq!(client.base_url, config.base_url);
        assert_eq!(client.timeout, Duration::from_secs(120));
    }

    #[test]
    fn test_config_source_display() {
        assert_eq!(ConfigSource::Cli.to_string(), "CLI");
        assert_eq!(ConfigSource::Env.to_string(), "environment");
        assert_eq!(ConfigSource::File.to_string(), "config file");
        assert_eq!(ConfigSource::Default.to_string(), "default");
    }
}
