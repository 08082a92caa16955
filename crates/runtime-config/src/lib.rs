//! Shared client configuration types.
//!
//! The CLI and the background runtime both read `callboard.toml` through
//! these types. Every field has a serde default, so a missing or partial
//! file still yields a usable configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Canonical config file name.
pub const CONFIG_FILE_NAME: &str = "callboard.toml";
/// Persisted session file, stored next to the config file.
pub const SESSION_FILE_NAME: &str = "session.json";
/// Overrides the config file location.
pub const CONFIG_PATH_ENV: &str = "CALLBOARD_CONFIG";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not determine a config directory")]
    NoConfigDir,

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Top-level configuration (persisted as `callboard.toml`).
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct CallboardConfig {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub realtime: RealtimeSettings,
    #[serde(default)]
    pub auth: AuthSettings,
    #[serde(default)]
    pub list: ListSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerSettings {
    /// API base URL; endpoints are appended directly (`{url}/calls`).
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            url: String::new(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Push channel settings (Pusher protocol).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RealtimeSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub app_key: String,
    #[serde(default)]
    pub cluster: String,
    /// Endpoint that signs private channel subscriptions.
    #[serde(default)]
    pub auth_endpoint: String,
    #[serde(default = "default_channel")]
    pub channel: String,
    #[serde(default = "default_event")]
    pub event: String,
}

impl Default for RealtimeSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            app_key: String::new(),
            cluster: String::new(),
            auth_endpoint: String::new(),
            channel: default_channel(),
            event: default_event(),
        }
    }
}

impl RealtimeSettings {
    /// True when enough is configured to open the channel.
    pub fn is_configured(&self) -> bool {
        self.enabled
            && !self.app_key.is_empty()
            && !self.cluster.is_empty()
            && !self.auth_endpoint.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuthSettings {
    /// Keep the refresh token when a refresh fails so the user can retry.
    #[serde(default = "default_true")]
    pub keep_refresh_token_on_failure: bool,
    /// Lifetime of the persisted access token.
    #[serde(default = "default_session_max_age_secs")]
    pub session_max_age_secs: u64,
    /// Refresh this long before the access token expires.
    #[serde(default = "default_early_skew_ms")]
    pub early_skew_ms: u64,
    /// Never arm the refresh timer shorter than this.
    #[serde(default = "default_min_delay_ms")]
    pub min_delay_ms: u64,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            keep_refresh_token_on_failure: true,
            session_max_age_secs: default_session_max_age_secs(),
            early_skew_ms: default_early_skew_ms(),
            min_delay_ms: default_min_delay_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ListSettings {
    #[serde(default = "default_per_page")]
    pub per_page: u32,
}

impl Default for ListSettings {
    fn default() -> Self {
        Self {
            per_page: default_per_page(),
        }
    }
}

// ── Serde default functions ─────────────────────────────────────────────

fn default_true() -> bool {
    true
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_channel() -> String {
    "private-aircall".to_string()
}
fn default_event() -> String {
    "update-call".to_string()
}
fn default_session_max_age_secs() -> u64 {
    9 * 60
}
fn default_early_skew_ms() -> u64 {
    10_000
}
fn default_min_delay_ms() -> u64 {
    5_000
}
fn default_per_page() -> u32 {
    10
}

// ── Locations ───────────────────────────────────────────────────────────

/// Platform config directory (e.g. `~/.config/callboard`).
pub fn config_dir() -> Result<PathBuf> {
    directories::ProjectDirs::from("io", "callboard", "callboard")
        .map(|dirs| dirs.config_dir().to_path_buf())
        .ok_or(ConfigError::NoConfigDir)
}

/// Config file path, honouring `CALLBOARD_CONFIG`.
pub fn config_path() -> Result<PathBuf> {
    match std::env::var_os(CONFIG_PATH_ENV) {
        Some(path) if !path.is_empty() => Ok(PathBuf::from(path)),
        _ => Ok(config_dir()?.join(CONFIG_FILE_NAME)),
    }
}

/// Session file stored alongside the config file.
pub fn session_path_for(config_path: &Path) -> PathBuf {
    config_path
        .parent()
        .map(|dir| dir.join(SESSION_FILE_NAME))
        .unwrap_or_else(|| PathBuf::from(SESSION_FILE_NAME))
}

// ── Load / save ─────────────────────────────────────────────────────────

/// Read a config file. A missing file yields the defaults.
pub fn load_config_from(path: &Path) -> Result<CallboardConfig> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Ok(CallboardConfig::default());
        }
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Load the config from its default location and apply environment
/// overrides.
pub fn load_config() -> Result<CallboardConfig> {
    let mut config = load_config_from(&config_path()?)?;
    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    Ok(config)
}

pub fn save_config_to(path: &Path, config: &CallboardConfig) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|source| ConfigError::Write {
            path: dir.to_path_buf(),
            source,
        })?;
    }
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// Environment variables that replace config fields when set and non-empty.
pub const ENV_API_BASE_URL: &str = "CALLBOARD_API_BASE_URL";
pub const ENV_PUSHER_KEY: &str = "CALLBOARD_PUSHER_KEY";
pub const ENV_PUSHER_CLUSTER: &str = "CALLBOARD_PUSHER_CLUSTER";
pub const ENV_PUSHER_AUTH: &str = "CALLBOARD_PUSHER_AUTH";

/// Apply environment overrides through `lookup`.
/// Returns true when any field was updated.
pub fn apply_env_overrides(
    config: &mut CallboardConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> bool {
    let mut changed = false;
    let targets: [(&str, &mut String); 4] = [
        (ENV_API_BASE_URL, &mut config.server.url),
        (ENV_PUSHER_KEY, &mut config.realtime.app_key),
        (ENV_PUSHER_CLUSTER, &mut config.realtime.cluster),
        (ENV_PUSHER_AUTH, &mut config.realtime.auth_endpoint),
    ];
    for (key, field) in targets {
        if let Some(value) = lookup(key).filter(|v| !v.trim().is_empty()) {
            *field = value;
            changed = true;
        }
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_fills_defaults() {
        let cfg: CallboardConfig = toml::from_str(
            r#"
[server]
url = "https://api.example.com"

[auth]
keep_refresh_token_on_failure = false
"#,
        )
        .expect("parse toml");

        assert_eq!(cfg.server.url, "https://api.example.com");
        assert_eq!(cfg.server.timeout_secs, 30);
        assert!(!cfg.auth.keep_refresh_token_on_failure);
        assert_eq!(cfg.auth.early_skew_ms, 10_000);
        assert_eq!(cfg.auth.min_delay_ms, 5_000);
        assert_eq!(cfg.auth.session_max_age_secs, 540);
        assert_eq!(cfg.realtime.channel, "private-aircall");
        assert_eq!(cfg.realtime.event, "update-call");
        assert_eq!(cfg.list.per_page, 10);
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cfg = load_config_from(&dir.path().join("absent.toml")).expect("load");
        assert_eq!(cfg, CallboardConfig::default());
    }

    #[test]
    fn save_then_load_keeps_values() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join(CONFIG_FILE_NAME);
        let mut cfg = CallboardConfig::default();
        cfg.server.url = "http://localhost:4000".into();
        cfg.list.per_page = 25;

        save_config_to(&path, &cfg).expect("save");
        assert_eq!(load_config_from(&path).expect("load"), cfg);
        assert_eq!(
            session_path_for(&path),
            dir.path().join("nested").join(SESSION_FILE_NAME)
        );
    }

    #[test]
    fn invalid_file_reports_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "[server\nurl = 1").expect("write");
        let err = load_config_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn env_overrides_replace_non_empty_values() {
        let mut cfg = CallboardConfig::default();
        let changed = apply_env_overrides(&mut cfg, |key| match key {
            ENV_API_BASE_URL => Some("https://calls.example.com".to_string()),
            ENV_PUSHER_KEY => Some("  ".to_string()),
            ENV_PUSHER_CLUSTER => Some("eu".to_string()),
            _ => None,
        });

        assert!(changed);
        assert_eq!(cfg.server.url, "https://calls.example.com");
        assert_eq!(cfg.realtime.app_key, "");
        assert_eq!(cfg.realtime.cluster, "eu");
        assert!(!cfg.realtime.is_configured());
    }
}
