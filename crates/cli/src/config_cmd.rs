use anyhow::Result;
use callboard_runtime_config::{load_config_from, save_config_to, CallboardConfig};

use crate::context::Context;

/// Fields `callboard config` can set.
#[derive(Debug, Default)]
pub struct ConfigUpdate {
    pub server: Option<String>,
    pub pusher_key: Option<String>,
    pub pusher_cluster: Option<String>,
    pub pusher_auth: Option<String>,
}

impl ConfigUpdate {
    pub fn is_empty(&self) -> bool {
        self.server.is_none()
            && self.pusher_key.is_none()
            && self.pusher_cluster.is_none()
            && self.pusher_auth.is_none()
    }

    fn apply(self, config: &mut CallboardConfig) {
        if let Some(url) = self.server {
            config.server.url = url.trim().trim_end_matches('/').to_string();
        }
        if let Some(key) = self.pusher_key {
            config.realtime.app_key = key;
        }
        if let Some(cluster) = self.pusher_cluster {
            config.realtime.cluster = cluster;
        }
        if let Some(endpoint) = self.pusher_auth {
            config.realtime.auth_endpoint = endpoint;
        }
    }
}

fn or_unset(value: &str) -> &str {
    if value.is_empty() { "(not set)" } else { value }
}

/// Print the effective configuration (file plus environment overrides).
pub fn show_config() -> Result<()> {
    let ctx = Context::load()?;
    let config = &ctx.config;
    println!("Config file: {}", ctx.config_path.display());
    println!("Session:     {}", ctx.session_path.display());
    println!();
    println!("[server]");
    println!("  url          = {}", or_unset(&config.server.url));
    println!("  timeout_secs = {}", config.server.timeout_secs);
    println!();
    println!("[realtime]");
    println!("  enabled       = {}", config.realtime.enabled);
    println!("  app_key       = {}", or_unset(&config.realtime.app_key));
    println!("  cluster       = {}", or_unset(&config.realtime.cluster));
    println!("  auth_endpoint = {}", or_unset(&config.realtime.auth_endpoint));
    println!("  channel       = {}", config.realtime.channel);
    println!("  event         = {}", config.realtime.event);
    println!();
    println!("[auth]");
    println!(
        "  keep_refresh_token_on_failure = {}",
        config.auth.keep_refresh_token_on_failure
    );
    println!("  session_max_age_secs = {}", config.auth.session_max_age_secs);
    println!("  early_skew_ms        = {}", config.auth.early_skew_ms);
    println!("  min_delay_ms         = {}", config.auth.min_delay_ms);
    println!();
    println!("[list]");
    println!("  per_page = {}", config.list.per_page);
    Ok(())
}

/// Update the config file with the provided values. Environment overrides
/// are not written back.
pub fn set_config(update: ConfigUpdate) -> Result<()> {
    let path = callboard_runtime_config::config_path()?;
    let mut config = load_config_from(&path)?;
    update.apply(&mut config);
    save_config_to(&path, &config)?;
    println!("Config saved to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_only_touches_given_fields() {
        let mut config = CallboardConfig::default();
        config.realtime.cluster = "eu".into();

        ConfigUpdate {
            server: Some(" https://api.example.com/ ".into()),
            pusher_key: Some("key123".into()),
            ..ConfigUpdate::default()
        }
        .apply(&mut config);

        assert_eq!(config.server.url, "https://api.example.com");
        assert_eq!(config.realtime.app_key, "key123");
        assert_eq!(config.realtime.cluster, "eu");
        assert_eq!(config.realtime.channel, "private-aircall");
    }

    #[test]
    fn saved_update_round_trips_through_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("callboard.toml");

        let mut config = load_config_from(&path).expect("defaults");
        ConfigUpdate {
            pusher_auth: Some("https://api.example.com/pusher/auth".into()),
            ..ConfigUpdate::default()
        }
        .apply(&mut config);
        save_config_to(&path, &config).expect("save");

        let reloaded = load_config_from(&path).expect("reload");
        assert_eq!(
            reloaded.realtime.auth_endpoint,
            "https://api.example.com/pusher/auth"
        );
        assert_eq!(reloaded.list.per_page, 10);
    }
}
