//! Client configuration loaded from environment variables.
//!
//! Follows 12-factor style: all settings come from environment variables
//! (or a `.env` file via `dotenvy`).
//!
//! | Variable                   | Default           |
//! |----------------------------|-------------------|
//! | `MOI_HOST`                 | `localhost:21174` |
//! | `MOI_PATH`                 | `/moi-ws/`        |
//! | `MOI_PAGE_SCHEME`          | `http`            |
//! | `MOI_GROUP_ID`             | unset (all)       |
//! | `MOI_RESYNC_INTERVAL_SECS` | `15` (`0` = off, capped at one day) |
//! | `MOI_LOG_FORMAT`           | `text`            |

use std::time::Duration;

use crate::error::ChannelError;
use crate::protocol::{RecordId, Scope};
use crate::transport::{Endpoint, Security};

/// Default seconds between full resynchronizations.
pub const DEFAULT_RESYNC_INTERVAL_SECS: u64 = 15;

/// Longest accepted resync period; larger values are capped to it.
pub const MAX_RESYNC_INTERVAL_SECS: u64 = 24 * 60 * 60;

/// Log output format for the `moi-watch` binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

/// Top-level client configuration.
///
/// Loaded once at startup via [`ClientConfig::from_env`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server `host[:port]`, without scheme.
    pub host: String,

    /// WebSocket path on the server.
    pub path: String,

    /// Security of the page the client acts for; selects `ws` or `wss`.
    pub security: Security,

    /// Group to scope records to. `None` fetches everything the caller owns.
    pub group_id: Option<RecordId>,

    /// Period of the resync timer. `None` disables it.
    pub resync_interval: Option<Duration>,

    /// Log output format.
    pub log_format: LogFormat,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: "localhost:21174".to_string(),
            path: "/moi-ws/".to_string(),
            security: Security::Plain,
            group_id: None,
            resync_interval: Some(Duration::from_secs(DEFAULT_RESYNC_INTERVAL_SECS)),
            log_format: LogFormat::Text,
        }
    }
}

impl ClientConfig {
    /// Loads configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv().ok()` to optionally load a `.env` file.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::InvalidConfig`] if `MOI_HOST` is empty or
    /// carries a scheme.
    pub fn from_env() -> Result<Self, ChannelError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a configuration from an arbitrary key lookup.
    ///
    /// Unparseable numbers fall back to their defaults. A resync interval
    /// above [`MAX_RESYNC_INTERVAL_SECS`] is capped.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::InvalidConfig`] if the host is empty or
    /// carries a scheme.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ChannelError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let host = lookup("MOI_HOST").unwrap_or(defaults.host);
        let host = host.trim().trim_end_matches('/').to_string();
        if host.is_empty() {
            return Err(ChannelError::InvalidConfig("MOI_HOST is empty".to_string()));
        }
        if host.contains("://") {
            return Err(ChannelError::InvalidConfig(format!(
                "MOI_HOST must not include a scheme: {host}"
            )));
        }

        let path = lookup("MOI_PATH").unwrap_or(defaults.path);
        let security = lookup("MOI_PAGE_SCHEME")
            .map_or(defaults.security, |s| Security::from_page_scheme(&s));

        let group_id = lookup("MOI_GROUP_ID")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .map(RecordId::new);

        let resync_secs = parse_value(
            lookup("MOI_RESYNC_INTERVAL_SECS"),
            DEFAULT_RESYNC_INTERVAL_SECS,
        );
        if resync_secs > MAX_RESYNC_INTERVAL_SECS {
            tracing::warn!(
                requested = resync_secs,
                max = MAX_RESYNC_INTERVAL_SECS,
                "MOI_RESYNC_INTERVAL_SECS too large, capping"
            );
        }
        let resync_secs = resync_secs.min(MAX_RESYNC_INTERVAL_SECS);
        let resync_interval = (resync_secs > 0).then(|| Duration::from_secs(resync_secs));

        let log_format = match lookup("MOI_LOG_FORMAT").as_deref() {
            Some("json") | Some("JSON") => LogFormat::Json,
            _ => LogFormat::Text,
        };

        Ok(Self {
            host,
            path,
            security,
            group_id,
            resync_interval,
            log_format,
        })
    }

    /// The channel endpoint described by this configuration.
    #[must_use]
    pub fn endpoint(&self) -> Endpoint {
        Endpoint::new(self.host.clone(), self.path.clone(), self.security)
    }

    /// The record scope described by this configuration.
    #[must_use]
    pub fn scope(&self) -> Scope {
        Scope::from_group(self.group_id.clone())
    }
}

/// Parses `raw` as `T`, returning `default` on missing or invalid values.
fn parse_value<T: std::str::FromStr>(raw: Option<String>, default: T) -> T {
    raw.and_then(|v| v.trim().parse().ok()).unwrap_or(default)
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<ClientConfig, ChannelError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        ClientConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        let Ok(config) = load(&[]) else {
            panic!("defaults should load");
        };
        assert_eq!(config.endpoint().url(), "ws://localhost:21174/moi-ws/");
        assert_eq!(config.scope(), Scope::All);
        assert_eq!(config.resync_interval, Some(Duration::from_secs(15)));
        assert_eq!(config.log_format, LogFormat::Text);
    }

    #[test]
    fn https_page_selects_wss() {
        let Ok(config) = load(&[
            ("MOI_HOST", "qiita.example.org"),
            ("MOI_PAGE_SCHEME", "https"),
        ]) else {
            panic!("config should load");
        };
        assert_eq!(config.endpoint().url(), "wss://qiita.example.org/moi-ws/");
    }

    #[test]
    fn group_id_scopes_records() {
        let Ok(config) = load(&[("MOI_GROUP_ID", " 42 ")]) else {
            panic!("config should load");
        };
        assert_eq!(config.scope(), Scope::Group(RecordId::new("42")));

        let Ok(config) = load(&[("MOI_GROUP_ID", "")]) else {
            panic!("config should load");
        };
        assert_eq!(config.scope(), Scope::All);
    }

    #[test]
    fn zero_interval_disables_resync() {
        let Ok(config) = load(&[("MOI_RESYNC_INTERVAL_SECS", "0")]) else {
            panic!("config should load");
        };
        assert_eq!(config.resync_interval, None);
    }

    #[test]
    fn invalid_interval_falls_back() {
        let Ok(config) = load(&[("MOI_RESYNC_INTERVAL_SECS", "soon")]) else {
            panic!("config should load");
        };
        assert_eq!(config.resync_interval, Some(Duration::from_secs(15)));
    }

    #[test]
    fn huge_interval_is_capped() {
        let Ok(config) = load(&[("MOI_RESYNC_INTERVAL_SECS", "18446744073709551615")]) else {
            panic!("config should load");
        };
        assert_eq!(
            config.resync_interval,
            Some(Duration::from_secs(MAX_RESYNC_INTERVAL_SECS))
        );
    }

    #[test]
    fn host_with_scheme_is_rejected() {
        let result = load(&[("MOI_HOST", "ws://localhost")]);
        assert!(matches!(result, Err(ChannelError::InvalidConfig(_))));
    }

    #[test]
    fn empty_host_is_rejected() {
        let result = load(&[("MOI_HOST", "  ")]);
        assert!(matches!(result, Err(ChannelError::InvalidConfig(_))));
    }

    #[test]
    fn json_log_format() {
        let Ok(config) = load(&[("MOI_LOG_FORMAT", "json")]) else {
            panic!("config should load");
        };
        assert_eq!(config.log_format, LogFormat::Json);
    }
}
