//! Configuration for the netwatch dashboard.
//!
//! Layered with figment: built-in defaults, then `config.toml` from the
//! platform config directory, then `NETWATCH_*` environment variables.
//! [`to_dashboard_config`] validates the result and produces the
//! `netwatch_core::DashboardConfig` the controller runs with.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use netwatch_core::{DashboardConfig, Ipv4Cidr, NetworkDef, default_networks};

const ENV_PREFIX: &str = "NETWATCH_";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

impl ConfigError {
    fn invalid(field: &str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// The on-disk configuration. Durations are whole seconds.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Monitor server base URL.
    pub server: String,
    /// Accept invalid TLS certificates.
    pub insecure: bool,
    /// HTTP request timeout.
    pub timeout: u64,
    /// Start with periodic monitor refresh on.
    pub auto_refresh: bool,
    pub refresh_interval: u64,
    /// Wait after requesting a rescan before re-reading devices.
    pub rescan_settle: u64,
    /// Open the live update socket.
    pub live_updates: bool,
    pub reconnect_delay: u64,
    /// Devices per request when walking the server's device listing.
    pub fetch_page_size: u32,
    /// Network tabs, in display order.
    pub networks: Vec<NetworkEntry>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: "http://127.0.0.1:8000".into(),
            insecure: false,
            timeout: 10,
            auto_refresh: true,
            refresh_interval: 30,
            rescan_settle: 2,
            live_updates: true,
            reconnect_delay: 3,
            fetch_page_size: 100,
            networks: default_networks()
                .into_iter()
                .map(|n| NetworkEntry {
                    label: n.label,
                    cidr: n.cidr.to_string(),
                })
                .collect(),
        }
    }
}

/// One `[[networks]]` table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct NetworkEntry {
    pub label: String,
    pub cidr: String,
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("dev", "netwatch", "netwatch").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("netwatch");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// The figment stack for `path`: defaults < TOML file < environment.
///
/// A missing file is not an error; the defaults apply.
pub fn figment(path: &Path) -> Figment {
    Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX))
}

/// Load the config from the canonical path + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load the config from `path` + environment.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    Ok(figment(path).extract()?)
}

/// Render `cfg` as TOML, e.g. to seed a config file.
pub fn to_toml(cfg: &Config) -> Result<String, ConfigError> {
    Ok(toml::to_string_pretty(cfg)?)
}

// ── Validation ──────────────────────────────────────────────────────

/// Validate `cfg` and build the controller's runtime config.
pub fn to_dashboard_config(cfg: &Config) -> Result<DashboardConfig, ConfigError> {
    let server: url::Url = cfg
        .server
        .parse()
        .map_err(|e| ConfigError::invalid("server", format!("invalid URL '{}': {e}", cfg.server)))?;
    if !matches!(server.scheme(), "http" | "https") {
        return Err(ConfigError::invalid(
            "server",
            format!("expected http or https, got '{}'", server.scheme()),
        ));
    }

    let mut dashboard = DashboardConfig::new(server);
    dashboard.insecure = cfg.insecure;
    dashboard.timeout = positive_secs("timeout", cfg.timeout)?;
    dashboard.auto_refresh = cfg.auto_refresh;
    dashboard.refresh_interval = positive_secs("refresh_interval", cfg.refresh_interval)?;
    dashboard.rescan_settle = Duration::from_secs(cfg.rescan_settle);
    dashboard.live_updates = cfg.live_updates;
    dashboard.reconnect_delay = positive_secs("reconnect_delay", cfg.reconnect_delay)?;

    if cfg.fetch_page_size == 0 {
        return Err(ConfigError::invalid("fetch_page_size", "must be at least 1"));
    }
    dashboard.fetch_page_size = cfg.fetch_page_size;
    dashboard.networks = networks(&cfg.networks)?;

    Ok(dashboard)
}

fn positive_secs(field: &str, secs: u64) -> Result<Duration, ConfigError> {
    if secs == 0 {
        return Err(ConfigError::invalid(field, "must be greater than 0"));
    }
    Ok(Duration::from_secs(secs))
}

fn networks(entries: &[NetworkEntry]) -> Result<Vec<NetworkDef>, ConfigError> {
    if entries.is_empty() {
        return Err(ConfigError::invalid("networks", "at least one network is required"));
    }

    let mut seen = HashSet::new();
    entries
        .iter()
        .map(|entry| {
            let label = entry.label.trim();
            if label.is_empty() {
                return Err(ConfigError::invalid("networks.label", "must not be empty"));
            }
            if !seen.insert(label.to_owned()) {
                return Err(ConfigError::invalid(
                    "networks.label",
                    format!("duplicate label '{label}'"),
                ));
            }
            let cidr: Ipv4Cidr = entry.cidr.parse().map_err(|e| {
                ConfigError::invalid("networks.cidr", format!("'{}': {e}", entry.cidr))
            })?;
            Ok(NetworkDef::new(label, cidr))
        })
        .collect()
}
