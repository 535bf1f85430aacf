// ── Runtime configuration ──
//
// The resolved settings the controller runs with. File and environment
// loading lives in netwatch-config; this is the validated result.

use std::time::Duration;

use url::Url;

use crate::model::{NetworkDef, default_networks};

/// Devices shown per page in the device table.
pub const DEVICES_PER_PAGE: usize = 5;

/// Settings for a [`Controller`](crate::Controller).
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    /// Monitor server base URL.
    pub server: Url,
    /// Accept invalid TLS certificates.
    pub insecure: bool,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Start with the periodic monitor refresh enabled.
    pub auto_refresh: bool,
    pub refresh_interval: Duration,
    /// Wait between requesting a rescan and re-reading devices.
    pub rescan_settle: Duration,
    /// Open the live update socket.
    pub live_updates: bool,
    pub reconnect_delay: Duration,
    /// Page size used when walking the server's device listing.
    pub fetch_page_size: u32,
    /// Network tabs, in display order. The first is selected at start.
    pub networks: Vec<NetworkDef>,
}

impl DashboardConfig {
    /// Defaults for everything but the server.
    pub fn new(server: Url) -> Self {
        Self {
            server,
            insecure: false,
            timeout: Duration::from_secs(10),
            auto_refresh: true,
            refresh_interval: Duration::from_secs(30),
            rescan_settle: Duration::from_secs(2),
            live_updates: true,
            reconnect_delay: Duration::from_secs(3),
            fetch_page_size: 100,
            networks: default_networks(),
        }
    }

    /// Label of the tab selected at start.
    pub fn initial_network(&self) -> &str {
        self.networks.first().map_or("2.4G", |n| n.label.as_str())
    }
}
