// ── Fetcher ──
//
// The seam between the controller and the monitor server. Production code
// uses `ApiFetcher` over `NetwatchClient`; tests substitute their own.

use std::future::Future;

use netwatch_api::{NetwatchClient, TlsMode, TransportConfig};

use crate::config::DashboardConfig;
use crate::error::FetchError;
use crate::model::{Device, MonitorResult};

/// One server-side page of the flat device list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DevicePage {
    pub items: Vec<Device>,
    pub total_count: u64,
    pub page: u32,
    pub page_size: u32,
}

/// Read access to the monitor server.
pub trait Fetcher: Send + Sync + 'static {
    /// Latest probe result for every monitor.
    fn fetch_monitors(&self) -> impl Future<Output = Result<Vec<MonitorResult>, FetchError>> + Send;

    /// One server-side page of the flat device list.
    ///
    /// The refresh cycle does not page through this: `/api/devices` has no
    /// per-network filter, so building a tab needs every device. It walks
    /// [`fetch_all_devices`](Self::fetch_all_devices) and paginates each
    /// group locally instead.
    fn fetch_devices(
        &self,
        page: u32,
        page_size: u32,
    ) -> impl Future<Output = Result<DevicePage, FetchError>> + Send;

    /// Every device, walking pages of `page_size`.
    fn fetch_all_devices(
        &self,
        page_size: u32,
    ) -> impl Future<Output = Result<Vec<Device>, FetchError>> + Send;

    /// Ask the server to start a background rescan.
    fn trigger_rescan(&self) -> impl Future<Output = Result<bool, FetchError>> + Send;
}

// ── ApiFetcher ───────────────────────────────────────────────────────

/// [`Fetcher`] backed by the REST client.
#[derive(Debug, Clone)]
pub struct ApiFetcher {
    client: NetwatchClient,
}

impl ApiFetcher {
    pub fn new(client: NetwatchClient) -> Self {
        Self { client }
    }

    /// Build the HTTP client from dashboard settings.
    pub fn from_config(config: &DashboardConfig) -> Result<Self, FetchError> {
        let tls = if config.insecure {
            TlsMode::DangerAcceptInvalid
        } else {
            TlsMode::System
        };
        let transport = TransportConfig::default()
            .with_tls(tls)
            .with_timeout(config.timeout);
        let client = NetwatchClient::new(config.server.as_str(), &transport)?;
        Ok(Self { client })
    }
}

impl Fetcher for ApiFetcher {
    async fn fetch_monitors(&self) -> Result<Vec<MonitorResult>, FetchError> {
        let raw = self.client.list_monitors().await?;
        Ok(raw.into_iter().map(MonitorResult::from).collect())
    }

    async fn fetch_devices(&self, page: u32, page_size: u32) -> Result<DevicePage, FetchError> {
        let resp = self.client.list_devices(page, page_size).await?;
        Ok(DevicePage {
            items: resp.devices.into_iter().map(Device::from).collect(),
            total_count: resp.total,
            page: resp.page,
            page_size: resp.per,
        })
    }

    async fn fetch_all_devices(&self, page_size: u32) -> Result<Vec<Device>, FetchError> {
        let raw = self.client.list_all_devices(page_size).await?;
        Ok(raw.into_iter().map(Device::from).collect())
    }

    async fn trigger_rescan(&self) -> Result<bool, FetchError> {
        Ok(self.client.trigger_rescan().await?)
    }
}
