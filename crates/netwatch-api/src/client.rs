// Async HTTP client for the monitor server's REST endpoints.
//
// Base path: /api/
// No authentication; the server is expected on a trusted LAN.

use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::Error;
use crate::models::{
    DevicePageResponse, DeviceRecord, MonitorResult, MonitorsResponse, RescanResponse,
};
use crate::transport::TransportConfig;

// ── Client ───────────────────────────────────────────────────────────

/// Async client for the monitor server.
///
/// Cheap to clone: the inner `reqwest::Client` is reference counted.
#[derive(Debug, Clone)]
pub struct NetwatchClient {
    http: reqwest::Client,
    base_url: Url,
}

impl NetwatchClient {
    // ── Constructors ─────────────────────────────────────────────────

    /// Build a client for `base_url` using the given transport settings.
    pub fn new(base_url: &str, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Self::from_reqwest(base_url, http)
    }

    /// Wrap an existing `reqwest::Client`.
    pub fn from_reqwest(base_url: &str, http: reqwest::Client) -> Result<Self, Error> {
        let base_url = Self::normalize_base_url(base_url)?;
        Ok(Self { http, base_url })
    }

    /// Ensure the base path ends with `/` so relative joins append.
    fn normalize_base_url(raw: &str) -> Result<Url, Error> {
        let mut url = Url::parse(raw)?;
        let path = url.path().trim_end_matches('/').to_owned();
        url.set_path(&format!("{path}/"));
        Ok(url)
    }

    /// The server base URL (always ends with `/`).
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── URL builder ──────────────────────────────────────────────────

    fn url(&self, path: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(path)?)
    }

    // ── HTTP verbs ───────────────────────────────────────────────────

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("GET {url}");

        let resp = self.http.get(url).send().await?;
        Self::handle_response(resp).await
    }

    async fn get_with_params<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("GET {url} params={params:?}");

        let resp = self.http.get(url).query(params).send().await?;
        Self::handle_response(resp).await
    }

    async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("POST {url}");

        let resp = self.http.post(url).send().await?;
        Self::handle_response(resp).await
    }

    async fn handle_response<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
        let status = resp.status();
        if status.is_success() {
            let body = resp.text().await?;
            serde_json::from_str(&body).map_err(|e| {
                let preview: String = body.chars().take(200).collect();
                Error::Deserialization {
                    message: format!("{e} (body preview: {preview:?})"),
                    body,
                }
            })
        } else {
            let raw = resp.text().await.unwrap_or_default();
            Err(Error::Http {
                status: status.as_u16(),
                message: if raw.is_empty() {
                    status.to_string()
                } else {
                    raw.chars().take(200).collect()
                },
            })
        }
    }

    // ━━ Public API ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    // ── Monitors ─────────────────────────────────────────────────────

    /// `GET /api/monitors`: latest probe result for every configured monitor.
    pub async fn list_monitors(&self) -> Result<Vec<MonitorResult>, Error> {
        let resp: MonitorsResponse = self.get("api/monitors").await?;
        Ok(resp.results)
    }

    // ── Devices ──────────────────────────────────────────────────────

    /// `GET /api/devices?page=N&per=M`: one page of the flat device list.
    ///
    /// `page` and `per` below 1 are sent as 1.
    pub async fn list_devices(&self, page: u32, per: u32) -> Result<DevicePageResponse, Error> {
        let params = [
            ("page", page.max(1).to_string()),
            ("per", per.max(1).to_string()),
        ];
        self.get_with_params("api/devices", &params).await
    }

    /// Walk every device page, `per` records at a time.
    ///
    /// Stops once `total` records have been received or the server returns
    /// a short page, whichever comes first.
    pub async fn list_all_devices(&self, per: u32) -> Result<Vec<DeviceRecord>, Error> {
        let per = per.max(1);
        let per_usize = usize::try_from(per).unwrap_or(usize::MAX);
        let mut all = Vec::new();
        let mut page: u32 = 1;

        loop {
            let resp = self.list_devices(page, per).await?;
            let received = resp.devices.len();
            all.extend(resp.devices);

            if received < per_usize
                || u64::try_from(all.len()).unwrap_or(u64::MAX) >= resp.total
            {
                break;
            }

            page = page.saturating_add(1);
        }

        Ok(all)
    }

    /// `POST /api/devices/refresh`: ask the server to start a background rescan.
    ///
    /// Returns whether the server reported the scan as started. Completion
    /// is not signalled; callers re-fetch after a settle delay.
    pub async fn trigger_rescan(&self) -> Result<bool, Error> {
        let resp: RescanResponse = self.post_empty("api/devices/refresh").await?;
        Ok(resp.started)
    }
}
