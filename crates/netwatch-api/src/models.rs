// Wire types for the monitor server's JSON endpoints.
//
// Field names match the server payloads exactly. Everything the server
// may omit or send as `null` is an `Option` with `#[serde(default)]`.

use serde::{Deserialize, Serialize};

// ── Timestamps ───────────────────────────────────────────────────────

/// A timestamp as sent by the server: either a number or an ISO-8601 string.
///
/// Monitor probes stamp results with `datetime.isoformat()` strings; other
/// producers send numeric epoch milliseconds. Both shapes are accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WireTimestamp {
    EpochMillis(f64),
    Iso(String),
}

// ── Monitors ─────────────────────────────────────────────────────────

/// One probe result from `GET /api/monitors`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorResult {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub rtt_ms: Option<f64>,
    #[serde(default)]
    pub mac: Option<String>,
    #[serde(default)]
    pub timestamp: Option<WireTimestamp>,
}

/// Envelope of `GET /api/monitors`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorsResponse {
    #[serde(default)]
    pub results: Vec<MonitorResult>,
    #[serde(default)]
    pub count: Option<u64>,
}

// ── Devices ──────────────────────────────────────────────────────────

/// One discovered host from `GET /api/devices`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceRecord {
    pub ip: String,
    #[serde(default)]
    pub mac: Option<String>,
    #[serde(default)]
    pub hostname: Option<String>,
    #[serde(default)]
    pub ok: bool,
    /// Label of the network this host was discovered on.
    #[serde(default)]
    pub network: Option<String>,
    /// Epoch seconds of the last scan that saw this host.
    #[serde(default)]
    pub last_seen: Option<i64>,
}

/// Server-paginated device listing: `GET /api/devices?page=N&per=M`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DevicePageResponse {
    #[serde(default)]
    pub devices: Vec<DeviceRecord>,
    pub total: u64,
    pub page: u32,
    pub per: u32,
}

/// Response of `POST /api/devices/refresh`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RescanResponse {
    #[serde(default)]
    pub started: bool,
}

// ── Live updates ─────────────────────────────────────────────────────

/// A single `{metric, value}` sample pushed over `/ws/updates`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricEvent {
    pub metric: String,
    pub value: f64,
    /// Epoch seconds the sample was taken, when the server includes it.
    #[serde(default)]
    pub ts: Option<i64>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn monitor_with_nulls_deserializes() {
        let json = r#"{"host": "8.8.8.8", "ok": false, "rtt_ms": null, "name": "Google DNS"}"#;
        let m: MonitorResult = serde_json::from_str(json).unwrap();
        assert_eq!(m.name.as_deref(), Some("Google DNS"));
        assert!(!m.ok);
        assert!(m.rtt_ms.is_none());
        assert!(m.mac.is_none());
        assert!(m.timestamp.is_none());
    }

    #[test]
    fn timestamp_accepts_both_shapes() {
        let iso: MonitorResult =
            serde_json::from_str(r#"{"ok": true, "timestamp": "2026-01-02T03:04:05"}"#).unwrap();
        assert_eq!(
            iso.timestamp,
            Some(WireTimestamp::Iso("2026-01-02T03:04:05".into()))
        );

        let num: MonitorResult =
            serde_json::from_str(r#"{"ok": true, "timestamp": 1700000000000}"#).unwrap();
        assert_eq!(num.timestamp, Some(WireTimestamp::EpochMillis(1.7e12)));
    }

    #[test]
    fn device_page_deserializes() {
        let json = r#"{
            "devices": [
                {"ip": "192.168.1.10", "mac": "aa:bb:cc:dd:ee:ff", "hostname": null,
                 "ok": true, "network": "2.4G", "last_seen": 1700000000,
                 "dev": "wlp2s0", "state": "REACHABLE"}
            ],
            "total": 12, "page": 1, "per": 5
        }"#;
        let page: DevicePageResponse = serde_json::from_str(json).unwrap();
        assert_eq!(page.total, 12);
        assert_eq!(page.devices.len(), 1);
        assert_eq!(page.devices[0].network.as_deref(), Some("2.4G"));
        assert!(page.devices[0].hostname.is_none());
    }
}
