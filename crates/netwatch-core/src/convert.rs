// ── API-to-domain conversions ──
//
// Bridges raw `netwatch_api` wire types into canonical domain types and
// assembles the flat device list into per-network groups.

use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::debug;

use netwatch_api::models as wire;

use crate::model::{Device, MonitorResult, NetworkDef, NetworkGroup};

// ── Timestamps ───────────────────────────────────────────────────────

/// Interpret a wire timestamp. Numbers are epoch milliseconds; strings are
/// RFC 3339 or naive ISO-8601 (taken as UTC). Anything else is dropped.
pub fn parse_timestamp(ts: &wire::WireTimestamp) -> Option<DateTime<Utc>> {
    match ts {
        wire::WireTimestamp::EpochMillis(ms) => {
            if !ms.is_finite() {
                return None;
            }
            #[allow(clippy::cast_possible_truncation, clippy::as_conversions)]
            let ms = ms.round() as i64;
            DateTime::from_timestamp_millis(ms)
        }
        wire::WireTimestamp::Iso(s) => parse_iso(s),
    }
}

fn parse_iso(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
        .map(|naive| naive.and_utc())
}

// ── Monitors ─────────────────────────────────────────────────────────

impl From<wire::MonitorResult> for MonitorResult {
    fn from(m: wire::MonitorResult) -> Self {
        let host = m.host.unwrap_or_default();
        let name = m.name.filter(|n| !n.is_empty()).unwrap_or_else(|| host.clone());
        Self {
            name,
            host,
            ok: m.ok,
            rtt_ms: m.rtt_ms.filter(|v| v.is_finite()),
            mac: m.mac.filter(|v| !v.is_empty()),
            timestamp: m.timestamp.as_ref().and_then(parse_timestamp),
        }
    }
}

// ── Devices ──────────────────────────────────────────────────────────

impl From<wire::DeviceRecord> for Device {
    fn from(d: wire::DeviceRecord) -> Self {
        Self {
            ip: d.ip,
            mac: d.mac.filter(|v| !v.is_empty()),
            hostname: d.hostname.filter(|v| !v.is_empty()),
            ok: d.ok,
            network: d.network.filter(|v| !v.is_empty()),
            last_seen: d.last_seen.and_then(|secs| DateTime::from_timestamp(secs, 0)),
        }
    }
}

// ── Topology assembly ────────────────────────────────────────────────

/// Group a flat device list by network.
///
/// Every configured network yields a group, in configuration order, even
/// when empty. A device joins the group whose label matches its
/// `network`; a device without one joins the first configured network
/// whose range contains its address. Unknown labels get an ad-hoc group
/// with an empty CIDR, appended in first-seen order. Within each group,
/// devices are ordered most recently seen first, ties kept in input order.
pub fn group_devices(devices: Vec<Device>, networks: &[NetworkDef]) -> Vec<NetworkGroup> {
    let mut groups: Vec<NetworkGroup> = networks
        .iter()
        .map(|n| NetworkGroup::new(n.label.clone(), n.cidr.to_string()))
        .collect();

    for device in devices {
        let idx = match device.network.as_deref() {
            Some(label) => Some(
                groups
                    .iter()
                    .position(|g| g.label == label)
                    .unwrap_or_else(|| {
                        groups.push(NetworkGroup::new(label, ""));
                        groups.len() - 1
                    }),
            ),
            None => networks.iter().position(|n| n.cidr.contains_str(&device.ip)),
        };

        match idx.and_then(|i| groups.get_mut(i)) {
            Some(group) => group.devices.push(device),
            None => debug!(ip = %device.ip, "device matches no network, dropping"),
        }
    }

    for group in &mut groups {
        group
            .devices
            .sort_by(|a, b| b.last_seen.cmp(&a.last_seen));
    }

    groups
}
