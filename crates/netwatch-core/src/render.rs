// ── Renderer ──
//
// Turns a snapshot and a selection into a `ViewModel`: display-ready rows,
// counters and placeholders. Pure and deterministic; no I/O, no clock.

use chrono::{DateTime, Utc};

use crate::model::{Device, MonitorResult, NetworkGroup, Snapshot, ViewSelection};
use crate::paginate::{Page, paginate};

/// Shown wherever a value is unknown.
pub const PLACEHOLDER: &str = "--";

const MAC_PREFIX_CHARS: usize = 8;

// ── View types ───────────────────────────────────────────────────────

/// Everything the dashboard draws.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewModel {
    pub monitors: MonitorsView,
    pub summary: MonitorSummary,
    pub tabs: Vec<NetworkTab>,
    pub devices: DevicesView,
    /// Time of the most recent check: first monitor's probe time, else
    /// when the snapshot was fetched.
    pub last_check: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MonitorsView {
    /// No snapshot yet, or the server has no monitors.
    NotConfigured,
    List(Vec<MonitorRow>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorRow {
    pub name: String,
    pub host: String,
    /// First 8 characters followed by `...`, or the placeholder.
    pub mac: String,
    pub ok: bool,
    /// `"<rtt> ms"` when a round-trip time was measured.
    pub latency: Option<String>,
}

impl MonitorRow {
    pub fn status_label(&self) -> &'static str {
        if self.ok { "ONLINE" } else { "FAIL" }
    }
}

/// Header counters. Each field is already formatted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorSummary {
    pub total: String,
    pub ok: String,
    pub failed: String,
    /// Mean round-trip of healthy monitors, `"12.3 ms"`, or the placeholder.
    pub avg_latency: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkTab {
    pub label: String,
    /// `"online/total"`, or `"--/--"` when the network is unknown.
    pub counter: String,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DevicesView {
    /// The snapshot has no networks at all.
    NoNetworks,
    /// The selected tab resolves to no network.
    Unavailable { label: String },
    Table(DeviceTable),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceTable {
    pub network: String,
    pub rows: Vec<DeviceRow>,
    pub pagination: Pagination,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceRow {
    pub ip: String,
    pub mac: String,
    pub hostname: String,
    pub ok: bool,
}

impl DeviceRow {
    pub fn status_label(&self) -> &'static str {
        if self.ok { "ONLINE" } else { "OFFLINE" }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: usize,
    pub total_pages: usize,
    pub total_items: usize,
    /// 1-based range of rows shown; both 0 when the network is empty.
    pub first_index: usize,
    pub last_index: usize,
    pub has_prev: bool,
    pub has_next: bool,
}

impl Pagination {
    /// `"PAGE 2/3"`
    pub fn page_label(&self) -> String {
        format!("PAGE {}/{}", self.page, self.total_pages)
    }

    /// `"showing 6-10 of 12"`
    pub fn range_label(&self) -> String {
        format!(
            "showing {}-{} of {}",
            self.first_index, self.last_index, self.total_items
        )
    }

    pub fn is_empty(&self) -> bool {
        self.total_items == 0
    }
}

impl<T> From<&Page<'_, T>> for Pagination {
    fn from(page: &Page<'_, T>) -> Self {
        Self {
            page: page.page,
            total_pages: page.total_pages,
            total_items: page.total_items,
            first_index: page.first_index(),
            last_index: page.last_index(),
            has_prev: page.has_prev(),
            has_next: page.has_next(),
        }
    }
}

// ── Rendering ────────────────────────────────────────────────────────

/// Build the view for `snapshot` at `selection`, `page_size` devices per page.
pub fn render(snapshot: Option<&Snapshot>, selection: &ViewSelection, page_size: usize) -> ViewModel {
    let monitors = snapshot.map_or(&[][..], |s| s.monitors.as_slice());

    ViewModel {
        monitors: monitors_view(monitors),
        summary: summarize(monitors),
        tabs: tabs(snapshot, &selection.active_network),
        devices: devices_view(snapshot, selection, page_size),
        last_check: snapshot.and_then(|s| {
            s.monitors
                .first()
                .and_then(|m| m.timestamp)
                .or(Some(s.fetched_at))
        }),
    }
}

fn monitors_view(monitors: &[MonitorResult]) -> MonitorsView {
    if monitors.is_empty() {
        return MonitorsView::NotConfigured;
    }
    MonitorsView::List(monitors.iter().map(monitor_row).collect())
}

fn monitor_row(m: &MonitorResult) -> MonitorRow {
    MonitorRow {
        name: or_placeholder(Some(m.display_name())),
        host: or_placeholder(Some(&m.host)),
        mac: m
            .mac
            .as_deref()
            .filter(|s| !s.is_empty())
            .map_or_else(|| PLACEHOLDER.to_owned(), truncate_mac),
        ok: m.ok,
        latency: m.rtt_ms.map(|rtt| format!("{rtt} ms")),
    }
}

fn truncate_mac(mac: &str) -> String {
    let prefix: String = mac.chars().take(MAC_PREFIX_CHARS).collect();
    format!("{prefix}...")
}

/// Counts and average latency. Average covers healthy monitors that
/// reported a round-trip time.
pub fn summarize(monitors: &[MonitorResult]) -> MonitorSummary {
    if monitors.is_empty() {
        return MonitorSummary {
            total: PLACEHOLDER.to_owned(),
            ok: PLACEHOLDER.to_owned(),
            failed: PLACEHOLDER.to_owned(),
            avg_latency: PLACEHOLDER.to_owned(),
        };
    }

    let ok = monitors.iter().filter(|m| m.ok).count();
    let samples: Vec<f64> = monitors
        .iter()
        .filter(|m| m.ok)
        .filter_map(|m| m.rtt_ms)
        .collect();

    MonitorSummary {
        total: monitors.len().to_string(),
        ok: ok.to_string(),
        failed: (monitors.len() - ok).to_string(),
        avg_latency: mean(&samples).map_or_else(|| PLACEHOLDER.to_owned(), |v| format!("{v:.1} ms")),
    }
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let count = u32::try_from(values.len()).ok()?;
    Some(values.iter().sum::<f64>() / f64::from(count))
}

fn tabs(snapshot: Option<&Snapshot>, active: &str) -> Vec<NetworkTab> {
    let mut tabs: Vec<NetworkTab> = snapshot
        .map(|s| s.networks.as_slice())
        .unwrap_or_default()
        .iter()
        .map(|g| NetworkTab {
            label: g.label.clone(),
            counter: counter(Some(g)),
            active: false,
        })
        .collect();

    let resolved = snapshot.and_then(|s| s.find_network(active));
    match resolved.and_then(|g| tabs.iter_mut().find(|t| t.label == g.label)) {
        Some(tab) => tab.active = true,
        None => tabs.push(NetworkTab {
            label: active.to_owned(),
            counter: counter(None),
            active: true,
        }),
    }

    tabs
}

fn counter(group: Option<&NetworkGroup>) -> String {
    group.map_or_else(
        || format!("{PLACEHOLDER}/{PLACEHOLDER}"),
        |g| format!("{}/{}", g.online_count(), g.devices.len()),
    )
}

fn devices_view(snapshot: Option<&Snapshot>, selection: &ViewSelection, page_size: usize) -> DevicesView {
    let Some(snapshot) = snapshot.filter(|s| !s.networks.is_empty()) else {
        return DevicesView::NoNetworks;
    };
    let Some(group) = snapshot.find_network(&selection.active_network) else {
        return DevicesView::Unavailable {
            label: selection.active_network.clone(),
        };
    };

    let requested = i64::try_from(selection.current_page).unwrap_or(i64::MAX);
    let page = paginate(&group.devices, requested, page_size);

    DevicesView::Table(DeviceTable {
        network: group.label.clone(),
        rows: page.items.iter().map(device_row).collect(),
        pagination: Pagination::from(&page),
    })
}

fn device_row(d: &Device) -> DeviceRow {
    DeviceRow {
        ip: d.ip.clone(),
        mac: or_placeholder(d.mac.as_deref()),
        hostname: or_placeholder(d.hostname.as_deref()),
        ok: d.ok,
    }
}

fn or_placeholder(value: Option<&str>) -> String {
    value
        .filter(|s| !s.is_empty())
        .unwrap_or(PLACEHOLDER)
        .to_owned()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    use super::*;

    fn monitor(name: &str, ok: bool, rtt: Option<f64>) -> MonitorResult {
        MonitorResult {
            name: name.into(),
            host: format!("{name}.lan"),
            ok,
            rtt_ms: rtt,
            mac: None,
            timestamp: None,
        }
    }

    fn device(ip: &str, ok: bool) -> Device {
        Device {
            ip: ip.into(),
            mac: None,
            hostname: None,
            ok,
            network: None,
            last_seen: None,
        }
    }

    fn group(label: &str, cidr: &str, devices: Vec<Device>) -> NetworkGroup {
        NetworkGroup {
            label: label.into(),
            cidr: cidr.into(),
            devices,
        }
    }

    fn snapshot(monitors: Vec<MonitorResult>, networks: Vec<NetworkGroup>) -> Snapshot {
        Snapshot {
            monitors,
            networks,
            fetched_at: Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap(),
        }
    }

    fn table(view: &ViewModel) -> &DeviceTable {
        match &view.devices {
            DevicesView::Table(t) => t,
            other => panic!("expected table, got {other:?}"),
        }
    }

    #[test]
    fn no_snapshot_renders_placeholders() {
        let view = render(None, &ViewSelection::new("2.4G"), 5);

        assert_eq!(view.monitors, MonitorsView::NotConfigured);
        assert_eq!(view.summary.total, "--");
        assert_eq!(view.summary.avg_latency, "--");
        assert_eq!(view.devices, DevicesView::NoNetworks);
        assert_eq!(view.tabs, vec![NetworkTab {
            label: "2.4G".into(),
            counter: "--/--".into(),
            active: true,
        }]);
        assert!(view.last_check.is_none());
    }

    #[test]
    fn average_latency_covers_healthy_monitors_with_rtt() {
        let snap = snapshot(
            vec![
                monitor("a", true, Some(10.0)),
                monitor("b", true, Some(20.0)),
                monitor("c", false, None),
            ],
            Vec::new(),
        );
        let view = render(Some(&snap), &ViewSelection::new("2.4G"), 5);

        assert_eq!(view.summary.total, "3");
        assert_eq!(view.summary.ok, "2");
        assert_eq!(view.summary.failed, "1");
        assert_eq!(view.summary.avg_latency, "15.0 ms");
    }

    #[test]
    fn average_latency_without_samples_is_placeholder() {
        let snap = snapshot(
            vec![monitor("a", true, None), monitor("b", false, Some(3.0))],
            Vec::new(),
        );
        let view = render(Some(&snap), &ViewSelection::new("2.4G"), 5);
        assert_eq!(view.summary.avg_latency, "--");
    }

    #[test]
    fn monitor_rows_format_mac_and_latency() {
        let mut m = monitor("gw", true, Some(1.4));
        m.mac = Some("aa:bb:cc:dd:ee:ff".into());
        let snap = snapshot(vec![m, monitor("dns", false, None)], Vec::new());

        let view = render(Some(&snap), &ViewSelection::new("2.4G"), 5);
        let MonitorsView::List(rows) = view.monitors else {
            panic!("expected rows");
        };

        assert_eq!(rows[0].mac, "aa:bb:cc...");
        assert_eq!(rows[0].latency.as_deref(), Some("1.4 ms"));
        assert_eq!(rows[0].status_label(), "ONLINE");
        assert_eq!(rows[1].mac, "--");
        assert_eq!(rows[1].latency, None);
        assert_eq!(rows[1].status_label(), "FAIL");
    }

    #[test]
    fn last_check_prefers_first_monitor_timestamp() {
        let probe = Utc.with_ymd_and_hms(2026, 3, 1, 10, 0, 0).unwrap();
        let mut m = monitor("gw", true, None);
        m.timestamp = Some(probe);

        let with_ts = snapshot(vec![m], Vec::new());
        assert_eq!(
            render(Some(&with_ts), &ViewSelection::new("x"), 5).last_check,
            Some(probe)
        );

        let without = snapshot(vec![monitor("gw", true, None)], Vec::new());
        assert_eq!(
            render(Some(&without), &ViewSelection::new("x"), 5).last_check,
            Some(without.fetched_at)
        );
    }

    #[test]
    fn twelve_devices_paginate_in_fives() {
        let devices: Vec<Device> = (1..=12)
            .map(|i| device(&format!("192.168.1.{i}"), i % 3 != 0))
            .collect();
        let snap = snapshot(Vec::new(), vec![group("2.4G", "192.168.1.0/24", devices)]);

        let mut sel = ViewSelection::new("2.4G");
        let first = render(Some(&snap), &sel, 5);
        let t = table(&first);
        assert_eq!(t.rows.len(), 5);
        assert_eq!(t.pagination.page_label(), "PAGE 1/3");
        assert!(!t.pagination.has_prev);
        assert!(t.pagination.has_next);

        sel.current_page = 3;
        let last = render(Some(&snap), &sel, 5);
        let t = table(&last);
        assert_eq!(t.rows.len(), 2);
        assert_eq!(t.rows[0].ip, "192.168.1.11");
        assert_eq!(t.pagination.range_label(), "showing 11-12 of 12");
        assert!(t.pagination.has_prev);
        assert!(!t.pagination.has_next);

        assert_eq!(first.tabs[0].counter, "8/12");
    }

    #[test]
    fn empty_network_shows_empty_page() {
        let snap = snapshot(Vec::new(), vec![group("5G", "192.168.2.0/24", Vec::new())]);
        let view = render(Some(&snap), &ViewSelection::new("5G"), 5);
        let t = table(&view);
        assert!(t.rows.is_empty());
        assert!(t.pagination.is_empty());
        assert_eq!(t.pagination.page_label(), "PAGE 1/1");
    }

    #[test]
    fn missing_network_is_unavailable_and_counter_is_placeholder() {
        let snap = snapshot(Vec::new(), vec![group("2.4G", "192.168.1.0/24", vec![
            device("192.168.1.2", true),
        ])]);
        let view = render(Some(&snap), &ViewSelection::new("guest"), 5);

        assert_eq!(view.devices, DevicesView::Unavailable {
            label: "guest".into()
        });
        assert_eq!(view.tabs.len(), 2);
        assert_eq!(view.tabs[0].counter, "1/1");
        assert!(!view.tabs[0].active);
        assert_eq!(view.tabs[1].counter, "--/--");
        assert!(view.tabs[1].active);
    }

    #[test]
    fn tab_resolves_through_cidr_fallback() {
        let snap = snapshot(Vec::new(), vec![group("home", "192.168.2.0/24", vec![
            device("192.168.2.2", true),
            device("192.168.2.3", false),
        ])]);
        let view = render(Some(&snap), &ViewSelection::new("5G"), 5);

        assert_eq!(table(&view).network, "home");
        assert_eq!(view.tabs.len(), 1);
        assert!(view.tabs[0].active);
        assert_eq!(view.tabs[0].counter, "1/2");
    }

    #[test]
    fn device_rows_use_placeholders() {
        let mut d = device("192.168.1.9", false);
        d.hostname = Some("printer".into());
        let snap = snapshot(Vec::new(), vec![group("2.4G", "", vec![d])]);
        let view = render(Some(&snap), &ViewSelection::new("2.4G"), 5);
        let row = &table(&view).rows[0];

        assert_eq!(row.mac, "--");
        assert_eq!(row.hostname, "printer");
        assert_eq!(row.status_label(), "OFFLINE");
    }

    #[test]
    fn rendering_is_deterministic() {
        let snap = snapshot(vec![monitor("a", true, Some(2.0))], vec![group(
            "2.4G",
            "192.168.1.0/24",
            vec![device("192.168.1.2", true)],
        )]);
        let sel = ViewSelection::new("2.4G");
        assert_eq!(render(Some(&snap), &sel, 5), render(Some(&snap), &sel, 5));
    }
}
