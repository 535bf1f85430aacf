// ── Snapshot & selection ──
//
// `Snapshot` is the last good view of the server. `ViewSelection` is the
// user's position within it: which network tab, which page.

use chrono::{DateTime, Utc};
use super::{MonitorResult, NetworkGroup};
use crate::paginate;

/// CIDRs matched when a tab label has no group of the same name.
const LABEL_CIDR_FALLBACKS: &[(&str, &str)] =
    &[("2.4G", "192.168.1.0/24"), ("5G", "192.168.2.0/24")];

/// Everything the dashboard knows, as of `fetched_at`.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub monitors: Vec<MonitorResult>,
    pub networks: Vec<NetworkGroup>,
    pub fetched_at: DateTime<Utc>,
}

impl Snapshot {
    /// Resolve a tab label to its group.
    ///
    /// Exact label match first, then the well-known CIDR for that label.
    pub fn find_network(&self, label: &str) -> Option<&NetworkGroup> {
        self.networks.iter().find(|g| g.label == label).or_else(|| {
            let cidr = fallback_cidr(label)?;
            self.networks.iter().find(|g| g.cidr == cidr)
        })
    }

    /// Device count of the group `label` resolves to, 0 when absent.
    pub fn device_count(&self, label: &str) -> usize {
        self.find_network(label).map_or(0, |g| g.devices.len())
    }
}

fn fallback_cidr(label: &str) -> Option<&'static str> {
    LABEL_CIDR_FALLBACKS
        .iter()
        .find(|(l, _)| *l == label)
        .map(|(_, cidr)| *cidr)
}

// ── ViewSelection ────────────────────────────────────────────────────

/// Active tab and 1-based page within it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewSelection {
    pub active_network: String,
    pub current_page: usize,
}

impl ViewSelection {
    pub fn new(active_network: impl Into<String>) -> Self {
        Self {
            active_network: active_network.into(),
            current_page: 1,
        }
    }

    /// Switch tabs. Always lands on page 1.
    pub fn select_network(&mut self, label: impl Into<String>) {
        self.active_network = label.into();
        self.current_page = 1;
    }

    /// Move to `requested`, clamped into `[1, total_pages]` for
    /// `device_count` devices at `page_size` per page.
    pub fn set_page(&mut self, requested: i64, device_count: usize, page_size: usize) {
        let total = paginate::total_pages(device_count, page_size);
        self.current_page = paginate::clamp_page(requested, total);
    }

    /// Re-clamp the current page after the data underneath changed.
    pub fn reclamp(&mut self, device_count: usize, page_size: usize) {
        let requested = i64::try_from(self.current_page).unwrap_or(i64::MAX);
        self.set_page(requested, device_count, page_size);
    }
}
