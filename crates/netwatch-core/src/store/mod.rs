// ── Snapshot store ──
//
// Holds the last good `Snapshot` and the user's `ViewSelection` in watch
// channels. Replacement is atomic: readers see either the old snapshot
// or the new one. The current page is re-clamped whenever the snapshot
// or the active network changes, so it is always in range.

use std::sync::Arc;

use tokio::sync::watch;

use crate::config::DEVICES_PER_PAGE;
use crate::model::{Snapshot, ViewSelection};

pub struct SnapshotStore {
    snapshot: watch::Sender<Option<Arc<Snapshot>>>,
    selection: watch::Sender<ViewSelection>,
    page_size: usize,
}

impl SnapshotStore {
    pub fn new(initial_network: impl Into<String>) -> Self {
        Self::with_page_size(initial_network, DEVICES_PER_PAGE)
    }

    pub fn with_page_size(initial_network: impl Into<String>, page_size: usize) -> Self {
        let (snapshot, _) = watch::channel(None);
        let (selection, _) = watch::channel(ViewSelection::new(initial_network));
        Self {
            snapshot,
            selection,
            page_size: page_size.max(1),
        }
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    // ── Snapshot ─────────────────────────────────────────────────────

    /// The last good snapshot, `None` before the first successful fetch.
    pub fn current(&self) -> Option<Arc<Snapshot>> {
        self.snapshot.borrow().clone()
    }

    /// Swap in a new snapshot and keep the selection in range.
    pub fn replace(&self, snapshot: Snapshot) {
        let snapshot = Arc::new(snapshot);
        self.snapshot.send_replace(Some(Arc::clone(&snapshot)));
        self.selection.send_if_modified(|sel| {
            let before = sel.current_page;
            sel.reclamp(snapshot.device_count(&sel.active_network), self.page_size);
            sel.current_page != before
        });
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Arc<Snapshot>>> {
        self.snapshot.subscribe()
    }

    // ── Selection ────────────────────────────────────────────────────

    pub fn selection(&self) -> ViewSelection {
        self.selection.borrow().clone()
    }

    pub fn subscribe_selection(&self) -> watch::Receiver<ViewSelection> {
        self.selection.subscribe()
    }

    /// Switch tabs; the page resets to 1.
    pub fn select_network(&self, label: &str) {
        self.selection.send_modify(|sel| sel.select_network(label));
    }

    /// Jump to `page` within the active network, clamped.
    pub fn set_page(&self, page: i64) {
        let count = self.active_device_count();
        self.selection
            .send_modify(|sel| sel.set_page(page, count, self.page_size));
    }

    /// Step the page by `delta`, clamped.
    pub fn step_page(&self, delta: i64) {
        let current = i64::try_from(self.selection.borrow().current_page).unwrap_or(i64::MAX);
        self.set_page(current.saturating_add(delta));
    }

    fn active_device_count(&self) -> usize {
        let label = self.selection.borrow().active_network.clone();
        self.current().map_or(0, |s| s.device_count(&label))
    }
}
