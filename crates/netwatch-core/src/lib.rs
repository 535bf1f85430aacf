// netwatch-core: Reactive data layer between netwatch-api and the dashboard UI.
//
// Owns the snapshot store, topology assembly, pagination, view rendering
// and the refresh/rescan/live-update lifecycle. Consumers build a
// `Controller`, call `start()`, and read `view()`.

pub mod activity;
pub mod config;
pub mod controller;
pub mod convert;
pub mod error;
pub mod fetcher;
pub mod model;
pub mod paginate;
pub mod render;
pub mod store;

// ── Primary re-exports ──────────────────────────────────────────────
pub use activity::{Activity, ActivityLevel, SystemStatus};
pub use config::{DEVICES_PER_PAGE, DashboardConfig};
pub use controller::{Controller, LiveMetrics, MetricReading, RefreshOutcome};
pub use error::{FetchError, FetchErrorKind};
pub use fetcher::{ApiFetcher, DevicePage, Fetcher};
pub use store::SnapshotStore;

// ── Model re-exports ────────────────────────────────────────────────
pub use model::{
    Device, Ipv4Cidr, MonitorResult, NetworkDef, NetworkGroup, Snapshot, ViewSelection,
    default_networks,
};

// ── View re-exports ─────────────────────────────────────────────────
pub use render::{
    DeviceRow, DeviceTable, DevicesView, MonitorRow, MonitorSummary, MonitorsView, NetworkTab,
    Pagination, ViewModel, render,
};

// ── Live channel re-exports ─────────────────────────────────────────
pub use netwatch_api::ChannelState;
