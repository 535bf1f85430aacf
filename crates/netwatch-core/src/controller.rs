// ── Dashboard controller ──
//
// Owns the fetcher, the snapshot store and every background task:
// periodic monitor refresh, rescan follow-up and the live update bridge.
// All writes to the store go through here.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, MutexGuard, broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::{Duration, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

use netwatch_api::live::{Connector, WsConnector};
use netwatch_api::{ChannelState, LiveChannel, MetricEvent, ReconnectConfig, live_endpoint};

use crate::activity::{Activity, ActivityLevel, SystemStatus};
use crate::config::DashboardConfig;
use crate::convert::group_devices;
use crate::error::FetchError;
use crate::fetcher::{ApiFetcher, Fetcher};
use crate::model::{MonitorResult, NetworkGroup, Snapshot};
use crate::render::{ViewModel, render};
use crate::store::SnapshotStore;

// ── Live metrics ─────────────────────────────────────────────────────

/// Latest pushed value of one metric.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricReading {
    pub value: f64,
    pub at: DateTime<Utc>,
}

/// Latest reading per metric name.
pub type LiveMetrics = BTreeMap<String, MetricReading>;

// ── RefreshOutcome ───────────────────────────────────────────────────

/// Result of a refresh request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The fetch ran. Successful parts were applied; failed parts kept
    /// their previous values and are listed here.
    Applied { errors: Vec<FetchError> },
    /// Another refresh was already in flight.
    Skipped,
}

impl RefreshOutcome {
    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped)
    }

    pub fn errors(&self) -> &[FetchError] {
        match self {
            Self::Applied { errors } => errors,
            Self::Skipped => &[],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
enum RefreshScope {
    All,
    Monitors,
    Devices,
}

// ── Controller ───────────────────────────────────────────────────────

/// The main entry point for the dashboard.
///
/// Cheaply cloneable via `Arc<ControllerInner>`. Construct with
/// [`new`](Self::new) (or [`from_config`](Controller::from_config) for the
/// real server), then call [`start`](Self::start).
pub struct Controller<F: Fetcher> {
    inner: Arc<ControllerInner<F>>,
}

impl<F: Fetcher> Clone for Controller<F> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct ControllerInner<F> {
    config: DashboardConfig,
    fetcher: F,
    store: SnapshotStore,
    status: watch::Sender<SystemStatus>,
    activity: watch::Sender<Activity>,
    metrics: watch::Sender<Arc<LiveMetrics>>,
    live_state: watch::Sender<ChannelState>,
    auto_refresh: watch::Sender<bool>,
    /// Held for the duration of a fetch; at most one refresh in flight.
    refresh_gate: Mutex<()>,
    cancel: CancellationToken,
    /// Token of the running auto-refresh task, if any.
    auto_refresh_cancel: Mutex<Option<CancellationToken>>,
    live: Mutex<Option<LiveChannel>>,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl Controller<ApiFetcher> {
    /// Controller talking to the server named in `config`.
    pub fn from_config(config: DashboardConfig) -> Result<Self, FetchError> {
        let fetcher = ApiFetcher::from_config(&config)?;
        Ok(Self::new(config, fetcher))
    }
}

impl<F: Fetcher> Controller<F> {
    /// Create a controller. Nothing is fetched until [`start`](Self::start)
    /// or one of the refresh methods is called.
    pub fn new(config: DashboardConfig, fetcher: F) -> Self {
        let store = SnapshotStore::new(config.initial_network());
        let (status, _) = watch::channel(SystemStatus::Starting);
        let (activity, _) = watch::channel(Activity::new(ActivityLevel::Info, "Starting..."));
        let (metrics, _) = watch::channel(Arc::new(LiveMetrics::new()));
        let (live_state, _) = watch::channel(ChannelState::Disconnected);
        let (auto_refresh, _) = watch::channel(false);

        Self {
            inner: Arc::new(ControllerInner {
                config,
                fetcher,
                store,
                status,
                activity,
                metrics,
                live_state,
                auto_refresh,
                refresh_gate: Mutex::new(()),
                cancel: CancellationToken::new(),
                auto_refresh_cancel: Mutex::new(None),
                live: Mutex::new(None),
                task_handles: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.inner.config
    }

    pub fn store(&self) -> &SnapshotStore {
        &self.inner.store
    }

    pub fn fetcher(&self) -> &F {
        &self.inner.fetcher
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Initial full refresh, then the background tasks the config asks for.
    pub async fn start(&self) -> RefreshOutcome {
        info!(server = %self.inner.config.server, "starting dashboard");
        let outcome = self.refresh_all().await;

        self.set_auto_refresh(self.inner.config.auto_refresh).await;

        if self.inner.config.live_updates {
            if let Err(e) = self.start_live_channel().await {
                warn!(error = %e, "live updates unavailable");
                self.notify(ActivityLevel::Warning, format!("Live updates unavailable: {e}"));
            }
        }

        outcome
    }

    /// Cancel every background task and wait for them to finish.
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();

        if let Some(channel) = self.inner.live.lock().await.take() {
            channel.shutdown();
        }
        {
            let mut slot = self.inner.auto_refresh_cancel.lock().await;
            *slot = None;
            self.inner.auto_refresh.send_replace(false);
        }

        let handles: Vec<JoinHandle<()>> = self.inner.task_handles.lock().await.drain(..).collect();
        for handle in handles {
            let _ = handle.await;
        }

        self.inner.live_state.send_replace(ChannelState::Disconnected);
        debug!("controller shut down");
    }

    // ── Refresh ──────────────────────────────────────────────────────

    /// Fetch monitors and devices concurrently and apply what succeeded.
    ///
    /// Returns [`RefreshOutcome::Skipped`] without fetching when another
    /// refresh is in flight.
    pub async fn refresh_all(&self) -> RefreshOutcome {
        self.run_refresh(RefreshScope::All, false).await
    }

    /// Fetch monitors only. This is what the auto-refresh timer runs.
    pub async fn refresh_monitors(&self) -> RefreshOutcome {
        self.run_refresh(RefreshScope::Monitors, false).await
    }

    /// Fetch devices only.
    pub async fn refresh_devices(&self) -> RefreshOutcome {
        self.run_refresh(RefreshScope::Devices, false).await
    }

    /// User-requested full refresh. A request that lands while another
    /// refresh is in flight is reported on the activity line.
    pub async fn manual_refresh(&self) -> RefreshOutcome {
        let outcome = self.refresh_all().await;
        if outcome.is_skipped() {
            self.notify(ActivityLevel::Info, "Refresh already in progress");
        }
        outcome
    }

    /// Ask the server to rescan, wait the settle delay, then re-read devices.
    ///
    /// The server gives no completion signal, so the re-read may still see
    /// the previous scan. The follow-up refresh waits for any in-flight
    /// refresh rather than being skipped.
    pub async fn rescan(&self) -> Result<RefreshOutcome, FetchError> {
        self.notify(ActivityLevel::Info, "Requesting network rescan...");

        let settle = self.inner.config.rescan_settle.as_secs();
        match self.inner.fetcher.trigger_rescan().await {
            Ok(true) => {
                info!("rescan started");
                self.notify(
                    ActivityLevel::Info,
                    format!("Rescan started, reloading devices in {settle}s"),
                );
            }
            Ok(false) => {
                warn!("server did not report the rescan as started");
                self.notify(
                    ActivityLevel::Warning,
                    format!("Server did not confirm the rescan, reloading devices in {settle}s"),
                );
            }
            Err(e) => {
                warn!(error = %e, "rescan request failed");
                self.notify(ActivityLevel::Error, format!("Rescan failed: {e}"));
                return Err(e);
            }
        }

        tokio::select! {
            biased;
            () = self.inner.cancel.cancelled() => return Ok(RefreshOutcome::Skipped),
            () = tokio::time::sleep(self.inner.config.rescan_settle) => {}
        }

        Ok(self.run_refresh(RefreshScope::Devices, true).await)
    }

    async fn run_refresh(&self, scope: RefreshScope, wait: bool) -> RefreshOutcome {
        let Some(_guard) = self.acquire_refresh(wait).await else {
            debug!(%scope, "refresh already in flight, skipping");
            return RefreshOutcome::Skipped;
        };

        debug!(%scope, "refreshing");
        let fetcher = &self.inner.fetcher;
        let page_size = self.inner.config.fetch_page_size;

        let (monitors, devices) = match scope {
            RefreshScope::All => {
                let (m, d) =
                    tokio::join!(fetcher.fetch_monitors(), fetcher.fetch_all_devices(page_size));
                (Some(m), Some(d))
            }
            RefreshScope::Monitors => (Some(fetcher.fetch_monitors().await), None),
            RefreshScope::Devices => (None, Some(fetcher.fetch_all_devices(page_size).await)),
        };

        let mut errors = Vec::new();

        let monitors = monitors.and_then(|result| {
            result
                .inspect_err(|e| warn!(error = %e, "monitor fetch failed"))
                .map_err(|e| errors.push(e))
                .ok()
        });
        let networks = devices.and_then(|result| {
            result
                .inspect_err(|e| warn!(error = %e, "device fetch failed"))
                .map_err(|e| errors.push(e))
                .ok()
                .map(|devices| group_devices(devices, &self.inner.config.networks))
        });

        let summary = refresh_summary(monitors.as_deref(), networks.as_deref());
        self.apply(monitors, networks);

        if errors.is_empty() {
            if scope == RefreshScope::All {
                self.inner.status.send_replace(SystemStatus::Operational);
            }
            self.notify(ActivityLevel::Success, summary);
        } else {
            let detail = errors
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; ");
            self.inner
                .status
                .send_replace(SystemStatus::Degraded(errors.clone()));
            self.notify(ActivityLevel::Error, format!("Refresh failed: {detail}"));
        }

        RefreshOutcome::Applied { errors }
    }

    async fn acquire_refresh(&self, wait: bool) -> Option<MutexGuard<'_, ()>> {
        if wait {
            Some(self.inner.refresh_gate.lock().await)
        } else {
            self.inner.refresh_gate.try_lock().ok()
        }
    }

    /// Replace the parts that were fetched, keep the rest. No-op when
    /// nothing was fetched successfully.
    fn apply(&self, monitors: Option<Vec<MonitorResult>>, networks: Option<Vec<NetworkGroup>>) {
        if monitors.is_none() && networks.is_none() {
            return;
        }

        let previous = self.inner.store.current();
        let snapshot = Snapshot {
            monitors: monitors.unwrap_or_else(|| {
                previous
                    .as_ref()
                    .map(|s| s.monitors.clone())
                    .unwrap_or_default()
            }),
            networks: networks.unwrap_or_else(|| {
                previous
                    .as_ref()
                    .map(|s| s.networks.clone())
                    .unwrap_or_default()
            }),
            fetched_at: Utc::now(),
        };

        self.inner.store.replace(snapshot);
    }

    // ── Auto-refresh ─────────────────────────────────────────────────

    /// Start or stop the periodic monitor refresh.
    ///
    /// Has no effect after [`shutdown`](Self::shutdown): the setting stays off.
    pub async fn set_auto_refresh(&self, enabled: bool) {
        let mut slot = self.inner.auto_refresh_cancel.lock().await;
        self.switch_auto_refresh(&mut slot, enabled).await;
    }

    /// Flip auto-refresh; returns the new setting.
    pub async fn toggle_auto_refresh(&self) -> bool {
        let mut slot = self.inner.auto_refresh_cancel.lock().await;
        let enabled = !*self.inner.auto_refresh.borrow();
        self.switch_auto_refresh(&mut slot, enabled).await
    }

    /// The caller holds the task slot, so the flag and the task change together.
    async fn switch_auto_refresh(&self, slot: &mut Option<CancellationToken>, enabled: bool) -> bool {
        let interval = self.inner.config.refresh_interval;
        let enabled = enabled && !interval.is_zero() && !self.inner.cancel.is_cancelled();

        if let Some(token) = slot.take() {
            token.cancel();
        }

        if enabled {
            let token = self.inner.cancel.child_token();
            let handle = tokio::spawn(refresh_task(self.clone(), interval, token.clone()));
            *slot = Some(token);

            let mut handles = self.inner.task_handles.lock().await;
            handles.retain(|h| !h.is_finished());
            handles.push(handle);
        }

        self.inner.auto_refresh.send_replace(enabled);
        let message = if enabled {
            format!("Auto-refresh enabled (every {}s)", interval.as_secs())
        } else {
            "Auto-refresh disabled".to_owned()
        };
        info!("{message}");
        self.notify(ActivityLevel::Info, message);
        enabled
    }

    pub fn auto_refresh_enabled(&self) -> bool {
        *self.inner.auto_refresh.borrow()
    }

    // ── Live updates ─────────────────────────────────────────────────

    /// Open the live update socket with automatic reconnect.
    pub async fn start_live_channel(&self) -> Result<(), FetchError> {
        self.start_live_channel_with(WsConnector).await
    }

    /// Like [`start_live_channel`](Self::start_live_channel) with a custom
    /// [`Connector`]. A second call while a channel is running is a no-op.
    pub async fn start_live_channel_with<C: Connector>(&self, connector: C) -> Result<(), FetchError> {
        let url = live_endpoint(&with_trailing_slash(&self.inner.config.server))?;

        let mut slot = self.inner.live.lock().await;
        if slot.is_some() {
            debug!("live channel already running");
            return Ok(());
        }

        let cancel = self.inner.cancel.child_token();
        let reconnect = ReconnectConfig {
            delay: self.inner.config.reconnect_delay,
        };
        let channel = LiveChannel::spawn_with(connector, url, reconnect, cancel.clone());

        let handle = tokio::spawn(live_bridge_task(
            self.clone(),
            channel.subscribe(),
            channel.state(),
            cancel,
        ));
        self.inner.task_handles.lock().await.push(handle);
        *slot = Some(channel);

        Ok(())
    }

    fn record_metric(&self, event: &MetricEvent) {
        let at = event
            .ts
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .unwrap_or_else(Utc::now);
        debug!(metric = %event.metric, value = event.value, "live update");
        self.inner.metrics.send_modify(|metrics| {
            Arc::make_mut(metrics).insert(event.metric.clone(), MetricReading {
                value: event.value,
                at,
            });
        });
    }

    // ── Selection ────────────────────────────────────────────────────

    /// Switch the device table to another network tab, page 1.
    pub fn select_network(&self, label: &str) {
        debug!(network = label, "selecting network");
        self.inner.store.select_network(label);
    }

    pub fn next_page(&self) {
        self.inner.store.step_page(1);
    }

    pub fn prev_page(&self) {
        self.inner.store.step_page(-1);
    }

    /// Jump to `page` (1-based), clamped into range.
    pub fn set_page(&self, page: i64) {
        self.inner.store.set_page(page);
    }

    // ── Observation ──────────────────────────────────────────────────

    /// Render the current snapshot at the current selection.
    pub fn view(&self) -> ViewModel {
        let snapshot = self.inner.store.current();
        render(
            snapshot.as_deref(),
            &self.inner.store.selection(),
            self.inner.store.page_size(),
        )
    }

    pub fn status(&self) -> watch::Receiver<SystemStatus> {
        self.inner.status.subscribe()
    }

    pub fn activity(&self) -> watch::Receiver<Activity> {
        self.inner.activity.subscribe()
    }

    pub fn metrics(&self) -> watch::Receiver<Arc<LiveMetrics>> {
        self.inner.metrics.subscribe()
    }

    pub fn live_state(&self) -> watch::Receiver<ChannelState> {
        self.inner.live_state.subscribe()
    }

    fn notify(&self, level: ActivityLevel, message: impl Into<String>) {
        self.inner.activity.send_replace(Activity::new(level, message));
    }
}

fn refresh_summary(monitors: Option<&[MonitorResult]>, networks: Option<&[NetworkGroup]>) -> String {
    let devices = networks.map(|groups| groups.iter().map(|g| g.devices.len()).sum::<usize>());
    match (monitors, devices) {
        (Some(m), Some(d)) => format!("Updated {} monitors, {d} devices", m.len()),
        (Some(m), None) => format!("Updated {} monitors", m.len()),
        (None, Some(d)) => format!("Updated {d} devices"),
        (None, None) => "Nothing to update".to_owned(),
    }
}

fn with_trailing_slash(url: &Url) -> Url {
    let mut url = url.clone();
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

// ── Background tasks ─────────────────────────────────────────────────

async fn refresh_task<F: Fetcher>(controller: Controller<F>, period: Duration, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval.tick().await; // consume the immediate first tick

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                let outcome = controller.refresh_monitors().await;
                if !outcome.errors().is_empty() {
                    warn!(errors = outcome.errors().len(), "periodic refresh failed");
                }
            }
        }
    }
}

/// Live channel → metric readings and connection state.
async fn live_bridge_task<F: Fetcher>(
    controller: Controller<F>,
    mut events: broadcast::Receiver<Arc<MetricEvent>>,
    mut state: watch::Receiver<ChannelState>,
    cancel: CancellationToken,
) {
    let mut state_open = true;

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            changed = state.changed(), if state_open => {
                if changed.is_err() {
                    state_open = false;
                    continue;
                }
                let current = *state.borrow_and_update();
                controller.inner.live_state.send_replace(current);
                if current == ChannelState::Connected {
                    controller.notify(ActivityLevel::Success, "Live updates connected");
                }
            }
            result = events.recv() => match result {
                Ok(event) => controller.record_metric(&event),
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!(skipped = n, "live bridge: receiver lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    }

    controller
        .inner
        .live_state
        .send_replace(ChannelState::Disconnected);
}

// ── Tests ────────────────────────────────────────────────────────────
