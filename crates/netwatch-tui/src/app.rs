//! Application core: event loop, key mapping, action dispatch.

use std::time::Duration;

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use netwatch_core::{Controller, Fetcher};

use crate::action::Action;
use crate::data_bridge::spawn_data_bridge;
use crate::event::{Event, EventReader};
use crate::tui::Tui;
use crate::ui::{self, DashboardState};

const RENDER_RATE: Duration = Duration::from_millis(100);

/// Top-level application state and event loop.
pub struct App<F: Fetcher> {
    controller: Controller<F>,
    state: DashboardState,
    running: bool,
    action_tx: mpsc::UnboundedSender<Action>,
    action_rx: mpsc::UnboundedReceiver<Action>,
}

impl<F: Fetcher> App<F> {
    pub fn new(controller: Controller<F>) -> Self {
        let (action_tx, action_rx) = mpsc::unbounded_channel();
        let state = DashboardState::new(controller.view());
        Self {
            controller,
            state,
            running: true,
            action_tx,
            action_rx,
        }
    }

    /// Run the main event loop until the user quits.
    pub async fn run(&mut self) -> Result<()> {
        let mut tui = Tui::new()?;
        tui.enter()?;

        let cancel = CancellationToken::new();
        let bridge = tokio::spawn(spawn_data_bridge(
            self.controller.clone(),
            self.action_tx.clone(),
            cancel.clone(),
        ));
        let mut events = EventReader::new(RENDER_RATE);

        info!("TUI event loop started");

        while self.running {
            let Some(event) = events.next().await else {
                break;
            };

            match event {
                Event::Key(key) => {
                    if let Some(action) = handle_key_event(key) {
                        self.action_tx.send(action)?;
                    }
                }
                Event::Resize(w, h) => self.action_tx.send(Action::Resize(w, h))?,
                Event::Render => self.action_tx.send(Action::Render)?,
            }

            while let Ok(action) = self.action_rx.try_recv() {
                self.process_action(&action);

                if matches!(action, Action::Render | Action::Resize(..)) {
                    tui.draw(|frame| ui::draw(frame, &self.state))?;
                }
            }
        }

        events.stop();
        cancel.cancel();
        let _ = bridge.await;
        self.controller.shutdown().await;
        tui.exit();

        info!("TUI event loop ended");
        Ok(())
    }

    /// Apply one action to the controller and local state.
    fn process_action(&mut self, action: &Action) {
        match action {
            Action::Quit => self.running = false,

            Action::Refresh => {
                let ctrl = self.controller.clone();
                tokio::spawn(async move {
                    let outcome = ctrl.manual_refresh().await;
                    debug!(?outcome, "manual refresh");
                });
            }

            Action::Rescan => {
                let ctrl = self.controller.clone();
                tokio::spawn(async move {
                    if let Err(e) = ctrl.rescan().await {
                        warn!(error = %e, "rescan failed");
                    }
                });
            }

            Action::ToggleAutoRefresh => {
                let ctrl = self.controller.clone();
                tokio::spawn(async move {
                    ctrl.toggle_auto_refresh().await;
                });
            }

            Action::NextNetwork => self.cycle_network(1),
            Action::PrevNetwork => self.cycle_network(-1),
            Action::SelectNetwork(index) => self.select_network(*index),

            Action::NextPage => {
                self.controller.next_page();
                self.sync_state();
            }
            Action::PrevPage => {
                self.controller.prev_page();
                self.sync_state();
            }

            Action::ToggleHelp => self.state.help_visible = !self.state.help_visible,

            Action::StateChanged => self.sync_state(),

            // Drawing happens in the main loop
            Action::Render | Action::Resize(..) => {}
        }
    }

    fn cycle_network(&mut self, step: isize) {
        let count = self.state.view.tabs.len();
        if count == 0 {
            return;
        }
        let current = self.state.active_tab().unwrap_or(0);
        let count_i = isize::try_from(count).unwrap_or(isize::MAX);
        let current_i = isize::try_from(current).unwrap_or(0);
        let next = usize::try_from((current_i + step).rem_euclid(count_i)).unwrap_or(0);
        self.select_network(next);
    }

    fn select_network(&mut self, index: usize) {
        let Some(label) = self.state.view.tabs.get(index).map(|t| t.label.clone()) else {
            return;
        };
        self.controller.select_network(&label);
        self.sync_state();
    }

    /// Pull the latest observable state from the controller.
    fn sync_state(&mut self) {
        let help_visible = self.state.help_visible;
        let started_at = self.state.started_at;
        self.state = DashboardState {
            view: self.controller.view(),
            status: self.controller.status().borrow().clone(),
            activity: self.controller.activity().borrow().clone(),
            metrics: self.controller.metrics().borrow().clone(),
            live: *self.controller.live_state().borrow(),
            auto_refresh: self.controller.auto_refresh_enabled(),
            help_visible,
            started_at,
        };
    }
}

/// Map a key press to an action.
pub fn handle_key_event(key: KeyEvent) -> Option<Action> {
    match (key.modifiers, key.code) {
        (KeyModifiers::CONTROL, KeyCode::Char('c'))
        | (KeyModifiers::NONE, KeyCode::Char('q')) => Some(Action::Quit),

        (KeyModifiers::NONE, KeyCode::Char('r')) => Some(Action::Refresh),
        (KeyModifiers::NONE, KeyCode::Char('s')) => Some(Action::Rescan),
        (KeyModifiers::NONE, KeyCode::Char('a')) => Some(Action::ToggleAutoRefresh),
        (KeyModifiers::NONE, KeyCode::Char('?')) => Some(Action::ToggleHelp),

        (KeyModifiers::NONE, KeyCode::Tab) => Some(Action::NextNetwork),
        (_, KeyCode::BackTab) => Some(Action::PrevNetwork),
        (KeyModifiers::NONE, KeyCode::Char(c @ '1'..='9')) => c
            .to_digit(10)
            .and_then(|d| usize::try_from(d).ok())
            .map(|d| Action::SelectNetwork(d - 1)),

        (KeyModifiers::NONE, KeyCode::Left | KeyCode::Char('h')) => Some(Action::PrevPage),
        (KeyModifiers::NONE, KeyCode::Right | KeyCode::Char('l')) => Some(Action::NextPage),

        _ => None,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use netwatch_core::{
        DashboardConfig, Device, DevicePage, FetchError, MonitorResult,
    };
    use pretty_assertions::assert_eq;
    use url::Url;

    use super::*;

    /// Serves a fixed LAN: 12 devices on 2.4G, 3 on 5G.
    struct StaticFetcher;

    fn lan() -> Vec<Device> {
        [("192.168.1", "2.4G", 12), ("192.168.2", "5G", 3)]
            .into_iter()
            .flat_map(|(prefix, label, n)| {
                (1..=n).map(move |i| Device {
                    ip: format!("{prefix}.{i}"),
                    mac: None,
                    hostname: None,
                    ok: true,
                    network: Some(label.to_owned()),
                    last_seen: None,
                })
            })
            .collect()
    }

    impl Fetcher for StaticFetcher {
        async fn fetch_monitors(&self) -> Result<Vec<MonitorResult>, FetchError> {
            Ok(Vec::new())
        }

        async fn fetch_devices(&self, page: u32, page_size: u32) -> Result<DevicePage, FetchError> {
            Ok(DevicePage {
                items: lan(),
                total_count: 15,
                page,
                page_size,
            })
        }

        async fn fetch_all_devices(&self, _page_size: u32) -> Result<Vec<Device>, FetchError> {
            Ok(lan())
        }

        async fn trigger_rescan(&self) -> Result<bool, FetchError> {
            Ok(true)
        }
    }

    async fn app() -> App<StaticFetcher> {
        let mut config = DashboardConfig::new(Url::parse("http://127.0.0.1:8000").unwrap());
        config.live_updates = false;
        config.auto_refresh = false;
        let controller = Controller::new(config, StaticFetcher);
        controller.refresh_all().await;
        let mut app = App::new(controller);
        app.process_action(&Action::StateChanged);
        app
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn page(app: &App<StaticFetcher>) -> usize {
        match &app.state.view.devices {
            netwatch_core::DevicesView::Table(t) => t.pagination.page,
            other => panic!("expected table, got {other:?}"),
        }
    }

    #[test]
    fn keys_map_to_actions() {
        assert_eq!(handle_key_event(key(KeyCode::Char('q'))), Some(Action::Quit));
        assert_eq!(
            handle_key_event(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Some(Action::Quit)
        );
        assert_eq!(handle_key_event(key(KeyCode::Char('r'))), Some(Action::Refresh));
        assert_eq!(handle_key_event(key(KeyCode::Char('s'))), Some(Action::Rescan));
        assert_eq!(
            handle_key_event(key(KeyCode::Char('a'))),
            Some(Action::ToggleAutoRefresh)
        );
        assert_eq!(
            handle_key_event(key(KeyCode::Char('2'))),
            Some(Action::SelectNetwork(1))
        );
        assert_eq!(handle_key_event(key(KeyCode::Right)), Some(Action::NextPage));
        assert_eq!(handle_key_event(key(KeyCode::Char('h'))), Some(Action::PrevPage));
        assert_eq!(handle_key_event(key(KeyCode::Char('x'))), None);
        assert_eq!(handle_key_event(key(KeyCode::Char('0'))), None);
    }

    #[tokio::test]
    async fn paging_and_tab_switching() {
        let mut app = app().await;
        assert_eq!(page(&app), 1);

        app.process_action(&Action::NextPage);
        app.process_action(&Action::NextPage);
        app.process_action(&Action::NextPage);
        assert_eq!(page(&app), 3);

        app.process_action(&Action::NextNetwork);
        assert_eq!(app.state.active_tab(), Some(1));
        assert_eq!(page(&app), 1);

        app.process_action(&Action::NextNetwork);
        assert_eq!(app.state.active_tab(), Some(0));

        app.process_action(&Action::PrevNetwork);
        assert_eq!(app.state.active_tab(), Some(1));

        app.process_action(&Action::SelectNetwork(0));
        assert_eq!(app.state.active_tab(), Some(0));
        app.process_action(&Action::SelectNetwork(7));
        assert_eq!(app.state.active_tab(), Some(0));
    }

    #[tokio::test]
    async fn help_survives_state_sync() {
        let mut app = app().await;
        app.process_action(&Action::ToggleHelp);
        app.process_action(&Action::StateChanged);
        assert!(app.state.help_visible);
        app.process_action(&Action::Quit);
        assert!(!app.running);
    }
}
