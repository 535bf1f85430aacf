//! Data bridge: connects [`Controller`] watch channels to TUI actions.
//!
//! Runs as a background task. Starts the controller (initial refresh,
//! auto-refresh, live updates), then forwards every observable change as
//! [`Action::StateChanged`] through the TUI's action channel.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use netwatch_core::{Controller, Fetcher};

use crate::action::Action;

pub async fn spawn_data_bridge<F: Fetcher>(
    controller: Controller<F>,
    action_tx: mpsc::UnboundedSender<Action>,
    cancel: CancellationToken,
) {
    let mut snapshot = controller.store().subscribe();
    let mut selection = controller.store().subscribe_selection();
    let mut status = controller.status();
    let mut activity = controller.activity();
    let mut metrics = controller.metrics();
    let mut live = controller.live_state();

    let _ = action_tx.send(Action::StateChanged);

    tokio::select! {
        biased;
        () = cancel.cancelled() => return,
        outcome = controller.start() => debug!(?outcome, "initial refresh finished"),
    }

    loop {
        let changed = tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            r = snapshot.changed() => r,
            r = selection.changed() => r,
            r = status.changed() => r,
            r = activity.changed() => r,
            r = metrics.changed() => r,
            r = live.changed() => r,
        };

        if changed.is_err() || action_tx.send(Action::StateChanged).is_err() {
            break;
        }
    }

    debug!("data bridge stopped");
}
