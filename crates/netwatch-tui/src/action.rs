//! All possible UI actions. Actions are the sole mechanism for state mutation.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    // ── Lifecycle ──────────────────────────────────────────────────
    Quit,
    Render,
    Resize(u16, u16),

    // ── Data ──────────────────────────────────────────────────────
    /// Full refresh of monitors and devices.
    Refresh,
    /// Ask the server to rescan the networks.
    Rescan,
    ToggleAutoRefresh,
    /// Something observable changed in the controller.
    StateChanged,

    // ── Navigation ────────────────────────────────────────────────
    NextNetwork,
    PrevNetwork,
    /// Select the network tab at this 0-based position.
    SelectNetwork(usize),
    NextPage,
    PrevPage,

    // ── Help ──────────────────────────────────────────────────────
    ToggleHelp,
}
