use chrono::{DateTime, Utc};
/// Latest probe outcome for one monitored host.
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorResult {
    /// Display name; falls back to the host when the server sends none.
    pub name: String,
    pub host: String,
    pub ok: bool,
    /// Round-trip time in milliseconds, when the probe measured one.
    pub rtt_ms: Option<f64>,
    pub mac: Option<String>,
    /// When the probe ran. `None` if the server omitted or garbled it.
    pub timestamp: Option<DateTime<Utc>>,
}

impl MonitorResult {
    /// Name to show in listings: the name, else the host.
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.host
        } else {
            &self.name
        }
    }
}
