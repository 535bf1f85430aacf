use chrono::{DateTime, Utc};
/// A host discovered on one of the scanned networks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Device {
    pub ip: String,
    pub mac: Option<String>,
    pub hostname: Option<String>,
    pub ok: bool,
    /// Label of the network the server attributed this host to.
    pub network: Option<String>,
    pub last_seen: Option<DateTime<Utc>>,
}
