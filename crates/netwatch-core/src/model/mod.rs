// ── Domain model ──
//
// Canonical types the dashboard works with, independent of the wire
// shapes in netwatch-api.

pub mod device;
pub mod monitor;
pub mod network;
pub mod snapshot;

pub use device::Device;
pub use monitor::MonitorResult;
pub use network::{CidrParseError, Ipv4Cidr, NetworkDef, NetworkGroup, default_networks};
pub use snapshot::{Snapshot, ViewSelection};
