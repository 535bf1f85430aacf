// netwatch-api: Async Rust client for the netwatch monitor server (REST + live updates)

pub mod client;
pub mod error;
pub mod live;
pub mod models;
pub mod transport;

pub use client::NetwatchClient;
pub use error::Error;
pub use live::{ChannelState, Connector, LiveChannel, ReconnectConfig, live_endpoint};
pub use models::{DevicePageResponse, DeviceRecord, MetricEvent, MonitorResult, WireTimestamp};
pub use transport::{TlsMode, TransportConfig};
