// ── Networks ──
//
// Configured scan targets (`NetworkDef`) and the per-network device
// groups assembled from them (`NetworkGroup`).

use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

use super::Device;

// ── Ipv4Cidr ─────────────────────────────────────────────────────────

/// An IPv4 network in CIDR notation, host bits cleared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ipv4Cidr {
    network: Ipv4Addr,
    prefix: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CidrParseError {
    #[error("missing '/' prefix length")]
    MissingPrefix,
    #[error("invalid IPv4 address: {0}")]
    Address(String),
    #[error("invalid prefix length: {0}")]
    Prefix(String),
}

impl Ipv4Cidr {
    /// Build from an address and prefix length; host bits are masked off.
    pub fn new(addr: Ipv4Addr, prefix: u8) -> Result<Self, CidrParseError> {
        if prefix > 32 {
            return Err(CidrParseError::Prefix(prefix.to_string()));
        }
        let network = Ipv4Addr::from(u32::from(addr) & mask(prefix));
        Ok(Self { network, prefix })
    }

    pub fn network(&self) -> Ipv4Addr {
        self.network
    }

    pub fn prefix(&self) -> u8 {
        self.prefix
    }

    pub fn contains(&self, addr: Ipv4Addr) -> bool {
        u32::from(addr) & mask(self.prefix) == u32::from(self.network)
    }

    /// Whether a textual IPv4 address falls inside this network.
    /// Anything that does not parse as IPv4 is outside.
    pub fn contains_str(&self, addr: &str) -> bool {
        addr.parse::<Ipv4Addr>().is_ok_and(|a| self.contains(a))
    }
}

fn mask(prefix: u8) -> u32 {
    match prefix {
        0 => 0,
        p => u32::MAX << (32 - u32::from(p.min(32))),
    }
}

impl FromStr for Ipv4Cidr {
    type Err = CidrParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (addr, prefix) = s.trim().split_once('/').ok_or(CidrParseError::MissingPrefix)?;
        let addr: Ipv4Addr = addr
            .parse()
            .map_err(|_| CidrParseError::Address(addr.to_owned()))?;
        let prefix: u8 = prefix
            .parse()
            .map_err(|_| CidrParseError::Prefix(prefix.to_owned()))?;
        Self::new(addr, prefix)
    }
}

impl fmt::Display for Ipv4Cidr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.network, self.prefix)
    }
}

// ── NetworkDef ───────────────────────────────────────────────────────

/// A configured network: a tab label and the range it covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkDef {
    pub label: String,
    pub cidr: Ipv4Cidr,
}

impl NetworkDef {
    pub fn new(label: impl Into<String>, cidr: Ipv4Cidr) -> Self {
        Self {
            label: label.into(),
            cidr,
        }
    }
}

/// The two networks a stock install scans.
pub fn default_networks() -> Vec<NetworkDef> {
    vec![
        NetworkDef::new("2.4G", Ipv4Cidr {
            network: Ipv4Addr::new(192, 168, 1, 0),
            prefix: 24,
        }),
        NetworkDef::new("5G", Ipv4Cidr {
            network: Ipv4Addr::new(192, 168, 2, 0),
            prefix: 24,
        }),
    ]
}

// ── NetworkGroup ─────────────────────────────────────────────────────

/// Devices seen on one network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkGroup {
    pub label: String,
    /// CIDR text; empty for groups the server reported without a range.
    pub cidr: String,
    pub devices: Vec<Device>,
}

impl NetworkGroup {
    pub fn new(label: impl Into<String>, cidr: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            cidr: cidr.into(),
            devices: Vec::new(),
        }
    }

    pub fn online_count(&self) -> usize {
        self.devices.iter().filter(|d| d.ok).count()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_masks_host_bits() {
        let cidr: Ipv4Cidr = "192.168.1.77/24".parse().unwrap();
        assert_eq!(cidr.to_string(), "192.168.1.0/24");
        assert_eq!(cidr.prefix(), 24);
    }

    #[test]
    fn contains_respects_prefix() {
        let cidr: Ipv4Cidr = "10.0.0.0/30".parse().unwrap();
        assert!(cidr.contains_str("10.0.0.3"));
        assert!(!cidr.contains_str("10.0.0.4"));
        assert!(!cidr.contains_str("fe80::1"));
        assert!(!cidr.contains_str("not-an-ip"));
    }

    #[test]
    fn zero_and_full_prefixes() {
        let any: Ipv4Cidr = "0.0.0.0/0".parse().unwrap();
        assert!(any.contains_str("203.0.113.9"));
        let host: Ipv4Cidr = "192.168.2.5/32".parse().unwrap();
        assert!(host.contains_str("192.168.2.5"));
        assert!(!host.contains_str("192.168.2.6"));
    }

    #[test]
    fn rejects_malformed_cidrs() {
        assert_eq!(
            "192.168.1.0".parse::<Ipv4Cidr>(),
            Err(CidrParseError::MissingPrefix)
        );
        assert!(matches!(
            "192.168.1/24".parse::<Ipv4Cidr>(),
            Err(CidrParseError::Address(_))
        ));
        assert!(matches!(
            "192.168.1.0/33".parse::<Ipv4Cidr>(),
            Err(CidrParseError::Prefix(_))
        ));
    }

    #[test]
    fn default_networks_are_the_two_bands() {
        let nets = default_networks();
        assert_eq!(nets[0].label, "2.4G");
        assert_eq!(nets[0].cidr.to_string(), "192.168.1.0/24");
        assert_eq!(nets[1].label, "5G");
        assert_eq!(nets[1].cidr.to_string(), "192.168.2.0/24");
    }
}
