use ipnet::IpNet;
use std::net::IpAddr;

use crate::config::{IpFilterConfig, IpFilterMode};

/// Which way an [`IpAccessList`] applies its networks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    /// Only callers inside the networks pass.
    Allow,
    /// Callers inside the networks are rejected.
    Deny,
}

/// A fixed set of addresses/networks checked against the caller IP.
#[derive(Debug, Clone, PartialEq)]
pub struct IpAccessList {
    mode: AccessMode,
    networks: Vec<IpNet>,
}

impl IpAccessList {
    pub fn allow(networks: Vec<IpNet>) -> Self {
        Self { mode: AccessMode::Allow, networks }
    }

    pub fn deny(networks: Vec<IpNet>) -> Self {
        Self { mode: AccessMode::Deny, networks }
    }

    /// Build from configuration; `None` when filtering is disabled.
    pub fn from_config(config: &IpFilterConfig) -> Option<Self> {
        match config.mode {
            IpFilterMode::Disabled => None,
            IpFilterMode::Allowlist => Some(Self::allow(config.allowlist.clone())),
            IpFilterMode::Denylist => Some(Self::deny(config.denylist.clone())),
        }
    }

    pub fn mode(&self) -> AccessMode {
        self.mode
    }

    pub fn contains(&self, ip: IpAddr) -> bool {
        self.networks.iter().any(|net| net.contains(&ip))
    }

    /// Whether a caller at `ip` may proceed.
    ///
    /// A caller whose address cannot be resolved is never inside the set: an
    /// allow-list rejects it, a deny-list lets it through.
    pub fn permits(&self, ip: Option<IpAddr>) -> bool {
        let listed = ip.is_some_and(|ip| self.contains(ip));
        match self.mode {
            AccessMode::Allow => listed,
            AccessMode::Deny => !listed,
        }
    }
}

/// Check an IP against the filter configuration.
///
/// - `Disabled`: always allowed
/// - `Allowlist`: allowed only when inside one of the allowlist networks
/// - `Denylist`: rejected when inside one of the denylist networks
pub fn is_ip_allowed(ip: IpAddr, config: &IpFilterConfig) -> bool {
    IpAccessList::from_config(config).is_none_or(|list| list.permits(Some(ip)))
}
