use ipnet::IpNet;
use serde::Deserialize;

/// IP filtering mode
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum IpFilterMode {
    /// IP filtering is disabled (allow all)
    #[default]
    Disabled,
    /// Only allow callers in the allowlist
    Allowlist,
    /// Reject callers in the denylist
    Denylist,
}

/// IP filtering (ACL) configuration
#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
pub struct IpFilterConfig {
    /// Filtering mode
    #[serde(default)]
    pub mode: IpFilterMode,
    /// Allowlist: only these IPs/networks may call (when mode = "allowlist")
    /// Accepts plain addresses and CIDR: ["1.2.3.4", "192.168.1.0/24", "::1"]
    #[serde(default)]
    #[serde(deserialize_with = "deserialize_ip_networks")]
    pub allowlist: Vec<IpNet>,
    /// Denylist: these IPs/networks are rejected (when mode = "denylist")
    #[serde(default)]
    #[serde(deserialize_with = "deserialize_ip_networks")]
    pub denylist: Vec<IpNet>,
}

/// Parse an address or network; a bare address becomes a host network (/32 or /128).
pub fn parse_ip_network(s: &str) -> Result<IpNet, String> {
    let s = s.trim();
    if let Ok(net) = s.parse::<IpNet>() {
        return Ok(net);
    }
    let addr = s
        .parse::<std::net::IpAddr>()
        .map_err(|e| format!("Invalid IP network '{s}': {e}"))?;
    let host_prefix = if addr.is_ipv4() { 32 } else { 128 };
    IpNet::new(addr, host_prefix).map_err(|e| format!("Invalid IP network '{s}': {e}"))
}

fn deserialize_ip_networks<'de, D>(deserializer: D) -> Result<Vec<IpNet>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let strings: Vec<String> = Vec::deserialize(deserializer)?;
    strings
        .iter()
        .map(|s| parse_ip_network(s).map_err(serde::de::Error::custom))
        .collect()
}

/// Rate limiting configuration
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct RateLimitConfig {
    /// Enable the rate limiting interceptor
    /// Default: false
    #[serde(default)]
    pub enabled: bool,
    /// Token refill rate per key, in events per second
    /// Default: 50
    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: f64,
    /// Bucket capacity per key (must be >= 1)
    /// Default: 100
    #[serde(default = "default_burst")]
    pub burst: u32,
    /// Key extraction strategy
    /// Default: "peer"
    #[serde(default)]
    pub limit_by: LimitBy,
    /// Evict limiters idle for at least this many seconds (and fully refilled)
    /// Default: None (keys are never evicted)
    #[serde(default)]
    pub idle_timeout_secs: Option<u64>,
    /// How often the idle sweep runs, in seconds
    /// Default: 21600 (6 hours)
    #[serde(default = "default_clean_interval_secs")]
    pub clean_interval_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            requests_per_second: default_requests_per_second(),
            burst: default_burst(),
            limit_by: LimitBy::default(),
            idle_timeout_secs: None,
            clean_interval_secs: default_clean_interval_secs(),
        }
    }
}

/// Rate limiting key extraction strategy
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LimitBy {
    /// One bucket per transport peer IP
    #[default]
    Peer,
    /// One bucket per fully-qualified method, shared by all callers
    Method,
}

impl LimitBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            LimitBy::Peer => "peer",
            LimitBy::Method => "method",
        }
    }
}

fn default_requests_per_second() -> f64 {
    crate::security::rate_limit::DEFAULT_RATE
}

fn default_burst() -> u32 {
    crate::security::rate_limit::DEFAULT_BURST
}

fn default_clean_interval_secs() -> u64 {
    crate::security::rate_limit::DEFAULT_CLEAN_INTERVAL.as_secs()
}
