use serde::Deserialize;

use super::discovery::DiscoveryConfig;
use super::security::{IpFilterConfig, RateLimitConfig};
use super::telemetry::LoggingConfig;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Config {
    /// Label attached to interceptor log lines, e.g. "server" or "gateway"
    /// Default: "server"
    #[serde(default = "default_role")]
    pub role: String,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Rate limiting configuration
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    /// IP filtering configuration
    #[serde(default)]
    pub ip_filter: IpFilterConfig,
    /// Fixed-address discovery configuration
    #[serde(default)]
    pub discovery: DiscoveryConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            role: default_role(),
            logging: LoggingConfig::default(),
            rate_limit: RateLimitConfig::default(),
            ip_filter: IpFilterConfig::default(),
            discovery: DiscoveryConfig::default(),
        }
    }
}

fn default_role() -> String {
    "server".to_string()
}
