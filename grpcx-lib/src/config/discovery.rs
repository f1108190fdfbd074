use serde::Deserialize;

/// Static service discovery configuration
#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
pub struct DiscoveryConfig {
    /// Addresses the fixed resolver is seeded with
    /// Example: ["10.0.0.1:9000", "10.0.0.2:9000"]
    /// Default: empty
    #[serde(default)]
    pub addresses: Vec<String>,
}
