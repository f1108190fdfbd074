mod discovery;
mod loader;
mod root;
mod security;
mod telemetry;

pub use discovery::DiscoveryConfig;
pub use loader::{load_from_path, parse_config, validate_config};
pub use root::Config;
pub use security::{parse_ip_network, IpFilterConfig, IpFilterMode, LimitBy, RateLimitConfig};
pub use telemetry::LoggingConfig;
