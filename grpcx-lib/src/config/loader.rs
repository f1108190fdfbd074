use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::config::Config;
use crate::error::{GrpcxError, Result};

pub fn load_from_path<P: AsRef<Path>>(p: P) -> Result<Config> {
    let txt = fs::read_to_string(p)
        .map_err(|e| GrpcxError::Config(format!("Failed to read config file: {e}")))?;
    parse_config(&txt)
}

pub fn parse_config(txt: &str) -> Result<Config> {
    let cfg: Config =
        toml::from_str(txt).map_err(|e| GrpcxError::Config(format!("Failed to parse config: {e}")))?;

    validate_config(&cfg)?;

    Ok(cfg)
}

pub fn validate_config(cfg: &Config) -> Result<()> {
    let rl = &cfg.rate_limit;
    if !rl.requests_per_second.is_finite() || rl.requests_per_second < 0.0 {
        return Err(GrpcxError::Config(format!(
            "rate_limit.requests_per_second must be a finite non-negative number, got {}",
            rl.requests_per_second
        )));
    }
    if rl.burst == 0 {
        return Err(GrpcxError::Config("rate_limit.burst must be >= 1".to_string()));
    }
    if rl.clean_interval_secs == 0 {
        return Err(GrpcxError::Config("rate_limit.clean_interval_secs must be > 0".to_string()));
    }

    let mut seen = HashSet::new();
    for address in &cfg.discovery.addresses {
        if address.trim().is_empty() {
            return Err(GrpcxError::Config("discovery address cannot be empty".to_string()));
        }
        if !seen.insert(address.as_str()) {
            return Err(GrpcxError::Config(format!("Duplicate discovery address: {address}")));
        }
    }

    Ok(())
}
