use grpcx::config::{load_from_path, parse_config, IpFilterMode, LimitBy};
use grpcx::GrpcxError;
use std::io::Write;
use tempfile::NamedTempFile;

type TestResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

#[test]
fn test_loads_full_file() -> TestResult {
    let mut file = NamedTempFile::new()?;
    writeln!(
        file,
        r#"
role = "gateway"

[logging]
level = "debug"
show_target = true

[rate_limit]
enabled = true
requests_per_second = 2.5
burst = 10
limit_by = "method"
idle_timeout_secs = 600

[ip_filter]
mode = "allowlist"
allowlist = ["10.0.0.0/8", "192.168.1.7", "::1"]

[discovery]
addresses = ["10.0.0.1:9000", "10.0.0.2:9000"]
"#
    )?;

    let config = load_from_path(file.path())?;
    assert_eq!(config.role, "gateway");
    assert_eq!(config.logging.level, "debug");
    assert!(config.logging.show_target);

    assert!(config.rate_limit.enabled);
    assert_eq!(config.rate_limit.requests_per_second, 2.5);
    assert_eq!(config.rate_limit.burst, 10);
    assert_eq!(config.rate_limit.limit_by, LimitBy::Method);
    assert_eq!(config.rate_limit.idle_timeout_secs, Some(600));
    assert_eq!(config.rate_limit.clean_interval_secs, 21600);

    assert_eq!(config.ip_filter.mode, IpFilterMode::Allowlist);
    let nets: Vec<String> = config.ip_filter.allowlist.iter().map(|n| n.to_string()).collect();
    assert_eq!(nets, vec!["10.0.0.0/8", "192.168.1.7/32", "::1/128"]);

    assert_eq!(config.discovery.addresses.len(), 2);
    Ok(())
}

#[test]
fn test_empty_file_uses_defaults() -> TestResult {
    let config = parse_config("")?;
    assert_eq!(config.role, "server");
    assert_eq!(config.logging.level, "info");
    assert!(!config.rate_limit.enabled);
    assert_eq!(config.rate_limit.requests_per_second, 50.0);
    assert_eq!(config.rate_limit.burst, 100);
    assert_eq!(config.rate_limit.limit_by, LimitBy::Peer);
    assert_eq!(config.ip_filter.mode, IpFilterMode::Disabled);
    assert!(config.discovery.addresses.is_empty());
    Ok(())
}

#[test]
fn test_rejects_zero_burst() {
    let result = parse_config("[rate_limit]\nburst = 0\n");
    assert!(matches!(result, Err(GrpcxError::Config(msg)) if msg.contains("burst")));
}

#[test]
fn test_rejects_negative_rate() {
    let result = parse_config("[rate_limit]\nrequests_per_second = -1.0\n");
    assert!(matches!(result, Err(GrpcxError::Config(_))));
}

#[test]
fn test_rejects_duplicate_discovery_address() {
    let result = parse_config("[discovery]\naddresses = [\"a:1\", \"a:1\"]\n");
    assert!(matches!(result, Err(GrpcxError::Config(msg)) if msg.contains("Duplicate")));
}

#[test]
fn test_rejects_bad_network() {
    let result = parse_config("[ip_filter]\nmode = \"denylist\"\ndenylist = [\"not-an-ip\"]\n");
    assert!(matches!(result, Err(GrpcxError::Config(_))));
}

#[test]
fn test_rejects_unknown_mode() {
    let result = parse_config("[ip_filter]\nmode = \"sometimes\"\n");
    assert!(matches!(result, Err(GrpcxError::Config(_))));
}

#[test]
fn test_missing_file() {
    let result = load_from_path("/definitely/not/here/grpcx.toml");
    assert!(matches!(result, Err(GrpcxError::Config(_))));
}
