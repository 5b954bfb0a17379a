use crate::config::{Config, ConfigError};
use pretty_assertions::assert_eq;
use rstest::rstest;
use serial_test::serial;
use std::env;
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;

const VARS: [&str; 6] = [
    "TASKLANE_HOST",
    "PORT",
    "DATABASE_PATH",
    "UPLOAD_DIR",
    "CORS_ORIGIN",
    "MAX_UPLOAD_BYTES",
];

fn clear_env() {
    for var in VARS {
        env::remove_var(var);
    }
}

#[test]
#[serial]
fn test_config_from_env_defaults() {
    clear_env();

    let config = Config::from_env().unwrap();

    assert_eq!(config.host, IpAddr::V4(Ipv4Addr::LOCALHOST));
    assert_eq!(config.port, 5000);
    assert_eq!(config.cors_origin, "http://localhost:3000");
    assert_eq!(config.max_upload_bytes, 5 * 1024 * 1024);
    assert!(config.database_path.ends_with(".tasklane/tasklane.db"));
    assert!(config.upload_dir.ends_with(".tasklane/uploads"));
}

#[test]
#[serial]
fn test_config_from_env_with_all_custom() {
    clear_env();
    env::set_var("TASKLANE_HOST", "0.0.0.0");
    env::set_var("PORT", "8080");
    env::set_var("DATABASE_PATH", "/tmp/tasklane-test.db");
    env::set_var("UPLOAD_DIR", "/tmp/tasklane-uploads");
    env::set_var("CORS_ORIGIN", "https://app.example.com");
    env::set_var("MAX_UPLOAD_BYTES", "1024");

    let config = Config::from_env().unwrap();

    assert_eq!(config.host, IpAddr::V4(Ipv4Addr::UNSPECIFIED));
    assert_eq!(config.port, 8080);
    assert_eq!(config.database_path, PathBuf::from("/tmp/tasklane-test.db"));
    assert_eq!(config.upload_dir, PathBuf::from("/tmp/tasklane-uploads"));
    assert_eq!(config.cors_origin, "https://app.example.com");
    assert_eq!(config.max_upload_bytes, 1024);

    clear_env();
}

#[test]
#[serial]
fn test_config_port_zero() {
    clear_env();
    env::set_var("PORT", "0");

    let result = Config::from_env();

    assert!(matches!(result.unwrap_err(), ConfigError::PortOutOfRange(0)));

    clear_env();
}

#[rstest]
#[case("1", 1)]
#[case("80", 80)]
#[case("65535", 65535)]
#[serial]
fn test_valid_port_numbers(#[case] port_str: &str, #[case] expected: u16) {
    clear_env();
    env::set_var("PORT", port_str);

    let config = Config::from_env().unwrap();

    assert_eq!(config.port, expected);

    clear_env();
}

#[rstest]
#[case("-1")]
#[case("65536")]
#[case("1.5")]
#[case("not-a-number")]
#[serial]
fn test_invalid_port_formats(#[case] port_str: &str) {
    clear_env();
    env::set_var("PORT", port_str);

    let result = Config::from_env();

    assert!(matches!(result.unwrap_err(), ConfigError::InvalidPort(_)));

    clear_env();
}

#[rstest]
#[case("0")]
#[case("lots")]
#[case("-5")]
#[serial]
fn test_invalid_upload_limit(#[case] value: &str) {
    clear_env();
    env::set_var("MAX_UPLOAD_BYTES", value);

    let result = Config::from_env();

    assert!(matches!(
        result.unwrap_err(),
        ConfigError::InvalidUploadLimit(_)
    ));

    clear_env();
}

#[test]
#[serial]
fn test_invalid_host() {
    clear_env();
    env::set_var("TASKLANE_HOST", "localhost:80");

    let result = Config::from_env();

    assert!(matches!(result.unwrap_err(), ConfigError::InvalidHost(_)));

    clear_env();
}

#[test]
#[serial]
fn test_port_override() {
    clear_env();

    let config = Config::from_env().unwrap().with_port(7000).unwrap();
    assert_eq!(config.port, 7000);

    let result = Config::from_env().unwrap().with_port(0);
    assert!(matches!(result.unwrap_err(), ConfigError::PortOutOfRange(0)));
}

#[test]
fn test_config_error_display() {
    let error = ConfigError::PortOutOfRange(0);
    assert_eq!(error.to_string(), "Port 0 is out of valid range (1-65535)");

    let error = ConfigError::InvalidUploadLimit("lots".to_string());
    assert_eq!(error.to_string(), "Invalid upload limit: lots");
}
