use std::env;
use std::net::{AddrParseError, IpAddr, Ipv4Addr};
use std::num::ParseIntError;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid port number: {0}")]
    InvalidPort(#[from] ParseIntError),
    #[error("Port {0} is out of valid range (1-65535)")]
    PortOutOfRange(u16),
    #[error("Invalid host address: {0}")]
    InvalidHost(#[from] AddrParseError),
    #[error("Invalid upload limit: {0}")]
    InvalidUploadLimit(String),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub database_path: PathBuf,
    pub upload_dir: PathBuf,
    pub cors_origin: String,
    pub max_upload_bytes: usize,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let host = match env::var("TASKLANE_HOST") {
            Ok(value) => value.trim().parse::<IpAddr>()?,
            Err(_) => IpAddr::V4(Ipv4Addr::LOCALHOST),
        };

        let port_str = env::var("PORT").unwrap_or_else(|_| "5000".to_string());
        let port = port_str.trim().parse::<u16>()?;
        if port == 0 {
            return Err(ConfigError::PortOutOfRange(port));
        }

        let database_path = env::var("DATABASE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| tasklane_core::default_database_path());

        let upload_dir = env::var("UPLOAD_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| tasklane_core::default_upload_dir());

        let cors_origin =
            env::var("CORS_ORIGIN").unwrap_or_else(|_| "http://localhost:3000".to_string());

        let max_upload_bytes = match env::var("MAX_UPLOAD_BYTES") {
            Ok(value) => match value.trim().parse::<usize>() {
                Ok(bytes) if bytes > 0 => bytes,
                _ => return Err(ConfigError::InvalidUploadLimit(value)),
            },
            Err(_) => tasklane_core::DEFAULT_MAX_UPLOAD_BYTES,
        };

        Ok(Config {
            host,
            port,
            database_path,
            upload_dir,
            cors_origin,
            max_upload_bytes,
        })
    }

    /// Override the configured port, e.g. from a command-line flag
    pub fn with_port(mut self, port: u16) -> Result<Self, ConfigError> {
        if port == 0 {
            return Err(ConfigError::PortOutOfRange(port));
        }
        self.port = port;
        Ok(self)
    }
}
