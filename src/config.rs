//! Service configuration
//!
//! A single JSON file; every key is optional and falls back to the
//! defaults below. Loading always validates.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::device::DeviceOptions;
use crate::observability::Severity;
use crate::ring::DEFAULT_CAPACITY;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Result type for configuration
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Where the ingestion server stores received bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// The bounded record ring
    Device,
    /// A plain append file, never evicted
    File,
}

impl std::str::FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "device" => Ok(Backend::Device),
            "file" => Ok(Backend::File),
            other => Err(format!("unknown backend '{}', expected 'device' or 'file'", other)),
        }
    }
}

/// Configuration file structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Records retained by the device (default 10)
    #[serde(default = "default_capacity")]
    pub capacity: usize,

    /// Cap on staged, undelimited bytes; 0 disables the cap
    #[serde(default)]
    pub max_pending_bytes: usize,

    /// Bind host (default "0.0.0.0")
    #[serde(default = "default_host")]
    pub host: String,

    /// Bind port (default 9000)
    #[serde(default = "default_port")]
    pub port: u16,

    /// Storage backend for the server (default device)
    #[serde(default = "default_backend")]
    pub backend: Backend,

    /// Append file used by the file backend, removed on shutdown
    #[serde(default = "default_data_file")]
    pub data_file: PathBuf,

    /// Socket receive chunk size (default 512)
    #[serde(default = "default_recv_buffer")]
    pub recv_buffer_bytes: usize,

    /// Minimum log severity (default "info")
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_capacity() -> usize {
    DEFAULT_CAPACITY
}
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    9000
}
fn default_backend() -> Backend {
    Backend::Device
}
fn default_data_file() -> PathBuf {
    PathBuf::from("/var/tmp/ringlogdata")
}
fn default_recv_buffer() -> usize {
    512
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
            max_pending_bytes: 0,
            host: default_host(),
            port: default_port(),
            backend: default_backend(),
            data_file: default_data_file(),
            recv_buffer_bytes: default_recv_buffer(),
            log_level: default_log_level(),
        }
    }
}

impl Config {
    /// Load and validate configuration from a file
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content)
    }

    /// Parse and validate configuration from JSON text
    pub fn from_json(content: &str) -> ConfigResult<Self> {
        let config: Config = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` if given, otherwise use defaults
    pub fn load_or_default(path: Option<&Path>) -> ConfigResult<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Check every field for a usable value
    pub fn validate(&self) -> ConfigResult<()> {
        if self.capacity == 0 {
            return Err(ConfigError::Invalid("capacity must be > 0".into()));
        }

        if self.recv_buffer_bytes == 0 {
            return Err(ConfigError::Invalid("recv_buffer_bytes must be > 0".into()));
        }

        if self.host.trim().is_empty() {
            return Err(ConfigError::Invalid("host must not be empty".into()));
        }

        if self.backend == Backend::File && self.data_file.as_os_str().is_empty() {
            return Err(ConfigError::Invalid(
                "data_file is required for the file backend".into(),
            ));
        }

        self.severity()?;

        Ok(())
    }

    /// Parsed `log_level`
    pub fn severity(&self) -> ConfigResult<Severity> {
        self.log_level.parse().map_err(ConfigError::Invalid)
    }

    /// Options for constructing the device
    pub fn device_options(&self) -> DeviceOptions {
        DeviceOptions {
            capacity: self.capacity,
            max_pending_bytes: self.max_pending_bytes,
        }
    }

    /// `host:port` for binding
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.capacity, 10);
        assert_eq!(config.port, 9000);
        assert_eq!(config.backend, Backend::Device);
        assert_eq!(config.recv_buffer_bytes, 512);
        assert_eq!(config.socket_addr(), "0.0.0.0:9000");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_object_is_defaults() {
        assert_eq!(Config::from_json("{}").unwrap(), Config::default());
    }

    #[test]
    fn test_partial_override() {
        let config = Config::from_json(r#"{"capacity": 3, "backend": "file", "port": 9100}"#).unwrap();
        assert_eq!(config.capacity, 3);
        assert_eq!(config.backend, Backend::File);
        assert_eq!(config.port, 9100);
        assert_eq!(config.host, "0.0.0.0");
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let err = Config::from_json(r#"{"capacity": 0}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_bad_log_level_rejected() {
        assert!(Config::from_json(r#"{"log_level": "chatty"}"#).is_err());
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert!(matches!(
            Config::from_json(r#"{"capacty": 3}"#),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"capacity": 4, "max_pending_bytes": 64}}"#).unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(
            config.device_options(),
            DeviceOptions {
                capacity: 4,
                max_pending_bytes: 64
            }
        );
    }

    #[test]
    fn test_missing_file() {
        let err = Config::load(Path::new("/nonexistent/ringlog.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_backend_from_str() {
        assert_eq!("file".parse::<Backend>().unwrap(), Backend::File);
        assert!("disk".parse::<Backend>().is_err());
    }
}
