use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::RemoteSettings;

/// Name of the configuration file expected next to the executable.
pub const CONFIG_FILENAME: &str = "config.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not locate the running executable: {0}")]
    Locate(#[source] io::Error),
    #[error("failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Run configuration. Loaded once at startup and never written back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Base URL of the klip server, used verbatim as an endpoint prefix.
    pub server_url: String,
    /// Directory receiving downloaded articles.
    pub download_path: PathBuf,
    /// Total bound for the pending-list request.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Idle bound between body reads, the only limit on article downloads.
    #[serde(default = "default_read_timeout_secs")]
    pub read_timeout_secs: u64,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// Bound for the batch acknowledgment request.
    #[serde(default = "default_ack_timeout_secs")]
    pub ack_timeout_secs: u64,
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_read_timeout_secs() -> u64 {
    30
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_ack_timeout_secs() -> u64 {
    5
}

impl SyncConfig {
    pub fn new(server_url: impl Into<String>, download_path: impl Into<PathBuf>) -> Self {
        Self {
            server_url: server_url.into(),
            download_path: download_path.into(),
            request_timeout_secs: default_request_timeout_secs(),
            read_timeout_secs: default_read_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            ack_timeout_secs: default_ack_timeout_secs(),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = Url::parse(&self.server_url).map_err(|err| {
            ConfigError::Invalid(format!("server_url {:?}: {err}", self.server_url))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::Invalid(format!(
                "server_url {:?}: unsupported scheme {}",
                self.server_url,
                url.scheme()
            )));
        }
        if self.download_path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("download_path is empty".into()));
        }
        for (name, value) in [
            ("request_timeout_secs", self.request_timeout_secs),
            ("read_timeout_secs", self.read_timeout_secs),
            ("connect_timeout_secs", self.connect_timeout_secs),
            ("ack_timeout_secs", self.ack_timeout_secs),
        ] {
            if value == 0 {
                return Err(ConfigError::Invalid(format!("{name} must be greater than 0")));
            }
        }
        Ok(())
    }

    pub fn remote_settings(&self) -> RemoteSettings {
        RemoteSettings {
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            read_timeout: Duration::from_secs(self.read_timeout_secs),
            ack_timeout: Duration::from_secs(self.ack_timeout_secs),
        }
    }
}

/// `config.json` in the directory holding the running executable.
pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    let exe = std::env::current_exe().map_err(ConfigError::Locate)?;
    let dir = exe.parent().ok_or_else(|| {
        ConfigError::Locate(io::Error::new(
            io::ErrorKind::NotFound,
            "executable has no parent directory",
        ))
    })?;
    Ok(dir.join(CONFIG_FILENAME))
}

/// Read, parse and validate the config file at `path`.
pub fn load_config(path: &Path) -> Result<SyncConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let config: SyncConfig =
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_config(dir: &Path, content: &str) -> PathBuf {
        let path = dir.join(CONFIG_FILENAME);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn loads_minimal_config_with_default_timeouts() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = write_config(
            dir.path(),
            r#"{"server_url":"http://klip.local:3000","download_path":"/books/klip"}"#,
        );

        let config = load_config(&path).unwrap();
        assert_eq!(config, SyncConfig::new("http://klip.local:3000", "/books/klip"));

        let settings = config.remote_settings();
        assert_eq!(settings.request_timeout, Duration::from_secs(30));
        assert_eq!(settings.read_timeout, Duration::from_secs(30));
        assert_eq!(settings.connect_timeout, Duration::from_secs(10));
        assert_eq!(settings.ack_timeout, Duration::from_secs(5));
    }

    #[test]
    fn explicit_timeouts_override_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = write_config(
            dir.path(),
            r#"{"server_url":"https://klip.example","download_path":"out",
                "request_timeout_secs":120,"read_timeout_secs":90,"ack_timeout_secs":2}"#,
        );

        let config = load_config(&path).unwrap();
        assert_eq!(config.request_timeout_secs, 120);
        assert_eq!(config.read_timeout_secs, 90);
        assert_eq!(config.connect_timeout_secs, 10);
        assert_eq!(config.ack_timeout_secs, 2);
    }

    #[test]
    fn server_url_is_not_normalized() {
        let config = SyncConfig::new("http://klip.local/", "out");
        config.validate().unwrap();
        assert_eq!(config.server_url, "http://klip.local/");
    }

    #[test]
    fn missing_file_is_read_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = load_config(&dir.path().join(CONFIG_FILENAME)).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn malformed_json_is_parse_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = write_config(dir.path(), r#"{"server_url": "http://x""#);
        assert!(matches!(
            load_config(&path).unwrap_err(),
            ConfigError::Parse { .. }
        ));
    }

    #[test]
    fn missing_required_field_is_parse_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = write_config(dir.path(), r#"{"server_url":"http://x"}"#);
        assert!(matches!(
            load_config(&path).unwrap_err(),
            ConfigError::Parse { .. }
        ));
    }

    #[test]
    fn rejects_invalid_values() {
        assert!(SyncConfig::new("not a url", "out").validate().is_err());
        assert!(SyncConfig::new("ftp://klip.local", "out").validate().is_err());
        assert!(SyncConfig::new("http://klip.local", "").validate().is_err());

        let mut config = SyncConfig::new("http://klip.local", "out");
        config.ack_timeout_secs = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("ack_timeout_secs"));
    }

    #[test]
    fn default_path_sits_next_to_executable() {
        let path = default_config_path().unwrap();
        assert_eq!(path.file_name().unwrap(), CONFIG_FILENAME);
        let exe = std::env::current_exe().unwrap();
        assert_eq!(path.parent(), exe.parent());
    }
}
