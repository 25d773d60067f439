//! Client configuration loaded from YAML.

use crate::error::{ClientError, ClientResult};
use crate::local_server::{DEFAULT_ADDITIVE_SERVICE_PORT, DEFAULT_PRODUCT_VERSION};
use crate::network::TransportMode;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::Level;

/// Environment variable naming a server to connect to when none is configured.
pub const ADDRESS_ENV_VAR: &str = "ANSYS_ADDITIVE_ADDRESS";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Server targets of the form `host:port`.
    pub server_connections: Vec<String>,
    pub host: Option<String>,
    pub port: u16,
    /// Local servers to launch when no address is given.
    pub nservers: u32,
    pub nsims_per_server: u32,
    pub product_version: String,
    pub linux_install_path: Option<PathBuf>,
    pub user_data_path: Option<PathBuf>,
    /// `insecure`, `mtls` or `uds`.
    pub transport_mode: TransportMode,
    /// Allow insecure connections to hosts other than this machine.
    pub allow_remote_host: bool,
    /// Default maximum log level of the command line tools.
    pub log_level: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_connections: Vec::new(),
            host: None,
            port: DEFAULT_ADDITIVE_SERVICE_PORT,
            nservers: 1,
            nsims_per_server: 1,
            product_version: DEFAULT_PRODUCT_VERSION.to_string(),
            linux_install_path: None,
            user_data_path: None,
            transport_mode: TransportMode::default(),
            allow_remote_host: false,
            log_level: "info".to_string(),
        }
    }
}

impl ClientConfig {
    pub fn load(path: &Path) -> ClientResult<Self> {
        let content = fs::read_to_string(path).map_err(|source| ClientError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> ClientResult<Self> {
        let config: ClientConfig = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_yaml(&self) -> ClientResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn validate(&self) -> ClientResult<()> {
        if self.nsims_per_server < 1 {
            return Err(ClientError::Config(
                "Number of simulations per server must be greater than zero.".to_string(),
            ));
        }
        if self.server_connections.is_empty() && self.host.is_none() && self.nservers < 1 {
            return Err(ClientError::Config(
                "nservers must be at least 1 when no server address is given".to_string(),
            ));
        }
        self.max_log_level()?;
        Ok(())
    }

    pub fn max_log_level(&self) -> ClientResult<Level> {
        self.log_level.parse::<Level>().map_err(|_| {
            ClientError::Config(format!("Invalid log_level '{}'", self.log_level))
        })
    }

    /// Configured user data path, or the platform default.
    pub fn resolved_user_data_path(&self) -> PathBuf {
        self.user_data_path
            .clone()
            .unwrap_or_else(default_user_data_path)
    }

    pub fn product_version(&self) -> &str {
        if self.product_version.is_empty() {
            DEFAULT_PRODUCT_VERSION
        } else {
            &self.product_version
        }
    }
}

/// Platform data directory for the application, or `./additive_data`.
pub fn default_user_data_path() -> PathBuf {
    directories::ProjectDirs::from("", "", "additive")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("additive_data"))
}
