//! Configuration for the netting engine

use serde::{Deserialize, Serialize};

/// Netting engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Service name
    pub service_name: String,

    /// Service version
    pub service_version: String,

    /// Gateway listen address
    pub listen_addr: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service_name: "netting-engine".to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            listen_addr: "0.0.0.0:8080".to_string(),
        }
    }
}

impl Config {
    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| crate::Error::Config(format!("Failed to parse config: {}", e)))?;
        Ok(config)
    }

    /// Load from environment variables
    pub fn from_env() -> crate::Result<Self> {
        let mut config = Config::default();

        if let Ok(addr) = std::env::var("NETTING_LISTEN_ADDR") {
            config.listen_addr = addr;
        }

        if let Ok(name) = std::env::var("NETTING_SERVICE_NAME") {
            config.service_name = name;
        }

        Ok(config)
    }
}
