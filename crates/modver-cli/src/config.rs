//! Service configuration.
//!
//! Layered: built-in defaults, then an optional config file, then `MODVER_`
//! environment variables.

use std::path::PathBuf;

use modver_chain::ChainConfig;
use serde::{Deserialize, Serialize};

/// Top-level configuration for the service binary.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Chain layer: endpoint pools, client binary, failover bounds.
    pub chain: ChainConfig,

    /// Root directory for materialized binaries and extracted sources.
    pub workdir_root: PathBuf,

    /// Program the build toolchain is invoked through.
    pub toolchain_bin: String,

    /// External decoder printing one exported name per line for a module
    /// file. Optional: without it, extraction records modules with empty
    /// metadata.
    pub decoder_bin: Option<String>,

    /// Webhook receiving status notifications. Without it, notifications go
    /// to the log stream only.
    pub webhook_url: Option<String>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            chain: ChainConfig::default(),
            workdir_root: PathBuf::from("tmp"),
            toolchain_bin: "cargo".to_string(),
            decoder_bin: None,
            webhook_url: None,
        }
    }
}

impl ServiceConfig {
    /// Load configuration, layering file and environment over defaults.
    pub fn load(path: Option<&str>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder()
            .add_source(config::Config::try_from(&ServiceConfig::default())?);

        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("MODVER")
                .separator("__")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }
}
