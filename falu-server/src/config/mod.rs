//! Configuration loading.

mod file;

pub use file::{CacheConfig, FileConfig, OracleConfig, PeerConfig, ServerConfig};

use anyhow::Context;
use falu_sdk::objects::OracleType;
use std::net::SocketAddr;
use std::path::Path;

/// Read and validate the TOML configuration file.
///
/// `listen_override` (from the CLI) takes precedence over the file.
pub fn load_config(path: &Path, listen_override: Option<SocketAddr>) -> anyhow::Result<FileConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("unable to read config file {}", path.display()))?;
    let mut config: FileConfig =
        toml::from_str(&raw).with_context(|| format!("invalid config file {}", path.display()))?;

    if let Some(listen) = listen_override {
        config.server.listen = listen;
    }

    for oracle in &config.oracles {
        if oracle.oracle_type == OracleType::RemoteHttp && oracle.endpoint.is_none() {
            anyhow::bail!("oracle {} is remote-http but has no endpoint", oracle.id);
        }
    }

    Ok(config)
}

/// Get the database connection string from the environment.
pub fn get_database_url() -> anyhow::Result<String> {
    std::env::var("DATABASE_URL").context("DATABASE_URL environment variable not set")
}
