//! TOML file configuration structures.
//!
//! These structs directly map to the `falu-config.toml` file format.

use falu_sdk::objects::{Oracle, OracleType};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

/// Root configuration structure as read from the TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    /// Optional peer deployment consulted for party types no local oracle
    /// routes.
    #[serde(default)]
    pub peer: Option<PeerConfig>,
    /// Oracle registry. When empty, the registry is loaded from the
    /// `oracle_registry` table instead.
    #[serde(default)]
    pub oracles: Vec<OracleConfig>,
}

/// Server configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The address and port to listen on (e.g., "0.0.0.0:3000").
    #[serde(default = "default_listen_addr")]
    pub listen: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen_addr(),
        }
    }
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 3000))
}

/// Lookup cache configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Entry time-to-live in seconds; 0 means entries never expire.
    #[serde(default = "default_cache_ttl_secs")]
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_cache_ttl_secs(),
        }
    }
}

fn default_cache_ttl_secs() -> u64 {
    60
}

impl CacheConfig {
    pub fn ttl(&self) -> Option<std::time::Duration> {
        if self.ttl_secs == 0 {
            None
        } else {
            Some(std::time::Duration::from_secs(self.ttl_secs))
        }
    }
}

/// Peer deployment configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeerConfig {
    /// Root URL of the peer account-lookup service.
    pub base_url: url::Url,
    #[serde(default = "default_peer_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_peer_timeout_ms() -> u64 {
    5000
}

/// One oracle registration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OracleConfig {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub oracle_type: OracleType,
    pub party_type: String,
    #[serde(default)]
    pub currency: Option<String>,
    /// Registry base URL; required for `remote-http` oracles.
    #[serde(default)]
    pub endpoint: Option<String>,
}

impl OracleConfig {
    pub fn to_oracle(&self) -> Oracle {
        Oracle {
            id: self.id.clone(),
            name: self.name.clone(),
            oracle_type: self.oracle_type,
            party_type: self.party_type.clone(),
            currency: self.currency.clone(),
            endpoint: self.endpoint.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn full_config_parses() {
        let toml_str = r#"
[server]
listen = "127.0.0.1:3000"

[cache]
ttl_secs = 120

[peer]
base_url = "http://peer.example/"

[[oracles]]
id = "msisdn-default"
name = "Default MSISDN oracle"
type = "builtin"
party_type = "MSISDN"

[[oracles]]
id = "iban-eur"
name = "EUR IBAN registry"
type = "remote-http"
party_type = "IBAN"
currency = "EUR"
endpoint = "http://registry.example/"
"#;
        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.listen.port(), 3000);
        assert_eq!(config.cache.ttl_secs, 120);
        assert_eq!(config.peer.unwrap().timeout_ms, 5000);
        assert_eq!(config.oracles.len(), 2);
        assert_eq!(config.oracles[0].oracle_type, OracleType::Builtin);
        assert_eq!(config.oracles[1].currency.as_deref(), Some("EUR"));
    }

    #[test]
    fn defaults_apply_to_an_empty_file() {
        let config: FileConfig = toml::from_str("").unwrap();
        assert_eq!(config.server.listen.port(), 3000);
        assert_eq!(config.cache.ttl().unwrap().as_secs(), 60);
        assert!(config.peer.is_none());
        assert!(config.oracles.is_empty());
    }

    #[test]
    fn zero_ttl_means_no_expiry() {
        let config: FileConfig = toml::from_str("[cache]\nttl_secs = 0\n").unwrap();
        assert!(config.cache.ttl().is_none());
    }
}
