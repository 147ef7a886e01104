//! Collaborator assembly.
//!
//! Builds the oracle registry, provider adapters, peer client and the
//! aggregate from the loaded configuration. Construction is infallible
//! network-wise; connections are only acquired later, inside
//! `AccountLookupAggregate::init`, which owns the all-or-nothing startup
//! semantics.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use falu_core::aggregate::AccountLookupAggregate;
use falu_core::bus::MessagePublisher;
use falu_core::finder::MemoryOracleFinder;
use falu_core::peer::ParticipantService;
use falu_core::providers::{
    BuiltinOracleProvider, OracleProviderAdapter, RemoteHttpOracleProvider,
};
use falu_sdk::client::PeerLookupClient;
use falu_sdk::objects::{Oracle, OracleType};
use sqlx::postgres::PgPoolOptions;

use crate::config::FileConfig;

/// Resolve the oracle registry: from the config file when `[[oracles]]`
/// entries are present, otherwise from the `oracle_registry` table.
pub async fn load_oracles(
    config: &FileConfig,
    database_url: &str,
) -> anyhow::Result<Vec<Oracle>> {
    if !config.oracles.is_empty() {
        return Ok(config.oracles.iter().map(|o| o.to_oracle()).collect());
    }

    tracing::info!("no oracles in config file, loading oracle registry from store");

    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(database_url)
        .await
        .context("unable to connect to the oracle registry store")?;

    #[derive(sqlx::FromRow)]
    struct OracleRow {
        id: String,
        name: String,
        oracle_type: String,
        party_type: String,
        currency: Option<String>,
        endpoint: Option<String>,
    }

    let rows: Vec<OracleRow> = sqlx::query_as(
        "SELECT id, name, oracle_type, party_type, currency, endpoint FROM oracle_registry",
    )
    .fetch_all(&pool)
    .await
    .context("unable to read the oracle registry")?;

    pool.close().await;

    let mut oracles = Vec::with_capacity(rows.len());
    for row in rows {
        let oracle_type: OracleType =
            serde_json::from_value(serde_json::Value::String(row.oracle_type))
                .with_context(|| format!("oracle {} has an unknown type", row.id))?;
        oracles.push(Oracle {
            id: row.id,
            name: row.name,
            oracle_type,
            party_type: row.party_type,
            currency: row.currency,
            endpoint: row.endpoint,
        });
    }
    Ok(oracles)
}

/// Build one provider adapter per registered oracle.
pub fn build_providers(
    oracles: &[Oracle],
    database_url: &str,
) -> anyhow::Result<Vec<Arc<dyn OracleProviderAdapter>>> {
    let mut providers: Vec<Arc<dyn OracleProviderAdapter>> = Vec::with_capacity(oracles.len());
    for oracle in oracles {
        match oracle.oracle_type {
            OracleType::Builtin => {
                providers.push(Arc::new(BuiltinOracleProvider::new(
                    oracle.clone(),
                    database_url,
                )));
            }
            OracleType::RemoteHttp => {
                let provider = RemoteHttpOracleProvider::new(oracle.clone())
                    .with_context(|| format!("invalid remote oracle {}", oracle.id))?;
                providers.push(Arc::new(provider));
            }
        }
    }
    Ok(providers)
}

/// Assemble the aggregate from its collaborators.
pub fn build_aggregate(
    config: &FileConfig,
    oracles: Vec<Oracle>,
    database_url: &str,
    publisher: Arc<dyn MessagePublisher>,
) -> anyhow::Result<Arc<AccountLookupAggregate>> {
    let providers = build_providers(&oracles, database_url)?;
    let finder = Box::new(MemoryOracleFinder::new(oracles));

    let peer: Option<Arc<dyn ParticipantService>> = match &config.peer {
        Some(peer_config) => {
            let client = PeerLookupClient::with_timeout(
                peer_config.base_url.clone(),
                Duration::from_millis(peer_config.timeout_ms),
            );
            Some(Arc::new(client))
        }
        None => None,
    };

    Ok(Arc::new(AccountLookupAggregate::new(
        finder,
        providers,
        config.cache.ttl(),
        peer,
        publisher,
    )))
}
