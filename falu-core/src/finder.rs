//! Oracle finder: maps a (party type, currency) pair to a registered oracle.
//!
//! Selection rule: exact match on party type is required. Among the oracles
//! registered for a type, one whose currency equals the requested currency
//! wins; an oracle with no currency acts as the fallback for the type. No
//! registered oracle at all is `Ok(None)`: "unrouted" is a user-facing
//! not-found condition, not an infrastructure fault.

use async_trait::async_trait;
use falu_sdk::objects::Oracle;
use tracing::{debug, info};

use crate::errors::OracleFinderError;

#[async_trait]
pub trait OracleFinder: Send + Sync {
    async fn init(&self) -> Result<(), OracleFinderError>;
    async fn destroy(&self) -> Result<(), OracleFinderError>;

    /// Resolve the oracle responsible for `party_type`, preferring a
    /// currency-specific registration.
    async fn get_oracle(
        &self,
        party_type: &str,
        currency: Option<&str>,
    ) -> Result<Option<Oracle>, OracleFinderError>;
}

/// Pick the best oracle for the request from a registry slice.
fn select_oracle<'a>(
    oracles: &'a [Oracle],
    party_type: &str,
    currency: Option<&str>,
) -> Option<&'a Oracle> {
    let mut fallback = None;
    for oracle in oracles.iter().filter(|o| o.party_type == party_type) {
        if oracle.currency.as_deref() == currency {
            return Some(oracle);
        }
        if oracle.currency.is_none() {
            fallback = Some(oracle);
        }
    }
    fallback
}

/// Finder over a registry seeded at construction.
///
/// The registry is loaded once at startup (from the service configuration
/// or the registry store) and immutable for the process lifetime;
/// reconfiguration requires a restart.
pub struct MemoryOracleFinder {
    oracles: Vec<Oracle>,
}

impl MemoryOracleFinder {
    pub fn new(oracles: Vec<Oracle>) -> Self {
        Self { oracles }
    }
}

#[async_trait]
impl OracleFinder for MemoryOracleFinder {
    async fn init(&self) -> Result<(), OracleFinderError> {
        info!(oracles = self.oracles.len(), "oracle finder ready");
        Ok(())
    }

    async fn destroy(&self) -> Result<(), OracleFinderError> {
        Ok(())
    }

    async fn get_oracle(
        &self,
        party_type: &str,
        currency: Option<&str>,
    ) -> Result<Option<Oracle>, OracleFinderError> {
        let selected = select_oracle(&self.oracles, party_type, currency);
        debug!(
            party_type,
            ?currency,
            oracle = selected.map(|o| o.id.as_str()),
            "oracle routing decision"
        );
        Ok(selected.cloned())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use falu_sdk::objects::OracleType;

    fn oracle(id: &str, party_type: &str, currency: Option<&str>) -> Oracle {
        Oracle {
            id: id.into(),
            name: format!("oracle {id}"),
            oracle_type: OracleType::Builtin,
            party_type: party_type.into(),
            currency: currency.map(str::to_owned),
            endpoint: None,
        }
    }

    fn registry() -> Vec<Oracle> {
        vec![
            oracle("default-msisdn", "MSISDN", None),
            oracle("eur-msisdn", "MSISDN", Some("EUR")),
            oracle("iban", "IBAN", Some("USD")),
        ]
    }

    #[tokio::test]
    async fn currency_specific_oracle_wins() {
        let finder = MemoryOracleFinder::new(registry());
        let found = finder.get_oracle("MSISDN", Some("EUR")).await.unwrap().unwrap();
        assert_eq!(found.id, "eur-msisdn");
    }

    #[tokio::test]
    async fn default_oracle_is_the_fallback() {
        let finder = MemoryOracleFinder::new(registry());

        let found = finder.get_oracle("MSISDN", Some("ZAR")).await.unwrap().unwrap();
        assert_eq!(found.id, "default-msisdn");

        let found = finder.get_oracle("MSISDN", None).await.unwrap().unwrap();
        assert_eq!(found.id, "default-msisdn");
    }

    #[tokio::test]
    async fn unregistered_type_is_unrouted_not_an_error() {
        let finder = MemoryOracleFinder::new(registry());
        assert!(finder.get_oracle("EMAIL", None).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn currency_mismatch_without_fallback_is_unrouted() {
        let finder = MemoryOracleFinder::new(registry());
        assert!(finder.get_oracle("IBAN", Some("EUR")).await.unwrap().is_none());
    }
}
