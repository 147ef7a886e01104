//! Account-lookup aggregate: the routing and orchestration core.
//!
//! Sequences finder → provider per request, with the TTL cache in front of
//! the read path and reply publication behind every bus-driven operation.
//! The aggregate is stateless across requests apart from the cache, so any
//! number of requests may be in flight concurrently; the only suspension
//! points are the provider/finder/peer calls.
//!
//! Twelve public operations (get/associate/disassociate, party- and
//! participant-scoped, with and without sub-id) share three internal
//! paths; the identifier tuple and the event naming are the only
//! differences between the families.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use falu_sdk::objects::{Association, Oracle, ParticipantLookup};
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::bus::MessagePublisher;
use crate::cache::TtlCache;
use crate::errors::AccountLookupError;
use crate::events::{AccountLookUpReply, ReplyMessage};
use crate::finder::OracleFinder;
use crate::peer::ParticipantService;
use crate::providers::OracleProviderAdapter;

/// Per-oracle liveness summary, as reported by the admin surface.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OracleHealth {
    pub oracle_id: String,
    pub healthy: bool,
}

pub struct AccountLookupAggregate {
    finder: Box<dyn OracleFinder>,
    providers: Vec<Arc<dyn OracleProviderAdapter>>,
    cache: TtlCache<String, Option<String>>,
    peer: Option<Arc<dyn ParticipantService>>,
    publisher: Arc<dyn MessagePublisher>,
}

impl AccountLookupAggregate {
    pub fn new(
        finder: Box<dyn OracleFinder>,
        providers: Vec<Arc<dyn OracleProviderAdapter>>,
        cache_ttl: Option<Duration>,
        peer: Option<Arc<dyn ParticipantService>>,
        publisher: Arc<dyn MessagePublisher>,
    ) -> Self {
        Self {
            finder,
            providers,
            cache: TtlCache::new(cache_ttl),
            peer,
            publisher,
        }
    }

    /// Initialize the finder and every provider, in dependency order.
    ///
    /// All-or-nothing: if any collaborator fails, everything already
    /// started is torn down before the error is returned, so a partially
    /// initialized aggregate is never left running.
    pub async fn init(&self) -> Result<(), AccountLookupError> {
        self.finder.init().await?;

        for (index, provider) in self.providers.iter().enumerate() {
            if let Err(e) = provider.init().await {
                error!(oracle = provider.oracle_id(), error = %e, "oracle provider init failed");
                for started in &self.providers[..index] {
                    if let Err(te) = started.destroy().await {
                        warn!(oracle = started.oracle_id(), error = %te, "teardown after failed init");
                    }
                }
                if let Err(te) = self.finder.destroy().await {
                    warn!(error = %te, "finder teardown after failed init");
                }
                return Err(e.into());
            }
        }

        info!(providers = self.providers.len(), "account-lookup aggregate initialized");
        Ok(())
    }

    /// Release every owned collaborator. Failures are logged and teardown
    /// continues; shutdown never aborts halfway.
    pub async fn destroy(&self) {
        for provider in &self.providers {
            if let Err(e) = provider.destroy().await {
                warn!(oracle = provider.oracle_id(), error = %e, "oracle provider destroy failed");
            }
        }
        if let Err(e) = self.finder.destroy().await {
            warn!(error = %e, "oracle finder destroy failed");
        }
        self.cache.clear();
        info!("account-lookup aggregate destroyed");
    }

    // -- Party-scoped operations -----------------------------------------

    pub async fn get_party_by_type_and_id(
        &self,
        party_type: &str,
        party_id: &str,
        currency: Option<&str>,
    ) -> Result<Option<String>, AccountLookupError> {
        self.get_with_reply(ParticipantLookup::new(party_type, party_id, None, currency))
            .await
    }

    pub async fn get_party_by_type_and_id_and_sub_id(
        &self,
        party_type: &str,
        party_id: &str,
        party_sub_id: &str,
        currency: Option<&str>,
    ) -> Result<Option<String>, AccountLookupError> {
        self.get_with_reply(ParticipantLookup::new(
            party_type,
            party_id,
            Some(party_sub_id),
            currency,
        ))
        .await
    }

    pub async fn associate_party_by_type_and_id(
        &self,
        fsp_id: &str,
        party_type: &str,
        party_id: &str,
        currency: Option<&str>,
    ) -> Result<(), AccountLookupError> {
        self.associate_with_reply(
            fsp_id,
            ParticipantLookup::new(party_type, party_id, None, currency),
        )
        .await
    }

    pub async fn associate_party_by_type_and_id_and_sub_id(
        &self,
        fsp_id: &str,
        party_type: &str,
        party_id: &str,
        party_sub_id: &str,
        currency: Option<&str>,
    ) -> Result<(), AccountLookupError> {
        self.associate_with_reply(
            fsp_id,
            ParticipantLookup::new(party_type, party_id, Some(party_sub_id), currency),
        )
        .await
    }

    pub async fn disassociate_party_by_type_and_id(
        &self,
        fsp_id: &str,
        party_type: &str,
        party_id: &str,
        currency: Option<&str>,
    ) -> Result<(), AccountLookupError> {
        self.disassociate_with_reply(
            fsp_id,
            ParticipantLookup::new(party_type, party_id, None, currency),
        )
        .await
    }

    pub async fn disassociate_party_by_type_and_id_and_sub_id(
        &self,
        fsp_id: &str,
        party_type: &str,
        party_id: &str,
        party_sub_id: &str,
        currency: Option<&str>,
    ) -> Result<(), AccountLookupError> {
        self.disassociate_with_reply(
            fsp_id,
            ParticipantLookup::new(party_type, party_id, Some(party_sub_id), currency),
        )
        .await
    }

    // -- Participant-scoped operations -----------------------------------
    //
    // Participant identifiers route exactly like party identifiers; only
    // the event naming differs, so these delegate to the same internals.

    pub async fn get_participant_by_type_and_id(
        &self,
        participant_type: &str,
        participant_id: &str,
        currency: Option<&str>,
    ) -> Result<Option<String>, AccountLookupError> {
        self.get_with_reply(ParticipantLookup::new(
            participant_type,
            participant_id,
            None,
            currency,
        ))
        .await
    }

    pub async fn get_participant_by_type_and_id_and_sub_id(
        &self,
        participant_type: &str,
        participant_id: &str,
        participant_sub_id: &str,
        currency: Option<&str>,
    ) -> Result<Option<String>, AccountLookupError> {
        self.get_with_reply(ParticipantLookup::new(
            participant_type,
            participant_id,
            Some(participant_sub_id),
            currency,
        ))
        .await
    }

    pub async fn associate_participant_by_type_and_id(
        &self,
        fsp_id: &str,
        participant_type: &str,
        participant_id: &str,
        currency: Option<&str>,
    ) -> Result<(), AccountLookupError> {
        self.associate_with_reply(
            fsp_id,
            ParticipantLookup::new(participant_type, participant_id, None, currency),
        )
        .await
    }

    pub async fn associate_participant_by_type_and_id_and_sub_id(
        &self,
        fsp_id: &str,
        participant_type: &str,
        participant_id: &str,
        participant_sub_id: &str,
        currency: Option<&str>,
    ) -> Result<(), AccountLookupError> {
        self.associate_with_reply(
            fsp_id,
            ParticipantLookup::new(
                participant_type,
                participant_id,
                Some(participant_sub_id),
                currency,
            ),
        )
        .await
    }

    pub async fn disassociate_participant_by_type_and_id(
        &self,
        fsp_id: &str,
        participant_type: &str,
        participant_id: &str,
        currency: Option<&str>,
    ) -> Result<(), AccountLookupError> {
        self.disassociate_with_reply(
            fsp_id,
            ParticipantLookup::new(participant_type, participant_id, None, currency),
        )
        .await
    }

    pub async fn disassociate_participant_by_type_and_id_and_sub_id(
        &self,
        fsp_id: &str,
        participant_type: &str,
        participant_id: &str,
        participant_sub_id: &str,
        currency: Option<&str>,
    ) -> Result<(), AccountLookupError> {
        self.disassociate_with_reply(
            fsp_id,
            ParticipantLookup::new(
                participant_type,
                participant_id,
                Some(participant_sub_id),
                currency,
            ),
        )
        .await
    }

    // -- Synchronous lookup surface (peer HTTP path, no bus replies) ------

    /// Resolve one identifier without publishing a reply event. Serves the
    /// peer HTTP interface, which bypasses the bus.
    pub async fn participant_lookup(
        &self,
        lookup: &ParticipantLookup,
    ) -> Result<Option<String>, AccountLookupError> {
        self.resolve(lookup).await
    }

    /// Resolve a keyed batch. Failures are isolated per entry: an entry
    /// whose backend misbehaves resolves to `None` rather than failing the
    /// whole batch.
    pub async fn participant_bulk_lookup(
        &self,
        identifiers: &HashMap<String, ParticipantLookup>,
    ) -> HashMap<String, Option<String>> {
        let mut results = HashMap::with_capacity(identifiers.len());
        for (key, lookup) in identifiers {
            let fsp_id = match self.resolve(lookup).await {
                Ok(fsp_id) => fsp_id,
                Err(e) => {
                    warn!(key = %key, error = %e, "bulk lookup entry failed");
                    None
                }
            };
            results.insert(key.clone(), fsp_id);
        }
        results
    }

    // -- Audit / liveness --------------------------------------------------

    /// Enumerate associations across all providers, isolating per-backend
    /// failures: a broken backend is logged and skipped, the rest are
    /// still reported.
    pub async fn get_all_associations(&self) -> Vec<Association> {
        let mut all = Vec::new();
        for provider in &self.providers {
            match provider.get_all_associations().await {
                Ok(associations) => all.extend(associations),
                Err(e) => {
                    warn!(oracle = provider.oracle_id(), error = %e, "association enumeration failed");
                }
            }
        }
        all
    }

    /// Probe every provider's backend.
    pub async fn health_check(&self) -> Vec<OracleHealth> {
        let mut report = Vec::with_capacity(self.providers.len());
        for provider in &self.providers {
            report.push(OracleHealth {
                oracle_id: provider.oracle_id().to_owned(),
                healthy: provider.health_check().await,
            });
        }
        report
    }

    // -- Internals ---------------------------------------------------------

    fn provider_for(
        &self,
        oracle: &Oracle,
    ) -> Result<&Arc<dyn OracleProviderAdapter>, AccountLookupError> {
        self.providers
            .iter()
            .find(|p| p.oracle_id() == oracle.id)
            .ok_or_else(|| AccountLookupError::NoOracleProvider(oracle.id.clone()))
    }

    /// The read path: cache → finder → provider → cache update.
    async fn resolve(
        &self,
        lookup: &ParticipantLookup,
    ) -> Result<Option<String>, AccountLookupError> {
        let key = lookup.lookup_key();

        if let Some(cached) = self.cache.get(&key) {
            debug!(key = %key, "cache hit");
            return Ok(cached);
        }

        let Some(oracle) = self
            .finder
            .get_oracle(&lookup.party_type, lookup.currency.as_deref())
            .await?
        else {
            // Unrouted party type: a user-facing not-found, unless a peer
            // deployment can answer for us.
            if let Some(peer) = &self.peer {
                debug!(key = %key, "no local oracle, consulting peer");
                return peer.participant_lookup(lookup).await;
            }
            debug!(party_type = %lookup.party_type, "no oracle registered");
            return Ok(None);
        };

        let provider = self.provider_for(&oracle)?;
        let fsp_id = provider
            .get_participant_fsp_id(
                &lookup.party_type,
                &lookup.party_id,
                lookup.party_sub_id.as_deref(),
                lookup.currency.as_deref(),
            )
            .await?;

        // Cache the outcome either way; a negative entry shields the
        // backend from repeat misses until the TTL elapses.
        self.cache.set(key, fsp_id.clone());
        Ok(fsp_id)
    }

    async fn get_with_reply(
        &self,
        lookup: ParticipantLookup,
    ) -> Result<Option<String>, AccountLookupError> {
        let fsp_id = self.resolve(&lookup).await?;
        let key = lookup.lookup_key();
        self.publish(
            &key,
            AccountLookUpReply::FspIdResolved {
                party_type: lookup.party_type,
                party_id: lookup.party_id,
                party_sub_id: lookup.party_sub_id,
                currency: lookup.currency,
                fsp_id: fsp_id.clone(),
            },
        )
        .await?;
        Ok(fsp_id)
    }

    async fn associate_with_reply(
        &self,
        fsp_id: &str,
        lookup: ParticipantLookup,
    ) -> Result<(), AccountLookupError> {
        let oracle = self.route(&lookup).await?;
        let provider = self.provider_for(&oracle)?;

        provider
            .associate_participant(
                fsp_id,
                &lookup.party_type,
                &lookup.party_id,
                lookup.party_sub_id.as_deref(),
                lookup.currency.as_deref(),
            )
            .await?;

        // A cached negative entry would now be stale.
        let key = lookup.lookup_key();
        self.cache.remove(&key);

        self.publish(
            &key,
            AccountLookUpReply::ParticipantAssociated {
                fsp_id: fsp_id.to_owned(),
                party_type: lookup.party_type,
                party_id: lookup.party_id,
                party_sub_id: lookup.party_sub_id,
                currency: lookup.currency,
            },
        )
        .await
    }

    async fn disassociate_with_reply(
        &self,
        fsp_id: &str,
        lookup: ParticipantLookup,
    ) -> Result<(), AccountLookupError> {
        let oracle = self.route(&lookup).await?;
        let provider = self.provider_for(&oracle)?;

        provider
            .disassociate_participant(
                fsp_id,
                &lookup.party_type,
                &lookup.party_id,
                lookup.party_sub_id.as_deref(),
                lookup.currency.as_deref(),
            )
            .await?;

        // Invalidate so a disassociated party is never served stale.
        let key = lookup.lookup_key();
        self.cache.remove(&key);

        self.publish(
            &key,
            AccountLookUpReply::ParticipantDisassociated {
                fsp_id: fsp_id.to_owned(),
                party_type: lookup.party_type,
                party_id: lookup.party_id,
                party_sub_id: lookup.party_sub_id,
                currency: lookup.currency,
            },
        )
        .await
    }

    /// Route a mutation. Mutations require a local oracle (the peer path
    /// is read-only), so unrouted is an error here, unlike the read path.
    async fn route(&self, lookup: &ParticipantLookup) -> Result<Oracle, AccountLookupError> {
        self.finder
            .get_oracle(&lookup.party_type, lookup.currency.as_deref())
            .await?
            .ok_or_else(|| AccountLookupError::NoOracleRegistered(lookup.party_type.clone()))
    }

    async fn publish(
        &self,
        key: &str,
        reply: AccountLookUpReply,
    ) -> Result<(), AccountLookupError> {
        self.publisher
            .publish(ReplyMessage::new(key, reply))
            .await
            .map_err(|e| AccountLookupError::Publish(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::events::AccountLookUpReply;
    use crate::finder::MemoryOracleFinder;
    use crate::test_support::{
        CapturePublisher, MemoryOracleProvider, StaticPeer, msisdn_oracle,
    };

    fn aggregate_with(
        oracles: Vec<Oracle>,
        providers: Vec<Arc<MemoryOracleProvider>>,
        peer: Option<Arc<dyn ParticipantService>>,
    ) -> (AccountLookupAggregate, Arc<CapturePublisher>) {
        let publisher = Arc::new(CapturePublisher::default());
        let aggregate = AccountLookupAggregate::new(
            Box::new(MemoryOracleFinder::new(oracles)),
            providers
                .into_iter()
                .map(|p| p as Arc<dyn OracleProviderAdapter>)
                .collect(),
            Some(Duration::from_secs(60)),
            peer,
            publisher.clone(),
        );
        (aggregate, publisher)
    }

    #[tokio::test]
    async fn unrouted_party_type_is_not_found_not_an_error() {
        let (aggregate, publisher) = aggregate_with(vec![], vec![], None);

        let result = aggregate
            .get_party_by_type_and_id("MSISDN", "123", None)
            .await
            .unwrap();

        assert_eq!(result, None);
        let replies = publisher.take();
        assert_eq!(replies.len(), 1);
        assert!(matches!(
            &replies[0].value,
            AccountLookUpReply::FspIdResolved { fsp_id: None, .. }
        ));
    }

    #[tokio::test]
    async fn resolves_through_the_routed_provider() {
        let provider = Arc::new(MemoryOracleProvider::new("oracle-1"));
        provider.seed("MSISDN", "123", None, None, "FSP1");
        let (aggregate, publisher) =
            aggregate_with(vec![msisdn_oracle("oracle-1")], vec![provider], None);

        let result = aggregate
            .get_party_by_type_and_id("MSISDN", "123", None)
            .await
            .unwrap();

        assert_eq!(result.as_deref(), Some("FSP1"));
        let replies = publisher.take();
        assert!(matches!(
            &replies[0].value,
            AccountLookUpReply::FspIdResolved { fsp_id: Some(fsp), .. } if fsp == "FSP1"
        ));
    }

    #[tokio::test]
    async fn second_lookup_is_served_from_cache() {
        let provider = Arc::new(MemoryOracleProvider::new("oracle-1"));
        provider.seed("MSISDN", "123", None, None, "FSP1");
        let (aggregate, _publisher) =
            aggregate_with(vec![msisdn_oracle("oracle-1")], vec![provider.clone()], None);

        aggregate
            .get_party_by_type_and_id("MSISDN", "123", None)
            .await
            .unwrap();
        aggregate
            .get_party_by_type_and_id("MSISDN", "123", None)
            .await
            .unwrap();

        assert_eq!(provider.get_calls(), 1);
    }

    #[tokio::test]
    async fn associate_is_create_once() {
        let provider = Arc::new(MemoryOracleProvider::new("oracle-1"));
        let (aggregate, _publisher) =
            aggregate_with(vec![msisdn_oracle("oracle-1")], vec![provider], None);

        aggregate
            .associate_party_by_type_and_id("FSP1", "MSISDN", "123", None)
            .await
            .unwrap();

        let err = aggregate
            .associate_party_by_type_and_id("FSP1", "MSISDN", "123", None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AccountLookupError::Provider(
                crate::errors::OracleProviderError::AssociationAlreadyExists { .. }
            )
        ));
    }

    #[tokio::test]
    async fn associate_invalidates_a_cached_negative() {
        let provider = Arc::new(MemoryOracleProvider::new("oracle-1"));
        let (aggregate, _publisher) =
            aggregate_with(vec![msisdn_oracle("oracle-1")], vec![provider.clone()], None);

        // Miss gets cached as a negative entry.
        assert_eq!(
            aggregate
                .get_party_by_type_and_id("MSISDN", "123", None)
                .await
                .unwrap(),
            None
        );

        aggregate
            .associate_party_by_type_and_id("FSP1", "MSISDN", "123", None)
            .await
            .unwrap();

        assert_eq!(
            aggregate
                .get_party_by_type_and_id("MSISDN", "123", None)
                .await
                .unwrap()
                .as_deref(),
            Some("FSP1")
        );
    }

    #[tokio::test]
    async fn disassociate_is_idempotent() {
        let provider = Arc::new(MemoryOracleProvider::new("oracle-1"));
        let (aggregate, _publisher) =
            aggregate_with(vec![msisdn_oracle("oracle-1")], vec![provider], None);

        aggregate
            .disassociate_party_by_type_and_id("FSP1", "MSISDN", "nobody", None)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn disassociate_evicts_the_cache_entry() {
        let provider = Arc::new(MemoryOracleProvider::new("oracle-1"));
        provider.seed("MSISDN", "123", None, None, "FSP1");
        let (aggregate, _publisher) =
            aggregate_with(vec![msisdn_oracle("oracle-1")], vec![provider.clone()], None);

        aggregate
            .get_party_by_type_and_id("MSISDN", "123", None)
            .await
            .unwrap();
        assert_eq!(provider.get_calls(), 1);

        aggregate
            .disassociate_party_by_type_and_id("FSP1", "MSISDN", "123", None)
            .await
            .unwrap();

        // The next read must go back to the provider, not the cache.
        assert_eq!(
            aggregate
                .get_party_by_type_and_id("MSISDN", "123", None)
                .await
                .unwrap(),
            None
        );
        assert_eq!(provider.get_calls(), 2);
    }

    #[tokio::test]
    async fn peer_is_consulted_when_no_local_oracle_routes() {
        let peer: Arc<dyn ParticipantService> = Arc::new(StaticPeer::new(Some("PEER-FSP".into())));
        let (aggregate, _publisher) = aggregate_with(vec![], vec![], Some(peer));

        let result = aggregate
            .get_party_by_type_and_id("MSISDN", "123", None)
            .await
            .unwrap();
        assert_eq!(result.as_deref(), Some("PEER-FSP"));
    }

    #[tokio::test]
    async fn init_failure_tears_down_started_providers() {
        let healthy = Arc::new(MemoryOracleProvider::new("oracle-1"));
        let broken = Arc::new(MemoryOracleProvider::failing_init("oracle-2"));
        let (aggregate, _publisher) = aggregate_with(
            vec![msisdn_oracle("oracle-1")],
            vec![healthy.clone(), broken],
            None,
        );

        assert!(aggregate.init().await.is_err());
        assert!(healthy.was_destroyed());
    }

    #[tokio::test]
    async fn bulk_lookup_isolates_entries() {
        let provider = Arc::new(MemoryOracleProvider::new("oracle-1"));
        provider.seed("MSISDN", "123", None, None, "FSP1");
        let (aggregate, _publisher) =
            aggregate_with(vec![msisdn_oracle("oracle-1")], vec![provider], None);

        let mut identifiers = HashMap::new();
        identifiers.insert(
            "a".to_owned(),
            ParticipantLookup::new("MSISDN", "123", None, None),
        );
        identifiers.insert(
            "b".to_owned(),
            ParticipantLookup::new("EMAIL", "x@y.z", None, None),
        );

        let results = aggregate.participant_bulk_lookup(&identifiers).await;
        assert_eq!(results["a"].as_deref(), Some("FSP1"));
        assert_eq!(results["b"], None);
    }

    #[tokio::test]
    async fn health_report_covers_every_provider() {
        let provider = Arc::new(MemoryOracleProvider::new("oracle-1"));
        let (aggregate, _publisher) =
            aggregate_with(vec![msisdn_oracle("oracle-1")], vec![provider], None);
        aggregate.init().await.unwrap();

        let report = aggregate.health_check().await;
        assert_eq!(report.len(), 1);
        assert_eq!(report[0].oracle_id, "oracle-1");
        assert!(report[0].healthy);
    }
}
