//! Peer participant service port.
//!
//! When no local oracle can route a request, a deployment may delegate to a
//! peer account-lookup instance before concluding "not found". The port is
//! a trait so the aggregate can be tested without a live peer.

use std::collections::HashMap;

use async_trait::async_trait;
use falu_sdk::client::PeerLookupClient;
use falu_sdk::objects::ParticipantLookup;

use crate::errors::AccountLookupError;

#[async_trait]
pub trait ParticipantService: Send + Sync {
    /// Resolve one identifier against the peer; `Ok(None)` when the peer
    /// holds no association either.
    async fn participant_lookup(
        &self,
        lookup: &ParticipantLookup,
    ) -> Result<Option<String>, AccountLookupError>;

    /// Resolve a keyed batch against the peer.
    async fn participant_bulk_lookup(
        &self,
        identifiers: &HashMap<String, ParticipantLookup>,
    ) -> Result<HashMap<String, Option<String>>, AccountLookupError>;
}

#[async_trait]
impl ParticipantService for PeerLookupClient {
    async fn participant_lookup(
        &self,
        lookup: &ParticipantLookup,
    ) -> Result<Option<String>, AccountLookupError> {
        PeerLookupClient::participant_lookup(
            self,
            &lookup.party_id,
            &lookup.party_type,
            lookup.party_sub_id.as_deref(),
            lookup.currency.as_deref(),
        )
        .await
        .map_err(|e| AccountLookupError::Peer(e.to_string()))
    }

    async fn participant_bulk_lookup(
        &self,
        identifiers: &HashMap<String, ParticipantLookup>,
    ) -> Result<HashMap<String, Option<String>>, AccountLookupError> {
        let results = PeerLookupClient::participant_bulk_lookup(self, identifiers)
            .await
            .map_err(|e| AccountLookupError::Peer(e.to_string()))?;

        // A peer-level 404 means none of the identifiers resolved.
        Ok(results.unwrap_or_else(|| {
            identifiers.keys().map(|k| (k.clone(), None)).collect()
        }))
    }
}
