//! Peer lookup client (one deployment → another deployment's aggregate).
//!
//! Used when an FSP resolution has to come from a different account-lookup
//! deployment, typically for cross-currency routing. The peer answers 200
//! with the resolved fspId, or 404 when it holds no association; 404 is a
//! legitimate "not found" outcome, never an error.

use std::collections::HashMap;
use std::time::Duration;

use reqwest::{Client, StatusCode};
use url::Url;

use super::ClientError;
use crate::objects::ParticipantLookup;

/// Default per-request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_millis(5000);

/// Typed HTTP client for the peer lookup API.
///
/// - `GET /account-lookup/{partyId}/{partyType}[/{partySubId}][?currency=…]`
/// - `POST /account-lookup` with a keyed batch of identifiers
#[derive(Debug, Clone)]
pub struct PeerLookupClient {
    http: Client,
    base_url: Url,
}

impl PeerLookupClient {
    /// Create a new client against the peer's root URL.
    pub fn new(base_url: Url) -> Self {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    /// Create a new client with a custom request timeout.
    pub fn with_timeout(base_url: Url, timeout: Duration) -> Self {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self { http, base_url }
    }

    /// Replace the default `reqwest::Client` with a custom one.
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http = client;
        self
    }

    /// Resolve a single identifier against the peer.
    ///
    /// Returns `Ok(None)` when the peer answers 404.
    pub async fn participant_lookup(
        &self,
        party_id: &str,
        party_type: &str,
        party_sub_id: Option<&str>,
        currency: Option<&str>,
    ) -> Result<Option<String>, ClientError> {
        let path = compose_lookup_path(party_id, party_type, party_sub_id);
        let mut url = self.base_url.join(&path)?;
        if let Some(currency) = currency {
            url.query_pairs_mut().append_pair("currency", currency);
        }

        let resp = self.http.get(url).send().await?;

        match resp.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let fsp_id: String = serde_json::from_slice(&resp.bytes().await?)?;
                Ok(Some(fsp_id))
            }
            status => Err(ClientError::Api {
                status,
                body: resp.text().await.unwrap_or_default(),
            }),
        }
    }

    /// Resolve a keyed batch of identifiers in one round trip.
    ///
    /// The response maps each request key to the resolved fspId or `null`.
    /// A peer-level 404 yields `Ok(None)`.
    pub async fn participant_bulk_lookup(
        &self,
        identifiers: &HashMap<String, ParticipantLookup>,
    ) -> Result<Option<HashMap<String, Option<String>>>, ClientError> {
        let url = self.base_url.join("/account-lookup")?;

        let resp = self.http.post(url).json(identifiers).send().await?;

        match resp.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let results = serde_json::from_slice(&resp.bytes().await?)?;
                Ok(Some(results))
            }
            status => Err(ClientError::Api {
                status,
                body: resp.text().await.unwrap_or_default(),
            }),
        }
    }
}

fn compose_lookup_path(party_id: &str, party_type: &str, party_sub_id: Option<&str>) -> String {
    match party_sub_id {
        Some(sub_id) => format!("/account-lookup/{party_id}/{party_type}/{sub_id}"),
        None => format!("/account-lookup/{party_id}/{party_type}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_path_includes_sub_id_only_when_present() {
        assert_eq!(
            compose_lookup_path("123", "MSISDN", None),
            "/account-lookup/123/MSISDN"
        );
        assert_eq!(
            compose_lookup_path("123", "MSISDN", Some("EMPLOYEE")),
            "/account-lookup/123/MSISDN/EMPLOYEE"
        );
    }

    #[test]
    fn currency_is_a_query_parameter() {
        let base: Url = "http://peer.example".parse().unwrap();
        let mut url = base.join("/account-lookup/123/MSISDN").unwrap();
        url.query_pairs_mut().append_pair("currency", "USD");
        assert_eq!(url.as_str(), "http://peer.example/account-lookup/123/MSISDN?currency=USD");
    }
}
