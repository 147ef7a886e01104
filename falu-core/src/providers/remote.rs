//! Remote oracle provider over HTTP.
//!
//! Speaks to an external FSP registry:
//!
//! - `GET    /participants/{partyType}/{partyId}[/{partySubId}]` – resolve
//! - `POST   /participants/{partyType}/{partyId}[/{partySubId}]` – associate
//! - `DELETE /participants/{partyType}/{partyId}[/{partySubId}]` – disassociate
//! - `GET    /health`, `GET /associations`
//!
//! A remote 404 is the "not found" outcome, a 409 is the association
//! conflict; every other non-2xx status or transport failure maps to the
//! matching infrastructure error. `reqwest` error types never cross this
//! boundary.

use async_trait::async_trait;
use falu_sdk::objects::{Association, Oracle, OracleType};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use url::Url;

use super::OracleProviderAdapter;
use crate::errors::OracleProviderError;

const REQUEST_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(5);

pub struct RemoteHttpOracleProvider {
    oracle: Oracle,
    endpoint: Url,
    http: Client,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FspIdResponse {
    fsp_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AssociationRequest<'a> {
    fsp_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    currency: Option<&'a str>,
}

impl RemoteHttpOracleProvider {
    /// Build a provider for `oracle`, which must carry an endpoint URL.
    pub fn new(oracle: Oracle) -> Result<Self, OracleProviderError> {
        let raw_endpoint = oracle.endpoint.clone().ok_or_else(|| {
            OracleProviderError::UnableToInit(format!(
                "remote-http oracle {} has no endpoint",
                oracle.id
            ))
        })?;
        let endpoint: Url = raw_endpoint
            .parse()
            .map_err(|e| OracleProviderError::UnableToInit(format!("invalid endpoint: {e}")))?;
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| OracleProviderError::UnableToInit(e.to_string()))?;
        Ok(Self {
            oracle,
            endpoint,
            http,
        })
    }

    fn participant_url(
        &self,
        party_type: &str,
        party_id: &str,
        party_sub_id: Option<&str>,
        currency: Option<&str>,
    ) -> Result<Url, OracleProviderError> {
        let path = match party_sub_id {
            Some(sub_id) => format!("participants/{party_type}/{party_id}/{sub_id}"),
            None => format!("participants/{party_type}/{party_id}"),
        };
        let mut url = self
            .endpoint
            .join(&path)
            .map_err(|e| OracleProviderError::UnableToGetParticipant(e.to_string()))?;
        if let Some(currency) = currency {
            url.query_pairs_mut().append_pair("currency", currency);
        }
        Ok(url)
    }
}

#[async_trait]
impl OracleProviderAdapter for RemoteHttpOracleProvider {
    fn oracle_id(&self) -> &str {
        &self.oracle.id
    }

    fn oracle_type(&self) -> OracleType {
        OracleType::RemoteHttp
    }

    async fn init(&self) -> Result<(), OracleProviderError> {
        // The HTTP client is connectionless; nothing to acquire beyond what
        // `new` already built. Probe the registry so a dead endpoint fails
        // startup instead of the first request.
        if self.health_check().await {
            debug!(oracle = %self.oracle.id, endpoint = %self.endpoint, "remote oracle reachable");
            Ok(())
        } else {
            Err(OracleProviderError::UnableToInit(format!(
                "remote oracle {} not reachable at {}",
                self.oracle.id, self.endpoint
            )))
        }
    }

    async fn destroy(&self) -> Result<(), OracleProviderError> {
        Ok(())
    }

    async fn get_participant_fsp_id(
        &self,
        party_type: &str,
        party_id: &str,
        party_sub_id: Option<&str>,
        currency: Option<&str>,
    ) -> Result<Option<String>, OracleProviderError> {
        let url = self.participant_url(party_type, party_id, party_sub_id, currency)?;

        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| OracleProviderError::UnableToGetParticipant(e.to_string()))?;

        match resp.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let body: FspIdResponse = resp
                    .json()
                    .await
                    .map_err(|e| OracleProviderError::UnableToGetParticipant(e.to_string()))?;
                Ok(Some(body.fsp_id))
            }
            status => Err(OracleProviderError::UnableToGetParticipant(format!(
                "registry answered {status}"
            ))),
        }
    }

    async fn associate_participant(
        &self,
        fsp_id: &str,
        party_type: &str,
        party_id: &str,
        party_sub_id: Option<&str>,
        currency: Option<&str>,
    ) -> Result<(), OracleProviderError> {
        let url = self.participant_url(party_type, party_id, party_sub_id, None)?;

        let resp = self
            .http
            .post(url)
            .json(&AssociationRequest { fsp_id, currency })
            .send()
            .await
            .map_err(|e| OracleProviderError::UnableToAssociateParticipant(e.to_string()))?;

        match resp.status() {
            StatusCode::CONFLICT => Err(OracleProviderError::AssociationAlreadyExists {
                party_type: party_type.to_owned(),
                party_id: party_id.to_owned(),
                currency: currency.map(str::to_owned),
            }),
            status if status.is_success() => Ok(()),
            status => Err(OracleProviderError::UnableToAssociateParticipant(format!(
                "registry answered {status}"
            ))),
        }
    }

    async fn disassociate_participant(
        &self,
        fsp_id: &str,
        party_type: &str,
        party_id: &str,
        party_sub_id: Option<&str>,
        currency: Option<&str>,
    ) -> Result<(), OracleProviderError> {
        let mut url = self.participant_url(party_type, party_id, party_sub_id, currency)?;
        url.query_pairs_mut().append_pair("fspId", fsp_id);

        let resp = self
            .http
            .delete(url)
            .send()
            .await
            .map_err(|e| OracleProviderError::UnableToDisassociateParticipant(e.to_string()))?;

        match resp.status() {
            // 404 means there was nothing to delete; idempotent.
            StatusCode::NOT_FOUND => Ok(()),
            status if status.is_success() => Ok(()),
            status => Err(OracleProviderError::UnableToDisassociateParticipant(
                format!("registry answered {status}"),
            )),
        }
    }

    async fn health_check(&self) -> bool {
        let Ok(url) = self.endpoint.join("health") else {
            return false;
        };
        match self.http.get(url).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(e) => {
                warn!(oracle = %self.oracle.id, error = %e, "remote oracle ping failed");
                false
            }
        }
    }

    async fn get_all_associations(&self) -> Result<Vec<Association>, OracleProviderError> {
        let url = self
            .endpoint
            .join("associations")
            .map_err(|e| OracleProviderError::UnableToGetAssociations(e.to_string()))?;

        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| OracleProviderError::UnableToGetAssociations(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(OracleProviderError::UnableToGetAssociations(format!(
                "registry answered {}",
                resp.status()
            )));
        }

        resp.json()
            .await
            .map_err(|e| OracleProviderError::UnableToGetAssociations(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    fn provider() -> RemoteHttpOracleProvider {
        RemoteHttpOracleProvider::new(Oracle {
            id: "remote-1".into(),
            name: "remote registry".into(),
            oracle_type: OracleType::RemoteHttp,
            party_type: "MSISDN".into(),
            currency: None,
            endpoint: Some("http://registry.example/".into()),
        })
        .unwrap()
    }

    #[test]
    fn endpoint_is_required() {
        let err = RemoteHttpOracleProvider::new(Oracle {
            id: "remote-2".into(),
            name: "broken".into(),
            oracle_type: OracleType::RemoteHttp,
            party_type: "MSISDN".into(),
            currency: None,
            endpoint: None,
        })
        .err()
        .unwrap();
        assert!(matches!(err, OracleProviderError::UnableToInit(_)));
    }

    #[test]
    fn participant_url_composition() {
        let provider = provider();

        let url = provider
            .participant_url("MSISDN", "123", None, None)
            .unwrap();
        assert_eq!(url.as_str(), "http://registry.example/participants/MSISDN/123");

        let url = provider
            .participant_url("MSISDN", "123", Some("EMPLOYEE"), Some("EUR"))
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://registry.example/participants/MSISDN/123/EMPLOYEE?currency=EUR"
        );
    }
}
