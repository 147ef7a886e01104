//! HTTP API surface.
//!
//! # Endpoints
//!
//! - `GET  /account-lookup/{party_id}/{party_type}`              – resolve one identifier
//! - `GET  /account-lookup/{party_id}/{party_type}/{party_sub_id}` – resolve with sub-id
//! - `POST /account-lookup`                                      – bulk resolve
//! - `GET  /admin/associations`                                  – audit enumeration
//! - `GET  /admin/oracles/health`                                – per-oracle liveness

mod admin;
mod lookup;

use axum::{
    Router,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use falu_core::errors::AccountLookupError;

use crate::state::AppState;

/// Build the lookup + admin API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/account-lookup/{party_id}/{party_type}", get(lookup::lookup))
        .route(
            "/account-lookup/{party_id}/{party_type}/{party_sub_id}",
            get(lookup::lookup_with_sub_id),
        )
        .route("/account-lookup", post(lookup::bulk_lookup))
        .route("/admin/associations", get(admin::list_associations))
        .route("/admin/oracles/health", get(admin::oracle_health))
}

/// Errors that can occur in lookup API handlers.
#[derive(Debug)]
pub(super) enum LookupApiError {
    /// No FSP owns the requested identifier.
    NotFound,
    /// The aggregate could not serve the request.
    Lookup(AccountLookupError),
}

impl IntoResponse for LookupApiError {
    fn into_response(self) -> axum::response::Response {
        match self {
            LookupApiError::NotFound => {
                (StatusCode::NOT_FOUND, "no fsp association found").into_response()
            }
            LookupApiError::Lookup(e) => {
                tracing::error!(error = %e, "lookup API error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error").into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::server::build_router;
    use crate::state::AppState;
    use async_trait::async_trait;
    use falu_core::aggregate::AccountLookupAggregate;
    use falu_core::bus::ChannelMessagePublisher;
    use falu_core::errors::OracleProviderError;
    use falu_core::events::{ReplyMessageReceiver, reply_channel};
    use falu_core::finder::MemoryOracleFinder;
    use falu_core::providers::OracleProviderAdapter;
    use falu_sdk::client::PeerLookupClient;
    use falu_sdk::objects::{Association, Oracle, OracleType, ParticipantLookup};
    use std::collections::HashMap;
    use std::net::SocketAddr;
    use std::sync::Arc;

    /// Provider that answers a fixed fspId for one party id.
    struct StaticProvider {
        party_id: String,
        fsp_id: String,
    }

    #[async_trait]
    impl OracleProviderAdapter for StaticProvider {
        fn oracle_id(&self) -> &str {
            "oracle-1"
        }

        fn oracle_type(&self) -> OracleType {
            OracleType::Builtin
        }

        async fn init(&self) -> Result<(), OracleProviderError> {
            Ok(())
        }

        async fn destroy(&self) -> Result<(), OracleProviderError> {
            Ok(())
        }

        async fn get_participant_fsp_id(
            &self,
            _party_type: &str,
            party_id: &str,
            _party_sub_id: Option<&str>,
            _currency: Option<&str>,
        ) -> Result<Option<String>, OracleProviderError> {
            Ok((party_id == self.party_id).then(|| self.fsp_id.clone()))
        }

        async fn associate_participant(
            &self,
            _fsp_id: &str,
            _party_type: &str,
            _party_id: &str,
            _party_sub_id: Option<&str>,
            _currency: Option<&str>,
        ) -> Result<(), OracleProviderError> {
            Ok(())
        }

        async fn disassociate_participant(
            &self,
            _fsp_id: &str,
            _party_type: &str,
            _party_id: &str,
            _party_sub_id: Option<&str>,
            _currency: Option<&str>,
        ) -> Result<(), OracleProviderError> {
            Ok(())
        }

        async fn health_check(&self) -> bool {
            true
        }

        async fn get_all_associations(&self) -> Result<Vec<Association>, OracleProviderError> {
            Ok(Vec::new())
        }
    }

    /// Serve the real router on an ephemeral port, returning its address.
    ///
    /// The reply receiver is returned so the publisher channel stays open
    /// for the lifetime of the test.
    async fn serve(
        oracles: Vec<Oracle>,
        providers: Vec<Arc<dyn OracleProviderAdapter>>,
    ) -> (SocketAddr, ReplyMessageReceiver) {
        let (reply_tx, reply_rx) = reply_channel();
        let aggregate = Arc::new(AccountLookupAggregate::new(
            Box::new(MemoryOracleFinder::new(oracles)),
            providers,
            None,
            None,
            Arc::new(ChannelMessagePublisher::new(reply_tx)),
        ));
        let router = build_router(AppState::new(aggregate));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        (addr, reply_rx)
    }

    fn msisdn_oracle() -> Oracle {
        Oracle {
            id: "oracle-1".into(),
            name: "test oracle".into(),
            oracle_type: OracleType::Builtin,
            party_type: "MSISDN".into(),
            currency: None,
            endpoint: None,
        }
    }

    #[tokio::test]
    async fn peer_lookup_answers_404_as_none() {
        let (addr, _reply_rx) = serve(vec![], vec![]).await;
        let client = PeerLookupClient::new(format!("http://{addr}/").parse().unwrap());

        let result = client
            .participant_lookup("123", "MSISDN", None, None)
            .await
            .unwrap();
        assert_eq!(result, None);
    }

    #[tokio::test]
    async fn peer_lookup_resolves_an_association() {
        let provider = Arc::new(StaticProvider {
            party_id: "123".into(),
            fsp_id: "FSP1".into(),
        }) as Arc<dyn OracleProviderAdapter>;
        let (addr, _reply_rx) = serve(vec![msisdn_oracle()], vec![provider]).await;
        let client = PeerLookupClient::new(format!("http://{addr}/").parse().unwrap());

        let result = client
            .participant_lookup("123", "MSISDN", None, Some("EUR"))
            .await
            .unwrap();
        assert_eq!(result.as_deref(), Some("FSP1"));
    }

    #[tokio::test]
    async fn bulk_lookup_maps_every_key() {
        let provider = Arc::new(StaticProvider {
            party_id: "123".into(),
            fsp_id: "FSP1".into(),
        }) as Arc<dyn OracleProviderAdapter>;
        let (addr, _reply_rx) = serve(vec![msisdn_oracle()], vec![provider]).await;
        let client = PeerLookupClient::new(format!("http://{addr}/").parse().unwrap());

        let mut identifiers = HashMap::new();
        identifiers.insert(
            "hit".to_owned(),
            ParticipantLookup::new("MSISDN", "123", None, None),
        );
        identifiers.insert(
            "miss".to_owned(),
            ParticipantLookup::new("MSISDN", "999", None, None),
        );

        let results = client
            .participant_bulk_lookup(&identifiers)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(results["hit"].as_deref(), Some("FSP1"));
        assert_eq!(results["miss"], None);
    }
}
