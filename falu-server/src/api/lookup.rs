//! Peer lookup handlers: the synchronous resolution path other
//! deployments call, bypassing the message bus.

use axum::{
    Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use falu_sdk::objects::ParticipantLookup;
use serde::Deserialize;
use std::collections::HashMap;

use super::LookupApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub(super) struct LookupQuery {
    currency: Option<String>,
}

/// `GET /account-lookup/{party_id}/{party_type}` – resolve one identifier.
///
/// 200 with the fspId, or 404 when no association exists.
pub(super) async fn lookup(
    state: State<AppState>,
    Path((party_id, party_type)): Path<(String, String)>,
    Query(query): Query<LookupQuery>,
) -> Result<impl IntoResponse, LookupApiError> {
    let identifier =
        ParticipantLookup::new(&party_type, &party_id, None, query.currency.as_deref());
    resolve(&state, &identifier).await
}

/// `GET /account-lookup/{party_id}/{party_type}/{party_sub_id}` – resolve
/// with a sub-id.
pub(super) async fn lookup_with_sub_id(
    state: State<AppState>,
    Path((party_id, party_type, party_sub_id)): Path<(String, String, String)>,
    Query(query): Query<LookupQuery>,
) -> Result<impl IntoResponse, LookupApiError> {
    let identifier = ParticipantLookup::new(
        &party_type,
        &party_id,
        Some(&party_sub_id),
        query.currency.as_deref(),
    );
    resolve(&state, &identifier).await
}

async fn resolve(
    state: &AppState,
    identifier: &ParticipantLookup,
) -> Result<Json<String>, LookupApiError> {
    let fsp_id = state
        .aggregate
        .participant_lookup(identifier)
        .await
        .map_err(LookupApiError::Lookup)?;

    fsp_id.map(Json).ok_or(LookupApiError::NotFound)
}

/// `POST /account-lookup` – resolve a keyed batch in one round trip.
///
/// Always 200; entries that do not resolve map to `null`.
pub(super) async fn bulk_lookup(
    state: State<AppState>,
    Json(identifiers): Json<HashMap<String, ParticipantLookup>>,
) -> impl IntoResponse {
    let results = state.aggregate.participant_bulk_lookup(&identifiers).await;
    Json(results)
}
