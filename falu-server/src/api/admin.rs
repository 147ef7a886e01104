//! Admin handlers: reconciliation and liveness reporting.

use axum::{Json, extract::State, response::IntoResponse};

use crate::state::AppState;

/// `GET /admin/associations` – enumerate every association across all
/// oracle providers. Backends that fail to answer are skipped.
pub(super) async fn list_associations(state: State<AppState>) -> impl IntoResponse {
    Json(state.aggregate.get_all_associations().await)
}

/// `GET /admin/oracles/health` – probe each oracle backend.
pub(super) async fn oracle_health(state: State<AppState>) -> impl IntoResponse {
    Json(state.aggregate.health_check().await)
}
