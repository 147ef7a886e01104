//! Application state shared across all request handlers.

use falu_core::aggregate::AccountLookupAggregate;
use std::sync::Arc;

/// Application state that is shared across all request handlers.
///
/// Cloneable and cheap to pass around (everything is behind Arc).
#[derive(Clone)]
pub struct AppState {
    /// The account-lookup orchestration core.
    pub aggregate: Arc<AccountLookupAggregate>,
}

impl AppState {
    pub fn new(aggregate: Arc<AccountLookupAggregate>) -> Self {
        Self { aggregate }
    }
}
