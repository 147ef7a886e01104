//! Error types for the lookup domain.
//!
//! Not-found outcomes are `Ok(None)` values throughout the crate, never
//! error variants: a party without an FSP is a legitimate answer. The
//! enums here cover the remaining kinds: conflicts, infrastructure
//! failures and lifecycle failures.

use thiserror::Error;

/// Failures while resolving which oracle owns a party type.
#[derive(Debug, Error)]
pub enum OracleFinderError {
    /// The registry backend could not be reached or initialized.
    #[error("unable to initialize oracle finder: {0}")]
    UnableToInit(String),

    /// A genuine backend failure while resolving the mapping. An absent
    /// mapping is NOT this error; it is `Ok(None)`.
    #[error("unable to get oracle: {0}")]
    UnableToGetOracle(String),
}

/// Failures raised by an oracle provider adapter.
#[derive(Debug, Error)]
pub enum OracleProviderError {
    /// The backing store or endpoint could not be acquired.
    #[error("unable to initialize oracle provider: {0}")]
    UnableToInit(String),

    /// The backing connection could not be released cleanly.
    #[error("unable to close oracle provider: {0}")]
    UnableToClose(String),

    /// An association already exists for the identifier tuple. Callers can
    /// distinguish "already linked" from "cannot link".
    #[error(
        "participant association already exists for partyType {party_type} partyId {party_id} and currency {currency:?}"
    )]
    AssociationAlreadyExists {
        party_type: String,
        party_id: String,
        currency: Option<String>,
    },

    #[error("unable to get participant: {0}")]
    UnableToGetParticipant(String),

    #[error("unable to store participant association: {0}")]
    UnableToAssociateParticipant(String),

    #[error("unable to delete participant association: {0}")]
    UnableToDisassociateParticipant(String),

    #[error("unable to get associations: {0}")]
    UnableToGetAssociations(String),
}

/// Failures surfaced by the account-lookup aggregate.
#[derive(Debug, Error)]
pub enum AccountLookupError {
    #[error(transparent)]
    Finder(#[from] OracleFinderError),

    /// A mutation was requested for a party type no oracle is registered
    /// for. Reads treat this as not-found; an associate/disassociate has
    /// nowhere to go, so it fails.
    #[error("no oracle registered for party type {0}")]
    NoOracleRegistered(String),

    /// An oracle was routed to, but no provider adapter is registered for
    /// it. A configuration/infrastructure fault, not a user-facing
    /// not-found.
    #[error("no oracle provider registered for oracle {0}")]
    NoOracleProvider(String),

    #[error(transparent)]
    Provider(#[from] OracleProviderError),

    /// The peer deployment could not be consulted.
    #[error("peer lookup failed: {0}")]
    Peer(String),

    /// The reply event could not be handed to the publisher.
    #[error("unable to publish event: {0}")]
    Publish(String),
}
