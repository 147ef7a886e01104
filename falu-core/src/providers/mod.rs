//! Oracle provider adapters.
//!
//! A provider is the system of record for one configured oracle's
//! party-to-FSP mappings. Two flavours exist: [`builtin`] keeps the
//! mappings in a Postgres collection owned by this deployment; [`remote`]
//! delegates to an external FSP registry over HTTP. Both present the same
//! capability set, so the aggregate never inspects the backend kind.

pub mod builtin;
pub mod remote;

pub use builtin::BuiltinOracleProvider;
pub use remote::RemoteHttpOracleProvider;

use async_trait::async_trait;
use falu_sdk::objects::{Association, OracleType};

use crate::errors::OracleProviderError;

/// Capability set of one oracle's backend.
///
/// Absent associations are `Ok(None)`, distinct from infrastructure
/// failures. `associate_participant` is create-once (a duplicate tuple is a
/// conflict), `disassociate_participant` is an idempotent delete.
#[async_trait]
pub trait OracleProviderAdapter: Send + Sync {
    /// Id of the oracle this adapter serves.
    fn oracle_id(&self) -> &str;

    fn oracle_type(&self) -> OracleType;

    /// Acquire the backing connection/client resource.
    async fn init(&self) -> Result<(), OracleProviderError>;

    /// Release the backing resource.
    async fn destroy(&self) -> Result<(), OracleProviderError>;

    /// Look up the current association for the identifier tuple.
    async fn get_participant_fsp_id(
        &self,
        party_type: &str,
        party_id: &str,
        party_sub_id: Option<&str>,
        currency: Option<&str>,
    ) -> Result<Option<String>, OracleProviderError>;

    /// Create a new association. Fails with
    /// [`OracleProviderError::AssociationAlreadyExists`] when the tuple is
    /// already taken.
    async fn associate_participant(
        &self,
        fsp_id: &str,
        party_type: &str,
        party_id: &str,
        party_sub_id: Option<&str>,
        currency: Option<&str>,
    ) -> Result<(), OracleProviderError>;

    /// Delete the matching association; deleting a non-existent association
    /// is not an error.
    async fn disassociate_participant(
        &self,
        fsp_id: &str,
        party_type: &str,
        party_id: &str,
        party_sub_id: Option<&str>,
        currency: Option<&str>,
    ) -> Result<(), OracleProviderError>;

    /// Liveness probe against the backing store/endpoint. Never fails;
    /// any trouble reads as `false`.
    async fn health_check(&self) -> bool;

    /// Full enumeration for reconciliation/audit.
    async fn get_all_associations(&self) -> Result<Vec<Association>, OracleProviderError>;
}
