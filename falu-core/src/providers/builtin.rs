//! Built-in oracle provider backed by the `builtin_oracle_parties` table.
//!
//! Each provider owns its own connection pool, acquired at `init()` and
//! closed at `destroy()`; providers of different oracles never share a
//! connection. Association uniqueness is enforced by the store itself
//! (unique index over the identifier tuple), so a concurrent duplicate
//! associate loses cleanly instead of racing a read-then-insert check.

use async_trait::async_trait;
use falu_sdk::objects::{Association, Oracle, OracleType};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use super::OracleProviderAdapter;
use crate::errors::OracleProviderError;

const MAX_CONNECTIONS: u32 = 5;
const ACQUIRE_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(5);

pub struct BuiltinOracleProvider {
    oracle: Oracle,
    database_url: String,
    pool: RwLock<Option<PgPool>>,
}

#[derive(sqlx::FromRow)]
struct AssociationRow {
    fsp_id: String,
    party_type: String,
    party_id: String,
    party_sub_id: Option<String>,
    currency: Option<String>,
}

impl From<AssociationRow> for Association {
    fn from(row: AssociationRow) -> Self {
        Association {
            fsp_id: row.fsp_id,
            party_type: row.party_type,
            party_id: row.party_id,
            party_sub_id: row.party_sub_id,
            currency: row.currency,
        }
    }
}

impl BuiltinOracleProvider {
    pub fn new(oracle: Oracle, database_url: impl Into<String>) -> Self {
        Self {
            oracle,
            database_url: database_url.into(),
            pool: RwLock::new(None),
        }
    }

    /// Clone out the pool handle; `PgPool` is a cheap shared handle.
    async fn pool(&self) -> Result<PgPool, OracleProviderError> {
        self.pool
            .read()
            .await
            .clone()
            .ok_or_else(|| OracleProviderError::UnableToInit("provider not initialized".into()))
    }
}

#[async_trait]
impl OracleProviderAdapter for BuiltinOracleProvider {
    fn oracle_id(&self) -> &str {
        &self.oracle.id
    }

    fn oracle_type(&self) -> OracleType {
        OracleType::Builtin
    }

    async fn init(&self) -> Result<(), OracleProviderError> {
        let pool = PgPoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .acquire_timeout(ACQUIRE_TIMEOUT)
            .connect(&self.database_url)
            .await
            .map_err(|e| OracleProviderError::UnableToInit(e.to_string()))?;

        debug!(oracle = %self.oracle.id, "builtin oracle store connected");
        *self.pool.write().await = Some(pool);
        Ok(())
    }

    async fn destroy(&self) -> Result<(), OracleProviderError> {
        if let Some(pool) = self.pool.write().await.take() {
            pool.close().await;
        }
        Ok(())
    }

    async fn get_participant_fsp_id(
        &self,
        party_type: &str,
        party_id: &str,
        party_sub_id: Option<&str>,
        currency: Option<&str>,
    ) -> Result<Option<String>, OracleProviderError> {
        let pool = self.pool().await?;

        // Omitted sub-id/currency mean "any", mirroring the query-by-filter
        // semantics of the collection.
        let fsp_id: Option<String> = sqlx::query_scalar(
            "SELECT fsp_id FROM builtin_oracle_parties \
             WHERE oracle_id = $1 AND party_type = $2 AND party_id = $3 \
               AND ($4::text IS NULL OR party_sub_id = $4) \
               AND ($5::text IS NULL OR currency = $5) \
             LIMIT 1",
        )
        .bind(&self.oracle.id)
        .bind(party_type)
        .bind(party_id)
        .bind(party_sub_id)
        .bind(currency)
        .fetch_optional(&pool)
        .await
        .map_err(|e| OracleProviderError::UnableToGetParticipant(e.to_string()))?;

        debug!(
            oracle = %self.oracle.id,
            party_type,
            party_id,
            found = fsp_id.is_some(),
            "association lookup"
        );
        Ok(fsp_id)
    }

    async fn associate_participant(
        &self,
        fsp_id: &str,
        party_type: &str,
        party_id: &str,
        party_sub_id: Option<&str>,
        currency: Option<&str>,
    ) -> Result<(), OracleProviderError> {
        let pool = self.pool().await?;

        // The unique index over (oracle_id, party_type, party_id,
        // party_sub_id, currency) makes create-once atomic: zero rows
        // affected means the tuple was already taken.
        let result = sqlx::query(
            "INSERT INTO builtin_oracle_parties \
             (oracle_id, fsp_id, party_type, party_id, party_sub_id, currency) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             ON CONFLICT DO NOTHING",
        )
        .bind(&self.oracle.id)
        .bind(fsp_id)
        .bind(party_type)
        .bind(party_id)
        .bind(party_sub_id)
        .bind(currency)
        .execute(&pool)
        .await
        .map_err(|e| OracleProviderError::UnableToAssociateParticipant(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(OracleProviderError::AssociationAlreadyExists {
                party_type: party_type.to_owned(),
                party_id: party_id.to_owned(),
                currency: currency.map(str::to_owned),
            });
        }

        debug!(oracle = %self.oracle.id, party_type, party_id, fsp_id, "association stored");
        Ok(())
    }

    async fn disassociate_participant(
        &self,
        fsp_id: &str,
        party_type: &str,
        party_id: &str,
        party_sub_id: Option<&str>,
        currency: Option<&str>,
    ) -> Result<(), OracleProviderError> {
        let pool = self.pool().await?;

        let result = sqlx::query(
            "DELETE FROM builtin_oracle_parties \
             WHERE oracle_id = $1 AND fsp_id = $2 AND party_type = $3 AND party_id = $4 \
               AND party_sub_id IS NOT DISTINCT FROM $5 \
               AND currency IS NOT DISTINCT FROM $6",
        )
        .bind(&self.oracle.id)
        .bind(fsp_id)
        .bind(party_type)
        .bind(party_id)
        .bind(party_sub_id)
        .bind(currency)
        .execute(&pool)
        .await
        .map_err(|e| OracleProviderError::UnableToDisassociateParticipant(e.to_string()))?;

        // Deleting nothing is fine: disassociate is idempotent.
        debug!(
            oracle = %self.oracle.id,
            party_type,
            party_id,
            deleted = result.rows_affected(),
            "association deleted"
        );
        Ok(())
    }

    async fn health_check(&self) -> bool {
        let Ok(pool) = self.pool().await else {
            return false;
        };
        match sqlx::query_scalar::<_, i32>("SELECT 1").fetch_one(&pool).await {
            Ok(_) => true,
            Err(e) => {
                warn!(oracle = %self.oracle.id, error = %e, "builtin oracle store ping failed");
                false
            }
        }
    }

    async fn get_all_associations(&self) -> Result<Vec<Association>, OracleProviderError> {
        let pool = self.pool().await?;

        let rows: Vec<AssociationRow> = sqlx::query_as(
            "SELECT fsp_id, party_type, party_id, party_sub_id, currency \
             FROM builtin_oracle_parties WHERE oracle_id = $1",
        )
        .bind(&self.oracle.id)
        .fetch_all(&pool)
        .await
        .map_err(|e| OracleProviderError::UnableToGetAssociations(e.to_string()))?;

        Ok(rows.into_iter().map(Association::from).collect())
    }
}
