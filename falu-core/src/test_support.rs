//! In-memory doubles shared by the aggregate and event-handler tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use falu_sdk::objects::{Association, Oracle, OracleType, ParticipantLookup};

use crate::bus::{MessagePublisher, PublishError};
use crate::errors::{AccountLookupError, OracleProviderError};
use crate::events::ReplyMessage;
use crate::peer::ParticipantService;
use crate::providers::OracleProviderAdapter;

pub fn msisdn_oracle(id: &str) -> Oracle {
    Oracle {
        id: id.into(),
        name: format!("oracle {id}"),
        oracle_type: OracleType::Builtin,
        party_type: "MSISDN".into(),
        currency: None,
        endpoint: None,
    }
}

/// Provider over a plain in-memory association list.
pub struct MemoryOracleProvider {
    oracle_id: String,
    associations: Mutex<Vec<Association>>,
    get_calls: AtomicUsize,
    fail_init: bool,
    destroyed: AtomicBool,
}

impl MemoryOracleProvider {
    pub fn new(oracle_id: &str) -> Self {
        Self {
            oracle_id: oracle_id.into(),
            associations: Mutex::new(Vec::new()),
            get_calls: AtomicUsize::new(0),
            fail_init: false,
            destroyed: AtomicBool::new(false),
        }
    }

    pub fn failing_init(oracle_id: &str) -> Self {
        Self {
            fail_init: true,
            ..Self::new(oracle_id)
        }
    }

    pub fn seed(
        &self,
        party_type: &str,
        party_id: &str,
        party_sub_id: Option<&str>,
        currency: Option<&str>,
        fsp_id: &str,
    ) {
        if let Ok(mut associations) = self.associations.lock() {
            associations.push(Association {
                fsp_id: fsp_id.into(),
                party_type: party_type.into(),
                party_id: party_id.into(),
                party_sub_id: party_sub_id.map(str::to_owned),
                currency: currency.map(str::to_owned),
            });
        }
    }

    pub fn get_calls(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst)
    }

    pub fn was_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::SeqCst)
    }
}

// Omitted filter field means "any", like the builtin store query.
fn field_matches(actual: &Option<String>, wanted: Option<&str>) -> bool {
    match wanted {
        Some(wanted) => actual.as_deref() == Some(wanted),
        None => true,
    }
}

#[async_trait]
impl OracleProviderAdapter for MemoryOracleProvider {
    fn oracle_id(&self) -> &str {
        &self.oracle_id
    }

    fn oracle_type(&self) -> OracleType {
        OracleType::Builtin
    }

    async fn init(&self) -> Result<(), OracleProviderError> {
        if self.fail_init {
            return Err(OracleProviderError::UnableToInit("mock init failure".into()));
        }
        Ok(())
    }

    async fn destroy(&self) -> Result<(), OracleProviderError> {
        self.destroyed.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn get_participant_fsp_id(
        &self,
        party_type: &str,
        party_id: &str,
        party_sub_id: Option<&str>,
        currency: Option<&str>,
    ) -> Result<Option<String>, OracleProviderError> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        let associations = self
            .associations
            .lock()
            .map_err(|e| OracleProviderError::UnableToGetParticipant(e.to_string()))?;
        Ok(associations
            .iter()
            .find(|a| {
                a.party_type == party_type
                    && a.party_id == party_id
                    && field_matches(&a.party_sub_id, party_sub_id)
                    && field_matches(&a.currency, currency)
            })
            .map(|a| a.fsp_id.clone()))
    }

    async fn associate_participant(
        &self,
        fsp_id: &str,
        party_type: &str,
        party_id: &str,
        party_sub_id: Option<&str>,
        currency: Option<&str>,
    ) -> Result<(), OracleProviderError> {
        let mut associations = self
            .associations
            .lock()
            .map_err(|e| OracleProviderError::UnableToAssociateParticipant(e.to_string()))?;
        let taken = associations.iter().any(|a| {
            a.party_type == party_type
                && a.party_id == party_id
                && a.party_sub_id.as_deref() == party_sub_id
                && a.currency.as_deref() == currency
        });
        if taken {
            return Err(OracleProviderError::AssociationAlreadyExists {
                party_type: party_type.to_owned(),
                party_id: party_id.to_owned(),
                currency: currency.map(str::to_owned),
            });
        }
        associations.push(Association {
            fsp_id: fsp_id.into(),
            party_type: party_type.into(),
            party_id: party_id.into(),
            party_sub_id: party_sub_id.map(str::to_owned),
            currency: currency.map(str::to_owned),
        });
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
        let mut associations = self
            .associations
            .lock()
            .map_err(|e| OracleProviderError::UnableToDisassociateParticipant(e.to_string()))?;
        associations.retain(|a| {
            !(a.fsp_id == fsp_id
                && a.party_type == party_type
                && a.party_id == party_id
                && a.party_sub_id.as_deref() == party_sub_id
                && a.currency.as_deref() == currency)
        });
        Ok(())
    }

    async fn health_check(&self) -> bool {
        true
    }

    async fn get_all_associations(&self) -> Result<Vec<Association>, OracleProviderError> {
        let associations = self
            .associations
            .lock()
            .map_err(|e| OracleProviderError::UnableToGetAssociations(e.to_string()))?;
        Ok(associations.clone())
    }
}

/// Publisher that records every reply for later assertions.
#[derive(Default)]
pub struct CapturePublisher {
    messages: Mutex<Vec<ReplyMessage>>,
}

impl CapturePublisher {
    pub fn take(&self) -> Vec<ReplyMessage> {
        self.messages.lock().map(|mut m| std::mem::take(&mut *m)).unwrap_or_default()
    }
}

#[async_trait]
impl MessagePublisher for CapturePublisher {
    async fn publish(&self, message: ReplyMessage) -> Result<(), PublishError> {
        if let Ok(mut messages) = self.messages.lock() {
            messages.push(message);
        }
        Ok(())
    }
}

/// Peer service with a canned answer.
pub struct StaticPeer {
    answer: Option<String>,
}

impl StaticPeer {
    pub fn new(answer: Option<String>) -> Self {
        Self { answer }
    }
}

#[async_trait]
impl ParticipantService for StaticPeer {
    async fn participant_lookup(
        &self,
        _lookup: &ParticipantLookup,
    ) -> Result<Option<String>, AccountLookupError> {
        Ok(self.answer.clone())
    }

    async fn participant_bulk_lookup(
        &self,
        identifiers: &HashMap<String, ParticipantLookup>,
    ) -> Result<HashMap<String, Option<String>>, AccountLookupError> {
        Ok(identifiers
            .keys()
            .map(|k| (k.clone(), self.answer.clone()))
            .collect())
    }
}
