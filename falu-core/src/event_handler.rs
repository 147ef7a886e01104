//! Inbound event dispatch.
//!
//! Decouples the bus transport from the aggregate's typed method
//! signatures: the handler validates the envelope, narrows the event type,
//! and hands the payload fields to the matching aggregate operation. All
//! validation failures are recovered locally (logged, never propagated) so
//! a poison message can never take the consumer loop down.

use std::convert::Infallible;
use std::sync::{Arc, RwLock};

use kanau::processor::Processor;
use tracing::{error, warn};

use crate::aggregate::AccountLookupAggregate;
use crate::bus::MessagePublisher;
use crate::errors::AccountLookupError;
use crate::events::{
    AccountLookUpEvent, AccountLookUpEventType, AccountLookUpMessage, AccountLookUpReply,
    ReplyMessage,
};

pub struct AccountLookUpEventHandler {
    aggregate: Arc<AccountLookupAggregate>,
    publisher: Arc<dyn MessagePublisher>,
    registered: RwLock<Vec<AccountLookUpEventType>>,
}

impl AccountLookUpEventHandler {
    pub fn new(aggregate: Arc<AccountLookupAggregate>, publisher: Arc<dyn MessagePublisher>) -> Self {
        Self {
            aggregate,
            publisher,
            registered: RwLock::new(Vec::new()),
        }
    }

    /// Register every known event type exactly once. Idempotent: re-init
    /// clears existing registrations first.
    pub fn init(&self) {
        if let Ok(mut registered) = self.registered.write() {
            registered.clear();
            registered.extend(AccountLookUpEventType::ALL);
        }
    }

    /// Remove all registrations; subsequent messages are dropped.
    pub fn destroy(&self) {
        if let Ok(mut registered) = self.registered.write() {
            registered.clear();
        }
    }

    /// The event types this handler currently dispatches.
    pub fn registered_events(&self) -> Vec<AccountLookUpEventType> {
        self.registered
            .read()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    fn is_registered(&self, event_type: AccountLookUpEventType) -> bool {
        self.registered
            .read()
            .map(|r| r.contains(&event_type))
            .unwrap_or(false)
    }

    /// Validate and dispatch one inbound message.
    ///
    /// Malformed envelopes, unknown event types and bad payloads are
    /// logged and dropped. An aggregate failure is logged as
    /// `<eventType>: <error>` and answered with an `OperationFailed`
    /// reply; the handler itself stays usable either way.
    pub async fn handle_message(&self, message: &AccountLookUpMessage) {
        let Some(type_tag) = message.value.get("type").and_then(|v| v.as_str()) else {
            error!(key = %message.key, "account lookup message has an invalid format or value");
            return;
        };

        let Ok(event_type) = type_tag.parse::<AccountLookUpEventType>() else {
            error!(
                key = %message.key,
                "message type {type_tag} is not a valid account lookup event type"
            );
            return;
        };

        if !self.is_registered(event_type) {
            error!(%event_type, "event handler has no registration for message, dropping");
            return;
        }

        let event: AccountLookUpEvent = match serde_json::from_value(message.value.clone()) {
            Ok(event) => event,
            Err(e) => {
                error!("{event_type}: payload is missing required fields: {e}");
                return;
            }
        };

        if let Err(e) = self.dispatch(event).await {
            error!("{event_type}: {e}");
            let failed = ReplyMessage::new(
                message.key.clone(),
                AccountLookUpReply::OperationFailed {
                    event_type,
                    message: e.to_string(),
                },
            );
            if let Err(pe) = self.publisher.publish(failed).await {
                warn!(%event_type, error = %pe, "unable to publish failure reply");
            }
        }
    }

    /// Exhaustive dispatch over the closed event set.
    async fn dispatch(&self, event: AccountLookUpEvent) -> Result<(), AccountLookupError> {
        match event {
            AccountLookUpEvent::GetPartyByTypeAndId {
                party_type,
                party_id,
                currency,
            } => {
                self.aggregate
                    .get_party_by_type_and_id(&party_type, &party_id, currency.as_deref())
                    .await?;
            }
            AccountLookUpEvent::GetPartyByTypeAndIdAndSubId {
                party_type,
                party_id,
                party_sub_id,
                currency,
            } => {
                self.aggregate
                    .get_party_by_type_and_id_and_sub_id(
                        &party_type,
                        &party_id,
                        &party_sub_id,
                        currency.as_deref(),
                    )
                    .await?;
            }
            AccountLookUpEvent::AssociatePartyByTypeAndId {
                fsp_id,
                party_type,
                party_id,
                currency,
            } => {
                self.aggregate
                    .associate_party_by_type_and_id(
                        &fsp_id,
                        &party_type,
                        &party_id,
                        currency.as_deref(),
                    )
                    .await?;
            }
            AccountLookUpEvent::AssociatePartyByTypeAndIdAndSubId {
                fsp_id,
                party_type,
                party_id,
                party_sub_id,
                currency,
            } => {
                self.aggregate
                    .associate_party_by_type_and_id_and_sub_id(
                        &fsp_id,
                        &party_type,
                        &party_id,
                        &party_sub_id,
                        currency.as_deref(),
                    )
                    .await?;
            }
            AccountLookUpEvent::DisassociatePartyByTypeAndId {
                fsp_id,
                party_type,
                party_id,
                currency,
            } => {
                self.aggregate
                    .disassociate_party_by_type_and_id(
                        &fsp_id,
                        &party_type,
                        &party_id,
                        currency.as_deref(),
                    )
                    .await?;
            }
            AccountLookUpEvent::DisassociatePartyByTypeAndIdAndSubId {
                fsp_id,
                party_type,
                party_id,
                party_sub_id,
                currency,
            } => {
                self.aggregate
                    .disassociate_party_by_type_and_id_and_sub_id(
                        &fsp_id,
                        &party_type,
                        &party_id,
                        &party_sub_id,
                        currency.as_deref(),
                    )
                    .await?;
            }
            AccountLookUpEvent::GetParticipantByTypeAndId {
                participant_type,
                participant_id,
                currency,
            } => {
                self.aggregate
                    .get_participant_by_type_and_id(
                        &participant_type,
                        &participant_id,
                        currency.as_deref(),
                    )
                    .await?;
            }
            AccountLookUpEvent::GetParticipantByTypeAndIdAndSubId {
                participant_type,
                participant_id,
                participant_sub_id,
                currency,
            } => {
                self.aggregate
                    .get_participant_by_type_and_id_and_sub_id(
                        &participant_type,
                        &participant_id,
                        &participant_sub_id,
                        currency.as_deref(),
                    )
                    .await?;
            }
            AccountLookUpEvent::AssociateParticipantByTypeAndId {
                fsp_id,
                participant_type,
                participant_id,
                currency,
            } => {
                self.aggregate
                    .associate_participant_by_type_and_id(
                        &fsp_id,
                        &participant_type,
                        &participant_id,
                        currency.as_deref(),
                    )
                    .await?;
            }
            AccountLookUpEvent::AssociateParticipantByTypeAndIdAndSubId {
                fsp_id,
                participant_type,
                participant_id,
                participant_sub_id,
                currency,
            } => {
                self.aggregate
                    .associate_participant_by_type_and_id_and_sub_id(
                        &fsp_id,
                        &participant_type,
                        &participant_id,
                        &participant_sub_id,
                        currency.as_deref(),
                    )
                    .await?;
            }
            AccountLookUpEvent::DisassociateParticipantByTypeAndId {
                fsp_id,
                participant_type,
                participant_id,
                currency,
            } => {
                self.aggregate
                    .disassociate_participant_by_type_and_id(
                        &fsp_id,
                        &participant_type,
                        &participant_id,
                        currency.as_deref(),
                    )
                    .await?;
            }
            AccountLookUpEvent::DisassociateParticipantByTypeAndIdAndSubId {
                fsp_id,
                participant_type,
                participant_id,
                participant_sub_id,
                currency,
            } => {
                self.aggregate
                    .disassociate_participant_by_type_and_id_and_sub_id(
                        &fsp_id,
                        &participant_type,
                        &participant_id,
                        &participant_sub_id,
                        currency.as_deref(),
                    )
                    .await?;
            }
        }
        Ok(())
    }
}

impl Processor<AccountLookUpMessage> for AccountLookUpEventHandler {
    type Output = ();
    type Error = Infallible;

    async fn process(&self, message: AccountLookUpMessage) -> Result<(), Infallible> {
        self.handle_message(&message).await;
        Ok(())
    }
}
