//! Event type definitions for the account-lookup pipeline.

use serde::{Deserialize, Serialize};

/// Topic the service consumes lookup requests from.
pub const ACCOUNT_LOOKUP_TOPIC: &str = "account-lookup";

/// Topic result and error replies are published to.
pub const ACCOUNT_LOOKUP_REPLY_TOPIC: &str = "account-lookup-replies";

/// The closed set of inbound event kinds.
///
/// Get / Associate / Disassociate, party- and participant-scoped, each with
/// and without a sub-id. Dispatch over these is an exhaustive `match`, so
/// adding a kind without handling it is a compile error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccountLookUpEventType {
    GetPartyByTypeAndId,
    GetPartyByTypeAndIdAndSubId,
    AssociatePartyByTypeAndId,
    AssociatePartyByTypeAndIdAndSubId,
    DisassociatePartyByTypeAndId,
    DisassociatePartyByTypeAndIdAndSubId,
    GetParticipantByTypeAndId,
    GetParticipantByTypeAndIdAndSubId,
    AssociateParticipantByTypeAndId,
    AssociateParticipantByTypeAndIdAndSubId,
    DisassociateParticipantByTypeAndId,
    DisassociateParticipantByTypeAndIdAndSubId,
}

impl AccountLookUpEventType {
    pub const ALL: [AccountLookUpEventType; 12] = [
        AccountLookUpEventType::GetPartyByTypeAndId,
        AccountLookUpEventType::GetPartyByTypeAndIdAndSubId,
        AccountLookUpEventType::AssociatePartyByTypeAndId,
        AccountLookUpEventType::AssociatePartyByTypeAndIdAndSubId,
        AccountLookUpEventType::DisassociatePartyByTypeAndId,
        AccountLookUpEventType::DisassociatePartyByTypeAndIdAndSubId,
        AccountLookUpEventType::GetParticipantByTypeAndId,
        AccountLookUpEventType::GetParticipantByTypeAndIdAndSubId,
        AccountLookUpEventType::AssociateParticipantByTypeAndId,
        AccountLookUpEventType::AssociateParticipantByTypeAndIdAndSubId,
        AccountLookUpEventType::DisassociateParticipantByTypeAndId,
        AccountLookUpEventType::DisassociateParticipantByTypeAndIdAndSubId,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GetPartyByTypeAndId => "GetPartyByTypeAndId",
            Self::GetPartyByTypeAndIdAndSubId => "GetPartyByTypeAndIdAndSubId",
            Self::AssociatePartyByTypeAndId => "AssociatePartyByTypeAndId",
            Self::AssociatePartyByTypeAndIdAndSubId => "AssociatePartyByTypeAndIdAndSubId",
            Self::DisassociatePartyByTypeAndId => "DisassociatePartyByTypeAndId",
            Self::DisassociatePartyByTypeAndIdAndSubId => "DisassociatePartyByTypeAndIdAndSubId",
            Self::GetParticipantByTypeAndId => "GetParticipantByTypeAndId",
            Self::GetParticipantByTypeAndIdAndSubId => "GetParticipantByTypeAndIdAndSubId",
            Self::AssociateParticipantByTypeAndId => "AssociateParticipantByTypeAndId",
            Self::AssociateParticipantByTypeAndIdAndSubId => {
                "AssociateParticipantByTypeAndIdAndSubId"
            }
            Self::DisassociateParticipantByTypeAndId => "DisassociateParticipantByTypeAndId",
            Self::DisassociateParticipantByTypeAndIdAndSubId => {
                "DisassociateParticipantByTypeAndIdAndSubId"
            }
        }
    }
}

impl std::fmt::Display for AccountLookUpEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AccountLookUpEventType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or(())
    }
}

/// A fully parsed inbound event: kind plus its typed payload.
///
/// Get events carry the identifier tuple; associate/disassociate events
/// additionally carry the owning `fspId`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum AccountLookUpEvent {
    #[serde(rename_all = "camelCase")]
    GetPartyByTypeAndId {
        party_type: String,
        party_id: String,
        #[serde(default)]
        currency: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    GetPartyByTypeAndIdAndSubId {
        party_type: String,
        party_id: String,
        party_sub_id: String,
        #[serde(default)]
        currency: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    AssociatePartyByTypeAndId {
        fsp_id: String,
        party_type: String,
        party_id: String,
        #[serde(default)]
        currency: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    AssociatePartyByTypeAndIdAndSubId {
        fsp_id: String,
        party_type: String,
        party_id: String,
        party_sub_id: String,
        #[serde(default)]
        currency: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    DisassociatePartyByTypeAndId {
        fsp_id: String,
        party_type: String,
        party_id: String,
        #[serde(default)]
        currency: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    DisassociatePartyByTypeAndIdAndSubId {
        fsp_id: String,
        party_type: String,
        party_id: String,
        party_sub_id: String,
        #[serde(default)]
        currency: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    GetParticipantByTypeAndId {
        participant_type: String,
        participant_id: String,
        #[serde(default)]
        currency: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    GetParticipantByTypeAndIdAndSubId {
        participant_type: String,
        participant_id: String,
        participant_sub_id: String,
        #[serde(default)]
        currency: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    AssociateParticipantByTypeAndId {
        fsp_id: String,
        participant_type: String,
        participant_id: String,
        #[serde(default)]
        currency: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    AssociateParticipantByTypeAndIdAndSubId {
        fsp_id: String,
        participant_type: String,
        participant_id: String,
        participant_sub_id: String,
        #[serde(default)]
        currency: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    DisassociateParticipantByTypeAndId {
        fsp_id: String,
        participant_type: String,
        participant_id: String,
        #[serde(default)]
        currency: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    DisassociateParticipantByTypeAndIdAndSubId {
        fsp_id: String,
        participant_type: String,
        participant_id: String,
        participant_sub_id: String,
        #[serde(default)]
        currency: Option<String>,
    },
}

impl AccountLookUpEvent {
    pub fn event_type(&self) -> AccountLookUpEventType {
        match self {
            Self::GetPartyByTypeAndId { .. } => AccountLookUpEventType::GetPartyByTypeAndId,
            Self::GetPartyByTypeAndIdAndSubId { .. } => {
                AccountLookUpEventType::GetPartyByTypeAndIdAndSubId
            }
            Self::AssociatePartyByTypeAndId { .. } => {
                AccountLookUpEventType::AssociatePartyByTypeAndId
            }
            Self::AssociatePartyByTypeAndIdAndSubId { .. } => {
                AccountLookUpEventType::AssociatePartyByTypeAndIdAndSubId
            }
            Self::DisassociatePartyByTypeAndId { .. } => {
                AccountLookUpEventType::DisassociatePartyByTypeAndId
            }
            Self::DisassociatePartyByTypeAndIdAndSubId { .. } => {
                AccountLookUpEventType::DisassociatePartyByTypeAndIdAndSubId
            }
            Self::GetParticipantByTypeAndId { .. } => {
                AccountLookUpEventType::GetParticipantByTypeAndId
            }
            Self::GetParticipantByTypeAndIdAndSubId { .. } => {
                AccountLookUpEventType::GetParticipantByTypeAndIdAndSubId
            }
            Self::AssociateParticipantByTypeAndId { .. } => {
                AccountLookUpEventType::AssociateParticipantByTypeAndId
            }
            Self::AssociateParticipantByTypeAndIdAndSubId { .. } => {
                AccountLookUpEventType::AssociateParticipantByTypeAndIdAndSubId
            }
            Self::DisassociateParticipantByTypeAndId { .. } => {
                AccountLookUpEventType::DisassociateParticipantByTypeAndId
            }
            Self::DisassociateParticipantByTypeAndIdAndSubId { .. } => {
                AccountLookUpEventType::DisassociateParticipantByTypeAndIdAndSubId
            }
        }
    }
}

/// Inbound bus envelope.
///
/// `value` stays untyped here; the event handler peels it in two steps so
/// that "malformed envelope" and "unknown event type" are reported as
/// distinct validation failures.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountLookUpMessage {
    pub key: String,
    pub timestamp: i64,
    pub topic: String,
    #[serde(default)]
    pub headers: Vec<(String, String)>,
    pub value: serde_json::Value,
}

/// Outbound reply payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum AccountLookUpReply {
    /// Successful resolution, including the legitimate "no FSP" outcome.
    #[serde(rename_all = "camelCase")]
    FspIdResolved {
        party_type: String,
        party_id: String,
        party_sub_id: Option<String>,
        currency: Option<String>,
        fsp_id: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    ParticipantAssociated {
        fsp_id: String,
        party_type: String,
        party_id: String,
        party_sub_id: Option<String>,
        currency: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    ParticipantDisassociated {
        fsp_id: String,
        party_type: String,
        party_id: String,
        party_sub_id: Option<String>,
        currency: Option<String>,
    },
    /// Error descriptor for a request that could not be served.
    #[serde(rename_all = "camelCase")]
    OperationFailed {
        event_type: AccountLookUpEventType,
        message: String,
    },
}

/// Outbound bus envelope, correlated to the originating request by `key`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyMessage {
    pub key: String,
    pub timestamp: i64,
    pub topic: String,
    pub value: AccountLookUpReply,
}

impl ReplyMessage {
    pub fn new(key: impl Into<String>, value: AccountLookUpReply) -> Self {
        Self {
            key: key.into(),
            timestamp: time::OffsetDateTime::now_utc().unix_timestamp(),
            topic: ACCOUNT_LOOKUP_REPLY_TOPIC.to_owned(),
            value,
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use std::str::FromStr;

    #[test]
    fn event_type_round_trips_through_str() {
        for event_type in AccountLookUpEventType::ALL {
            let parsed = AccountLookUpEventType::from_str(event_type.as_str()).unwrap();
            assert_eq!(parsed, event_type);
        }
        assert!(AccountLookUpEventType::from_str("NotAnEvent").is_err());
    }

    #[test]
    fn get_party_event_parses_from_tagged_json() {
        let value = serde_json::json!({
            "type": "GetPartyByTypeAndId",
            "payload": { "partyType": "MSISDN", "partyId": "123" }
        });
        let event: AccountLookUpEvent = serde_json::from_value(value).unwrap();
        assert_eq!(
            event,
            AccountLookUpEvent::GetPartyByTypeAndId {
                party_type: "MSISDN".into(),
                party_id: "123".into(),
                currency: None,
            }
        );
        assert_eq!(event.event_type(), AccountLookUpEventType::GetPartyByTypeAndId);
    }

    #[test]
    fn associate_event_requires_fsp_id() {
        let value = serde_json::json!({
            "type": "AssociatePartyByTypeAndId",
            "payload": { "partyType": "MSISDN", "partyId": "123" }
        });
        assert!(serde_json::from_value::<AccountLookUpEvent>(value).is_err());
    }

    #[test]
    fn reply_serializes_with_type_tag() {
        let reply = AccountLookUpReply::FspIdResolved {
            party_type: "MSISDN".into(),
            party_id: "123".into(),
            party_sub_id: None,
            currency: None,
            fsp_id: Some("FSP1".into()),
        };
        let json = serde_json::to_value(&reply).unwrap();
        assert_eq!(json["type"], "FspIdResolved");
        assert_eq!(json["payload"]["fspId"], "FSP1");
    }
}
