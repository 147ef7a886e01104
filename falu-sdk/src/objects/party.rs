use serde::{Deserialize, Serialize};

/// Identifies the subject of an account lookup.
///
/// Immutable per request. The same tuple shape is used for party- and
/// participant-scoped operations; only the event naming differs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantLookup {
    pub party_id: String,
    pub party_type: String,
    #[serde(default)]
    pub party_sub_id: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
}

impl ParticipantLookup {
    pub fn new(
        party_type: impl Into<String>,
        party_id: impl Into<String>,
        party_sub_id: Option<&str>,
        currency: Option<&str>,
    ) -> Self {
        Self {
            party_id: party_id.into(),
            party_type: party_type.into(),
            party_sub_id: party_sub_id.map(str::to_owned),
            currency: currency.map(str::to_owned),
        }
    }

    /// Deterministic composite key for this identifier.
    ///
    /// Used both as the cache key and as the correlation key on reply
    /// events. Absent sub-id/currency collapse to `-` so the key is stable
    /// regardless of how the identifier was built.
    pub fn lookup_key(&self) -> String {
        format!(
            "{}:{}:{}:{}",
            self.party_type,
            self.party_id,
            self.party_sub_id.as_deref().unwrap_or("-"),
            self.currency.as_deref().unwrap_or("-"),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_key_is_deterministic() {
        let full = ParticipantLookup::new("MSISDN", "123", Some("EMPLOYEE"), Some("EUR"));
        assert_eq!(full.lookup_key(), "MSISDN:123:EMPLOYEE:EUR");

        let bare = ParticipantLookup::new("MSISDN", "123", None, None);
        assert_eq!(bare.lookup_key(), "MSISDN:123:-:-");
    }

    #[test]
    fn wire_names_are_camel_case() {
        let parsed: ParticipantLookup = serde_json::from_str(
            r#"{"partyId":"123","partyType":"MSISDN","partySubId":"EMPLOYEE"}"#,
        )
        .unwrap();
        assert_eq!(parsed.party_id, "123");
        assert_eq!(parsed.party_sub_id.as_deref(), Some("EMPLOYEE"));
        assert_eq!(parsed.currency, None);
    }
}
