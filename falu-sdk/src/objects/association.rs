use serde::{Deserialize, Serialize};

/// The persisted fact that a party belongs to an FSP.
///
/// At most one active association exists per
/// (partyType, partyId, partySubId, currency) tuple within one oracle's
/// store; the store enforces this.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Association {
    pub fsp_id: String,
    pub party_type: String,
    pub party_id: String,
    #[serde(default)]
    pub party_sub_id: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
}
