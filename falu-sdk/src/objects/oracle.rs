use serde::{Deserialize, Serialize};

/// Backend flavour of a configured oracle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OracleType {
    /// Mapping store owned by this deployment.
    #[serde(rename = "builtin")]
    Builtin,
    /// External FSP registry reached over HTTP.
    #[serde(rename = "remote-http")]
    RemoteHttp,
}

impl std::fmt::Display for OracleType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OracleType::Builtin => write!(f, "builtin"),
            OracleType::RemoteHttp => write!(f, "remote-http"),
        }
    }
}

/// One configured routing target: party type (plus optional currency) to a
/// backend system of record.
///
/// Registered at startup and read-only afterwards; reconfiguration requires
/// a restart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Oracle {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub oracle_type: OracleType,
    pub party_type: String,
    #[serde(default)]
    pub currency: Option<String>,
    /// Base URL of the registry, only meaningful for `remote-http`.
    #[serde(default)]
    pub endpoint: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oracle_type_wire_values() {
        assert_eq!(
            serde_json::to_string(&OracleType::RemoteHttp).unwrap(),
            r#""remote-http""#
        );
        let parsed: OracleType = serde_json::from_str(r#""builtin""#).unwrap();
        assert_eq!(parsed, OracleType::Builtin);
    }
}
