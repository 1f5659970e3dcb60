//! The summary of an outgoing command sent to the gate.

use serde::{Deserialize, Serialize};

/// Identity reported when none is configured.
pub const UNKNOWN_IDENTITY: &str = "unknown";

/// Per-packet request payload for the gate.
///
/// Field order is the wire order of the JSON object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchSummary {
    /// Operator identity (the identity-provider subject).
    #[serde(rename = "keycloak_id")]
    pub identity: String,
    /// Target the command is addressed to.
    pub target: String,
    /// Command packet name.
    pub packet_name: String,
    /// Converted value of the stream id header field.
    pub stream_id: i64,
    /// Converted value of the function code header field.
    pub function_code: i64,
}

impl DispatchSummary {
    /// Build a summary, falling back to [`UNKNOWN_IDENTITY`].
    #[must_use]
    pub fn build(
        identity: Option<&str>,
        target: impl Into<String>,
        packet_name: impl Into<String>,
        stream_id: i64,
        function_code: i64,
    ) -> Self {
        Self {
            identity: identity.unwrap_or(UNKNOWN_IDENTITY).to_string(),
            target: target.into(),
            packet_name: packet_name.into(),
            stream_id,
            function_code,
        }
    }

    /// Canonical JSON encoding sent as the request body.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        // Plain strings and integers only; serialization cannot fail.
        serde_json::to_vec(self).unwrap_or_default()
    }

    /// Canonical encoding as text, for logs.
    #[must_use]
    pub fn to_json_string(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}
