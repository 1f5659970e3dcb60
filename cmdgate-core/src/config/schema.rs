//! Configuration schema types.
//!
//! ```yaml
//! schema: 1
//!
//! gate:
//!   endpoint: ${CMDGATE_ENDPOINT:-gate.internal:8080/authorize}
//!   identity: ops-console
//!   timeout: 10s
//!   connect_timeout: PT5S
//!   noop_function_code: 1      # null disables the bypass
//!   allow_empty_data: null
//!
//! fields:
//!   stream_id: CCSDS_STREAMID
//!   function_code: CCSDS_FC
//!   response: SER_CMD
//! ```

use serde::Deserialize;
use std::time::Duration;

use super::defaults::{
    DEFAULT_CONNECT_TIMEOUT, DEFAULT_MAX_RESPONSE_SIZE, DEFAULT_NOOP_FUNCTION_CODE,
    DEFAULT_REQUEST_TIMEOUT,
};
use super::duration_format;
use crate::client::GateClientConfig;
use crate::dispatcher::DispatcherConfig;
use crate::packet::FieldNames;
use crate::protocol::AllowEmptyData;

/// Root configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Schema version, must be 1.
    pub schema: u32,

    /// Remote gate settings.
    pub gate: GateSection,

    /// Designated packet field names.
    #[serde(default)]
    pub fields: FieldNames,
}

/// Remote gate settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GateSection {
    /// Gate URL, normalized at construction.
    pub endpoint: String,

    /// Operator identity sent as `keycloak_id`.
    #[serde(default)]
    pub identity: Option<String>,

    /// Whole-request timeout (defaults to 10s).
    #[serde(default, deserialize_with = "duration_format::deserialize_option")]
    pub timeout: Option<Duration>,

    /// Connect timeout (defaults to 5s).
    #[serde(default, deserialize_with = "duration_format::deserialize_option")]
    pub connect_timeout: Option<Duration>,

    /// Response body limit in bytes (defaults to 1 MiB).
    #[serde(default)]
    pub max_response_size: Option<usize>,

    /// Function code that bypasses the gate. An explicit `null` disables it.
    #[serde(default = "default_noop_function_code")]
    pub noop_function_code: Option<i64>,

    /// Empty-data policy forwarded to the host stage.
    #[serde(default)]
    pub allow_empty_data: AllowEmptyData,
}

fn default_noop_function_code() -> Option<i64> {
    Some(DEFAULT_NOOP_FUNCTION_CODE)
}

impl GateSection {
    /// HTTP client settings with defaults filled in.
    pub fn client_config(&self) -> GateClientConfig {
        GateClientConfig {
            timeout: self.timeout.unwrap_or(DEFAULT_REQUEST_TIMEOUT),
            connect_timeout: self.connect_timeout.unwrap_or(DEFAULT_CONNECT_TIMEOUT),
            max_response_size: self.max_response_size.unwrap_or(DEFAULT_MAX_RESPONSE_SIZE),
        }
    }
}

impl Config {
    /// Construction parameters for a [`crate::Dispatcher`].
    pub fn dispatcher_config(&self) -> DispatcherConfig {
        DispatcherConfig {
            endpoint: self.gate.endpoint.clone(),
            identity: self.gate.identity.clone(),
            fields: self.fields.clone(),
            noop_function_code: self.gate.noop_function_code,
            allow_empty_data: self.gate.allow_empty_data,
            client: self.gate.client_config(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_gate_section_defaults() {
        let yaml = "schema: 1\ngate:\n  endpoint: gate:8080\n";
        let config: Config = serde_saphyr::from_str(yaml).unwrap();
        let dc = config.dispatcher_config();

        assert_eq!(dc.endpoint, "gate:8080");
        assert_eq!(dc.identity, None);
        assert_eq!(dc.noop_function_code, Some(1));
        assert_eq!(dc.allow_empty_data, AllowEmptyData::Unset);
        assert_eq!(dc.fields, FieldNames::default());
        assert_eq!(dc.client, GateClientConfig::default());
    }

    #[test]
    fn test_explicit_null_disables_noop() {
        let yaml = "schema: 1\ngate:\n  endpoint: gate\n  noop_function_code: null\n";
        let config: Config = serde_saphyr::from_str(yaml).unwrap();
        assert_eq!(config.gate.noop_function_code, None);
    }

    #[test]
    fn test_full_config() {
        let yaml = r#"
schema: 1
gate:
  endpoint: https://gate.example.com/authorize
  identity: op-42
  timeout: 3s
  connect_timeout: PT1S
  max_response_size: 4096
  noop_function_code: 0
  allow_empty_data: false
fields:
  stream_id: HDR_SID
  function_code: HDR_FC
  response: SIGNATURE
"#;
        let config: Config = serde_saphyr::from_str(yaml).unwrap();
        let dc = config.dispatcher_config();

        assert_eq!(dc.identity.as_deref(), Some("op-42"));
        assert_eq!(dc.noop_function_code, Some(0));
        assert_eq!(dc.allow_empty_data, AllowEmptyData::Deny);
        assert_eq!(dc.client.timeout, Duration::from_secs(3));
        assert_eq!(dc.client.connect_timeout, Duration::from_secs(1));
        assert_eq!(dc.client.max_response_size, 4096);
        assert_eq!(dc.fields.response, "SIGNATURE");
    }

    #[test]
    fn test_unknown_key_rejected() {
        let yaml = "schema: 1\ngate:\n  endpoint: gate\n  retries: 3\n";
        let result: Result<Config, _> = serde_saphyr::from_str(yaml);
        assert!(result.is_err());
    }
}
