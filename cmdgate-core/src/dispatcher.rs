//! The command write-path gate.
//!
//! For every outgoing command the dispatcher reads two header fields, asks
//! the remote gate whether the command may go out, and on approval writes the
//! gate's response bytes into the designated response field.
//!
//! ```text
//! Start ─▶ ExemptCheck ─┬─▶ PassThrough ──────────────────────────▶ Continue
//!                       └─▶ BuildSummary ─▶ RemoteCall ─┬─▶ Allowed ─▶ Annotate ─┬─▶ Continue
//!                                                       │                        └─▶ Stop
//!                                                       └─▶ Denied ─────────────────▶ Stop
//! ```
//!
//! Only the response field is ever written. Response bytes travel as a return
//! value from the remote call to the annotate step, so one dispatcher can be
//! shared across tasks processing packets concurrently.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, info, warn};

use crate::client::{GateClient, GateClientConfig, GateResponse, HttpGateClient};
use crate::config::ConfigError;
use crate::config::defaults::DEFAULT_NOOP_FUNCTION_CODE;
use crate::endpoint::GateEndpoint;
use crate::error::GateError;
use crate::packet::{FieldNames, ItemDescriptor, Packet};
use crate::protocol::{AllowEmptyData, DispatchOutcome, WriteProtocol};
use crate::summary::DispatchSummary;

/// Construction parameters for a [`Dispatcher`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatcherConfig {
    /// Raw gate endpoint, normalized by [`Dispatcher::new`].
    pub endpoint: String,
    /// Operator identity; `"unknown"` when absent.
    pub identity: Option<String>,
    /// Designated packet fields.
    pub fields: FieldNames,
    /// Function code that bypasses the gate, if any.
    pub noop_function_code: Option<i64>,
    /// Empty-data policy forwarded to the host.
    pub allow_empty_data: AllowEmptyData,
    /// HTTP client settings.
    pub client: GateClientConfig,
}

impl DispatcherConfig {
    /// Defaults for everything except the endpoint.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            identity: None,
            fields: FieldNames::default(),
            noop_function_code: Some(DEFAULT_NOOP_FUNCTION_CODE),
            allow_empty_data: AllowEmptyData::Unset,
            client: GateClientConfig::default(),
        }
    }

    #[must_use]
    pub fn with_identity(mut self, identity: impl Into<String>) -> Self {
        self.identity = Some(identity.into());
        self
    }

    /// Load from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `CMDGATE_ENDPOINT` (required)
    /// - `CMDGATE_IDENTITY` (optional)
    /// - plus the timeouts read by [`GateClientConfig::from_env`]
    ///
    /// # Errors
    ///
    /// `ConfigError::MissingEnvVar` if `CMDGATE_ENDPOINT` is not set, or any
    /// error from [`GateClientConfig::from_env`].
    pub fn from_env() -> Result<Self, ConfigError> {
        let endpoint =
            std::env::var("CMDGATE_ENDPOINT").map_err(|_| ConfigError::MissingEnvVar {
                var: "CMDGATE_ENDPOINT".to_string(),
                field: "gate.endpoint".to_string(),
            })?;
        let identity = std::env::var("CMDGATE_IDENTITY")
            .ok()
            .filter(|s| !s.trim().is_empty());

        Ok(Self {
            identity,
            client: GateClientConfig::from_env()?,
            ..Self::new(endpoint)
        })
    }
}

/// The command write-path gate.
pub struct Dispatcher {
    endpoint: GateEndpoint,
    identity: Option<String>,
    fields: FieldNames,
    noop_function_code: Option<i64>,
    allow_empty_data: AllowEmptyData,
    client: Arc<dyn GateClient>,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("endpoint", &self.endpoint.as_str())
            .field("identity", &self.identity)
            .field("fields", &self.fields)
            .field("noop_function_code", &self.noop_function_code)
            .field("allow_empty_data", &self.allow_empty_data)
            .finish_non_exhaustive()
    }
}

impl Dispatcher {
    /// Build a dispatcher backed by the HTTP gate client.
    ///
    /// # Errors
    ///
    /// `ConfigError` if the endpoint is empty or does not normalize, a field
    /// name is invalid, or the HTTP client cannot be built.
    pub fn new(config: DispatcherConfig) -> Result<Self, ConfigError> {
        let client = HttpGateClient::new(config.client.clone())?;
        Self::with_client(config, Arc::new(client))
    }

    /// Build a dispatcher with a caller-supplied gate client.
    ///
    /// `config.client` is ignored.
    pub fn with_client(
        config: DispatcherConfig,
        client: Arc<dyn GateClient>,
    ) -> Result<Self, ConfigError> {
        let endpoint = GateEndpoint::parse(&config.endpoint)?;
        config.fields.validate()?;

        Ok(Self {
            endpoint,
            identity: config.identity,
            fields: config.fields,
            noop_function_code: config.noop_function_code,
            allow_empty_data: config.allow_empty_data,
            client,
        })
    }

    pub fn endpoint(&self) -> &GateEndpoint {
        &self.endpoint
    }

    pub fn identity(&self) -> Option<&str> {
        self.identity.as_deref()
    }

    /// Gate one outgoing command.
    ///
    /// # Errors
    ///
    /// `ConfigError::MissingField` or `ConfigError::NonNumericField` when the
    /// packet definition lacks a designated field or a header field is not
    /// numeric. The response field is only required once the packet is not a
    /// no-op. Every per-packet failure is `Ok(DispatchOutcome::Stop)`.
    pub async fn on_write<P: Packet + 'static>(
        &self,
        mut packet: P,
    ) -> Result<DispatchOutcome<P>, ConfigError> {
        let header = self.fields.resolve_header(&packet)?.read(&packet)?;

        if self.noop_function_code == Some(header.function_code) {
            info!(
                target_name = %packet.target_name(),
                packet = %packet.packet_name(),
                function_code = header.function_code,
                "NOOP command; passing without dispatch"
            );
            return Ok(DispatchOutcome::Continue(packet));
        }

        let response_item = self.fields.resolve_response(&packet)?;
        let summary = DispatchSummary::build(
            self.identity.as_deref(),
            packet.target_name(),
            packet.packet_name(),
            header.stream_id,
            header.function_code,
        );
        info!(
            endpoint = %self.endpoint,
            summary = %summary.to_json_string(),
            "POST summary to gate"
        );

        let response = self.client.dispatch(&self.endpoint, &summary).await;

        if !response.allowed {
            warn!(
                target_name = %summary.target,
                packet = %summary.packet_name,
                classification = response.classification(),
                status = ?response.status,
                "Gate denied or error; stopping pipeline"
            );
            return Ok(DispatchOutcome::Stop);
        }

        match annotate(&mut packet, &response_item, &response) {
            Ok(()) => {
                info!(
                    field = %response_item.name,
                    bytes = response.body.len(),
                    "Wrote gate response into packet"
                );
                Ok(DispatchOutcome::Continue(packet))
            }
            Err(e) => {
                error!(
                    target_name = %summary.target,
                    packet = %summary.packet_name,
                    classification = e.classification(),
                    error = %e,
                    "Failed to annotate packet; stopping pipeline"
                );
                Ok(DispatchOutcome::Stop)
            }
        }
    }
}

/// Write the gate's response bytes into the response field.
fn annotate<P: Packet>(
    packet: &mut P,
    item: &ItemDescriptor,
    response: &GateResponse,
) -> Result<(), GateError> {
    packet
        .write_item(item, &response.body)
        .map_err(|source| GateError::FieldWrite {
            field: item.name.clone(),
            source,
        })
}

#[async_trait]
impl<P: Packet + 'static> WriteProtocol<P> for Dispatcher {
    fn name(&self) -> &'static str {
        "dispatcher"
    }

    fn allow_empty_data(&self) -> AllowEmptyData {
        self.allow_empty_data
    }

    async fn write_packet(&self, packet: P) -> Result<DispatchOutcome<P>, ConfigError> {
        self.on_write(packet).await
    }
}
