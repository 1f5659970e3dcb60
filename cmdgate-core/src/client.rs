//! HTTP client for the remote authorization gate.
//!
//! Each outgoing command gets exactly one POST to the gate. The client never
//! fails past its boundary: every outcome, including transport failures, comes
//! back as a [`GateResponse`] with `allowed` set accordingly.
//!
//! # Outcome Classification
//!
//! - 2xx → allowed, body kept as the annotation bytes
//! - other status → denied, body kept and previewed in logs
//! - timeout / connect / protocol failure → denied, partial body kept when
//!   one was received (never after a timeout)
//!
//! # Security
//!
//! - TLS is used iff the endpoint scheme is `https` (rustls, TLS 1.2+)
//! - No automatic retry, so a command is never authorized twice
//! - Redirects are not followed; a 3xx is a denial like any other non-2xx
//! - Response bodies are bounded by `max_response_size`

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use tracing::{debug, error, info};

use crate::config::ConfigError;
use crate::config::defaults::{
    DEFAULT_CONNECT_TIMEOUT, DEFAULT_MAX_RESPONSE_SIZE, DEFAULT_REQUEST_TIMEOUT,
};
use crate::endpoint::GateEndpoint;
use crate::error::{GateError, UnreachableKind};
use crate::preview::{PREVIEW_LIMIT, body_preview};
use crate::summary::DispatchSummary;

/// Configuration for the gate client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateClientConfig {
    /// Whole-request timeout (connect, send, and body read)
    pub timeout: Duration,
    /// Connection timeout (TCP + TLS handshake)
    pub connect_timeout: Duration,
    /// Maximum response body size in bytes
    pub max_response_size: usize,
}

impl Default for GateClientConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_REQUEST_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            max_response_size: DEFAULT_MAX_RESPONSE_SIZE,
        }
    }
}

impl GateClientConfig {
    /// Load timeouts from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `CMDGATE_REQUEST_TIMEOUT_SECS` (default: 10)
    /// - `CMDGATE_CONNECT_TIMEOUT_SECS` (default: 5)
    ///
    /// # Errors
    ///
    /// `ConfigError::InvalidEnvVar` if a variable is set but is not a valid
    /// integer, `ConfigError::ZeroTimeout` if it is zero.
    pub fn from_env() -> Result<Self, ConfigError> {
        let timeout = env_secs("CMDGATE_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT)?;
        let connect_timeout = env_secs("CMDGATE_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT)?;

        let config = Self {
            timeout,
            connect_timeout,
            ..Default::default()
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject zero timeouts and a zero body limit.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout { field: "timeout" });
        }
        if self.connect_timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout {
                field: "connect_timeout",
            });
        }
        if self.max_response_size == 0 {
            return Err(ConfigError::ZeroResponseLimit);
        }
        Ok(())
    }
}

fn env_secs(var: &str, default: Duration) -> Result<Duration, ConfigError> {
    match std::env::var(var) {
        Ok(val) => val
            .trim()
            .parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|_| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                value: val,
            }),
        Err(_) => Ok(default),
    }
}

// ============================================================================
// Gate Response
// ============================================================================

/// Result of one call to the gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateResponse {
    /// Whether the command may be transmitted.
    pub allowed: bool,
    /// Raw response bytes; may be empty.
    pub body: Bytes,
    /// HTTP status, when a status line was received.
    pub status: Option<u16>,
    /// Why the command was not allowed. Logging only.
    pub failure: Option<GateError>,
}

impl GateResponse {
    pub fn allowed(status: u16, body: Bytes) -> Self {
        Self {
            allowed: true,
            body,
            status: Some(status),
            failure: None,
        }
    }

    pub fn denied(status: u16, body: Bytes) -> Self {
        Self {
            allowed: false,
            body,
            status: Some(status),
            failure: Some(GateError::RemoteDenied { status }),
        }
    }

    pub fn unreachable(
        kind: UnreachableKind,
        reason: impl Into<String>,
        status: Option<u16>,
        body: Bytes,
    ) -> Self {
        Self {
            allowed: false,
            body,
            status,
            failure: Some(GateError::RemoteUnreachable {
                kind,
                reason: reason.into(),
            }),
        }
    }

    /// Log label for the outcome.
    pub fn classification(&self) -> &'static str {
        self.failure
            .as_ref()
            .map_or("allowed", GateError::classification)
    }
}

// ============================================================================
// Gate Client Trait
// ============================================================================

/// Performs the remote authorization call (enables mocking in tests).
#[async_trait]
pub trait GateClient: Send + Sync {
    /// POST the summary to the gate and classify the outcome.
    ///
    /// Never fails: transport problems yield a denied response.
    async fn dispatch(&self, endpoint: &GateEndpoint, summary: &DispatchSummary) -> GateResponse;
}

// ============================================================================
// HTTP Gate Client
// ============================================================================

/// `reqwest`-backed gate client.
///
/// `Clone` and shareable across tasks; the underlying client pools
/// connections.
#[derive(Debug, Clone)]
pub struct HttpGateClient {
    client: Client,
    config: GateClientConfig,
}

/// A body read that stopped early, with whatever arrived before it stopped.
struct BodyReadFailure {
    partial: Bytes,
    kind: UnreachableKind,
    reason: String,
}

impl HttpGateClient {
    /// Build the client.
    ///
    /// # Errors
    ///
    /// `ConfigError` if the configuration is invalid or the TLS stack cannot
    /// be initialised.
    pub fn new(config: GateClientConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .tcp_nodelay(true)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| ConfigError::ClientBuild {
                message: e.to_string(),
            })?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &GateClientConfig {
        &self.config
    }

    /// Read the response body up to `max_response_size`.
    ///
    /// Checks `Content-Length` first for early rejection, then streams
    /// chunk-by-chunk so chunked responses are bounded too.
    async fn read_body_limited(
        &self,
        mut response: reqwest::Response,
    ) -> Result<Bytes, BodyReadFailure> {
        let max_size = self.config.max_response_size;

        if let Some(content_length) = response.content_length() {
            if content_length > max_size as u64 {
                return Err(BodyReadFailure {
                    partial: Bytes::new(),
                    kind: UnreachableKind::BodyTooLarge,
                    reason: format!(
                        "Content-Length {content_length} exceeds {max_size} byte limit"
                    ),
                });
            }
        }

        let mut buf = Vec::with_capacity(
            response
                .content_length()
                .map(|cl| cl as usize)
                .unwrap_or(1024)
                .min(max_size),
        );

        loop {
            match response.chunk().await {
                Ok(Some(chunk)) => {
                    let room = max_size - buf.len();
                    if chunk.len() > room {
                        buf.extend_from_slice(&chunk[..room]);
                        return Err(BodyReadFailure {
                            partial: buf.into(),
                            kind: UnreachableKind::BodyTooLarge,
                            reason: format!("response body exceeds {max_size} byte limit"),
                        });
                    }
                    buf.extend_from_slice(&chunk);
                }
                Ok(None) => return Ok(buf.into()),
                Err(e) => {
                    let kind = classify_error(&e);
                    // A timed-out body is discarded.
                    let partial = if kind == UnreachableKind::Timeout {
                        Bytes::new()
                    } else {
                        buf.into()
                    };
                    return Err(BodyReadFailure {
                        partial,
                        kind,
                        reason: e.to_string(),
                    });
                }
            }
        }
    }
}

#[async_trait]
impl GateClient for HttpGateClient {
    #[tracing::instrument(
        skip_all,
        fields(endpoint = %endpoint, target_name = %summary.target, packet = %summary.packet_name)
    )]
    async fn dispatch(&self, endpoint: &GateEndpoint, summary: &DispatchSummary) -> GateResponse {
        debug!(tls = endpoint.uses_tls(), "Sending summary to gate");

        let result = self
            .client
            .post(endpoint.url().clone())
            .header(CONTENT_TYPE, "application/json")
            .body(summary.encode())
            .send()
            .await;

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                let kind = classify_error(&e);
                error!(
                    endpoint = %endpoint,
                    kind = %kind,
                    timeout_secs = self.config.timeout.as_secs(),
                    error = %e,
                    "Gate request failed"
                );
                return GateResponse::unreachable(kind, e.to_string(), None, Bytes::new());
            }
        };

        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        let body = match self.read_body_limited(response).await {
            Ok(body) => body,
            Err(failure) => {
                if failure.partial.is_empty() {
                    error!(
                        endpoint = %endpoint,
                        status = status.as_u16(),
                        kind = %failure.kind,
                        error = %failure.reason,
                        "Failed to read gate response"
                    );
                } else {
                    error!(
                        endpoint = %endpoint,
                        status = status.as_u16(),
                        kind = %failure.kind,
                        error = %failure.reason,
                        body = %body_preview(&failure.partial, PREVIEW_LIMIT),
                        "Failed to read gate response"
                    );
                }
                return GateResponse::unreachable(
                    failure.kind,
                    failure.reason,
                    Some(status.as_u16()),
                    failure.partial,
                );
            }
        };

        if status.is_success() {
            info!(
                status = status.as_u16(),
                content_type = %content_type,
                body_len = body.len(),
                "Gate allowed command"
            );
            GateResponse::allowed(status.as_u16(), body)
        } else {
            error!(
                endpoint = %endpoint,
                status = status.as_u16(),
                body = %body_preview(&body, PREVIEW_LIMIT),
                "Gate rejected command"
            );
            GateResponse::denied(status.as_u16(), body)
        }
    }
}

/// Map a reqwest error onto a failure class.
fn classify_error(error: &reqwest::Error) -> UnreachableKind {
    if error.is_timeout() {
        UnreachableKind::Timeout
    } else if error.is_connect() {
        UnreachableKind::Connect
    } else {
        UnreachableKind::Protocol
    }
}
