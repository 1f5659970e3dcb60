//! Per-packet gate failures.
//!
//! None of these escape the write path: each one halts the current packet and
//! is reported through logs only. Construction-time problems live in
//! [`crate::config::ConfigError`] instead.

use std::fmt;

use thiserror::Error;

use crate::packet::PacketError;

/// Why the gate could not be reached, for log classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnreachableKind {
    /// Request or body read exceeded the configured timeout.
    Timeout,
    /// TCP/TLS connection could not be established.
    Connect,
    /// Malformed response or transport failure mid-exchange.
    Protocol,
    /// Response body exceeded the configured size limit.
    BodyTooLarge,
}

impl UnreachableKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::Connect => "connect",
            Self::Protocol => "protocol",
            Self::BodyTooLarge => "body_too_large",
        }
    }
}

impl fmt::Display for UnreachableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failure that halts one packet.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GateError {
    /// The gate answered with a non-2xx status.
    #[error("gate denied command: HTTP {status}")]
    RemoteDenied {
        /// HTTP status code returned by the gate
        status: u16,
    },

    /// The gate could not be reached or did not answer properly.
    #[error("gate unreachable ({kind}): {reason}")]
    RemoteUnreachable {
        /// Failure class
        kind: UnreachableKind,
        /// Transport error text
        reason: String,
    },

    /// The packet rejected the gate's response bytes.
    #[error("failed to write gate response into '{field}': {source}")]
    FieldWrite {
        /// Designated response field
        field: String,
        #[source]
        source: PacketError,
    },
}

impl GateError {
    /// Stable label for the `classification` log field.
    #[must_use]
    pub fn classification(&self) -> &'static str {
        match self {
            Self::RemoteDenied { .. } => "remote_denied",
            Self::RemoteUnreachable { .. } => "remote_unreachable",
            Self::FieldWrite { .. } => "field_write",
        }
    }

    /// Whether the failure came from talking to the gate.
    #[must_use]
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            Self::RemoteDenied { .. } | Self::RemoteUnreachable { .. }
        )
    }
}
