//! Centralized default values for gate configuration.
//!
//! Every place that needs a default (YAML schema, environment loading, the
//! HTTP client) reads it from here so they cannot drift apart.

use std::time::Duration;

/// Whole-request timeout for one gate call.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// TCP + TLS handshake timeout.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Largest gate response body accepted (1 MiB).
pub const DEFAULT_MAX_RESPONSE_SIZE: usize = 1024 * 1024;

/// Function code of the no-op command, which bypasses the gate.
pub const DEFAULT_NOOP_FUNCTION_CODE: i64 = 1;

/// Only supported configuration schema version.
pub const SCHEMA_VERSION: u32 = 1;
