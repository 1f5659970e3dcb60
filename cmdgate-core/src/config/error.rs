//! Configuration error types.
//!
//! Every variant here is fatal: a dispatcher cannot be built (or cannot keep
//! processing a packet schema) until the configuration is fixed.

use std::path::PathBuf;
use thiserror::Error;

/// Configuration loading, validation and schema errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    // ─────────────────────────────────────────────────────────────────────────
    // Endpoint errors
    // ─────────────────────────────────────────────────────────────────────────
    /// The gate endpoint is missing or only whitespace.
    #[error("gate endpoint must be non-empty")]
    EmptyEndpoint,

    /// The gate endpoint could not be parsed as a URL.
    #[error("invalid gate endpoint '{url}': {message}")]
    InvalidUrl { url: String, message: String },

    /// The gate endpoint uses a scheme the HTTP client cannot speak.
    #[error("unsupported scheme '{scheme}' in gate endpoint '{url}': expected http or https")]
    UnsupportedScheme { url: String, scheme: String },

    /// The gate endpoint parsed but names no host.
    #[error("gate endpoint '{url}' has no host")]
    MissingHost { url: String },

    // ─────────────────────────────────────────────────────────────────────────
    // Packet schema errors (surfaced at first use)
    // ─────────────────────────────────────────────────────────────────────────
    /// A designated field is absent from the packet definition.
    #[error("packet '{target} {packet}' has no field '{field}'")]
    MissingField {
        target: String,
        packet: String,
        field: String,
    },

    /// A designated header field does not hold an integer value.
    #[error("field '{field}' of packet '{target} {packet}' is not numeric: {reason}")]
    NonNumericField {
        target: String,
        packet: String,
        field: String,
        reason: String,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // Value validation errors
    // ─────────────────────────────────────────────────────────────────────────
    /// Empty-data policy is not one of nil/true/false.
    #[error("invalid allow_empty_data value '{value}': expected nil, true or false")]
    InvalidEmptyDataPolicy { value: String },

    /// Two designated fields share the same name.
    #[error("field name '{name}' is used for more than one designated field")]
    DuplicateFieldName { name: String },

    /// A designated field name is empty.
    #[error("field name for '{role}' must be non-empty")]
    EmptyFieldName { role: &'static str },

    /// A timeout was configured as zero.
    #[error("'{field}' must be greater than zero")]
    ZeroTimeout { field: &'static str },

    /// Response size limit was configured as zero.
    #[error("max_response_size must be greater than zero")]
    ZeroResponseLimit,

    /// Schema version not supported.
    #[error("unsupported schema version {version}, expected 1")]
    UnsupportedSchemaVersion { version: u32 },

    // ─────────────────────────────────────────────────────────────────────────
    // Environment errors
    // ─────────────────────────────────────────────────────────────────────────
    /// Required environment variable not set.
    #[error("environment variable '{var}' not set (required for field '{field}')")]
    MissingEnvVar { var: String, field: String },

    /// Environment variable set to a value that does not parse.
    #[error("environment variable '{var}' must be a valid integer, got: '{value}'")]
    InvalidEnvVar { var: String, value: String },

    // ─────────────────────────────────────────────────────────────────────────
    // I/O and parsing errors
    // ─────────────────────────────────────────────────────────────────────────
    /// YAML parsing error.
    #[error("YAML parse error: {0}")]
    ParseError(#[from] serde_saphyr::Error),

    /// I/O error reading config file.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Config file not found at any search location.
    #[error("configuration file not found (searched: {searched:?})")]
    ConfigFileNotFound { searched: Vec<PathBuf> },

    /// Empty configuration file.
    #[error("configuration file is empty")]
    EmptyConfigFile,

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {message}")]
    ClientBuild { message: String },
}
