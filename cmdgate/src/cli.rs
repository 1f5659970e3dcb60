//! CLI argument types for `cmdgate check`, `cmdgate send` and `cmdgate target`.
//!
//! These types are defined separately from `main.rs` so that integration tests
//! can construct them directly.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, ValueEnum};
use cmdgate_core::config::parse_duration;

// ─────────────────────────────────────────────────────────────────────────────
// Shared Args
// ─────────────────────────────────────────────────────────────────────────────

/// Logging flags shared by every subcommand.
#[derive(Args, Debug, Clone)]
pub struct LogArgs {
    /// Enable debug logging.
    #[arg(long, short)]
    pub verbose: bool,

    /// Log line format on stderr.
    #[arg(long, value_enum, default_value = "text")]
    pub log_format: LogFormat,
}

/// Log output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines.
    Text,
    /// One JSON object per line.
    Json,
}

// ─────────────────────────────────────────────────────────────────────────────
// Check Subcommand Args
// ─────────────────────────────────────────────────────────────────────────────

/// Arguments for `cmdgate check`.
///
/// Loads and validates the configuration, then prints the normalized
/// endpoint.
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Configuration file (otherwise `CMDGATE_CONFIG`, then default paths).
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub log: LogArgs,
}

// ─────────────────────────────────────────────────────────────────────────────
// Send Subcommand Args
// ─────────────────────────────────────────────────────────────────────────────

/// Arguments for `cmdgate send`.
///
/// Runs one in-memory command through the gate. Gate settings come from
/// `--endpoint`, else `--config`, else `CMDGATE_ENDPOINT`, else the default
/// configuration paths.
#[derive(Args, Debug)]
pub struct SendArgs {
    /// Configuration file.
    #[arg(long, short, conflicts_with = "endpoint")]
    pub config: Option<PathBuf>,

    /// Gate endpoint, bypassing configuration files.
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Operator identity (overrides configuration).
    #[arg(long)]
    pub identity: Option<String>,

    /// Request timeout, e.g. `10s` or `PT10S` (overrides configuration).
    #[arg(long, value_parser = parse_timeout)]
    pub timeout: Option<Duration>,

    /// Target name.
    #[arg(long)]
    pub target: String,

    /// Command packet name.
    #[arg(long)]
    pub packet: String,

    /// Stream id header value.
    #[arg(long)]
    pub stream_id: i64,

    /// Function code header value.
    #[arg(long)]
    pub function_code: i64,

    #[command(flatten)]
    pub log: LogArgs,
}

fn parse_timeout(s: &str) -> Result<Duration, String> {
    parse_duration(s)
}

// ─────────────────────────────────────────────────────────────────────────────
// Target Subcommand Args
// ─────────────────────────────────────────────────────────────────────────────

/// Arguments for `cmdgate target`.
///
/// UDP target simulator: logs incoming commands and emits a timestamp
/// telemetry packet on a fixed interval.
#[derive(Args, Debug, Clone)]
pub struct TargetArgs {
    /// UDP port to listen on for commands.
    #[arg(long, env = "CMD_LISTEN_PORT", default_value_t = 6200)]
    pub listen_port: u16,

    /// Telemetry destination host.
    #[arg(long, env = "TLM_DEST_HOST", default_value = "host.docker.internal")]
    pub tlm_host: String,

    /// Telemetry destination port.
    #[arg(long, env = "TLM_DEST_PORT", default_value_t = 6201)]
    pub tlm_port: u16,

    /// Optional second telemetry destination host.
    #[arg(long, env = "FORWARD_TLM_HOST")]
    pub forward_host: Option<String>,

    /// Port for the second telemetry destination (0 disables forwarding).
    #[arg(long, env = "FORWARD_TLM_PORT", default_value_t = 0)]
    pub forward_port: u16,

    /// Telemetry interval, e.g. `1s` or `500ms`.
    #[arg(long, value_parser = parse_timeout, default_value = "1s")]
    pub interval: Duration,

    #[command(flatten)]
    pub log: LogArgs,
}

impl TargetArgs {
    /// Forward destination, when both host and a non-zero port are set.
    pub fn forward_destination(&self) -> Option<(String, u16)> {
        match &self.forward_host {
            Some(host) if !host.trim().is_empty() && self.forward_port != 0 => {
                Some((host.trim().to_string(), self.forward_port))
            }
            _ => None,
        }
    }
}
