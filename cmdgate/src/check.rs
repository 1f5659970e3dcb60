//! `cmdgate check`: load and validate configuration.

use std::path::PathBuf;

use cmdgate_core::GateEndpoint;
use cmdgate_core::config::{find_config_file, load_and_validate};
use tracing::info;

use crate::cli::CheckArgs;
use crate::error::CliError;

/// What a successful check found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckReport {
    pub path: PathBuf,
    pub endpoint: GateEndpoint,
    pub identity: Option<String>,
    pub noop_function_code: Option<i64>,
}

impl std::fmt::Display for CheckReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "config:   {}", self.path.display())?;
        writeln!(f, "endpoint: {}", self.endpoint)?;
        writeln!(
            f,
            "identity: {}",
            self.identity
                .as_deref()
                .unwrap_or(cmdgate_core::summary::UNKNOWN_IDENTITY)
        )?;
        match self.noop_function_code {
            Some(code) => write!(f, "noop:     function code {code}"),
            None => write!(f, "noop:     disabled"),
        }
    }
}

/// Locate, load and validate the configuration.
pub fn run_check(args: &CheckArgs) -> Result<CheckReport, CliError> {
    let path = find_config_file(args.config.as_deref())?;
    let config = load_and_validate(&path)?;
    let endpoint = GateEndpoint::parse(&config.gate.endpoint)?;

    info!(path = %path.display(), "Configuration is valid");
    Ok(CheckReport {
        path,
        endpoint,
        identity: config.gate.identity,
        noop_function_code: config.gate.noop_function_code,
    })
}
